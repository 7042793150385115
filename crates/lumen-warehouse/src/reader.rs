//! Typed readers over the warehouse tables and views.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, warn};

use lumen_core::{BusinessMetrics, CustomerRecord, DynamicContext, InventoryRecord, SalesRecord};

use crate::aggregate::AggregateSpec;
use crate::client::ClickHouseClient;
use crate::{WarehouseReader, DAYS_RANGE, LIMIT_RANGE};

#[derive(Debug, Deserialize)]
struct SalesTotalsRow {
    revenue: f64,
    profit: f64,
    transactions: u64,
}

#[derive(Debug, Deserialize)]
struct CountRow {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct TurnoverRow {
    quantity: f64,
    avg_stock: f64,
}

impl ClickHouseClient {
    /// Absorbs an adapter failure into an empty result, per policy.
    fn absorb<T>(result: crate::Result<Vec<T>>, what: &str) -> Vec<T> {
        match result {
            Ok(rows) => {
                debug!("Retrieved {} {} rows", rows.len(), what);
                rows
            }
            Err(err) => {
                error!("Error retrieving {}: {}", what, err);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl WarehouseReader for ClickHouseClient {
    async fn sales(&self, days: u32) -> Vec<SalesRecord> {
        if !DAYS_RANGE.contains(&days) {
            warn!(
                "sales window {} outside {:?}, returning empty result",
                days, DAYS_RANGE
            );
            return Vec::new();
        }

        let sql = format!(
            "SELECT date, product, category, store, quantity_sold, revenue, cost, profit, region \
             FROM sales_data \
             WHERE date >= today() - INTERVAL {days} DAY \
             ORDER BY date DESC"
        );
        Self::absorb(self.query_rows(&sql).await, "sales")
    }

    async fn inventory(&self) -> Vec<InventoryRecord> {
        let sql = "SELECT store, product, current_stock, reorder_level, max_stock, \
                   last_restocked, supplier, status \
                   FROM inventory_data \
                   ORDER BY store, product";
        Self::absorb(self.query_rows(sql).await, "inventory")
    }

    async fn customers(&self, limit: u32) -> Vec<CustomerRecord> {
        if !LIMIT_RANGE.contains(&limit) {
            warn!(
                "customer limit {} outside {:?}, returning empty result",
                limit, LIMIT_RANGE
            );
            return Vec::new();
        }

        let sql = format!(
            "SELECT customer_id, name, email, region, age_group, total_purchases, \
             total_spent, last_purchase, preferred_store, preferred_category \
             FROM customer_data \
             LIMIT {limit}"
        );
        Self::absorb(self.query_rows(&sql).await, "customers")
    }

    async fn metrics(&self) -> BusinessMetrics {
        let totals_sql = "SELECT sum(revenue) AS revenue, sum(profit) AS profit, \
                          count() AS transactions \
                          FROM sales_data \
                          WHERE date >= today() - INTERVAL 30 DAY";
        let customers_sql = "SELECT count() AS count FROM customer_data";
        let turnover_sql = "SELECT sum(s.quantity_sold) AS quantity, \
                            (SELECT avg(current_stock) FROM inventory_data) AS avg_stock \
                            FROM sales_data AS s \
                            WHERE s.date >= today() - INTERVAL 30 DAY";

        let totals: Vec<SalesTotalsRow> =
            Self::absorb(self.query_rows(totals_sql).await, "sales totals");
        let customers: Vec<CountRow> =
            Self::absorb(self.query_rows(customers_sql).await, "customer count");
        let turnover: Vec<TurnoverRow> =
            Self::absorb(self.query_rows(turnover_sql).await, "turnover inputs");

        let Some(totals) = totals.into_iter().next() else {
            return BusinessMetrics::default();
        };

        derive_metrics(
            totals.revenue,
            totals.profit,
            totals.transactions,
            customers.into_iter().next().map(|c| c.count).unwrap_or(0),
            turnover.into_iter().next(),
        )
    }

    async fn run_aggregate(&self, spec: &AggregateSpec) -> DynamicContext {
        if !DAYS_RANGE.contains(&spec.days()) {
            warn!(
                "aggregate window {} outside {:?}, returning empty result",
                spec.days(),
                DAYS_RANGE
            );
            return DynamicContext::empty(spec.description());
        }

        let rows = Self::absorb(self.query_maps(&spec.sql()).await, spec.label());
        DynamicContext {
            columns: spec.columns(),
            rows,
            note: spec.description(),
        }
    }
}

fn derive_metrics(
    revenue: f64,
    profit: f64,
    transactions: u64,
    customer_count: u64,
    turnover: Option<TurnoverRow>,
) -> BusinessMetrics {
    let profit_margin = if revenue > 0.0 {
        profit / revenue * 100.0
    } else {
        0.0
    };
    let average_order_value = if transactions > 0 {
        revenue / transactions as f64
    } else {
        0.0
    };
    let inventory_turnover = match turnover {
        Some(row) if row.avg_stock > 0.0 => row.quantity / row.avg_stock,
        _ => 0.0,
    };

    BusinessMetrics {
        total_revenue: revenue,
        total_profit: profit,
        profit_margin,
        customer_count: customer_count as i64,
        average_order_value,
        inventory_turnover,
    }
}

/// Reader used when no warehouse endpoint is configured. Every read is
/// empty, so downstream components take their empty-context paths.
#[derive(Debug, Clone, Default)]
pub struct DisabledWarehouse;

#[async_trait]
impl WarehouseReader for DisabledWarehouse {
    async fn sales(&self, _days: u32) -> Vec<SalesRecord> {
        debug!("Warehouse disabled, returning empty sales");
        Vec::new()
    }

    async fn inventory(&self) -> Vec<InventoryRecord> {
        debug!("Warehouse disabled, returning empty inventory");
        Vec::new()
    }

    async fn customers(&self, _limit: u32) -> Vec<CustomerRecord> {
        debug!("Warehouse disabled, returning empty customers");
        Vec::new()
    }

    async fn metrics(&self) -> BusinessMetrics {
        debug!("Warehouse disabled, returning empty metrics");
        BusinessMetrics::default()
    }

    async fn run_aggregate(&self, spec: &AggregateSpec) -> DynamicContext {
        debug!("Warehouse disabled, returning empty aggregate");
        DynamicContext::empty(spec.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClickHouseConfig;

    fn offline_client() -> ClickHouseClient {
        ClickHouseClient::new(ClickHouseConfig::new("clickhouse://127.0.0.1:1/void")).unwrap()
    }

    #[tokio::test]
    async fn out_of_range_days_short_circuits() {
        let client = offline_client();
        assert!(client.sales(0).await.is_empty());
        assert!(client.sales(366).await.is_empty());
    }

    #[tokio::test]
    async fn out_of_range_limit_short_circuits() {
        let client = offline_client();
        assert!(client.customers(0).await.is_empty());
        assert!(client.customers(10_001).await.is_empty());
    }

    #[tokio::test]
    async fn out_of_range_aggregate_short_circuits() {
        let client = offline_client();
        let ctx = client
            .run_aggregate(&AggregateSpec::PerStore { days: 0 })
            .await;
        assert!(ctx.rows.is_empty());
    }

    #[tokio::test]
    async fn disabled_warehouse_is_all_empty() {
        let reader = DisabledWarehouse;
        assert!(reader.sales(30).await.is_empty());
        assert!(reader.inventory().await.is_empty());
        assert!(reader.customers(100).await.is_empty());
        assert_eq!(reader.metrics().await, BusinessMetrics::default());
    }

    #[test]
    fn metrics_derivations() {
        let metrics = derive_metrics(
            1000.0,
            250.0,
            20,
            42,
            Some(TurnoverRow {
                quantity: 300.0,
                avg_stock: 100.0,
            }),
        );
        assert_eq!(metrics.profit_margin, 25.0);
        assert_eq!(metrics.average_order_value, 50.0);
        assert_eq!(metrics.inventory_turnover, 3.0);
        assert_eq!(metrics.customer_count, 42);
    }

    #[test]
    fn zero_revenue_yields_zero_margin() {
        let metrics = derive_metrics(0.0, 0.0, 0, 0, None);
        assert_eq!(metrics.profit_margin, 0.0);
        assert_eq!(metrics.average_order_value, 0.0);
        assert_eq!(metrics.inventory_turnover, 0.0);
    }
}
