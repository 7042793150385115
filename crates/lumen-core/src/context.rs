//! Data-context variants: the grounding evidence attached to a question.
//!
//! The retriever picks exactly one variant per question; downstream
//! consumers (summary formatter, visualization builder) match exhaustively
//! so the compiler flags any unhandled source family.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One per-transaction sales record from the warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub product: String,
    pub category: String,
    pub store: String,
    pub quantity_sold: i64,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub region: String,
}

/// Per-(store, product) stock position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub store: String,
    pub product: String,
    pub current_stock: i64,
    pub reorder_level: i64,
    pub max_stock: i64,
    pub last_restocked: Option<NaiveDate>,
    pub supplier: String,
    pub status: String,
}

impl InventoryRecord {
    pub fn needs_reorder(&self) -> bool {
        self.current_stock <= self.reorder_level
    }
}

/// Customer profile with purchase aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub name: String,
    pub email: String,
    pub region: String,
    pub age_group: String,
    pub total_purchases: f64,
    pub total_spent: f64,
    pub last_purchase: Option<NaiveDate>,
    pub preferred_store: String,
    pub preferred_category: String,
}

/// Key business metrics derived from the warehouse views.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BusinessMetrics {
    pub total_revenue: f64,
    pub total_profit: f64,
    pub profit_margin: f64,
    pub customer_count: i64,
    pub average_order_value: f64,
    pub inventory_turnover: f64,
}

/// A (dimension, revenue) ranking entry for top-product / top-store lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueRank {
    pub name: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesContext {
    pub records: Vec<SalesRecord>,
    pub total_revenue: f64,
    pub total_profit: f64,
    pub margin: f64,
    pub top_products: Vec<RevenueRank>,
    pub top_stores: Vec<RevenueRank>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryContext {
    pub items: Vec<InventoryRecord>,
    pub total_stock: i64,
    pub low_stock: Vec<InventoryRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerContext {
    pub customers: Vec<CustomerRecord>,
    pub total_purchases: f64,
    pub average_purchases: f64,
}

/// Free-shape rows from a parameterized aggregate read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicContext {
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    /// One-line description of the source query (or why there is none).
    pub note: String,
}

impl DynamicContext {
    pub fn empty(note: impl Into<String>) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            note: note.into(),
        }
    }
}

/// The grounding evidence for one question, tagged by source family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "data_type", rename_all = "snake_case")]
pub enum DataContext {
    Sales(SalesContext),
    Inventory(InventoryContext),
    Customers(CustomerContext),
    Metrics(BusinessMetrics),
    Dynamic(DynamicContext),
}

impl DataContext {
    /// Number of rows this context materializes.
    pub fn row_count(&self) -> usize {
        match self {
            DataContext::Sales(ctx) => ctx.records.len(),
            DataContext::Inventory(ctx) => ctx.items.len(),
            DataContext::Customers(ctx) => ctx.customers.len(),
            DataContext::Metrics(_) => 1,
            DataContext::Dynamic(ctx) => ctx.rows.len(),
        }
    }

    /// Column set exposed by this context's rows.
    pub fn columns(&self) -> Vec<String> {
        match self {
            DataContext::Sales(_) => [
                "date",
                "product",
                "category",
                "store",
                "quantity_sold",
                "revenue",
                "cost",
                "profit",
                "region",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            DataContext::Inventory(_) => [
                "store",
                "product",
                "current_stock",
                "reorder_level",
                "max_stock",
                "supplier",
                "status",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            DataContext::Customers(_) => [
                "customer_id",
                "region",
                "age_group",
                "total_purchases",
                "total_spent",
                "preferred_store",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            DataContext::Metrics(_) => [
                "total_revenue",
                "total_profit",
                "profit_margin",
                "customer_count",
                "average_order_value",
                "inventory_turnover",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            DataContext::Dynamic(ctx) => ctx.columns.clone(),
        }
    }

    /// The data-source tag reported in insights and visualizations.
    pub fn data_source_tag(&self) -> &'static str {
        match self {
            DataContext::Sales(_) => "sales_data",
            DataContext::Inventory(_) => "inventory_data",
            DataContext::Customers(_) => "customer_data",
            DataContext::Metrics(_) => "business_metrics",
            DataContext::Dynamic(_) => "sales_data",
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            DataContext::Metrics(m) => *m == BusinessMetrics::default(),
            other => other.row_count() == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sales() -> SalesContext {
        SalesContext {
            records: vec![SalesRecord {
                date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
                product: "Runner X".into(),
                category: "Shoes".into(),
                store: "Paris".into(),
                quantity_sold: 4,
                revenue: 400.0,
                cost: 250.0,
                profit: 150.0,
                region: "EU".into(),
            }],
            total_revenue: 400.0,
            total_profit: 150.0,
            margin: 37.5,
            top_products: vec![RevenueRank {
                name: "Runner X".into(),
                revenue: 400.0,
            }],
            top_stores: vec![RevenueRank {
                name: "Paris".into(),
                revenue: 400.0,
            }],
        }
    }

    #[test]
    fn row_count_matches_materialized_rows() {
        let ctx = DataContext::Sales(sample_sales());
        assert_eq!(ctx.row_count(), 1);
        assert!(!ctx.is_empty());
    }

    #[test]
    fn empty_dynamic_context_is_empty() {
        let ctx = DataContext::Dynamic(DynamicContext::empty("no matched source"));
        assert_eq!(ctx.row_count(), 0);
        assert!(ctx.is_empty());
    }

    #[test]
    fn default_metrics_count_as_empty() {
        let ctx = DataContext::Metrics(BusinessMetrics::default());
        assert!(ctx.is_empty());

        let ctx = DataContext::Metrics(BusinessMetrics {
            total_revenue: 10.0,
            ..Default::default()
        });
        assert!(!ctx.is_empty());
    }

    #[test]
    fn data_source_tags_are_closed_set() {
        let tags = [
            DataContext::Sales(sample_sales()).data_source_tag(),
            DataContext::Inventory(InventoryContext {
                items: vec![],
                total_stock: 0,
                low_stock: vec![],
            })
            .data_source_tag(),
            DataContext::Customers(CustomerContext {
                customers: vec![],
                total_purchases: 0.0,
                average_purchases: 0.0,
            })
            .data_source_tag(),
            DataContext::Metrics(BusinessMetrics::default()).data_source_tag(),
        ];
        assert_eq!(
            tags,
            [
                "sales_data",
                "inventory_data",
                "customer_data",
                "business_metrics"
            ]
        );
    }

    #[test]
    fn context_round_trips_through_json() {
        let ctx = DataContext::Sales(sample_sales());
        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.contains("\"data_type\":\"sales\""));
        let back: DataContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ctx);
    }

    #[test]
    fn reorder_threshold_is_inclusive() {
        let item = InventoryRecord {
            store: "Paris".into(),
            product: "Runner X".into(),
            current_stock: 5,
            reorder_level: 5,
            max_stock: 40,
            last_restocked: None,
            supplier: "Acme".into(),
            status: "active".into(),
        };
        assert!(item.needs_reorder());
    }
}
