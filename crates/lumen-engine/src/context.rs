//! Data-context retrieval.
//!
//! Chooses which warehouse family grounds a question by ordered keyword
//! matching over the lowercased text, fetches the rows, and derives the
//! per-family aggregates. Fetched contexts are cached as data snapshots
//! for a short TTL.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use lumen_cache::{Namespace, QueryCache};
use lumen_core::{
    fingerprint, CustomerContext, DataContext, DynamicContext, InventoryContext, RevenueRank,
    SalesContext, SalesRecord,
};
use lumen_warehouse::WarehouseReader;

/// Window of sales history fetched for sales-shaped questions.
const SALES_DAYS: u32 = 30;
/// Customer sample size for customer-shaped questions.
const CUSTOMER_LIMIT: u32 = 100;

const TOP_PRODUCTS: usize = 5;
const TOP_STORES: usize = 3;

/// Source families, in selection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Sales,
    Inventory,
    Customers,
    Metrics,
    None,
}

fn select_source(question_lower: &str) -> Source {
    // "product" and "store" are weak sales signals: a question about
    // overstocked products is an inventory question, not a sales one, so
    // those two only decide after the other families have had their turn.
    const SALES_KEYWORDS: [&str; 3] = ["sale", "revenue", "profit"];
    const INVENTORY_KEYWORDS: [&str; 4] = ["inventory", "stock", "restock", "reorder"];
    const CUSTOMER_KEYWORDS: [&str; 3] = ["customer", "segment", "purchase"];
    const METRICS_KEYWORDS: [&str; 4] = ["metric", "kpi", "performance", "summary"];
    const WEAK_SALES_KEYWORDS: [&str; 2] = ["product", "store"];

    let matches = |keywords: &[&str]| keywords.iter().any(|kw| question_lower.contains(kw));

    if matches(&SALES_KEYWORDS) {
        Source::Sales
    } else if matches(&INVENTORY_KEYWORDS) {
        Source::Inventory
    } else if matches(&CUSTOMER_KEYWORDS) {
        Source::Customers
    } else if matches(&METRICS_KEYWORDS) {
        Source::Metrics
    } else if matches(&WEAK_SALES_KEYWORDS) {
        Source::Sales
    } else {
        Source::None
    }
}

/// Builds the grounding context for questions.
pub struct ContextRetriever {
    warehouse: Arc<dyn WarehouseReader>,
    cache: QueryCache,
}

impl ContextRetriever {
    pub fn new(warehouse: Arc<dyn WarehouseReader>, cache: QueryCache) -> Self {
        Self { warehouse, cache }
    }

    /// Retrieves the context for a question. Warehouse failures surface as
    /// empty contexts, never as errors.
    #[instrument(skip(self), fields(question_len = question.len()))]
    pub async fn retrieve(&self, question: &str) -> DataContext {
        let lower = question.to_lowercase();
        let source = select_source(&lower);
        debug!("Selected data source family: {:?}", source);

        let (endpoint, params) = match source {
            Source::Sales => ("sales", format!("days={SALES_DAYS}")),
            Source::Inventory => ("inventory", "all".to_string()),
            Source::Customers => ("customers", format!("limit={CUSTOMER_LIMIT}")),
            Source::Metrics => ("metrics", "current".to_string()),
            Source::None => {
                return DataContext::Dynamic(DynamicContext::empty("no matched source"))
            }
        };

        let key = format!("{endpoint}:{}", fingerprint(&params));
        if let Some(cached) = self.cache.get::<DataContext>(Namespace::Data, &key).await {
            debug!("Data context served from snapshot cache");
            return cached;
        }

        let context = self.fetch(source).await;
        if !context.is_empty() {
            self.cache.set(Namespace::Data, &key, &context).await;
        }
        context
    }

    async fn fetch(&self, source: Source) -> DataContext {
        match source {
            Source::Sales => {
                DataContext::Sales(build_sales_context(self.warehouse.sales(SALES_DAYS).await))
            }
            Source::Inventory => DataContext::Inventory(build_inventory_context(
                self.warehouse.inventory().await,
            )),
            Source::Customers => DataContext::Customers(build_customer_context(
                self.warehouse.customers(CUSTOMER_LIMIT).await,
            )),
            Source::Metrics => DataContext::Metrics(self.warehouse.metrics().await),
            Source::None => DataContext::Dynamic(DynamicContext::empty("no matched source")),
        }
    }
}

fn build_sales_context(records: Vec<SalesRecord>) -> SalesContext {
    let total_revenue: f64 = records.iter().map(|r| r.revenue).sum();
    let total_profit: f64 = records.iter().map(|r| r.profit).sum();
    let margin = total_profit / total_revenue.max(1.0) * 100.0;

    SalesContext {
        top_products: top_by_revenue(&records, TOP_PRODUCTS, |r| &r.product),
        top_stores: top_by_revenue(&records, TOP_STORES, |r| &r.store),
        records,
        total_revenue,
        total_profit,
        margin,
    }
}

/// Top-N dimension values by summed revenue; ties break on the label,
/// ascending, so rankings are stable across runs.
fn top_by_revenue<'a>(
    records: &'a [SalesRecord],
    n: usize,
    dimension: impl Fn(&'a SalesRecord) -> &'a String,
) -> Vec<RevenueRank> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for record in records {
        *totals.entry(dimension(record).as_str()).or_insert(0.0) += record.revenue;
    }

    let mut ranked: Vec<RevenueRank> = totals
        .into_iter()
        .map(|(name, revenue)| RevenueRank {
            name: name.to_string(),
            revenue,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.revenue
            .partial_cmp(&a.revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked.truncate(n);
    ranked
}

fn build_inventory_context(items: Vec<lumen_core::InventoryRecord>) -> InventoryContext {
    let total_stock = items.iter().map(|i| i.current_stock).sum();
    let low_stock = items.iter().filter(|i| i.needs_reorder()).cloned().collect();
    InventoryContext {
        items,
        total_stock,
        low_stock,
    }
}

fn build_customer_context(customers: Vec<lumen_core::CustomerRecord>) -> CustomerContext {
    let total_purchases: f64 = customers.iter().map(|c| c.total_purchases).sum();
    let average_purchases = total_purchases / (customers.len().max(1)) as f64;
    CustomerContext {
        customers,
        total_purchases,
        average_purchases,
    }
}
