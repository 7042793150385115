//! Deterministic, bounded text rendering of a data context.
//!
//! The summary is the only payload the insight prompt sees, so its format
//! is pinned here as a pure function: same context in, same text out.

use lumen_core::{BusinessMetrics, CustomerContext, DataContext, DynamicContext, InventoryContext, SalesContext};

/// Hard cap on the rendered summary; longer text is tail-trimmed.
pub const SUMMARY_MAX_LEN: usize = 4000;

const SAMPLE_TRANSACTIONS: usize = 5;
const SAMPLE_LOW_STOCK: usize = 5;
const SAMPLE_CUSTOMERS: usize = 3;
const SAMPLE_DYNAMIC_ROWS: usize = 10;

/// Renders the bounded textual summary of a context.
pub fn format_summary(context: &DataContext) -> String {
    let full = match context {
        DataContext::Sales(ctx) => sales_summary(ctx),
        DataContext::Inventory(ctx) => inventory_summary(ctx),
        DataContext::Customers(ctx) => customer_summary(ctx),
        DataContext::Metrics(metrics) => metrics_summary(metrics),
        DataContext::Dynamic(ctx) => dynamic_summary(ctx),
    };
    truncate_tail(full, SUMMARY_MAX_LEN)
}

fn sales_summary(ctx: &SalesContext) -> String {
    let mut out = format!(
        "Sales data: {} records, Total Revenue: {}, Total Profit: {}, Margin: {:.1}%\n",
        ctx.records.len(),
        money(ctx.total_revenue),
        money(ctx.total_profit),
        ctx.margin
    );

    if !ctx.top_products.is_empty() {
        out.push_str("Top products:\n");
        for rank in ctx.top_products.iter().take(5) {
            out.push_str(&format!("- {}: {}\n", rank.name, money(rank.revenue)));
        }
    }

    if !ctx.top_stores.is_empty() {
        out.push_str("Top stores:\n");
        for rank in ctx.top_stores.iter().take(3) {
            out.push_str(&format!("- {}: {}\n", rank.name, money(rank.revenue)));
        }
    }

    if !ctx.records.is_empty() {
        out.push_str("Sample transactions:\n");
        for record in ctx.records.iter().take(SAMPLE_TRANSACTIONS) {
            out.push_str(&format!(
                "{}: {} at {} - Qty: {}, Revenue: {}, Profit: {}\n",
                record.date,
                record.product,
                record.store,
                record.quantity_sold,
                money(record.revenue),
                money(record.profit)
            ));
        }
    }

    out
}

fn inventory_summary(ctx: &InventoryContext) -> String {
    let mut out = format!(
        "Inventory data: {} items, Total stock: {} units, Low-stock items: {}\n",
        ctx.items.len(),
        group_thousands(&ctx.total_stock.to_string()),
        ctx.low_stock.len()
    );

    for item in ctx.low_stock.iter().take(SAMPLE_LOW_STOCK) {
        out.push_str(&format!(
            "- {} at {}: {} units (reorder level: {})\n",
            item.product, item.store, item.current_stock, item.reorder_level
        ));
    }

    out
}

fn customer_summary(ctx: &CustomerContext) -> String {
    let mut out = format!(
        "Customer data: {} customers, Total purchases: {}, Average purchases per customer: {}\n",
        ctx.customers.len(),
        number(ctx.total_purchases),
        number(ctx.average_purchases)
    );

    if !ctx.customers.is_empty() {
        out.push_str("Sample customers:\n");
        for customer in ctx.customers.iter().take(SAMPLE_CUSTOMERS) {
            out.push_str(&format!(
                "- {} ({}): {} purchases, {} spent\n",
                customer.name,
                customer.region,
                number(customer.total_purchases),
                money(customer.total_spent)
            ));
        }
    }

    out
}

fn metrics_summary(metrics: &BusinessMetrics) -> String {
    format!(
        "Total Revenue: {}\n\
         Total Profit: {}\n\
         Profit Margin: {:.1}%\n\
         Customer Count: {}\n\
         Average Order Value: {}\n\
         Inventory Turnover: {:.2}\n",
        money(metrics.total_revenue),
        money(metrics.total_profit),
        metrics.profit_margin,
        group_thousands(&metrics.customer_count.to_string()),
        money(metrics.average_order_value),
        metrics.inventory_turnover
    )
}

fn dynamic_summary(ctx: &DynamicContext) -> String {
    if ctx.rows.is_empty() {
        return format!("No rows ({})\n", ctx.note);
    }

    let mut out = format!("Columns: {}\n", ctx.columns.join(", "));
    for row in ctx.rows.iter().take(SAMPLE_DYNAMIC_ROWS) {
        let cells: Vec<String> = ctx
            .columns
            .iter()
            .map(|col| format!("{}: {}", col, render_cell(row.get(col))))
            .collect();
        out.push_str(&cells.join(", "));
        out.push('\n');
    }
    out
}

fn render_cell(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::Number(n)) => match n.as_f64() {
            Some(f) => number(f),
            None => n.to_string(),
        },
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => "null".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Formats a number with thousand separators and two decimals.
pub fn number(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{}.{frac_part}", group_thousands(int_part))
}

/// Formats a dollar amount: `$1,234.56`.
pub fn money(value: f64) -> String {
    if value < 0.0 {
        format!("-${}", number(-value))
    } else {
        format!("${}", number(value))
    }
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{sign}{grouped}")
}

fn truncate_tail(mut text: String, max_len: usize) -> String {
    if text.len() <= max_len {
        return text;
    }
    let mut cut = max_len.saturating_sub(3);
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str("...");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lumen_core::{CustomerRecord, InventoryRecord, RevenueRank, SalesRecord};

    fn sales_ctx() -> SalesContext {
        SalesContext {
            records: vec![SalesRecord {
                date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
                product: "Runner X".into(),
                category: "Shoes".into(),
                store: "Paris".into(),
                quantity_sold: 4,
                revenue: 1234.5,
                cost: 900.0,
                profit: 334.5,
                region: "EU".into(),
            }],
            total_revenue: 1234.5,
            total_profit: 334.5,
            margin: 27.1,
            top_products: vec![RevenueRank {
                name: "Runner X".into(),
                revenue: 1234.5,
            }],
            top_stores: vec![RevenueRank {
                name: "Paris".into(),
                revenue: 1234.5,
            }],
        }
    }

    #[test]
    fn number_formatting_groups_thousands() {
        assert_eq!(number(1234567.891), "1,234,567.89");
        assert_eq!(number(999.0), "999.00");
        assert_eq!(number(0.0), "0.00");
        assert_eq!(number(-1234.5), "-1,234.50");
    }

    #[test]
    fn money_formatting() {
        assert_eq!(money(1234.5), "$1,234.50");
        assert_eq!(money(-20.0), "-$20.00");
    }

    #[test]
    fn sales_summary_has_header_rankings_and_samples() {
        let text = format_summary(&DataContext::Sales(sales_ctx()));
        assert!(text.starts_with(
            "Sales data: 1 records, Total Revenue: $1,234.50, Total Profit: $334.50, Margin: 27.1%"
        ));
        assert!(text.contains("Top products:\n- Runner X: $1,234.50"));
        assert!(text.contains("Top stores:\n- Paris: $1,234.50"));
        assert!(text.contains("2026-06-01: Runner X at Paris - Qty: 4, Revenue: $1,234.50, Profit: $334.50"));
    }

    #[test]
    fn inventory_summary_lists_low_stock_alerts() {
        let item = InventoryRecord {
            store: "Paris".into(),
            product: "Runner X".into(),
            current_stock: 3,
            reorder_level: 10,
            max_stock: 50,
            last_restocked: None,
            supplier: "Acme".into(),
            status: "active".into(),
        };
        let ctx = DataContext::Inventory(InventoryContext {
            items: vec![item.clone()],
            total_stock: 3,
            low_stock: vec![item],
        });
        let text = format_summary(&ctx);
        assert!(text.contains("Inventory data: 1 items, Total stock: 3 units, Low-stock items: 1"));
        assert!(text.contains("- Runner X at Paris: 3 units (reorder level: 10)"));
    }

    #[test]
    fn customer_summary_totals_and_samples() {
        let customer = CustomerRecord {
            customer_id: "c1".into(),
            name: "Jo".into(),
            email: "jo@example.com".into(),
            region: "EU".into(),
            age_group: "25-34".into(),
            total_purchases: 12.0,
            total_spent: 480.0,
            last_purchase: None,
            preferred_store: "Paris".into(),
            preferred_category: "Shoes".into(),
        };
        let ctx = DataContext::Customers(CustomerContext {
            customers: vec![customer],
            total_purchases: 12.0,
            average_purchases: 12.0,
        });
        let text = format_summary(&ctx);
        assert!(text.contains("Customer data: 1 customers"));
        assert!(text.contains("- Jo (EU): 12.00 purchases, $480.00 spent"));
    }

    #[test]
    fn metrics_summary_is_six_lines() {
        let metrics = BusinessMetrics {
            total_revenue: 50_000.0,
            total_profit: 12_500.0,
            profit_margin: 25.0,
            customer_count: 1200,
            average_order_value: 41.67,
            inventory_turnover: 3.2,
        };
        let text = format_summary(&DataContext::Metrics(metrics));
        assert_eq!(text.trim_end().lines().count(), 6);
        assert!(text.contains("Total Revenue: $50,000.00"));
        assert!(text.contains("Customer Count: 1,200"));
        assert!(text.contains("Inventory Turnover: 3.20"));
    }

    #[test]
    fn dynamic_summary_renders_cells_in_column_order() {
        let mut row = serde_json::Map::new();
        row.insert("store".into(), serde_json::json!("Paris"));
        row.insert("revenue".into(), serde_json::json!(1234.5));
        let ctx = DataContext::Dynamic(DynamicContext {
            columns: vec!["store".into(), "revenue".into()],
            rows: vec![row],
            note: "per_store aggregate over the last 30 days".into(),
        });
        let text = format_summary(&ctx);
        assert!(text.starts_with("Columns: store, revenue\n"));
        assert!(text.contains("store: Paris, revenue: 1,234.50"));
    }

    #[test]
    fn empty_dynamic_summary_carries_the_note() {
        let ctx = DataContext::Dynamic(DynamicContext::empty("no matched source"));
        assert_eq!(format_summary(&ctx), "No rows (no matched source)\n");
    }

    #[test]
    fn dynamic_rows_are_capped_at_ten() {
        let rows: Vec<_> = (0..25)
            .map(|i| {
                let mut row = serde_json::Map::new();
                row.insert("n".into(), serde_json::json!(i));
                row
            })
            .collect();
        let ctx = DataContext::Dynamic(DynamicContext {
            columns: vec!["n".into()],
            rows,
            note: "counts".into(),
        });
        let text = format_summary(&ctx);
        assert_eq!(text.lines().count(), 1 + SAMPLE_DYNAMIC_ROWS);
    }

    #[test]
    fn summaries_are_capped_with_ellipsis() {
        let records: Vec<SalesRecord> = (0..500)
            .map(|i| SalesRecord {
                date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
                product: format!("Product with a very long name {i}"),
                category: "Shoes".into(),
                store: "Paris".into(),
                quantity_sold: 1,
                revenue: 10.0,
                cost: 5.0,
                profit: 5.0,
                region: "EU".into(),
            })
            .collect();
        let mut ctx = sales_ctx();
        ctx.top_products = records
            .iter()
            .map(|r| RevenueRank {
                name: r.product.clone(),
                revenue: r.revenue,
            })
            .collect();
        ctx.records = records;

        let text = format_summary(&DataContext::Sales(ctx));
        assert!(text.len() <= SUMMARY_MAX_LEN);
    }

    #[test]
    fn truncation_is_tail_trimmed() {
        let text = truncate_tail("a".repeat(5000), 100);
        assert_eq!(text.len(), 100);
        assert!(text.ends_with("..."));
    }
}
