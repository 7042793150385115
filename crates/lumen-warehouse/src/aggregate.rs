//! Parameterized reads over the pre-aggregated views.

/// The materialized views the store exposes for aggregate reads. The SQL
/// is fixed per view; the only caller-controlled input is the validated
/// day window, so no free-form query text ever reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateSpec {
    /// Revenue and profit per store over the window.
    PerStore { days: u32 },
    /// Revenue and profit per product over the window.
    PerProduct { days: u32 },
    /// Daily totals over the window.
    PerDay { days: u32 },
}

impl AggregateSpec {
    pub fn days(&self) -> u32 {
        match self {
            AggregateSpec::PerStore { days }
            | AggregateSpec::PerProduct { days }
            | AggregateSpec::PerDay { days } => *days,
        }
    }

    /// Stable label used in cache keys and logs.
    pub fn label(&self) -> &'static str {
        match self {
            AggregateSpec::PerStore { .. } => "per_store",
            AggregateSpec::PerProduct { .. } => "per_product",
            AggregateSpec::PerDay { .. } => "per_day",
        }
    }

    /// One-line description carried into the dynamic context.
    pub fn description(&self) -> String {
        format!("{} aggregate over the last {} days", self.label(), self.days())
    }

    /// Column set of the result rows, in rendering order.
    pub fn columns(&self) -> Vec<String> {
        let cols: &[&str] = match self {
            AggregateSpec::PerStore { .. } => &["store", "revenue", "profit"],
            AggregateSpec::PerProduct { .. } => &["product", "revenue", "profit"],
            AggregateSpec::PerDay { .. } => &["date", "revenue", "profit", "quantity"],
        };
        cols.iter().map(|c| c.to_string()).collect()
    }

    pub fn sql(&self) -> String {
        match self {
            AggregateSpec::PerStore { days } => format!(
                "SELECT store, sum(revenue) AS revenue, sum(profit) AS profit \
                 FROM daily_store_sales \
                 WHERE date >= today() - INTERVAL {days} DAY \
                 GROUP BY store ORDER BY revenue DESC"
            ),
            AggregateSpec::PerProduct { days } => format!(
                "SELECT product, sum(revenue) AS revenue, sum(profit) AS profit \
                 FROM daily_product_sales \
                 WHERE date >= today() - INTERVAL {days} DAY \
                 GROUP BY product ORDER BY revenue DESC"
            ),
            AggregateSpec::PerDay { days } => format!(
                "SELECT date, revenue, profit, quantity \
                 FROM daily_totals \
                 WHERE date >= today() - INTERVAL {days} DAY \
                 ORDER BY date"
            ),
        }
    }
}
