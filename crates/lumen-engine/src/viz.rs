//! Visualization building: maps an intent and a data context to renderable
//! chart specifications.
//!
//! Payloads follow the chart.js shape the frontend consumes: a `type`, a
//! `data` block with `labels` and `datasets`, and an `options` block with a
//! title and axis labels.

use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::debug;

use lumen_core::{ChartKind, DataContext, Intent, IntentKind, Visualization};

/// Upper bound on charts per response.
pub const MAX_CHARTS: usize = 3;
/// Upper bound on data points per chart; contexts with more rows keep the
/// top entries by the primary measure.
pub const MAX_POINTS: usize = 50;

const SERIES_COLORS: [(&str, &str); 5] = [
    ("rgba(54, 162, 235, 1)", "rgba(54, 162, 235, 0.7)"),
    ("rgba(255, 99, 132, 1)", "rgba(255, 99, 132, 0.7)"),
    ("rgba(75, 192, 192, 1)", "rgba(75, 192, 192, 0.7)"),
    ("rgba(255, 205, 86, 1)", "rgba(255, 205, 86, 0.7)"),
    ("rgba(153, 102, 255, 1)", "rgba(153, 102, 255, 0.7)"),
];

const PIE_BACKGROUNDS: [&str; 6] = [
    "rgba(255, 99, 132, 0.7)",
    "rgba(54, 162, 235, 0.7)",
    "rgba(255, 205, 86, 0.7)",
    "rgba(75, 192, 192, 0.7)",
    "rgba(153, 102, 255, 0.7)",
    "rgba(255, 159, 64, 0.7)",
];

const PIE_BORDERS: [&str; 6] = [
    "rgba(255, 99, 132, 1)",
    "rgba(54, 162, 235, 1)",
    "rgba(255, 205, 86, 1)",
    "rgba(75, 192, 192, 1)",
    "rgba(153, 102, 255, 1)",
    "rgba(255, 159, 64, 1)",
];

/// Builds 0..=3 chart specifications for a context. An empty context
/// produces no charts at all.
pub fn build_visualizations(intent: &Intent, context: &DataContext) -> Vec<Visualization> {
    if context.is_empty() {
        debug!("Empty context, skipping visualization");
        return Vec::new();
    }

    select_kinds(intent)
        .into_iter()
        .take(MAX_CHARTS)
        .filter_map(|kind| build_chart(kind, context))
        .collect()
}

/// Preferred chart kinds per intent, in order.
fn preferred_kinds(intent: IntentKind) -> &'static [ChartKind] {
    match intent {
        IntentKind::TrendAnalysis => &[
            ChartKind::LineChart,
            ChartKind::AreaChart,
            ChartKind::MultiLineChart,
        ],
        IntentKind::Comparison => &[
            ChartKind::BarChart,
            ChartKind::HorizontalBarChart,
            ChartKind::RadarChart,
        ],
        IntentKind::Prediction => &[ChartKind::LineChart, ChartKind::ScatterPlot],
        IntentKind::RootCause => &[ChartKind::BarChart, ChartKind::StackedBarChart],
        IntentKind::Recommendation => &[
            ChartKind::DoughnutChart,
            ChartKind::PieChart,
            ChartKind::BarChart,
        ],
        IntentKind::GeneralAnalysis => &[ChartKind::BarChart],
    }
}

fn select_kinds(intent: &Intent) -> Vec<ChartKind> {
    let suggested = &intent.suggested_visualizations;
    // An empty suggestion list, or the whole closed set (the keyword
    // fallback's answer), carries no signal; the intent table decides.
    if suggested.is_empty() || suggested.len() == ChartKind::ALL.len() {
        return preferred_kinds(intent.intent).to_vec();
    }

    let mut seen = std::collections::HashSet::new();
    suggested
        .iter()
        .copied()
        .filter(|k| seen.insert(*k))
        .collect()
}

/// One measure column extracted from a context.
struct Measure {
    column: String,
    label: String,
    values: Vec<f64>,
}

/// Labeled rows ready for chart encoding.
struct Series {
    dimension: &'static str,
    dimension_label: &'static str,
    labels: Vec<String>,
    measures: Vec<Measure>,
}

fn measure_label(column: &str) -> String {
    match column {
        "revenue" => "Revenue".to_string(),
        "profit" => "Profit".to_string(),
        "quantity" | "quantity_sold" => "Quantity".to_string(),
        "current_stock" => "Stock".to_string(),
        "total_purchases" => "Purchases".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        }
    }
}

fn is_time_shaped(kind: ChartKind) -> bool {
    matches!(
        kind,
        ChartKind::LineChart | ChartKind::AreaChart | ChartKind::MultiLineChart
    )
}

/// Rows as (label, measure values); capped to the top [`MAX_POINTS`] by the
/// primary measure, ties broken by label ascending.
fn cap_rows(mut rows: Vec<(String, Vec<f64>)>, primary: usize, keep_label_order: bool) -> Vec<(String, Vec<f64>)> {
    rows.sort_by(|a, b| {
        b.1[primary]
            .partial_cmp(&a.1[primary])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    rows.truncate(MAX_POINTS);
    if keep_label_order {
        rows.sort_by(|a, b| a.0.cmp(&b.0));
    }
    rows
}

fn series_from_rows(
    dimension: &'static str,
    dimension_label: &'static str,
    columns: &[&str],
    rows: Vec<(String, Vec<f64>)>,
) -> Series {
    let labels: Vec<String> = rows.iter().map(|(label, _)| label.clone()).collect();
    let measures = columns
        .iter()
        .enumerate()
        .map(|(i, column)| Measure {
            column: column.to_string(),
            label: measure_label(column),
            values: rows.iter().map(|(_, values)| values[i]).collect(),
        })
        .collect();

    Series {
        dimension,
        dimension_label,
        labels,
        measures,
    }
}

fn series_for(kind: ChartKind, context: &DataContext) -> Option<Series> {
    match context {
        DataContext::Sales(ctx) => {
            if is_time_shaped(kind) {
                // Aggregate by day; labels stay in date order.
                let mut per_day: BTreeMap<String, (f64, f64)> = BTreeMap::new();
                for record in &ctx.records {
                    let entry = per_day.entry(record.date.to_string()).or_insert((0.0, 0.0));
                    entry.0 += record.revenue;
                    entry.1 += record.profit;
                }
                let rows: Vec<(String, Vec<f64>)> = per_day
                    .into_iter()
                    .map(|(date, (revenue, profit))| (date, vec![revenue, profit]))
                    .collect();
                let rows = cap_rows(rows, 0, true);
                let columns: &[&str] = if kind == ChartKind::MultiLineChart {
                    &["revenue", "profit"]
                } else {
                    &["revenue"]
                };
                return Some(trim_measures(
                    series_from_rows("date", "Date", &["revenue", "profit"], rows),
                    columns.len(),
                ));
            }

            // Aggregate by product for categorical, scatter, and bubble shapes.
            let mut per_product: BTreeMap<&str, (f64, f64, f64)> = BTreeMap::new();
            for record in &ctx.records {
                let entry = per_product.entry(record.product.as_str()).or_insert((0.0, 0.0, 0.0));
                entry.0 += record.quantity_sold as f64;
                entry.1 += record.revenue;
                entry.2 += record.profit;
            }

            match kind {
                ChartKind::ScatterPlot | ChartKind::BubbleChart => {
                    let rows: Vec<(String, Vec<f64>)> = per_product
                        .into_iter()
                        .map(|(product, (qty, revenue, profit))| {
                            (product.to_string(), vec![qty, revenue, profit])
                        })
                        .collect();
                    let rows = cap_rows(rows, 1, false);
                    let columns: &[&str] = if kind == ChartKind::BubbleChart {
                        &["quantity_sold", "revenue", "profit"]
                    } else {
                        &["quantity_sold", "revenue"]
                    };
                    Some(trim_measures(
                        series_from_rows(
                            "product",
                            "Product",
                            &["quantity_sold", "revenue", "profit"],
                            rows,
                        ),
                        columns.len(),
                    ))
                }
                ChartKind::StackedBarChart => {
                    let rows: Vec<(String, Vec<f64>)> = per_product
                        .into_iter()
                        .map(|(product, (_, revenue, profit))| {
                            (product.to_string(), vec![revenue, profit])
                        })
                        .collect();
                    let rows = cap_rows(rows, 0, false);
                    Some(series_from_rows(
                        "product",
                        "Product",
                        &["revenue", "profit"],
                        rows,
                    ))
                }
                _ => {
                    let rows: Vec<(String, Vec<f64>)> = per_product
                        .into_iter()
                        .map(|(product, (_, revenue, _))| (product.to_string(), vec![revenue]))
                        .collect();
                    let rows = cap_rows(rows, 0, false);
                    Some(series_from_rows("product", "Product", &["revenue"], rows))
                }
            }
        }
        DataContext::Inventory(ctx) => {
            let mut per_product: BTreeMap<&str, f64> = BTreeMap::new();
            for item in &ctx.items {
                *per_product.entry(item.product.as_str()).or_insert(0.0) +=
                    item.current_stock as f64;
            }
            let rows: Vec<(String, Vec<f64>)> = per_product
                .into_iter()
                .map(|(product, stock)| (product.to_string(), vec![stock]))
                .collect();
            let rows = cap_rows(rows, 0, false);
            Some(series_from_rows(
                "product",
                "Product",
                &["current_stock"],
                rows,
            ))
        }
        DataContext::Customers(ctx) => {
            let mut per_region: BTreeMap<&str, f64> = BTreeMap::new();
            for customer in &ctx.customers {
                *per_region.entry(customer.region.as_str()).or_insert(0.0) +=
                    customer.total_purchases;
            }
            let rows: Vec<(String, Vec<f64>)> = per_region
                .into_iter()
                .map(|(region, purchases)| (region.to_string(), vec![purchases]))
                .collect();
            let rows = cap_rows(rows, 0, false);
            Some(series_from_rows(
                "region",
                "Region",
                &["total_purchases"],
                rows,
            ))
        }
        DataContext::Metrics(metrics) => {
            let rows = vec![
                ("Total Revenue".to_string(), vec![metrics.total_revenue]),
                ("Total Profit".to_string(), vec![metrics.total_profit]),
                ("Profit Margin".to_string(), vec![metrics.profit_margin]),
                (
                    "Customer Count".to_string(),
                    vec![metrics.customer_count as f64],
                ),
                (
                    "Average Order Value".to_string(),
                    vec![metrics.average_order_value],
                ),
                (
                    "Inventory Turnover".to_string(),
                    vec![metrics.inventory_turnover],
                ),
            ];
            Some(series_from_rows("metric", "Metric", &["value"], rows))
        }
        DataContext::Dynamic(ctx) => series_for_dynamic(ctx),
    }
}

fn trim_measures(mut series: Series, keep: usize) -> Series {
    series.measures.truncate(keep);
    series
}

/// Column-role detection for free-shape rows: the first non-numeric column
/// labels the points, numeric columns (up to three) become datasets.
fn series_for_dynamic(ctx: &lumen_core::DynamicContext) -> Option<Series> {
    let first = ctx.rows.first()?;

    let mut label_col: Option<&String> = None;
    let mut measure_cols: Vec<&String> = Vec::new();
    for col in &ctx.columns {
        match first.get(col) {
            Some(Value::Number(_)) => measure_cols.push(col),
            _ if label_col.is_none() => label_col = Some(col),
            _ => {}
        }
    }
    let label_col = label_col.or_else(|| ctx.columns.first())?;
    if measure_cols.is_empty() {
        return None;
    }
    measure_cols.truncate(3);

    let rows: Vec<(String, Vec<f64>)> = ctx
        .rows
        .iter()
        .map(|row| {
            let label = match row.get(label_col) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            let values = measure_cols
                .iter()
                .map(|col| row.get(*col).and_then(Value::as_f64).unwrap_or(0.0))
                .collect();
            (label, values)
        })
        .collect();
    let rows = cap_rows(rows, 0, false);

    let labels: Vec<String> = rows.iter().map(|(label, _)| label.clone()).collect();
    let measures = measure_cols
        .iter()
        .enumerate()
        .map(|(i, col)| Measure {
            column: col.to_string(),
            label: measure_label(col.as_str()),
            values: rows.iter().map(|(_, values)| values[i]).collect(),
        })
        .collect();

    Some(Series {
        dimension: "label",
        dimension_label: "Category",
        labels,
        measures,
    })
}

fn chart_title(kind: ChartKind, series: &Series) -> String {
    let x = series.dimension_label;
    let y = series.measures.first().map(|m| m.label.as_str()).unwrap_or("Value");
    match kind {
        ChartKind::LineChart => format!("{y} Trend over {x}"),
        ChartKind::AreaChart => format!("{y} Area Chart over {x}"),
        ChartKind::MultiLineChart => format!("Multiple Metrics over {x}"),
        ChartKind::PieChart | ChartKind::DoughnutChart => {
            format!("Distribution of {y} by {x}")
        }
        ChartKind::ScatterPlot => {
            let y = series.measures.get(1).map(|m| m.label.as_str()).unwrap_or(y);
            let x_measure = series.measures.first().map(|m| m.label.as_str()).unwrap_or(x);
            format!("{y} vs {x_measure}")
        }
        ChartKind::BubbleChart => {
            let y = series.measures.get(1).map(|m| m.label.as_str()).unwrap_or(y);
            let x_measure = series.measures.first().map(|m| m.label.as_str()).unwrap_or(x);
            let r = series.measures.get(2).map(|m| m.label.as_str()).unwrap_or("Size");
            format!("{y} vs {x_measure} (Size: {r})")
        }
        ChartKind::StackedBarChart => format!("{y} by {x} (Stacked)"),
        _ => format!("{y} by {x}"),
    }
}

fn axis_options(title: &str, x_label: &str, y_label: &str) -> Value {
    json!({
        "responsive": true,
        "plugins": {
            "title": {"display": true, "text": title},
            "legend": {"display": true}
        },
        "scales": {
            "y": {"beginAtZero": true, "title": {"display": true, "text": y_label}},
            "x": {"title": {"display": true, "text": x_label}}
        }
    })
}

fn chart_payload(kind: ChartKind, series: &Series, title: &str) -> Option<Value> {
    let labels = &series.labels;
    let x_label = series.dimension_label;
    let y_label = series
        .measures
        .first()
        .map(|m| m.label.clone())
        .unwrap_or_else(|| "Value".to_string());

    let payload = match kind {
        ChartKind::BarChart | ChartKind::HorizontalBarChart => {
            let measure = series.measures.first()?;
            let mut options = axis_options(title, x_label, &measure.label);
            if kind == ChartKind::HorizontalBarChart {
                options["indexAxis"] = json!("y");
            }
            json!({
                "type": "bar",
                "data": {
                    "labels": labels,
                    "datasets": [{
                        "label": measure.label,
                        "data": measure.values,
                        "backgroundColor": SERIES_COLORS[0].1,
                        "borderColor": SERIES_COLORS[0].0,
                        "borderWidth": 1
                    }]
                },
                "options": options
            })
        }
        ChartKind::StackedBarChart => {
            let datasets: Vec<Value> = series
                .measures
                .iter()
                .enumerate()
                .map(|(i, measure)| {
                    let (border, background) = SERIES_COLORS[i % SERIES_COLORS.len()];
                    json!({
                        "label": measure.label,
                        "data": measure.values,
                        "backgroundColor": background,
                        "borderColor": border,
                        "borderWidth": 1,
                        "stack": "Stack 0"
                    })
                })
                .collect();
            json!({
                "type": "bar",
                "data": {"labels": labels, "datasets": datasets},
                "options": {
                    "responsive": true,
                    "plugins": {
                        "title": {"display": true, "text": title},
                        "legend": {"display": true}
                    },
                    "scales": {
                        "x": {"stacked": true, "title": {"display": true, "text": x_label}},
                        "y": {"stacked": true, "beginAtZero": true, "title": {"display": true, "text": y_label}}
                    }
                }
            })
        }
        ChartKind::LineChart | ChartKind::AreaChart | ChartKind::MultiLineChart => {
            let fill = kind == ChartKind::AreaChart;
            let datasets: Vec<Value> = series
                .measures
                .iter()
                .enumerate()
                .map(|(i, measure)| {
                    let (border, background) = SERIES_COLORS[i % SERIES_COLORS.len()];
                    json!({
                        "label": measure.label,
                        "data": measure.values,
                        "borderColor": border,
                        "backgroundColor": background,
                        "borderWidth": 2,
                        "fill": fill,
                        "tension": 0.1
                    })
                })
                .collect();
            json!({
                "type": "line",
                "data": {"labels": labels, "datasets": datasets},
                "options": axis_options(title, x_label, &y_label)
            })
        }
        ChartKind::PieChart | ChartKind::DoughnutChart => {
            let measure = series.measures.first()?;
            let chart_type = if kind == ChartKind::PieChart { "pie" } else { "doughnut" };
            json!({
                "type": chart_type,
                "data": {
                    "labels": labels,
                    "datasets": [{
                        "data": measure.values,
                        "backgroundColor": PIE_BACKGROUNDS,
                        "borderColor": PIE_BORDERS,
                        "borderWidth": 1
                    }]
                },
                "options": {
                    "responsive": true,
                    "plugins": {
                        "title": {"display": true, "text": title},
                        "legend": {"display": true, "position": "bottom"}
                    }
                }
            })
        }
        ChartKind::RadarChart => {
            let measure = series.measures.first()?;
            json!({
                "type": "radar",
                "data": {
                    "labels": labels,
                    "datasets": [{
                        "label": measure.label,
                        "data": measure.values,
                        "backgroundColor": "rgba(54, 162, 235, 0.2)",
                        "borderColor": "rgba(54, 162, 235, 1)",
                        "borderWidth": 2
                    }]
                },
                "options": {
                    "responsive": true,
                    "plugins": {
                        "title": {"display": true, "text": title},
                        "legend": {"display": true}
                    },
                    "scales": {
                        "r": {"beginAtZero": true, "title": {"display": true, "text": measure.label}}
                    }
                }
            })
        }
        ChartKind::ScatterPlot => {
            let x = series.measures.first()?;
            let y = series.measures.get(1)?;
            let points: Vec<Value> = x
                .values
                .iter()
                .zip(y.values.iter())
                .map(|(x, y)| json!({"x": x, "y": y}))
                .collect();
            json!({
                "type": "scatter",
                "data": {
                    "labels": labels,
                    "datasets": [{
                        "label": title,
                        "data": points,
                        "backgroundColor": "rgba(255, 99, 132, 0.7)",
                        "borderColor": "rgba(255, 99, 132, 1)",
                        "borderWidth": 1
                    }]
                },
                "options": axis_options(title, &x.label, &y.label)
            })
        }
        ChartKind::BubbleChart => {
            let x = series.measures.first()?;
            let y = series.measures.get(1)?;
            let r = series.measures.get(2)?;
            let points: Vec<Value> = x
                .values
                .iter()
                .zip(y.values.iter())
                .zip(r.values.iter())
                .map(|((x, y), r)| json!({"x": x, "y": y, "r": r}))
                .collect();
            json!({
                "type": "bubble",
                "data": {
                    "labels": labels,
                    "datasets": [{
                        "label": title,
                        "data": points,
                        "backgroundColor": "rgba(255, 99, 132, 0.6)",
                        "borderColor": "rgba(255, 99, 132, 1)",
                        "borderWidth": 1
                    }]
                },
                "options": axis_options(title, &x.label, &y.label)
            })
        }
    };

    Some(payload)
}

fn build_chart(kind: ChartKind, context: &DataContext) -> Option<Visualization> {
    let series = series_for(kind, context)?;
    if series.labels.is_empty() {
        return None;
    }

    let title = chart_title(kind, &series);
    let chart_data = chart_payload(kind, &series, &title)?;

    let mut columns_used = vec![series.dimension.to_string()];
    columns_used.extend(series.measures.iter().map(|m| m.column.clone()));

    Some(Visualization {
        chart_type: kind,
        title,
        data_source: context.data_source_tag().to_string(),
        data_points: series.labels.len(),
        columns_used,
        chart_data,
    })
}
