//! Process-wide LLM cost accounting.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
struct LedgerInner {
    total_cost: f64,
    total_tokens: u64,
    request_count: u64,
}

/// Cumulative spend across all LLM calls in this process. Counters only
/// ever grow; updates and reads are serialized by a mutex so snapshots are
/// always consistent.
#[derive(Debug, Default)]
pub struct CostLedger {
    inner: Mutex<LedgerInner>,
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one successful call: token usage and its computed cost.
    pub fn record(&self, tokens: u64, cost: f64) {
        let mut inner = self.inner.lock();
        inner.total_tokens += tokens;
        inner.total_cost += cost;
        inner.request_count += 1;
    }

    pub fn summary(&self) -> CostSummary {
        let inner = self.inner.lock();
        CostSummary {
            total_cost: (inner.total_cost * 10_000.0).round() / 10_000.0,
            total_tokens: inner.total_tokens,
            request_count: inner.request_count,
            average_cost_per_request: if inner.request_count == 0 {
                0.0
            } else {
                let avg = inner.total_cost / inner.request_count as f64;
                (avg * 10_000.0).round() / 10_000.0
            },
        }
    }

    pub fn total_cost(&self) -> f64 {
        self.inner.lock().total_cost
    }
}

/// Point-in-time view of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub total_cost: f64,
    pub total_tokens: u64,
    pub request_count: u64,
    pub average_cost_per_request: f64,
}
