use std::collections::VecDeque;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::timeutil::{format_iso, now_ms};

/// One recorded hit on a monitored endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestRecord {
    pub endpoint: String,
    pub ip_address: String,
    pub user_agent: String,
    pub timestamp: String,
}

/// Bounded in-process log of health/ping requests, inspectable through the
/// token-gated admin endpoints. Newest entries first.
pub struct RequestLog {
    entries: RwLock<VecDeque<RequestRecord>>,
    capacity: usize,
}

impl RequestLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub async fn record(&self, endpoint: &str, ip_address: String, user_agent: Option<&str>) {
        let record = RequestRecord {
            endpoint: endpoint.to_string(),
            ip_address,
            user_agent: user_agent.unwrap_or("unknown").to_string(),
            timestamp: format_iso(now_ms()),
        };
        let mut entries = self.entries.write().await;
        if entries.len() == self.capacity {
            entries.pop_back();
        }
        entries.push_front(record);
        metrics::counter!(crate::observability::REQUESTS_RECORDED_TOTAL).increment(1);
    }

    pub async fn all(&self, limit: usize) -> Vec<RequestRecord> {
        let entries = self.entries.read().await;
        entries.iter().take(limit).cloned().collect()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
