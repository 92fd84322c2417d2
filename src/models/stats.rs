use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::proxy::{percentage, ProxyStats};

/// Aggregate pool statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStats {
    pub total_proxies: u64,
    pub good_proxies: u64,
    pub bad_proxies: u64,
    pub total_requests: u64,
    pub total_success: u64,
    pub total_failure: u64,
    /// Percentage (0-100), two decimals
    pub overall_success_rate: f64,
    pub failure_threshold: u64,
    pub strategy: String,
    /// Per-proxy breakdown in catalog order
    pub proxy_details: Vec<ProxyStatsDetail>,
    pub generated_at: DateTime<Utc>,
}

/// Per-proxy statistics row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyStatsDetail {
    pub identity: String,
    pub success: u64,
    pub failure: u64,
    pub total: u64,
    pub success_rate: f64,
}

impl ProxyStatsDetail {
    pub fn new(identity: impl Into<String>, stats: ProxyStats) -> Self {
        Self {
            identity: identity.into(),
            success: stats.success,
            failure: stats.failure,
            total: stats.total(),
            success_rate: stats.success_rate(),
        }
    }
}

impl PoolStats {
    /// Build the aggregate report from per-proxy counters
    pub fn collect<I>(entries: I, failure_threshold: u64, strategy: &str) -> Self
    where
        I: IntoIterator<Item = (String, ProxyStats)>,
    {
        let mut proxy_details = Vec::new();
        let mut total_success = 0u64;
        let mut total_failure = 0u64;
        let mut bad_proxies = 0u64;

        for (identity, stats) in entries {
            total_success += stats.success;
            total_failure += stats.failure;
            if stats.is_bad(failure_threshold) {
                bad_proxies += 1;
            }
            proxy_details.push(ProxyStatsDetail::new(identity, stats));
        }

        let total_proxies = proxy_details.len() as u64;
        let total_requests = total_success + total_failure;

        Self {
            total_proxies,
            good_proxies: total_proxies - bad_proxies,
            bad_proxies,
            total_requests,
            total_success,
            total_failure,
            overall_success_rate: percentage(total_success, total_requests),
            failure_threshold,
            strategy: strategy.to_string(),
            proxy_details,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_aggregates() {
        let stats = PoolStats::collect(
            vec![
                ("a".to_string(), ProxyStats::new(3, 1)),
                ("b".to_string(), ProxyStats::new(0, 2)),
            ],
            3,
            "smart",
        );

        assert_eq!(stats.total_proxies, 2);
        assert_eq!(stats.good_proxies, 2);
        assert_eq!(stats.bad_proxies, 0);
        assert_eq!(stats.total_requests, 6);
        assert_eq!(stats.total_success, 3);
        assert_eq!(stats.total_failure, 3);
        assert_eq!(stats.overall_success_rate, 50.0);
        assert_eq!(stats.proxy_details[0].success_rate, 75.0);
        assert_eq!(stats.proxy_details[1].success_rate, 0.0);
        assert_eq!(stats.proxy_details[1].total, 2);
    }

    #[test]
    fn test_collect_counts_bad_proxies() {
        let stats = PoolStats::collect(
            vec![
                ("a".to_string(), ProxyStats::new(1, 5)),
                ("b".to_string(), ProxyStats::new(0, 0)),
            ],
            3,
            "random",
        );

        assert_eq!(stats.bad_proxies, 1);
        assert_eq!(stats.good_proxies, 1);
    }

    #[test]
    fn test_collect_empty() {
        let stats = PoolStats::collect(Vec::new(), 3, "sequential");

        assert_eq!(stats.total_proxies, 0);
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.overall_success_rate, 0.0);
        assert!(stats.proxy_details.is_empty());
    }
}
