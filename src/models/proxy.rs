use serde::{Deserialize, Serialize};

/// Smoothing constant in the smart score denominator.
///
/// Keeps an untested (0, 0) proxy at a score of exactly 0.
pub const SCORE_SMOOTHING: f64 = 0.1;

/// Success/failure counters recorded for one proxy identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyStats {
    pub success: u64,
    pub failure: u64,
}

impl ProxyStats {
    pub fn new(success: u64, failure: u64) -> Self {
        Self { success, failure }
    }

    /// Total reported requests
    pub fn total(&self) -> u64 {
        self.success + self.failure
    }

    /// Smart selection score: `success / (success + failure + 0.1)`
    pub fn score(&self) -> f64 {
        let success = self.success as f64;
        success / (success + self.failure as f64 + SCORE_SMOOTHING)
    }

    /// Success rate as a percentage rounded to two decimals, 0 when unused
    pub fn success_rate(&self) -> f64 {
        percentage(self.success, self.total())
    }

    /// Whether the failure count has reached the eviction threshold
    pub fn is_bad(&self, failure_threshold: u64) -> bool {
        self.failure >= failure_threshold
    }
}

/// `part / whole * 100`, rounded to two decimals; 0 when `whole` is 0
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let rate = part as f64 / whole as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

/// Endpoint pair handed to callers for one selected proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyEndpoints {
    /// Identity to pass back to `report_success` / `report_failure`
    pub identity: String,
    /// Endpoint for plain traffic
    pub http: String,
    /// Endpoint for secure traffic
    pub https: String,
}

/// A proxy offered by the provisioning provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedProxy {
    pub username: String,
    pub password: String,
    pub address: String,
    pub port: u16,
    pub valid: bool,
}

impl ProvisionedProxy {
    /// Identity stored in the catalog: `username:password@address:port`
    pub fn identity(&self) -> String {
        format!(
            "{}:{}@{}:{}",
            self.username, self.password, self.address, self.port
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_formula() {
        assert_eq!(ProxyStats::new(0, 0).score(), 0.0);
        assert!((ProxyStats::new(5, 0).score() - 5.0 / 5.1).abs() < 1e-12);
        assert!((ProxyStats::new(1, 1).score() - 1.0 / 2.1).abs() < 1e-12);
        assert_eq!(ProxyStats::new(0, 7).score(), 0.0);
    }

    #[test]
    fn test_score_monotonicity() {
        for success in 0..20u64 {
            for failure in 0..20u64 {
                let base = ProxyStats::new(success, failure).score();
                assert!(ProxyStats::new(success + 1, failure).score() >= base);
                assert!(ProxyStats::new(success, failure + 1).score() <= base);
            }
        }
    }

    #[test]
    fn test_success_rate_rounding() {
        assert_eq!(ProxyStats::new(0, 0).success_rate(), 0.0);
        assert_eq!(ProxyStats::new(3, 1).success_rate(), 75.0);
        assert_eq!(ProxyStats::new(1, 2).success_rate(), 33.33);
        assert_eq!(ProxyStats::new(2, 1).success_rate(), 66.67);
        assert_eq!(ProxyStats::new(0, 2).success_rate(), 0.0);
    }

    #[test]
    fn test_is_bad_threshold() {
        assert!(!ProxyStats::new(0, 2).is_bad(3));
        assert!(ProxyStats::new(0, 3).is_bad(3));
        assert!(ProxyStats::new(10, 4).is_bad(3));
    }

    #[test]
    fn test_provisioned_identity() {
        let proxy = ProvisionedProxy {
            username: "user".to_string(),
            password: "pass".to_string(),
            address: "10.0.0.1".to_string(),
            port: 8080,
            valid: true,
        };
        assert_eq!(proxy.identity(), "user:pass@10.0.0.1:8080");
    }
}
