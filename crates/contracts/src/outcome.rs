//! Delivery outcomes and the aggregate run result

use serde::Serialize;
use std::time::Duration;

/// Result of attempting HTTP delivery of one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    /// Sequence index (1-based, arrival order)
    pub index: u64,

    /// Record common name (display only)
    pub common_name: String,

    /// HTTP status code, 0 if no response was received
    pub status: u16,

    /// Canonical reason phrase for `status`
    pub status_text: String,

    /// Dispatch to response-header latency
    pub latency_ms: u64,

    /// `true` iff `status` is in `[200, 300)`
    pub success: bool,

    /// Failure description (transport error or non-2xx status)
    pub error: Option<String>,
}

impl DeliveryOutcome {
    /// Outcome for a request that produced a response
    pub fn responded(
        index: u64,
        common_name: impl Into<String>,
        status: u16,
        status_text: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        let status_text = status_text.into();
        let success = (200..300).contains(&status);
        let error = (!success).then(|| {
            format!("received status {} {}", status, status_text)
                .trim_end()
                .to_string()
        });

        Self {
            index,
            common_name: common_name.into(),
            status,
            status_text,
            latency_ms,
            success,
            error,
        }
    }

    /// Outcome for a request that never produced a response
    pub fn no_response(
        index: u64,
        common_name: impl Into<String>,
        latency_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        let mut error = error.into();
        if error.is_empty() {
            error = "no response received".to_string();
        }

        Self {
            index,
            common_name: common_name.into(),
            status: 0,
            status_text: String::new(),
            latency_ms,
            success: false,
            error: Some(error),
        }
    }
}

/// Aggregate over all delivery outcomes of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunResult {
    /// Number of delivery outcomes
    pub total: u64,

    /// Outcomes with `success == true`
    pub succeeded: u64,

    /// Outcomes with `success == false`
    pub failed: u64,

    /// Records processed (with or without an HTTP sink)
    pub records: u64,

    /// Wall-clock duration of the run
    pub elapsed: Duration,

    /// Integer mean of outcome latencies
    pub avg_latency_ms: u64,

    /// Message of a stream-level failure, if the stream ended in error
    pub stream_error: Option<String>,
}

impl RunResult {
    /// Compute the aggregate from the ordered outcome ledger
    pub fn from_outcomes(outcomes: &[DeliveryOutcome], records: u64, elapsed: Duration) -> Self {
        let total = outcomes.len() as u64;
        let succeeded = outcomes.iter().filter(|o| o.success).count() as u64;
        let total_latency: u64 = outcomes.iter().map(|o| o.latency_ms).sum();
        let avg_latency_ms = if total > 0 { total_latency / total } else { 0 };

        Self {
            total,
            succeeded,
            failed: total - succeeded,
            records,
            elapsed,
            avg_latency_ms,
            stream_error: None,
        }
    }

    /// Mark the run as ended by a stream-level error
    pub fn with_stream_error(mut self, message: impl Into<String>) -> Self {
        self.stream_error = Some(message.into());
        self
    }

    /// Delivery success rate in percent, rounded to one decimal
    pub fn success_pct(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let pct = self.succeeded as f64 / self.total as f64 * 100.0;
        (pct * 10.0).round() / 10.0
    }

    /// Overall success: no failed delivery and no stream error
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.stream_error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(index: u64, status: u16, latency_ms: u64) -> DeliveryOutcome {
        DeliveryOutcome::responded(index, "example.com", status, "", latency_ms)
    }

    #[test]
    fn test_success_iff_2xx() {
        assert!(outcome(1, 200, 1).success);
        assert!(outcome(1, 204, 1).success);
        assert!(outcome(1, 299, 1).success);
        assert!(!outcome(1, 199, 1).success);
        assert!(!outcome(1, 300, 1).success);
        assert!(!outcome(1, 500, 1).success);
    }

    #[test]
    fn test_non_2xx_carries_error() {
        let o = DeliveryOutcome::responded(3, "cn", 404, "Not Found", 12);
        assert_eq!(o.error.as_deref(), Some("received status 404 Not Found"));
        assert!(DeliveryOutcome::responded(3, "cn", 200, "OK", 12).error.is_none());
    }

    #[test]
    fn test_no_response_has_error_and_zero_status() {
        let o = DeliveryOutcome::no_response(1, "cn", 10_000, "");
        assert_eq!(o.status, 0);
        assert!(!o.success);
        assert!(!o.error.unwrap().is_empty());
    }

    #[test]
    fn test_run_result_aggregate() {
        let outcomes = vec![outcome(1, 200, 10), outcome(2, 500, 20), outcome(3, 201, 30)];
        let result = RunResult::from_outcomes(&outcomes, 3, Duration::from_millis(1500));

        assert_eq!(result.total, 3);
        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.avg_latency_ms, 20);
        assert_eq!(result.success_pct(), 66.7);
        assert!(!result.is_success());
    }

    #[test]
    fn test_run_result_empty() {
        let result = RunResult::from_outcomes(&[], 0, Duration::ZERO);
        assert_eq!(result.avg_latency_ms, 0);
        assert_eq!(result.success_pct(), 0.0);
        assert!(result.is_success());
    }

    #[test]
    fn test_stream_error_fails_run() {
        let outcomes = vec![outcome(1, 200, 5)];
        let result = RunResult::from_outcomes(&outcomes, 1, Duration::ZERO).with_stream_error("boom");
        assert!(!result.is_success());
    }
}
