use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::endpoint::EndpointAddress;
use crate::error::ProbeFailure;

/// Outcome of one timed round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Success { elapsed_ms: f64 },
    Failure(ProbeFailure),
}

impl ProbeOutcome {
    pub fn elapsed_ms(&self) -> Option<f64> {
        match self {
            ProbeOutcome::Success { elapsed_ms } => Some(*elapsed_ms),
            ProbeOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ProbeFailure> {
        match self {
            ProbeOutcome::Success { .. } => None,
            ProbeOutcome::Failure(failure) => Some(failure),
        }
    }
}

impl From<Result<f64, ProbeFailure>> for ProbeOutcome {
    fn from(result: Result<f64, ProbeFailure>) -> Self {
        match result {
            Ok(elapsed_ms) => ProbeOutcome::Success { elapsed_ms },
            Err(failure) => ProbeOutcome::Failure(failure),
        }
    }
}

/// One completed probe attempt, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub endpoint: EndpointAddress,
    pub observed_at: DateTime<Utc>,
    pub outcome: ProbeOutcome,
}

impl ResultRecord {
    /// Stamps the record with the current time.
    pub fn new(endpoint: EndpointAddress, outcome: ProbeOutcome) -> Self {
        Self {
            endpoint,
            observed_at: Utc::now(),
            outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Success { .. })
    }

    pub fn elapsed_ms(&self) -> Option<f64> {
        self.outcome.elapsed_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeErrorKind;
    use serde_json::{Value, json};

    #[test]
    fn test_outcome_json_shape() {
        let success = serde_json::to_value(ProbeOutcome::Success { elapsed_ms: 12.5 }).expect("serialize");
        assert_eq!(success, json!({"status": "success", "elapsed_ms": 12.5}));

        let failure = ProbeOutcome::Failure(ProbeFailure::new(ProbeErrorKind::HttpStatusError, "HTTP error! Status: 502"));
        let failure = serde_json::to_value(failure).expect("serialize");
        assert_eq!(
            failure,
            json!({"status": "failure", "kind": "HttpStatusError", "message": "HTTP error! Status: 502"})
        );
    }

    #[test]
    fn test_record_accessors() {
        let ok = ResultRecord::new("https://a".into(), Ok(3.0).into());
        assert!(ok.is_success());
        assert_eq!(ok.elapsed_ms(), Some(3.0));
        assert!(ok.outcome.failure().is_none());

        let failed = ResultRecord::new("ftp://b".into(), Err(ProbeFailure::invalid_address()).into());
        assert!(!failed.is_success());
        assert_eq!(failed.elapsed_ms(), None);
        assert_eq!(failed.outcome.failure().map(|f| f.kind), Some(ProbeErrorKind::InvalidAddressError));

        let value: Value = serde_json::to_value(&failed).expect("serialize");
        assert_eq!(value["endpoint"], "ftp://b");
        assert!(value["observed_at"].is_string());
    }
}
