pub mod probe;
pub mod result;

pub use probe::Prober;
pub use result::{ProbeOutcome, ResultRecord};

use std::future::Future;
use std::time::Instant;

use crate::error::ProbeFailure;

/// One timed round trip over a single transport.
///
/// Implementations enforce their own timeout and report every problem as a
/// [`ProbeFailure`]; the returned value is the elapsed time in milliseconds.
pub trait RoundTrip: Send + Sync {
    fn round_trip(&self, url: &str) -> impl Future<Output = Result<f64, ProbeFailure>> + Send;
}

pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
