pub mod probe;

pub use probe::HttpProbe;

use std::fmt::Write;

/// Flattens an error and its sources into one message.
pub(crate) fn report(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = format!("{}", err);
    while let Some(src) = err.source() {
        let _ = write!(s, "\n\nCaused by: {}", src);
        err = src;
    }
    s
}
