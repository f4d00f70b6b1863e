//! Metrics/tracing hooks.
//!
//! Key/value pairs are reported as trace events under a `rowchain` span.
//! Wire a subscriber in the binary layer to collect them. Values are only
//! rendered when the `tracing` feature is on.

use std::fmt::Display;

#[cfg(feature = "tracing")]
pub fn emit_span(event: &str, key_values: &[(&str, &dyn Display)]) {
    let span = tracing::span!(tracing::Level::TRACE, "rowchain", event);
    let _entered = span.enter();
    for (k, v) in key_values {
        tracing::trace!(%event, %k, %v, "metric");
    }
}

#[cfg(not(feature = "tracing"))]
pub fn emit_span(_event: &str, _key_values: &[(&str, &dyn Display)]) {}
