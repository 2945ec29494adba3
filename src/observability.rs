//! Logging infrastructure for the merge engine.
//!
//! Events are emitted through `tracing` with target "logmerge" and always
//! carry an `event` field for filtering.
//!
//! ## Library Integration
//!
//! The crate never initializes a global subscriber. Applications configure
//! tracing via `tracing_subscriber` or similar.
//!
//! ## Conventions
//!
//! - `event`: snake_case event name (required)
//! - `component`: subsystem ("frontier", "buffer", "merge")
//! - Use `%` for Display, `?` for Debug formatting
//! - Per-entry events stay at trace level

/// Target for all log events of this crate.
pub(crate) const LOGMERGE_TARGET: &str = "logmerge";

/// Macro for info-level log events.
///
/// # Example
/// ```ignore
/// log_info!(
///     component = "merge",
///     event = "merge_completed",
///     emitted = stats.emitted,
/// );
/// ```
macro_rules! log_info {
    ($($field:tt)*) => {
        ::tracing::info!(target: $crate::observability::LOGMERGE_TARGET, $($field)*)
    };
}

/// Macro for debug-level log events.
macro_rules! log_debug {
    ($($field:tt)*) => {
        ::tracing::debug!(target: $crate::observability::LOGMERGE_TARGET, $($field)*)
    };
}

/// Macro for trace-level log events.
macro_rules! log_trace {
    ($($field:tt)*) => {
        ::tracing::trace!(target: $crate::observability::LOGMERGE_TARGET, $($field)*)
    };
}

/// Macro for warn-level log events.
macro_rules! log_warn {
    ($($field:tt)*) => {
        ::tracing::warn!(target: $crate::observability::LOGMERGE_TARGET, $($field)*)
    };
}

pub(crate) use log_debug;
pub(crate) use log_info;
pub(crate) use log_trace;
pub(crate) use log_warn;
