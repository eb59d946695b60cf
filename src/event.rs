//! Event and log callback system.
//!
//! Hosts that do not install a `tracing` subscriber can still observe the
//! engine through these callbacks. Every [`emit_log`] call is also forwarded
//! to `tracing` at the matching level.

use std::sync::{Mutex, OnceLock};

/// Log level for debug callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Emitted when the idle fill has resolved every line size.
pub const EVENT_IDLE_FILL_COMPLETE: &str = "idle_fill_complete";
/// Emitted with the comma-separated lines that lost their marker.
pub const EVENT_MARKERS_REMOVED: &str = "markers_removed";

type EventCallback = Box<dyn Fn(&str, &str) + Send + Sync + 'static>;
type LogCallback = Box<dyn Fn(LogLevel, &str) + Send + Sync + 'static>;

fn event_callback() -> &'static Mutex<Option<EventCallback>> {
    static CALLBACK: OnceLock<Mutex<Option<EventCallback>>> = OnceLock::new();
    CALLBACK.get_or_init(|| Mutex::new(None))
}

fn log_callback() -> &'static Mutex<Option<LogCallback>> {
    static CALLBACK: OnceLock<Mutex<Option<LogCallback>>> = OnceLock::new();
    CALLBACK.get_or_init(|| Mutex::new(None))
}

/// Set the global event callback.
pub fn set_event_callback<F>(callback: F)
where
    F: Fn(&str, &str) + Send + Sync + 'static,
{
    if let Ok(mut guard) = event_callback().lock() {
        *guard = Some(Box::new(callback));
    }
}

/// Remove the global event callback.
pub fn clear_event_callback() {
    if let Ok(mut guard) = event_callback().lock() {
        *guard = None;
    }
}

/// Emit an event to the registered callback.
pub fn emit_event(name: &str, data: &str) {
    tracing::trace!(event = name, data, "engine event");
    if let Ok(guard) = event_callback().lock() {
        if let Some(callback) = guard.as_ref() {
            callback(name, data);
        }
    }
}

/// Set the global log callback.
pub fn set_log_callback<F>(callback: F)
where
    F: Fn(LogLevel, &str) + Send + Sync + 'static,
{
    if let Ok(mut guard) = log_callback().lock() {
        *guard = Some(Box::new(callback));
    }
}

/// Remove the global log callback.
pub fn clear_log_callback() {
    if let Ok(mut guard) = log_callback().lock() {
        *guard = None;
    }
}

/// Emit a log message to `tracing` and the registered callback.
pub fn emit_log(level: LogLevel, message: &str) {
    match level {
        LogLevel::Debug => tracing::debug!("{message}"),
        LogLevel::Info => tracing::info!("{message}"),
        LogLevel::Warn => tracing::warn!("{message}"),
        LogLevel::Error => tracing::error!("{message}"),
    }
    if let Ok(guard) = log_callback().lock() {
        if let Some(callback) = guard.as_ref() {
            callback(level, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Callbacks are process-global; keep everything in one test so parallel
    // test threads cannot race on the registry.
    #[test]
    fn test_callbacks_receive_messages() {
        let events = Arc::new(AtomicUsize::new(0));
        let events_clone = Arc::clone(&events);
        set_event_callback(move |name, _data| {
            if name == "unit_test_event" {
                events_clone.fetch_add(1, Ordering::SeqCst);
            }
        });
        emit_event("unit_test_event", "{}");
        assert_eq!(events.load(Ordering::SeqCst), 1);
        clear_event_callback();
        emit_event("unit_test_event", "{}");
        assert_eq!(events.load(Ordering::SeqCst), 1);

        let warnings = Arc::new(AtomicUsize::new(0));
        let warnings_clone = Arc::clone(&warnings);
        set_log_callback(move |level, msg| {
            if level == LogLevel::Warn && msg == "unit test warning" {
                warnings_clone.fetch_add(1, Ordering::SeqCst);
            }
        });
        emit_log(LogLevel::Warn, "unit test warning");
        emit_log(LogLevel::Info, "unit test warning");
        assert_eq!(warnings.load(Ordering::SeqCst), 1);
        clear_log_callback();
    }
}
