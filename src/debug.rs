//! Diagnostics plumbing: the stderr log layer and panic helpers.

mod log;

pub use log::*;

/// Extract a human readable message from a panic payload.
pub fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Route panics through tracing instead of the default stderr printer.
/// Validator panics are caught per-case and reported as failed results, so
/// the raw dump would only add noise.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let message = info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "Unknown panic".to_string());

        match info.location() {
            Some(location) => tracing::debug!("panic at {location}: {message}"),
            None => tracing::debug!("panic: {message}"),
        }
    }));
}
