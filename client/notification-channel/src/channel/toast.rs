use crate::models::{Toast, ToastLevel};
use tracing::{error, info, warn};

/// Where transient user-facing messages go.
///
/// The hosting UI implements this to render toasts; the channel calls it
/// outside of any internal lock.
pub trait ToastSink: Send + Sync + 'static {
    fn show(&self, toast: Toast);
}

/// Writes toasts to the log; used by the headless binary
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingToasts;

impl ToastSink for TracingToasts {
    fn show(&self, toast: Toast) {
        let icon = toast.icon.map(|icon| icon.glyph()).unwrap_or("");
        match toast.level {
            ToastLevel::Info => info!(icon, title = %toast.title, "{}", toast.message),
            ToastLevel::Warning => warn!(icon, title = %toast.title, "{}", toast.message),
            ToastLevel::Error => error!(icon, title = %toast.title, "{}", toast.message),
        }
    }
}
