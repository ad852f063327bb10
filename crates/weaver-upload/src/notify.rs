//! Fire-and-forget user notifications.

/// Receives user-facing messages from the pipeline. Never fails.
pub trait Notifier {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warning(&self, message: &str);
}

/// Discards every notification.
impl Notifier for () {
    fn success(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn success(&self, message: &str) {
        (**self).success(message)
    }

    fn error(&self, message: &str) {
        (**self).error(message)
    }

    fn warning(&self, message: &str) {
        (**self).warning(message)
    }
}

/// Routes notifications to `tracing` when no UI is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!(target: "weaver::notify", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "weaver::notify", "{message}");
    }

    fn warning(&self, message: &str) {
        tracing::warn!(target: "weaver::notify", "{message}");
    }
}
