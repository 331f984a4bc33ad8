//! Transient notifications shown over the active screen.
use std::time::{Duration, Instant};

/// How long a toast stays visible unless configured otherwise.
pub const DEFAULT_TOAST_LIFETIME: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub expires_at: Instant,
}

#[derive(Clone, Debug)]
pub struct Toasts {
    items: Vec<Toast>,
    lifetime: Duration,
}

impl Toasts {
    pub fn new(lifetime: Duration) -> Self {
        Self { items: Vec::new(), lifetime }
    }

    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(?kind, %message, "toast");
        self.items.push(Toast {
            kind,
            message,
            expires_at: Instant::now() + self.lifetime,
        });
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Error, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Info, message);
    }

    /// Drop every toast that has expired at `now`.
    pub fn prune(&mut self, now: Instant) {
        self.items.retain(|t| t.expires_at > now);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Most recent toast, if any.
    pub fn last(&self) -> Option<&Toast> {
        self.items.last()
    }

    pub fn contains(&self, kind: ToastKind, message: &str) -> bool {
        self.items.iter().any(|t| t.kind == kind && t.message == message)
    }
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_LIFETIME)
    }
}
