//! User-facing messages raised while refreshing a cache.

use std::fmt;

/// Severity of a [`CacheMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    /// The data was read, but the user should fix the source.
    Warning,
    /// The source could not be read at all.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Critical => f.write_str("critical"),
        }
    }
}

/// A message emitted through a [`MessageSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheMessage {
    /// Message severity.
    pub severity: Severity,
    /// Human readable text.
    pub text: String,
}

/// Receiver of recoverable and fatal parse messages.
///
/// # Examples
///
/// ```
/// use ilicache_core::{CacheMessage, MessageSink, Severity};
///
/// let mut messages: Vec<CacheMessage> = Vec::new();
/// messages.notify(Severity::Warning, "not UTF-8".to_owned());
/// assert_eq!(messages.len(), 1);
/// ```
pub trait MessageSink {
    /// Deliver a message.
    fn notify(&mut self, severity: Severity, text: String);
}

impl MessageSink for Vec<CacheMessage> {
    fn notify(&mut self, severity: Severity, text: String) {
        self.push(CacheMessage { severity, text });
    }
}

/// Sink forwarding messages to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl MessageSink for LogSink {
    fn notify(&mut self, severity: Severity, text: String) {
        match severity {
            Severity::Warning => log::warn!("{text}"),
            Severity::Critical => log::error!("{text}"),
        }
    }
}

impl<S: MessageSink + ?Sized> MessageSink for &mut S {
    fn notify(&mut self, severity: Severity, text: String) {
        (**self).notify(severity, text);
    }
}
