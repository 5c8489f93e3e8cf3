//! User-facing error notification
//!
//! Best-effort failures (a cache that cannot persist, a corrupt link
//! document) never reach callers as errors. They are logged, and an
//! [`ErrorReporter`] forwards a short message to an injected [`Notifier`]
//! with a per-instance throttle so a failing store cannot flood the user.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{error, warn};

use crate::errors::AppError;

/// Receiver of user-facing notification messages
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Notifier that only emits a tracing event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        warn!(target: "favicon_resolver::notify", "{}", message);
    }
}

/// Logs errors and forwards them, throttled, to a notifier
pub struct ErrorReporter {
    notifier: Arc<dyn Notifier>,
    min_interval: Duration,
    last_notified: Mutex<Option<Instant>>,
}

impl std::fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("min_interval", &self.min_interval)
            .finish_non_exhaustive()
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(
            Arc::new(TracingNotifier),
            crate::config::defaults::DEFAULT_NOTIFICATION_INTERVAL,
        )
    }
}

impl ErrorReporter {
    pub fn new(notifier: Arc<dyn Notifier>, min_interval: Duration) -> Self {
        Self {
            notifier,
            min_interval,
            last_notified: Mutex::new(None),
        }
    }

    /// Log `err` and notify unless a notification went out within `min_interval`
    ///
    /// Returns whether the notifier was called.
    pub fn report(&self, context: &str, err: &AppError) -> bool {
        error!("{}: {}", context, err);

        let now = Instant::now();
        let mut last = self
            .last_notified
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = *last
            && now.duration_since(previous) < self.min_interval
        {
            return false;
        }
        *last = Some(now);
        drop(last);

        self.notifier.notify(&format!("{context}: {err}"));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn test_throttles_within_interval() {
        let notifier = Arc::new(RecordingNotifier::default());
        let reporter = ErrorReporter::new(notifier.clone(), Duration::from_secs(60));

        assert!(reporter.report("cache persist", &AppError::internal("disk full")));
        assert!(!reporter.report("cache persist", &AppError::internal("disk full")));

        let messages = notifier.messages.lock().unwrap();
        assert_eq!(
            messages.as_slice(),
            ["cache persist: Internal error: disk full"]
        );
    }

    #[test]
    fn test_zero_interval_never_throttles() {
        let notifier = Arc::new(RecordingNotifier::default());
        let reporter = ErrorReporter::new(notifier.clone(), Duration::ZERO);

        for _ in 0..3 {
            assert!(reporter.report("link sync", &AppError::validation("bad")));
        }
        assert_eq!(notifier.messages.lock().unwrap().len(), 3);
    }

    #[test]
    #[traced_test]
    fn test_throttled_reports_are_still_logged() {
        let reporter = ErrorReporter::new(Arc::new(TracingNotifier), Duration::from_secs(60));
        reporter.report("first", &AppError::internal("one"));
        reporter.report("second", &AppError::internal("two"));

        assert!(logs_contain("first: Internal error: one"));
        assert!(logs_contain("second: Internal error: two"));
    }
}
