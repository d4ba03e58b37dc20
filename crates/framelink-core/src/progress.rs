//! Upload progress channel.
//!
//! Backends report percentages through a [`ProgressReporter`]; observers hold
//! the matching `watch::Receiver`. Percentages never go backwards, stay within
//! [0, 100], and nothing is reported after a terminal state.

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadProgress {
    /// Percentage of bytes handed to the transport
    InProgress(u8),
    Completed,
    Failed(String),
}

impl UploadProgress {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, UploadProgress::InProgress(_))
    }

    /// Percentage to display; `None` for a failure.
    pub fn percent(&self) -> Option<u8> {
        match self {
            UploadProgress::InProgress(pct) => Some(*pct),
            UploadProgress::Completed => Some(100),
            UploadProgress::Failed(_) => None,
        }
    }
}

/// Sending half of the progress channel. Clones report into the same channel.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: Arc<watch::Sender<UploadProgress>>,
}

impl ProgressReporter {
    pub fn channel() -> (Self, watch::Receiver<UploadProgress>) {
        let (tx, rx) = watch::channel(UploadProgress::InProgress(0));
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Report a percentage. Values above 100 are clamped; values below the
    /// last report are ignored.
    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        self.tx.send_if_modified(|current| match current {
            UploadProgress::InProgress(previous) if percent > *previous => {
                *current = UploadProgress::InProgress(percent);
                true
            }
            _ => false,
        });
    }

    /// Report `sent` of `total` bytes.
    pub fn report_bytes(&self, sent: u64, total: u64) {
        let percent = if total == 0 {
            100
        } else {
            (sent.min(total) * 100 / total) as u8
        };
        self.report(percent);
    }

    pub fn complete(&self) {
        self.finish(UploadProgress::Completed);
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.finish(UploadProgress::Failed(message.into()));
    }

    pub fn current(&self) -> UploadProgress {
        self.tx.borrow().clone()
    }

    fn finish(&self, terminal: UploadProgress) {
        self.tx.send_if_modified(|current| {
            if current.is_terminal() {
                return false;
            }
            *current = terminal;
            true
        });
    }
}
