use std::sync::Mutex;

use framelink_core::models::PhotoMetadata;
use framelink_core::UploadProgress;
use framelink_services::PhotoPresenter;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Turn a CLI argument into a URL carrying the short-link parameter.
///
/// Full URLs are used as given; a bare code is placed on `origin`.
pub fn link_url(input: &str, origin: &str, param: &str) -> String {
    if input.contains("://") || input.contains('#') {
        input.to_string()
    } else {
        framelink_core::HashParams::compose_link(origin, param, input)
    }
}

/// Show the first characters of a secret only.
pub fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "*".repeat(secret.chars().count())
    } else {
        format!("{}{}", visible, "*".repeat(8))
    }
}

/// One progress line for an upload.
pub fn progress_line(progress: &UploadProgress) -> String {
    match progress {
        UploadProgress::InProgress(pct) => format!("Uploading... {:>3}%", pct),
        UploadProgress::Completed => "Upload complete".to_string(),
        UploadProgress::Failed(message) => format!("Upload failed: {}", message),
    }
}

/// One table row for a photo.
pub fn photo_row(photo: &PhotoMetadata) -> String {
    let uploaded = photo
        .uploaded_at()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<28} {:<30} {:<12} {}",
        truncate_string(&photo.id, 28),
        truncate_string(&photo.name, 30),
        truncate_string(&photo.content_type, 12),
        uploaded
    )
}

/// Presenter for the terminal: remembers what the landing flow produced.
#[derive(Default)]
pub struct TerminalPresenter {
    opened: Mutex<Option<PhotoMetadata>>,
    error: Mutex<Option<String>>,
}

impl TerminalPresenter {
    pub fn opened(&self) -> Option<PhotoMetadata> {
        self.opened
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn error(&self) -> Option<String> {
        self.error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl PhotoPresenter for TerminalPresenter {
    fn open_photo(&self, photo: &PhotoMetadata) {
        *self
            .opened
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(photo.clone());
    }

    fn show_error(&self, message: &str) {
        *self
            .error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(message.to_string());
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use framelink_core::models::BlobRef;

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn truncate_string_multibyte() {
        assert_eq!(truncate_string("été à la plage", 6), "été...");
    }

    #[test]
    fn link_url_accepts_codes_and_urls() {
        assert_eq!(
            link_url("abc123", "https://g.example.com", "s"),
            "https://g.example.com/#s=abc123"
        );
        assert_eq!(
            link_url("https://other.example.com/#s=xyz", "https://g.example.com", "s"),
            "https://other.example.com/#s=xyz"
        );
    }

    #[test]
    fn mask_secret_hides_tail() {
        assert_eq!(mask_secret("abcdefgh"), "abcd********");
        assert_eq!(mask_secret("abc"), "***");
    }

    #[test]
    fn progress_lines() {
        assert_eq!(progress_line(&UploadProgress::InProgress(5)), "Uploading...   5%");
        assert_eq!(progress_line(&UploadProgress::Completed), "Upload complete");
        assert_eq!(
            progress_line(&UploadProgress::Failed("boom".to_string())),
            "Upload failed: boom"
        );
    }

    #[test]
    fn presenter_records_outcome() {
        let presenter = TerminalPresenter::default();
        presenter.show_error("This share link is invalid or has expired.");
        assert!(presenter.opened().is_none());
        assert!(presenter.error().is_some());

        presenter.open_photo(&PhotoMetadata {
            id: "p1".to_string(),
            name: "p1.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            blob: BlobRef {
                direct_url: "https://cdn.example.com/p1".to_string(),
            },
            timestamp: 0,
        });
        assert_eq!(presenter.opened().map(|p| p.id).as_deref(), Some("p1"));
    }
}
