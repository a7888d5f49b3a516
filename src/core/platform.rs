// Platform recognition: URL canonicalization and pattern validation.
// Pure functions, no network access.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static YOUTUBE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.be)/.+").unwrap());

static SOUNDCLOUD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(https?://)?(www\.|m\.)?soundcloud\.com/.+").unwrap());

/// Supported source platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    YouTube,
    SoundCloud,
}

impl Platform {
    pub fn name(&self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube",
            Platform::SoundCloud => "SoundCloud",
        }
    }

    /// Default album tag for audio ripped from this platform
    pub fn default_album(&self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube Audio",
            Platform::SoundCloud => "SoundCloud",
        }
    }

    /// Canonicalize a URL for this platform. Adds an https scheme when none
    /// is present and rewrites the shortened `youtu.be/<id>` form to the
    /// canonical watch URL. Idempotent; never performs I/O.
    pub fn normalize(&self, url: &str) -> String {
        let trimmed = url.trim();
        let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        match self {
            Platform::YouTube => {
                if let Ok(parsed) = Url::parse(&with_scheme) {
                    if parsed.host_str() == Some("youtu.be") {
                        let id = parsed.path().trim_start_matches('/');
                        if !id.is_empty() {
                            return format!("https://www.youtube.com/watch?v={}", id);
                        }
                    }
                }
                with_scheme
            }
            Platform::SoundCloud => with_scheme,
        }
    }

    /// Check a URL against this platform's pattern (domain allow-list plus a
    /// required path). Returns false on malformed input rather than erroring.
    pub fn validate(&self, url: &str) -> bool {
        match self {
            Platform::YouTube => YOUTUBE_PATTERN.is_match(url),
            Platform::SoundCloud => SOUNDCLOUD_PATTERN.is_match(url),
        }
    }
}
