// Fetch orchestration: drives the extraction engine through resolve and
// download phases with bounded retries and at most one fallback-format
// switch per invocation.

use log::{info, warn};
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crate::core::engine::{DownloadRequest, ExtractionEngine, FormatInfo, ProgressSink};
use crate::core::platform::Platform;
use crate::core::profile::{FetchProfile, MediaKind};
use crate::core::tagger::{AudioTagger, TagSet};
use crate::core::validation;
use crate::error::{FetchError, Result};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Result of a completed, verified download. Only constructed after the
/// output file has been confirmed to exist on disk.
#[derive(Debug, Clone)]
pub struct MediaRecord {
    pub title: String,
    pub duration_secs: Option<u64>,
    pub view_count: Option<u64>,
    pub thumbnail: Option<String>,
    pub format_label: &'static str,
    pub output_path: PathBuf,
    pub source_url: String,
    /// Format list from the resolve phase, for the presentation card
    pub available_formats: Vec<FormatInfo>,
}

/// Transient per-invocation retry bookkeeping
struct RetryState {
    attempt: u32,
    max_attempts: u32,
    format: String,
    fallback_used: bool,
    last_error: Option<FetchError>,
}

impl RetryState {
    fn new(profile: &FetchProfile, max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts,
            format: profile.format.clone(),
            fallback_used: false,
            last_error: None,
        }
    }

    /// Switch to the fallback selector if the error allows it and the one
    /// allowed switch has not been spent yet. The attempt budget is
    /// untouched either way.
    fn try_fallback(&mut self, err: &FetchError, profile: &FetchProfile) -> bool {
        if !matches!(err, FetchError::FormatUnavailable(_)) || self.fallback_used {
            return false;
        }
        let Some(fallback) = &profile.fallback_format else {
            return false;
        };
        self.fallback_used = true;
        self.format = fallback.clone();
        true
    }
}

/// Synchronous fetch orchestrator. One fetch at a time: the caller blocks
/// for the full duration of metadata resolution and transfer.
pub struct Fetcher<E> {
    engine: E,
    download_dir: PathBuf,
    tagger: Option<Box<dyn AudioTagger>>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl<E: ExtractionEngine> Fetcher<E> {
    pub fn new(engine: E, download_dir: PathBuf) -> Self {
        Self {
            engine,
            download_dir,
            tagger: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_tagger(mut self, tagger: Box<dyn AudioTagger>) -> Self {
        self.tagger = Some(tagger);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Access the underlying engine (used by tests to inspect call counts)
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Fetch `url` according to `profile`. The URL is normalized and
    /// validated first; a pattern mismatch fails immediately without
    /// consuming any attempt.
    pub fn fetch(
        &self,
        url: &str,
        platform: Platform,
        profile: &FetchProfile,
        sink: &mut dyn ProgressSink,
    ) -> Result<MediaRecord> {
        let url = platform.normalize(url);

        if !platform.validate(&url) {
            return Err(FetchError::invalid_url(platform.name(), url));
        }
        if let Err(e) = validation::validate_url(&url) {
            return Err(FetchError::InvalidUrl {
                platform: platform.name(),
                url: format!("{} ({})", url, e),
            });
        }

        fs::create_dir_all(&self.download_dir)?;

        let mut state = RetryState::new(profile, self.max_attempts);

        while state.attempt < state.max_attempts {
            state.attempt += 1;
            info!(
                "attempt {} of {} (format '{}')",
                state.attempt, state.max_attempts, state.format
            );

            match self.attempt(&url, platform, profile, &state.format, sink) {
                Ok(record) => return Ok(record),
                Err(err) => {
                    warn!("attempt {} failed: {}", state.attempt, err);

                    let switched = state.try_fallback(&err, profile);
                    state.last_error = Some(err);

                    if switched {
                        // Retry with the new selector right away
                        info!("switching to fallback format '{}'", state.format);
                        continue;
                    }

                    if state.attempt < state.max_attempts {
                        thread::sleep(self.retry_delay);
                    }
                }
            }
        }

        Err(FetchError::Exhausted {
            attempts: state.max_attempts,
            source: Box::new(
                state
                    .last_error
                    .unwrap_or_else(|| FetchError::engine("no attempts were made")),
            ),
        })
    }

    /// One attempt: resolve metadata, transfer, verify the output landed,
    /// then tag audio best-effort.
    fn attempt(
        &self,
        url: &str,
        platform: Platform,
        profile: &FetchProfile,
        format: &str,
        sink: &mut dyn ProgressSink,
    ) -> Result<MediaRecord> {
        let media_info = self.engine.resolve_info(url)?;
        info!("resolved '{}'", media_info.title);

        let basename = profile
            .output_name
            .clone()
            .unwrap_or_else(|| sanitize_title(&media_info.title));
        let expected_path = self
            .download_dir
            .join(format!("{}.{}", basename, profile.kind.extension()));
        let output_template = self.download_dir.join(format!("{}.%(ext)s", basename));

        let request = DownloadRequest {
            profile,
            format,
            output_template,
        };
        self.engine.download(url, &request, sink)?;

        if !expected_path.exists() {
            return Err(FetchError::OutputMissing(expected_path));
        }

        if profile.kind == MediaKind::Audio {
            if let Some(tagger) = &self.tagger {
                let tags = TagSet::from_info(&media_info, platform);
                // A successful fetch with failed tagging is still a successful fetch
                if let Err(e) = tagger.tag(&expected_path, &tags) {
                    warn!("tagging failed for {}: {}", expected_path.display(), e);
                }
            }
        }

        Ok(MediaRecord {
            title: media_info.title.clone(),
            duration_secs: media_info.duration_secs(),
            view_count: media_info.view_count,
            thumbnail: media_info.thumbnail.clone(),
            format_label: profile.kind.label(),
            output_path: expected_path,
            source_url: url.to_string(),
            available_formats: media_info.formats,
        })
    }
}

/// Derive a filesystem-safe basename from a resolved title
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = cleaned.trim().trim_matches('.').trim();
    if trimmed.is_empty() {
        "download".to_string()
    } else {
        trimmed.to_string()
    }
}
