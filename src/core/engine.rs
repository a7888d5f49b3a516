// Extraction engine contract and the yt-dlp implementation.
//
// The engine is driven in two phases: resolve metadata only (no transfer),
// then download with a registered progress sink. Errors coming back from the
// yt-dlp subprocess are classified into the typed taxonomy here, at the
// engine boundary, so the retry logic never inspects engine output text.

use log::debug;
use serde::Deserialize;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::core::profile::{FetchProfile, MediaKind};
use crate::error::{FetchError, Result};

/// Sink for transfer progress events; implemented by `ui::TransferBar`
/// and by recording stubs in tests.
pub trait ProgressSink {
    /// A transfer is starting; `total` is the exact or estimated byte count when known
    fn started(&mut self, total: Option<u64>);

    /// Cumulative bytes transferred so far, as reported by the engine
    fn progressed(&mut self, downloaded: u64, total: Option<u64>);

    /// The transfer ended (successfully or not); the sink must reset itself
    /// so it can be reused by a later transfer
    fn finished(&mut self);
}

/// Metadata resolved for a URL before any transfer happens
#[derive(Debug, Clone, Deserialize)]
pub struct MediaInfo {
    pub title: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    /// Engine-reported upload date, `YYYYMMDD`
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub formats: Vec<FormatInfo>,
}

impl MediaInfo {
    /// Duration in whole seconds (the engine reports fractional seconds)
    pub fn duration_secs(&self) -> Option<u64> {
        self.duration.map(|d| d.round() as u64)
    }
}

/// One entry of the engine's available-format list
#[derive(Debug, Clone, Deserialize)]
pub struct FormatInfo {
    #[serde(default)]
    pub format_id: String,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub format_note: Option<String>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub filesize_approx: Option<u64>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
}

impl FormatInfo {
    /// Exact size when the engine knows it, its estimate otherwise
    pub fn size(&self) -> Option<u64> {
        self.filesize.or(self.filesize_approx)
    }

    pub fn has_video(&self) -> bool {
        matches!(self.vcodec.as_deref(), Some(v) if v != "none")
    }
}

/// One download attempt as computed by the orchestrator
#[derive(Debug)]
pub struct DownloadRequest<'a> {
    pub profile: &'a FetchProfile,
    /// Selector for this attempt: the profile's primary format, or its
    /// fallback after the one allowed switch
    pub format: &'a str,
    /// Output template handed to the engine; `%(ext)s` is substituted by the
    /// engine before post-processing runs
    pub output_template: PathBuf,
}

/// Narrow contract against the external media-extraction engine
pub trait ExtractionEngine {
    /// Resolve metadata only; no transfer is performed
    fn resolve_info(&self, url: &str) -> Result<MediaInfo>;

    /// Perform the transfer, emitting progress events to `sink`
    fn download(&self, url: &str, request: &DownloadRequest, sink: &mut dyn ProgressSink)
        -> Result<()>;
}

/// Extraction engine backed by the yt-dlp executable
pub struct YtDlpEngine {
    binary: PathBuf,
    /// Directory containing ffmpeg/ffprobe when they are not on PATH
    ffmpeg_location: Option<PathBuf>,
}

const PROGRESS_TEMPLATE: &str =
    "download:%(progress.downloaded_bytes)s/%(progress.total_bytes)s/%(progress.total_bytes_estimate)s";

impl YtDlpEngine {
    pub fn new(binary: PathBuf) -> Self {
        Self {
            binary,
            ffmpeg_location: None,
        }
    }

    pub fn with_ffmpeg_location(mut self, location: Option<PathBuf>) -> Self {
        self.ffmpeg_location = location;
        self
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--no-warnings").arg("--no-playlist");
        if let Some(location) = &self.ffmpeg_location {
            cmd.arg("--ffmpeg-location").arg(location);
        }
        cmd
    }
}

impl ExtractionEngine for YtDlpEngine {
    fn resolve_info(&self, url: &str) -> Result<MediaInfo> {
        let output = self
            .base_command()
            .arg("--dump-json")
            .arg(url)
            .output()
            .map_err(|e| FetchError::engine(format!("failed to run yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_resolve_error(&stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout
            .lines()
            .next()
            .ok_or_else(|| FetchError::resolution("engine produced no metadata"))?;

        serde_json::from_str(line)
            .map_err(|e| FetchError::resolution(format!("unparseable engine metadata: {}", e)))
    }

    fn download(
        &self,
        url: &str,
        request: &DownloadRequest,
        sink: &mut dyn ProgressSink,
    ) -> Result<()> {
        let mut cmd = self.base_command();

        cmd.arg("-o").arg(&request.output_template);
        cmd.arg("-f").arg(request.format);
        cmd.arg("--continue");
        cmd.arg("--newline");
        cmd.arg("--progress-template").arg(PROGRESS_TEMPLATE);

        match request.profile.kind {
            MediaKind::Video => {
                cmd.arg("--merge-output-format").arg("mp4");
            }
            MediaKind::Audio => {
                cmd.arg("-x").arg("--audio-format").arg("mp3");
                if let Some(quality) = &request.profile.audio_quality {
                    cmd.arg("--audio-quality").arg(quality);
                }
            }
        }

        if request.profile.write_thumbnail {
            cmd.arg("--write-thumbnail");
        }

        cmd.arg(url);
        debug!("running engine: {:?}", cmd);

        let mut child = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| FetchError::engine(format!("failed to spawn yt-dlp: {}", e)))?;

        // Progress lines arrive on stdout thanks to --progress-template;
        // everything else the engine prints there is ignored
        let mut announced = false;
        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines().map_while(|l| l.ok()) {
                if let Some((downloaded, total)) = parse_progress_line(&line) {
                    if !announced {
                        sink.started(total);
                        announced = true;
                    }
                    sink.progressed(downloaded, total);
                }
            }
        }

        let mut stderr_text = String::new();
        if let Some(mut stderr) = child.stderr.take() {
            stderr.read_to_string(&mut stderr_text).ok();
        }

        let status = child.wait()?;

        // Reset the sink on every exit path so it is reusable by a retry
        sink.finished();

        if status.success() {
            Ok(())
        } else {
            Err(classify_engine_error(&stderr_text))
        }
    }
}

/// Parse one `--progress-template` line:
/// `download:<downloaded>/<total>/<total_estimate>`, missing fields are "NA".
/// Returns (downloaded, exact-or-estimated total).
pub fn parse_progress_line(line: &str) -> Option<(u64, Option<u64>)> {
    let payload = line.strip_prefix("download:")?;
    let mut parts = payload.splitn(3, '/');

    let downloaded = parse_byte_field(parts.next()?)?;
    let total = parts.next().and_then(parse_byte_field);
    let estimate = parts.next().and_then(parse_byte_field);

    Some((downloaded, total.or(estimate)))
}

fn parse_byte_field(field: &str) -> Option<u64> {
    // The engine prints estimates as floats
    field.trim().parse::<f64>().ok().map(|v| v as u64)
}

/// Map an engine failure during the transfer phase onto the typed taxonomy.
/// This is the single place engine output text is inspected.
pub fn classify_engine_error(stderr: &str) -> FetchError {
    let lower = stderr.to_lowercase();

    if lower.contains("requested format is not available")
        || lower.contains("format not available")
    {
        return FetchError::format_unavailable(summarize(stderr));
    }

    if lower.contains("unable to download")
        || lower.contains("connection")
        || lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("network")
        || lower.contains("http error 5")
        || lower.contains("incomplete")
    {
        return FetchError::transfer(summarize(stderr));
    }

    if is_resolution_failure(&lower) {
        return FetchError::resolution(summarize(stderr));
    }

    FetchError::engine(summarize(stderr))
}

/// Resolve-phase failures are resolution errors unless the text clearly says
/// otherwise (network errors surface here too when the site is unreachable)
fn classify_resolve_error(stderr: &str) -> FetchError {
    let lower = stderr.to_lowercase();

    if lower.contains("unable to download")
        || lower.contains("connection")
        || lower.contains("timed out")
        || lower.contains("network")
    {
        return FetchError::transfer(summarize(stderr));
    }

    FetchError::resolution(summarize(stderr))
}

fn is_resolution_failure(lower: &str) -> bool {
    lower.contains("video unavailable")
        || lower.contains("private")
        || lower.contains("removed")
        || lower.contains("confirm your age")
        || lower.contains("age-restricted")
        || lower.contains("not available in your country")
        || lower.contains("unable to extract")
        || lower.contains("unsupported url")
}

/// Keep the last meaningful line of engine stderr; the rest is noise
fn summarize(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("engine reported no error text")
        .trim()
        .to_string()
}
