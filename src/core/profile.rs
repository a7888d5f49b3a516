// Fetch profiles: immutable, declarative description of the desired output
// for one request. Constructed once per command invocation, never mutated.

/// Target media kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    /// Extension of the final produced file
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Audio => "mp3",
        }
    }

    /// Human-facing format label
    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Video => "MP4",
            MediaKind::Audio => "MP3",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            MediaKind::Video => "video/mp4",
            MediaKind::Audio => "audio/mp3",
        }
    }
}

/// Declarative fetch configuration handed to the orchestrator
#[derive(Debug, Clone)]
pub struct FetchProfile {
    pub kind: MediaKind,
    /// Primary engine format selector
    pub format: String,
    /// Secondary selector tried once after the primary is rejected as unavailable
    pub fallback_format: Option<String>,
    /// Audio bitrate passed to the extract-audio post-processing step
    pub audio_quality: Option<String>,
    pub write_thumbnail: bool,
    /// User-chosen output basename (no extension); derived from the resolved
    /// title when absent
    pub output_name: Option<String>,
}

impl FetchProfile {
    /// Video profile: best available stream remuxed into MP4, falling back to
    /// separate video+audio streams when the premerged one is unavailable
    pub fn video() -> Self {
        Self {
            kind: MediaKind::Video,
            format: "best".to_string(),
            fallback_format: Some("bestvideo+bestaudio/best".to_string()),
            audio_quality: None,
            write_thumbnail: true,
            output_name: None,
        }
    }

    /// Audio profile: best audio stream extracted to MP3 at 192 kbps
    pub fn audio() -> Self {
        Self {
            kind: MediaKind::Audio,
            format: "bestaudio/best".to_string(),
            fallback_format: None,
            audio_quality: Some("192K".to_string()),
            write_thumbnail: true,
            output_name: None,
        }
    }

    pub fn with_output_name(mut self, name: Option<String>) -> Self {
        self.output_name = name;
        self
    }

    pub fn with_thumbnail(mut self, write_thumbnail: bool) -> Self {
        self.write_thumbnail = write_thumbnail;
        self
    }
}
