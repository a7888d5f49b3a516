// Audio metadata tagging. The produced MP3 is rewritten by ffmpeg with
// `-c copy` and `-metadata` pairs; no re-encode happens. Tagging is
// best-effort by contract: callers log failures and keep the fetch result.

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, NaiveDate};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::engine::MediaInfo;
use crate::core::platform::Platform;

/// Tag values written into a produced audio file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSet {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Four-digit year, empty when the upload date is unknown
    pub year: String,
}

impl TagSet {
    /// Build a tag set from resolved media info, defaulting the artist to
    /// "Unknown Artist" and the album to a platform-derived name
    pub fn from_info(info: &MediaInfo, platform: Platform) -> Self {
        Self {
            title: info.title.clone(),
            artist: info
                .uploader
                .clone()
                .unwrap_or_else(|| "Unknown Artist".to_string()),
            album: platform.default_album().to_string(),
            year: info
                .upload_date
                .as_deref()
                .map(upload_year)
                .unwrap_or_default(),
        }
    }
}

/// Year from an engine upload date (`YYYYMMDD`); falls back to the first
/// four characters when the string does not parse as a date
fn upload_year(upload_date: &str) -> String {
    NaiveDate::parse_from_str(upload_date, "%Y%m%d")
        .map(|d| d.year().to_string())
        .unwrap_or_else(|_| upload_date.chars().take(4).collect())
}

/// Writes tags into an audio file on disk
pub trait AudioTagger {
    fn tag(&self, path: &Path, tags: &TagSet) -> Result<()>;
}

/// Tagger backed by the ffmpeg executable
pub struct FfmpegTagger {
    binary: PathBuf,
}

impl FfmpegTagger {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }
}

impl AudioTagger for FfmpegTagger {
    fn tag(&self, path: &Path, tags: &TagSet) -> Result<()> {
        // ffmpeg cannot edit in place; write a sibling file and swap it in.
        // The temp name keeps the .mp3 extension so the muxer is inferred.
        let tmp = path.with_extension("tagged.mp3");

        let output = Command::new(&self.binary)
            .arg("-y")
            .arg("-i")
            .arg(path)
            .arg("-map")
            .arg("0")
            .arg("-c")
            .arg("copy")
            .arg("-metadata")
            .arg(format!("title={}", tags.title))
            .arg("-metadata")
            .arg(format!("artist={}", tags.artist))
            .arg("-metadata")
            .arg(format!("album={}", tags.album))
            .arg("-metadata")
            .arg(format!("date={}", tags.year))
            .arg(&tmp)
            .output()
            .context("failed to run ffmpeg")?;

        if !output.status.success() {
            let _ = fs::remove_file(&tmp);
            return Err(anyhow!(
                "ffmpeg tagging failed: {}",
                String::from_utf8_lossy(&output.stderr)
                    .lines()
                    .last()
                    .unwrap_or("unknown error")
            ));
        }

        fs::rename(&tmp, path).context("failed to replace audio file with tagged copy")?;
        debug!("tagged {} as {:?}", path.display(), tags);

        Ok(())
    }
}
