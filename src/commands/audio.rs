use anyhow::Result;

use crate::commands::download;
use crate::core::{FetchProfile, Platform};

/// Download the audio track of a YouTube video as MP3
pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    download::run(
        Platform::YouTube,
        FetchProfile::audio(),
        "Downloading YouTube Audio",
        matches,
    )
}
