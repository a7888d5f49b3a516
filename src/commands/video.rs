use anyhow::Result;

use crate::commands::download;
use crate::core::{FetchProfile, Platform};

/// Download a YouTube video as MP4
pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    download::run(
        Platform::YouTube,
        FetchProfile::video(),
        "Downloading YouTube Video",
        matches,
    )
}
