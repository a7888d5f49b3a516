use anyhow::Result;

use crate::commands::download;
use crate::core::{FetchProfile, Platform};

/// Download a SoundCloud track as MP3.
/// SoundCloud rarely serves a separate thumbnail asset, so none is requested.
pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    download::run(
        Platform::SoundCloud,
        FetchProfile::audio().with_thumbnail(false),
        "Downloading SoundCloud Audio",
        matches,
    )
}
