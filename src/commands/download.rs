// Shared download flow behind the per-platform subcommands

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::Input;
use std::fs;
use std::path::PathBuf;

use crate::core::{
    validation, Config, FFmpegManager, FetchProfile, Fetcher, FfmpegTagger, MediaKind,
    MediaRecord, Platform, YtDlpEngine, YtDlpManager,
};
use crate::error::FetchError;
use crate::ui::{self, format_duration, format_size, format_views, TransferBar};

pub fn run(
    platform: Platform,
    base_profile: FetchProfile,
    banner_title: &str,
    matches: &clap::ArgMatches,
) -> Result<()> {
    // 1. Extract arguments
    let url = matches.get_one::<String>("url").context("URL is required")?;
    let output = matches.get_one::<String>("output");
    let max_attempts = *matches
        .get_one::<u32>("max-attempts")
        .context("max-attempts has a default")?;
    let no_thumbnail = matches.get_flag("no-thumbnail");
    let clean_parts = matches.get_flag("clean-parts");

    // 2. Validate the output name if one was given
    if let Some(output_name) = output {
        validation::validate_output_name(output_name)
            .with_context(|| format!("Invalid output name: {}", output_name))?;
    }

    // 3. Ensure the external tools are available
    let mut yt_dlp_manager = YtDlpManager::new()?;
    let yt_dlp_path = yt_dlp_manager.ensure_yt_dlp()?;
    let mut ffmpeg_manager = FFmpegManager::new()?;
    let ffmpeg_path = ffmpeg_manager.ensure_ffmpeg()?;

    // 4. Resolve the destination directory
    let download_dir = get_download_directory()?;

    // 5. Clean orphaned .part files if requested
    if clean_parts {
        clean_part_files(&download_dir)?;
    }

    // 6. Build the profile for this request
    let write_thumbnail = base_profile.write_thumbnail && !no_thumbnail;
    let profile = base_profile
        .with_output_name(output.cloned())
        .with_thumbnail(write_thumbnail);

    // 7. Wire up the engine and run the fetch
    let engine = YtDlpEngine::new(yt_dlp_path)
        .with_ffmpeg_location(ffmpeg_path.parent().map(PathBuf::from));
    let fetcher = Fetcher::new(engine, download_dir)
        .with_tagger(Box::new(FfmpegTagger::new(ffmpeg_path)))
        .with_max_attempts(max_attempts);

    ui::banner(banner_title);

    let mut bar = TransferBar::new();
    match fetcher.fetch(url, platform, &profile, &mut bar) {
        Ok(record) => {
            render_media_card(&record, profile.kind);
            Ok(())
        }
        Err(err) => {
            if matches!(err, FetchError::Exhausted { .. }) {
                render_exhausted_hints();
            }
            Err(err.into())
        }
    }
}

/// Render the result card: thumbnail, title, stats, available formats, and
/// where the file landed
fn render_media_card(record: &MediaRecord, kind: MediaKind) {
    println!();
    ui::success("✓ Download complete");
    println!();
    println!("{}", record.title.white().bold());
    if let Some(thumbnail) = &record.thumbnail {
        println!("  {} {}", "Thumbnail:".white(), thumbnail.dimmed());
    }
    println!(
        "  {} {}",
        "Duration:".white(),
        format_duration(record.duration_secs).cyan()
    );
    println!(
        "  {} {}",
        "Views:".white(),
        format_views(record.view_count).cyan()
    );
    println!("  {} {}", "Format:".white(), record.format_label.cyan());
    println!("  {} {}", "MIME type:".white(), kind.mime_type().dimmed());

    // Quality/size pairs from the resolve phase, matching the target kind
    let listed: Vec<_> = record
        .available_formats
        .iter()
        .filter(|f| match kind {
            MediaKind::Video => f.has_video(),
            MediaKind::Audio => !f.has_video(),
        })
        .collect();

    if !listed.is_empty() {
        println!();
        println!("{}", "Available formats:".white());
        for format in listed {
            let quality = format
                .format_note
                .clone()
                .or_else(|| format.height.map(|h| format!("{}p", h)))
                .unwrap_or_else(|| format.format_id.clone());
            println!(
                "  • {} - {} - {}",
                quality.cyan(),
                format.ext.as_deref().unwrap_or("N/A"),
                format_size(format.size()).yellow()
            );
        }
    }

    println!();
    println!(
        "{} {}",
        "Saved to:".green().bold(),
        record.output_path.display().to_string().cyan()
    );
}

/// Troubleshooting hints shown when every attempt failed
fn render_exhausted_hints() {
    println!();
    ui::error("All download attempts failed.");
    println!();
    println!("{}", "Suggestions:".white().bold());
    println!("  1. Check your internet connection");
    println!("  2. Make sure the media is available in your region");
    println!("  3. Verify the media is not private, age-restricted, or removed");
    println!("  4. Try a different URL");
    println!();
}

/// Delete orphaned .part files from the download directory
fn clean_part_files(download_dir: &PathBuf) -> Result<()> {
    println!("{}", "Looking for orphaned .part files...".yellow());

    let entries =
        fs::read_dir(download_dir).context("could not read the download directory")?;

    let mut count = 0;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        if let Some(extension) = path.extension() {
            if extension == "part" {
                println!("  {} {}", "Removing:".red(), path.display());
                fs::remove_file(&path)?;
                count += 1;
            }
        }
    }

    if count > 0 {
        println!(
            "{} {}",
            "✓ Removed".green().bold(),
            format!("{} .part file(s)", count)
        );
    } else {
        println!("{}", "No .part files found".dimmed());
    }

    println!();
    Ok(())
}

/// Resolve the download directory (interactive on first use)
fn get_download_directory() -> Result<PathBuf> {
    let mut config = Config::load()?;

    if let Some(download_dir) = config.get_download_dir() {
        let path = PathBuf::from(download_dir);

        if !path.exists() {
            println!(
                "{}",
                format!(
                    "⚠️  The configured download directory no longer exists: {}",
                    download_dir
                )
                .yellow()
            );
            println!();
            let new_path = prompt_for_download_dir()?;
            save_download_dir(&mut config, &new_path)?;
            return Ok(new_path);
        }

        println!("{} {}", "✓ Download directory:".green(), download_dir);
        return Ok(path);
    }

    // Nothing configured yet: ask once and persist the answer
    println!();
    println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".yellow());
    println!("{}", "  First-time Setup".yellow().bold());
    println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".yellow());
    println!();
    println!("{}", "No download directory is configured yet.".yellow());
    println!(
        "{}",
        "Enter the path where downloaded files should be stored:".white()
    );
    println!();

    let download_dir = prompt_for_download_dir()?;
    save_download_dir(&mut config, &download_dir)?;

    println!();
    println!("{}", "✓ Configuration saved".green().bold());
    println!();

    Ok(download_dir)
}

/// Ask the user for the download directory path
fn prompt_for_download_dir() -> Result<PathBuf> {
    loop {
        let input: String = Input::new()
            .with_prompt("Download directory path")
            .with_initial_text(
                dirs::download_dir()
                    .or_else(|| dirs::home_dir().map(|p| p.join("downloads")))
                    .and_then(|p| p.to_str().map(String::from))
                    .unwrap_or_default(),
            )
            .interact_text()?;

        let path = PathBuf::from(&input);

        if !path.exists() {
            println!();
            println!(
                "{}",
                format!("⚠️  The directory '{}' does not exist.", input).yellow()
            );

            if dialoguer::Confirm::new()
                .with_prompt("Create it?")
                .default(true)
                .interact()?
            {
                fs::create_dir_all(&path).context("could not create the directory")?;
                println!(
                    "{}",
                    format!("✓ Directory created: {}", path.display()).green()
                );
                return Ok(path);
            }

            println!("{}", "Please enter a valid path.".yellow());
            println!();
            continue;
        }

        if !path.is_dir() {
            println!();
            println!(
                "{}",
                format!("⚠️  '{}' is not a directory.", input).red()
            );
            println!();
            continue;
        }

        return Ok(path);
    }
}

/// Persist the download directory in the configuration
fn save_download_dir(config: &mut Config, path: &PathBuf) -> Result<()> {
    let canonical_path = path
        .canonicalize()
        .map_err(|e| anyhow::anyhow!("Failed to resolve path: {}", e))?
        .to_string_lossy()
        .to_string();

    config.set_download_dir(canonical_path);
    config.save()?;

    Ok(())
}
