use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::core::Config;

/// Handle `tubegrab set dir <path>`
pub fn handle_set(matches: &clap::ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("dir", sub_matches)) => {
            let path = sub_matches
                .get_one::<String>("path")
                .expect("path is a required argument");

            let path_buf = Path::new(path);
            if !path_buf.exists() {
                println!("Warning: Path '{}' does not exist", path);
            }

            let canonical_path = if path_buf.exists() {
                path_buf
                    .canonicalize()
                    .map_err(|e| anyhow::anyhow!("Failed to resolve path: {}", e))?
                    .to_string_lossy()
                    .to_string()
            } else {
                path.to_string()
            };

            let mut config = Config::load()?;
            config.set_download_dir(canonical_path.clone());
            config.save()?;

            println!("Download directory set to: {}", canonical_path);
        }
        _ => {
            println!("Use 'tubegrab set --help' for more information.");
        }
    }

    Ok(())
}

/// Handle `tubegrab get dir`
pub fn handle_get(matches: &clap::ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("dir", _)) => {
            let config = Config::load()?;

            match config.get_download_dir() {
                Some(path) => {
                    let cleaned_path = path.strip_prefix("\\\\?\\").unwrap_or(path);
                    println!("{}", "Download directory:".white());
                    println!("{}", cleaned_path.cyan().bold());
                }
                None => {
                    println!("{}", "No download directory configured.".yellow());
                    println!();
                    println!("{}", "To set one, run:".white());
                    println!("  {}", "tubegrab set dir <path>".cyan().bold());
                    println!();
                    println!("{}", "Example:".dimmed());
                    println!("  {}", "tubegrab set dir ~/Downloads".dimmed());
                }
            }
        }
        _ => {
            println!("Use 'tubegrab get --help' for more information.");
        }
    }

    Ok(())
}
