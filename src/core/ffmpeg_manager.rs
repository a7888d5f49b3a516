// FFmpegManager - locates the ffmpeg tool used for merging, audio
// extraction, and tag writing
use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::Config;

pub struct FFmpegManager {
    config: Config,
}

impl FFmpegManager {
    pub fn new() -> Result<Self> {
        Ok(Self {
            config: Config::load()?,
        })
    }

    /// Whether a tubegrab-installed copy exists
    pub fn is_installed(&self) -> bool {
        if let Some(path) = self.config.get_ffmpeg_path() {
            Path::new(path).exists()
        } else {
            false
        }
    }

    pub fn get_binary_path(&self) -> Option<PathBuf> {
        self.config.get_ffmpeg_path().map(PathBuf::from)
    }

    fn check_system_ffmpeg() -> Option<PathBuf> {
        which::which("ffmpeg").ok()
    }

    /// Latest ffmpeg build tag from the BtbN release feed
    #[cfg(windows)]
    pub fn get_latest_version() -> Result<String> {
        println!("{}", "Checking the latest ffmpeg build...".cyan());

        let client = reqwest::blocking::Client::builder()
            .user_agent("tubegrab-cli")
            .build()?;

        let response = client
            .get("https://api.github.com/repos/BtbN/FFmpeg-Builds/releases/latest")
            .send()?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "failed to query ffmpeg releases: HTTP {}",
                response.status()
            ));
        }

        let json: serde_json::Value = response.json()?;

        let tag = json["tag_name"]
            .as_str()
            .ok_or_else(|| anyhow!("could not extract tag_name from the release"))?;

        println!("{} {}", "Latest build:".green(), tag.yellow().bold());

        Ok(tag.to_string())
    }

    /// Download the Windows build ZIP and extract ffmpeg.exe and ffprobe.exe
    #[cfg(windows)]
    pub fn download_and_extract(version: &str) -> Result<(Vec<u8>, Vec<u8>)> {
        use std::io::Cursor;

        let download_url = format!(
            "https://github.com/BtbN/FFmpeg-Builds/releases/download/{}/ffmpeg-master-latest-win64-gpl-shared.zip",
            version
        );

        println!("{}", "Downloading ffmpeg...".cyan());
        println!("{} {}", "URL:".dimmed(), download_url.dimmed());

        let response =
            reqwest::blocking::get(&download_url).context("failed to download ffmpeg")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP {}: could not download ffmpeg",
                response.status()
            ));
        }

        let zip_bytes = response.bytes()?;
        println!("{} {} bytes", "Downloaded:".green(), zip_bytes.len());

        println!("{}", "Extracting files...".cyan());

        let cursor = Cursor::new(zip_bytes);
        let mut archive =
            zip::ZipArchive::new(cursor).context("failed to read the ZIP archive")?;

        let mut ffmpeg_exe: Option<Vec<u8>> = None;
        let mut ffprobe_exe: Option<Vec<u8>> = None;

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let file_name = file.name().to_string();

            if file_name.ends_with("bin/ffmpeg.exe") {
                println!("{} {}", "Found:".green(), file_name);
                let mut buffer = Vec::new();
                std::io::copy(&mut file, &mut buffer)?;
                ffmpeg_exe = Some(buffer);
            }

            if file_name.ends_with("bin/ffprobe.exe") {
                println!("{} {}", "Found:".green(), file_name);
                let mut buffer = Vec::new();
                std::io::copy(&mut file, &mut buffer)?;
                ffprobe_exe = Some(buffer);
            }

            if ffmpeg_exe.is_some() && ffprobe_exe.is_some() {
                break;
            }
        }

        let ffmpeg_data =
            ffmpeg_exe.ok_or_else(|| anyhow!("ffmpeg.exe not found in the archive"))?;

        let ffprobe_data =
            ffprobe_exe.ok_or_else(|| anyhow!("ffprobe.exe not found in the archive"))?;

        println!("{}", "✓ Files extracted".green());

        Ok((ffmpeg_data, ffprobe_data))
    }

    /// Install ffmpeg into the application directory and record its path
    #[cfg(windows)]
    pub fn install(&mut self) -> Result<PathBuf> {
        use std::fs;

        let version = Self::get_latest_version()?;
        let (ffmpeg_data, ffprobe_data) = Self::download_and_extract(&version)?;

        let install_dir = Self::get_install_dir()?;
        fs::create_dir_all(&install_dir)?;

        let ffmpeg_path = install_dir.join("ffmpeg.exe");
        let ffprobe_path = install_dir.join("ffprobe.exe");

        fs::write(&ffmpeg_path, ffmpeg_data).context("failed to save ffmpeg.exe")?;
        fs::write(&ffprobe_path, ffprobe_data).context("failed to save ffprobe.exe")?;

        self.config
            .set_ffmpeg_path(ffmpeg_path.to_string_lossy().to_string());
        self.config.set_ffmpeg_installed_by_tubegrab(true);
        self.config.save()?;

        println!("{}", "✓ FFmpeg ready".green());
        println!();

        Ok(ffmpeg_path)
    }

    /// Upstream publishes no plain-binary builds for this platform;
    /// point the user at their package manager instead
    #[cfg(not(windows))]
    pub fn install(&mut self) -> Result<PathBuf> {
        Err(anyhow!(
            "ffmpeg was not found on PATH. Install it with your package manager \
             (e.g. `apt install ffmpeg` or `brew install ffmpeg`) and retry"
        ))
    }

    fn get_install_dir() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().context("could not determine the config directory")?;

        Ok(config_dir.join("tubegrab").join("bin"))
    }

    /// Resolve a usable ffmpeg executable.
    /// Priority: system PATH (silent), previously installed copy (silent),
    /// fresh install (one short message on first run).
    pub fn ensure_ffmpeg(&mut self) -> Result<PathBuf> {
        if let Some(system_path) = Self::check_system_ffmpeg() {
            return Ok(system_path);
        }

        if self.is_installed() {
            if let Some(path) = self.get_binary_path() {
                return Ok(path);
            }
        }

        println!();
        println!("{}", "🔧 Setting up FFmpeg (first run)...".cyan());
        self.install()
    }

    /// Run `ffmpeg -version` to confirm the resolved binary works
    pub fn verify_ffmpeg(&self) -> Result<String> {
        let path = self
            .get_binary_path()
            .or_else(Self::check_system_ffmpeg)
            .ok_or_else(|| anyhow!("ffmpeg path not set, call ensure_ffmpeg() first"))?;

        let output = Command::new(&path)
            .arg("-version")
            .output()
            .map_err(|e| anyhow!("failed to execute ffmpeg: {}", e))?;

        if output.status.success() {
            let version = String::from_utf8_lossy(&output.stdout).to_string();
            Ok(version)
        } else {
            Err(anyhow!(
                "ffmpeg -version failed with status: {}",
                output.status
            ))
        }
    }
}
