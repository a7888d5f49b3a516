use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::Config;

/// Locates the yt-dlp executable, installing it from upstream releases when
/// it is missing. Lookup order: system PATH, then a copy previously
/// installed by tubegrab, then a fresh install.
pub struct YtDlpManager {
    config: Config,
}

impl YtDlpManager {
    pub fn new() -> Result<Self> {
        Ok(Self {
            config: Config::load()?,
        })
    }

    /// Whether a tubegrab-installed copy exists
    pub fn is_installed(&self) -> bool {
        if let Some(path) = self.config.get_yt_dlp_path() {
            Path::new(path).exists()
        } else {
            false
        }
    }

    pub fn get_binary_path(&self) -> Option<PathBuf> {
        self.config.get_yt_dlp_path().map(PathBuf::from)
    }

    /// Latest released version, read from the /releases/latest redirect
    pub fn get_latest_version() -> Result<String> {
        println!("{}", "Checking the latest yt-dlp release...".cyan());

        let client = reqwest::blocking::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let response = client
            .get("https://github.com/yt-dlp/yt-dlp/releases/latest")
            .send()?;

        // Location: https://github.com/yt-dlp/yt-dlp/releases/tag/<version>
        if let Some(location) = response.headers().get("Location") {
            let location_str = location.to_str()?;

            if let Some(version) = location_str.split("/tag/").nth(1) {
                println!(
                    "{} {}",
                    "Latest release:".green(),
                    version.yellow().bold()
                );
                return Ok(version.to_string());
            }
        }

        Err(anyhow!("could not determine the latest yt-dlp version"))
    }

    /// Release asset for the current platform
    fn asset_name() -> &'static str {
        if cfg!(windows) {
            "yt-dlp.exe"
        } else if cfg!(target_os = "macos") {
            "yt-dlp_macos"
        } else {
            "yt-dlp"
        }
    }

    fn binary_name() -> &'static str {
        if cfg!(windows) {
            "yt-dlp.exe"
        } else {
            "yt-dlp"
        }
    }

    /// Download the release binary for this platform
    pub fn download_binary(version: &str) -> Result<Vec<u8>> {
        let download_url = format!(
            "https://github.com/yt-dlp/yt-dlp/releases/download/{}/{}",
            version,
            Self::asset_name()
        );

        println!("{}", "Downloading yt-dlp...".cyan());
        println!("{} {}", "URL:".dimmed(), download_url.dimmed());

        let response =
            reqwest::blocking::get(&download_url).context("failed to download yt-dlp")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP {}: could not download yt-dlp",
                response.status()
            ));
        }

        let bytes = response.bytes()?.to_vec();

        println!("{} {} bytes", "Downloaded:".green(), bytes.len());

        Ok(bytes)
    }

    /// Install yt-dlp into the application directory and record its path
    pub fn install(&mut self) -> Result<PathBuf> {
        let version = Self::get_latest_version()?;
        let binary_data = Self::download_binary(&version)?;

        let install_dir = Self::get_install_dir()?;
        fs::create_dir_all(&install_dir)?;

        let binary_path = install_dir.join(Self::binary_name());
        fs::write(&binary_path, binary_data).context("failed to save the yt-dlp executable")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&binary_path, fs::Permissions::from_mode(0o755))
                .context("failed to mark yt-dlp executable")?;
        }

        self.config
            .set_yt_dlp_path(binary_path.to_string_lossy().to_string());
        self.config.set_yt_dlp_installed_by_tubegrab(true);
        self.config.save()?;

        println!("{}", "✓ yt-dlp ready".green());
        println!();

        Ok(binary_path)
    }

    fn get_install_dir() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().context("could not determine the config directory")?;

        Ok(config_dir.join("tubegrab").join("bin"))
    }

    fn check_system_yt_dlp() -> Option<PathBuf> {
        which::which("yt-dlp").ok()
    }

    /// Resolve a usable yt-dlp executable.
    /// Priority: system PATH (silent), previously installed copy (silent),
    /// fresh install (one short message on first run).
    pub fn ensure_yt_dlp(&mut self) -> Result<PathBuf> {
        if let Some(system_path) = Self::check_system_yt_dlp() {
            return Ok(system_path);
        }

        if self.is_installed() {
            if let Some(path) = self.get_binary_path() {
                return Ok(path);
            }
        }

        println!();
        println!("{}", "🔧 Setting up yt-dlp (first run)...".cyan());
        self.install()
    }
}
