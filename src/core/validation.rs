// Validation module for security and input sanitization.
// A platform pattern match (core::platform) says a URL looks like YouTube or
// SoundCloud; the checks here reject input that is unsafe to hand to a
// subprocess regardless of platform.

use anyhow::{ensure, Context, Result};
use url::Url;

/// Maximum URL length accepted from the command line
const MAX_URL_LENGTH: usize = 2048;

/// Maximum output basename length
const MAX_OUTPUT_LENGTH: usize = 255;

/// Validates a source URL before it reaches the extraction engine.
///
/// Command::arg() already prevents shell interpretation; this layer keeps
/// hostile input out of log lines, config files, and any future context the
/// URL is echoed into.
pub fn validate_url(url_str: &str) -> Result<()> {
    let trimmed = url_str.trim();

    ensure!(!trimmed.is_empty(), "URL cannot be empty");
    ensure!(
        url_str.len() <= MAX_URL_LENGTH,
        "URL is too long ({} characters, max {})",
        url_str.len(),
        MAX_URL_LENGTH
    );

    ensure!(
        url_str.starts_with("http://") || url_str.starts_with("https://"),
        "URL must start with http:// or https://"
    );

    ensure!(!url_str.contains('\0'), "URL contains null byte");

    // Characters that are dangerous if the URL ever reaches a shell context
    const DANGEROUS_CHARS: &[(&str, &str)] = &[
        (";", "command separator"),
        ("|", "pipe operator"),
        ("`", "command substitution"),
        ("\n", "newline"),
        ("\r", "carriage return"),
    ];

    for (ch, reason) in DANGEROUS_CHARS {
        ensure!(
            !url_str.contains(ch),
            "URL contains dangerous character '{}' - {}",
            ch,
            reason
        );
    }

    ensure!(
        !url_str.contains("$("),
        "URL contains command substitution pattern $()"
    );

    // Shell operators with spaces are never valid in a URL; a bare & in a
    // query string ("?a=1&b=2") is
    ensure!(
        !url_str.contains("& ") && !url_str.contains(" &"),
        "URL contains shell operator with space"
    );
    ensure!(!url_str.contains("&& "), "URL contains shell AND operator");
    ensure!(!url_str.contains("|| "), "URL contains shell OR operator");

    let url = Url::parse(url_str).context("Invalid URL format")?;

    let scheme = url.scheme();
    ensure!(
        scheme == "http" || scheme == "https",
        "URL must use http or https protocol, got: {}",
        scheme
    );

    ensure!(url.host_str().is_some(), "URL has no hostname");

    Ok(())
}

/// Validates a user-supplied output basename (the `-o` flag).
/// The name is joined onto the downloads directory, so traversal and
/// absolute paths are rejected outright.
pub fn validate_output_name(output: &str) -> Result<()> {
    let trimmed = output.trim();
    ensure!(!trimmed.is_empty(), "Output name cannot be empty");
    ensure!(
        !output.contains(".."),
        "Output name contains path traversal (..)"
    );
    ensure!(
        !output.starts_with('/') && !output.starts_with('\\'),
        "Output name should be relative, not absolute: {}",
        output
    );

    // Drive letters on Windows (C:, D:, etc.)
    if output.len() >= 2 {
        ensure!(
            output.chars().nth(1) != Some(':'),
            "Output name should not contain drive letters: {}",
            output
        );
    }

    ensure!(!output.contains('\0'), "Output name contains null byte");

    const DANGEROUS_CHARS: [char; 7] = ['|', '&', ';', '$', '`', '\n', '\r'];
    for ch in DANGEROUS_CHARS {
        ensure!(
            !output.contains(ch),
            "Output name contains dangerous character '{}'",
            ch
        );
    }

    ensure!(
        output.len() <= MAX_OUTPUT_LENGTH,
        "Output name is too long ({} characters, max {})",
        output.len(),
        MAX_OUTPUT_LENGTH
    );

    Ok(())
}
