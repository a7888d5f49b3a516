use anyhow::Result;
use clap::{Arg, Command};

use tubegrab::commands;

/// Arguments shared by every download subcommand
fn download_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("url")
            .help("URL of the media to download")
            .required(true)
            .index(1),
    )
    .arg(
        Arg::new("output")
            .short('o')
            .long("output")
            .value_name("NAME")
            .help("Output file name, without extension (defaults to the resolved title)"),
    )
    .arg(
        Arg::new("max-attempts")
            .long("max-attempts")
            .value_name("N")
            .help("Number of download attempts before giving up")
            .value_parser(clap::value_parser!(u32))
            .default_value("3"),
    )
    .arg(
        Arg::new("no-thumbnail")
            .long("no-thumbnail")
            .help("Do not save the thumbnail alongside the media file")
            .action(clap::ArgAction::SetTrue),
    )
    .arg(
        Arg::new("clean-parts")
            .long("clean-parts")
            .help("Delete orphaned .part files from the download directory first")
            .action(clap::ArgAction::SetTrue),
    )
}

fn build_cli() -> Command {
    Command::new("tubegrab")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Download YouTube videos/audio and SoundCloud tracks via yt-dlp")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .short_alias('V')
                .long("version")
                .help("Print version information")
                .action(clap::ArgAction::SetTrue),
        )
        .subcommand(download_args(
            Command::new("video").about("Download a YouTube video as MP4"),
        ))
        .subcommand(download_args(
            Command::new("audio").about("Download the audio of a YouTube video as MP3"),
        ))
        .subcommand(download_args(
            Command::new("soundcloud").about("Download a SoundCloud track as MP3"),
        ))
        .subcommand(
            Command::new("set")
                .about("Set configuration values (use 'tubegrab set --help' for subcommands)")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("dir").about("Set the download directory").arg(
                        Arg::new("path")
                            .help("Path to the download directory")
                            .required(true)
                            .index(1),
                    ),
                ),
        )
        .subcommand(
            Command::new("get")
                .about("Get configuration values (use 'tubegrab get --help' for subcommands)")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("dir").about("Get the download directory")),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(
                    Arg::new("shell")
                        .help("Shell to generate completions for")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(Command::new("version").about("Shows version information"))
}

fn main() -> Result<()> {
    tubegrab::init_logging();

    let mut cli = build_cli();
    let matches = cli.clone().get_matches();

    if matches.get_flag("version") {
        println!("tubegrab version {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    match matches.subcommand() {
        Some(("video", sub_matches)) => commands::video::execute(sub_matches),
        Some(("audio", sub_matches)) => commands::audio::execute(sub_matches),
        Some(("soundcloud", sub_matches)) => commands::soundcloud::execute(sub_matches),
        Some(("set", sub_matches)) => commands::config::handle_set(sub_matches),
        Some(("get", sub_matches)) => commands::config::handle_get(sub_matches),
        Some(("completions", sub_matches)) => commands::completions::execute(sub_matches, &mut cli),
        Some(("version", _)) => commands::version::execute(),
        _ => {
            println!("Welcome to tubegrab!");
            println!("Use 'tubegrab --help' for more information.");
            Ok(())
        }
    }
}
