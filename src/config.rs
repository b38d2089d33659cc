//! CLI and file-based configuration for the `kvfsd` binary.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

/// Mount a key/value-backed filesystem.
#[derive(Debug, Parser)]
#[command(name = "kvfsd", about = "Mount a FUSE filesystem backed by an embedded key/value store")]
pub struct Cli {
    /// Directory at which to mount the filesystem.
    pub mountpoint: PathBuf,

    /// Path to the sled database directory. Created on first run.
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Optional TOML config file supplying defaults this CLI's flags override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// uid to own the root directory on first bootstrap.
    #[arg(long)]
    pub uid: Option<u32>,

    /// gid to own the root directory on first bootstrap.
    #[arg(long)]
    pub gid: Option<u32>,

    /// Run in the foreground instead of daemonizing.
    #[arg(long, default_value_t = true)]
    pub foreground: bool,
}

/// Values a TOML config file may supply; CLI flags take precedence.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub db_path: Option<PathBuf>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
}

/// Fully-resolved configuration after merging CLI flags over an optional
/// config file, with process defaults filling whatever remains unset.
#[derive(Debug)]
pub struct Config {
    pub mountpoint: PathBuf,
    pub db_path: PathBuf,
    pub uid: u32,
    pub gid: u32,
    pub foreground: bool,
}

impl Config {
    pub fn resolve(cli: Cli) -> Result<Config, std::io::Error> {
        let file_config = match &cli.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                toml::from_str(&text).unwrap_or_default()
            }
            None => FileConfig::default(),
        };

        Ok(Config {
            mountpoint: cli.mountpoint,
            db_path: cli
                .db_path
                .or(file_config.db_path)
                .unwrap_or_else(|| PathBuf::from("kvfs.db")),
            uid: cli
                .uid
                .or(file_config.uid)
                .unwrap_or_else(|| unsafe { libc::getuid() }),
            gid: cli
                .gid
                .or(file_config.gid)
                .unwrap_or_else(|| unsafe { libc::getgid() }),
            foreground: cli.foreground,
        })
    }
}
