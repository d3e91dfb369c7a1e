//! CLI 設定
//!
//! 優先順位: CLI フラグ（環境変数を含む） > 設定ファイル > デフォルト

use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use vellum_core::GalleryConfig;

const APP_NAME: &str = "vellum";
const APP_QUALIFIER: &str = "dev";
const APP_ORGANIZATION: &str = "vellum";
const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_PORT: u16 = 8080;

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Local image gallery server.
#[derive(Debug, Default, Parser)]
#[command(name = "vellum", version, about)]
pub struct Args {
    /// Configuration file path.
    #[arg(long, env = "VELLUM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long, env = "VELLUM_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Directory for stored images.
    #[arg(long, env = "VELLUM_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log verbosity level (`RUST_LOG` wins when set).
    #[arg(long, env = "VELLUM_LOG_LEVEL", value_enum)]
    pub log_level: Option<LogLevel>,

    /// Write logs to this file instead of stderr.
    #[arg(long, env = "VELLUM_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Keep images in memory only.
    #[arg(long, env = "VELLUM_EPHEMERAL")]
    pub ephemeral: bool,
}

/// `[server]` テーブル
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub listen: Option<SocketAddr>,
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<LogLevel>,
    pub log_file: Option<PathBuf>,
    pub ephemeral: bool,
}

/// 設定ファイル全体
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server: ServerSection,
    pub gallery: GalleryConfig,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid configuration file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }
}

/// 解決済みの設定
#[derive(Debug)]
pub struct Settings {
    pub listen: SocketAddr,
    pub data_dir: PathBuf,
    pub log_level: LogLevel,
    pub log_file: Option<PathBuf>,
    pub ephemeral: bool,
    pub gallery: GalleryConfig,
}

impl Settings {
    /// 設定ファイルを探して読み、フラグとマージする
    ///
    /// `--config` がなければ ProjectDirs の config.toml を（存在すれば）使う。
    pub fn resolve(args: Args) -> Result<Self> {
        let dirs = ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME);

        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => match dirs.as_ref().map(|d| d.config_dir().join(CONFIG_FILE_NAME)) {
                Some(path) if path.is_file() => FileConfig::load(&path)?,
                _ => FileConfig::default(),
            },
        };

        let default_data_dir = dirs
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("vellum-data"));

        Ok(Self::merge(args, file, default_data_dir))
    }

    pub fn merge(args: Args, file: FileConfig, default_data_dir: PathBuf) -> Self {
        let server = file.server;
        Self {
            listen: args
                .listen
                .or(server.listen)
                .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT))),
            data_dir: args
                .data_dir
                .or(server.data_dir)
                .unwrap_or(default_data_dir),
            log_level: args.log_level.or(server.log_level).unwrap_or_default(),
            log_file: args.log_file.or(server.log_file),
            ephemeral: args.ephemeral || server.ephemeral,
            gallery: file.gallery,
        }
    }
}
