use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::{env, path::PathBuf};

use crate::services::executors::ClientOs;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the console API, e.g. `http://localhost:9090/api/v1`.
    pub api_url: String,
    /// Session token sent as the `token` cookie.
    pub token: Option<String>,
    pub download_dir: PathBuf,
    /// Reported client OS; decides the long-name rename prompt.
    pub client_os: ClientOs,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Browse buckets and transfer objects through the console API")]
pub struct Args {
    /// Console API base URL (overrides OBJECT_BROWSER_API_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Session token (overrides OBJECT_BROWSER_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Directory downloads are saved to (overrides OBJECT_BROWSER_DOWNLOAD_DIR)
    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    /// Client OS to assume: windows, macos, linux (overrides OBJECT_BROWSER_CLIENT_OS)
    #[arg(long)]
    pub client_os: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List a folder, or open an object when PATH has no trailing slash
    Ls {
        bucket: String,
        #[arg(default_value = "")]
        path: String,
        /// List objects as of this RFC 3339 timestamp
        #[arg(long)]
        rewind: Option<String>,
        /// Include deleted objects
        #[arg(long)]
        show_deleted: bool,
        /// Only show entries whose name contains this text
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show the version history of one object
    Versions { bucket: String, key: String },
    /// Show bucket metadata
    Info { bucket: String },
    /// Upload files into a folder
    Upload {
        bucket: String,
        /// Destination folder (empty for the bucket root)
        #[arg(long, default_value = "")]
        prefix: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Download objects into the download directory
    Download {
        bucket: String,
        #[arg(required = true)]
        keys: Vec<String>,
        /// Local name to use when a rename is required
        #[arg(long)]
        rename: Option<String>,
    },
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the command to run.
    pub fn from_env_and_args() -> Result<(Self, Command)> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_api_url = env::var("OBJECT_BROWSER_API_URL")
            .unwrap_or_else(|_| "http://localhost:9090/api/v1".into());
        let env_token = env::var("OBJECT_BROWSER_TOKEN").ok();
        let env_download_dir = env::var("OBJECT_BROWSER_DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        let env_client_os = match env::var("OBJECT_BROWSER_CLIENT_OS") {
            Ok(value) => Some(value),
            Err(env::VarError::NotPresent) => None,
            Err(err) => return Err(err).context("reading OBJECT_BROWSER_CLIENT_OS"),
        };

        // --- Merge ---
        let client_os = match args.client_os.or(env_client_os) {
            Some(value) => value
                .parse::<ClientOs>()
                .map_err(|e| anyhow!(e))
                .with_context(|| format!("parsing client os `{}`", value))?,
            None => ClientOs::current(),
        };

        let cfg = Self {
            api_url: args.api_url.unwrap_or(env_api_url),
            token: args.token.or(env_token),
            download_dir: args.download_dir.unwrap_or(env_download_dir),
            client_os,
        };

        Ok((cfg, args.command))
    }
}
