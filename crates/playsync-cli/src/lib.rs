//! playsync - keep a folder of Android packages in step with a remote catalog
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! # Overview
//!
//! The binary lists, searches, downloads and updates application archives.
//! All modes that talk to the catalog share one authenticated session,
//! established up front from the configuration file and command-line
//! overrides.
//!
//! # Configuration
//!
//! ```text
//! [Credentials]
//! email = me@example.com
//! password =
//! keyring_service =
//! token = true
//! token_url = https://dispenser.example.com/token
//! catalog_url = https://catalog.example.com/api/
//!
//! [Cache]
//! token = ~/.cache/playsync/token
//! ```

pub mod cmd;
pub mod config;
pub mod confirm;
pub mod exit;
pub mod secret;
pub mod ui;

use clap::Parser;
use std::path::PathBuf;

pub use playsync_core::USER_AGENT;

/// Default number of search results.
pub const DEFAULT_SEARCH_RESULTS: usize = 10;

/// Default device profile.
pub const DEFAULT_DEVICE: &str = "bacon";

#[derive(Debug, Parser)]
#[command(name = "playsync")]
#[command(
    author,
    version,
    about = "An Android package downloader and manager for the command line"
)]
pub struct Cli {
    /// Say yes to all prompted questions
    #[arg(short, long)]
    pub yes: bool,

    /// List APKs in the given folder
    #[arg(short, long, value_name = "FOLDER")]
    pub list: Option<PathBuf>,

    /// Search the catalog for the given string
    #[arg(short, long, value_name = "SEARCH")]
    pub search: Option<String>,

    /// Also search for paid apps
    #[arg(short = 'P', long)]
    pub paid: bool,

    /// Number of search results to show
    #[arg(short, long, value_name = "NUMBER", default_value_t = DEFAULT_SEARCH_RESULTS)]
    pub number: usize,

    /// Download the apps that map the given AppIDs
    #[arg(short, long, value_name = "AppID", num_args = 1..)]
    pub download: Option<Vec<String>>,

    /// Also download expansion files (.obb)
    #[arg(short, long)]
    pub additional_files: bool,

    /// Load packages to download from file, one package per line
    #[arg(short = 'F', long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Update all APKs in the given folder
    #[arg(short, long, value_name = "FOLDER")]
    pub update: Option<PathBuf>,

    /// Where to put downloaded APKs, only for -d and -F
    #[arg(short, long, value_name = "FOLDER", default_value = ".")]
    pub folder: PathBuf,

    /// Device codename to present to the catalog
    #[arg(short = 'D', long, value_name = "DEVICE_CODENAME", default_value = DEFAULT_DEVICE)]
    pub device_codename: String,

    /// Supply the token string yourself; requires --gsf-id
    #[arg(long, value_name = "TOKEN_STR")]
    pub token_str: Option<String>,

    /// Supply the hexadecimal session id yourself; requires --token-str
    #[arg(short, long, value_name = "GSF_ID")]
    pub gsf_id: Option<String>,

    /// Use token authentication instead of account credentials
    #[arg(short, long)]
    pub token: bool,

    /// Token dispenser URL
    #[arg(long, value_name = "TOKEN_URL", env = "PLAYSYNC_TOKEN_URL")]
    pub token_url: Option<String>,

    /// Be verbose
    #[arg(short, long)]
    pub verbose: bool,

    /// Use a different config file than playsync.conf
    #[arg(short, long, value_name = "CONF_FILE")]
    pub config: Option<PathBuf>,

    /// Print a line per package while downloading
    #[arg(short, long)]
    pub progress: bool,

    /// Write downloaded, failed and unavailable apps to log files
    #[arg(short = 'L', long)]
    pub log: bool,

    /// Parallel downloads
    #[arg(short, long, value_name = "N", default_value_t = 1)]
    pub jobs: usize,
}

impl Cli {
    /// Whether any requested mode needs an authenticated catalog session.
    pub fn needs_catalog(&self) -> bool {
        self.update.is_some() || self.search.is_some() || self.download.is_some() || self.file.is_some()
    }
}
