// Configuration: everything comes from environment variables plus one
// optional positional argument (the directory to scan). Only the
// password has no default; without it the program prints usage and
// exits before making any network call.

use std::env;
use std::path::PathBuf;

pub const DEFAULT_SERVER_URL: &str = "http://spserver:1580";
pub const DEFAULT_NODE_ID: &str = "APPLEBEES";
pub const DEFAULT_BACKUP_DIR: &str = "/sp_backups/ceph_downloads";
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

/// Runtime configuration for one backup run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backup server, e.g. `http://spserver:1580`.
    pub server_url: String,
    /// Node identity presented at sign-on.
    pub node_id: String,
    /// Node password. Required.
    pub password: String,
    /// Server-side destination path reported in the job submission.
    pub backup_directory: String,
    /// Local directory scanned for files to back up.
    pub download_dir: PathBuf,
}

/// The one fatal startup error: no credential configured.
#[derive(Debug)]
pub struct MissingPassword;

impl Config {
    /// Build the configuration from the process environment and argv.
    /// `args` is the full argument list including the program name.
    pub fn load<I: IntoIterator<Item = String>>(args: I) -> Result<Self, MissingPassword> {
        let password = env::var("SP_PASSWORD").map_err(|_| MissingPassword)?;

        Ok(Config {
            server_url: env::var("SP_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.into()),
            node_id: env::var("SP_NODE_ID").unwrap_or_else(|_| DEFAULT_NODE_ID.into()),
            password,
            backup_directory: env::var("SP_BACKUP_DIR")
                .unwrap_or_else(|_| DEFAULT_BACKUP_DIR.into()),
            download_dir: download_dir_from_args(args),
        })
    }
}

/// The single optional positional argument: the directory to scan.
fn download_dir_from_args<I: IntoIterator<Item = String>>(args: I) -> PathBuf {
    args.into_iter()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR))
}

/// Usage text printed to stderr when the credential is missing.
pub fn print_usage(program: &str) {
    eprintln!("Error: SP_PASSWORD environment variable not set");
    eprintln!();
    eprintln!("Usage: {} [download_directory]", program);
    eprintln!();
    eprintln!("Environment variables:");
    eprintln!("  SP_SERVER_URL  - Backup server (default: {})", DEFAULT_SERVER_URL);
    eprintln!("  SP_NODE_ID     - Node ID (default: {})", DEFAULT_NODE_ID);
    eprintln!("  SP_PASSWORD    - Password (required)");
    eprintln!("  SP_BACKUP_DIR  - Backup directory (default: {})", DEFAULT_BACKUP_DIR);
}
