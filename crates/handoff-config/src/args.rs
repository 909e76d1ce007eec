//! Command-line and environment surface for the bootstrap configuration.
//!
//! Every field is optional at this layer so the resolver can report the first
//! missing required value by name and apply defaults in a single place. Flags
//! take precedence over the environment variable named next to each field.

use std::ffi::OsString;

use camino::Utf8PathBuf;
use clap::Parser;

use crate::launch::LaunchMode;
use crate::logging::LogFormat;
use crate::store::StoreBackend;

/// Raw bootstrap inputs gathered from flags and environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(
    name = "handoff",
    version,
    about = "Fetch the current worker handler, fall back to the baked copy, and exec it"
)]
pub struct BootstrapArgs {
    /// Region of the blob store [default: us-east-1].
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Bucket holding the handler artifact.
    #[arg(long, env = "S3_BUCKET")]
    pub bucket: Option<String>,

    /// Object key of the handler artifact.
    #[arg(long = "key", env = "HANDLER_KEY")]
    pub artifact_key: Option<String>,

    /// Path the resolved handler is installed to.
    #[arg(long, env = "HANDLER_LIVE_PATH")]
    pub live_path: Option<Utf8PathBuf>,

    /// Handler copy baked into the image.
    #[arg(long, env = "HANDLER_BAKED_PATH")]
    pub baked_path: Option<Utf8PathBuf>,

    /// Interpreter the handler is handed to.
    #[arg(long = "interpreter", env = "HANDLER_INTERPRETER")]
    pub interpreter_path: Option<Utf8PathBuf>,

    /// Upper bound on the fetch attempt in seconds [default: 30].
    #[arg(long, env = "HANDLER_FETCH_TIMEOUT_SECS")]
    pub fetch_timeout_secs: Option<u64>,

    /// Blob store backend: `aws_cli` or `directory` [default: aws_cli].
    #[arg(long, env = "HANDLER_STORE")]
    pub store: Option<StoreBackend>,

    /// Root directory of the `directory` store.
    #[arg(long, env = "HANDLER_STORE_ROOT")]
    pub store_root: Option<Utf8PathBuf>,

    /// AWS CLI program used by the `aws_cli` store [default: aws].
    #[arg(long = "aws-cli", env = "HANDLER_AWS_CLI")]
    pub aws_cli: Option<String>,

    /// Handoff strategy: `replace` or `supervise` [default: replace].
    #[arg(long, env = "HANDOFF_LAUNCH_MODE")]
    pub launch_mode: Option<LaunchMode>,

    /// Log filter expression [default: info].
    #[arg(long, env = "HANDOFF_LOG_FILTER")]
    pub log_filter: Option<String>,

    /// Log output format: `json` or `compact` [default: json].
    #[arg(long, env = "HANDOFF_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Image version reported in the boot log [default: unknown].
    #[arg(long, env = "IMAGE_VERSION")]
    pub image_version: Option<String>,

    /// Arguments appended after the handler path.
    #[arg(last = true)]
    pub handler_args: Vec<OsString>,
}
