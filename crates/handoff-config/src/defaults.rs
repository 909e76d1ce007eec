use std::time::Duration;

use camino::Utf8PathBuf;

use crate::launch::LaunchMode;
use crate::logging::LogFormat;
use crate::store::StoreBackend;

/// Region used when `AWS_REGION` is not set.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Location the live handler is installed to before handoff.
pub const DEFAULT_LIVE_PATH: &str = "/workspace/rp_handler.py";

/// Handler copy baked into the image at build time.
pub const DEFAULT_BAKED_PATH: &str = "/opt/handoff/rp_handler.py";

/// Interpreter the handler is handed to.
pub const DEFAULT_INTERPRETER_PATH: &str = "/workspace/ComfyUI/.venv/bin/python";

/// Upper bound on the single fetch attempt, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Program used by the AWS CLI blob store.
pub const DEFAULT_AWS_CLI: &str = "aws";

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Value reported when `IMAGE_VERSION` is not set.
pub const DEFAULT_IMAGE_VERSION: &str = "unknown";

/// Default fetch timeout as a [`Duration`].
#[must_use]
pub const fn default_fetch_timeout() -> Duration {
    Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS)
}

/// Default live handler path.
#[must_use]
pub fn default_live_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_LIVE_PATH)
}

/// Default baked fallback path.
#[must_use]
pub fn default_baked_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_BAKED_PATH)
}

/// Default interpreter path.
#[must_use]
pub fn default_interpreter_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_INTERPRETER_PATH)
}

/// Default logging format for the binary.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default blob store backend.
#[must_use]
pub const fn default_store_backend() -> StoreBackend {
    StoreBackend::AwsCli
}

/// Default handoff strategy.
#[must_use]
pub const fn default_launch_mode() -> LaunchMode {
    LaunchMode::Replace
}
