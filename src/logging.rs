//! Diagnostic logging setup.
//!
//! The interactive UI owns the terminal, so it logs to `deepchat.log` in the
//! data directory; one-shot commands log to stderr. Verbosity comes from
//! `DEEPCHAT_LOG` using `EnvFilter` syntax and defaults to `warn`.

use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "DEEPCHAT_LOG";
pub const LOG_FILE_NAME: &str = "deepchat.log";
const DEFAULT_FILTER: &str = "warn";

pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    pub fn in_data_dir(data_dir: &Path) -> Self {
        LogTarget::File(data_dir.join(LOG_FILE_NAME))
    }
}

fn filter_from(value: Option<&str>) -> EnvFilter {
    value
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(target: LogTarget) -> Result<(), Box<dyn Error>> {
    let filter = filter_from(std::env::var(LOG_ENV).ok().as_deref());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            builder
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
        }
    };

    // A subscriber may already be installed, e.g. by a test harness.
    let _ = result;
    Ok(())
}
