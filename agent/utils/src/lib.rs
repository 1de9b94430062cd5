/*!

`agent-utils` is a collection of functions that are shared by the jujusys agent and command line
interface.

!*/

use constants::DEFAULT_AGENT_LEVEL_FILTER;
use env_logger::{Builder, Target};
pub use error::Error;
use log::LevelFilter;
use serde::Serialize;
use snafu::ResultExt;
use std::env;
use std::fs::OpenOptions;
use std::path::Path;

pub mod constants;
mod error;

/// The crates whose logs we show at the requested level. Everything else is limited to errors.
const OUR_CRATES: &[&str] = &["agent_utils", "bootstrap_agent", "jujusys_model"];

/// Extract the value of `RUST_LOG` if it exists, otherwise log this application at `log_level` or
/// `DEFAULT_AGENT_LEVEL_FILTER`. When `log_file` is given, log lines are appended to that file
/// instead of stderr.
pub fn init_agent_logger(
    bin_crate: &str,
    log_level: Option<LevelFilter>,
    log_file: Option<&Path>,
) -> error::Result<()> {
    let mut builder = match env::var(env_logger::DEFAULT_FILTER_ENV).ok() {
        // RUST_LOG exists; env_logger will use it.
        Some(_) => Builder::from_default_env(),
        None => {
            let log_level = log_level.unwrap_or(DEFAULT_AGENT_LEVEL_FILTER);
            let mut builder = Builder::new();
            // Set log level to Error for crates other than our own.
            builder.filter_level(LevelFilter::Error);
            builder.filter(Some(bin_crate), log_level);
            for name in OUR_CRATES {
                builder.filter(Some(name), log_level);
            }
            builder
        }
    };
    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .context(error::LogFileSnafu { path })?;
        builder.target(Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

/// Print a value using `serde_json` `to_string_pretty` for types that implement Serialize.
pub fn json_display<T: Serialize>(object: T) -> String {
    serde_json::to_string_pretty(&object).unwrap_or_else(|e| format!("Serialization failed: {}", e))
}

/// Implement `Display` using `serde_json` `to_string_pretty` for types that implement Serialize.
#[macro_export]
macro_rules! impl_display_as_json {
    ($i:ident) => {
        impl std::fmt::Display for $i {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let s = serde_json::to_string_pretty(self)
                    .unwrap_or_else(|e| format!("Serialization failed: {}", e));
                std::fmt::Display::fmt(&s, f)
            }
        }
    };
}

#[test]
fn json_display_pretty_prints() {
    #[derive(Serialize)]
    struct Memo {
        status: &'static str,
    }
    assert_eq!(
        json_display(Memo { status: "ready" }),
        "{\n  \"status\": \"ready\"\n}"
    );
}

#[test]
fn unwritable_log_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let missing = dir.path().join("no-such-dir").join("bootstrap.log");
    assert!(init_agent_logger("agent_utils", None, Some(&missing)).is_err());
}
