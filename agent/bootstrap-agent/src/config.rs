/*!

Configuration for the bootstrap pipeline. Every field has a default so a config file only needs to
name what differs, for example:

```yaml
credentialDir: /home/jujusys/credentials
agentVersion: 2.3.0
bootstrapTimeoutSecs: 2700
```

!*/

use crate::error::{self, Result};
use jujusys_model::constants::{
    CREDENTIALS_DIR, DEFAULT_ADMIN_USER, DEFAULT_AGENT_VERSION, DEFAULT_DATASTORE_FILE,
    JUJU_BINARY, JUJU_DATA_ENV,
};
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;
// Bootstrapping a controller routinely takes several minutes.
const DEFAULT_BOOTSTRAP_TIMEOUT_SECS: u64 = 3600;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BootstrapConfig {
    /// The `juju` executable to run.
    pub juju_binary: PathBuf,
    /// Juju's client data directory, which holds `controllers.yaml`.
    pub juju_data_dir: PathBuf,
    /// Where raw credential secrets are written. These files are kept after bootstrap.
    pub credential_dir: PathBuf,
    /// Where the short-lived credential manifests are written.
    pub manifest_dir: PathBuf,
    /// The Juju agent version every controller is bootstrapped with.
    pub agent_version: String,
    pub admin_username: String,
    #[serde(skip_serializing)]
    pub admin_password: String,
    pub command_timeout_secs: u64,
    pub bootstrap_timeout_secs: u64,
    pub datastore_path: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_default();
        let juju_data_dir = std::env::var_os(JUJU_DATA_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".local").join("share").join("juju"));
        Self {
            juju_binary: PathBuf::from(JUJU_BINARY),
            juju_data_dir,
            credential_dir: home.join(CREDENTIALS_DIR),
            manifest_dir: std::env::temp_dir(),
            agent_version: DEFAULT_AGENT_VERSION.to_string(),
            admin_username: DEFAULT_ADMIN_USER.to_string(),
            admin_password: String::new(),
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            bootstrap_timeout_secs: DEFAULT_BOOTSTRAP_TIMEOUT_SECS,
            datastore_path: home
                .join(".local")
                .join("share")
                .join("jujusys")
                .join(DEFAULT_DATASTORE_FILE),
            log_file: None,
        }
    }
}

impl BootstrapConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).context(error::ConfigReadSnafu { path })?;
        Self::from_yaml(&data, path)
    }

    fn from_yaml(data: &str, path: &Path) -> Result<Self> {
        serde_yaml::from_str(data).context(error::ConfigParseSnafu { path })
    }

    /// Check the settings that have no sensible default.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.admin_password.is_empty(),
            error::ConfigInvalidSnafu {
                message: "an admin password is required"
            }
        );
        ensure!(
            !self.admin_username.is_empty(),
            error::ConfigInvalidSnafu {
                message: "the admin username cannot be empty"
            }
        );
        ensure!(
            self.command_timeout_secs > 0 && self.bootstrap_timeout_secs > 0,
            error::ConfigInvalidSnafu {
                message: "timeouts must be greater than zero"
            }
        );
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn bootstrap_timeout(&self) -> Duration {
        Duration::from_secs(self.bootstrap_timeout_secs)
    }
}
