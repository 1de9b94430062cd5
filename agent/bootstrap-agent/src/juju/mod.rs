/*!

Everything the pipeline needs from the `juju` command line tool sits behind the [`JujuCli`] trait.
[`DefaultJujuCli`] runs the real binary; tests provide their own implementation.

!*/

mod cli;
mod registry;

pub use cli::DefaultJujuCli;
pub use registry::{ControllerRegistry, RegistryEntry};

use crate::error::Result;
use jujusys_model::Cloud;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The arguments of `juju bootstrap`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BootstrapArgs {
    pub controller: String,
    pub cloud: Cloud,
    pub region: String,
    pub credential: String,
    pub agent_version: String,
}

impl BootstrapArgs {
    /// The `<cloud>/<region>` argument.
    pub fn cloud_region(&self) -> String {
        format!("{}/{}", self.cloud, self.region)
    }
}

/// A model as listed by `juju models --format yaml`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RemoteModel {
    /// The qualified name, e.g. `admin/default`.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub model_uuid: Option<String>,
}

impl RemoteModel {
    /// The model's name without its owner, or `None` if the entry does not name a model.
    pub fn resolved_name(&self) -> Option<&str> {
        let name = self
            .short_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or_else(|| {
                self.name
                    .as_deref()
                    .map(|name| name.rsplit('/').next().unwrap_or(name))
            })?;
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

#[async_trait::async_trait]
pub trait JujuCli: Send + Sync {
    /// `juju add-credential <cloud> -f <manifest> --replace`
    async fn add_credential(&self, cloud: Cloud, manifest: &Path) -> Result<()>;

    /// `juju bootstrap --agent-version=<version> <cloud>/<region> <controller> --credential <name>`
    async fn bootstrap(&self, args: &BootstrapArgs) -> Result<()>;

    /// `juju change-user-password <user> -c <controller>`
    async fn change_user_password(&self, controller: &str, user: &str, password: &str)
        -> Result<()>;

    /// Read Juju's registry of the controllers it knows about.
    async fn controller_registry(&self) -> Result<ControllerRegistry>;

    /// `juju login -c <controller> -u <user>`
    async fn login(&self, controller: &str, user: &str, password: &str) -> Result<()>;

    /// `juju models -c <controller> --format yaml`
    async fn list_models(&self, controller: &str) -> Result<Vec<RemoteModel>>;

    /// `juju update-credential <cloud> <name> -c <controller>`
    async fn update_credential(&self, controller: &str, cloud: Cloud, credential: &str)
        -> Result<()>;
}
