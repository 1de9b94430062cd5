/*!

Opening an authenticated session to a controller. The pipeline talks to a controller only through
the [`Session`] it gets from a [`Connector`], and it disconnects that session on every path once
the connection has been made.

!*/

use crate::error::{self, Error, Result};
use crate::juju::{JujuCli, RemoteModel};
use jujusys_model::{Cloud, ControllerRecord};
use log::{debug, warn};
use snafu::OptionExt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Where and as whom to connect.
#[derive(Clone)]
pub struct ConnectTarget {
    pub controller: String,
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub ca_cert: String,
}

impl Debug for ConnectTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectTarget")
            .field("controller", &self.controller)
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl ConnectTarget {
    /// Build a target from a `ready` controller record.
    pub fn for_controller(
        record: &ControllerRecord,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        let endpoint = record
            .primary_endpoint()
            .context(error::IncompleteRegistryEntrySnafu {
                name: &record.name,
                what: "api-endpoints",
            })?;
        let ca_cert = record
            .ca_cert
            .clone()
            .context(error::IncompleteRegistryEntrySnafu {
                name: &record.name,
                what: "ca-cert",
            })?;
        Ok(Self {
            controller: record.name.clone(),
            endpoint: endpoint.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            ca_cert,
        })
    }

    fn connection_error<S: Into<String>>(&self, message: S) -> Error {
        Error::Connection {
            controller: self.controller.clone(),
            endpoint: self.endpoint.clone(),
            message: message.into(),
        }
    }
}

/// An open, authenticated connection to a controller.
#[async_trait::async_trait]
pub trait Session: Send + Sync {
    fn controller(&self) -> &str;

    async fn list_models(&self) -> Result<Vec<RemoteModel>>;

    /// Upload the locally registered credential `name` to the controller.
    async fn update_credential(&self, cloud: Cloud, name: &str) -> Result<()>;

    /// Register and upload a credential from its manifest.
    async fn add_credential(&self, cloud: Cloud, name: &str, manifest: &std::path::Path)
        -> Result<()>;

    async fn disconnect(&mut self) -> Result<()>;
}

#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    type Session: Session;

    async fn connect(&self, target: &ConnectTarget) -> Result<Self::Session>;
}

/// Connects by logging the `juju` client in to the controller, after checking that the client's
/// registry entry matches the controller we expect.
#[derive(Debug)]
pub struct CliConnector<J: JujuCli> {
    juju: Arc<J>,
}

impl<J: JujuCli> CliConnector<J> {
    pub fn new(juju: Arc<J>) -> Self {
        Self { juju }
    }
}

#[async_trait::async_trait]
impl<J: JujuCli + 'static> Connector for CliConnector<J> {
    type Session = CliSession<J>;

    async fn connect(&self, target: &ConnectTarget) -> Result<Self::Session> {
        debug!(
            "Connecting to controller '{}' at '{}' as '{}'",
            target.controller, target.endpoint, target.username
        );
        let registry = self
            .juju
            .controller_registry()
            .await
            .map_err(|e| target.connection_error(e.to_string()))?;
        let entry = registry
            .get(&target.controller)
            .ok_or_else(|| target.connection_error("the controller is not known to juju"))?;
        if !entry.api_endpoints.contains(&target.endpoint) {
            return Err(target.connection_error("the endpoint is not served by the controller"));
        }
        if entry.ca_cert.as_deref() != Some(target.ca_cert.as_str()) {
            return Err(target.connection_error("the CA certificate does not match"));
        }
        self.juju
            .login(&target.controller, &target.username, &target.password)
            .await
            .map_err(|e| target.connection_error(e.to_string()))?;
        Ok(CliSession {
            juju: Arc::clone(&self.juju),
            controller: target.controller.clone(),
            open: true,
        })
    }
}

pub struct CliSession<J: JujuCli> {
    juju: Arc<J>,
    controller: String,
    open: bool,
}

impl<J: JujuCli> Debug for CliSession<J> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliSession")
            .field("controller", &self.controller)
            .field("open", &self.open)
            .finish()
    }
}

#[async_trait::async_trait]
impl<J: JujuCli> Session for CliSession<J> {
    fn controller(&self) -> &str {
        &self.controller
    }

    async fn list_models(&self) -> Result<Vec<RemoteModel>> {
        self.juju.list_models(&self.controller).await
    }

    async fn update_credential(&self, cloud: Cloud, name: &str) -> Result<()> {
        self.juju
            .update_credential(&self.controller, cloud, name)
            .await
    }

    async fn add_credential(
        &self,
        cloud: Cloud,
        name: &str,
        manifest: &std::path::Path,
    ) -> Result<()> {
        self.juju.add_credential(cloud, manifest).await?;
        self.update_credential(cloud, name).await
    }

    async fn disconnect(&mut self) -> Result<()> {
        // The juju client keeps its login in the data directory; nothing is held open here.
        self.open = false;
        debug!("Disconnected from controller '{}'", self.controller);
        Ok(())
    }
}

impl<J: JujuCli> Drop for CliSession<J> {
    fn drop(&mut self) {
        if self.open {
            warn!(
                "Session to controller '{}' was dropped without being disconnected",
                self.controller
            );
        }
    }
}

#[test]
fn target_debug_hides_password() {
    let target = ConnectTarget {
        controller: "acme-ctrl".into(),
        endpoint: "35.190.1.2:17070".into(),
        username: "admin".into(),
        password: "hunter2".into(),
        ca_cert: "CERT".into(),
    };
    let debug = format!("{:?}", target);
    assert!(debug.contains("acme-ctrl"));
    assert!(!debug.contains("hunter2"));
}
