/*!

A fake `juju` that records what it was asked to do and pretends to do it, so that the pipeline can
be tested without a cloud or the juju binary.

!*/

use bootstrap_agent::connector::{ConnectTarget, Connector, Session};
use bootstrap_agent::error::{Error, Result};
use bootstrap_agent::juju::{
    BootstrapArgs, ControllerRegistry, JujuCli, RegistryEntry, RemoteModel,
};
use jujusys_model::Cloud;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ENDPOINT: &str = "35.190.1.2:17070";
pub const CA_CERT: &str = "CERT";

#[derive(Debug, Default)]
pub struct FakeJuju {
    /// Each call, formatted like the command line it stands for.
    calls: Mutex<Vec<String>>,
    /// The manifests given to `add-credential`, and whether each existed at the time.
    manifests: Mutex<Vec<(PathBuf, bool)>>,
    /// Subcommand name to the exit code it fails with.
    failures: HashMap<&'static str, i32>,
    /// Credentials whose `update-credential` fails.
    failing_credentials: Vec<String>,
    /// What `bootstrap` adds to the registry. Nothing is registered when this is `None`.
    bootstrap_entry: Option<RegistryEntry>,
    registry: Mutex<ControllerRegistry>,
    models: Vec<Option<RemoteModel>>,
    /// Subcommand name to how long it takes before doing anything.
    delays: HashMap<&'static str, Duration>,
}

impl FakeJuju {
    /// A juju whose bootstrap registers the controller at `ENDPOINT` with uuid `abc-123`.
    pub fn new() -> Self {
        Self {
            bootstrap_entry: Some(RegistryEntry::new([ENDPOINT], "abc-123", CA_CERT)),
            registry: Mutex::new(ControllerRegistry::new("/fake/controllers.yaml")),
            ..Self::default()
        }
    }

    pub fn failing(mut self, subcommand: &'static str, exit_code: i32) -> Self {
        self.failures.insert(subcommand, exit_code);
        self
    }

    pub fn delaying(mut self, subcommand: &'static str, delay: Duration) -> Self {
        self.delays.insert(subcommand, delay);
        self
    }

    pub fn failing_credential(mut self, name: &str) -> Self {
        self.failing_credentials.push(name.to_string());
        self
    }

    pub fn without_registration(mut self) -> Self {
        self.bootstrap_entry = None;
        self
    }

    /// Models named `admin/<name>` with uuid `uuid-<name>`.
    pub fn with_models(mut self, names: &[&str]) -> Self {
        self.models = names
            .iter()
            .map(|name| {
                Some(RemoteModel {
                    name: Some(format!("admin/{}", name)),
                    short_name: Some(name.to_string()),
                    model_uuid: Some(format!("uuid-{}", name)),
                })
            })
            .collect();
        self
    }

    pub fn with_remote_models(mut self, models: Vec<Option<RemoteModel>>) -> Self {
        self.models = models;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, subcommand: &str) -> bool {
        self.calls()
            .iter()
            .any(|call| call.split(' ').next() == Some(subcommand))
    }

    pub fn manifests(&self) -> Vec<(PathBuf, bool)> {
        self.manifests.lock().unwrap().clone()
    }

    async fn pause(&self, subcommand: &'static str) {
        if let Some(delay) = self.delays.get(subcommand) {
            tokio::time::sleep(*delay).await;
        }
    }

    fn record(&self, subcommand: &'static str, args: &[&str]) -> Result<()> {
        let mut call = vec![subcommand];
        call.extend_from_slice(args);
        self.calls.lock().unwrap().push(call.join(" "));
        match self.failures.get(subcommand) {
            Some(code) => Err(Error::ExternalTool {
                command: format!("juju {}", subcommand),
                exit_code: Some(*code),
                timed_out: false,
                stderr: format!("ERROR {} failed", subcommand),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl JujuCli for FakeJuju {
    async fn add_credential(&self, cloud: Cloud, manifest: &Path) -> Result<()> {
        self.manifests
            .lock()
            .unwrap()
            .push((manifest.to_path_buf(), manifest.exists()));
        self.record(
            "add-credential",
            &[&cloud.to_string(), "-f", &manifest.display().to_string()],
        )
    }

    async fn bootstrap(&self, args: &BootstrapArgs) -> Result<()> {
        self.pause("bootstrap").await;
        self.record(
            "bootstrap",
            &[&args.cloud_region(), &args.controller, &args.credential],
        )?;
        if let Some(entry) = &self.bootstrap_entry {
            self.registry
                .lock()
                .unwrap()
                .insert(args.controller.clone(), entry.clone());
        }
        Ok(())
    }

    async fn change_user_password(
        &self,
        controller: &str,
        user: &str,
        _password: &str,
    ) -> Result<()> {
        self.record("change-user-password", &[user, "-c", controller])
    }

    async fn controller_registry(&self) -> Result<ControllerRegistry> {
        Ok(self.registry.lock().unwrap().clone())
    }

    async fn login(&self, controller: &str, user: &str, _password: &str) -> Result<()> {
        self.record("login", &["-c", controller, "-u", user])
    }

    async fn list_models(&self, controller: &str) -> Result<Vec<RemoteModel>> {
        self.pause("models").await;
        self.record("models", &["-c", controller])?;
        Ok(self
            .models
            .iter()
            .cloned()
            .map(Option::unwrap_or_default)
            .collect())
    }

    async fn update_credential(
        &self,
        controller: &str,
        cloud: Cloud,
        credential: &str,
    ) -> Result<()> {
        self.record(
            "update-credential",
            &[&cloud.to_string(), credential, "-c", controller],
        )?;
        if self.failing_credentials.iter().any(|c| c == credential) {
            return Err(Error::ExternalTool {
                command: "juju update-credential".into(),
                exit_code: Some(1),
                timed_out: false,
                stderr: format!("ERROR credential '{}' is not valid", credential),
            });
        }
        Ok(())
    }
}

/// A connector that counts how often its sessions are disconnected.
#[derive(Debug)]
pub struct TrackingConnector {
    juju: Arc<FakeJuju>,
    pub disconnects: Arc<AtomicUsize>,
}

impl TrackingConnector {
    pub fn new(juju: Arc<FakeJuju>) -> Self {
        Self {
            juju,
            disconnects: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[derive(Debug)]
pub struct TrackingSession {
    juju: Arc<FakeJuju>,
    controller: String,
    disconnects: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Connector for TrackingConnector {
    type Session = TrackingSession;

    async fn connect(&self, target: &ConnectTarget) -> Result<Self::Session> {
        self.juju
            .login(&target.controller, &target.username, &target.password)
            .await
            .map_err(|e| Error::Connection {
                controller: target.controller.clone(),
                endpoint: target.endpoint.clone(),
                message: e.to_string(),
            })?;
        Ok(TrackingSession {
            juju: Arc::clone(&self.juju),
            controller: target.controller.clone(),
            disconnects: Arc::clone(&self.disconnects),
        })
    }
}

#[async_trait::async_trait]
impl Session for TrackingSession {
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

    async fn add_credential(&self, cloud: Cloud, name: &str, manifest: &Path) -> Result<()> {
        self.juju.add_credential(cloud, manifest).await?;
        self.update_credential(cloud, name).await
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
