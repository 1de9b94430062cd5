/*!

The bootstrap pipeline. For one request it:

1. writes the requested credential to disk,
2. registers it with juju and bootstraps the controller,
3. records the controller's connection details in the datastore,
4. connects to the controller,
5. imports the models that exist on the controller, and
6. registers the user's other credentials with the controller.

A failure in steps 1 to 4 stops the pipeline and leaves the controller in the `error` state.
Failures in steps 5 and 6 are reported but the controller stays `ready`. Once connected, the
session is always disconnected.

!*/

use crate::bootstrapper::{bootstrap_controller, set_admin_password};
use crate::cloud;
use crate::config::BootstrapConfig;
use crate::connector::{ConnectTarget, Connector, Session};
use crate::credential_sync::sync_other_credentials;
use crate::credentials::CredentialMaterializer;
use crate::error::{self, Result};
use crate::import::import_models;
use crate::juju::{BootstrapArgs, JujuCli};
use crate::lease::{BootstrapLease, BootstrapLeases};
use crate::state_sync::sync_state;
use agent_utils::impl_display_as_json;
use jujusys_model::{ControllerRecord, ControllerState, Credential, Datastore, ModelKey};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use snafu::{ensure, OptionExt, ResultExt};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A request to create controller `controller` in `region` using `user`'s credential
/// `credential`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapRequest {
    pub controller: String,
    pub region: String,
    pub credential: String,
    pub user: String,
}

/// What a completed pipeline did.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapReport {
    pub controller: ControllerRecord,
    pub imported_models: Vec<ModelKey>,
    pub skipped_models: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_import_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_sync_error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub credential_warnings: Vec<String>,
}

impl_display_as_json!(BootstrapReport);

/// Runs bootstrap requests. Each request runs on its own task, so a caller that stops waiting
/// does not stop the pipeline: the external commands are left to finish and the controller still
/// ends up `ready` or `error`.
pub struct Pipeline<J, C, D>
where
    J: JujuCli,
    C: Connector,
    D: Datastore,
{
    steps: Arc<Steps<J, C, D>>,
    leases: BootstrapLeases,
}

/// What a single pipeline run needs, shared with the task that runs it.
struct Steps<J, C, D>
where
    J: JujuCli,
    C: Connector,
    D: Datastore,
{
    config: BootstrapConfig,
    juju: Arc<J>,
    connector: C,
    datastore: Arc<D>,
    materializer: CredentialMaterializer,
}

impl<J, C, D> Pipeline<J, C, D>
where
    J: JujuCli + 'static,
    C: Connector + 'static,
    D: Datastore + 'static,
{
    pub fn new(config: BootstrapConfig, juju: Arc<J>, connector: C, datastore: Arc<D>) -> Self {
        let materializer = CredentialMaterializer::from_config(&config);
        Self {
            steps: Arc::new(Steps {
                config,
                juju,
                connector,
                datastore,
                materializer,
            }),
            leases: BootstrapLeases::new(),
        }
    }

    pub fn leases(&self) -> &BootstrapLeases {
        &self.leases
    }

    /// Run the pipeline for `request` and wait for it. Dropping the returned future only stops
    /// the wait.
    pub async fn run(&self, request: BootstrapRequest) -> Result<BootstrapReport> {
        let controller = request.controller.clone();
        match self.spawn(request)?.await {
            Ok(result) => result,
            Err(e) => {
                error!("Bootstrap of controller '{}' did not finish: {}", controller, e);
                self.steps.mark_failed(&controller).await;
                Err(e).context(error::PipelineTaskSnafu { controller })
            }
        }
    }

    /// Start the pipeline for `request` in the background. This fails right away, without
    /// touching the datastore, if the controller is already being bootstrapped.
    pub fn spawn(&self, request: BootstrapRequest) -> Result<JoinHandle<Result<BootstrapReport>>> {
        let lease = self.leases.acquire(&request.controller)?;
        info!("Scheduled bootstrap of controller '{}'", request.controller);
        let steps = Arc::clone(&self.steps);
        Ok(tokio::spawn(async move {
            steps.run_with_lease(lease, request).await
        }))
    }
}

impl<J, C, D> Steps<J, C, D>
where
    J: JujuCli,
    C: Connector,
    D: Datastore,
{
    async fn run_with_lease(
        &self,
        lease: BootstrapLease,
        request: BootstrapRequest,
    ) -> Result<BootstrapReport> {
        // An existing controller is left alone rather than being marked as failed.
        if let Some(existing) = self.datastore.get_controller(&request.controller).await? {
            ensure!(
                !existing.is_ready(),
                error::ControllerExistsSnafu {
                    name: &request.controller
                }
            );
        }

        let result = self.provision(&request).await;
        if let Err(e) = &result {
            error!("Unable to bootstrap controller '{}': {}", request.controller, e);
            self.mark_failed(&request.controller).await;
        }
        drop(lease);
        result
    }

    async fn mark_failed(&self, controller: &str) {
        if let Err(e) = self
            .datastore
            .set_controller_state(controller, ControllerState::Error, None)
            .await
        {
            error!("Unable to mark controller '{}' as failed: {}", controller, e);
        }
    }

    async fn provision(&self, request: &BootstrapRequest) -> Result<BootstrapReport> {
        let credential = self.validate(request).await?;
        self.datastore
            .set_controller_state(&request.controller, ControllerState::Creating, None)
            .await?;
        info!(
            "Creating controller '{}' in '{}' for '{}'",
            request.controller, request.region, request.user
        );

        let manifest = self.materializer.materialize(&credential)?;
        let args = BootstrapArgs {
            controller: request.controller.clone(),
            cloud: credential.cloud,
            region: request.region.clone(),
            credential: credential.name.clone(),
            agent_version: self.config.agent_version.clone(),
        };
        bootstrap_controller(self.juju.as_ref(), &args, manifest).await?;
        set_admin_password(
            self.juju.as_ref(),
            &request.controller,
            &self.config.admin_username,
            &self.config.admin_password,
        )
        .await?;

        let record = sync_state(self.juju.as_ref(), self.datastore.as_ref(), &request.controller)
            .await?;

        let target = ConnectTarget::for_controller(
            &record,
            &self.config.admin_username,
            &self.config.admin_password,
        )?;
        let mut session = self.connector.connect(&target).await?;
        let mut report = self.populate(&session, request, record).await;
        if let Err(e) = session.disconnect().await {
            warn!(
                "Unable to disconnect from controller '{}': {}",
                request.controller, e
            );
        }

        if let Ok(Some(record)) = self.datastore.get_controller(&request.controller).await {
            report.controller = record;
        }
        info!("Controller '{}' is ready", request.controller);
        Ok(report)
    }

    /// Steps 5 and 6. Nothing here fails the pipeline.
    async fn populate(
        &self,
        session: &C::Session,
        request: &BootstrapRequest,
        record: ControllerRecord,
    ) -> BootstrapReport {
        let mut report = BootstrapReport {
            controller: record,
            imported_models: Vec::new(),
            skipped_models: 0,
            model_import_error: None,
            credential_sync_error: None,
            credential_warnings: Vec::new(),
        };

        match import_models(
            session,
            self.datastore.as_ref(),
            &request.controller,
            &request.credential,
            &request.user,
        )
        .await
        {
            Ok(outcome) => {
                report.model_import_error = outcome.failure().map(|e| {
                    error!("{}", e);
                    e.to_string()
                });
                report.imported_models = outcome.imported.into_iter().map(|m| m.key).collect();
                report.skipped_models = outcome.skipped;
            }
            Err(e) => {
                error!(
                    "Unable to import models from controller '{}': {}",
                    request.controller, e
                );
                report.model_import_error = Some(e.to_string());
            }
        }

        match sync_other_credentials(
            session,
            self.datastore.as_ref(),
            &self.materializer,
            &request.credential,
            &request.user,
        )
        .await
        {
            Ok(warnings) => {
                report.credential_warnings = warnings.iter().map(ToString::to_string).collect()
            }
            Err(e) => {
                error!(
                    "Unable to register other credentials with controller '{}': {}",
                    request.controller, e
                );
                report.credential_sync_error = Some(e.to_string());
            }
        }
        report
    }

    /// Find the requested credential and check that its cloud offers the requested region.
    async fn validate(&self, request: &BootstrapRequest) -> Result<Credential> {
        let credential = self
            .datastore
            .get_credentials(&request.user)
            .await?
            .into_iter()
            .find(|c| c.name == request.credential)
            .context(error::CredentialNotFoundSnafu {
                owner: &request.user,
                name: &request.credential,
            })?;
        ensure!(
            cloud::is_supported_region(credential.cloud, &request.region),
            error::UnsupportedRegionSnafu {
                cloud: credential.cloud,
                region: &request.region,
            }
        );
        Ok(credential)
    }
}
