use crate::error::{self, Result};
use agent_utils::json_display;
use jujusys_model::{AccessGrant, ControllerRecord, Datastore, LocalDatastore, ModelRecord};
use serde::Serialize;
use snafu::{OptionExt, ResultExt};
use std::sync::Arc;
use structopt::StructOpt;

/// Show what jujusys knows about a controller.
#[derive(Debug, StructOpt)]
pub(crate) struct Status {
    /// Name of the controller.
    controller: String,

    /// Output the controller and its models as JSON.
    #[structopt(long = "json")]
    json: bool,
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    controller: ControllerRecord,
    models: Vec<ModelRecord>,
    /// Who can use which model, one entry per user and model.
    grants: Vec<AccessGrant>,
}

impl Status {
    pub(crate) async fn run(&self, datastore: Arc<LocalDatastore>) -> Result<()> {
        let controller = datastore
            .get_controller(&self.controller)
            .await
            .context(error::DatastoreSnafu)?
            .context(error::ControllerNotFoundSnafu {
                name: &self.controller,
            })?;
        let mut models = Vec::new();
        for key in &controller.models {
            if let Some(model) = datastore.get_model(key).await.context(error::DatastoreSnafu)? {
                models.push(model);
            }
        }

        let grants: Vec<AccessGrant> = models.iter().flat_map(ModelRecord::grants).collect();

        if self.json {
            println!(
                "{}",
                json_display(StatusOutput {
                    controller,
                    models,
                    grants,
                })
            );
            return Ok(());
        }

        println!("{}: {}", controller.name, controller.state);
        if let Some(endpoint) = controller.primary_endpoint() {
            println!("  endpoint: {}", endpoint);
        }
        if let Some(uuid) = &controller.uuid {
            println!("  uuid: {}", uuid);
        }
        for model in &models {
            println!("  model {}: {}", model.name, model.state);
            for grant in grants.iter().filter(|grant| grant.model == model.key) {
                println!("    {}: {}", grant.user, grant.role);
            }
        }
        Ok(())
    }
}
