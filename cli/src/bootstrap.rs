use crate::error::{self, Result};
use bootstrap_agent::{
    BootstrapConfig, BootstrapRequest, CliConnector, DefaultJujuCli, Pipeline,
};
use jujusys_model::LocalDatastore;
use log::info;
use snafu::ResultExt;
use std::sync::Arc;
use structopt::StructOpt;

/// Create a Juju controller and import its models.
#[derive(Debug, StructOpt)]
pub(crate) struct Bootstrap {
    /// Name of the controller to create.
    controller: String,

    /// Cloud region to create the controller in, e.g. `us-east1`.
    region: String,

    /// Name of the stored credential to bootstrap with.
    credential: String,

    /// The user who owns the credential. This user is given admin access to every imported model.
    #[structopt(long = "user", short = "u")]
    user: String,

    /// Password to give the controller's admin user. Overrides `adminPassword` from the
    /// configuration file.
    #[structopt(long = "admin-password", env = "JUJUSYS_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,
}

impl Bootstrap {
    pub(crate) async fn run(
        self,
        mut config: BootstrapConfig,
        datastore: Arc<LocalDatastore>,
    ) -> Result<()> {
        if let Some(password) = self.admin_password {
            config.admin_password = password;
        }
        config.validate().context(error::ConfigSnafu)?;

        let juju = Arc::new(DefaultJujuCli::from_config(&config));
        let connector = CliConnector::new(Arc::clone(&juju));
        let pipeline = Pipeline::new(config, juju, connector, datastore);
        let request = BootstrapRequest {
            controller: self.controller.clone(),
            region: self.region,
            credential: self.credential,
            user: self.user,
        };
        info!("Bootstrapping controller '{}'", request.controller);
        let report = pipeline.run(request).await.context(error::BootstrapSnafu {
            controller: &self.controller,
        })?;
        println!("{}", report);
        Ok(())
    }
}
