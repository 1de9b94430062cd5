/*!

`bootstrap-agent` creates Juju controllers. Given a [`BootstrapRequest`] naming a controller, a
region and one of the requesting user's stored credentials, the [`Pipeline`] writes the credential
to disk, runs `juju bootstrap`, records the new controller in the [`Datastore`], imports the
controller's models and registers the user's other credentials with it.

The `juju` binary, the controller session and the datastore are all reached through traits
([`JujuCli`], [`Connector`] and [`Datastore`]) so that the pipeline can be tested without a cloud.

[`Datastore`]: jujusys_model::Datastore

!*/

pub mod bootstrapper;
pub mod cloud;
pub mod config;
pub mod connector;
pub mod credential_sync;
pub mod credentials;
pub mod error;
pub mod import;
pub mod juju;
pub mod lease;
pub mod pipeline;
pub mod state_sync;

pub use config::BootstrapConfig;
pub use connector::{CliConnector, CliSession, ConnectTarget, Connector, Session};
pub use credential_sync::CredentialSyncWarning;
pub use credentials::{CredentialManifest, CredentialMaterializer};
pub use error::{Error, Result};
pub use import::{FailedImport, ImportOutcome};
pub use juju::{BootstrapArgs, DefaultJujuCli, JujuCli, RemoteModel};
pub use lease::{BootstrapLease, BootstrapLeases};
pub use pipeline::{BootstrapReport, BootstrapRequest, Pipeline};
