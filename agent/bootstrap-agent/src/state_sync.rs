use crate::error::{self, Result};
use crate::juju::JujuCli;
use jujusys_model::{ControllerRecord, ControllerState, Datastore};
use log::info;
use snafu::OptionExt;

/// Copy what juju recorded about `controller` into the datastore and mark the controller `ready`.
///
/// A controller that juju does not know about, or knows only partially, is an error even if
/// `juju bootstrap` exited successfully.
pub async fn sync_state<J, D>(juju: &J, datastore: &D, controller: &str) -> Result<ControllerRecord>
where
    J: JujuCli + ?Sized,
    D: Datastore + ?Sized,
{
    let registry = juju.controller_registry().await?;
    let entry = registry
        .get(controller)
        .context(error::ControllerNotFoundInRegistrySnafu {
            name: controller,
            path: registry.path(),
        })?;
    let details = entry.details(controller)?;
    let record = datastore
        .set_controller_state(controller, ControllerState::Ready, Some(details))
        .await?;
    info!(
        "Controller '{}' is ready at {}",
        controller,
        record.endpoints.join(", ")
    );
    Ok(record)
}
