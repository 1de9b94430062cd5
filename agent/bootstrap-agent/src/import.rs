/*!

Mirrors the models that already exist on a new controller (at least `controller` and usually
`default`) into the datastore. Each model is imported on its own: a failure is recorded and the
remaining models are still imported.

!*/

use crate::connector::Session;
use crate::error::{self, Error, Result};
use crate::juju::RemoteModel;
use jujusys_model::{AccessRole, Datastore, ModelKey, ModelRecord, ModelState};
use log::{debug, error, info, warn};
use snafu::OptionExt;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub imported: Vec<ModelRecord>,
    /// Entries that did not name a model, or named one we had already imported.
    pub skipped: usize,
    pub failed: Vec<FailedImport>,
}

#[derive(Debug)]
pub struct FailedImport {
    pub name: String,
    pub error: Error,
}

impl ImportOutcome {
    /// The aggregate error for the models that could not be imported, if there were any.
    pub fn failure(&self) -> Option<Error> {
        if self.failed.is_empty() {
            None
        } else {
            Some(Error::ModelImportPartialFailure {
                failed: self.failed.iter().map(|f| f.name.clone()).collect(),
            })
        }
    }
}

pub async fn import_models<S, D>(
    session: &S,
    datastore: &D,
    controller: &str,
    credential: &str,
    user: &str,
) -> Result<ImportOutcome>
where
    S: Session + ?Sized,
    D: Datastore + ?Sized,
{
    let models = session.list_models().await?;
    info!(
        "Importing {} models from controller '{}'",
        models.len(),
        controller
    );
    let mut outcome = ImportOutcome::default();
    let mut seen = HashSet::new();
    for model in models {
        let name = match model.resolved_name() {
            Some(name) => name.to_string(),
            None => {
                debug!("Skipping a model entry without a name");
                outcome.skipped += 1;
                continue;
            }
        };
        if !seen.insert(name.clone()) {
            warn!("Model '{}' was listed more than once", name);
            outcome.skipped += 1;
            continue;
        }
        match import_model(datastore, controller, credential, user, &name, &model).await {
            Ok(record) => {
                debug!("Imported model '{}'", record.key);
                outcome.imported.push(record);
            }
            Err(e) => {
                error!("Unable to import model '{}': {}", name, e);
                mark_failed(datastore, &ModelKey::new(controller, &name), credential).await;
                outcome.failed.push(FailedImport { name, error: e });
            }
        }
    }
    Ok(outcome)
}

/// Move a model that was recorded before its import failed to the `error` state.
async fn mark_failed<D>(datastore: &D, key: &ModelKey, credential: &str)
where
    D: Datastore + ?Sized,
{
    let uuid = match datastore.get_model(key).await {
        Ok(Some(model)) => model.uuid,
        Ok(None) => return,
        Err(e) => {
            warn!("Unable to read model '{}' after a failed import: {}", key, e);
            return;
        }
    };
    if let Err(e) = datastore
        .set_model_state(key, ModelState::Error, credential, &uuid)
        .await
    {
        warn!("Unable to mark model '{}' as failed: {}", key, e);
    }
}

async fn import_model<D>(
    datastore: &D,
    controller: &str,
    credential: &str,
    user: &str,
    name: &str,
    model: &RemoteModel,
) -> Result<ModelRecord>
where
    D: Datastore + ?Sized,
{
    let uuid = model
        .model_uuid
        .as_deref()
        .filter(|uuid| !uuid.is_empty())
        .context(error::ModelUuidMissingSnafu { name })?;
    let key = ModelKey::new(controller, name);
    datastore
        .create_model(&key, name, ModelState::Deploying, uuid)
        .await?;
    datastore.add_model_to_controller(controller, &key).await?;
    datastore
        .set_model_state(&key, ModelState::Ready, credential, uuid)
        .await?;
    datastore
        .set_model_access(&key, user, AccessRole::Admin)
        .await?;
    let record = datastore
        .get_model(&key)
        .await?
        .context(error::ModelRecordMissingSnafu { key: key.as_str() })?;
    Ok(record)
}

#[cfg(test)]
mod test {
    use super::*;
    use jujusys_model::{Cloud, ControllerState, LocalDatastore};
    use std::path::Path;

    /// A session on a controller that lists `models`.
    struct Listing {
        models: Vec<RemoteModel>,
    }

    #[async_trait::async_trait]
    impl Session for Listing {
        fn controller(&self) -> &str {
            "acme-ctrl"
        }

        async fn list_models(&self) -> Result<Vec<RemoteModel>> {
            Ok(self.models.clone())
        }

        async fn update_credential(&self, _cloud: Cloud, _name: &str) -> Result<()> {
            Ok(())
        }

        async fn add_credential(&self, _cloud: Cloud, _name: &str, _manifest: &Path) -> Result<()> {
            Ok(())
        }

        async fn disconnect(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn remote(name: &str, uuid: Option<&str>) -> RemoteModel {
        RemoteModel {
            name: Some(format!("admin/{}", name)),
            short_name: Some(name.to_string()),
            model_uuid: uuid.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn duplicates_and_unnamed_entries_are_skipped() {
        let datastore = LocalDatastore::in_memory();
        datastore
            .set_controller_state("acme-ctrl", ControllerState::Creating, None)
            .await
            .unwrap();
        let session = Listing {
            models: vec![
                remote("default", Some("uuid-default")),
                RemoteModel::default(),
                remote("default", Some("uuid-other")),
            ],
        };

        let outcome = import_models(&session, &datastore, "acme-ctrl", "acme-cred", "alice")
            .await
            .unwrap();
        assert_eq!(outcome.imported.len(), 1);
        assert_eq!(outcome.imported[0].uuid, "uuid-default");
        assert_eq!(outcome.skipped, 2);
        assert!(outcome.failure().is_none());
    }

    #[tokio::test]
    async fn model_recorded_before_failure_is_marked_error() {
        // Linking fails because the controller has no record, after the model was created.
        let datastore = LocalDatastore::in_memory();
        let session = Listing {
            models: vec![remote("default", Some("uuid-default")), remote("broken", None)],
        };

        let outcome = import_models(&session, &datastore, "acme-ctrl", "acme-cred", "alice")
            .await
            .unwrap();
        assert!(outcome.imported.is_empty());
        let failed: Vec<&str> = outcome.failed.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(failed, vec!["default", "broken"]);

        let model = datastore
            .get_model(&ModelKey::new("acme-ctrl", "default"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(model.state, ModelState::Error);
        assert_eq!(model.uuid, "uuid-default");
        assert_eq!(model.credential.as_deref(), Some("acme-cred"));
        assert!(model.access.is_empty());
        // A model without a uuid is never recorded.
        assert!(datastore
            .get_model(&ModelKey::new("acme-ctrl", "broken"))
            .await
            .unwrap()
            .is_none());
    }
}
