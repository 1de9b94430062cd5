use super::Datastore;
use crate::error::{self, Result};
use crate::{
    AccessRole, ControllerDetails, ControllerRecord, ControllerState, Credential, ModelKey,
    ModelRecord, ModelState,
};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use snafu::{ensure, IntoError, OptionExt, ResultExt};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Everything the datastore knows, serialized as one JSON object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(default)]
    controllers: BTreeMap<String, ControllerRecord>,
    #[serde(default)]
    models: BTreeMap<ModelKey, ModelRecord>,
    #[serde(default)]
    credentials: Vec<Credential>,
}

/// A [`Datastore`] that holds its records in memory. When opened with a path, the whole document
/// is rewritten to that path after every change, so the file always reflects the last committed
/// write. All access goes through one lock, which makes each write an atomic upsert.
pub struct LocalDatastore {
    document: Mutex<Document>,
    path: Option<PathBuf>,
}

impl LocalDatastore {
    /// A datastore that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            document: Mutex::new(Document::default()),
            path: None,
        }
    }

    /// Open the datastore persisted at `path`. A missing file is treated as an empty datastore
    /// and is created by the first write.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        let document = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .context(error::DatastoreParseSnafu { path: path.clone() })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(
                    "Datastore file '{}' does not exist, starting empty",
                    path.display()
                );
                Document::default()
            }
            Err(e) => {
                return Err(error::DatastoreReadSnafu { path: path.clone() }
                    .into_error(e)
                    .into())
            }
        };
        Ok(Self {
            document: Mutex::new(document),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Add a credential, replacing any credential with the same owner and name. Credentials are
    /// normally submitted through another flow; this exists to seed a datastore.
    pub async fn add_credential(&self, credential: Credential) -> Result<()> {
        self.write(|document| {
            document
                .credentials
                .retain(|c| !(c.owner == credential.owner && c.name == credential.name));
            document.credentials.push(credential);
            Ok(())
        })
        .await
    }

    /// Every model record, ordered by key.
    pub async fn models(&self) -> Vec<ModelRecord> {
        self.document.lock().await.models.values().cloned().collect()
    }

    async fn write<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Document) -> Result<T> + Send,
        T: Send,
    {
        let mut document = self.document.lock().await;
        // Changes are only visible once they have been persisted.
        let mut staged = Document::clone(&document);
        let value = f(&mut staged)?;
        self.persist(&staged).await?;
        *document = staged;
        Ok(value)
    }

    async fn persist(&self, document: &Document) -> Result<()> {
        let path = match &self.path {
            Some(path) => path,
            None => return Ok(()),
        };
        let bytes =
            serde_json::to_vec_pretty(document).context(error::DatastoreSerializeSnafu)?;
        // Write next to the target and rename so that readers never see a partial document.
        let staging = path.with_extension("tmp");
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .context(error::DatastoreWriteSnafu {
                    path: parent.to_path_buf(),
                })?;
        }
        tokio::fs::write(&staging, bytes)
            .await
            .context(error::DatastoreWriteSnafu {
                path: staging.clone(),
            })?;
        tokio::fs::rename(&staging, path)
            .await
            .context(error::DatastoreWriteSnafu { path: path.clone() })?;
        trace!("Persisted datastore to '{}'", path.display());
        Ok(())
    }
}

#[async_trait::async_trait]
impl Datastore for LocalDatastore {
    async fn get_controller(&self, name: &str) -> Result<Option<ControllerRecord>> {
        Ok(self.document.lock().await.controllers.get(name).cloned())
    }

    async fn set_controller_state(
        &self,
        name: &str,
        state: ControllerState,
        details: Option<ControllerDetails>,
    ) -> Result<ControllerRecord> {
        self.write(|document| {
            let complete = details
                .as_ref()
                .map(ControllerDetails::is_complete)
                .unwrap_or(false);
            ensure!(
                state != ControllerState::Ready || complete,
                error::IncompleteControllerSnafu { name }
            );
            let record = document
                .controllers
                .entry(name.to_string())
                .or_insert_with(|| ControllerRecord::new(name));
            record.transition(state, details);
            Ok(record.clone())
        })
        .await
    }

    async fn get_credentials(&self, owner: &str) -> Result<Vec<Credential>> {
        Ok(self
            .document
            .lock()
            .await
            .credentials
            .iter()
            .filter(|credential| credential.owner == owner)
            .cloned()
            .collect())
    }

    async fn create_model(
        &self,
        key: &ModelKey,
        name: &str,
        state: ModelState,
        uuid: &str,
    ) -> Result<ModelRecord> {
        self.write(|document| {
            let record = ModelRecord::new(key.clone(), name, state, uuid);
            document.models.insert(key.clone(), record.clone());
            Ok(record)
        })
        .await
    }

    async fn get_model(&self, key: &ModelKey) -> Result<Option<ModelRecord>> {
        Ok(self.document.lock().await.models.get(key).cloned())
    }

    async fn add_model_to_controller(&self, controller: &str, key: &ModelKey) -> Result<()> {
        self.write(|document| {
            let model = document
                .models
                .get_mut(key)
                .context(error::ModelNotFoundSnafu { key: key.as_str() })?;
            let record = document
                .controllers
                .get_mut(controller)
                .context(error::ControllerNotFoundSnafu { name: controller })?;
            record.link_model(key.clone());
            model.controller = Some(controller.to_string());
            Ok(())
        })
        .await
    }

    async fn set_model_state(
        &self,
        key: &ModelKey,
        state: ModelState,
        credential: &str,
        uuid: &str,
    ) -> Result<()> {
        self.write(|document| {
            let model = document
                .models
                .get_mut(key)
                .context(error::ModelNotFoundSnafu { key: key.as_str() })?;
            model.state = state;
            model.credential = Some(credential.to_string());
            model.uuid = uuid.to_string();
            Ok(())
        })
        .await
    }

    async fn set_model_access(&self, key: &ModelKey, user: &str, role: AccessRole) -> Result<()> {
        self.write(|document| {
            let model = document
                .models
                .get_mut(key)
                .context(error::ModelNotFoundSnafu { key: key.as_str() })?;
            model.access.insert(user.to_string(), role);
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Cloud;
    use maplit::btreemap;

    fn details() -> ControllerDetails {
        ControllerDetails {
            endpoints: vec!["10.0.0.1:17070".into()],
            uuid: "abc-123".into(),
            ca_cert: "CERT".into(),
        }
    }

    #[tokio::test]
    async fn ready_requires_details() {
        let store = LocalDatastore::in_memory();
        assert!(store
            .set_controller_state("acme-ctrl", ControllerState::Ready, None)
            .await
            .is_err());
        assert!(store.get_controller("acme-ctrl").await.unwrap().is_none());

        let record = store
            .set_controller_state("acme-ctrl", ControllerState::Ready, Some(details()))
            .await
            .unwrap();
        assert_eq!(record.uuid.as_deref(), Some("abc-123"));
    }

    #[tokio::test]
    async fn model_lifecycle() {
        let store = LocalDatastore::in_memory();
        let key = ModelKey::new("acme-ctrl", "m1");
        store
            .create_model(&key, "m1", ModelState::Deploying, "")
            .await
            .unwrap();
        // The controller has not been recorded yet.
        assert!(store
            .add_model_to_controller("acme-ctrl", &key)
            .await
            .is_err());

        store
            .set_controller_state("acme-ctrl", ControllerState::Creating, None)
            .await
            .unwrap();
        store
            .add_model_to_controller("acme-ctrl", &key)
            .await
            .unwrap();
        store
            .add_model_to_controller("acme-ctrl", &key)
            .await
            .unwrap();
        store
            .set_model_state(&key, ModelState::Ready, "acme-cred", "uuid-1")
            .await
            .unwrap();
        store
            .set_model_access(&key, "alice", AccessRole::Admin)
            .await
            .unwrap();

        let controller = store.get_controller("acme-ctrl").await.unwrap().unwrap();
        assert_eq!(controller.models, vec![key.clone()]);
        let model = store.get_model(&key).await.unwrap().unwrap();
        assert_eq!(model.state, ModelState::Ready);
        assert_eq!(model.credential.as_deref(), Some("acme-cred"));
        assert_eq!(model.controller.as_deref(), Some("acme-ctrl"));
        assert_eq!(model.role("alice"), Some(AccessRole::Admin));
    }

    #[tokio::test]
    async fn failed_persist_changes_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocked = dir.path().join("state");
        let store = LocalDatastore::open(blocked.join("store.json")).await.unwrap();
        // The datastore's directory is taken by a file, so nothing can be written.
        std::fs::write(&blocked, "").unwrap();

        assert!(store
            .set_controller_state("acme-ctrl", ControllerState::Creating, None)
            .await
            .is_err());
        assert!(store.get_controller("acme-ctrl").await.unwrap().is_none());

        let key = ModelKey::new("acme-ctrl", "m1");
        assert!(store
            .create_model(&key, "m1", ModelState::Deploying, "uuid-1")
            .await
            .is_err());
        assert!(store.get_model(&key).await.unwrap().is_none());
        assert!(store.models().await.is_empty());
    }

    #[tokio::test]
    async fn persists_between_opens() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        {
            let store = LocalDatastore::open(&path).await.unwrap();
            store
                .add_credential(Credential::new(
                    "alice",
                    "acme-cred",
                    Cloud::Gce,
                    btreemap! {
                        "access_key".to_string() => "a".to_string(),
                        "secret_key".to_string() => "s".to_string(),
                    },
                ))
                .await
                .unwrap();
            store
                .set_controller_state("acme-ctrl", ControllerState::Ready, Some(details()))
                .await
                .unwrap();
        }
        assert!(!path.with_extension("tmp").exists());

        let store = LocalDatastore::open(&path).await.unwrap();
        let controller = store.get_controller("acme-ctrl").await.unwrap().unwrap();
        assert_eq!(controller.state, ControllerState::Ready);
        assert_eq!(store.get_credentials("alice").await.unwrap().len(), 1);
        assert!(store.get_credentials("bob").await.unwrap().is_empty());
    }
}
