/*!

The `datastore` module defines the [`Datastore`] trait, which is how the bootstrap pipeline reads
credentials and records controller and model state, and [`LocalDatastore`], an implementation that
keeps a single document in memory and optionally persists it to a JSON file.

!*/

mod local;

pub use local::LocalDatastore;

use crate::{
    AccessRole, ControllerDetails, ControllerRecord, ControllerState, Credential, ModelKey,
    ModelRecord, ModelState, Result,
};

/// Every write is an atomic upsert of a single record. Implementations must be safe to share
/// between concurrently running pipelines for different controllers.
#[async_trait::async_trait]
pub trait Datastore: Send + Sync {
    async fn get_controller(&self, name: &str) -> Result<Option<ControllerRecord>>;

    /// Create or update the controller record. `details` must be complete when `state` is
    /// `ready`; for any other state the stored details are cleared.
    async fn set_controller_state(
        &self,
        name: &str,
        state: ControllerState,
        details: Option<ControllerDetails>,
    ) -> Result<ControllerRecord>;

    /// All credentials owned by `owner`.
    async fn get_credentials(&self, owner: &str) -> Result<Vec<Credential>>;

    /// Create (or replace) the model record stored under `key`.
    async fn create_model(
        &self,
        key: &ModelKey,
        name: &str,
        state: ModelState,
        uuid: &str,
    ) -> Result<ModelRecord>;

    async fn get_model(&self, key: &ModelKey) -> Result<Option<ModelRecord>>;

    async fn add_model_to_controller(&self, controller: &str, key: &ModelKey) -> Result<()>;

    async fn set_model_state(
        &self,
        key: &ModelKey,
        state: ModelState,
        credential: &str,
        uuid: &str,
    ) -> Result<()>;

    async fn set_model_access(&self, key: &ModelKey, user: &str, role: AccessRole) -> Result<()>;
}
