/*!

This library provides the records that jujusys keeps about Juju controllers, models and cloud
credentials, along with the [`Datastore`] interface used to read and write them.

!*/

#![deny(
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::panicking_unwrap,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]

pub use controller::{ControllerDetails, ControllerRecord, ControllerState};
pub use credential::{Cloud, Credential, CredentialState};
pub use datastore::{Datastore, LocalDatastore};
pub use error::{Error, Result};
pub use model::{AccessGrant, AccessRole, ModelKey, ModelRecord, ModelState};

pub mod constants;
mod controller;
mod credential;
mod datastore;
mod error;
mod model;
