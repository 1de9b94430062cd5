use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
pub struct Error(OpaqueError);
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum OpaqueError {
    #[snafu(display("Controller '{}' does not exist", name))]
    ControllerNotFound { name: String },

    #[snafu(display(
        "Controller '{}' cannot be marked ready without endpoints, a uuid and a CA certificate",
        name
    ))]
    IncompleteController { name: String },

    #[snafu(display("Unable to parse datastore file '{}': {}", path.display(), source))]
    DatastoreParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("Unable to read datastore file '{}': {}", path.display(), source))]
    DatastoreRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Unable to serialize the datastore: {}", source))]
    DatastoreSerialize { source: serde_json::Error },

    #[snafu(display("Unable to write datastore file '{}': {}", path.display(), source))]
    DatastoreWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Model '{}' does not exist", key))]
    ModelNotFound { key: String },
}
