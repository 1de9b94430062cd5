use jujusys_model::Cloud;
use snafu::Snafu;
use std::path::PathBuf;

/// The error type for every step of the bootstrap pipeline.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Controller '{}' is already being bootstrapped", name))]
    BootstrapInProgress { name: String },

    #[snafu(display("Invalid configuration: {}", message))]
    ConfigInvalid { message: String },

    #[snafu(display("Unable to parse configuration file '{}': {}", path.display(), source))]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[snafu(display("Unable to read configuration file '{}': {}", path.display(), source))]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display(
        "Unable to connect to controller '{}' at '{}': {}",
        controller,
        endpoint,
        message
    ))]
    Connection {
        controller: String,
        endpoint: String,
        message: String,
    },

    #[snafu(display("Controller '{}' already exists and is ready", name))]
    ControllerExists { name: String },

    #[snafu(display(
        "Controller '{}' is missing from the Juju registry '{}' even though bootstrap succeeded",
        name,
        path.display()
    ))]
    ControllerNotFoundInRegistry { name: String, path: PathBuf },

    #[snafu(display("Unable to create credential directory '{}': {}", path.display(), source))]
    CredentialDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Unable to serialize credential '{}': {}", name, source))]
    CredentialJson {
        name: String,
        source: serde_json::Error,
    },

    #[snafu(display("User '{}' does not have a credential named '{}'", owner, name))]
    CredentialNotFound { owner: String, name: String },

    #[snafu(display("Unable to write credential file '{}': {}", path.display(), source))]
    CredentialWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Unable to serialize credential manifest for '{}': {}", name, source))]
    CredentialYaml {
        name: String,
        source: serde_yaml::Error,
    },

    #[snafu(context(false))]
    #[snafu(display("Datastore error: {}", source))]
    Datastore { source: jujusys_model::Error },

    #[snafu(display(
        "'{}' {}\nstderr:\n{}",
        command,
        tool_outcome(*exit_code, *timed_out),
        stderr
    ))]
    ExternalTool {
        command: String,
        exit_code: Option<i32>,
        timed_out: bool,
        stderr: String,
    },

    #[snafu(display("Unable to communicate with '{}': {}", command, source))]
    ExternalToolIo {
        command: String,
        source: std::io::Error,
    },

    #[snafu(display("Unable to start '{}': {}", command, source))]
    ExternalToolSpawn {
        command: String,
        source: std::io::Error,
    },

    #[snafu(display("Lost track of '{}': {}", command, source))]
    ExternalToolTask {
        command: String,
        source: tokio::task::JoinError,
    },

    #[snafu(display("Juju registry entry for controller '{}' is missing {}", name, what))]
    IncompleteRegistryEntry { name: String, what: String },

    #[snafu(display("'{}' is not a usable credential name", name))]
    InvalidCredentialName { name: String },

    #[snafu(display(
        "Credential '{}' does not have the fields required by cloud '{}': missing {:?}, unexpected {:?}",
        name,
        cloud,
        missing,
        unexpected
    ))]
    InvalidCredentialShape {
        name: String,
        cloud: Cloud,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[snafu(display("Unable to parse the model list of controller '{}': {}", controller, source))]
    ModelList {
        controller: String,
        source: serde_yaml::Error,
    },

    #[snafu(display("Failed to import models: {}", failed.join(", ")))]
    ModelImportPartialFailure { failed: Vec<String> },

    #[snafu(display("Model record '{}' was not found after import", key))]
    ModelRecordMissing { key: String },

    #[snafu(display("Model '{}' has no uuid", name))]
    ModelUuidMissing { name: String },

    #[snafu(display("Path '{}' is not valid UTF-8", path.display()))]
    NonUtf8Path { path: PathBuf },

    #[snafu(display("Bootstrap of controller '{}' did not finish: {}", controller, source))]
    PipelineTask {
        controller: String,
        source: tokio::task::JoinError,
    },

    #[snafu(display("Unable to parse Juju registry '{}': {}", path.display(), source))]
    RegistryParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[snafu(display("Unable to read Juju registry '{}': {}", path.display(), source))]
    RegistryRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Region '{}' is not supported by cloud '{}'", region, cloud))]
    UnsupportedRegion { cloud: Cloud, region: String },
}

pub type Result<T> = std::result::Result<T, Error>;

fn tool_outcome(exit_code: Option<i32>, timed_out: bool) -> String {
    match (timed_out, exit_code) {
        (true, _) => "timed out".to_string(),
        (false, Some(code)) => format!("failed with exit code {}", code),
        (false, None) => "was terminated by a signal".to_string(),
    }
}

#[test]
fn external_tool_display() {
    let e = Error::ExternalTool {
        command: "juju bootstrap".into(),
        exit_code: Some(1),
        timed_out: false,
        stderr: "quota exceeded".into(),
    };
    assert_eq!(
        e.to_string(),
        "'juju bootstrap' failed with exit code 1\nstderr:\nquota exceeded"
    );
}
