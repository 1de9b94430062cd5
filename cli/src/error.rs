use snafu::Snafu;

/// The crate-wide result type.
pub(crate) type Result<T> = std::result::Result<T, Error>;

/// The crate-wide error type.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum Error {
    #[snafu(display("Unable to bootstrap controller '{}': {}", controller, source))]
    Bootstrap {
        controller: String,
        source: bootstrap_agent::Error,
    },

    #[snafu(display("Unable to load configuration: {}", source))]
    Config { source: bootstrap_agent::Error },

    #[snafu(display("Controller '{}' was not found", name))]
    ControllerNotFound { name: String },

    #[snafu(display("Datastore error: {}", source))]
    Datastore { source: jujusys_model::Error },

    #[snafu(display("Unable to initialize logging: {}", source))]
    Logger { source: agent_utils::Error },
}
