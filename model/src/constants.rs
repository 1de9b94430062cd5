// Juju
pub const DEFAULT_AGENT_VERSION: &str = "2.3.0";
pub const DEFAULT_ADMIN_USER: &str = "admin";
pub const JUJU_BINARY: &str = "juju";
pub const JUJU_CONTROLLERS_FILE: &str = "controllers.yaml";
pub const JUJU_DATA_ENV: &str = "JUJU_DATA";

// Local paths
pub const CREDENTIALS_DIR: &str = "credentials";
pub const DEFAULT_DATASTORE_FILE: &str = "jujusys.json";
