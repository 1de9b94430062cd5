use crate::error::{self, Result};
use jujusys_model::ControllerDetails;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// The contents of Juju's `controllers.yaml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ControllerRegistry {
    #[serde(default)]
    pub controllers: BTreeMap<String, RegistryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_controller: Option<String>,
    #[serde(skip)]
    path: PathBuf,
}

/// A single controller in `controllers.yaml`. Fields we do not use are kept in `other`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegistryEntry {
    #[serde(default)]
    pub api_endpoints: Vec<String>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub ca_cert: Option<String>,
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_yaml::Value>,
}

impl ControllerRegistry {
    /// An empty registry that claims to have been read from `path`.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Read the registry. Juju only creates the file once it knows a controller, so a missing
    /// file is an empty registry.
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::new(path)),
            Err(e) => return Err(e).context(error::RegistryReadSnafu { path }),
        };
        let mut registry = if data.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str::<Self>(&data).context(error::RegistryParseSnafu { path })?
        };
        registry.path = path.to_path_buf();
        Ok(registry)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.controllers.get(name)
    }

    pub fn insert<S: Into<String>>(&mut self, name: S, entry: RegistryEntry) {
        self.controllers.insert(name.into(), entry);
    }
}

impl RegistryEntry {
    pub fn new<I, S>(endpoints: I, uuid: &str, ca_cert: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            api_endpoints: endpoints.into_iter().map(Into::into).collect(),
            uuid: Some(uuid.to_string()),
            ca_cert: Some(ca_cert.to_string()),
            other: BTreeMap::new(),
        }
    }

    /// The details needed to mark controller `name` ready. Fails if any of them is missing.
    pub fn details(&self, name: &str) -> Result<ControllerDetails> {
        snafu::ensure!(
            !self.api_endpoints.is_empty(),
            error::IncompleteRegistryEntrySnafu {
                name,
                what: "api-endpoints"
            }
        );
        let uuid = self
            .uuid
            .clone()
            .filter(|uuid| !uuid.is_empty())
            .context(error::IncompleteRegistryEntrySnafu { name, what: "uuid" })?;
        let ca_cert = self
            .ca_cert
            .clone()
            .filter(|cert| !cert.is_empty())
            .context(error::IncompleteRegistryEntrySnafu {
                name,
                what: "ca-cert",
            })?;
        Ok(ControllerDetails {
            endpoints: self.api_endpoints.clone(),
            uuid,
            ca_cert,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;

    const CONTROLLERS_YAML: &str = r#"controllers:
  acme-ctrl:
    unresolved-api-endpoints:
    - 35.190.1.2:17070
    uuid: abc-123
    api-endpoints:
    - 35.190.1.2:17070
    - 10.142.0.2:17070
    ca-cert: |
      -----BEGIN CERTIFICATE-----
      MIIC
      -----END CERTIFICATE-----
    cloud: google
    region: us-east1
    agent-version: 2.3.0
  half-done:
    uuid: def-456
current-controller: acme-ctrl
"#;

    #[test]
    fn reads_controllers_yaml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("controllers.yaml");
        std::fs::write(&path, CONTROLLERS_YAML).unwrap();
        let registry = ControllerRegistry::from_path(&path).unwrap();
        assert_eq!(registry.path(), path);
        assert_eq!(registry.current_controller.as_deref(), Some("acme-ctrl"));

        let details = registry.get("acme-ctrl").unwrap().details("acme-ctrl").unwrap();
        assert_eq!(
            details.endpoints,
            vec!["35.190.1.2:17070".to_string(), "10.142.0.2:17070".to_string()]
        );
        assert_eq!(details.uuid, "abc-123");
        assert!(details.ca_cert.starts_with("-----BEGIN CERTIFICATE-----"));
        assert!(registry.get("acme-ctrl").unwrap().other.contains_key("cloud"));
    }

    #[test]
    fn incomplete_entry() {
        let registry: ControllerRegistry = serde_yaml::from_str(CONTROLLERS_YAML).unwrap();
        let err = registry
            .get("half-done")
            .unwrap()
            .details("half-done")
            .unwrap_err();
        assert!(matches!(err, Error::IncompleteRegistryEntry { what, .. } if what == "api-endpoints"));
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let registry = ControllerRegistry::from_path(&dir.path().join("controllers.yaml")).unwrap();
        assert!(registry.controllers.is_empty());
    }
}
