use crate::ModelKey;
use serde::{Deserialize, Serialize};
use serde_plain::{derive_display_from_serialize, derive_fromstr_from_deserialize};

/// The lifecycle of a controller as seen by users of the datastore.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerState {
    /// A bootstrap request has been accepted and is in progress.
    Creating,
    /// The controller exists and its connection details are known.
    Ready,
    /// Bootstrapping the controller failed.
    Error,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::Creating
    }
}

derive_display_from_serialize!(ControllerState);
derive_fromstr_from_deserialize!(ControllerState);

/// The connection details of a bootstrapped controller.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerDetails {
    /// API endpoints in the order Juju reports them, e.g. `35.190.1.2:17070`.
    pub endpoints: Vec<String>,
    pub uuid: String,
    pub ca_cert: String,
}

impl ControllerDetails {
    /// A controller can only be `ready` if every detail is present.
    pub fn is_complete(&self) -> bool {
        !self.endpoints.is_empty() && !self.uuid.is_empty() && !self.ca_cert.is_empty()
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerRecord {
    pub name: String,
    pub state: ControllerState,
    #[serde(default)]
    pub endpoints: Vec<String>,
    pub uuid: Option<String>,
    pub ca_cert: Option<String>,
    /// Keys of the models hosted by this controller.
    #[serde(default)]
    pub models: Vec<ModelKey>,
}

impl ControllerRecord {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Moves the record to `state`. Details are kept only when the state is `ready`, so a record
    /// is never `ready` with missing details and never carries stale details otherwise.
    pub(crate) fn transition(&mut self, state: ControllerState, details: Option<ControllerDetails>) {
        self.state = state;
        match (state, details) {
            (ControllerState::Ready, Some(details)) => {
                self.endpoints = details.endpoints;
                self.uuid = Some(details.uuid);
                self.ca_cert = Some(details.ca_cert);
            }
            _ => {
                self.endpoints.clear();
                self.uuid = None;
                self.ca_cert = None;
            }
        }
    }

    /// The first API endpoint, which is the one we connect to.
    pub fn primary_endpoint(&self) -> Option<&str> {
        self.endpoints.first().map(String::as_str)
    }

    pub fn is_ready(&self) -> bool {
        self.state == ControllerState::Ready
    }

    pub(crate) fn link_model(&mut self, key: ModelKey) {
        if !self.models.contains(&key) {
            self.models.push(key);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn details() -> ControllerDetails {
        ControllerDetails {
            endpoints: vec!["10.0.0.1:17070".into()],
            uuid: "abc-123".into(),
            ca_cert: "CERT".into(),
        }
    }

    #[test]
    fn error_clears_details() {
        let mut record = ControllerRecord::new("acme-ctrl");
        record.transition(ControllerState::Ready, Some(details()));
        assert!(record.is_ready());
        assert_eq!(record.primary_endpoint(), Some("10.0.0.1:17070"));

        record.transition(ControllerState::Error, Some(details()));
        assert_eq!(record.state, ControllerState::Error);
        assert!(record.endpoints.is_empty());
        assert!(record.uuid.is_none());
        assert!(record.ca_cert.is_none());
    }

    #[test]
    fn incomplete_details() {
        let mut d = details();
        assert!(d.is_complete());
        d.endpoints.clear();
        assert!(!d.is_complete());
    }
}
