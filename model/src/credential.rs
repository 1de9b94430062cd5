use serde::{Deserialize, Serialize};
use serde_plain::{derive_display_from_serialize, derive_fromstr_from_deserialize};
use std::collections::BTreeMap;

/// The Juju cloud that a credential authenticates against.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cloud {
    /// Google Cloud using a service account key (`jsonfile` auth).
    Google,
    /// The legacy `gce` cloud using an access key pair (`access-key` auth).
    Gce,
}

derive_display_from_serialize!(Cloud);
derive_fromstr_from_deserialize!(Cloud);

/// Where the credential submission flow is with a credential.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialState {
    Pending,
    Ready,
    Error,
}

impl Default for CredentialState {
    fn default() -> Self {
        Self::Pending
    }
}

derive_display_from_serialize!(CredentialState);
derive_fromstr_from_deserialize!(CredentialState);

/// Cloud credential material owned by a user. Credentials are identified by `owner` and `name`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub owner: String,
    pub name: String,
    pub cloud: Cloud,
    #[serde(default)]
    pub state: CredentialState,
    /// The provider specific secret fields, e.g. the fields of a service account key file.
    pub payload: BTreeMap<String, String>,
}

impl Credential {
    pub fn new<S1, S2>(owner: S1, name: S2, cloud: Cloud, payload: BTreeMap<String, String>) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            owner: owner.into(),
            name: name.into(),
            cloud,
            state: CredentialState::Ready,
            payload,
        }
    }
}

#[test]
fn cloud_names() {
    use std::str::FromStr;
    assert_eq!(Cloud::Google.to_string(), "google");
    assert_eq!(Cloud::from_str("gce").unwrap(), Cloud::Gce);
    assert!(Cloud::from_str("aws").is_err());
}
