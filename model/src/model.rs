use serde::{Deserialize, Serialize};
use serde_plain::{derive_display_from_serialize, derive_fromstr_from_deserialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// The datastore key of a model, derived from the controller that hosts it and the model's name.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelKey(String);

impl ModelKey {
    pub fn new(controller: &str, model: &str) -> Self {
        Self(format!("{}/{}", controller, model))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ModelKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl AsRef<str> for ModelKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ModelState {
    #[serde(rename = "Model is being deployed")]
    Deploying,
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "error")]
    Error,
}

impl Default for ModelState {
    fn default() -> Self {
        Self::Deploying
    }
}

derive_display_from_serialize!(ModelState);
derive_fromstr_from_deserialize!(ModelState);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessRole {
    Read,
    Write,
    Admin,
}

derive_display_from_serialize!(AccessRole);
derive_fromstr_from_deserialize!(AccessRole);

/// A user's role on a model.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub model: ModelKey,
    pub user: String,
    pub role: AccessRole,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    pub key: ModelKey,
    pub name: String,
    /// The controller hosting this model, once the model has been linked to it.
    pub controller: Option<String>,
    pub state: ModelState,
    pub uuid: String,
    /// The name of the credential the model was created with.
    pub credential: Option<String>,
    #[serde(default)]
    pub access: BTreeMap<String, AccessRole>,
}

impl ModelRecord {
    pub fn new<S1, S2>(key: ModelKey, name: S1, state: ModelState, uuid: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            key,
            name: name.into(),
            state,
            uuid: uuid.into(),
            ..Self::default()
        }
    }

    pub fn role(&self, user: &str) -> Option<AccessRole> {
        self.access.get(user).copied()
    }

    pub fn grants(&self) -> Vec<AccessGrant> {
        self.access
            .iter()
            .map(|(user, role)| AccessGrant {
                model: self.key.clone(),
                user: user.clone(),
                role: *role,
            })
            .collect()
    }
}

#[test]
fn model_key_format() {
    assert_eq!(ModelKey::new("acme-ctrl", "m1").as_str(), "acme-ctrl/m1");
}

#[test]
fn model_state_names() {
    assert_eq!(ModelState::Deploying.to_string(), "Model is being deployed");
    assert_eq!(ModelState::Ready.to_string(), "ready");
}
