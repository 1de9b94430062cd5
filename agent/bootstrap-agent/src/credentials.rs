/*!

Turns a stored [`Credential`] into the files that `juju add-credential` reads: the raw secret,
which is kept on disk because Juju keeps referring to it, and a manifest naming the credential,
which only lives as long as the [`CredentialManifest`] handle.

!*/

use crate::cloud;
use crate::config::BootstrapConfig;
use crate::error::{self, Result};
use jujusys_model::{Cloud, Credential};
use log::{debug, trace};
use serde::Serialize;
use snafu::{ensure, ResultExt};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// The shape of the file given to `juju add-credential -f`.
#[derive(Debug, Serialize)]
struct Manifest<'a> {
    credentials: BTreeMap<String, BTreeMap<&'a str, ManifestEntry<'a>>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "auth-type")]
enum ManifestEntry<'a> {
    #[serde(rename = "jsonfile")]
    JsonFile { file: &'a Path },
    #[serde(rename = "access-key", rename_all = "kebab-case")]
    AccessKey {
        access_key: &'a str,
        secret_key: &'a str,
    },
}

/// A credential manifest on disk. The file is deleted when this is closed or dropped.
#[derive(Debug)]
pub struct CredentialManifest {
    file: NamedTempFile,
    secret_path: PathBuf,
}

impl CredentialManifest {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// The raw secret file that the manifest refers to.
    pub fn secret_path(&self) -> &Path {
        &self.secret_path
    }

    /// Delete the manifest, reporting any failure to do so.
    pub fn close(self) -> std::io::Result<()> {
        self.file.close()
    }
}

#[derive(Clone, Debug)]
pub struct CredentialMaterializer {
    credential_dir: PathBuf,
    manifest_dir: PathBuf,
}

impl CredentialMaterializer {
    pub fn new<P1, P2>(credential_dir: P1, manifest_dir: P2) -> Self
    where
        P1: Into<PathBuf>,
        P2: Into<PathBuf>,
    {
        Self {
            credential_dir: credential_dir.into(),
            manifest_dir: manifest_dir.into(),
        }
    }

    pub fn from_config(config: &BootstrapConfig) -> Self {
        Self::new(&config.credential_dir, &config.manifest_dir)
    }

    /// Write the credential's secret and a manifest for it. Nothing is written unless the
    /// credential has exactly the fields its cloud requires.
    pub fn materialize(&self, credential: &Credential) -> Result<CredentialManifest> {
        check_name(&credential.name)?;
        check_shape(credential)?;

        fs::create_dir_all(&self.credential_dir).context(error::CredentialDirSnafu {
            path: &self.credential_dir,
        })?;
        let secret_path = self
            .credential_dir
            .join(format!("{}-{}.json", credential.cloud, credential.name));
        let secret = serde_json::to_vec(&credential.payload).context(
            error::CredentialJsonSnafu {
                name: &credential.name,
            },
        )?;
        fs::write(&secret_path, secret).context(error::CredentialWriteSnafu {
            path: &secret_path,
        })?;
        debug!(
            "Wrote secret for credential '{}' to '{}'",
            credential.name,
            secret_path.display()
        );

        let entry = match credential.cloud {
            Cloud::Google => ManifestEntry::JsonFile { file: &secret_path },
            Cloud::Gce => ManifestEntry::AccessKey {
                access_key: field(credential, "access_key"),
                secret_key: field(credential, "secret_key"),
            },
        };
        let mut entries = BTreeMap::new();
        entries.insert(credential.name.as_str(), entry);
        let mut credentials = BTreeMap::new();
        credentials.insert(credential.cloud.to_string(), entries);
        let yaml = serde_yaml::to_string(&Manifest { credentials }).context(
            error::CredentialYamlSnafu {
                name: &credential.name,
            },
        )?;

        fs::create_dir_all(&self.manifest_dir).context(error::CredentialDirSnafu {
            path: &self.manifest_dir,
        })?;
        let mut file = tempfile::Builder::new()
            .prefix("credentials-")
            .suffix(".yaml")
            .tempfile_in(&self.manifest_dir)
            .context(error::CredentialWriteSnafu {
                path: &self.manifest_dir,
            })?;
        file.write_all(yaml.as_bytes())
            .and_then(|_| file.flush())
            .context(error::CredentialWriteSnafu { path: file.path() })?;
        trace!(
            "Wrote manifest for credential '{}' to '{}'",
            credential.name,
            file.path().display()
        );

        Ok(CredentialManifest { file, secret_path })
    }
}

fn field<'a>(credential: &'a Credential, name: &str) -> &'a str {
    credential
        .payload
        .get(name)
        .map(String::as_str)
        .unwrap_or_default()
}

/// The name becomes part of a file name, so it cannot contain a path.
fn check_name(name: &str) -> Result<()> {
    ensure!(
        !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\']),
        error::InvalidCredentialNameSnafu { name }
    );
    Ok(())
}

fn check_shape(credential: &Credential) -> Result<()> {
    let required = cloud::required_fields(credential.cloud);
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !credential.payload.contains_key(**name))
        .map(|name| name.to_string())
        .collect();
    let unexpected: Vec<String> = credential
        .payload
        .keys()
        .filter(|key| !required.contains(&key.as_str()))
        .cloned()
        .collect();
    ensure!(
        missing.is_empty() && unexpected.is_empty(),
        error::InvalidCredentialShapeSnafu {
            name: &credential.name,
            cloud: credential.cloud,
            missing,
            unexpected,
        }
    );
    Ok(())
}
