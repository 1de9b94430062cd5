use crate::connector::Session;
use crate::credentials::CredentialMaterializer;
use crate::error::{Error, Result};
use jujusys_model::{Credential, Datastore};
use log::{info, warn};
use std::fmt::{Display, Formatter};

/// A credential that could not be registered with the new controller.
#[derive(Debug)]
pub struct CredentialSyncWarning {
    pub credential_name: String,
    pub cause: Error,
}

impl Display for CredentialSyncWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Unable to register credential '{}': {}",
            self.credential_name, self.cause
        )
    }
}

/// Register every credential of `owner`, except `exclude`, with the session's controller so that
/// models can later be created with them. One failing credential does not stop the others.
pub async fn sync_other_credentials<S, D>(
    session: &S,
    datastore: &D,
    materializer: &CredentialMaterializer,
    exclude: &str,
    owner: &str,
) -> Result<Vec<CredentialSyncWarning>>
where
    S: Session + ?Sized,
    D: Datastore + ?Sized,
{
    let credentials = datastore.get_credentials(owner).await?;
    let mut warnings = Vec::new();
    for credential in credentials.iter().filter(|c| c.name != exclude) {
        match register(session, materializer, credential).await {
            Ok(()) => info!(
                "Registered credential '{}' with controller '{}'",
                credential.name,
                session.controller()
            ),
            Err(cause) => {
                let warning = CredentialSyncWarning {
                    credential_name: credential.name.clone(),
                    cause,
                };
                warn!("{}", warning);
                warnings.push(warning);
            }
        }
    }
    Ok(warnings)
}

async fn register<S>(
    session: &S,
    materializer: &CredentialMaterializer,
    credential: &Credential,
) -> Result<()>
where
    S: Session + ?Sized,
{
    let manifest = materializer.materialize(credential)?;
    let result = session
        .add_credential(credential.cloud, &credential.name, manifest.path())
        .await;
    let path = manifest.path().to_path_buf();
    if let Err(e) = manifest.close() {
        warn!(
            "Unable to delete credential manifest '{}': {}",
            path.display(),
            e
        );
    }
    result
}
