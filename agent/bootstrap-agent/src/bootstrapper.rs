use crate::credentials::CredentialManifest;
use crate::error::Result;
use crate::juju::{BootstrapArgs, JujuCli};
use log::{info, warn};

/// Register the credential from `manifest` with the juju client and bootstrap a controller with
/// it. The manifest is deleted whether or not this succeeds.
pub async fn bootstrap_controller<J>(
    juju: &J,
    args: &BootstrapArgs,
    manifest: CredentialManifest,
) -> Result<()>
where
    J: JujuCli + ?Sized,
{
    let result = register_and_bootstrap(juju, args, &manifest).await;
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

async fn register_and_bootstrap<J>(
    juju: &J,
    args: &BootstrapArgs,
    manifest: &CredentialManifest,
) -> Result<()>
where
    J: JujuCli + ?Sized,
{
    info!(
        "Adding credential '{}' for cloud '{}'",
        args.credential, args.cloud
    );
    juju.add_credential(args.cloud, manifest.path()).await?;
    info!(
        "Bootstrapping controller '{}' in '{}' with agent version {}",
        args.controller,
        args.cloud_region(),
        args.agent_version
    );
    juju.bootstrap(args).await?;
    info!("Controller '{}' has been bootstrapped", args.controller);
    Ok(())
}

/// Give the controller's admin user the configured password so that we can log in later.
pub async fn set_admin_password<J>(
    juju: &J,
    controller: &str,
    user: &str,
    password: &str,
) -> Result<()>
where
    J: JujuCli + ?Sized,
{
    info!("Setting the password of '{}' on controller '{}'", user, controller);
    juju.change_user_password(controller, user, password).await
}
