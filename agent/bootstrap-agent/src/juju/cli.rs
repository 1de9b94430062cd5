use super::{BootstrapArgs, ControllerRegistry, JujuCli, RemoteModel};
use crate::config::BootstrapConfig;
use crate::error::{self, Result};
use jujusys_model::constants::{JUJU_CONTROLLERS_FILE, JUJU_DATA_ENV};
use jujusys_model::Cloud;
use log::{debug, trace, warn};
use serde::Deserialize;
use snafu::{ensure, OptionExt, ResultExt};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Runs the `juju` binary. A command that outlives its timeout is left running; we only stop
/// waiting for it, since killing `juju bootstrap` part way through can strand cloud resources.
#[derive(Clone, Debug)]
pub struct DefaultJujuCli {
    binary: PathBuf,
    data_dir: PathBuf,
    command_timeout: Duration,
    bootstrap_timeout: Duration,
}

/// The output of `juju models --format yaml`. Juju has been seen to emit null entries.
#[derive(Debug, Default, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<Option<RemoteModel>>,
}

impl DefaultJujuCli {
    pub fn new<P1, P2>(
        binary: P1,
        data_dir: P2,
        command_timeout: Duration,
        bootstrap_timeout: Duration,
    ) -> Self
    where
        P1: Into<PathBuf>,
        P2: Into<PathBuf>,
    {
        Self {
            binary: binary.into(),
            data_dir: data_dir.into(),
            command_timeout,
            bootstrap_timeout,
        }
    }

    pub fn from_config(config: &BootstrapConfig) -> Self {
        Self::new(
            &config.juju_binary,
            &config.juju_data_dir,
            config.command_timeout(),
            config.bootstrap_timeout(),
        )
    }

    pub fn registry_path(&self) -> PathBuf {
        self.data_dir.join(JUJU_CONTROLLERS_FILE)
    }

    /// Run `juju` with `args`, writing `stdin` to it if given, and return its stdout.
    async fn run(&self, args: &[&str], stdin: Option<String>, timeout: Duration) -> Result<String> {
        let command = format!("juju {}", args.join(" "));
        debug!("Running '{}'", command);
        let mut child = Command::new(&self.binary)
            .args(args)
            .env(JUJU_DATA_ENV, &self.data_dir)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context(error::ExternalToolSpawnSnafu { command: &command })?;

        if let Some(input) = stdin {
            let mut pipe = child.stdin.take().context(error::ExternalToolSnafu {
                command: &command,
                exit_code: None,
                timed_out: false,
                stderr: "stdin was not available",
            })?;
            pipe.write_all(input.as_bytes())
                .await
                .context(error::ExternalToolIoSnafu { command: &command })?;
            // Close stdin so that juju sees the end of its input.
            drop(pipe);
        }

        // The output is collected on its own task, which keeps draining the child's pipes and
        // reaps it even after we stop waiting. Dropping the pipes would kill juju with SIGPIPE.
        let mut collector = tokio::spawn(child.wait_with_output());
        let output = match tokio::time::timeout(timeout, &mut collector).await {
            Ok(joined) => joined
                .context(error::ExternalToolTaskSnafu { command: &command })?
                .context(error::ExternalToolIoSnafu { command: &command })?,
            Err(_) => {
                warn!(
                    "'{}' is still running after {}s, no longer waiting for it",
                    command,
                    timeout.as_secs()
                );
                return error::ExternalToolSnafu {
                    command,
                    exit_code: None,
                    timed_out: true,
                    stderr: format!("no result after {}s", timeout.as_secs()),
                }
                .fail();
            }
        };
        trace!("'{}' exited with {}", command, output.status);
        ensure!(
            output.status.success(),
            error::ExternalToolSnafu {
                command: &command,
                exit_code: output.status.code(),
                timed_out: false,
                stderr: String::from_utf8_lossy(&output.stderr),
            }
        );
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str().context(error::NonUtf8PathSnafu { path })
}

#[async_trait::async_trait]
impl JujuCli for DefaultJujuCli {
    async fn add_credential(&self, cloud: Cloud, manifest: &Path) -> Result<()> {
        let cloud = cloud.to_string();
        self.run(
            &["add-credential", &cloud, "-f", path_str(manifest)?, "--replace"],
            None,
            self.command_timeout,
        )
        .await?;
        Ok(())
    }

    async fn bootstrap(&self, args: &BootstrapArgs) -> Result<()> {
        let agent_version = format!("--agent-version={}", args.agent_version);
        self.run(
            &[
                "bootstrap",
                &agent_version,
                &args.cloud_region(),
                &args.controller,
                "--credential",
                &args.credential,
            ],
            None,
            self.bootstrap_timeout,
        )
        .await?;
        Ok(())
    }

    async fn change_user_password(
        &self,
        controller: &str,
        user: &str,
        password: &str,
    ) -> Result<()> {
        // Juju asks for the new password and then for confirmation.
        self.run(
            &["change-user-password", user, "-c", controller],
            Some(format!("{}\n{}\n", password, password)),
            self.command_timeout,
        )
        .await?;
        Ok(())
    }

    async fn controller_registry(&self) -> Result<ControllerRegistry> {
        ControllerRegistry::from_path(&self.registry_path())
    }

    async fn login(&self, controller: &str, user: &str, password: &str) -> Result<()> {
        self.run(
            &["login", "-c", controller, "-u", user],
            Some(format!("{}\n", password)),
            self.command_timeout,
        )
        .await?;
        Ok(())
    }

    async fn list_models(&self, controller: &str) -> Result<Vec<RemoteModel>> {
        let stdout = self
            .run(
                &["models", "-c", controller, "--format", "yaml"],
                None,
                self.command_timeout,
            )
            .await?;
        parse_model_list(controller, &stdout)
    }

    async fn update_credential(
        &self,
        controller: &str,
        cloud: Cloud,
        credential: &str,
    ) -> Result<()> {
        let cloud = cloud.to_string();
        self.run(
            &["update-credential", &cloud, credential, "-c", controller],
            None,
            self.command_timeout,
        )
        .await?;
        Ok(())
    }
}

fn parse_model_list(controller: &str, stdout: &str) -> Result<Vec<RemoteModel>> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }
    let list: ModelList =
        serde_yaml::from_str(stdout).context(error::ModelListSnafu { controller })?;
    Ok(list
        .models
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}
