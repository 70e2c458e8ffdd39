//! Docker container access.

use bollard::Docker;
use bollard::container::LogOutput;
use bollard::exec::{CreateExecOptions, StartExecResults};
use futures_util::StreamExt;
use lnquery_core::{Error, Result};

/// What Docker reports about a node container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerState {
    /// Full container id.
    pub id: String,
    /// Whether the container is running.
    pub running: bool,
}

/// Runs commands inside node containers.
#[derive(Debug, Clone)]
pub struct ContainerManager {
    docker: Docker,
}

impl ContainerManager {
    /// Create a new container manager.
    pub fn new() -> Result<Self> {
        let docker =
            Docker::connect_with_local_defaults().map_err(|e| Error::Docker(e.to_string()))?;
        Ok(Self { docker })
    }

    /// Create a new container manager with a custom socket path.
    pub fn with_socket(socket_path: &str) -> Result<Self> {
        let docker = Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)
            .map_err(|e| Error::Docker(e.to_string()))?;
        Ok(Self { docker })
    }

    /// Connect using `socket_path` when given, local defaults otherwise.
    pub fn connect(socket_path: Option<&str>) -> Result<Self> {
        socket_path.map_or_else(Self::new, Self::with_socket)
    }

    /// Check if Docker is available.
    pub async fn ping(&self) -> Result<()> {
        self.docker
            .ping()
            .await
            .map_err(|e| Error::Docker(e.to_string()))?;
        Ok(())
    }

    /// Look up a container by name or id.
    pub async fn container_state(&self, name: &str) -> Result<ContainerState> {
        let info = self
            .docker
            .inspect_container(name, None)
            .await
            .map_err(|e| Error::Docker(format!("Failed to inspect container {name}: {e}")))?;

        let id = info
            .id
            .ok_or_else(|| Error::Docker(format!("Container {name} has no id")))?;
        let running = info
            .state
            .and_then(|state| state.running)
            .unwrap_or(false);

        Ok(ContainerState { id, running })
    }

    /// Execute a command in a running container and return its stdout.
    ///
    /// A non-zero exit code is reported as [`Error::Node`] carrying the
    /// command's stderr.
    pub async fn exec_command(&self, container_id: &str, cmd: Vec<&str>) -> Result<String> {
        let program = cmd.first().copied().unwrap_or_default().to_string();

        let exec = self
            .docker
            .create_exec(
                container_id,
                CreateExecOptions {
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    cmd: Some(cmd),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| Error::Docker(format!("Failed to create exec: {e}")))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        if let StartExecResults::Attached {
            output: mut stream, ..
        } = self
            .docker
            .start_exec(&exec.id, None)
            .await
            .map_err(|e| Error::Docker(format!("Failed to start exec: {e}")))?
        {
            while let Some(Ok(msg)) = stream.next().await {
                match msg {
                    LogOutput::StdOut { message } => stdout.extend_from_slice(&message),
                    LogOutput::StdErr { message } => stderr.extend_from_slice(&message),
                    _ => {}
                }
            }
        }

        let exit_code = self
            .docker
            .inspect_exec(&exec.id)
            .await
            .map_err(|e| Error::Docker(format!("Failed to inspect exec: {e}")))?
            .exit_code
            .unwrap_or(0);

        if exit_code != 0 {
            let stderr = String::from_utf8_lossy(&stderr);
            tracing::debug!("{program} exited with {exit_code}: {}", stderr.trim());
            return Err(Error::Node(format!(
                "{program} exited with code {exit_code}: {}",
                stderr.trim()
            )));
        }

        String::from_utf8(stdout)
            .map_err(|e| Error::Docker(format!("Failed to parse command output: {e}")))
    }
}
