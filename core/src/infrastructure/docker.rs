// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! Docker container runtime driver.
//!
//! One operation: run an image with an argv, binds, and environment, capture
//! stdout/stderr/exit code, and tear the container down on every exit path:
//! success, failure, timeout, and cancellation alike. Parallelism against
//! the engine socket is bounded by a process-wide semaphore.

use crate::domain::runtime::{ContainerRuntime, RunOutput, RunSpec, RuntimeError};
use async_trait::async_trait;
use bollard::container::LogOutput;
use bollard::models::ContainerCreateBody;
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, WaitContainerOptions,
};
use bollard::Docker;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default bound on containers running concurrently against one engine.
pub const DEFAULT_MAX_PARALLEL: usize = 4;

pub struct DockerRuntime {
    docker: Docker,
    permits: Arc<Semaphore>,
}

impl DockerRuntime {
    /// Connect to the container engine (custom socket path or auto-detect).
    pub fn new(socket_path: Option<String>, max_parallel: usize) -> Result<Self, RuntimeError> {
        let docker = if let Some(path) = socket_path {
            #[cfg(unix)]
            let result = Docker::connect_with_unix(&path, 120, bollard::API_DEFAULT_VERSION);

            #[cfg(windows)]
            let result = Docker::connect_with_named_pipe(&path, 120, bollard::API_DEFAULT_VERSION);

            result.map_err(|e| {
                RuntimeError::Unavailable(format!(
                    "Failed to connect to Docker at {}: {}\n\n\
                     Ensure Docker is running and the socket path is correct.",
                    path, e
                ))
            })?
        } else {
            Docker::connect_with_local_defaults().map_err(|e| {
                RuntimeError::Unavailable(format!(
                    "Failed to connect to Docker: {}\n\n\
                     Ship runs every tool inside a container, so a reachable\n\
                     Docker engine is its only host dependency.\n\n\
                     Common causes:\n\
                     - Docker daemon not running (check: docker ps)\n\
                     - Permission denied accessing the Docker socket\n\
                     - On Linux: current user not in the 'docker' group\n\n\
                     Try:\n\
                     - Start Docker: systemctl start docker (Linux) or Docker Desktop (Windows/Mac)\n\
                     - Check permissions: ls -la /var/run/docker.sock",
                    e
                ))
            })?
        };

        Ok(Self {
            docker,
            permits: Arc::new(Semaphore::new(max_parallel.max(1))),
        })
    }

    async fn ensure_image(&self, image: &str) -> Result<(), RuntimeError> {
        if self.docker.inspect_image(image).await.is_ok() {
            return Ok(());
        }

        info!("Pulling image: {}", image);
        let options = Some(CreateImageOptions {
            from_image: Some(image.to_string()),
            ..Default::default()
        });

        let mut stream = self.docker.create_image(options, None, None);
        while let Some(result) = stream.next().await {
            if let Err(e) = result {
                return Err(RuntimeError::PullFailed {
                    image: image.to_string(),
                    reason: format!(
                        "{}\n\n\
                         Common causes:\n\
                         - No internet connectivity to the registry\n\
                         - Image name is incorrect or doesn't exist\n\
                         - Registry authentication required\n\n\
                         Try manually: docker pull {}",
                        e, image
                    ),
                });
            }
        }
        info!("Successfully pulled image: {}", image);
        Ok(())
    }

    /// Force-remove the container, logging rather than failing: teardown is
    /// best-effort on paths that already carry an error.
    async fn teardown(&self, id: &str) {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        if let Err(e) = self.docker.remove_container(id, Some(options)).await {
            warn!(container = %id, error = %e, "failed to remove container");
        } else {
            debug!(container = %id, "container removed");
        }
    }

    async fn collect_logs(&self, id: &str) -> (Vec<u8>, Vec<u8>) {
        let options = LogsOptions {
            stdout: true,
            stderr: true,
            ..Default::default()
        };

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut stream = self.docker.logs(id, Some(options));
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(LogOutput::StdOut { message }) => stdout.extend_from_slice(&message),
                Ok(LogOutput::StdErr { message }) => stderr.extend_from_slice(&message),
                Ok(_) => {}
                Err(e) => {
                    warn!(container = %id, error = %e, "error reading container logs");
                    break;
                }
            }
        }
        (stdout, stderr)
    }

    async fn wait_for_exit(&self, id: &str) -> Result<i64, RuntimeError> {
        let mut wait = self
            .docker
            .wait_container(id, None::<WaitContainerOptions>);
        match wait.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // The wait endpoint reports non-zero exits as errors on some
            // engine versions; the inspect call below recovers the code.
            Some(Err(_)) | None => {
                let inspect = self
                    .docker
                    .inspect_container(id, None)
                    .await
                    .map_err(|e| RuntimeError::WaitFailed(e.to_string()))?;
                Ok(inspect
                    .state
                    .and_then(|s| s.exit_code)
                    .unwrap_or(-1))
            }
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn run(
        &self,
        spec: RunSpec,
        cancel: CancellationToken,
    ) -> Result<RunOutput, RuntimeError> {
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| RuntimeError::Cancelled)?;

        self.ensure_image(&spec.image).await?;

        let binds: Vec<String> = spec.binds.iter().map(|b| b.to_docker_bind()).collect();
        let env: Vec<String> = spec
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();

        let host_config = bollard::service::HostConfig {
            binds: (!binds.is_empty()).then_some(binds),
            network_mode: (!spec.network).then(|| "none".to_string()),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: Some(format!("ship-{}", uuid::Uuid::new_v4())),
            platform: String::new(),
        };

        let container_config = ContainerCreateBody {
            image: Some(spec.image.clone()),
            cmd: Some(spec.argv.clone()),
            env: Some(env),
            working_dir: spec.workdir.clone(),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            host_config: Some(host_config),
            ..Default::default()
        };

        let created = self
            .docker
            .create_container(Some(options), container_config)
            .await
            .map_err(|e| RuntimeError::StartFailed(e.to_string()))?;
        let id = created.id;

        let started_at = Instant::now();
        if let Err(e) = self
            .docker
            .start_container(&id, None::<StartContainerOptions>)
            .await
        {
            self.teardown(&id).await;
            return Err(RuntimeError::StartFailed(e.to_string()));
        }

        debug!(container = %id, image = %spec.image, "container started");

        let exit_code = tokio::select! {
            _ = cancel.cancelled() => {
                info!(container = %id, "run cancelled, tearing down container");
                self.teardown(&id).await;
                return Err(RuntimeError::Cancelled);
            }
            waited = tokio::time::timeout(spec.timeout, self.wait_for_exit(&id)) => {
                match waited {
                    Ok(Ok(code)) => code,
                    Ok(Err(e)) => {
                        self.teardown(&id).await;
                        return Err(e);
                    }
                    Err(_elapsed) => {
                        warn!(container = %id, timeout = ?spec.timeout, "container run timed out");
                        self.teardown(&id).await;
                        return Err(RuntimeError::Timeout(spec.timeout));
                    }
                }
            }
        };

        let (stdout, stderr) = self.collect_logs(&id).await;
        self.teardown(&id).await;

        Ok(RunOutput {
            stdout,
            stderr,
            exit_code,
            duration: started_at.elapsed(),
        })
    }

    async fn healthcheck(&self) -> Result<(), RuntimeError> {
        self.docker.ping().await.map_err(|e| {
            RuntimeError::Unavailable(format!(
                "Cannot connect to Docker daemon: {}\n\n\
                 Docker healthcheck failed. Ensure Docker is running:\n\
                 - On Windows: Start Docker Desktop\n\
                 - On Linux: sudo systemctl start docker\n\
                 - On macOS: Start Docker Desktop\n\n\
                 Verify with: docker ps",
                e
            ))
        })?;
        Ok(())
    }
}
