// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// A bind mount from host into the container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bind {
    pub host_path: PathBuf,
    pub container_path: String,
    pub read_only: bool,
}

impl Bind {
    pub fn to_docker_bind(&self) -> String {
        let mode = if self.read_only { "ro" } else { "rw" };
        format!(
            "{}:{}:{}",
            self.host_path.display(),
            self.container_path,
            mode
        )
    }
}

/// Everything the driver needs for one ephemeral container run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSpec {
    pub image: String,
    pub argv: Vec<String>,
    pub binds: Vec<Bind>,
    pub env: HashMap<String, String>,
    pub workdir: Option<String>,
    /// Network access is on by default (tools fetch plugin data); set false
    /// to run with `network_mode = none`.
    pub network: bool,
    pub timeout: Duration,
}

impl RunSpec {
    pub fn new(image: impl Into<String>, argv: Vec<String>) -> Self {
        Self {
            image: image.into(),
            argv,
            binds: Vec::new(),
            env: HashMap::new(),
            workdir: None,
            network: true,
            timeout: Duration::from_secs(600),
        }
    }
}

/// Captured outcome of a container run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i64,
    pub duration: Duration,
}

impl RunOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("container engine unavailable: {0}")]
    Unavailable(String),
    #[error("failed to pull image {image}: {reason}")]
    PullFailed { image: String, reason: String },
    #[error("failed to start container: {0}")]
    StartFailed(String),
    #[error("failed waiting for container: {0}")]
    WaitFailed(String),
    #[error("container run timed out after {0:?}")]
    Timeout(Duration),
    #[error("container run cancelled")]
    Cancelled,
}

/// The single operation the containerized runtime offers.
///
/// Implementations guarantee the container is torn down on every exit path,
/// including timeout and cancellation. The cancellation token is a
/// first-class argument, not hidden behind drop glue.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn run(&self, spec: RunSpec, cancel: CancellationToken) -> Result<RunOutput, RuntimeError>;

    /// Verify the container engine is reachable.
    async fn healthcheck(&self) -> Result<(), RuntimeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_formats_mode() {
        let ro = Bind {
            host_path: PathBuf::from("/home/user/infra"),
            container_path: "/workspace".to_string(),
            read_only: true,
        };
        assert_eq!(ro.to_docker_bind(), "/home/user/infra:/workspace:ro");

        let rw = Bind {
            host_path: PathBuf::from("/tmp/out"),
            container_path: "/output".to_string(),
            read_only: false,
        };
        assert_eq!(rw.to_docker_bind(), "/tmp/out:/output:rw");
    }

    #[test]
    fn test_run_spec_defaults() {
        let spec = RunSpec::new("ghcr.io/terraform-linters/tflint:latest", vec![]);
        assert!(spec.network);
        assert_eq!(spec.timeout, Duration::from_secs(600));
        assert!(spec.binds.is_empty());
    }
}
