// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! Tool descriptor value objects.
//!
//! A [`ToolDescriptor`] is plain data: image, argv template, mounts, declared
//! variables. The orchestrator is one function parameterised by the record;
//! there is no per-tool code anywhere in Ship.

use serde::{Deserialize, Serialize};

/// Category a tool is filed under in the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    Terraform,
    Security,
    Cloud,
    Kubernetes,
    Meta,
}

impl ToolCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::Terraform => "terraform",
            ToolCategory::Security => "security",
            ToolCategory::Cloud => "cloud",
            ToolCategory::Kubernetes => "kubernetes",
            ToolCategory::Meta => "meta",
        }
    }
}

/// How the orchestrator post-processes captured stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Stdout decoded as UTF-8 with invalid sequences replaced.
    Text,
    /// Stdout returned byte-for-byte (diagrams, archives).
    Binary,
    /// Stdout validated as JSON; falls back to text with a warning.
    Json,
}

/// A declared input for a tool or an external MCP server.
///
/// Secret variables are suppressed in help output and diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub secret: bool,
    pub default: Option<String>,
}

impl Variable {
    pub fn required(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required: true,
            secret: false,
            default: None,
        }
    }

    pub fn optional(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required: false,
            secret: false,
            default: None,
        }
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    /// Value as it may appear in help output or logs.
    pub fn display_value(&self, value: &str) -> String {
        if self.secret {
            "********".to_string()
        } else {
            value.to_string()
        }
    }
}

/// A bind-mount declared by a descriptor.
///
/// `param` names the request field that supplies the host path (today only
/// `directory` and `output`); `container_path` is where it lands inside the
/// container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountSpec {
    pub param: String,
    pub container_path: String,
    pub read_only: bool,
}

impl MountSpec {
    pub fn workspace() -> Self {
        Self {
            param: "directory".to_string(),
            container_path: "/workspace".to_string(),
            read_only: true,
        }
    }

    pub fn output() -> Self {
        Self {
            param: "output".to_string(),
            container_path: "/output".to_string(),
            read_only: false,
        }
    }
}

/// A named flag a tool accepts, mirrored into MCP input schemas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagSpec {
    pub name: String,
    pub description: String,
    /// Allowed values, when the flag is an enum (e.g. output formats).
    pub allowed: Option<Vec<String>>,
}

impl FlagSpec {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            allowed: None,
        }
    }

    pub fn one_of(mut self, allowed: &[&str]) -> Self {
        self.allowed = Some(allowed.iter().map(|s| s.to_string()).collect());
        self
    }
}

/// Identity of one containerized tool.
///
/// Created once at process start from the static catalogue table and never
/// mutated. Entrypoint tokens may contain `{name}` placeholders resolved at
/// invocation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub category: ToolCategory,
    pub image: String,
    pub entrypoint: Vec<String>,
    pub mounts: Vec<MountSpec>,
    pub env_spec: Vec<Variable>,
    pub flags: Vec<FlagSpec>,
    pub output_mode: OutputMode,
    pub default_format: Option<String>,
    /// Per-tool deadline override, seconds. `None` uses the process default.
    pub timeout_secs: Option<u64>,
    pub description: String,
}

impl ToolDescriptor {
    pub fn find_variable(&self, name: &str) -> Option<&Variable> {
        self.env_spec.iter().find(|v| v.name == name)
    }

    pub fn find_flag(&self, name: &str) -> Option<&FlagSpec> {
        self.flags.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_variable_is_masked() {
        let var = Variable::required("BRAVE_API_KEY", "Brave Search API key").secret();
        assert_eq!(var.display_value("sk-123456"), "********");

        let open = Variable::optional("FORMAT", "output format");
        assert_eq!(open.display_value("json"), "json");
    }

    #[test]
    fn test_variable_builders() {
        let var = Variable::optional("FILESYSTEM_ROOT", "root directory").with_default("/tmp");
        assert!(!var.required);
        assert_eq!(var.default.as_deref(), Some("/tmp"));
    }

    #[test]
    fn test_flag_enum_constraint() {
        let flag = FlagSpec::new("format", "output format").one_of(&["json", "markdown"]);
        assert_eq!(
            flag.allowed.as_deref(),
            Some(&["json".to_string(), "markdown".to_string()][..])
        );
    }

    #[test]
    fn test_workspace_mount_is_read_only() {
        let mount = MountSpec::workspace();
        assert_eq!(mount.container_path, "/workspace");
        assert!(mount.read_only);

        let out = MountSpec::output();
        assert!(!out.read_only);
    }
}
