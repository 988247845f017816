// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! `ship vars <tool> [--print] [--dev|--staging|--prod]`.
//!
//! Emits a variables YAML skeleton for a tool (or a known external MCP
//! server), merging with an existing file so hand-edited values survive.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use ship_core::domain::tool::Variable;
use ship_core::infrastructure::catalogue::Catalogue;
use ship_mcp::external_server;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Args)]
pub struct VarsArgs {
    /// Tool or external server name
    pub tool: String,

    /// Print to stdout instead of writing a file
    #[arg(long)]
    pub print: bool,

    /// Write the dev-environment file (variables.dev.yml)
    #[arg(long, conflicts_with_all = ["staging", "prod"])]
    pub dev: bool,

    /// Write the staging-environment file (variables.staging.yml)
    #[arg(long, conflicts_with_all = ["dev", "prod"])]
    pub staging: bool,

    /// Write the prod-environment file (variables.prod.yml)
    #[arg(long, conflicts_with_all = ["dev", "staging"])]
    pub prod: bool,
}

pub fn run(args: VarsArgs) -> Result<()> {
    let variables = declared_variables(&args.tool)?;
    if variables.is_empty() {
        println!("{} declares no variables", args.tool);
        return Ok(());
    }

    let path = target_path(&args);
    let mut merged: BTreeMap<String, String> = if path.exists() {
        let existing = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_yaml::from_str(&existing)
            .with_context(|| format!("parsing {}", path.display()))?
    } else {
        BTreeMap::new()
    };

    // Defaults fill gaps only; values already in the file win.
    for variable in &variables {
        merged
            .entry(variable.name.clone())
            .or_insert_with(|| variable.default.clone().unwrap_or_default());
    }

    let yaml = serde_yaml::to_string(&merged)?;

    if args.print {
        print!("{yaml}");
        for variable in &variables {
            if variable.required && merged.get(&variable.name).is_none_or(String::is_empty) {
                eprintln!(
                    "{} {} is required: {}",
                    "note:".yellow(),
                    variable.name,
                    variable.description
                );
            }
        }
        return Ok(());
    }

    std::fs::write(&path, yaml).with_context(|| format!("writing {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}

fn declared_variables(name: &str) -> Result<Vec<Variable>> {
    if let Some(descriptor) = Catalogue::builtin().lookup(name) {
        return Ok(descriptor.env_spec.clone());
    }
    if let Some(config) = external_server(name) {
        return Ok(config.variables);
    }
    bail!("unknown tool or external server '{name}'; try `ship modules list`");
}

fn target_path(args: &VarsArgs) -> PathBuf {
    let filename = if args.dev {
        "variables.dev.yml"
    } else if args.staging {
        "variables.staging.yml"
    } else if args.prod {
        "variables.prod.yml"
    } else {
        "variables.yml"
    };
    PathBuf::from(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_variables_for_tool_and_external() {
        let cost = declared_variables("cost").unwrap();
        assert!(cost.iter().any(|v| v.name == "INFRACOST_API_KEY"));

        let brave = declared_variables("brave-search").unwrap();
        assert!(brave.iter().any(|v| v.name == "BRAVE_API_KEY"));

        assert!(declared_variables("nope").is_err());
    }

    #[test]
    fn test_target_path_per_environment() {
        let base = VarsArgs {
            tool: "cost".to_string(),
            print: false,
            dev: false,
            staging: false,
            prod: false,
        };
        assert_eq!(target_path(&base), PathBuf::from("variables.yml"));

        let dev = VarsArgs { dev: true, ..base };
        assert_eq!(target_path(&dev), PathBuf::from("variables.dev.yml"));
    }
}
