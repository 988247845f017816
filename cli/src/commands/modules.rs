// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! `ship modules list` / `ship modules info <name>`.

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;
use ship_core::application::variables;
use ship_core::domain::tool::ToolCategory;
use ship_core::infrastructure::catalogue::Catalogue;

#[derive(Subcommand)]
pub enum ModulesCommand {
    /// List every catalogued tool, grouped by category
    List,

    /// Show one tool's descriptor in full
    Info {
        /// Tool name
        name: String,
    },
}

pub fn run(command: ModulesCommand) -> Result<()> {
    let catalogue = Catalogue::builtin();

    match command {
        ModulesCommand::List => {
            for category in [
                ToolCategory::Terraform,
                ToolCategory::Security,
                ToolCategory::Cloud,
                ToolCategory::Kubernetes,
                ToolCategory::Meta,
            ] {
                let tools = catalogue.by_category(category);
                if tools.is_empty() {
                    continue;
                }
                println!("{}", category.as_str().bold().underline());
                for descriptor in tools {
                    println!("  {:<16} {}", descriptor.name.cyan(), descriptor.description);
                }
                println!();
            }
            println!("{} tools", catalogue.len());
            Ok(())
        }
        ModulesCommand::Info { name } => {
            let Some(descriptor) = catalogue.lookup(&name) else {
                bail!("unknown tool '{name}'; try `ship modules list`");
            };

            println!("{}", descriptor.name.bold());
            println!("  {}", descriptor.description);
            println!("  category: {}", descriptor.category.as_str());
            println!("  image:    {}", descriptor.image);
            println!("  argv:     {}", descriptor.entrypoint.join(" "));
            if let Some(format) = &descriptor.default_format {
                println!("  format:   {format} (default)");
            }
            if let Some(timeout) = descriptor.timeout_secs {
                println!("  timeout:  {timeout}s");
            }

            if !descriptor.flags.is_empty() {
                println!("\n{}", "flags".bold());
                for flag in &descriptor.flags {
                    match &flag.allowed {
                        Some(allowed) => println!(
                            "  --{:<14} {} [{}]",
                            flag.name,
                            flag.description,
                            allowed.join("|")
                        ),
                        None => println!("  --{:<14} {}", flag.name, flag.description),
                    }
                }
            }

            if !descriptor.env_spec.is_empty() {
                println!("\n{}", "variables".bold());
                for variable in &descriptor.env_spec {
                    println!("  {}", variables::describe(variable));
                }
            }
            Ok(())
        }
    }
}
