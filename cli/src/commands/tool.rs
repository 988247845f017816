// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! Direct tool passthrough: `ship lint ./infra --format json`.
//!
//! The wrapper exits non-zero only on orchestration failures; scanner
//! findings (the tool's own non-zero exit) count as success unless the user
//! opts into `--strict`, which propagates the child's exit code.

use anyhow::{bail, Result};
use ship_core::domain::invocation::InvocationRequest;
use std::path::PathBuf;

pub struct ParsedToolArgs {
    pub request: InvocationRequest,
    pub strict: bool,
}

/// Parse `<tool> [dir] [--flag value]... [--strict]` from the raw argv the
/// external-subcommand hook hands us.
pub fn parse_tool_args(argv: &[String]) -> Result<ParsedToolArgs> {
    let Some(tool) = argv.first() else {
        bail!("no tool name given");
    };

    let mut request = InvocationRequest::new(tool.clone());
    let mut strict = false;
    let mut output_dir: Option<PathBuf> = None;

    let mut iter = argv[1..].iter().peekable();
    while let Some(arg) = iter.next() {
        if let Some(name) = arg.strip_prefix("--") {
            match name {
                "strict" => strict = true,
                "output" => {
                    let Some(value) = iter.next() else {
                        bail!("--output requires a directory argument");
                    };
                    output_dir = Some(PathBuf::from(value));
                }
                _ => match name.split_once('=') {
                    Some((key, value)) => request.flags.push((key.to_string(), value.to_string())),
                    None => {
                        // `--flag value` when a value follows, boolean otherwise.
                        let value = match iter.peek() {
                            Some(next) if !next.starts_with("--") => {
                                iter.next().unwrap().clone()
                            }
                            _ => "true".to_string(),
                        };
                        request.flags.push((name.to_string(), value));
                    }
                },
            }
        } else if request.directory.is_none() {
            request.directory = Some(PathBuf::from(arg));
        } else {
            request.args.push(arg.clone());
        }
    }

    if request.directory.is_none() {
        request.directory = Some(PathBuf::from("."));
    }
    request.output_dir = output_dir;

    Ok(ParsedToolArgs { request, strict })
}

/// Run the tool in pipe mode. Returns the process exit code for `main`.
pub async fn run(argv: Vec<String>) -> Result<i32> {
    let parsed = parse_tool_args(&argv)?;
    let orchestrator = super::build_orchestrator()?;
    let cancel = super::cancel_on_ctrl_c();

    let exit_code = orchestrator.invoke_piped(parsed.request, cancel).await?;

    // Findings are data: only --strict turns the child's exit code into ours.
    if parsed.strict {
        Ok(exit_code as i32)
    } else {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_tool_with_directory_and_flags() {
        let parsed = parse_tool_args(&argv(&[
            "checkov",
            "./infra",
            "--format",
            "json",
            "--quiet",
        ]))
        .unwrap();

        assert_eq!(parsed.request.tool, "checkov");
        assert_eq!(
            parsed.request.directory.as_deref(),
            Some(std::path::Path::new("./infra"))
        );
        assert_eq!(
            parsed.request.flags,
            vec![
                ("format".to_string(), "json".to_string()),
                ("quiet".to_string(), "true".to_string()),
            ]
        );
        assert!(!parsed.strict);
    }

    #[test]
    fn test_parse_equals_style_flags() {
        let parsed = parse_tool_args(&argv(&["lint", "--format=json"])).unwrap();
        assert_eq!(
            parsed.request.flags,
            vec![("format".to_string(), "json".to_string())]
        );
        // Directory defaults to the current directory.
        assert_eq!(
            parsed.request.directory.as_deref(),
            Some(std::path::Path::new("."))
        );
    }

    #[test]
    fn test_strict_and_output_are_wrapper_flags() {
        let parsed =
            parse_tool_args(&argv(&["kics", ".", "--strict", "--output", "/tmp/results"])).unwrap();
        assert!(parsed.strict);
        assert_eq!(
            parsed.request.output_dir.as_deref(),
            Some(std::path::Path::new("/tmp/results"))
        );
        // Neither reaches the tool's flag list.
        assert!(parsed.request.flags.is_empty());
    }

    #[test]
    fn test_empty_argv_is_an_error() {
        assert!(parse_tool_args(&[]).is_err());
    }
}
