// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! Response chunking.
//!
//! MCP clients sit behind model context windows; a raw 200k-character
//! scanner report is worse than useless. Past the ceiling (~20k tokens at 4
//! chars/token) the response is replaced by a summary frame: original size,
//! chunk count, a content-family summary of the first chunk, and a
//! quarter-ceiling preview. This is lossy by design.

use once_cell::sync::Lazy;
use regex::Regex;

/// Character ceiling for one MCP text response.
pub const RESPONSE_CHAR_CEILING: usize = 80_000;

static SECURITY_FAMILY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(passed checks|failed checks|\bCKV\w*\b|severity|vulnerabilit|misconfigur)")
        .unwrap()
});
static TERRAFORM_FAMILY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)(resource\s+"|terraform|\bmodule\s+"|\bprovider\s+")"#).unwrap());
static COST_FAMILY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(monthly cost|\bUSD\b|\$\d|cost estimate)").unwrap());
static ERROR_FAMILY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\berror\b|\bpanic\b|traceback|fatal)").unwrap());

/// Apply the ceiling. Text at or under the ceiling passes through
/// unchanged; anything longer becomes the summary frame.
pub fn apply_ceiling(text: &str) -> String {
    if text.chars().count() <= RESPONSE_CHAR_CEILING {
        return text.to_string();
    }

    let chunks = split_at_newlines(text, RESPONSE_CHAR_CEILING);
    let first = chunks.first().map(String::as_str).unwrap_or("");
    let summary = summarize(first);

    let preview_len = RESPONSE_CHAR_CEILING / 4;
    let preview: String = first.chars().take(preview_len).collect();

    format!(
        "Output is large ({} characters). The full output was split into chunks; \
         narrow the request to retrieve specific sections.\n\
         TOTAL CHUNKS: {}\n\
         Summary of chunk 1: {}\n\n\
         --- Preview of chunk 1 (first {} characters) ---\n{}",
        text.chars().count(),
        chunks.len(),
        summary,
        preview.chars().count(),
        preview
    )
}

/// Split into chunks of at most `ceiling` characters, preferring newline
/// boundaries. A single line longer than the ceiling is split mid-line.
pub fn split_at_newlines(text: &str, ceiling: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();

        if line_len > ceiling {
            // Pathological single line: flush and hard-split it.
            if current_len > 0 {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let mut buf = String::new();
            let mut buf_len = 0usize;
            for ch in line.chars() {
                buf.push(ch);
                buf_len += 1;
                if buf_len == ceiling {
                    chunks.push(std::mem::take(&mut buf));
                    buf_len = 0;
                }
            }
            if buf_len > 0 {
                current = buf;
                current_len = buf_len;
            }
            continue;
        }

        if current_len + line_len > ceiling && current_len > 0 {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if current_len > 0 {
        chunks.push(current);
    }
    chunks
}

/// One-line description of what kind of content a chunk holds.
fn summarize(chunk: &str) -> String {
    if SECURITY_FAMILY.is_match(chunk) {
        "security findings".to_string()
    } else if TERRAFORM_FAMILY.is_match(chunk) {
        "Terraform configuration output".to_string()
    } else if COST_FAMILY.is_match(chunk) {
        "cost analysis output".to_string()
    } else if ERROR_FAMILY.is_match(chunk) {
        "errors and diagnostics".to_string()
    } else {
        let first_line: String = chunk.lines().next().unwrap_or("").chars().take(80).collect();
        format!("begins with: {}", first_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_ceiling_not_chunked() {
        let text = "x".repeat(RESPONSE_CHAR_CEILING);
        assert_eq!(apply_ceiling(&text), text);
    }

    #[test]
    fn test_over_ceiling_is_chunked() {
        let text = "x".repeat(RESPONSE_CHAR_CEILING + 1);
        let framed = apply_ceiling(&text);
        assert!(framed.starts_with("Output is large"));
        assert!(framed.contains("TOTAL CHUNKS: 2"));
        assert!(framed.chars().count() <= RESPONSE_CHAR_CEILING);
    }

    #[test]
    fn test_large_checkov_style_output() {
        // ~200k characters of findings: at least 3 chunks, 20k preview.
        let line = "Check: CKV_AWS_20: S3 Bucket has an ACL defined which allows public READ access. FAILED\n";
        let text = line.repeat(200_000 / line.len() + 1);
        let framed = apply_ceiling(&text);

        assert!(framed.starts_with("Output is large"));
        let chunks_line = framed
            .lines()
            .find(|l| l.starts_with("TOTAL CHUNKS:"))
            .unwrap();
        let count: usize = chunks_line
            .trim_start_matches("TOTAL CHUNKS:")
            .trim()
            .parse()
            .unwrap();
        assert!(count >= 3);
        assert!(framed.contains("security findings"));

        // The preview tail is a quarter of the ceiling.
        let preview_start = framed.find("--- Preview").unwrap();
        let preview = &framed[preview_start..];
        let preview_body = preview.splitn(2, '\n').nth(1).unwrap();
        assert!(preview_body.chars().count() >= RESPONSE_CHAR_CEILING / 4 - 100);
    }

    #[test]
    fn test_chunks_split_on_newlines() {
        let line = "a".repeat(999) + "\n";
        let text = line.repeat(300);
        let chunks = split_at_newlines(&text, 10_000);
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.ends_with('\n'));
            assert!(chunk.chars().count() <= 10_000);
        }
        let total: usize = chunks.iter().map(|c| c.chars().count()).sum();
        assert_eq!(total, text.chars().count());
    }

    #[test]
    fn test_single_monster_line_is_hard_split() {
        let text = "z".repeat(25_000);
        let chunks = split_at_newlines(&text, 10_000);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 10_000);
        assert_eq!(chunks[2].chars().count(), 5_000);
    }

    #[test]
    fn test_family_summaries() {
        assert_eq!(summarize("Passed checks: 10, Failed checks: 2"), "security findings");
        assert_eq!(
            summarize("resource \"aws_s3_bucket\" \"logs\" {"),
            "Terraform configuration output"
        );
        assert_eq!(summarize("Total monthly cost: $420.00 USD"), "cost analysis output");
        assert_eq!(summarize("Error: failed to open state"), "errors and diagnostics");
        assert!(summarize("hello world\nrest").starts_with("begins with: hello world"));
    }
}
