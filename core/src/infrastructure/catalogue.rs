// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! The module catalogue.
//!
//! A static registry of every containerized tool Ship can execute, one row
//! per tool. Descriptors are plain data; the orchestrator is the only code
//! that interprets them. The table is built once at process start and is
//! read-only afterwards, so lookups take no lock.
//!
//! Argv templates are written as arguments to the image's own entrypoint.
//! `{directory}` resolves to the `/workspace` bind, `{format}` to the
//! caller's format flag or the descriptor default, and any other `{name}`
//! placeholder to the flag of the same name.

use crate::domain::tool::{
    FlagSpec, MountSpec, OutputMode, ToolCategory, ToolDescriptor, Variable,
};
use std::collections::HashMap;

pub struct Catalogue {
    descriptors: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl Catalogue {
    /// Build the full built-in table.
    pub fn builtin() -> Self {
        Self::from_descriptors(builtin_descriptors())
    }

    /// Construct from an explicit descriptor list. Registering two
    /// descriptors with the same name is a programming error.
    pub fn from_descriptors(descriptors: Vec<ToolDescriptor>) -> Self {
        let mut index = HashMap::with_capacity(descriptors.len());
        for (i, descriptor) in descriptors.iter().enumerate() {
            if index.insert(descriptor.name.clone(), i).is_some() {
                panic!("duplicate tool descriptor: {}", descriptor.name);
            }
        }
        Self { descriptors, index }
    }

    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    pub fn list(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    pub fn by_category(&self, category: ToolCategory) -> Vec<&ToolDescriptor> {
        self.descriptors
            .iter()
            .filter(|d| d.category == category)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Shorthand for one catalogue row. Tools that reference `{directory}` get
/// the read-only workspace mount automatically.
fn row(
    name: &str,
    category: ToolCategory,
    image: &str,
    entrypoint: &[&str],
    description: &str,
) -> ToolDescriptor {
    let needs_workspace = entrypoint.iter().any(|t| t.contains("{directory}"));
    ToolDescriptor {
        name: name.to_string(),
        category,
        image: image.to_string(),
        entrypoint: entrypoint.iter().map(|s| s.to_string()).collect(),
        mounts: if needs_workspace {
            vec![MountSpec::workspace()]
        } else {
            Vec::new()
        },
        env_spec: Vec::new(),
        flags: Vec::new(),
        output_mode: OutputMode::Text,
        default_format: None,
        timeout_secs: None,
        description: description.to_string(),
    }
}

fn format_flag(allowed: &[&str]) -> FlagSpec {
    FlagSpec::new("format", "output format").one_of(allowed)
}

fn aws_credential_vars() -> Vec<Variable> {
    vec![
        Variable::optional("AWS_ACCESS_KEY_ID", "AWS access key id"),
        Variable::optional("AWS_SECRET_ACCESS_KEY", "AWS secret access key").secret(),
        Variable::optional("AWS_SESSION_TOKEN", "AWS session token").secret(),
        Variable::optional("AWS_REGION", "AWS region"),
        Variable::optional("AWS_PROFILE", "AWS shared-config profile"),
    ]
}

fn azure_credential_vars() -> Vec<Variable> {
    vec![
        Variable::optional("AZURE_TENANT_ID", "Azure tenant id"),
        Variable::optional("AZURE_CLIENT_ID", "Azure client id"),
        Variable::optional("AZURE_SUBSCRIPTION_ID", "Azure subscription id"),
        Variable::optional("AZURE_CLIENT_SECRET", "Azure client secret").secret(),
    ]
}

fn gcp_credential_vars() -> Vec<Variable> {
    vec![
        Variable::optional(
            "GOOGLE_APPLICATION_CREDENTIALS",
            "path to a GCP service-account key file",
        ),
        Variable::optional("GOOGLE_CLOUD_PROJECT", "GCP project id"),
    ]
}

fn builtin_descriptors() -> Vec<ToolDescriptor> {
    let mut tools = Vec::new();

    // ------------------------------------------------------------------
    // Terraform
    // ------------------------------------------------------------------

    let mut lint = row(
        "lint",
        ToolCategory::Terraform,
        "ghcr.io/terraform-linters/tflint:latest",
        &["--chdir", "{directory}", "--format", "{format}"],
        "Lint Terraform configuration with TFLint",
    );
    lint.flags.push(format_flag(&["default", "json", "compact", "sarif"]));
    lint.default_format = Some("default".to_string());
    lint.env_spec
        .push(Variable::optional("TFLINT_LOG", "TFLint log level"));
    tools.push(lint);

    let mut docs = row(
        "docs",
        ToolCategory::Terraform,
        "quay.io/terraform-docs/terraform-docs:latest",
        &["{format}", "{directory}"],
        "Generate module documentation with terraform-docs",
    );
    docs.flags.push(format_flag(&["markdown", "json", "asciidoc", "pretty"]));
    docs.default_format = Some("markdown".to_string());
    tools.push(docs);

    tools.push(row(
        "fmt",
        ToolCategory::Terraform,
        "hashicorp/terraform:latest",
        &["-chdir={directory}", "fmt", "-check", "-diff", "-recursive"],
        "Check Terraform formatting",
    ));

    tools.push(row(
        "validate",
        ToolCategory::Terraform,
        "hashicorp/terraform:latest",
        &["-chdir={directory}", "validate"],
        "Validate Terraform configuration syntax",
    ));

    tools.push(row(
        "init",
        ToolCategory::Terraform,
        "hashicorp/terraform:latest",
        &["-chdir={directory}", "init", "-backend=false"],
        "Initialize a Terraform working directory (no backend)",
    ));

    let mut graph = row(
        "graph",
        ToolCategory::Terraform,
        "hashicorp/terraform:latest",
        &["-chdir={directory}", "graph"],
        "Emit the Terraform dependency graph in DOT form",
    );
    graph.output_mode = OutputMode::Text;
    tools.push(graph);

    let mut diagram = row(
        "diagram",
        ToolCategory::Terraform,
        "cycloid/inframap:latest",
        &["generate", "--hcl", "{directory}"],
        "Generate an infrastructure diagram with InfraMap",
    );
    diagram.output_mode = OutputMode::Binary;
    tools.push(diagram);

    let mut cost = row(
        "cost",
        ToolCategory::Terraform,
        "infracost/infracost:latest",
        &["breakdown", "--path", "{directory}", "--format", "{format}"],
        "Estimate infrastructure cost with Infracost",
    );
    cost.flags.push(format_flag(&["table", "json", "html"]));
    cost.default_format = Some("table".to_string());
    cost.env_spec
        .push(Variable::required("INFRACOST_API_KEY", "Infracost API key").secret());
    tools.push(cost);

    let mut compliance = row(
        "compliance",
        ToolCategory::Terraform,
        "eerkunt/terraform-compliance:latest",
        &["--features", "{features}", "--planfile", "{planfile}"],
        "Run BDD compliance checks against a Terraform plan",
    );
    compliance.flags.push(FlagSpec::new("features", "feature directory inside the workspace"));
    compliance.flags.push(FlagSpec::new("planfile", "plan file inside the workspace"));
    compliance.mounts = vec![MountSpec::workspace()];
    tools.push(compliance);

    tools.push(row(
        "terramate",
        ToolCategory::Terraform,
        "ghcr.io/terramate-io/terramate:latest",
        &["list", "--chdir", "{directory}"],
        "List Terramate stacks",
    ));

    let mut tf_summarize = row(
        "plan-summary",
        ToolCategory::Terraform,
        "ghcr.io/dineshba/tf-summarize:latest",
        &["{planfile}"],
        "Summarize a Terraform plan JSON with tf-summarize",
    );
    tf_summarize
        .flags
        .push(FlagSpec::new("planfile", "plan JSON path inside the workspace"));
    tf_summarize.mounts = vec![MountSpec::workspace()];
    tools.push(tf_summarize);

    let mut tfupdate = row(
        "tfupdate",
        ToolCategory::Terraform,
        "minamijoyo/tfupdate:latest",
        &["terraform", "-r", "{directory}"],
        "Update version constraints across Terraform files",
    );
    // tfupdate rewrites files in place, so the workspace mount is writable.
    tfupdate.mounts = vec![MountSpec {
        param: "directory".to_string(),
        container_path: "/workspace".to_string(),
        read_only: false,
    }];
    tools.push(tfupdate);

    tools.push(row(
        "hclfmt",
        ToolCategory::Terraform,
        "alpine/terragrunt:latest",
        &["hclfmt", "--terragrunt-check", "--terragrunt-working-dir", "{directory}"],
        "Check Terragrunt HCL formatting",
    ));

    // ------------------------------------------------------------------
    // Security
    // ------------------------------------------------------------------

    let mut checkov = row(
        "checkov",
        ToolCategory::Security,
        "bridgecrew/checkov:latest",
        &["--directory", "{directory}", "--output", "{format}"],
        "Static analysis of IaC with Checkov",
    );
    checkov.flags.push(format_flag(&["cli", "json", "sarif", "junitxml"]));
    checkov.default_format = Some("cli".to_string());
    checkov.flags.push(FlagSpec::new("framework", "limit to one framework (terraform, kubernetes, ...)"));
    tools.push(checkov);

    let mut trivy = row(
        "trivy",
        ToolCategory::Security,
        "aquasec/trivy:latest",
        &["fs", "--scanners", "vuln,secret,misconfig", "{directory}"],
        "Scan the filesystem for vulnerabilities, secrets, and misconfigurations",
    );
    trivy.flags.push(format_flag(&["table", "json", "sarif"]));
    tools.push(trivy);

    let mut trivy_image = row(
        "trivy-image",
        ToolCategory::Security,
        "aquasec/trivy:latest",
        &["image", "{target}"],
        "Scan a container image for vulnerabilities",
    );
    trivy_image
        .flags
        .push(FlagSpec::new("target", "image reference to scan"));
    tools.push(trivy_image);

    let mut tfsec = row(
        "tfsec",
        ToolCategory::Security,
        "aquasec/tfsec:latest",
        &["{directory}", "--format", "{format}"],
        "Terraform static security scanner",
    );
    tfsec.flags.push(format_flag(&["default", "json", "sarif", "csv"]));
    tfsec.default_format = Some("default".to_string());
    tools.push(tfsec);

    let mut terrascan = row(
        "terrascan",
        ToolCategory::Security,
        "tenable/terrascan:latest",
        &["scan", "-d", "{directory}", "-o", "{format}"],
        "Policy-as-code scanning with Terrascan",
    );
    terrascan.flags.push(format_flag(&["human", "json", "yaml", "sarif"]));
    terrascan.default_format = Some("human".to_string());
    tools.push(terrascan);

    tools.push(row(
        "gitleaks",
        ToolCategory::Security,
        "zricethezav/gitleaks:latest",
        &["detect", "--source", "{directory}", "--no-banner"],
        "Detect hardcoded secrets with Gitleaks",
    ));

    tools.push(row(
        "semgrep",
        ToolCategory::Security,
        "semgrep/semgrep:latest",
        &["semgrep", "scan", "--config", "auto", "{directory}"],
        "Pattern-based static analysis with Semgrep",
    ));

    let mut grype = row(
        "grype",
        ToolCategory::Security,
        "anchore/grype:latest",
        &["dir:{directory}"],
        "Vulnerability scan with Grype",
    );
    grype.flags.push(FlagSpec::new("only-fixed", "report only vulnerabilities with fixes"));
    tools.push(grype);

    let mut syft = row(
        "syft",
        ToolCategory::Security,
        "anchore/syft:latest",
        &["dir:{directory}", "-o", "{format}"],
        "Generate a software bill of materials with Syft",
    );
    syft.flags.push(format_flag(&["syft-table", "syft-json", "spdx-json", "cyclonedx-json"]));
    syft.default_format = Some("syft-table".to_string());
    tools.push(syft);

    tools.push(row(
        "hadolint",
        ToolCategory::Security,
        "hadolint/hadolint:latest",
        &["hadolint", "{directory}/Dockerfile"],
        "Lint Dockerfiles with Hadolint",
    ));

    let mut dockle = row(
        "dockle",
        ToolCategory::Security,
        "goodwithtech/dockle:latest",
        &["{target}"],
        "Container image linter for security best practices",
    );
    dockle.flags.push(FlagSpec::new("target", "image reference to lint"));
    tools.push(dockle);

    let mut kics = row(
        "kics",
        ToolCategory::Security,
        "checkmarx/kics:latest",
        &["scan", "-p", "{directory}", "-o", "{output}"],
        "IaC scanning with KICS, results written to the output mount",
    );
    kics.mounts = vec![MountSpec::workspace(), MountSpec::output()];
    tools.push(kics);

    tools.push(row(
        "conftest",
        ToolCategory::Security,
        "openpolicyagent/conftest:latest",
        &["test", "{directory}"],
        "Test configuration against OPA policy",
    ));

    tools.push(row(
        "opa",
        ToolCategory::Security,
        "openpolicyagent/opa:latest",
        &["test", "{directory}"],
        "Run OPA policy unit tests",
    ));

    tools.push(row(
        "actionlint",
        ToolCategory::Security,
        "rhysd/actionlint:latest",
        &["-color", "{directory}/.github/workflows"],
        "Lint GitHub Actions workflows",
    ));

    tools.push(row(
        "trufflehog",
        ToolCategory::Security,
        "trufflesecurity/trufflehog:latest",
        &["filesystem", "{directory}", "--no-update"],
        "Find verified credentials with TruffleHog",
    ));

    let mut osv_scanner = row(
        "osv-scanner",
        ToolCategory::Security,
        "ghcr.io/google/osv-scanner:latest",
        &["-r", "{directory}"],
        "Scan dependencies against the OSV vulnerability database",
    );
    osv_scanner.flags.push(format_flag(&["table", "json", "sarif"]));
    tools.push(osv_scanner);

    let mut cosign = row(
        "cosign",
        ToolCategory::Security,
        "gcr.io/projectsigstore/cosign:latest",
        &["verify", "{target}"],
        "Verify container image signatures with Cosign",
    );
    cosign.flags.push(FlagSpec::new("target", "image reference to verify"));
    tools.push(cosign);

    let mut snyk = row(
        "snyk",
        ToolCategory::Security,
        "snyk/snyk:alpine",
        &["snyk", "test", "--all-projects"],
        "Dependency and IaC scanning with Snyk",
    );
    snyk.mounts = vec![MountSpec {
        param: "directory".to_string(),
        container_path: "/project".to_string(),
        read_only: true,
    }];
    snyk.env_spec
        .push(Variable::required("SNYK_TOKEN", "Snyk API token").secret());
    tools.push(snyk);

    tools.push(row(
        "regula",
        ToolCategory::Security,
        "fugue/regula:latest",
        &["run", "{directory}"],
        "Evaluate IaC against Regula's Rego rule library",
    ));

    // ------------------------------------------------------------------
    // Cloud
    // ------------------------------------------------------------------

    let mut steampipe = row(
        "steampipe",
        ToolCategory::Cloud,
        "turbot/steampipe:latest",
        &["query", "{query}", "--output", "{format}"],
        "Query cloud inventory as SQL with Steampipe",
    );
    steampipe.flags.push(FlagSpec::new("query", "SQL statement to execute"));
    steampipe.flags.push(format_flag(&["json", "csv", "table", "line"]));
    steampipe.default_format = Some("json".to_string());
    steampipe.output_mode = OutputMode::Json;
    steampipe.env_spec.extend(aws_credential_vars());
    steampipe.env_spec.extend(azure_credential_vars());
    steampipe.env_spec.extend(gcp_credential_vars());
    steampipe.timeout_secs = Some(300);
    tools.push(steampipe);

    let mut powerpipe = row(
        "powerpipe",
        ToolCategory::Cloud,
        "turbot/powerpipe:latest",
        &["benchmark", "run", "{benchmark}"],
        "Run compliance benchmarks with Powerpipe",
    );
    powerpipe.flags.push(FlagSpec::new("benchmark", "benchmark name to run"));
    powerpipe.env_spec.extend(aws_credential_vars());
    tools.push(powerpipe);

    let mut prowler = row(
        "prowler",
        ToolCategory::Cloud,
        "toniblyx/prowler:latest",
        &["aws"],
        "AWS security assessment with Prowler",
    );
    prowler.env_spec.extend(aws_credential_vars());
    prowler.timeout_secs = Some(1800);
    tools.push(prowler);

    let mut custodian = row(
        "custodian",
        ToolCategory::Cloud,
        "cloudcustodian/c7n:latest",
        &["run", "--output-dir", "{output}", "{directory}/policy.yml"],
        "Execute Cloud Custodian policies",
    );
    custodian.mounts = vec![MountSpec::workspace(), MountSpec::output()];
    custodian.env_spec.extend(aws_credential_vars());
    tools.push(custodian);

    let mut driftctl = row(
        "driftctl",
        ToolCategory::Cloud,
        "snyk/driftctl:latest",
        &["scan", "--from", "tfstate://{directory}/terraform.tfstate"],
        "Detect drift between state and live infrastructure",
    );
    driftctl.env_spec.extend(aws_credential_vars());
    tools.push(driftctl);

    let mut scout = row(
        "scout",
        ToolCategory::Cloud,
        "rossja/ncc-scoutsuite:latest",
        &["scout", "{cloud}"],
        "Multi-cloud audit with ScoutSuite",
    );
    scout
        .flags
        .push(FlagSpec::new("cloud", "cloud to audit").one_of(&["aws", "azure", "gcp"]));
    scout.env_spec.extend(aws_credential_vars());
    scout.env_spec.extend(azure_credential_vars());
    scout.env_spec.extend(gcp_credential_vars());
    tools.push(scout);

    let mut cfn_lint = row(
        "cfn-lint",
        ToolCategory::Cloud,
        "ghcr.io/aws-cloudformation/cfn-lint:latest",
        &["{template}"],
        "Lint CloudFormation templates",
    );
    cfn_lint
        .flags
        .push(FlagSpec::new("template", "template path inside the workspace"));
    cfn_lint.mounts = vec![MountSpec::workspace()];
    tools.push(cfn_lint);

    // ------------------------------------------------------------------
    // Kubernetes
    // ------------------------------------------------------------------

    tools.push(row(
        "kube-bench",
        ToolCategory::Kubernetes,
        "aquasec/kube-bench:latest",
        &["run"],
        "CIS Kubernetes benchmark with kube-bench",
    ));

    let mut kubescape = row(
        "kubescape",
        ToolCategory::Kubernetes,
        "quay.io/kubescape/kubescape:latest",
        &["scan", "{directory}"],
        "Scan Kubernetes manifests with Kubescape",
    );
    kubescape.flags.push(format_flag(&["pretty-printer", "json", "sarif"]));
    tools.push(kubescape);

    let mut kube_score = row(
        "kube-score",
        ToolCategory::Kubernetes,
        "zegl/kube-score:latest",
        &["score", "{manifest}"],
        "Static analysis of Kubernetes object definitions",
    );
    kube_score
        .flags
        .push(FlagSpec::new("manifest", "manifest path inside the workspace"));
    kube_score.mounts = vec![MountSpec::workspace()];
    tools.push(kube_score);

    tools.push(row(
        "kube-linter",
        ToolCategory::Kubernetes,
        "stackrox/kube-linter:latest",
        &["lint", "{directory}"],
        "Lint Kubernetes YAML with KubeLinter",
    ));

    let mut polaris = row(
        "polaris",
        ToolCategory::Kubernetes,
        "quay.io/fairwinds/polaris:latest",
        &["polaris", "audit", "--audit-path", "{directory}", "--format", "{format}"],
        "Audit Kubernetes workloads with Polaris",
    );
    polaris.flags.push(format_flag(&["pretty", "json", "yaml"]));
    polaris.default_format = Some("pretty".to_string());
    tools.push(polaris);

    let mut popeye = row(
        "popeye",
        ToolCategory::Kubernetes,
        "derailed/popeye:latest",
        &[],
        "Scan a live cluster for misconfigurations with Popeye",
    );
    popeye
        .env_spec
        .push(Variable::optional("KUBECONFIG", "path to a kubeconfig inside the workspace"));
    tools.push(popeye);

    tools.push(row(
        "kubeconform",
        ToolCategory::Kubernetes,
        "ghcr.io/yannh/kubeconform:latest",
        &["-summary", "{directory}"],
        "Validate Kubernetes manifests against their schemas",
    ));

    tools.push(row(
        "pluto",
        ToolCategory::Kubernetes,
        "us-docker.pkg.dev/fairwinds-ops/oss/pluto:latest",
        &["detect-files", "-d", "{directory}"],
        "Detect deprecated Kubernetes API versions",
    ));

    tools.push(row(
        "nova",
        ToolCategory::Kubernetes,
        "us-docker.pkg.dev/fairwinds-ops/oss/nova:latest",
        &["find", "--wide"],
        "Find outdated Helm releases",
    ));

    let mut kube_hunter = row(
        "kube-hunter",
        ToolCategory::Kubernetes,
        "aquasec/kube-hunter:latest",
        &["--remote", "{target}"],
        "Hunt for weaknesses in a Kubernetes cluster",
    );
    kube_hunter
        .flags
        .push(FlagSpec::new("target", "cluster address to probe"));
    tools.push(kube_hunter);

    tools.push(row(
        "datree",
        ToolCategory::Kubernetes,
        "datree/datree:latest",
        &["test", "{directory}"],
        "Policy checks for Kubernetes manifests with Datree",
    ));

    // ------------------------------------------------------------------
    // Meta
    // ------------------------------------------------------------------

    tools.push(row(
        "yamllint",
        ToolCategory::Meta,
        "cytopia/yamllint:latest",
        &["{directory}"],
        "Lint YAML files",
    ));

    let mut jq = row(
        "jq",
        ToolCategory::Meta,
        "ghcr.io/jqlang/jq:latest",
        &["{filter}", "{directory}/{file}"],
        "Transform JSON output with jq",
    );
    jq.flags.push(FlagSpec::new("filter", "jq filter expression"));
    jq.flags.push(FlagSpec::new("file", "input file inside the workspace"));
    tools.push(jq);

    let mut dive = row(
        "dive",
        ToolCategory::Meta,
        "wagoodman/dive:latest",
        &["{target}", "--ci"],
        "Analyze container image layer efficiency",
    );
    dive.flags.push(FlagSpec::new("target", "image reference to analyze"));
    tools.push(dive);

    let mut shellcheck = row(
        "shellcheck",
        ToolCategory::Meta,
        "koalaman/shellcheck:stable",
        &["{script}"],
        "Lint shell scripts with ShellCheck",
    );
    shellcheck
        .flags
        .push(FlagSpec::new("script", "script path inside the workspace"));
    shellcheck.mounts = vec![MountSpec::workspace()];
    tools.push(shellcheck);

    tools
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalogue_builds() {
        let catalogue = Catalogue::builtin();
        assert!(catalogue.len() >= 50);
    }

    #[test]
    fn test_lookup_known_tools() {
        let catalogue = Catalogue::builtin();
        for name in ["lint", "checkov", "trivy", "steampipe", "docs", "kube-bench"] {
            assert!(catalogue.lookup(name).is_some(), "missing tool: {name}");
        }
        assert!(catalogue.lookup("does-not-exist").is_none());
    }

    #[test]
    fn test_every_category_is_populated() {
        let catalogue = Catalogue::builtin();
        for category in [
            ToolCategory::Terraform,
            ToolCategory::Security,
            ToolCategory::Cloud,
            ToolCategory::Kubernetes,
            ToolCategory::Meta,
        ] {
            assert!(
                !catalogue.by_category(category).is_empty(),
                "empty category: {category:?}"
            );
        }
    }

    #[test]
    fn test_steampipe_declares_provider_credentials() {
        let catalogue = Catalogue::builtin();
        let steampipe = catalogue.lookup("steampipe").unwrap();
        let names: Vec<&str> = steampipe.env_spec.iter().map(|v| v.name.as_str()).collect();
        assert!(names.contains(&"AWS_ACCESS_KEY_ID"));
        assert!(names.contains(&"AZURE_TENANT_ID"));
        assert!(names.contains(&"GOOGLE_CLOUD_PROJECT"));
        assert_eq!(steampipe.output_mode, OutputMode::Json);
    }

    #[test]
    fn test_secret_variables_are_marked() {
        let catalogue = Catalogue::builtin();
        let cost = catalogue.lookup("cost").unwrap();
        let key = cost.find_variable("INFRACOST_API_KEY").unwrap();
        assert!(key.required);
        assert!(key.secret);
    }

    #[test]
    fn test_directory_tools_mount_workspace() {
        let catalogue = Catalogue::builtin();
        for descriptor in catalogue.list() {
            let uses_directory = descriptor
                .entrypoint
                .iter()
                .any(|t| t.contains("{directory}"));
            if uses_directory {
                assert!(
                    descriptor
                        .mounts
                        .iter()
                        .any(|m| m.container_path == "/workspace"),
                    "{} uses {{directory}} but has no workspace mount",
                    descriptor.name
                );
            }
        }
    }

    #[test]
    #[should_panic(expected = "duplicate tool descriptor")]
    fn test_duplicate_names_panic() {
        let a = row("dup", ToolCategory::Meta, "img:latest", &[], "first");
        let b = row("dup", ToolCategory::Meta, "img:latest", &[], "second");
        Catalogue::from_descriptors(vec![a, b]);
    }
}
