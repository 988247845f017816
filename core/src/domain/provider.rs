// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! Cloud provider tags.
//!
//! Providers are tags, not owning objects: the schema store keys schemas by
//! `(provider, table)` and nothing else holds per-provider state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    Azure,
    Gcp,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Azure => "azure",
            Provider::Gcp => "gcp",
        }
    }

    /// Conventional credential environment variables for this provider.
    /// These are the only keys forwarded into inventory-engine containers
    /// when the caller passes no explicit credentials.
    pub fn credential_env_vars(&self) -> &'static [&'static str] {
        match self {
            Provider::Aws => &[
                "AWS_ACCESS_KEY_ID",
                "AWS_SECRET_ACCESS_KEY",
                "AWS_SESSION_TOKEN",
                "AWS_REGION",
                "AWS_PROFILE",
            ],
            Provider::Azure => &[
                "AZURE_TENANT_ID",
                "AZURE_CLIENT_ID",
                "AZURE_SUBSCRIPTION_ID",
                "AZURE_CLIENT_SECRET",
            ],
            Provider::Gcp => &["GOOGLE_APPLICATION_CREDENTIALS", "GOOGLE_CLOUD_PROJECT"],
        }
    }

    /// The account-level inventory table, always offered to the model.
    pub fn account_table(&self) -> &'static str {
        match self {
            Provider::Aws => "aws_account",
            Provider::Azure => "azure_subscription",
            Provider::Gcp => "gcp_project",
        }
    }

    /// Curated tables the schema learner introspects for this provider.
    pub fn curated_tables(&self) -> &'static [&'static str] {
        match self {
            Provider::Aws => &[
                "aws_account",
                "aws_ec2_instance",
                "aws_s3_bucket",
                "aws_vpc",
                "aws_vpc_security_group",
                "aws_iam_user",
                "aws_iam_role",
                "aws_rds_db_instance",
                "aws_lambda_function",
                "aws_ebs_volume",
                "aws_cloudtrail_trail",
                "aws_kms_key",
            ],
            Provider::Azure => &[
                "azure_subscription",
                "azure_compute_virtual_machine",
                "azure_storage_account",
                "azure_network_security_group",
                "azure_key_vault",
            ],
            Provider::Gcp => &[
                "gcp_project",
                "gcp_compute_instance",
                "gcp_storage_bucket",
                "gcp_compute_firewall",
                "gcp_service_account",
            ],
        }
    }

    /// Gather this provider's credentials from the process environment.
    pub fn credentials_from_env(&self) -> std::collections::HashMap<String, String> {
        self.credential_env_vars()
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|v| (key.to_string(), v)))
            .collect()
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aws" => Ok(Provider::Aws),
            "azure" => Ok(Provider::Azure),
            "gcp" | "google" => Ok(Provider::Gcp),
            other => Err(format!(
                "unknown provider '{}' (expected aws, azure, or gcp)",
                other
            )),
        }
    }
}
