// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! `ship query "SELECT ..." --provider aws`.

use anyhow::Result;
use clap::Args;
use ship_core::application::inventory::{InventoryClient, InventoryQuerier};
use ship_core::domain::provider::Provider;
use std::sync::Arc;

#[derive(Args)]
pub struct QueryArgs {
    /// SQL statement to run against the inventory engine
    pub sql: String,

    /// Cloud provider the query targets
    #[arg(long, default_value = "aws")]
    pub provider: Provider,
}

pub async fn run(args: QueryArgs) -> Result<()> {
    let orchestrator = super::build_orchestrator()?;
    let inventory = Arc::new(InventoryClient::new(orchestrator));
    let cancel = super::cancel_on_ctrl_c();

    let credentials = args.provider.credentials_from_env();
    let rows = inventory
        .rows(&args.sql, args.provider, &credentials, &cancel)
        .await?;

    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
