// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use super::ConfigArgs;
use crate::api::{ImageService, ServiceRequest};
use crate::vision::provisioning::provision_models;

/// Arguments for the provision command
#[derive(Args, Debug)]
pub struct ProvisionArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Comma-separated languages to fetch instead of the configured list
    #[arg(long, value_delimiter = ',')]
    pub languages: Vec<String>,

    /// Base URL to download `<lang>.traineddata` from
    #[arg(long, env = "TESSDATA_BASE_URL")]
    pub base_url: Option<String>,
}

/// Arguments for the process command
#[derive(Args, Debug)]
pub struct ProcessArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Request JSON file, or `-` for stdin
    pub input: PathBuf,

    /// Write the response here instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Pretty-print the response
    #[arg(long)]
    pub pretty: bool,
}

pub async fn provision(args: ProvisionArgs) -> Result<()> {
    let config = args.config.load()?;
    let mut provision = config.provision.clone();
    if !args.languages.is_empty() {
        provision.languages = args.languages.clone();
    }
    if let Some(url) = &args.base_url {
        provision.base_url = url.clone();
    }

    let report = provision_models(&config.model_dir, &provision).await?;
    for language in &report.present {
        info!("{}: already present", language);
    }
    for language in &report.downloaded {
        info!("{}: downloaded", language);
    }
    for (language, error) in &report.failed {
        warn!("{}: {}", language, error);
    }

    if report.is_complete() {
        Ok(())
    } else {
        Err(anyhow!(
            "{} of {} languages could not be provisioned",
            report.failed.len(),
            provision.languages.len()
        ))
    }
}

pub async fn process(args: ProcessArgs) -> Result<()> {
    let config = args.config.load()?;

    let body = if args.input.as_os_str() == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(&args.input)
            .await
            .with_context(|| format!("reading {}", args.input.display()))?
    };
    let request: ServiceRequest =
        serde_json::from_str(&body).context("request is not a valid service envelope")?;

    let service = Arc::new(ImageService::from_config(config));
    let response = tokio::task::spawn_blocking(move || service.handle(&request)).await?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };

    match &args.output {
        Some(path) => tokio::fs::write(path, json)
            .await
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", json),
    }

    Ok(())
}
