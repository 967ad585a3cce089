// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod serve;
pub mod tools;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ServiceConfig;

/// Fabstir Image Node
#[derive(Parser, Debug)]
#[command(name = "fabstir-image-node")]
#[command(version)]
#[command(about = "Barcode and OCR image service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP service
    Serve(serve::ServeArgs),

    /// Download missing OCR language models and exit
    Provision(tools::ProvisionArgs),

    /// Run one request file through the service and print the response
    Process(tools::ProcessArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve(args) => serve::serve(args).await,
        Commands::Provision(args) => tools::provision(args).await,
        Commands::Process(args) => tools::process(args).await,
    }
}

/// Configuration sources shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// TOML config file
    #[arg(long, short = 'c', env = "IMAGE_NODE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding `<lang>.traineddata` models
    #[arg(long, env = "TESSDATA_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Language used when a command has no `Language` field
    #[arg(long, env = "OCR_DEFAULT_LANGUAGE")]
    pub default_language: Option<String>,

    /// Service name a request envelope must carry
    #[arg(long, env = "IMAGE_SERVICE_NAME")]
    pub service_name: Option<String>,
}

impl ConfigArgs {
    /// Defaults, then the config file, then flags and environment
    pub fn load(&self) -> Result<ServiceConfig> {
        let config = match &self.config {
            Some(path) => ServiceConfig::load(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => ServiceConfig::default(),
        };
        let config = self.apply(config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&self, mut config: ServiceConfig) -> ServiceConfig {
        if let Some(dir) = &self.model_dir {
            config.model_dir = dir.clone();
        }
        if let Some(language) = &self.default_language {
            config.default_language = language.clone();
        }
        if let Some(name) = &self.service_name {
            config.service_name = name.clone();
        }
        config
    }
}
