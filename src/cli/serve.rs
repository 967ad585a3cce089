// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Args;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

use super::ConfigArgs;
use crate::api::{http_server, ImageService};
use crate::config::ServiceConfig;
use crate::version;
use crate::vision::provisioning::provision_models;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Address to listen on (e.g., 127.0.0.1:8080)
    #[arg(long, env = "LISTEN_ADDR")]
    pub listen_addr: Option<String>,

    /// Skip the startup model download
    #[arg(long, env = "NO_PROVISION")]
    pub no_provision: bool,
}

impl ServeArgs {
    pub fn service_config(&self) -> Result<ServiceConfig> {
        let mut config = self.config.load()?;
        if let Some(addr) = &self.listen_addr {
            config.listen_addr = addr.clone();
        }
        if self.no_provision {
            config.provision.enabled = false;
        }
        Ok(config)
    }
}

pub async fn serve(args: ServeArgs) -> Result<()> {
    let config = args.service_config()?;

    info!("Starting {}", version::get_version_string());
    info!("OCR models: {}", config.model_dir.display());

    if config.provision.enabled {
        let report = provision_models(&config.model_dir, &config.provision).await?;
        info!(
            "Model provisioning: {} present, {} downloaded, {} failed",
            report.present.len(),
            report.downloaded.len(),
            report.failed.len()
        );
        for (language, error) in &report.failed {
            warn!("OCR language '{}' unavailable: {}", language, error);
        }
    } else {
        info!("Model provisioning disabled");
    }

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("invalid listen address '{}'", config.listen_addr))?;

    let service = Arc::new(ImageService::from_config(config));
    info!("OCR backend: {}", service.ocr_pool().backend());

    tokio::select! {
        result = http_server::start_server(service, addr) => result,
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
            Ok(())
        }
    }
}
