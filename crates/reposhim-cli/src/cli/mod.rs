//! CLI for running repository shims and inspecting what they would serve.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use reposhim_core::config;
use reposhim_core::UpstreamKind;
use std::path::PathBuf;

use commands::{run_descriptor, run_link, run_listing, run_serve, DescriptorArgs};

/// Top-level CLI for reposhim.
#[derive(Debug, Parser)]
#[command(name = "reposhim")]
#[command(about = "Local Ivy repository shims for plugin listings and binary CDNs", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/reposhim/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Start shims for the configured upstreams (plus any given here) until Ctrl-C.
    Serve {
        /// Extra upstream URL; may be repeated.
        #[arg(long = "upstream", value_name = "URL")]
        upstreams: Vec<String>,
        /// Kind of the upstreams given with --upstream.
        #[arg(long, default_value = "listing")]
        kind: UpstreamKind,
        /// Override the configured base port.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the descriptor the static product table yields for an identity.
    Descriptor {
        group: String,
        artifact: String,
        version: String,
        /// Target operating system (linux, windows, macos); defaults to this machine.
        #[arg(long)]
        os: Option<String>,
        /// Target architecture (x86_64, aarch64); defaults to this machine.
        #[arg(long)]
        arch: Option<String>,
        /// Print the CDN download candidates under this base URL instead.
        #[arg(long, value_name = "URL")]
        candidates: Option<String>,
    },

    /// Fetch a plugin listing and print its entries as JSON.
    Listing {
        url: String,
    },

    /// Resolve a plugin's download link through a listing, following one redirect.
    Link {
        /// Listing URL.
        url: String,
        /// Plugin id.
        id: String,
        version: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = match &cli.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Serve {
                upstreams,
                kind,
                port,
            } => run_serve(&cfg, &upstreams, kind, port).await?,
            CliCommand::Descriptor {
                group,
                artifact,
                version,
                os,
                arch,
                candidates,
            } => run_descriptor(
                &cfg,
                DescriptorArgs {
                    group,
                    artifact,
                    version,
                    os,
                    arch,
                    candidates,
                },
            )?,
            CliCommand::Listing { url } => run_listing(&cfg, &url).await?,
            CliCommand::Link { url, id, version } => run_link(&cfg, &url, &id, &version).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
