mod app;
mod config;
mod github;
mod network;
mod util;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::github::{GithubClient, collect_portfolio};
use crate::network::{LanguagePalette, LayoutMode, RepoNetwork};

const HEADLESS_DT: f32 = 1.0 / 60.0;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Account whose public repositories are shown.
    #[arg(long)]
    account: Option<String>,

    /// Base URL of the REST API.
    #[arg(long)]
    api_base: Option<String>,

    #[arg(long, value_enum, default_value_t = LayoutMode::Force)]
    layout: LayoutMode,

    /// Keep only this many repositories, most-starred first.
    #[arg(long)]
    max_nodes: Option<usize>,

    /// JSON settings file. Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Build the network without a window and print a JSON snapshot.
    #[arg(long)]
    headless: bool,

    /// Layout steps to run before the headless snapshot.
    #[arg(long, default_value_t = 300)]
    steps: usize,
}

impl Args {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        if let Some(account) = &self.account {
            settings.api.account = account.clone();
        }
        if let Some(api_base) = &self.api_base {
            settings.api.base_url = api_base.trim_end_matches('/').to_owned();
        }
        if let Some(max_nodes) = self.max_nodes {
            settings.network.max_nodes = max_nodes;
        }

        Ok(settings)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = args.settings()?;

    if args.headless {
        return run_headless(&settings, args.layout, args.steps);
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    let layout = args.layout;
    eframe::run_native(
        "repo-constellation",
        options,
        Box::new(move |cc| Ok(Box::new(app::ConstellationApp::new(cc, settings, layout)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}

fn run_headless(settings: &Settings, layout: LayoutMode, steps: usize) -> Result<()> {
    let client = GithubClient::from_settings(&settings.api);
    let portfolio = collect_portfolio(&client)?;

    let mut network = RepoNetwork::build(
        portfolio.repositories,
        &LanguagePalette::github_defaults(),
        &settings.network,
        layout,
        portfolio.fetched_at,
    );
    for _ in 0..steps {
        network.advance(&settings.force, HEADLESS_DT);
    }

    info!(
        nodes = network.nodes().len(),
        connections = network.connections().len(),
        steps,
        "headless layout finished"
    );

    let snapshot = serde_json::to_string_pretty(&network.snapshot())
        .context("failed to serialize network snapshot")?;
    println!("{snapshot}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "repo-constellation",
            "--account",
            "rust-lang",
            "--api-base",
            "http://localhost:8080/",
            "--max-nodes",
            "12",
            "--layout",
            "clusters",
        ]);
        let settings = args.settings().unwrap();

        assert_eq!(settings.api.account, "rust-lang");
        assert_eq!(settings.api.base_url, "http://localhost:8080");
        assert_eq!(settings.network.max_nodes, 12);
        assert_eq!(args.layout, LayoutMode::Clusters);
        assert!(!args.headless);
        assert_eq!(args.steps, 300);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let args = Args::parse_from([
            "repo-constellation",
            "--config",
            "/definitely/not/here/settings.json",
        ]);

        assert!(args.settings().is_err());
    }
}
