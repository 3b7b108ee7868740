use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::{load_config_file, ConfigGroups, WebConfig, DEFAULT_PROFILE};
use crate::echo::discover_builtin;
use crate::router::WebRouter;
use crate::server::{HttpServer, DEFAULT_WORKERS};

/// Command-line interface for the action router
#[derive(Parser, Debug)]
#[command(name = "action-router")]
#[command(version, about = "Action-style web router", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve static assets and handlers over HTTP
    Serve {
        /// Configuration file (YAML, JSON or TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory static assets are served from
        #[arg(long, env = "ROUTER_WEB_ROOT")]
        web_root: Option<PathBuf>,

        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,

        /// Worker threads, one in-flight request each
        #[arg(long, default_value_t = DEFAULT_WORKERS)]
        workers: usize,

        /// Profile section overlaid on the base configuration
        #[arg(long, default_value = DEFAULT_PROFILE)]
        profile: String,
    },
    /// Validate a configuration file and print the resolved router setup
    Check {
        #[arg(short, long)]
        config: PathBuf,

        /// Web root to validate against (defaults to the current directory)
        #[arg(long, env = "ROUTER_WEB_ROOT")]
        web_root: Option<PathBuf>,

        #[arg(long, default_value = DEFAULT_PROFILE)]
        profile: String,
    },
}

pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            config,
            web_root,
            addr,
            workers,
            profile,
        } => serve(config.as_deref(), web_root, &addr, workers, &profile),
        Commands::Check {
            config,
            web_root,
            profile,
        } => {
            let web_root = web_root.unwrap_or_else(|| PathBuf::from("."));
            let report = check(&config, web_root, &profile)?;
            print!("{report}");
            Ok(())
        }
    }
}

fn load_groups(config: Option<&Path>, profile: &str) -> anyhow::Result<ConfigGroups> {
    match config {
        Some(path) => Ok(load_config_file(path, Some(profile))?),
        None => Ok(ConfigGroups::new()),
    }
}

/// Assemble a router with the built-in handlers from the given settings.
pub fn build_router(
    config: Option<&Path>,
    web_root: Option<PathBuf>,
    profile: &str,
) -> anyhow::Result<WebRouter> {
    let groups = load_groups(config, profile)?;
    let mut builder = WebRouter::builder()
        .config(WebConfig::from_groups(&groups))
        .discovery(discover_builtin);
    if let Some(web_root) = web_root {
        builder = builder.web_root(web_root);
    }
    Ok(builder.build()?)
}

fn serve(
    config: Option<&Path>,
    web_root: Option<PathBuf>,
    addr: &str,
    workers: usize,
    profile: &str,
) -> anyhow::Result<()> {
    let router = Arc::new(build_router(config, web_root, profile)?);
    let handle = HttpServer::new(router)
        .workers(workers)
        .start(addr)
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %handle.addr(), "Serving; press Ctrl-C to stop");
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("HTTP worker panicked"))
}

/// Validate `config` by building a router from it; returns a report.
pub fn check(config: &Path, web_root: PathBuf, profile: &str) -> anyhow::Result<String> {
    let router = build_router(Some(config), Some(web_root), profile)?;
    Ok(describe(&router))
}

/// Human-readable summary of a router's resolved setup.
#[must_use]
pub fn describe(router: &WebRouter) -> String {
    let mut lines = vec![
        format!("web root:  {}", router.web_root().display()),
        format!("work base: {}", router.work_base()),
        format!(
            "ignoreUrl: {}",
            router.ignore_url().unwrap_or("(static serving disabled)")
        ),
        format!("actions:   {}", router.registry().actions().join(", ")),
    ];
    if router.filters().is_empty() {
        lines.push("filters:   (none)".to_string());
    }
    lines.extend(router.filters().iter().enumerate().map(|(i, filter)| {
        format!(
            "filter {}:  {} [{}]",
            i + 1,
            filter.name(),
            filter.pattern().unwrap_or("all paths")
        )
    }));
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
