//! # CLI Module
//!
//! The `action-router` binary.
//!
//! ### `serve`
//!
//! ```bash
//! action-router serve --config router.yaml --web-root ./public --addr 127.0.0.1:8080
//! ```
//!
//! Builds the router from the configuration file (optional; without it every
//! setting takes its default and static serving is off), registers the demo
//! `echo` handler and serves over HTTP with `--workers` threads. `--web-root`
//! falls back to `ROUTER_WEB_ROOT`. `--profile` selects the
//! `profiles.<name>` overlay, `local` by default.
//!
//! ### `check`
//!
//! ```bash
//! action-router check --config router.yaml
//! ```
//!
//! Builds the router without serving and prints the resolved web root, work
//! base, static pattern, actions and filters. Exits non-zero on any
//! configuration error.

mod commands;


pub use commands::{build_router, check, describe, run_cli, Cli, Commands};
