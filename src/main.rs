use action_router::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    let _logging = init_logging_with_config(&LogConfig::from_env())?;
    action_router::cli::run_cli()
}
