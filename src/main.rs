use clap::Parser;

use redis_autoconfigure::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match cli::load_and_merge_config(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = cli::init_logger_from_settings(&settings) {
        eprintln!("Logger initialization error: {e}");
        std::process::exit(1);
    }

    tracing::debug!(
        version = redis_autoconfigure::pkg_version(),
        topology = %settings.redis.topology_type,
        "Starting redis-autoconfigure"
    );

    cli::execute_command(&cli, settings).await?;
    Ok(())
}
