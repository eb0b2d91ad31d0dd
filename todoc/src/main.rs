use anyhow::Result;
use clap::Parser;

use todoc::{cli::Cli, App, AppError};
use todoc_session::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (log_path, _guard) = todoc::logging::init_logging()?;
    tracing::info!("todoc starting, logging to {}", log_path.display());

    let mut settings = match &cli.config {
        Some(path) => Settings::with_config_file(&path.to_string_lossy())?,
        None => Settings::new()?,
    };
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }

    let app = App::new(&settings)?;

    if let Err(e) = todoc::cli::handle_command(&app, cli.command).await {
        tracing::error!("Command failed: {:#}", e);
        if e
            .downcast_ref::<AppError>()
            .is_some_and(AppError::is_unauthorized)
        {
            eprintln!("Your session has expired. Please log in again.");
        }
        return Err(e);
    }

    Ok(())
}
