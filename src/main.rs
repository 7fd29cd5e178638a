use std::sync::Arc;

use clap::Parser;
use miette::{IntoDiagnostic, Result, WrapErr};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use tubefetch::{
    cli::Args, config::Settings, logging::init_logging, resolver::Ytdl, service::Downloader,
    web::AppState,
};

fn main() -> Result<()> {
    // Initialize the environment & CLI
    let args = Args::parse();
    let settings = Settings::load(&args)?;
    init_logging(settings.log_level.into(), settings.log_file.as_deref())?;
    debug!("{settings:?}");

    // Make sure the needed directories are created
    if let Some(temp_dir) = &settings.temp_dir {
        std::fs::create_dir_all(temp_dir)
            .into_diagnostic()
            .wrap_err("Could not create temporary directory")?;
    }

    // Executing an external program is not instantaneous,
    // so check for it once instead of on every request
    let ytdl = Ytdl::new(settings.program.as_deref()).map_err(miette::Report::from)?;

    let settings = Arc::new(settings);
    let state = AppState::new(Downloader::new(Arc::new(ytdl), settings.clone()));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()
        .wrap_err("Could not start the async runtime")?;

    runtime.block_on(async {
        let listener = TcpListener::bind(settings.listen)
            .await
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not listen on {}", settings.listen))?;

        tubefetch::web::serve(listener, state, shutdown_signal()).await
    })?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl-C, the server will only stop when killed: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
