use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

// playbox engine
//
// Small remote-control service for a set-top box:
//   - list the videos in a data directory
//   - start / stop one external player process (omxplayer by default)
//   - report what is playing and which channel this box advertises
//
// `--mock` swaps the real player for an in-memory one so the API can be
// exercised on a machine without a video output.

mod api;
mod config;
mod player;

use crate::api::{build_router, AppState};
use crate::config::Config;
use crate::player::{MockPlayer, Player, ProcessPlayer, ProcessPlayerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::parse();
    config.validate()?;
    let config = Arc::new(config);

    let player: Arc<dyn Player> = if config.mock {
        info!("using mock player");
        Arc::new(MockPlayer::new())
    } else {
        info!("using {} {:?}", config.player, config.player_args);
        Arc::new(ProcessPlayer::new(ProcessPlayerConfig::from(config.as_ref())))
    };

    let app = build_router(AppState {
        config: config.clone(),
        player: player.clone(),
    });

    info!(
        "playbox engine {} starting on http://{} (data dir {}, channel {})",
        env!("CARGO_PKG_VERSION"),
        config.bind,
        config.data_dir.display(),
        config.channel
    );

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Do not leave a player running on the screen after we are gone.
    if player.is_playing() {
        info!("stopping playback before exit: {}", player.file_playing());
    }
    if let Err(e) = player.stop_file().await {
        warn!("failed to stop playback on shutdown: {e}");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let term = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("cannot install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let term = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = term => {},
    }

    warn!("Shutdown signal received.");
}
