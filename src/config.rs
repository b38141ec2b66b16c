use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::Parser;

// --- Configuration ----------------------------------------------------------
//
// Everything here is read once at startup and never changes afterwards.
// Every flag also has an environment fallback so the service can be driven
// from a systemd unit without editing its command line.

#[derive(Debug, Clone, Parser)]
#[command(name = "playbox-engine", version, about = "Remote control API for a local video player")]
pub struct Config {
    /// Data directory for videos.
    #[arg(long, env = "PLAYBOX_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Channel used for advertisement.
    #[arg(long, env = "PLAYBOX_CHANNEL", default_value = "80")]
    pub channel: String,

    /// Use the in-memory mock player instead of spawning a real one.
    #[arg(long, env = "PLAYBOX_MOCK")]
    pub mock: bool,

    #[arg(long, env = "PLAYBOX_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Player binary, looked up on PATH.
    #[arg(long, env = "PLAYBOX_PLAYER", default_value = "omxplayer")]
    pub player: String,

    /// Fixed arguments placed before the filename (repeat for each one).
    #[arg(long = "player-arg", allow_hyphen_values = true, default_values = ["-o", "hdmi"])]
    pub player_args: Vec<String>,

    /// Text written to the player's stdin to ask it to quit.
    #[arg(long, env = "PLAYBOX_QUIT_COMMAND", default_value = "q")]
    pub quit_command: String,

    /// How long each stop stage waits for the player to exit.
    #[arg(long, env = "PLAYBOX_STOP_TIMEOUT_MS", default_value_t = 3000)]
    pub stop_timeout_ms: u64,
}

impl Config {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    /// Fail early on a data directory we could never list or play from.
    pub fn validate(&self) -> anyhow::Result<()> {
        let meta = std::fs::metadata(&self.data_dir).map_err(|e| {
            anyhow::anyhow!("data dir {} is not accessible: {e}", self.data_dir.display())
        })?;
        if !meta.is_dir() {
            anyhow::bail!("data dir {} is not a directory", self.data_dir.display());
        }
        if self.stop_timeout_ms == 0 {
            anyhow::bail!("stop timeout must be greater than zero");
        }
        Ok(())
    }
}
