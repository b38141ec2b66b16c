// --- Player capability ------------------------------------------------------
//
// The HTTP layer only ever talks to `dyn Player`. Which backend sits behind it
// (a real player process or the in-memory mock) is decided once in `main` and
// never inspected again.

mod mock;
mod process;
mod state;

use async_trait::async_trait;
use thiserror::Error;

pub use mock::MockPlayer;
pub use process::{ProcessPlayer, ProcessPlayerConfig};
pub use state::{PlayerState, Status};

#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The player process could not be spawned (missing binary, permissions...).
    #[error("failed to launch player: {0}")]
    Launch(String),

    #[error("file not found: {0}")]
    NotFound(String),

    /// Empty names, absolute paths, `..` and symlinks leaving the data dir.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Still alive after the quit command, SIGTERM and a forced kill.
    #[error("player process did not terminate: {0}")]
    ProcessTermination(String),
}

#[async_trait]
pub trait Player: Send + Sync {
    /// Start playing `name`. Anything already playing is stopped first.
    async fn play_file(&self, name: &str) -> Result<(), PlaybackError>;

    /// Stop the current playback. Stopping an idle player is not an error.
    async fn stop_file(&self) -> Result<(), PlaybackError>;

    fn is_playing(&self) -> bool;

    /// Current or most recently played file, empty if nothing ever played.
    fn file_playing(&self) -> String;

    /// Both fields taken from a single read so they never disagree.
    fn status(&self) -> Status;
}
