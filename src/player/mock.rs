use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use super::{PlaybackError, Player, PlayerState, Status};

/// In-memory player for running the API without a real video output.
#[derive(Default)]
pub struct MockPlayer {
    state: RwLock<PlayerState>,
    launch_failure: Mutex<Option<String>>,
    launches: AtomicUsize,
}

impl MockPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `play_file` fail as if the player binary could not start.
    #[cfg(test)]
    pub fn fail_next_launch(&self, reason: impl Into<String>) {
        *self.launch_failure.lock() = Some(reason.into());
    }

    /// Number of successful `play_file` calls so far.
    #[cfg(test)]
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Player for MockPlayer {
    async fn play_file(&self, name: &str) -> Result<(), PlaybackError> {
        if name.is_empty() {
            return Err(PlaybackError::InvalidPath("empty filename".into()));
        }

        let mut st = self.state.write();
        st.begin_stop();
        st.stopped();
        st.begin_start();
        if let Some(reason) = self.launch_failure.lock().take() {
            st.launch_failed();
            return Err(PlaybackError::Launch(reason));
        }
        st.started(name);
        self.launches.fetch_add(1, Ordering::SeqCst);
        tracing::info!("mock playback start: {name}");
        Ok(())
    }

    async fn stop_file(&self) -> Result<(), PlaybackError> {
        let mut st = self.state.write();
        if st.is_playing() {
            tracing::info!("mock playback stop: {}", st.filename());
        }
        st.begin_stop();
        st.stopped();
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.state.read().is_playing()
    }

    fn file_playing(&self) -> String {
        self.state.read().filename().to_string()
    }

    fn status(&self) -> Status {
        self.state.read().status()
    }
}
