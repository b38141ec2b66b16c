use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Starting,
    Playing,
    Stopping,
}

/// Snapshot served by `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub playing: bool,
    pub filename: String,
}

/// In-memory playback state shared by every request.
///
/// Fields are private: the only way to change them is through the transition
/// methods below, which keep "playing implies a filename" true. After a stop,
/// a failed launch or an unexpected exit the last started filename is kept so
/// `/status` can still report what was played.
#[derive(Debug, Clone, Default)]
pub struct PlayerState {
    phase: Phase,
    filename: String,
}

impl PlayerState {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// A process is believed alive while playing and until a stop completes.
    pub fn is_playing(&self) -> bool {
        matches!(self.phase(), Phase::Playing | Phase::Stopping)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn status(&self) -> Status {
        Status {
            playing: self.is_playing(),
            filename: self.filename.clone(),
        }
    }

    pub fn begin_start(&mut self) {
        self.phase = Phase::Starting;
    }

    pub fn started(&mut self, name: &str) {
        debug_assert!(!name.is_empty(), "playing requires a filename");
        self.filename = name.to_string();
        self.phase = Phase::Playing;
    }

    pub fn launch_failed(&mut self) {
        self.phase = Phase::Idle;
    }

    pub fn begin_stop(&mut self) {
        if self.phase == Phase::Playing {
            self.phase = Phase::Stopping;
        }
    }

    /// The process could not be terminated; it is still ours and still running.
    pub fn stop_failed(&mut self) {
        if self.phase == Phase::Stopping {
            self.phase = Phase::Playing;
        }
    }

    /// Explicit stop finished or the process went away on its own.
    pub fn stopped(&mut self) {
        self.phase = Phase::Idle;
    }
}
