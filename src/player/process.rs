use std::{
    path::{Component, Path, PathBuf},
    process::{ExitStatus, Stdio},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

use super::{PlaybackError, Player, PlayerState, Status};
use crate::config::Config;

// --- Process-backed player ---------------------------------------------------
//
// Exactly one external player process is owned at a time.
//
// Locking:
//   - `slot` (tokio Mutex) serializes play/stop and owns the handle of the
//     running process. It is held across the whole stop routine, so two
//     requests can never spawn two players or stop one half-way.
//   - `state` (parking_lot RwLock) is the snapshot read by `/status`. It is
//     only written while `slot` is held and is never held across an await,
//     so status queries do not wait on process I/O.
//
// Exit watcher:
//   Each spawned process gets a watcher task that owns the `Child`. When the
//   process exits it first reports on the `exited` oneshot (a stopper may be
//   waiting for it while holding `slot`), then takes `slot` and, if that
//   process is still the current one, moves the state back to idle.
//   Signals are only ever sent by the watcher, which knows whether the child
//   has been reaped. On Unix the player runs in its own process group and
//   signals go to the whole group, so helpers forked by wrapper scripts
//   (omxplayer is one) go down with it.

#[derive(Debug, Clone)]
pub struct ProcessPlayerConfig {
    pub binary: String,
    pub args: Vec<String>,
    pub data_dir: PathBuf,
    pub quit_command: String,
    pub stop_timeout: Duration,
}

impl From<&Config> for ProcessPlayerConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            binary: cfg.player.clone(),
            args: cfg.player_args.clone(),
            data_dir: cfg.data_dir.clone(),
            quit_command: cfg.quit_command.clone(),
            stop_timeout: cfg.stop_timeout(),
        }
    }
}

type ExitReport = std::io::Result<ExitStatus>;

/// Escalation steps requested from the watcher by a stopper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopSignal {
    Terminate,
    Kill,
}

struct RunningProcess {
    generation: u64,
    filename: String,
    pid: Option<u32>,
    stdin: Option<ChildStdin>,
    signals: mpsc::UnboundedSender<StopSignal>,
    exited: oneshot::Receiver<ExitReport>,
}

#[derive(Default)]
struct Slot {
    running: Option<RunningProcess>,
    generation: u64,
}

pub struct ProcessPlayer {
    cfg: ProcessPlayerConfig,
    slot: Arc<Mutex<Slot>>,
    state: Arc<RwLock<PlayerState>>,
}

impl ProcessPlayer {
    pub fn new(cfg: ProcessPlayerConfig) -> Self {
        Self {
            cfg,
            slot: Arc::new(Mutex::new(Slot::default())),
            state: Arc::new(RwLock::new(PlayerState::default())),
        }
    }

    /// Check that a client supplied name is a file inside the data directory.
    ///
    /// Only plain relative names are accepted, and the canonical target must
    /// stay under the canonical data directory so symlinks cannot escape it.
    fn check_confined(&self, name: &str) -> Result<(), PlaybackError> {
        if name.trim().is_empty() {
            return Err(PlaybackError::InvalidPath("empty filename".into()));
        }
        let rel = Path::new(name);
        if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(PlaybackError::InvalidPath(name.to_string()));
        }

        let root = self.cfg.data_dir.canonicalize().map_err(|e| {
            PlaybackError::NotFound(format!("data dir {}: {e}", self.cfg.data_dir.display()))
        })?;
        let full = match root.join(rel).canonicalize() {
            Ok(p) => p,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PlaybackError::NotFound(name.to_string()));
            }
            Err(e) => return Err(PlaybackError::InvalidPath(format!("{name}: {e}"))),
        };
        if !full.starts_with(&root) {
            return Err(PlaybackError::InvalidPath(name.to_string()));
        }
        if !full.is_file() {
            return Err(PlaybackError::NotFound(name.to_string()));
        }
        Ok(())
    }

    fn spawn_player(&self, name: &str) -> std::io::Result<Child> {
        let mut cmd = Command::new(&self.cfg.binary);
        cmd.args(&self.cfg.args)
            .arg(name)
            .current_dir(&self.cfg.data_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        cmd.spawn()
    }

    fn start_locked(&self, slot: &mut Slot, name: &str) -> Result<(), PlaybackError> {
        self.state.write().begin_start();

        let mut child = match self.spawn_player(name) {
            Ok(c) => c,
            Err(e) => {
                self.state.write().launch_failed();
                warn!("player launch failed for {name}: {e}");
                return Err(PlaybackError::Launch(format!("{}: {e}", self.cfg.binary)));
            }
        };

        slot.generation += 1;
        let generation = slot.generation;
        let pid = child.id();
        let stdin = child.stdin.take();

        // Player chatter goes to the debug log; the task ends on EOF.
        if let Some(stderr) = child.stderr.take() {
            let file = name.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if !line.trim().is_empty() {
                        debug!("player [{file}]: {line}");
                    }
                }
            });
        }

        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        let (exited_tx, exited_rx) = oneshot::channel();
        tokio::spawn(watch_process(
            child,
            signals_rx,
            exited_tx,
            generation,
            self.slot.clone(),
            self.state.clone(),
        ));

        slot.running = Some(RunningProcess {
            generation,
            filename: name.to_string(),
            pid,
            stdin,
            signals: signals_tx,
            exited: exited_rx,
        });
        self.state.write().started(name);
        info!("playback start: {name} (pid {pid:?})");
        Ok(())
    }

    /// Bounded, escalating stop: quit command, then SIGTERM, then SIGKILL.
    /// Must be called with `slot` held.
    async fn stop_locked(&self, slot: &mut Slot) -> Result<(), PlaybackError> {
        let Some(mut running) = slot.running.take() else {
            self.state.write().stopped();
            return Ok(());
        };
        self.state.write().begin_stop();
        let wait = self.cfg.stop_timeout;

        if let Some(mut stdin) = running.stdin.take() {
            if let Err(e) = send_quit(&mut stdin, &self.cfg.quit_command).await {
                debug!("quit command not delivered to {}: {e}", running.filename);
            }
            // Closing stdin is part of the request.
            drop(stdin);
        }
        let mut exit = wait_exit(&mut running.exited, wait).await;

        if exit.is_none() {
            info!("player ignored quit command, sending SIGTERM: {}", running.filename);
            running.request(StopSignal::Terminate);
            exit = wait_exit(&mut running.exited, wait).await;
        }

        if exit.is_none() {
            warn!("player still running, killing: {}", running.filename);
            running.request(StopSignal::Kill);
            exit = wait_exit(&mut running.exited, wait).await;
        }

        match exit {
            Some(report) => {
                match report {
                    Some(status) => info!("playback stop: {} ({status})", running.filename),
                    None => info!("playback stop: {}", running.filename),
                }
                self.state.write().stopped();
                Ok(())
            }
            None => {
                let msg = format!("{} (pid {:?})", running.filename, running.pid);
                slot.running = Some(running);
                self.state.write().stop_failed();
                Err(PlaybackError::ProcessTermination(msg))
            }
        }
    }
}

#[async_trait]
impl Player for ProcessPlayer {
    async fn play_file(&self, name: &str) -> Result<(), PlaybackError> {
        // Validate before touching anything so a bad request leaves the
        // current playback alone.
        self.check_confined(name)?;

        let mut slot = self.slot.lock().await;
        if slot.running.is_some() {
            self.stop_locked(&mut slot).await?;
        }
        self.start_locked(&mut slot, name)
    }

    async fn stop_file(&self) -> Result<(), PlaybackError> {
        let mut slot = self.slot.lock().await;
        self.stop_locked(&mut slot).await
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

async fn send_quit(stdin: &mut ChildStdin, command: &str) -> std::io::Result<()> {
    stdin.write_all(command.as_bytes()).await?;
    stdin.flush().await
}

/// `None` on timeout. `Some(None)` when the watcher went away without a status.
async fn wait_exit(
    exited: &mut oneshot::Receiver<ExitReport>,
    wait: Duration,
) -> Option<Option<ExitStatus>> {
    match tokio::time::timeout(wait, exited).await {
        Ok(Ok(Ok(status))) => Some(Some(status)),
        Ok(Ok(Err(e))) => {
            warn!("waiting for player exit failed: {e}");
            Some(None)
        }
        Ok(Err(_)) => Some(None),
        Err(_) => None,
    }
}

impl RunningProcess {
    fn request(&self, signal: StopSignal) {
        // A closed channel means the watcher already saw the exit.
        let _ = self.signals.send(signal);
    }
}

/// Deliver `signal` to the player's process group, unless the leader has
/// already been reaped (its id may then belong to someone else).
fn deliver(child: &mut Child, signal: StopSignal) {
    let Some(pid) = child.id() else { return };
    #[cfg(unix)]
    signal_group(pid, signal);
    #[cfg(not(unix))]
    if signal == StopSignal::Kill {
        if let Err(e) = child.start_kill() {
            warn!("failed to kill player {pid}: {e}");
        }
    }
}

#[cfg(unix)]
fn signal_group(pgid: u32, signal: StopSignal) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else { return };
    let signo = match signal {
        StopSignal::Terminate => libc::SIGTERM,
        StopSignal::Kill => libc::SIGKILL,
    };
    // SAFETY: kill(2) has no memory-safety requirements. The target is the
    // group our child leads; it was created with `process_group(0)`.
    let rc = unsafe { libc::kill(-pgid, signo) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!("signal {signo} to process group {pgid} failed: {err}");
        }
    }
}

async fn watch_process(
    mut child: Child,
    mut signals: mpsc::UnboundedReceiver<StopSignal>,
    exited_tx: oneshot::Sender<ExitReport>,
    generation: u64,
    slot: Arc<Mutex<Slot>>,
    state: Arc<RwLock<PlayerState>>,
) {
    let pgid = child.id();
    let report = loop {
        tokio::select! {
            res = child.wait() => break res,
            signal = signals.recv() => match signal {
                Some(signal) => deliver(&mut child, signal),
                // The handle was dropped without a stop: take the player down.
                None => {
                    deliver(&mut child, StopSignal::Kill);
                    break child.wait().await;
                }
            },
        }
    };

    // The leader is gone but anything it forked may still hold the screen.
    // Members left behind keep the group id reserved, so this reaches them.
    // An empty group fails with ESRCH; its id could only have been handed
    // out again after a full pid wraparound since the reap above.
    #[cfg(unix)]
    if let Some(pgid) = pgid {
        signal_group(pgid, StopSignal::Kill);
    }
    #[cfg(not(unix))]
    let _ = pgid;

    let summary = match &report {
        Ok(status) => status.to_string(),
        Err(e) => e.to_string(),
    };

    // A stopper holding `slot` may be waiting on this; report before locking.
    let _ = exited_tx.send(report);

    let mut slot = slot.lock().await;
    let current = slot.running.as_ref().map(|r| r.generation) == Some(generation);
    if current {
        if let Some(running) = slot.running.take() {
            info!("player exited on its own: {} ({summary})", running.filename);
        }
        state.write().stopped();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::player::state::Phase;

    // `sh -c SCRIPT sh FILE`: the filename arrives as $1.
    fn player_with(dir: &Path, script: &str, stop_ms: u64) -> ProcessPlayer {
        ProcessPlayer::new(ProcessPlayerConfig {
            binary: "sh".into(),
            args: vec!["-c".into(), script.into(), "sh".into()],
            data_dir: dir.to_path_buf(),
            quit_command: "q".into(),
            stop_timeout: Duration::from_millis(stop_ms),
        })
    }

    // Marks itself alive in "$1.alive" and exits once stdin is closed.
    const WELL_BEHAVED: &str = r#"touch "$1.alive"; cat > /dev/null; rm -f "$1.alive""#;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    fn alive_markers(dir: &Path) -> Vec<String> {
        let mut out: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|n| n.ends_with(".alive"))
            .collect();
        out.sort();
        out
    }

    async fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        for _ in 0..100 {
            if cond() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        cond()
    }

    #[tokio::test]
    async fn play_then_stop() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "movie.mp4");
        let p = player_with(dir.path(), WELL_BEHAVED, 2000);

        p.play_file("movie.mp4").await.unwrap();
        assert!(p.is_playing());
        assert_eq!(p.file_playing(), "movie.mp4");
        assert!(wait_for(|| dir.path().join("movie.mp4.alive").exists()).await);

        p.stop_file().await.unwrap();
        assert!(!p.is_playing());
        assert_eq!(p.file_playing(), "movie.mp4");
        assert!(alive_markers(dir.path()).is_empty());

        // Idempotent.
        p.stop_file().await.unwrap();
        assert_eq!(p.state.read().phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn stop_when_idle_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let p = player_with(dir.path(), WELL_BEHAVED, 500);
        p.stop_file().await.unwrap();
        assert!(!p.is_playing());
        assert_eq!(p.file_playing(), "");
    }

    #[tokio::test]
    async fn second_play_stops_first() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.mp4");
        touch(dir.path(), "b.mp4");
        let p = player_with(dir.path(), WELL_BEHAVED, 2000);

        p.play_file("a.mp4").await.unwrap();
        assert!(wait_for(|| dir.path().join("a.mp4.alive").exists()).await);
        p.play_file("b.mp4").await.unwrap();
        assert!(wait_for(|| dir.path().join("b.mp4.alive").exists()).await);

        assert_eq!(alive_markers(dir.path()), vec!["b.mp4.alive".to_string()]);
        assert_eq!(p.file_playing(), "b.mp4");
        assert!(p.is_playing());

        p.stop_file().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_plays_leave_one_process() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.mp4");
        touch(dir.path(), "b.mp4");
        let p = Arc::new(player_with(dir.path(), WELL_BEHAVED, 2000));

        let (pa, pb) = (p.clone(), p.clone());
        let ta = tokio::spawn(async move { pa.play_file("a.mp4").await });
        let tb = tokio::spawn(async move { pb.play_file("b.mp4").await });
        ta.await.unwrap().unwrap();
        tb.await.unwrap().unwrap();

        let winner = p.file_playing();
        assert!(winner == "a.mp4" || winner == "b.mp4");
        assert!(p.is_playing());
        let marker = format!("{winner}.alive");
        assert!(wait_for(|| dir.path().join(&marker).exists()).await);
        assert_eq!(alive_markers(dir.path()), vec![marker]);

        p.stop_file().await.unwrap();
        assert!(alive_markers(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn exit_on_its_own_is_reconciled() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "short.mp4");
        let p = player_with(dir.path(), "exit 0", 500);

        p.play_file("short.mp4").await.unwrap();
        assert!(wait_for(|| !p.is_playing()).await);
        assert_eq!(p.file_playing(), "short.mp4");
        assert!(p.slot.lock().await.running.is_none());

        // Nothing left to stop.
        p.stop_file().await.unwrap();
    }

    #[tokio::test]
    async fn stubborn_player_is_killed() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "stuck.mp4");
        // Ignores stdin and SIGTERM; only the group SIGKILL ends it.
        let p = player_with(dir.path(), "trap '' TERM; while :; do sleep 0.05; done", 300);

        p.play_file("stuck.mp4").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        p.stop_file().await.unwrap();
        assert!(!p.is_playing());
        assert!(p.slot.lock().await.running.is_none());
    }

    // Like omxplayer: a shell wrapper that runs the real player as a child
    // and does not exec it. The child records its pid in "$1.grandpid".
    const WRAPPER: &str = r#"sh -c 'echo $$ > "$0.grandpid"; exec sleep 30' "$1"; :"#;
    // Same, but the inner player also ignores SIGTERM.
    const WRAPPER_STUBBORN_CHILD: &str =
        r#"sh -c 'trap "" TERM; echo $$ > "$0.grandpid"; exec sleep 30' "$1"; :"#;

    fn read_pid(path: &Path) -> Option<i32> {
        std::fs::read_to_string(path).ok()?.trim().parse().ok()
    }

    // Zombies count as dead: nobody may reap the reparented child here.
    fn pid_alive(pid: i32) -> bool {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => stat
                .rsplit_once(')')
                .map(|(_, rest)| !rest.trim_start().starts_with('Z'))
                .unwrap_or(false),
            Err(_) if Path::new("/proc/self/stat").exists() => false,
            Err(_) => unsafe { libc::kill(pid, 0) == 0 },
        }
    }

    async fn assert_stop_reaps_wrapper_child(script: &str) {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "movie.mp4");
        let p = player_with(dir.path(), script, 300);

        p.play_file("movie.mp4").await.unwrap();
        let pid_file = dir.path().join("movie.mp4.grandpid");
        assert!(wait_for(|| read_pid(&pid_file).is_some()).await);
        let inner = read_pid(&pid_file).unwrap();
        assert!(pid_alive(inner));

        p.stop_file().await.unwrap();
        assert!(!p.is_playing());
        assert!(
            wait_for(|| !pid_alive(inner)).await,
            "inner player {inner} outlived stop_file"
        );
    }

    #[tokio::test]
    async fn stop_takes_down_wrapper_children() {
        assert_stop_reaps_wrapper_child(WRAPPER).await;
    }

    #[tokio::test]
    async fn stop_kills_children_that_ignore_sigterm() {
        assert_stop_reaps_wrapper_child(WRAPPER_STUBBORN_CHILD).await;
    }

    #[tokio::test]
    async fn replacing_a_wrapper_leaves_no_orphan() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.mp4");
        touch(dir.path(), "b.mp4");
        let p = player_with(dir.path(), WRAPPER_STUBBORN_CHILD, 200);

        p.play_file("a.mp4").await.unwrap();
        let a_pid = dir.path().join("a.mp4.grandpid");
        assert!(wait_for(|| read_pid(&a_pid).is_some()).await);
        let first = read_pid(&a_pid).unwrap();

        p.play_file("b.mp4").await.unwrap();
        assert!(wait_for(|| !pid_alive(first)).await, "{first} still running");
        assert_eq!(p.file_playing(), "b.mp4");
        assert!(p.is_playing());

        p.stop_file().await.unwrap();
    }

    // Installs a running entry whose exit never arrives, as if the process
    // sat in uninterruptible sleep. The receiver shows what was requested.
    async fn install_unkillable(
        p: &ProcessPlayer,
        name: &str,
    ) -> (mpsc::UnboundedReceiver<StopSignal>, oneshot::Sender<ExitReport>) {
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        let (exited_tx, exited_rx) = oneshot::channel();
        let mut slot = p.slot.lock().await;
        slot.generation += 1;
        slot.running = Some(RunningProcess {
            generation: slot.generation,
            filename: name.to_string(),
            pid: None,
            stdin: None,
            signals: signals_tx,
            exited: exited_rx,
        });
        let mut st = p.state.write();
        st.begin_start();
        st.started(name);
        (signals_rx, exited_tx)
    }

    #[tokio::test]
    async fn failed_stop_keeps_old_playback_recorded() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.mp4");
        touch(dir.path(), "b.mp4");
        let p = player_with(dir.path(), WELL_BEHAVED, 20);
        let (mut requested, _exited) = install_unkillable(&p, "a.mp4").await;

        let err = p.stop_file().await.unwrap_err();
        assert!(matches!(err, PlaybackError::ProcessTermination(_)));
        assert_eq!(requested.try_recv().unwrap(), StopSignal::Terminate);
        assert_eq!(requested.try_recv().unwrap(), StopSignal::Kill);
        assert_eq!(p.state.read().phase(), Phase::Playing);
        assert_eq!(p.file_playing(), "a.mp4");
        assert!(p.slot.lock().await.running.is_some());

        // The replacement is refused while the old one cannot be stopped.
        let err = p.play_file("b.mp4").await.unwrap_err();
        assert!(matches!(err, PlaybackError::ProcessTermination(_)));
        assert!(p.is_playing());
        assert_eq!(p.file_playing(), "a.mp4");
        assert!(!dir.path().join("b.mp4.alive").exists());
    }

    #[tokio::test]
    async fn late_exit_after_failed_stop_allows_retry() {
        let dir = tempfile::tempdir().unwrap();
        let p = player_with(dir.path(), WELL_BEHAVED, 20);
        let (_requested, exited) = install_unkillable(&p, "a.mp4").await;

        assert!(p.stop_file().await.is_err());
        exited.send(Ok(std::process::ExitStatus::default())).unwrap();

        p.stop_file().await.unwrap();
        assert!(!p.is_playing());
        assert_eq!(p.file_playing(), "a.mp4");
    }

    #[tokio::test]
    async fn missing_binary_is_a_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.mp4");
        let p = ProcessPlayer::new(ProcessPlayerConfig {
            binary: "/nonexistent/playbox-player".into(),
            args: vec![],
            data_dir: dir.path().to_path_buf(),
            quit_command: "q".into(),
            stop_timeout: Duration::from_millis(200),
        });

        let err = p.play_file("a.mp4").await.unwrap_err();
        assert!(matches!(err, PlaybackError::Launch(_)));
        assert_eq!(p.state.read().phase(), Phase::Idle);
        assert_eq!(p.file_playing(), "");
    }

    #[tokio::test]
    async fn missing_file_leaves_current_playback() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.mp4");
        let p = player_with(dir.path(), WELL_BEHAVED, 2000);

        p.play_file("a.mp4").await.unwrap();
        let err = p.play_file("missing.mp4").await.unwrap_err();
        assert!(matches!(err, PlaybackError::NotFound(_)));
        assert!(p.is_playing());
        assert_eq!(p.file_playing(), "a.mp4");

        p.stop_file().await.unwrap();
    }

    #[tokio::test]
    async fn paths_outside_data_dir_are_rejected() {
        let outer = tempfile::tempdir().unwrap();
        let data = outer.path().join("data");
        std::fs::create_dir(&data).unwrap();
        touch(outer.path(), "secret.mp4");
        std::os::unix::fs::symlink(outer.path().join("secret.mp4"), data.join("link.mp4")).unwrap();
        let p = player_with(&data, WELL_BEHAVED, 500);

        for name in ["", "../secret.mp4", "/etc/passwd", "link.mp4", "./../secret.mp4"] {
            let err = p.play_file(name).await.unwrap_err();
            assert!(
                matches!(err, PlaybackError::InvalidPath(_)),
                "{name:?} gave {err:?}"
            );
        }
        assert!(!p.is_playing());
    }

    #[tokio::test]
    async fn directories_are_not_playable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("season1")).unwrap();
        let p = player_with(dir.path(), WELL_BEHAVED, 500);
        let err = p.play_file("season1").await.unwrap_err();
        assert!(matches!(err, PlaybackError::NotFound(_)));
    }
}
