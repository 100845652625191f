//! Per-connection client session state.

use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tokio::sync::mpsc;

use dropforge_runner::{last_lines, LogTail};

use crate::{ClientMessage, RemoteError, ServerCommand, ServerEvent};

/// Project-synchronization state reported by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SynchronizeStatus {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl SynchronizeStatus {
    pub(crate) fn from_wire(code: u8) -> Self {
        match code {
            0 => SynchronizeStatus::Running,
            1 => SynchronizeStatus::Succeeded,
            _ => SynchronizeStatus::Failed,
        }
    }
}

struct SessionState {
    launch_profiles: Vec<String>,
    active_profile: String,
    default_profile: String,
    properties: VecDeque<(String, String)>,
    running: bool,
    synchronize: SynchronizeStatus,
    synchronize_message: String,
    log: LogTail,
}

/// One connected remote runner as seen by the editor.
///
/// State mutation happens on the server's connection task; the editor
/// polls through the accessors once per frame, mirroring the local
/// runner's model. Commands go out through a bounded channel drained by
/// the connection's writer task.
pub struct RemoteClient {
    name: String,
    address: String,
    log_path: PathBuf,
    state: Mutex<SessionState>,
    outgoing: mpsc::Sender<ServerCommand>,
}

impl RemoteClient {
    pub(crate) fn new(
        name: String,
        address: String,
        launch_profiles: Vec<String>,
        default_profile: String,
        log_path: PathBuf,
        outgoing: mpsc::Sender<ServerCommand>,
    ) -> Result<Self, RemoteError> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Fresh log per session.
        std::fs::File::create(&log_path)?;

        let active_profile = default_profile.clone();
        Ok(Self {
            name,
            address,
            state: Mutex::new(SessionState {
                launch_profiles,
                active_profile,
                default_profile,
                properties: VecDeque::new(),
                running: false,
                synchronize: SynchronizeStatus::Idle,
                synchronize_message: String::new(),
                log: LogTail::new(&log_path),
            }),
            log_path,
            outgoing,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Whether the connection task still drains outgoing commands.
    pub fn is_connected(&self) -> bool {
        !self.outgoing.is_closed()
    }

    pub fn launch_profiles(&self) -> Vec<String> {
        self.state.lock().unwrap().launch_profiles.clone()
    }

    pub fn default_profile(&self) -> String {
        self.state.lock().unwrap().default_profile.clone()
    }

    pub fn active_profile(&self) -> String {
        self.state.lock().unwrap().active_profile.clone()
    }

    /// Selects the profile used by the next `start_app`. Unknown names
    /// are refused.
    pub fn set_active_profile(&self, name: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.launch_profiles.iter().any(|p| p == name) {
            state.active_profile = name.to_owned();
            true
        } else {
            false
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().unwrap().running
    }

    pub fn synchronize_status(&self) -> (SynchronizeStatus, String) {
        let state = self.state.lock().unwrap();
        (state.synchronize, state.synchronize_message.clone())
    }

    /// Pops the oldest received system property, if any.
    pub fn pop_system_property(&self) -> Option<(String, String)> {
        self.state.lock().unwrap().properties.pop_front()
    }

    /// Log bytes appended since the previous poll.
    pub fn read_new_log(&self) -> std::io::Result<String> {
        self.state.lock().unwrap().log.read_new()
    }

    /// The tail end of the session log.
    pub fn last_log_lines(&self, max_lines: usize) -> std::io::Result<String> {
        last_lines(&self.log_path, max_lines)
    }

    pub async fn start_app(&self) -> Result<(), RemoteError> {
        let profile = self.active_profile();
        self.send(ServerCommand::StartApp { profile }).await
    }

    pub async fn stop_app(&self) -> Result<(), RemoteError> {
        self.send(ServerCommand::StopApp).await
    }

    pub async fn kill_app(&self) -> Result<(), RemoteError> {
        self.send(ServerCommand::KillApp).await
    }

    pub async fn synchronize(&self) -> Result<(), RemoteError> {
        self.send(ServerCommand::Synchronize).await
    }

    pub async fn request_system_property(&self, name: &str) -> Result<(), RemoteError> {
        self.send(ServerCommand::RequestSystemProperty {
            name: name.to_owned(),
        })
        .await
    }

    async fn send(&self, command: ServerCommand) -> Result<(), RemoteError> {
        self.outgoing
            .send(command)
            .await
            .map_err(|_| RemoteError::NotConnected(self.name.clone()))
    }

    /// Applies one inbound message to the session and returns the event
    /// to surface, if any. File-transfer requests are handled by the
    /// connection task, not here.
    pub(crate) fn apply(&self, message: &ClientMessage) -> Option<ServerEvent> {
        let mut state = self.state.lock().unwrap();
        match message {
            ClientMessage::SystemProperty { name, value } => {
                state.properties.push_back((name.clone(), value.clone()));
                None
            }
            ClientMessage::RunStatus { running } => {
                if state.running == *running {
                    return None;
                }
                state.running = *running;
                Some(ServerEvent::RunStatusChanged {
                    name: self.name.clone(),
                    running: *running,
                })
            }
            ClientMessage::Log { line } => {
                if let Err(err) = append_log_line(&self.log_path, line) {
                    tracing::warn!(client = %self.name, error = %err, "failed writing session log");
                }
                None
            }
            ClientMessage::Synchronize { status, message } => {
                state.synchronize = SynchronizeStatus::from_wire(*status);
                state.synchronize_message = message.clone();
                Some(ServerEvent::ClientSynchronizing {
                    name: self.name.clone(),
                    status: state.synchronize,
                    message: message.clone(),
                })
            }
            _ => None,
        }
    }
}

fn append_log_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new().append(true).open(path)?;
    writeln!(file, "{line}")
}
