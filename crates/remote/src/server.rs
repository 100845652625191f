//! Remote test-run TCP server.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use dropforge_vfs::{ExcludeFilter, Vfs};

use crate::files::FileServicer;
use crate::wire::{ClientMessage, ServerCommand};
use crate::{OnEventFn, RemoteClient, RemoteError, ServerEvent};

/// Outgoing command queue depth per connection.
const COMMAND_QUEUE: usize = 32;

/// How long a fresh connection gets to introduce itself.
const HELLO_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
    /// Directory receiving one log file per client session.
    pub log_directory: PathBuf,
}

/// Accepts remote runner connections and exposes them as
/// [`RemoteClient`] sessions.
///
/// Shutdown is two-phase: [`shutdown`](RemoteServer::shutdown) signals
/// the cancellation token, [`run`](RemoteServer::run) observes it, stops
/// listening and waits for every connection task to finish its own
/// teardown before returning.
pub struct RemoteServer {
    config: ServerConfig,
    vfs: Arc<dyn Vfs>,
    base_gamedef_paths: Vec<String>,
    exclude_patterns: Vec<String>,
    clients: Mutex<HashMap<String, Arc<RemoteClient>>>,
    on_event: OnEventFn,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl RemoteServer {
    /// Creates a server synchronizing `vfs` under the given exclusion
    /// rules. `on_event` receives every [`ServerEvent`].
    pub fn new(
        config: ServerConfig,
        vfs: Arc<dyn Vfs>,
        base_gamedef_paths: Vec<String>,
        exclude_patterns: Vec<String>,
        on_event: OnEventFn,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            vfs,
            base_gamedef_paths,
            exclude_patterns,
            clients: Mutex::new(HashMap::new()),
            on_event,
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
        })
    }

    /// The bound address, available once [`run`](RemoteServer::run) has
    /// bound the socket.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap()
    }

    pub fn port(&self) -> u16 {
        self.local_addr().map(|a| a.port()).unwrap_or(0)
    }

    /// Session handle for a connected client.
    pub fn client(&self, name: &str) -> Option<Arc<RemoteClient>> {
        self.clients.lock().unwrap().get(name).cloned()
    }

    pub fn client_names(&self) -> Vec<String> {
        self.clients.lock().unwrap().keys().cloned().collect()
    }

    /// Signals shutdown. `run` performs the orderly teardown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Runs the server until [`shutdown`](RemoteServer::shutdown).
    pub async fn run(self: &Arc<Self>) -> Result<(), RemoteError> {
        let addr: SocketAddr = ([0, 0, 0, 0], self.config.port).into();
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().unwrap() = Some(local_addr);
        tracing::info!(%local_addr, "remote server listening");

        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("remote server shutting down");
                    break;
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let server = Arc::clone(self);
                            connections.spawn(async move {
                                if let Err(err) = server.handle_connection(stream, peer_addr).await {
                                    tracing::error!(%peer_addr, error = %err, "connection failed");
                                }
                            });
                        }
                        Err(err) => tracing::error!(error = %err, "accept failed"),
                    }
                }

                // Reap finished connection tasks as we go.
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        // Stop listening first, then wait for every connection to
        // observe the cancellation and tear itself down.
        drop(listener);
        while connections.join_next().await.is_some() {}
        tracing::info!("remote server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        peer_addr: SocketAddr,
    ) -> Result<(), RemoteError> {
        let (mut reader, writer) = stream.into_split();

        // The client must introduce itself before anything else.
        let hello = tokio::time::timeout(HELLO_TIMEOUT, ClientMessage::read_from(&mut reader))
            .await
            .map_err(|_| {
                RemoteError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "client sent no hello",
                ))
            })??;
        let ClientMessage::Hello {
            name,
            launch_profiles,
            default_profile,
        } = hello
        else {
            return Err(RemoteError::UnknownMessage(0));
        };

        let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
        let client = Arc::new(RemoteClient::new(
            name.clone(),
            peer_addr.to_string(),
            launch_profiles,
            default_profile,
            self.config.log_directory.join(format!("{name}.log")),
            tx.clone(),
        )?);

        if let Some(previous) = self
            .clients
            .lock()
            .unwrap()
            .insert(name.clone(), Arc::clone(&client))
        {
            tracing::info!(client = %name, address = %previous.address(), "replacing session");
        }
        tracing::info!(client = %name, %peer_addr, "client connected");
        (self.on_event)(ServerEvent::ClientConnected {
            name: name.clone(),
            address: peer_addr.to_string(),
        });

        let writer_task = tokio::spawn(write_loop(writer, rx, self.cancel.clone()));
        let result = self.read_loop(&mut reader, &client, &tx).await;
        drop(tx);
        drop(client);

        // Deregister unless a newer session already replaced us; only an
        // actual deregistration counts as a disconnect.
        let removed = {
            let mut clients = self.clients.lock().unwrap();
            let ours = clients
                .get(&name)
                .is_some_and(|current| current.address() == peer_addr.to_string());
            if ours {
                clients.remove(&name);
            }
            ours
        };
        if removed {
            (self.on_event)(ServerEvent::ClientDisconnected { name: name.clone() });
            tracing::info!(client = %name, "client disconnected");
        } else {
            tracing::debug!(client = %name, "replaced session closed");
        }

        writer_task.abort();
        result
    }

    /// Pumps inbound messages until disconnect or cancellation.
    async fn read_loop(
        self: &Arc<Self>,
        reader: &mut OwnedReadHalf,
        client: &Arc<RemoteClient>,
        responses: &mpsc::Sender<ServerCommand>,
    ) -> Result<(), RemoteError> {
        let filter = ExcludeFilter::new(&self.base_gamedef_paths, &self.exclude_patterns)?;
        let mut servicer = FileServicer::new(Arc::clone(&self.vfs), filter);

        loop {
            let message = tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                message = ClientMessage::read_from(reader) => message,
            };
            let message = match message {
                Ok(message) => message,
                // A vanished peer is a normal disconnect.
                Err(RemoteError::Io(err))
                    if err.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(());
                }
                Err(err) => return Err(err),
            };

            if let Some(response) = file_request(&mut servicer, &message) {
                if responses.send(response).await.is_err() {
                    return Ok(());
                }
                continue;
            }

            if let Some(event) = client.apply(&message) {
                (self.on_event)(event);
            }
        }
    }
}

/// Serves one file-transfer request, if `message` is one.
fn file_request(servicer: &mut FileServicer, message: &ClientMessage) -> Option<ServerCommand> {
    let result = match message {
        ClientMessage::ListDirectory { path } => servicer
            .list_directory(path)
            .map(|listing| ServerCommand::Listing {
                directories: listing.directories,
                files: listing.files,
            }),
        ClientMessage::OpenFile { path } => servicer
            .open_file(path)
            .map(|handle| ServerCommand::FileOpened { handle }),
        ClientMessage::ReadFile { handle, max_len } => servicer
            .read_file(*handle, *max_len as usize)
            .map(|data| ServerCommand::FileData { data }),
        ClientMessage::CloseFile { handle } => servicer
            .close_file(*handle)
            .map(|()| ServerCommand::FileClosed),
        _ => return None,
    };

    Some(result.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "file request failed");
        ServerCommand::RequestFailed {
            message: err.to_string(),
        }
    }))
}

/// Drains the outgoing command queue onto the socket.
async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut commands: mpsc::Receiver<ServerCommand>,
    cancel: CancellationToken,
) {
    loop {
        let command = tokio::select! {
            _ = cancel.cancelled() => break,
            command = commands.recv() => match command {
                Some(command) => command,
                None => break,
            },
        };
        if let Err(err) = command.write_to(&mut writer).await {
            tracing::debug!(error = %err, "write failed, closing connection");
            break;
        }
    }
}
