//! TCP wire format between the editor and remote runner clients.
//!
//! # Wire format
//!
//! ```text
//! MESSAGE: [1 byte: code] [payload]
//! STRING:  [2 bytes BE: len] [len bytes UTF-8]
//! LIST:    [2 bytes BE: count] [count strings]
//!
//! Client -> editor: Hello, SystemProperty, RunStatus, Log, Synchronize,
//!                   ListDirectory, OpenFile, ReadFile, CloseFile
//! Editor -> client: StartApp, StopApp, KillApp, Synchronize,
//!                   RequestSystemProperty, Listing, FileOpened,
//!                   FileData, FileClosed, RequestFailed
//! ```
//!
//! File transfer is a synchronous request/response exchange: the client
//! sends one file request at a time and waits for the matching editor
//! response before issuing the next.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::RemoteError;

/// Messages a connected runner client sends to the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// First message after connecting: who the client is and which
    /// launch profiles it offers.
    Hello {
        name: String,
        launch_profiles: Vec<String>,
        default_profile: String,
    },
    /// A system property value, answering a prior request.
    SystemProperty { name: String, value: String },
    /// The client's game started or stopped.
    RunStatus { running: bool },
    /// One line of run log output.
    Log { line: String },
    /// Project synchronization progress.
    Synchronize { status: u8, message: String },
    /// Request a filtered listing of one project directory.
    ListDirectory { path: String },
    /// Request a file handle for sequential reading.
    OpenFile { path: String },
    /// Request up to `max_len` bytes from an open handle.
    ReadFile { handle: u32, max_len: u32 },
    /// Release an open handle.
    CloseFile { handle: u32 },
}

impl ClientMessage {
    pub const CODE_HELLO: u8 = 1;
    pub const CODE_SYSTEM_PROPERTY: u8 = 2;
    pub const CODE_RUN_STATUS: u8 = 3;
    pub const CODE_LOG: u8 = 4;
    pub const CODE_SYNCHRONIZE: u8 = 5;
    pub const CODE_LIST_DIRECTORY: u8 = 6;
    pub const CODE_OPEN_FILE: u8 = 7;
    pub const CODE_READ_FILE: u8 = 8;
    pub const CODE_CLOSE_FILE: u8 = 9;

    pub async fn write_to<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> Result<(), RemoteError> {
        match self {
            ClientMessage::Hello {
                name,
                launch_profiles,
                default_profile,
            } => {
                writer.write_u8(Self::CODE_HELLO).await?;
                write_string(writer, name).await?;
                write_list(writer, launch_profiles).await?;
                write_string(writer, default_profile).await?;
            }
            ClientMessage::SystemProperty { name, value } => {
                writer.write_u8(Self::CODE_SYSTEM_PROPERTY).await?;
                write_string(writer, name).await?;
                write_string(writer, value).await?;
            }
            ClientMessage::RunStatus { running } => {
                writer.write_u8(Self::CODE_RUN_STATUS).await?;
                writer.write_u8(*running as u8).await?;
            }
            ClientMessage::Log { line } => {
                writer.write_u8(Self::CODE_LOG).await?;
                write_string(writer, line).await?;
            }
            ClientMessage::Synchronize { status, message } => {
                writer.write_u8(Self::CODE_SYNCHRONIZE).await?;
                writer.write_u8(*status).await?;
                write_string(writer, message).await?;
            }
            ClientMessage::ListDirectory { path } => {
                writer.write_u8(Self::CODE_LIST_DIRECTORY).await?;
                write_string(writer, path).await?;
            }
            ClientMessage::OpenFile { path } => {
                writer.write_u8(Self::CODE_OPEN_FILE).await?;
                write_string(writer, path).await?;
            }
            ClientMessage::ReadFile { handle, max_len } => {
                writer.write_u8(Self::CODE_READ_FILE).await?;
                writer.write_u32(*handle).await?;
                writer.write_u32(*max_len).await?;
            }
            ClientMessage::CloseFile { handle } => {
                writer.write_u8(Self::CODE_CLOSE_FILE).await?;
                writer.write_u32(*handle).await?;
            }
        }
        Ok(())
    }

    pub async fn read_from<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self, RemoteError> {
        match reader.read_u8().await? {
            Self::CODE_HELLO => Ok(ClientMessage::Hello {
                name: read_string(reader).await?,
                launch_profiles: read_list(reader).await?,
                default_profile: read_string(reader).await?,
            }),
            Self::CODE_SYSTEM_PROPERTY => Ok(ClientMessage::SystemProperty {
                name: read_string(reader).await?,
                value: read_string(reader).await?,
            }),
            Self::CODE_RUN_STATUS => Ok(ClientMessage::RunStatus {
                running: reader.read_u8().await? != 0,
            }),
            Self::CODE_LOG => Ok(ClientMessage::Log {
                line: read_string(reader).await?,
            }),
            Self::CODE_SYNCHRONIZE => Ok(ClientMessage::Synchronize {
                status: reader.read_u8().await?,
                message: read_string(reader).await?,
            }),
            Self::CODE_LIST_DIRECTORY => Ok(ClientMessage::ListDirectory {
                path: read_string(reader).await?,
            }),
            Self::CODE_OPEN_FILE => Ok(ClientMessage::OpenFile {
                path: read_string(reader).await?,
            }),
            Self::CODE_READ_FILE => Ok(ClientMessage::ReadFile {
                handle: reader.read_u32().await?,
                max_len: reader.read_u32().await?,
            }),
            Self::CODE_CLOSE_FILE => Ok(ClientMessage::CloseFile {
                handle: reader.read_u32().await?,
            }),
            other => Err(RemoteError::UnknownMessage(other)),
        }
    }
}

/// Commands the editor sends to a connected runner client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerCommand {
    /// Launch the game with the named launch profile.
    StartApp { profile: String },
    /// Request graceful shutdown of the running game.
    StopApp,
    /// Terminate the running game unconditionally.
    KillApp,
    /// Begin project synchronization.
    Synchronize,
    /// Ask the client for a system property value.
    RequestSystemProperty { name: String },
    /// Answer to `ListDirectory`.
    Listing {
        directories: Vec<String>,
        files: Vec<String>,
    },
    /// Answer to `OpenFile`.
    FileOpened { handle: u32 },
    /// Answer to `ReadFile`. Empty data means end of file.
    FileData { data: Vec<u8> },
    /// Answer to `CloseFile`.
    FileClosed,
    /// A file request could not be served.
    RequestFailed { message: String },
}

impl ServerCommand {
    pub const CODE_START_APP: u8 = 1;
    pub const CODE_STOP_APP: u8 = 2;
    pub const CODE_KILL_APP: u8 = 3;
    pub const CODE_SYNCHRONIZE: u8 = 4;
    pub const CODE_REQUEST_SYSTEM_PROPERTY: u8 = 5;
    pub const CODE_LISTING: u8 = 6;
    pub const CODE_FILE_OPENED: u8 = 7;
    pub const CODE_FILE_DATA: u8 = 8;
    pub const CODE_FILE_CLOSED: u8 = 9;
    pub const CODE_REQUEST_FAILED: u8 = 10;

    pub async fn write_to<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> Result<(), RemoteError> {
        match self {
            ServerCommand::StartApp { profile } => {
                writer.write_u8(Self::CODE_START_APP).await?;
                write_string(writer, profile).await?;
            }
            ServerCommand::StopApp => writer.write_u8(Self::CODE_STOP_APP).await?,
            ServerCommand::KillApp => writer.write_u8(Self::CODE_KILL_APP).await?,
            ServerCommand::Synchronize => writer.write_u8(Self::CODE_SYNCHRONIZE).await?,
            ServerCommand::RequestSystemProperty { name } => {
                writer.write_u8(Self::CODE_REQUEST_SYSTEM_PROPERTY).await?;
                write_string(writer, name).await?;
            }
            ServerCommand::Listing { directories, files } => {
                writer.write_u8(Self::CODE_LISTING).await?;
                write_list(writer, directories).await?;
                write_list(writer, files).await?;
            }
            ServerCommand::FileOpened { handle } => {
                writer.write_u8(Self::CODE_FILE_OPENED).await?;
                writer.write_u32(*handle).await?;
            }
            ServerCommand::FileData { data } => {
                writer.write_u8(Self::CODE_FILE_DATA).await?;
                writer.write_u32(data.len() as u32).await?;
                writer.write_all(data).await?;
            }
            ServerCommand::FileClosed => writer.write_u8(Self::CODE_FILE_CLOSED).await?,
            ServerCommand::RequestFailed { message } => {
                writer.write_u8(Self::CODE_REQUEST_FAILED).await?;
                write_string(writer, message).await?;
            }
        }
        Ok(())
    }

    pub async fn read_from<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self, RemoteError> {
        match reader.read_u8().await? {
            Self::CODE_START_APP => Ok(ServerCommand::StartApp {
                profile: read_string(reader).await?,
            }),
            Self::CODE_STOP_APP => Ok(ServerCommand::StopApp),
            Self::CODE_KILL_APP => Ok(ServerCommand::KillApp),
            Self::CODE_SYNCHRONIZE => Ok(ServerCommand::Synchronize),
            Self::CODE_REQUEST_SYSTEM_PROPERTY => Ok(ServerCommand::RequestSystemProperty {
                name: read_string(reader).await?,
            }),
            Self::CODE_LISTING => Ok(ServerCommand::Listing {
                directories: read_list(reader).await?,
                files: read_list(reader).await?,
            }),
            Self::CODE_FILE_OPENED => Ok(ServerCommand::FileOpened {
                handle: reader.read_u32().await?,
            }),
            Self::CODE_FILE_DATA => {
                let len = reader.read_u32().await? as usize;
                let mut data = vec![0u8; len];
                reader.read_exact(&mut data).await?;
                Ok(ServerCommand::FileData { data })
            }
            Self::CODE_FILE_CLOSED => Ok(ServerCommand::FileClosed),
            Self::CODE_REQUEST_FAILED => Ok(ServerCommand::RequestFailed {
                message: read_string(reader).await?,
            }),
            other => Err(RemoteError::UnknownMessage(other)),
        }
    }
}

async fn write_string<W: AsyncWrite + Unpin>(writer: &mut W, s: &str) -> Result<(), RemoteError> {
    let bytes = s.as_bytes();
    // Truncation would corrupt the frame; refuse instead.
    if bytes.len() > u16::MAX as usize {
        return Err(RemoteError::Io(std::io::Error::other(format!(
            "string too long for wire: {} bytes",
            bytes.len()
        ))));
    }
    writer.write_u16(bytes.len() as u16).await?;
    writer.write_all(bytes).await?;
    Ok(())
}

async fn read_string<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String, RemoteError> {
    let len = reader.read_u16().await? as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(String::from_utf8(buf)?)
}

async fn write_list<W: AsyncWrite + Unpin>(
    writer: &mut W,
    items: &[String],
) -> Result<(), RemoteError> {
    // A truncated count would desynchronize the stream; refuse instead.
    if items.len() > u16::MAX as usize {
        return Err(RemoteError::Io(std::io::Error::other(format!(
            "list too long for wire: {} entries",
            items.len()
        ))));
    }
    writer.write_u16(items.len() as u16).await?;
    for item in items {
        write_string(writer, item).await?;
    }
    Ok(())
}

async fn read_list<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<String>, RemoteError> {
    let count = reader.read_u16().await? as usize;
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(read_string(reader).await?);
    }
    Ok(items)
}
