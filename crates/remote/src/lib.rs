//! Remote test-run server.
//!
//! Network counterpart of the local test runner: instead of spawning a
//! child process, a physically separate runner machine connects over
//! TCP, announces its launch profiles, synchronizes the project data
//! through the same exclusion-filtered VFS rules as archive building,
//! and streams run status and log lines back. The editor observes
//! everything through one [`ServerEvent`] callback slot and per-client
//! [`RemoteClient`] session handles.

mod client;
mod error;
mod event;
mod files;
mod server;
mod wire;

pub use client::{RemoteClient, SynchronizeStatus};
pub use error::RemoteError;
pub use event::{OnEventFn, ServerEvent};
pub use files::{DirectoryListing, FileServicer};
pub use server::{RemoteServer, ServerConfig};
pub use wire::{ClientMessage, ServerCommand};
