//! Server listener events.

use crate::SynchronizeStatus;

/// Everything the editor can observe about remote clients, dispatched
/// through one callback slot instead of a listener interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    ClientConnected {
        name: String,
        address: String,
    },
    ClientSynchronizing {
        name: String,
        status: SynchronizeStatus,
        message: String,
    },
    RunStatusChanged {
        name: String,
        running: bool,
    },
    ClientDisconnected {
        name: String,
    },
}

/// Callback invoked for every [`ServerEvent`].
pub type OnEventFn = Box<dyn Fn(ServerEvent) + Send + Sync + 'static>;
