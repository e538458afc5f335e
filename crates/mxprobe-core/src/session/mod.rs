//! Connection role tracking across race sessions.

mod poller;
mod role;
mod tracker;

pub use poller::Poller;
pub use role::{ConnectionDescriptor, ConnectionRole, UNKNOWN_LABEL, UNKNOWN_SERVER_NAME};
pub use tracker::SessionTracker;
