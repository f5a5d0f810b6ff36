//! Game simulation modules

pub mod collision;
pub mod entity;
pub mod item;
pub mod monster;
pub mod player;
pub mod sim;
pub mod snapshot;
pub mod world;

pub use world::World;

use tracing::{debug, warn};

use crate::hub::ConnHandle;
use crate::ws::protocol::ServerMsg;

/// Encode a notification and post it onto one connection's egress queue.
///
/// Never blocks: a full queue drops the notification, a closed queue means
/// the connection is already being torn down.
pub(crate) fn send_to(conn: &ConnHandle, msg: &ServerMsg) {
    let text = match serde_json::to_string(msg) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "failed to encode notification");
            return;
        }
    };
    use tokio::sync::mpsc::error::TrySendError;
    match conn.try_send(text) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            debug!(conn_id = conn.id(), "egress queue full, notification dropped");
        }
        Err(TrySendError::Closed(_)) => {}
    }
}
