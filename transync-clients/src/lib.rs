//! Adapters behind the engine's ports.
//!
//! - [`runbot`]: CI registry over Odoo JSON-RPC
//! - [`weblate`]: translation platform REST API
//! - [`process`]: administrative commands as local or `docker exec` processes

pub mod process;
pub mod runbot;
pub mod weblate;

pub use process::ProcessExecutor;
pub use runbot::RunbotClient;
pub use weblate::{WeblateClient, WeblateConnector};

/// Map a `ureq` failure onto the engine's port error.
pub(crate) fn http_err(endpoint: &str, err: ureq::Error) -> transync_sync::PortError {
    match err {
        ureq::Error::Status(status, _) => transync_sync::PortError::Status {
            endpoint: endpoint.to_string(),
            status,
        },
        ureq::Error::Transport(transport) => transync_sync::PortError::Transport {
            endpoint: endpoint.to_string(),
            message: transport.to_string(),
        },
    }
}
