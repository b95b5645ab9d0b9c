use serde::{
    Deserialize,
    Serialize,
};
use strum::Display;

/// Where the controller is in its join/leave lifecycle.
///
/// `Idle --join--> Connecting --CONNECTED--> Connected --leave--> Leaving --> Idle`.
/// A failed join, or a connection lost before `Connected`, goes from
/// `Connecting` straight back to `Idle`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Leaving,
}

/// Connection state as reported by the platform.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Errored,
}
