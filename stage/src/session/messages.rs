use super::ConnectionState;
use crate::{
    media::StageStream,
    participant::Participant,
};
use derive_more::Display;

/// Notifications a session emits, dispatched to the controller one at a time.
#[derive(Debug, Clone, Display)]
pub enum StageEvent {
    #[display("ConnectionStateChanged({_0})")]
    ConnectionStateChanged(ConnectionState),
    #[display("StreamsAdded({}, {} streams)", _0.id, _1.len())]
    StreamsAdded(Participant, Vec<StageStream>),
    #[display("StreamsRemoved({}, {} streams)", _0.id, _1.len())]
    StreamsRemoved(Participant, Vec<StageStream>),
}
