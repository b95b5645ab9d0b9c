//! Client side of a real-time stage: joining and leaving, publishing the local
//! camera and microphone, and keeping a roster of the participants whose
//! streams are currently live.

#[macro_use]
extern crate tracing;

mod error;
pub mod media;
pub mod participant;
pub mod platform;
pub mod session;

pub use error::StageError;
pub use media::{
    DeviceSelection,
    MediaAcquisition,
    MediaDevice,
    StageStream,
    StreamId,
    StreamKind,
};
pub use participant::{
    Participant,
    ParticipantId,
    ParticipantRoster,
    ParticipantView,
    RosterChange,
    StreamSet,
};
pub use platform::{
    ParticipantToken,
    RealtimeStage,
    StageEvents,
    StageSession,
};
pub use session::{
    ConnectionState,
    PublishStrategy,
    SessionState,
    StageEvent,
    StageSessionController,
    SubscribeType,
};
