use crate::media::StageStream;
use derive_more::Display;
use serde::{
    Deserialize,
    Serialize,
};

mod roster;

pub use roster::{
    ParticipantRoster,
    RosterChange,
    StreamSet,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
pub struct ParticipantId(String);

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A member of the stage as reported by the platform. Does not change while
/// the participant stays on the stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub is_local: bool,
    pub user_id: String,
}

impl Participant {
    pub fn remote(id: impl Into<ParticipantId>, user_id: impl ToString) -> Self {
        Self {
            id: id.into(),
            is_local: false,
            user_id: user_id.to_string(),
        }
    }

    pub fn local(id: impl Into<ParticipantId>, user_id: impl ToString) -> Self {
        Self {
            is_local: true,
            ..Self::remote(id, user_id)
        }
    }
}

/// What the video grid shows for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantView {
    pub participant: Participant,
    /// Shown next to the video, the participant's user id.
    pub label: String,
    pub streams: Vec<StageStream>,
}
