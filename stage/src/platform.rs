//! The real-time stage platform the controller drives.

use crate::{
    session::{
        PublishStrategy,
        StageEvent,
    },
    StageError,
};
use async_trait::async_trait;
use derive_more::Debug;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Notifications of one session, delivered in order.
pub type StageEvents = UnboundedReceiver<StageEvent>;

/// Credential that binds a session to one participant on one stage.
#[derive(Clone, Debug, PartialEq, Eq)]
#[debug("ParticipantToken(..)")]
pub struct ParticipantToken(String);

impl ParticipantToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for ParticipantToken {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

pub trait RealtimeStage: Send + Sync {
    /// Creates a session that is not joined yet, together with the channel its
    /// connection and stream notifications arrive on.
    fn create_session(
        &self,
        token: &ParticipantToken,
        strategy: Arc<PublishStrategy>,
    ) -> Result<(Arc<dyn StageSession>, StageEvents), StageError>;
}

#[async_trait]
pub trait StageSession: Send + Sync {
    async fn join(&self) -> Result<(), StageError>;

    async fn leave(&self) -> Result<(), StageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_redacted_in_debug_output() {
        let token = ParticipantToken::new("eyJhbGciOiJLTVMiLCJ0eXAiOiJKV1QifQ");
        assert_eq!(format!("{token:?}"), "ParticipantToken(..)");
        assert_eq!(token.as_str(), "eyJhbGciOiJLTVMiLCJ0eXAiOiJKV1QifQ");
    }
}
