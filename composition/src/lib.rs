//! Starts a server-side composition of a stage when a participant begins
//! publishing to it.

#[macro_use]
extern crate tracing;

pub mod event;
pub mod http;
pub mod model;
mod provider;
mod token;
mod trigger;

pub use event::{
    StageEventDetail,
    StageNotification,
    PARTICIPANT_PUBLISHED,
};
pub use http::HttpCompositionProvider;
pub use provider::{
    CompositionProvider,
    ProviderError,
};
pub use token::{
    idempotency_token,
    MAX_IDEMPOTENCY_TOKEN_LEN,
};
pub use trigger::{
    CompositionTrigger,
    SkipReason,
    StartedComposition,
    TriggerOutcome,
    TriggerSettings,
};
