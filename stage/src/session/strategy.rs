use crate::{
    media::StageStream,
    participant::Participant,
};
use strum::Display;

/// Which media of a remote participant to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SubscribeType {
    None,
    AudioOnly,
    AudioVideo,
}

/// What the session publishes and subscribes to. Built once per join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishStrategy {
    streams_to_publish: Vec<StageStream>,
    should_publish: bool,
    subscribe: SubscribeType,
}

impl PublishStrategy {
    /// Publish the local camera and microphone and receive everyone's audio and video.
    pub fn publish_local(camera: StageStream, microphone: StageStream) -> Self {
        Self {
            streams_to_publish: vec![camera, microphone],
            should_publish: true,
            subscribe: SubscribeType::AudioVideo,
        }
    }

    pub fn stage_streams_to_publish(&self) -> &[StageStream] {
        &self.streams_to_publish
    }

    pub fn should_publish_participant(&self, _participant: &Participant) -> bool {
        self.should_publish
    }

    pub fn should_subscribe_to_participant(&self, _participant: &Participant) -> SubscribeType {
        self.subscribe
    }
}
