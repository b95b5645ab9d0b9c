use crate::StageError;
use async_trait::async_trait;
use derive_more::Display;
use serde::{
    Deserialize,
    Serialize,
};
use strum::{
    EnumIter,
    EnumString,
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StreamKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
pub struct StreamId(String);

impl From<String> for StreamId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for StreamId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A single audio or video track on the stage, local or remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStream {
    pub id: StreamId,
    pub kind: StreamKind,
}

impl StageStream {
    pub fn new(id: impl Into<StreamId>, kind: StreamKind) -> Self {
        Self { id: id.into(), kind }
    }

    pub fn audio(id: impl Into<StreamId>) -> Self {
        Self::new(id, StreamKind::Audio)
    }

    pub fn video(id: impl Into<StreamId>) -> Self {
        Self::new(id, StreamKind::Video)
    }

    pub fn is_audio(&self) -> bool {
        self.kind == StreamKind::Audio
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDevice {
    pub id: String,
    pub kind: StreamKind,
    pub label: String,
}

impl MediaDevice {
    pub fn new(id: impl ToString, kind: StreamKind, label: impl ToString) -> Self {
        Self {
            id: id.to_string(),
            kind,
            label: label.to_string(),
        }
    }
}

/// The camera and microphone used for the next join. `None` lets the platform
/// pick any device of that kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSelection {
    pub video: Option<String>,
    pub audio: Option<String>,
}

impl DeviceSelection {
    pub fn get(&self, kind: StreamKind) -> Option<&str> {
        match kind {
            StreamKind::Audio => self.audio.as_deref(),
            StreamKind::Video => self.video.as_deref(),
        }
    }

    pub fn set(&mut self, kind: StreamKind, device_id: Option<String>) {
        match kind {
            StreamKind::Audio => self.audio = device_id,
            StreamKind::Video => self.video = device_id,
        }
    }

    /// Selects the first enumerated device for every kind that has no selection yet.
    pub fn fill_defaults(&mut self, devices: &[MediaDevice]) {
        for kind in [StreamKind::Video, StreamKind::Audio] {
            if self.get(kind).is_some() {
                continue;
            }
            if let Some(device) = devices.iter().find(|device| device.kind == kind) {
                self.set(kind, Some(device.id.clone()));
            }
        }
    }
}

/// Access to the local cameras and microphones.
#[async_trait]
pub trait MediaAcquisition: Send + Sync {
    async fn enumerate_devices(&self) -> Result<Vec<MediaDevice>, StageError>;

    /// Opens one track of `kind`, from `device_id` if given.
    async fn get_user_media(&self, kind: StreamKind, device_id: Option<&str>) -> Result<StageStream, StageError>;
}
