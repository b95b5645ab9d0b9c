use eyre::{
    bail,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};
use url::Url;

/// Video parameters for an encoder configuration created on a cold start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderPreset {
    /// Created configurations are named `<name_prefix>-<epoch millis>`.
    pub name_prefix: String,
    pub width: u32,
    pub height: u32,
    pub framerate: f32,
    /// Kilobits per second.
    pub bitrate: u32,
}

impl Default for EncoderPreset {
    fn default() -> Self {
        Self {
            name_prefix: "record-configuration".to_string(),
            width: 1280,
            height: 720,
            framerate: 30.0,
            bitrate: 2500,
        }
    }
}

impl EncoderPreset {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!("encoder resolution must be non-zero, got {}x{}", self.width, self.height);
        }
        if self.framerate.is_nan() || self.framerate <= 0.0 {
            bail!("encoder framerate must be positive, got {}", self.framerate);
        }
        if self.bitrate == 0 {
            bail!("encoder bitrate must be non-zero");
        }
        if self.name_prefix.trim().is_empty() {
            bail!("encoder name_prefix must not be empty");
        }
        Ok(())
    }
}

/// Where and how the composition API is reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub endpoint: Url,
    pub region: String,
    /// Sent as `Authorization: Bearer …` when set.
    #[serde(default, skip_serializing)]
    pub bearer_token: Option<String>,
    pub timeout_seconds: u64,
}
