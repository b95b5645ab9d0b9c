#[derive(thiserror::Error, Debug)]
pub enum StageError {
    /// Permission was denied or no device of the requested kind exists.
    #[error("media device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("stage platform error: {0}")]
    Platform(String),
    /// Media acquisition or the join handshake failed. The session was discarded.
    #[error("failed to join the stage: {0}")]
    JoinFailed(#[source] Box<StageError>),
    /// The platform reported an error while leaving. Only ever logged.
    #[error("failed to leave the stage cleanly: {0}")]
    LeaveBestEffort(#[source] Box<StageError>),
}

impl StageError {
    pub fn device_unavailable(reason: impl ToString) -> Self {
        Self::DeviceUnavailable(reason.to_string())
    }

    pub fn platform(reason: impl ToString) -> Self {
        Self::Platform(reason.to_string())
    }
}
