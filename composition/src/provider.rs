use crate::model::{
    CreateEncoderConfigurationRequest,
    EncoderConfiguration,
    EncoderConfigurationSummary,
    StartCompositionRequest,
    StartCompositionResponse,
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("invalid composition API endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("request to the composition API failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("composition API returned {status}: {message}")]
    Api { status: u16, message: String },
}

/// The platform calls the trigger depends on. Any failure is returned as is,
/// there are no partial results.
#[async_trait]
pub trait CompositionProvider: Send + Sync {
    async fn list_encoder_configurations(
        &self,
        max_results: u32,
    ) -> Result<Vec<EncoderConfigurationSummary>, ProviderError>;

    async fn create_encoder_configuration(
        &self,
        request: &CreateEncoderConfigurationRequest,
    ) -> Result<EncoderConfiguration, ProviderError>;

    async fn start_composition(
        &self,
        request: &StartCompositionRequest,
    ) -> Result<StartCompositionResponse, ProviderError>;
}

#[async_trait]
impl<P: CompositionProvider + ?Sized> CompositionProvider for Arc<P> {
    async fn list_encoder_configurations(
        &self,
        max_results: u32,
    ) -> Result<Vec<EncoderConfigurationSummary>, ProviderError> {
        (**self).list_encoder_configurations(max_results).await
    }

    async fn create_encoder_configuration(
        &self,
        request: &CreateEncoderConfigurationRequest,
    ) -> Result<EncoderConfiguration, ProviderError> {
        (**self).create_encoder_configuration(request).await
    }

    async fn start_composition(
        &self,
        request: &StartCompositionRequest,
    ) -> Result<StartCompositionResponse, ProviderError> {
        (**self).start_composition(request).await
    }
}
