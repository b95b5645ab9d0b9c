//! [`CompositionProvider`] over the composition API's JSON endpoints.

use crate::{
    model::{
        CreateEncoderConfigurationRequest,
        CreateEncoderConfigurationResponse,
        EncoderConfiguration,
        EncoderConfigurationSummary,
        ListEncoderConfigurationsRequest,
        ListEncoderConfigurationsResponse,
        StartCompositionRequest,
        StartCompositionResponse,
    },
    provider::{
        CompositionProvider,
        ProviderError,
    },
};
use async_trait::async_trait;
use serde::{
    de::DeserializeOwned,
    Deserialize,
    Serialize,
};
use stage_composer_config::ProviderConfig;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpCompositionProvider {
    client: reqwest::Client,
    endpoint: Url,
    region: String,
    bearer_token: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(alias = "Message")]
    message: String,
}

impl HttpCompositionProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        // Without the trailing slash `join` would replace the last path segment.
        let mut endpoint = config.endpoint.clone();
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        Ok(Self {
            client,
            endpoint,
            region: config.region.clone(),
            bearer_token: config.bearer_token.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[instrument(level = "debug", skip(self, body), fields(region = %self.region))]
    async fn post<Req, Res>(&self, operation: &str, body: &Req) -> Result<Res, ProviderError>
    where
        Req: Serialize + Sync + ?Sized,
        Res: DeserializeOwned,
    {
        let url = self.endpoint.join(operation)?;
        let mut request = self.client.post(url).json(body);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|body| body.message)
                .unwrap_or(text);
            warn!(%status, %message, "Composition API rejected {operation}");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CompositionProvider for HttpCompositionProvider {
    async fn list_encoder_configurations(
        &self,
        max_results: u32,
    ) -> Result<Vec<EncoderConfigurationSummary>, ProviderError> {
        let request = ListEncoderConfigurationsRequest {
            max_results,
            next_token: None,
        };
        let response: ListEncoderConfigurationsResponse = self.post("ListEncoderConfigurations", &request).await?;
        Ok(response.encoder_configurations)
    }

    async fn create_encoder_configuration(
        &self,
        request: &CreateEncoderConfigurationRequest,
    ) -> Result<EncoderConfiguration, ProviderError> {
        let response: CreateEncoderConfigurationResponse = self.post("CreateEncoderConfiguration", request).await?;
        Ok(response.encoder_configuration)
    }

    async fn start_composition(
        &self,
        request: &StartCompositionRequest,
    ) -> Result<StartCompositionResponse, ProviderError> {
        self.post("StartComposition", request).await
    }
}
