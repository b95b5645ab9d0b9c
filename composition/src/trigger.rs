use crate::{
    event::StageNotification,
    model::{
        ChannelDestinationConfiguration,
        CreateEncoderConfigurationRequest,
        DestinationConfiguration,
        GridConfiguration,
        LayoutConfiguration,
        StartCompositionRequest,
        StartCompositionResponse,
        Video,
    },
    provider::{
        CompositionProvider,
        ProviderError,
    },
    token::idempotency_token,
};
use chrono::{
    DateTime,
    Utc,
};
use derive_more::Display;
use stage_composer_config::{
    Config,
    EncoderPreset,
};

/// The fixed parts of every composition request.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerSettings {
    pub stage_arn: String,
    pub channel_arn: String,
    pub destination_name: String,
    pub featured_participant_attribute: String,
    /// Page size when looking for an existing encoder configuration.
    pub max_encoder_configurations: u32,
    pub encoder: EncoderPreset,
}

impl From<&Config> for TriggerSettings {
    fn from(config: &Config) -> Self {
        Self {
            stage_arn: config.stage_arn.clone(),
            channel_arn: config.channel_arn.clone(),
            destination_name: config.destination_name.clone(),
            featured_participant_attribute: config.featured_participant_attribute.clone(),
            max_encoder_configurations: config.max_encoder_configurations,
            encoder: config.encoder.clone(),
        }
    }
}

/// Why an event was ignored. Ignoring is a successful outcome.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum SkipReason {
    #[display("event is for {}, not the configured stage", resource.as_deref().unwrap_or("no resource"))]
    OtherResource { resource: Option<String> },
    #[display("event {event_name:?} does not start a composition")]
    OtherEvent { event_name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartedComposition {
    pub encoder_configuration_arn: String,
    /// Whether the encoder configuration was created by this invocation.
    pub created_encoder_configuration: bool,
    pub request: StartCompositionRequest,
    pub response: StartCompositionResponse,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    Skipped(SkipReason),
    Started(Box<StartedComposition>),
}

/// Starts composing the configured stage when one of its participants
/// publishes. Holds no state between invocations.
#[derive(Debug, Clone)]
pub struct CompositionTrigger<P> {
    settings: TriggerSettings,
    provider: P,
}

impl<P: CompositionProvider> CompositionTrigger<P> {
    pub fn new(settings: TriggerSettings, provider: P) -> Self {
        Self { settings, provider }
    }

    pub async fn handle(&self, event: &StageNotification) -> Result<TriggerOutcome, ProviderError> {
        self.handle_at(event, Utc::now()).await
    }

    /// Handles `event` as if it arrived at `now`, which names a newly created
    /// encoder configuration and seeds the idempotency token.
    ///
    /// # Errors
    /// Any provider failure is returned unchanged. An encoder configuration
    /// created before the failure is kept.
    #[instrument(level = "info", skip_all, fields(event_id = event.id.as_deref().unwrap_or_default()))]
    pub async fn handle_at(
        &self,
        event: &StageNotification,
        now: DateTime<Utc>,
    ) -> Result<TriggerOutcome, ProviderError> {
        info!(?event, "Received stage event");

        if let Some(reason) = self.filter(event) {
            info!(%reason, "Ignoring stage event");
            return Ok(TriggerOutcome::Skipped(reason));
        }
        let stage_arn = self.settings.stage_arn.as_str();

        let (encoder_configuration_arn, created_encoder_configuration) =
            self.resolve_encoder_configuration(now).await?;
        let idempotency_token = idempotency_token(stage_arn, now);
        info!(%idempotency_token, %encoder_configuration_arn, "Starting composition");

        let request = self.composition_request(stage_arn, idempotency_token, &encoder_configuration_arn);
        let response = self.provider.start_composition(&request).await?;
        info!(?response, "Started composition");

        Ok(TriggerOutcome::Started(Box::new(StartedComposition {
            encoder_configuration_arn,
            created_encoder_configuration,
            request,
            response,
        })))
    }

    fn filter(&self, event: &StageNotification) -> Option<SkipReason> {
        if event.resource() != Some(self.settings.stage_arn.as_str()) {
            return Some(SkipReason::OtherResource {
                resource: event.resource().map(ToString::to_string),
            });
        }
        if !event.is_participant_published() {
            return Some(SkipReason::OtherEvent {
                event_name: event.event_name().to_string(),
            });
        }
        None
    }

    /// Reuses the first listed encoder configuration, whatever its video
    /// settings, and creates one from the preset only when none exist.
    async fn resolve_encoder_configuration(&self, now: DateTime<Utc>) -> Result<(String, bool), ProviderError> {
        let existing = self
            .provider
            .list_encoder_configurations(self.settings.max_encoder_configurations)
            .await?;
        debug!(count = existing.len(), "Listed encoder configurations");

        if let Some(first) = existing.into_iter().next() {
            debug!(arn = %first.arn, "Reusing encoder configuration");
            return Ok((first.arn, false));
        }

        let EncoderPreset {
            name_prefix,
            width,
            height,
            framerate,
            bitrate,
        } = &self.settings.encoder;
        let request = CreateEncoderConfigurationRequest {
            name: format!("{name_prefix}-{}", now.timestamp_millis()),
            video: Video {
                width: *width,
                height: *height,
                framerate: *framerate,
                bitrate: *bitrate,
            },
        };
        let created = self.provider.create_encoder_configuration(&request).await?;
        info!(arn = %created.arn, name = %request.name, "Created encoder configuration");
        Ok((created.arn, true))
    }

    fn composition_request(
        &self,
        stage_arn: &str,
        idempotency_token: String,
        encoder_configuration_arn: &str,
    ) -> StartCompositionRequest {
        StartCompositionRequest {
            stage_arn: stage_arn.to_string(),
            idempotency_token,
            layout: LayoutConfiguration {
                grid: GridConfiguration {
                    featured_participant_attribute: self.settings.featured_participant_attribute.clone(),
                },
            },
            destinations: vec![DestinationConfiguration {
                name: self.settings.destination_name.clone(),
                channel: ChannelDestinationConfiguration {
                    channel_arn: self.settings.channel_arn.clone(),
                    encoder_configuration_arn: encoder_configuration_arn.to_string(),
                },
            }],
        }
    }
}
