use async_trait::async_trait;
use chrono::{
    DateTime,
    TimeZone as _,
    Utc,
};
use pretty_assertions::assert_eq;
use stage_composer_config::EncoderPreset;
use stage_composition::{
    model::{
        CreateEncoderConfigurationRequest,
        EncoderConfiguration,
        EncoderConfigurationSummary,
        StartCompositionRequest,
        StartCompositionResponse,
        Video,
    },
    CompositionProvider,
    CompositionTrigger,
    ProviderError,
    SkipReason,
    StageNotification,
    TriggerOutcome,
    TriggerSettings,
    MAX_IDEMPOTENCY_TOKEN_LEN,
};
use std::sync::{
    Arc,
    Mutex,
};

const STAGE_ARN: &str = "arn:aws:ivs:us-west-2:123456789012:stage/AbCdEf";
const CHANNEL_ARN: &str = "arn:aws:ivs:us-west-2:123456789012:channel/GhIjKl";
const CREATED_ARN: &str = "arn:aws:ivs:us-west-2:123456789012:encoder-configuration/created";

#[derive(Debug, Clone, PartialEq)]
enum Call {
    List(u32),
    Create(CreateEncoderConfigurationRequest),
    Start(StartCompositionRequest),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FailAt {
    Nothing,
    List,
    Create,
    Start,
}

#[derive(Debug)]
struct RecordingProvider {
    existing: Vec<EncoderConfigurationSummary>,
    fail_at: FailAt,
    calls: Mutex<Vec<Call>>,
}

impl RecordingProvider {
    fn new(existing: &[&str]) -> Arc<Self> {
        Self::failing(existing, FailAt::Nothing)
    }

    fn failing(existing: &[&str], fail_at: FailAt) -> Arc<Self> {
        Arc::new(Self {
            existing: existing
                .iter()
                .map(|arn| EncoderConfigurationSummary {
                    arn: arn.to_string(),
                    name: None,
                })
                .collect(),
            fail_at,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call, step: FailAt) -> Result<(), ProviderError> {
        self.calls.lock().unwrap().push(call);
        if self.fail_at == step {
            return Err(ProviderError::Api {
                status: 500,
                message: format!("{step:?} failed"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CompositionProvider for RecordingProvider {
    async fn list_encoder_configurations(
        &self,
        max_results: u32,
    ) -> Result<Vec<EncoderConfigurationSummary>, ProviderError> {
        self.record(Call::List(max_results), FailAt::List)?;
        Ok(self.existing.clone())
    }

    async fn create_encoder_configuration(
        &self,
        request: &CreateEncoderConfigurationRequest,
    ) -> Result<EncoderConfiguration, ProviderError> {
        self.record(Call::Create(request.clone()), FailAt::Create)?;
        Ok(EncoderConfiguration {
            arn: CREATED_ARN.to_string(),
            name: Some(request.name.clone()),
            video: Some(request.video.clone()),
        })
    }

    async fn start_composition(
        &self,
        request: &StartCompositionRequest,
    ) -> Result<StartCompositionResponse, ProviderError> {
        self.record(Call::Start(request.clone()), FailAt::Start)?;
        Ok(StartCompositionResponse::default())
    }
}

fn settings() -> TriggerSettings {
    TriggerSettings {
        stage_arn: STAGE_ARN.to_string(),
        channel_arn: CHANNEL_ARN.to_string(),
        destination_name: "stage-channel-destination".to_string(),
        featured_participant_attribute: "isFeature".to_string(),
        max_encoder_configurations: 100,
        encoder: EncoderPreset::default(),
    }
}

fn trigger(provider: &Arc<RecordingProvider>) -> CompositionTrigger<Arc<RecordingProvider>> {
    CompositionTrigger::new(settings(), Arc::clone(provider))
}

fn notification(resource: &str, event_name: &str) -> StageNotification {
    serde_json::from_value(serde_json::json!({
        "id": "12345678-1a23-4567-a1bc-1a2b34567890",
        "detail-type": "IVS Stage Update",
        "source": "aws.ivs",
        "resources": [resource],
        "detail": {
            "session_id": "st-ZyXwVu",
            "event_name": event_name,
            "participant_id": "xYz1c2d3e4f",
        },
    }))
    .unwrap()
}

fn published() -> StageNotification {
    notification(STAGE_ARN, "Participant Published")
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, 18, 2, 11).unwrap()
}

fn expect_started(outcome: TriggerOutcome) -> stage_composition::StartedComposition {
    match outcome {
        TriggerOutcome::Started(started) => *started,
        TriggerOutcome::Skipped(reason) => panic!("expected a composition, skipped: {reason}"),
    }
}

#[tokio::test]
async fn other_stage_is_ignored() {
    let provider = RecordingProvider::new(&[]);
    let event = notification("arn:aws:ivs:us-west-2:123456789012:stage/Other", "Participant Published");

    let outcome = trigger(&provider).handle_at(&event, now()).await.unwrap();

    assert!(matches!(outcome, TriggerOutcome::Skipped(SkipReason::OtherResource { .. })));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn other_events_are_ignored() {
    let provider = RecordingProvider::new(&[]);

    for event_name in ["Participant Joined", "Participant Unpublished", "Participant Left"] {
        let outcome = trigger(&provider)
            .handle_at(&notification(STAGE_ARN, event_name), now())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            TriggerOutcome::Skipped(SkipReason::OtherEvent {
                event_name: event_name.to_string()
            })
        );
    }
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn event_without_resources_is_ignored() {
    let provider = RecordingProvider::new(&[]);
    let event: StageNotification =
        serde_json::from_str(r#"{"resources": [], "detail": {"event_name": "Participant Published"}}"#).unwrap();

    let outcome = trigger(&provider).handle_at(&event, now()).await.unwrap();

    assert_eq!(outcome, TriggerOutcome::Skipped(SkipReason::OtherResource { resource: None }));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn cold_start_creates_one_encoder_configuration() {
    let provider = RecordingProvider::new(&[]);

    let started = expect_started(trigger(&provider).handle_at(&published(), now()).await.unwrap());

    let expected_create = CreateEncoderConfigurationRequest {
        name: format!("record-configuration-{}", now().timestamp_millis()),
        video: Video {
            width: 1280,
            height: 720,
            framerate: 30.0,
            bitrate: 2500,
        },
    };
    let calls = provider.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], Call::List(100));
    assert_eq!(calls[1], Call::Create(expected_create));
    assert!(started.created_encoder_configuration);
    assert_eq!(started.encoder_configuration_arn, CREATED_ARN);
    assert_eq!(started.request.destinations[0].channel.encoder_configuration_arn, CREATED_ARN);
}

#[tokio::test]
async fn existing_encoder_configuration_is_reused() {
    let first = "arn:aws:ivs:us-west-2:123456789012:encoder-configuration/first";
    let second = "arn:aws:ivs:us-west-2:123456789012:encoder-configuration/second";
    let provider = RecordingProvider::new(&[first, second]);

    let started = expect_started(trigger(&provider).handle_at(&published(), now()).await.unwrap());

    let calls = provider.calls();
    assert_eq!(calls.len(), 2);
    assert!(!calls.iter().any(|call| matches!(call, Call::Create(_))));
    assert!(!started.created_encoder_configuration);
    assert_eq!(started.encoder_configuration_arn, first);
}

#[tokio::test]
async fn starts_grid_composition_to_the_channel() {
    let provider = RecordingProvider::new(&[CREATED_ARN]);

    let started = expect_started(trigger(&provider).handle_at(&published(), now()).await.unwrap());

    let Some(Call::Start(request)) = provider.calls().pop() else {
        panic!("composition was not started");
    };
    assert_eq!(request, started.request);
    assert_eq!(request.stage_arn, STAGE_ARN);
    assert_eq!(request.idempotency_token, "arnawsivsus-west-2123456789012stageAbCdEf-1709661731000");
    assert_eq!(request.layout.grid.featured_participant_attribute, "isFeature");
    assert_eq!(request.destinations.len(), 1);
    assert_eq!(request.destinations[0].name, "stage-channel-destination");
    assert_eq!(request.destinations[0].channel.channel_arn, CHANNEL_ARN);
    assert_eq!(request.destinations[0].channel.encoder_configuration_arn, CREATED_ARN);
}

#[tokio::test]
async fn idempotency_token_is_api_safe_for_long_arns() {
    let stage_arn = format!("arn:aws:ivs:us-west-2:123456789012:stage/{}", "a".repeat(48));
    let provider = RecordingProvider::new(&[CREATED_ARN]);
    let trigger = CompositionTrigger::new(
        TriggerSettings {
            stage_arn: stage_arn.clone(),
            ..settings()
        },
        Arc::clone(&provider),
    );

    let started = expect_started(
        trigger
            .handle_at(&notification(&stage_arn, "Participant Published"), now())
            .await
            .unwrap(),
    );

    let token = &started.request.idempotency_token;
    assert_eq!(token.len(), MAX_IDEMPOTENCY_TOKEN_LEN);
    assert!(!token.contains(':'));
    assert!(!token.contains('/'));
}

#[tokio::test]
async fn list_failure_stops_the_invocation() {
    let provider = RecordingProvider::failing(&[], FailAt::List);

    let error = trigger(&provider).handle_at(&published(), now()).await.unwrap_err();

    assert!(matches!(error, ProviderError::Api { status: 500, .. }));
    assert_eq!(provider.calls(), vec![Call::List(100)]);
}

#[tokio::test]
async fn create_failure_does_not_start_a_composition() {
    let provider = RecordingProvider::failing(&[], FailAt::Create);

    let error = trigger(&provider).handle_at(&published(), now()).await.unwrap_err();

    assert!(matches!(error, ProviderError::Api { .. }));
    assert!(!provider.calls().iter().any(|call| matches!(call, Call::Start(_))));
}

#[tokio::test]
async fn start_failure_is_returned() {
    let provider = RecordingProvider::failing(&[], FailAt::Start);

    let error = trigger(&provider).handle_at(&published(), now()).await.unwrap_err();

    assert_eq!(error.to_string(), "composition API returned 500: Start failed");
    assert_eq!(provider.calls().len(), 3);
}
