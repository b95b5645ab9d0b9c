use crate::{
    media::{
        DeviceSelection,
        MediaAcquisition,
        MediaDevice,
        StreamKind,
    },
    participant::{
        ParticipantRoster,
        ParticipantView,
        RosterChange,
    },
    platform::{
        ParticipantToken,
        RealtimeStage,
        StageEvents,
        StageSession,
    },
    StageError,
};
use std::{
    fmt,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
        Weak,
    },
};
use tokio::sync::watch;
use tokio_util::sync::{
    CancellationToken,
    DropGuard,
};

mod messages;
mod state;
mod strategy;

pub use messages::StageEvent;
pub use state::{
    ConnectionState,
    SessionState,
};
pub use strategy::{
    PublishStrategy,
    SubscribeType,
};

/// Owns one stage membership: device defaults, the join/leave lifecycle and
/// the roster of participants with live streams.
///
/// Cloning is cheap and every clone drives the same membership. Actions and
/// notifications never run concurrently with each other on the shared state:
/// every mutation happens inside one short critical section, and no lock is
/// held while a platform call is awaited.
#[derive(Clone)]
pub struct StageSessionController {
    shared: Arc<Shared>,
}

struct Shared {
    media: Arc<dyn MediaAcquisition>,
    stage: Arc<dyn RealtimeStage>,
    inner: Mutex<ControllerInner>,
    state: watch::Sender<SessionState>,
    roster: watch::Sender<ParticipantRoster>,
}

#[derive(Default)]
struct ControllerInner {
    initialized: bool,
    initializing: bool,
    state: SessionState,
    connection_state: ConnectionState,
    selection: DeviceSelection,
    video_devices: Vec<MediaDevice>,
    audio_devices: Vec<MediaDevice>,
    /// Bumped on every join attempt so notifications of a discarded session are dropped.
    generation: u64,
    session: Option<ActiveSession>,
}

struct ActiveSession {
    generation: u64,
    session: Arc<dyn StageSession>,
    /// Set once `StageSession::join` has returned successfully.
    handshake_done: bool,
    /// A failed or dropped connection reported while the handshake was still running.
    lost_during_handshake: Option<ConnectionState>,
    // Stops the notification dispatch task once the session is discarded.
    _dispatch_guard: DropGuard,
}

impl fmt::Debug for StageSessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("StageSessionController")
            .field("initialized", &inner.initialized)
            .field("state", &inner.state)
            .field("connection_state", &inner.connection_state)
            .field("selection", &inner.selection)
            .field("participants", &self.shared.roster.borrow().len())
            .finish()
    }
}

impl StageSessionController {
    pub fn new(media: Arc<dyn MediaAcquisition>, stage: Arc<dyn RealtimeStage>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        let (roster, _) = watch::channel(ParticipantRoster::default());
        Self {
            shared: Arc::new(Shared {
                media,
                stage,
                inner: Default::default(),
                state,
                roster,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerInner> {
        self.shared.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, inner: &mut ControllerInner, next: SessionState) {
        if inner.state == next {
            return;
        }
        debug!(from = %inner.state, to = %next, "session state changed");
        inner.state = next;
        self.shared.state.send_replace(next);
    }

    // Roster writes happen with `inner` held, so the lock order is always inner, then roster.
    fn clear_roster(&self, _inner: &mut ControllerInner) {
        self.shared.roster.send_if_modified(|roster| {
            let modified = !roster.is_empty();
            roster.clear();
            modified
        });
    }

    /// Drops the session, returns to idle and empties the roster.
    fn discard_session(&self, inner: &mut ControllerInner) {
        inner.session = None;
        self.transition(inner, SessionState::Idle);
        self.clear_roster(inner);
    }
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-
// Actions

impl StageSessionController {
    /// Discovers the local devices and selects the first of each kind. Runs once;
    /// later calls return immediately. Missing devices are logged, not fatal.
    #[instrument(level = "debug", skip_all)]
    pub async fn initialize(&self) {
        {
            let mut inner = self.lock();
            if inner.initialized || inner.initializing {
                debug!("Already initialized");
                return;
            }
            inner.initializing = true;
        }

        let devices = match self.shared.media.enumerate_devices().await {
            Ok(devices) => devices,
            Err(err) => {
                error!("Device discovery failed: {err}");
                Vec::new()
            }
        };

        let (video_devices, audio_devices): (Vec<_>, Vec<_>) = devices
            .iter()
            .cloned()
            .partition(|device| device.kind == StreamKind::Video);
        if video_devices.is_empty() {
            error!("No video devices found.");
        }
        if audio_devices.is_empty() {
            error!("No audio devices found.");
        }

        let mut inner = self.lock();
        inner.selection.fill_defaults(&devices);
        info!(
            video = video_devices.len(),
            audio = audio_devices.len(),
            selection = ?inner.selection,
            "Initialized devices"
        );
        inner.video_devices = video_devices;
        inner.audio_devices = audio_devices;
        inner.initializing = false;
        inner.initialized = true;
    }

    /// Chooses the device used by the next join. A live session keeps its devices.
    pub fn select_device(&self, kind: StreamKind, device_id: impl Into<String>) {
        let device_id = device_id.into();
        let mut inner = self.lock();
        if inner.session.is_some() {
            debug!(%kind, %device_id, "Device selection applies from the next join");
        }
        inner.selection.set(kind, Some(device_id));
    }

    /// Acquires the local camera and microphone, creates a session publishing
    /// them and runs the join handshake.
    ///
    /// Does nothing unless the controller is initialized and idle. The state
    /// only becomes [`SessionState::Connected`] once the platform reports the
    /// connection. On failure the session is discarded, the state returns to
    /// [`SessionState::Idle`] and [`StageError::JoinFailed`] is returned; the
    /// join is not retried. A connection reported as errored or disconnected
    /// before it was ever connected counts as a failed join.
    #[instrument(level = "debug", skip_all)]
    pub async fn join(&self, token: ParticipantToken) -> Result<(), StageError> {
        let (selection, generation) = {
            let mut inner = self.lock();
            if !inner.initialized {
                warn!("Cannot join before the controller is initialized");
                return Ok(());
            }
            if inner.state != SessionState::Idle {
                debug!(state = %inner.state, "Already joining or joined");
                return Ok(());
            }
            inner.generation += 1;
            self.transition(&mut inner, SessionState::Connecting);
            (inner.selection.clone(), inner.generation)
        };

        let result = self.connect(&token, &selection, generation).await;

        let mut inner = self.lock();
        let current = inner.generation == generation;
        let err = match result {
            Ok(()) => {
                let Some(active) = inner.session.as_mut().filter(|active| active.generation == generation) else {
                    debug!("Session ended before the join handshake returned");
                    return Ok(());
                };
                active.handshake_done = true;
                match active.lost_during_handshake {
                    None => {
                        info!("Join handshake completed");
                        return Ok(());
                    }
                    Some(connection_state) => {
                        StageError::platform(format!("connection {connection_state} before the stage was joined"))
                    }
                }
            }
            Err(err) => err,
        };

        error!("Failed to join the stage: {err}");
        if current {
            self.discard_session(&mut inner);
        }
        Err(StageError::JoinFailed(Box::new(err)))
    }

    async fn connect(
        &self,
        token: &ParticipantToken,
        selection: &DeviceSelection,
        generation: u64,
    ) -> Result<(), StageError> {
        let media = &self.shared.media;
        let camera = media
            .get_user_media(StreamKind::Video, selection.get(StreamKind::Video))
            .await?;
        debug!(stream = %camera.id, "Acquired local camera");
        let microphone = media
            .get_user_media(StreamKind::Audio, selection.get(StreamKind::Audio))
            .await?;
        debug!(stream = %microphone.id, "Acquired local microphone");

        let strategy = Arc::new(PublishStrategy::publish_local(camera, microphone));
        let (session, events) = self.shared.stage.create_session(token, strategy)?;

        let cancellation_token = CancellationToken::new();
        {
            let mut inner = self.lock();
            inner.session = Some(ActiveSession {
                generation,
                session: session.clone(),
                handshake_done: false,
                lost_during_handshake: None,
                _dispatch_guard: cancellation_token.clone().drop_guard(),
            });
        }
        self.spawn_dispatch(events, cancellation_token, generation);

        session.join().await
    }

    /// Leaves the stage. Does nothing unless connected. The state ends up
    /// [`SessionState::Idle`] even if the platform reports an error, which is
    /// only logged.
    #[instrument(level = "debug", skip_all)]
    pub async fn leave(&self) {
        let session = {
            let mut inner = self.lock();
            if !inner.initialized || inner.state != SessionState::Connected {
                debug!(state = %inner.state, "Not connected, nothing to leave");
                return;
            }
            match inner.session.as_ref() {
                Some(active) => {
                    let session = active.session.clone();
                    self.transition(&mut inner, SessionState::Leaving);
                    Some(session)
                }
                None => None,
            }
        };

        if let Some(session) = session {
            if let Err(err) = session.leave().await {
                let err = StageError::LeaveBestEffort(Box::new(err));
                warn!("{err}");
            }
        }

        self.discard_session(&mut self.lock());
        info!("Left the stage");
    }
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-
// Notifications

impl StageSessionController {
    fn spawn_dispatch(&self, mut events: StageEvents, cancellation_token: CancellationToken, generation: u64) {
        let shared = Arc::downgrade(&self.shared);
        tokio::task::spawn(async move {
            loop {
                let event = tokio::select! {
                    biased;
                    _ = cancellation_token.cancelled() => break,
                    event = events.recv() => match event {
                        Some(event) => event,
                        None => break,
                    },
                };
                let Some(shared) = Weak::upgrade(&shared) else {
                    break;
                };
                StageSessionController { shared }.dispatch(generation, event);
            }
            debug!(generation, "Notification dispatch stopped");
        });
    }

    /// Applies a notification of session `generation` if that session is
    /// still the current one. The check and the update share one critical
    /// section, so a session discarded meanwhile never touches the roster.
    fn dispatch(&self, generation: u64, event: StageEvent) {
        let mut inner = self.lock();
        let current = inner
            .session
            .as_ref()
            .is_some_and(|active| active.generation == generation);
        if !current {
            trace!(generation, %event, "Dropping notification of a discarded session");
            return;
        }
        self.apply(&mut inner, event);
    }

    /// Applies one platform notification, whether or not a session is held.
    /// Each call runs to completion before the next notification is looked at.
    pub fn handle_event(&self, event: StageEvent) {
        self.apply(&mut self.lock(), event);
    }

    fn apply(&self, inner: &mut ControllerInner, event: StageEvent) {
        trace!(%event, "Handling notification");
        match event {
            StageEvent::ConnectionStateChanged(connection_state) => self.on_connection_state(inner, connection_state),
            StageEvent::StreamsAdded(participant, streams) => {
                let id = participant.id.clone();
                let change = self.update_roster(inner, |roster| roster.streams_added(participant, streams));
                debug!(participant = %id, %change, "Participant media added");
            }
            StageEvent::StreamsRemoved(participant, streams) => {
                let change = self.update_roster(inner, |roster| roster.streams_removed(&participant, &streams));
                debug!(participant = %participant.id, %change, "Participant media removed");
            }
        }
    }

    fn update_roster(
        &self,
        _inner: &mut ControllerInner,
        update: impl FnOnce(&mut ParticipantRoster) -> RosterChange,
    ) -> RosterChange {
        let mut change = RosterChange::Unchanged;
        self.shared.roster.send_if_modified(|roster| {
            change = update(roster);
            change.is_modified()
        });
        change
    }

    fn on_connection_state(&self, inner: &mut ControllerInner, connection_state: ConnectionState) {
        inner.connection_state = connection_state;
        match (connection_state, inner.state) {
            (ConnectionState::Connected, SessionState::Connecting | SessionState::Connected) => {
                if let Some(active) = inner.session.as_mut() {
                    active.lost_during_handshake = None;
                }
                self.transition(inner, SessionState::Connected);
            }
            (ConnectionState::Connected, state) => {
                debug!(%state, "Ignoring connected notification");
            }
            (ConnectionState::Connecting, state) => {
                if let Some(active) = inner.session.as_mut() {
                    active.lost_during_handshake = None;
                }
                debug!(%state, "Platform is connecting");
            }
            (connection_state, SessionState::Connected) => {
                warn!(%connection_state, "Lost the stage connection");
                self.discard_session(inner);
            }
            (connection_state, SessionState::Connecting) => {
                let handshake_done = inner.session.as_ref().map(|active| active.handshake_done);
                match handshake_done {
                    Some(true) => {
                        warn!(%connection_state, "Connection failed before the stage was joined");
                        self.discard_session(inner);
                    }
                    Some(false) => {
                        debug!(%connection_state, "Connection failed during the join handshake");
                        if let Some(active) = inner.session.as_mut() {
                            active.lost_during_handshake = Some(connection_state);
                        }
                    }
                    None => debug!(%connection_state, "Connection state changed without a session"),
                }
            }
            (connection_state, state) => {
                debug!(%connection_state, %state, "Connection state changed");
            }
        }
    }
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-
// Queries

impl StageSessionController {
    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Last connection state reported by the platform.
    pub fn connection_state(&self) -> ConnectionState {
        self.lock().connection_state
    }

    /// True while a session object is held, i.e. between a started join and
    /// the end of leave or a failed join.
    pub fn has_session(&self) -> bool {
        self.lock().session.is_some()
    }

    pub fn device_selection(&self) -> DeviceSelection {
        self.lock().selection.clone()
    }

    pub fn devices(&self, kind: StreamKind) -> Vec<MediaDevice> {
        let inner = self.lock();
        match kind {
            StreamKind::Audio => inner.audio_devices.clone(),
            StreamKind::Video => inner.video_devices.clone(),
        }
    }

    pub fn roster(&self) -> ParticipantRoster {
        self.shared.roster.borrow().clone()
    }

    pub fn subscribe_roster(&self) -> watch::Receiver<ParticipantRoster> {
        self.shared.roster.subscribe()
    }

    /// Streams to hand to playback for every participant, without the local
    /// participant's own audio.
    pub fn render_projection(&self) -> Vec<ParticipantView> {
        self.shared.roster.borrow().render_projection()
    }
}
