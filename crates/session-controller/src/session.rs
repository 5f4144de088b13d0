//! `SessionController` - one client participation in a real-time room.
//!
//! Each `SessionController`:
//! - Fetches exactly one caller credential before any connect attempt
//! - Connects with the fetched `(token, ws_url)` pair verbatim
//! - Publishes its state and the remote participant set through watch channels
//! - Serves microphone and invite commands while Active
//!
//! # Lifecycle
//!
//! ```text
//! Unconnected -> Connecting -> Active -> Terminated
//!                    |
//!                    +-> Failed
//! ```
//!
//! Cancelling the token while Connecting drops the in-flight fetch or
//! connect and leaves the published state untouched. Cancelling while
//! Active disconnects from the room and ends in Terminated.

use crate::automation::{AgentInviter, AutomationClient};
use crate::config::ControllerConfig;
use crate::errors::ControllerError;
use crate::issuer_client::{CredentialSource, IssuerClient};
use crate::participants::ParticipantSet;
use crate::realtime::{LocalParticipantControl, RealtimeService, RemoteParticipant, RoomEvent};
use crate::view::SessionView;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Command mailbox size. Commands are user-driven, so this stays small.
const SESSION_CHANNEL_BUFFER: usize = 16;

/// Details of an Active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    /// Identity of the local participant.
    pub local_identity: String,
    /// Real-time endpoint the session is connected to.
    pub ws_url: String,
    /// Whether the local microphone is published.
    pub microphone_enabled: bool,
}

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Not started.
    #[default]
    Unconnected,
    /// Fetching a credential or connecting to the room.
    Connecting,
    /// Joined.
    Active(ActiveSession),
    /// The room connection ended.
    Terminated,
    /// Connecting failed. Absorbing.
    Failed(String),
}

impl SessionState {
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active(_))
    }

    /// Terminated or Failed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, SessionState::Terminated | SessionState::Failed(_))
    }
}

/// Messages handled by the controller task.
#[derive(Debug)]
enum SessionMessage {
    ToggleMicrophone {
        respond_to: oneshot::Sender<Result<bool, ControllerError>>,
    },
    InviteAgent {
        respond_to: oneshot::Sender<Result<(), ControllerError>>,
    },
}

/// Collaborators of a session.
#[derive(Clone)]
pub struct SessionDeps {
    pub credentials: Arc<dyn CredentialSource>,
    pub realtime: Arc<dyn RealtimeService>,
    pub inviter: Arc<dyn AgentInviter>,
}

/// Handle to a `SessionController`.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionMessage>,
    cancel_token: CancellationToken,
    state: watch::Receiver<SessionState>,
    participants: watch::Receiver<Vec<RemoteParticipant>>,
}

impl SessionHandle {
    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    ///
    /// The receiver starts with the current state marked as seen, so its
    /// first `changed()` resolves on the next transition.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        let mut receiver = self.state.clone();
        receiver.mark_unchanged();
        receiver
    }

    /// Subscribe to remote participant snapshots, sorted by identity.
    #[must_use]
    pub fn subscribe_participants(&self) -> watch::Receiver<Vec<RemoteParticipant>> {
        let mut receiver = self.participants.clone();
        receiver.mark_unchanged();
        receiver
    }

    /// Current remote participants, sorted by identity.
    #[must_use]
    pub fn participants(&self) -> Vec<RemoteParticipant> {
        self.participants.borrow().clone()
    }

    /// Render view for the current state.
    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView::render(&self.state.borrow(), &self.participants.borrow())
    }

    /// Wait until the state satisfies `predicate` and return it.
    ///
    /// # Errors
    ///
    /// Returns `ControllerStopped` if the controller exits first.
    pub async fn wait_for_state(
        &self,
        predicate: impl FnMut(&SessionState) -> bool,
    ) -> Result<SessionState, ControllerError> {
        let mut receiver = self.state.clone();
        let state = receiver
            .wait_for(predicate)
            .await
            .map_err(|_| ControllerError::ControllerStopped)?;
        Ok(state.clone())
    }

    /// Flip the local microphone. Returns the new enabled state.
    ///
    /// # Errors
    ///
    /// - `NotActive` unless the session is Active
    /// - `Realtime` if the real-time service refuses
    pub async fn toggle_microphone(&self) -> Result<bool, ControllerError> {
        self.require_active()?;
        let (tx, rx) = oneshot::channel();
        self.send(SessionMessage::ToggleMicrophone { respond_to: tx })
            .await?;
        rx.await.map_err(|_| ControllerError::ControllerStopped)?
    }

    /// Invite one automated participant.
    ///
    /// Returns once the invite is dispatched. The outcome of the request
    /// is only logged and never changes the session.
    ///
    /// # Errors
    ///
    /// Returns `NotActive` unless the session is Active.
    pub async fn invite_agent(&self) -> Result<(), ControllerError> {
        self.require_active()?;
        let (tx, rx) = oneshot::channel();
        self.send(SessionMessage::InviteAgent { respond_to: tx })
            .await?;
        rx.await.map_err(|_| ControllerError::ControllerStopped)?
    }

    /// Tear the session down.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the session has been torn down.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    fn require_active(&self) -> Result<(), ControllerError> {
        if self.state.borrow().is_active() {
            Ok(())
        } else {
            Err(ControllerError::NotActive)
        }
    }

    async fn send(&self, message: SessionMessage) -> Result<(), ControllerError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| ControllerError::ControllerStopped)
    }
}

/// What ended the Connecting phase early.
enum Interrupted {
    Cancelled,
    HandlesDropped,
}

/// The `SessionController` implementation.
pub struct SessionController {
    deps: SessionDeps,
    agent_type: String,
    receiver: mpsc::Receiver<SessionMessage>,
    cancel_token: CancellationToken,
    state: watch::Sender<SessionState>,
    participants: watch::Sender<Vec<RemoteParticipant>>,
}

impl SessionController {
    /// Spawn a new session controller. The session starts immediately.
    ///
    /// Returns a handle and the task join handle.
    pub fn spawn(
        deps: SessionDeps,
        agent_type: String,
        cancel_token: CancellationToken,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(SESSION_CHANNEL_BUFFER);
        let (state_tx, state_rx) = watch::channel(SessionState::Unconnected);
        let (participants_tx, participants_rx) = watch::channel(Vec::new());

        let controller = Self {
            deps,
            agent_type,
            receiver,
            cancel_token: cancel_token.clone(),
            state: state_tx,
            participants: participants_tx,
        };

        let task_handle = tokio::spawn(controller.run());

        let handle = SessionHandle {
            sender,
            cancel_token,
            state: state_rx,
            participants: participants_rx,
        };

        (handle, task_handle)
    }

    /// Spawn a session wired to the HTTP issuer and automation clients.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Config` if an HTTP client cannot be built.
    pub fn spawn_with_config(
        config: &ControllerConfig,
        realtime: Arc<dyn RealtimeService>,
        cancel_token: CancellationToken,
    ) -> Result<(SessionHandle, JoinHandle<()>), ControllerError> {
        let issuer = IssuerClient::new(config.issuer_url.clone(), config.request_timeout)?;
        let automation =
            AutomationClient::new(config.automation_url.clone(), config.request_timeout)?;

        let deps = SessionDeps {
            credentials: Arc::new(issuer),
            realtime,
            inviter: Arc::new(automation),
        };

        Ok(Self::spawn(deps, config.agent_type.clone(), cancel_token))
    }

    /// Run the session.
    #[instrument(skip_all, name = "sc.session", fields(agent_type = %self.agent_type))]
    async fn run(mut self) {
        self.state.send_replace(SessionState::Connecting);
        debug!(target: "sc.session", "Session connecting");

        let credentials = Arc::clone(&self.deps.credentials);
        let fetched = self.while_connecting(credentials.fetch_credential()).await;

        // A fetch that resolved alongside teardown is discarded unseen
        if self.cancel_token.is_cancelled() {
            return Self::log_interrupted(&Interrupted::Cancelled, "credential fetch");
        }

        let credential = match fetched {
            Ok(Ok(credential)) => credential,
            Ok(Err(e)) => return self.fail(e),
            Err(interrupted) => return Self::log_interrupted(&interrupted, "credential fetch"),
        };

        let realtime = Arc::clone(&self.deps.realtime);
        let connected = self
            .while_connecting(realtime.connect(&credential.ws_url, &credential.token))
            .await;

        let connection = match connected {
            Ok(Ok(connection)) => connection,
            Ok(Err(_)) if self.cancel_token.is_cancelled() => {
                return Self::log_interrupted(&Interrupted::Cancelled, "room connect");
            }
            Ok(Err(e)) => return self.fail(e),
            Err(interrupted) => return Self::log_interrupted(&interrupted, "room connect"),
        };

        // Torn down in the same poll the connect resolved
        if self.cancel_token.is_cancelled() {
            connection.local.disconnect().await;
            debug!(target: "sc.session", "Closed connection that resolved after teardown");
            return;
        }

        let mut participants =
            ParticipantSet::new(&connection.local_identity, connection.participants);
        let mut events = connection.events;
        let local = connection.local;

        self.participants.send_replace(participants.snapshot());
        self.state.send_replace(SessionState::Active(ActiveSession {
            local_identity: connection.local_identity,
            ws_url: credential.ws_url.clone(),
            microphone_enabled: connection.microphone_enabled,
        }));

        info!(
            target: "sc.session",
            remote_participants = participants.len(),
            "Session active"
        );

        self.run_active(&mut participants, &mut events, local.as_ref())
            .await;

        participants.clear();
        self.participants.send_replace(Vec::new());
        self.state.send_replace(SessionState::Terminated);

        // The credential is only valid for this session
        drop(credential);

        info!(target: "sc.session", "Session terminated");
    }

    /// Active loop. Returns when the room connection has ended.
    async fn run_active(
        &mut self,
        participants: &mut ParticipantSet,
        events: &mut mpsc::Receiver<RoomEvent>,
        local: &dyn LocalParticipantControl,
    ) {
        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    debug!(target: "sc.session", "Session torn down while active");
                    local.disconnect().await;
                    return;
                }

                event = events.recv() => {
                    match event {
                        Some(RoomEvent::Disconnected { reason }) => {
                            info!(target: "sc.session", reason = %reason, "Room disconnected");
                            return;
                        }
                        Some(event) => {
                            if participants.apply(&event) {
                                self.participants.send_replace(participants.snapshot());
                            }
                        }
                        None => {
                            info!(target: "sc.session", "Room event stream ended");
                            return;
                        }
                    }
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => self.handle_active(message, local).await,
                        None => {
                            debug!(target: "sc.session", "All session handles dropped, leaving room");
                            local.disconnect().await;
                            return;
                        }
                    }
                }
            }
        }
    }

    async fn handle_active(&mut self, message: SessionMessage, local: &dyn LocalParticipantControl) {
        match message {
            SessionMessage::ToggleMicrophone { respond_to } => {
                let current = match &*self.state.borrow() {
                    SessionState::Active(active) => active.microphone_enabled,
                    _ => {
                        let _ = respond_to.send(Err(ControllerError::NotActive));
                        return;
                    }
                };

                let enabled = !current;
                let result = local.set_microphone_enabled(enabled).await;
                if result.is_ok() {
                    self.state.send_modify(|state| {
                        if let SessionState::Active(active) = state {
                            active.microphone_enabled = enabled;
                        }
                    });
                    debug!(target: "sc.session", enabled, "Microphone toggled");
                }
                let _ = respond_to.send(result.map(|()| enabled));
            }

            SessionMessage::InviteAgent { respond_to } => {
                let inviter = Arc::clone(&self.deps.inviter);
                let agent_type = self.agent_type.clone();

                // Detached: the outcome never reaches the session
                tokio::spawn(async move {
                    match inviter.invite(&agent_type).await {
                        Ok(()) => {
                            info!(target: "sc.automation", agent_type = %agent_type, "Agent invited");
                        }
                        Err(e) => {
                            warn!(
                                target: "sc.automation",
                                agent_type = %agent_type,
                                error = %e,
                                "Agent invite failed"
                            );
                        }
                    }
                });

                let _ = respond_to.send(Ok(()));
            }
        }
    }

    /// Await `fut` while refusing commands, unless the session is torn down
    /// first. On teardown `fut` is dropped unfinished.
    async fn while_connecting<F: Future>(&mut self, fut: F) -> Result<F::Output, Interrupted> {
        tokio::pin!(fut);

        loop {
            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    return Err(Interrupted::Cancelled);
                }

                output = &mut fut => {
                    return Ok(output);
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => Self::refuse(message),
                        None => return Err(Interrupted::HandlesDropped),
                    }
                }
            }
        }
    }

    fn refuse(message: SessionMessage) {
        match message {
            SessionMessage::ToggleMicrophone { respond_to } => {
                let _ = respond_to.send(Err(ControllerError::NotActive));
            }
            SessionMessage::InviteAgent { respond_to } => {
                let _ = respond_to.send(Err(ControllerError::NotActive));
            }
        }
    }

    fn fail(self, error: ControllerError) {
        warn!(target: "sc.session", error = %error, "Session failed while connecting");
        self.state.send_replace(SessionState::Failed(error.to_string()));
    }

    fn log_interrupted(interrupted: &Interrupted, phase: &'static str) {
        match interrupted {
            Interrupted::Cancelled => {
                debug!(target: "sc.session", phase, "Session torn down while connecting");
            }
            Interrupted::HandlesDropped => {
                debug!(target: "sc.session", phase, "All session handles dropped while connecting");
            }
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::mock::{MockAgentInviter, MockCredentialSource, MockRealtimeService};
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    struct Fixture {
        handle: SessionHandle,
        task: JoinHandle<()>,
        credentials: Arc<MockCredentialSource>,
        realtime: Arc<MockRealtimeService>,
        invites: mpsc::UnboundedReceiver<String>,
    }

    fn start(credentials: MockCredentialSource, realtime: MockRealtimeService) -> Fixture {
        start_with_inviter(credentials, realtime, MockAgentInviter::accepting())
    }

    fn start_with_inviter(
        credentials: MockCredentialSource,
        realtime: MockRealtimeService,
        (inviter, invites): (MockAgentInviter, mpsc::UnboundedReceiver<String>),
    ) -> Fixture {
        let credentials = Arc::new(credentials);
        let realtime = Arc::new(realtime);
        let deps = SessionDeps {
            credentials: credentials.clone(),
            realtime: realtime.clone(),
            inviter: Arc::new(inviter),
        };

        let (handle, task) = SessionController::spawn(deps, "kitt".to_string(), CancellationToken::new());
        Fixture {
            handle,
            task,
            credentials,
            realtime,
            invites,
        }
    }

    async fn wait_active(handle: &SessionHandle) -> ActiveSession {
        let state = tokio::time::timeout(WAIT, handle.wait_for_state(SessionState::is_active))
            .await
            .expect("timed out waiting for Active")
            .unwrap();
        match state {
            SessionState::Active(active) => active,
            _ => unreachable!(),
        }
    }

    async fn wait_finished(handle: &SessionHandle) -> SessionState {
        tokio::time::timeout(WAIT, handle.wait_for_state(SessionState::is_finished))
            .await
            .expect("timed out waiting for a finished state")
            .unwrap()
    }

    #[tokio::test]
    async fn test_connects_with_fetched_credential() {
        let fixture = start(
            MockCredentialSource::returning("token-abc", "wss://rtc.example.com"),
            MockRealtimeService::new(),
        );

        let active = wait_active(&fixture.handle).await;
        assert_eq!(active.local_identity, "caller");
        assert_eq!(active.ws_url, "wss://rtc.example.com");
        assert!(active.microphone_enabled);

        assert_eq!(fixture.credentials.call_count(), 1);
        let connects = fixture.realtime.connect_calls().await;
        assert_eq!(
            connects,
            vec![("wss://rtc.example.com".to_string(), "token-abc".to_string())]
        );
    }

    #[tokio::test]
    async fn test_no_connect_before_fetch_resolves() {
        let (credentials, release) =
            MockCredentialSource::gated("token-gated", "wss://rtc.example.com");
        let fixture = start(credentials, MockRealtimeService::new());

        // Let the controller reach the fetch
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fixture.handle.state(), SessionState::Connecting);
        assert!(fixture.realtime.connect_calls().await.is_empty());
        assert!(fixture.handle.view().is_blank());

        release.send(()).unwrap();
        wait_active(&fixture.handle).await;

        let connects = fixture.realtime.connect_calls().await;
        assert_eq!(connects.len(), 1);
        assert_eq!(connects[0].1, "token-gated");
    }

    #[tokio::test]
    async fn test_issuance_failure_is_failed_without_connect() {
        let fixture = start(
            MockCredentialSource::failing(500, "Server misconfigured"),
            MockRealtimeService::new(),
        );

        let state = wait_finished(&fixture.handle).await;
        match state {
            SessionState::Failed(reason) => assert!(reason.contains("Server misconfigured")),
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(fixture.realtime.connect_calls().await.is_empty());
        assert!(fixture.handle.view().is_blank());
    }

    #[tokio::test]
    async fn test_connect_failure_is_failed() {
        let fixture = start(
            MockCredentialSource::returning("token", "wss://rtc.example.com"),
            MockRealtimeService::failing("handshake refused"),
        );

        let state = wait_finished(&fixture.handle).await;
        assert!(matches!(state, SessionState::Failed(reason) if reason.contains("handshake refused")));
    }

    #[tokio::test]
    async fn test_teardown_during_fetch_freezes_state() {
        let fixture = start(MockCredentialSource::pending(), MockRealtimeService::new());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fixture.handle.state(), SessionState::Connecting);

        fixture.handle.shutdown();
        tokio::time::timeout(WAIT, fixture.task).await.unwrap().unwrap();

        // No mutation after teardown, and the room was never contacted
        assert_eq!(fixture.handle.state(), SessionState::Connecting);
        assert!(fixture.realtime.connect_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_resolving_with_teardown_never_connects() {
        for _ in 0..50 {
            let (credentials, release) = MockCredentialSource::gated("token", "wss://rtc");
            let fixture = start(credentials, MockRealtimeService::new());

            // Wait for the controller to be parked on the fetch
            while fixture.credentials.call_count() == 0 {
                tokio::task::yield_now().await;
            }

            // Teardown and resolution become ready in the same poll
            fixture.handle.shutdown();
            release.send(()).unwrap();
            assert!(fixture.handle.is_cancelled());

            tokio::time::timeout(WAIT, fixture.task).await.unwrap().unwrap();

            assert_eq!(fixture.handle.state(), SessionState::Connecting);
            assert!(fixture.realtime.connect_calls().await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_teardown_during_connect_freezes_state() {
        let fixture = start(
            MockCredentialSource::returning("token", "wss://rtc.example.com"),
            MockRealtimeService::pending(),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fixture.realtime.connect_calls().await.len(), 1);

        fixture.handle.shutdown();
        tokio::time::timeout(WAIT, fixture.task).await.unwrap().unwrap();

        assert_eq!(fixture.handle.state(), SessionState::Connecting);
        assert_eq!(fixture.realtime.disconnect_count(), 0);
    }

    #[tokio::test]
    async fn test_commands_refused_while_connecting() {
        let (credentials, _release) = MockCredentialSource::gated("t", "wss://rtc");
        let fixture = start(credentials, MockRealtimeService::new());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(matches!(
            fixture.handle.toggle_microphone().await,
            Err(ControllerError::NotActive)
        ));
        assert!(matches!(
            fixture.handle.invite_agent().await,
            Err(ControllerError::NotActive)
        ));
    }

    #[tokio::test]
    async fn test_participant_snapshots_follow_events() {
        let fixture = start(
            MockCredentialSource::returning("token", "wss://rtc"),
            MockRealtimeService::new().with_participants(vec![RemoteParticipant::new("kitt-1")]),
        );
        wait_active(&fixture.handle).await;
        assert_eq!(fixture.handle.participants(), vec![RemoteParticipant::new("kitt-1")]);

        let events = fixture.realtime.event_sender().await.unwrap();
        let mut snapshots = fixture.handle.subscribe_participants();

        events
            .send(RoomEvent::ParticipantConnected(
                RemoteParticipant::new("kitt-2").with_metadata("joined"),
            ))
            .await
            .unwrap();
        snapshots.changed().await.unwrap();
        assert_eq!(
            *snapshots.borrow_and_update(),
            vec![
                RemoteParticipant::new("kitt-1"),
                RemoteParticipant::new("kitt-2").with_metadata("joined"),
            ]
        );

        events
            .send(RoomEvent::ParticipantDisconnected {
                identity: "kitt-1".to_string(),
            })
            .await
            .unwrap();
        snapshots.changed().await.unwrap();
        assert_eq!(
            *snapshots.borrow_and_update(),
            vec![RemoteParticipant::new("kitt-2").with_metadata("joined")]
        );
    }

    #[tokio::test]
    async fn test_fresh_subscribers_only_see_real_changes() {
        let fixture = start(
            MockCredentialSource::returning("token", "wss://rtc"),
            MockRealtimeService::new().with_participants(vec![RemoteParticipant::new("kitt-1")]),
        );
        wait_active(&fixture.handle).await;

        let mut snapshots = fixture.handle.subscribe_participants();
        let mut states = fixture.handle.subscribe_state();
        assert!(!snapshots.has_changed().unwrap());
        assert!(!states.has_changed().unwrap());
        assert_eq!(*snapshots.borrow(), vec![RemoteParticipant::new("kitt-1")]);

        // Metadata for an unknown identity changes nothing
        let events = fixture.realtime.event_sender().await.unwrap();
        events
            .send(RoomEvent::ParticipantMetadataChanged {
                identity: "nobody".to_string(),
                metadata: Some("x".to_string()),
            })
            .await
            .unwrap();
        events
            .send(RoomEvent::ParticipantConnected(RemoteParticipant::new("kitt-2")))
            .await
            .unwrap();

        tokio::time::timeout(WAIT, snapshots.changed()).await.unwrap().unwrap();
        assert_eq!(
            *snapshots.borrow_and_update(),
            vec![RemoteParticipant::new("kitt-1"), RemoteParticipant::new("kitt-2")]
        );
        assert!(!states.has_changed().unwrap());

        fixture.handle.shutdown();
        tokio::time::timeout(WAIT, states.changed()).await.unwrap().unwrap();
        assert_eq!(*states.borrow_and_update(), SessionState::Terminated);
    }

    #[tokio::test]
    async fn test_toggle_microphone() {
        let fixture = start(
            MockCredentialSource::returning("token", "wss://rtc"),
            MockRealtimeService::new(),
        );
        wait_active(&fixture.handle).await;

        assert!(!fixture.handle.toggle_microphone().await.unwrap());
        assert!(fixture.handle.toggle_microphone().await.unwrap());
        assert_eq!(fixture.realtime.microphone_calls().await, vec![false, true]);

        match fixture.handle.state() {
            SessionState::Active(active) => assert!(active.microphone_enabled),
            other => panic!("expected Active, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_toggle_microphone_failure_keeps_state() {
        let fixture = start(
            MockCredentialSource::returning("token", "wss://rtc"),
            MockRealtimeService::new().with_microphone_failure(),
        );
        wait_active(&fixture.handle).await;

        let result = fixture.handle.toggle_microphone().await;
        assert!(matches!(result, Err(ControllerError::Realtime(_))));

        let active = wait_active(&fixture.handle).await;
        assert!(active.microphone_enabled);
    }

    #[tokio::test]
    async fn test_invite_dispatches_agent_type() {
        let mut fixture = start(
            MockCredentialSource::returning("token", "wss://rtc"),
            MockRealtimeService::new(),
        );
        wait_active(&fixture.handle).await;

        fixture.handle.invite_agent().await.unwrap();
        let invited = tokio::time::timeout(WAIT, fixture.invites.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(invited, "kitt");
    }

    #[tokio::test]
    async fn test_invite_failure_leaves_session_active() {
        let mut fixture = start_with_inviter(
            MockCredentialSource::returning("token", "wss://rtc"),
            MockRealtimeService::new(),
            MockAgentInviter::failing(),
        );
        wait_active(&fixture.handle).await;

        fixture.handle.invite_agent().await.unwrap();
        tokio::time::timeout(WAIT, fixture.invites.recv())
            .await
            .unwrap()
            .unwrap();

        // Give the detached task time to log its failure
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(fixture.handle.state().is_active());
    }

    #[tokio::test]
    async fn test_remote_disconnect_terminates() {
        let fixture = start(
            MockCredentialSource::returning("token", "wss://rtc"),
            MockRealtimeService::new().with_participants(vec![RemoteParticipant::new("kitt-1")]),
        );
        wait_active(&fixture.handle).await;

        let events = fixture.realtime.event_sender().await.unwrap();
        events
            .send(RoomEvent::Disconnected {
                reason: "server shutdown".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(wait_finished(&fixture.handle).await, SessionState::Terminated);
        assert!(fixture.handle.participants().is_empty());
        assert!(fixture.handle.view().is_blank());
        assert!(matches!(
            fixture.handle.toggle_microphone().await,
            Err(ControllerError::NotActive)
        ));
    }

    #[tokio::test]
    async fn test_event_stream_end_terminates() {
        let fixture = start(
            MockCredentialSource::returning("token", "wss://rtc"),
            MockRealtimeService::new(),
        );
        wait_active(&fixture.handle).await;

        fixture.realtime.close_events().await;
        assert_eq!(wait_finished(&fixture.handle).await, SessionState::Terminated);
    }

    #[tokio::test]
    async fn test_teardown_while_active_disconnects() {
        let fixture = start(
            MockCredentialSource::returning("token", "wss://rtc"),
            MockRealtimeService::new(),
        );
        wait_active(&fixture.handle).await;

        fixture.handle.shutdown();
        assert_eq!(wait_finished(&fixture.handle).await, SessionState::Terminated);
        assert_eq!(fixture.realtime.disconnect_count(), 1);
    }

    #[tokio::test]
    async fn test_credential_token_kept_secret_in_state() {
        let fixture = start(
            MockCredentialSource::returning("very-secret-token", "wss://rtc"),
            MockRealtimeService::new(),
        );
        wait_active(&fixture.handle).await;

        let debug = format!("{:?}", fixture.handle.state());
        assert!(!debug.contains("very-secret-token"));

        let connects = fixture.realtime.connect_calls().await;
        assert_eq!(connects[0].1, "very-secret-token");
    }
}
