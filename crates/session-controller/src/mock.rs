//! In-memory collaborators for testing.
//!
//! These stand in for the issuer, the real-time service and the automation
//! endpoint so the session state machine can be driven without a network.

use crate::automation::AgentInviter;
use crate::errors::ControllerError;
use crate::issuer_client::{Credential, CredentialSource};
use crate::realtime::{LocalParticipantControl, RealtimeService, RemoteParticipant, RoomConnection, RoomEvent};
use common::secret::{ExposeSecret, SecretString};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};

/// Buffer for mock room events.
const MOCK_EVENT_BUFFER: usize = 32;

enum CredentialBehavior {
    Return(Credential),
    Fail { status: u16, message: String },
    Pending,
    Gated {
        release: Mutex<Option<oneshot::Receiver<()>>>,
        credential: Credential,
    },
}

/// Mock credential source.
pub struct MockCredentialSource {
    behavior: CredentialBehavior,
    call_count: AtomicUsize,
}

impl MockCredentialSource {
    fn with_behavior(behavior: CredentialBehavior) -> Self {
        Self {
            behavior,
            call_count: AtomicUsize::new(0),
        }
    }

    fn credential(token: &str, ws_url: &str) -> Credential {
        Credential {
            token: SecretString::from(token.to_string()),
            ws_url: ws_url.to_string(),
        }
    }

    /// Create a mock that returns the given credential.
    pub fn returning(token: &str, ws_url: &str) -> Self {
        Self::with_behavior(CredentialBehavior::Return(Self::credential(token, ws_url)))
    }

    /// Create a mock that fails like a non-2xx issuer response.
    pub fn failing(status: u16, message: &str) -> Self {
        Self::with_behavior(CredentialBehavior::Fail {
            status,
            message: message.to_string(),
        })
    }

    /// Create a mock whose fetch never resolves.
    pub fn pending() -> Self {
        Self::with_behavior(CredentialBehavior::Pending)
    }

    /// Create a mock whose fetch resolves once the returned sender fires.
    pub fn gated(token: &str, ws_url: &str) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let mock = Self::with_behavior(CredentialBehavior::Gated {
            release: Mutex::new(Some(rx)),
            credential: Self::credential(token, ws_url),
        });
        (mock, tx)
    }

    /// Get the number of fetches made.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CredentialSource for MockCredentialSource {
    async fn fetch_credential(&self) -> Result<Credential, ControllerError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            CredentialBehavior::Return(credential) => Ok(credential.clone()),
            CredentialBehavior::Fail { status, message } => Err(ControllerError::Issuance {
                status: *status,
                message: message.clone(),
            }),
            CredentialBehavior::Pending => std::future::pending().await,
            CredentialBehavior::Gated {
                release,
                credential,
            } => {
                let receiver = release.lock().await.take();
                match receiver {
                    Some(receiver) => match receiver.await {
                        Ok(()) => Ok(credential.clone()),
                        Err(_) => std::future::pending().await,
                    },
                    None => std::future::pending().await,
                }
            }
        }
    }
}

/// What the mock local participant was asked to do.
#[derive(Default)]
struct LocalRecord {
    microphone_calls: Mutex<Vec<bool>>,
    disconnect_count: AtomicUsize,
}

struct MockLocalParticipant {
    record: Arc<LocalRecord>,
    fail_microphone: bool,
}

#[async_trait::async_trait]
impl LocalParticipantControl for MockLocalParticipant {
    async fn set_microphone_enabled(&self, enabled: bool) -> Result<(), ControllerError> {
        self.record.microphone_calls.lock().await.push(enabled);
        if self.fail_microphone {
            return Err(ControllerError::Realtime(
                "Mock microphone failure".to_string(),
            ));
        }
        Ok(())
    }

    async fn disconnect(&self) {
        self.record.disconnect_count.fetch_add(1, Ordering::SeqCst);
    }
}

enum ConnectBehavior {
    Connect,
    Fail(String),
    Pending,
}

/// Mock real-time service.
///
/// Records every connect call and keeps the sending half of the room event
/// stream so tests can push membership events.
pub struct MockRealtimeService {
    behavior: ConnectBehavior,
    local_identity: String,
    participants: Vec<RemoteParticipant>,
    fail_microphone: bool,
    connect_calls: Mutex<Vec<(String, String)>>,
    events: Mutex<Option<mpsc::Sender<RoomEvent>>>,
    record: Arc<LocalRecord>,
}

impl MockRealtimeService {
    fn with_behavior(behavior: ConnectBehavior) -> Self {
        Self {
            behavior,
            local_identity: "caller".to_string(),
            participants: Vec::new(),
            fail_microphone: false,
            connect_calls: Mutex::new(Vec::new()),
            events: Mutex::new(None),
            record: Arc::new(LocalRecord::default()),
        }
    }

    /// Create a mock that accepts every connect.
    pub fn new() -> Self {
        Self::with_behavior(ConnectBehavior::Connect)
    }

    /// Create a mock that refuses every connect.
    pub fn failing(reason: &str) -> Self {
        Self::with_behavior(ConnectBehavior::Fail(reason.to_string()))
    }

    /// Create a mock whose connect never resolves.
    pub fn pending() -> Self {
        Self::with_behavior(ConnectBehavior::Pending)
    }

    /// Remote participants present on join.
    #[must_use]
    pub fn with_participants(mut self, participants: Vec<RemoteParticipant>) -> Self {
        self.participants = participants;
        self
    }

    /// Identity the room assigns to the local participant.
    #[must_use]
    pub fn with_local_identity(mut self, identity: &str) -> Self {
        self.local_identity = identity.to_string();
        self
    }

    /// Make microphone changes fail.
    #[must_use]
    pub fn with_microphone_failure(mut self) -> Self {
        self.fail_microphone = true;
        self
    }

    /// `(ws_url, token)` of every connect call, in order.
    pub async fn connect_calls(&self) -> Vec<(String, String)> {
        self.connect_calls.lock().await.clone()
    }

    /// Sender for the event stream of the latest connection.
    pub async fn event_sender(&self) -> Option<mpsc::Sender<RoomEvent>> {
        self.events.lock().await.clone()
    }

    /// Drop the stored event sender. The stream ends once every clone is gone.
    pub async fn close_events(&self) {
        self.events.lock().await.take();
    }

    /// Microphone states requested, in order.
    pub async fn microphone_calls(&self) -> Vec<bool> {
        self.record.microphone_calls.lock().await.clone()
    }

    /// Number of disconnect calls.
    pub fn disconnect_count(&self) -> usize {
        self.record.disconnect_count.load(Ordering::SeqCst)
    }
}

impl Default for MockRealtimeService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RealtimeService for MockRealtimeService {
    async fn connect(
        &self,
        ws_url: &str,
        token: &SecretString,
    ) -> Result<RoomConnection, ControllerError> {
        self.connect_calls
            .lock()
            .await
            .push((ws_url.to_string(), token.expose_secret().to_string()));

        match &self.behavior {
            ConnectBehavior::Connect => {}
            ConnectBehavior::Fail(reason) => return Err(ControllerError::Realtime(reason.clone())),
            ConnectBehavior::Pending => std::future::pending::<()>().await,
        }

        let (tx, rx) = mpsc::channel(MOCK_EVENT_BUFFER);
        *self.events.lock().await = Some(tx);

        Ok(RoomConnection {
            local_identity: self.local_identity.clone(),
            participants: self.participants.clone(),
            events: rx,
            local: Box::new(MockLocalParticipant {
                record: Arc::clone(&self.record),
                fail_microphone: self.fail_microphone,
            }),
            microphone_enabled: true,
        })
    }
}

/// Mock agent inviter. Every requested agent type is forwarded to the
/// receiver returned by the constructor.
pub struct MockAgentInviter {
    invited: mpsc::UnboundedSender<String>,
    return_error: bool,
}

impl MockAgentInviter {
    /// Create a mock that accepts every invite.
    pub fn accepting() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                invited: tx,
                return_error: false,
            },
            rx,
        )
    }

    /// Create a mock that refuses every invite.
    pub fn failing() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                invited: tx,
                return_error: true,
            },
            rx,
        )
    }
}

#[async_trait::async_trait]
impl AgentInviter for MockAgentInviter {
    async fn invite(&self, agent_type: &str) -> Result<(), ControllerError> {
        let _ = self.invited.send(agent_type.to_string());

        if self.return_error {
            return Err(ControllerError::Automation(
                "Mock automation failure".to_string(),
            ));
        }
        Ok(())
    }
}
