//! The session context: one object per connection that owns the codec, the
//! transport handle, the identity resolver, the driver arbiter, the
//! pending callbacks and the state store.
//!
//! `Session` is sans-IO apart from the non-blocking
//! [`TransportHandle::send`]: it never awaits. Whoever owns it feeds it
//! [`TransportEvent`]s in arrival order and calls
//! [`Session::on_identity_deadline`] when [`Session::identity_deadline`]
//! passes.

use roverlink_protocol::{ClientCall, ClientId, MessageCodec, RequestId};
use roverlink_transport::{TransportEvent, TransportHandle};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::{
    DriverArbiter, IdentityFuture, IdentityResolver, IdentityState,
    Notification, PendingCallbacks, Presenter, SessionConfig, SessionError,
    SessionStore, View,
};

/// One client session with the rover backend.
pub struct Session {
    pub(crate) config: SessionConfig,
    pub(crate) transport: TransportHandle,
    pub(crate) codec: MessageCodec,
    pub(crate) identity: IdentityResolver,
    pub(crate) arbiter: DriverArbiter,
    pub(crate) callbacks: PendingCallbacks,
    pub(crate) state: watch::Sender<SessionStore>,
    pub(crate) presenter: Box<dyn Presenter>,
}

impl Session {
    /// Creates a session over a transport handle. The identity deadline
    /// starts now.
    pub fn new(
        config: SessionConfig,
        transport: TransportHandle,
        presenter: impl Presenter,
    ) -> Self {
        let config = config.validated();
        let mut store = SessionStore::new(config.retention);
        store.set_connected(transport.is_connected());
        let (state, _) = watch::channel(store);

        Self {
            identity: IdentityResolver::new(config.identity_timeout),
            config,
            transport,
            codec: MessageCodec::new(),
            arbiter: DriverArbiter::new(),
            callbacks: PendingCallbacks::new(),
            state,
            presenter: Box::new(presenter),
        }
    }

    // -- Read access --

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Live view of the store. Every mutation notifies receivers.
    pub fn subscribe(&self) -> watch::Receiver<SessionStore> {
        self.state.subscribe()
    }

    /// Borrows the current store.
    pub fn store(&self) -> watch::Ref<'_, SessionStore> {
        self.state.borrow()
    }

    /// The identity held right now, assigned or not.
    pub fn client_id(&self) -> ClientId {
        self.state.borrow().client_id()
    }

    /// Whether the transport accepts sends right now.
    ///
    /// This is the transport's own flag and flips as soon as the socket
    /// closes. [`SessionStore::is_connected`] follows it one event later and
    /// is the flag readers outside the session should use.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// A handle on the identity outcome.
    pub fn identity(&self) -> IdentityFuture {
        self.identity.future()
    }

    pub fn identity_state(&self) -> IdentityState {
        self.identity.state()
    }

    /// When the identity should be rejected, or `None` once settled.
    pub fn identity_deadline(&self) -> Option<Instant> {
        self.identity.deadline()
    }

    pub fn view(&self) -> View {
        self.arbiter.view()
    }

    /// Tells the session which screen the operator is on.
    pub fn set_view(&mut self, view: View) {
        tracing::debug!(?view, "view changed");
        self.arbiter.set_view(view);
    }

    // -- Inputs --

    /// Feeds one transport event.
    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => {
                tracing::info!("connection open");
                self.state.send_modify(|s| s.set_connected(true));
            }
            TransportEvent::Closed { reason } => {
                tracing::info!(%reason, "connection closed");
                self.state.send_modify(|s| s.set_connected(false));
            }
            TransportEvent::Error { info } => {
                tracing::warn!(%info, "connection error");
            }
            TransportEvent::Message(text) => self.handle_frame(&text),
        }
    }

    /// Rejects the identity if it is still pending. Call when
    /// [`identity_deadline`](Self::identity_deadline) passes.
    pub fn on_identity_deadline(&mut self) {
        if !self.identity.reject() {
            return;
        }
        tracing::warn!(
            client_id = %self.client_id(),
            "no client id assigned in time, identity rejected"
        );
        let dropped = self.arbiter.take_deferred_enters();
        if dropped > 0 {
            tracing::info!(
                dropped,
                "not entering driver mode because identity was rejected"
            );
        }
    }

    // -- Outbound plumbing --

    /// Encodes and sends a call. Returns the allocated request id.
    ///
    /// # Errors
    /// [`SessionError::Transport`] if the socket is not open (the id is
    /// still consumed), [`SessionError::Protocol`] if encoding fails.
    pub fn send(&mut self, call: ClientCall) -> Result<RequestId, SessionError> {
        let (text, id) = self.codec.encode(&call)?;
        self.transport.send(text.as_str())?;
        tracing::debug!(%id, method = call.method(), "sent call");
        self.state.send_modify(|s| s.record_sent(text));
        Ok(id)
    }

    /// Sends a call from inside a handler, where there is no caller to
    /// report failure to.
    pub(crate) fn send_or_log(&mut self, call: ClientCall) {
        let method = call.method();
        if let Err(e) = self.send(call) {
            tracing::warn!(method, error = %e, "send failed");
        }
    }

    /// Records a notification and shows it.
    pub(crate) fn notify(&mut self, notification: Notification) {
        self.presenter.show_notification(&notification);
        self.state.send_modify(|s| s.push_notification(notification));
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client_id", &self.client_id())
            .field("identity", &self.identity.state())
            .field("connected", &self.is_connected())
            .field("view", &self.arbiter.view())
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}
