//! `RoverClient` builder, handle and actor loop.
//!
//! This is the entry point for talking to a rover backend. It ties the
//! layers together: transport → protocol → session.
//!
//! The [`Session`] lives inside one Tokio task (the client actor). That
//! task is the only thing that touches it:
//!
//! ```text
//!  RoverClient ──(ClientCommand)──┐
//!  transport events ──────────────┤
//!  identity deadline ─────────────┼──→ ClientActor ──→ Session
//!  heartbeat interval ────────────┘                      │
//!                                                        ▼
//!                                     watch<SessionStore> (read side)
//! ```
//!
//! Handles are cheap to clone. Every command is a closure run against the
//! session with a `oneshot` reply, so commands from all handles are
//! serialized in the order the actor receives them.

use std::time::Duration;

use roverlink_protocol::{ClientId, RequestId};
use roverlink_session::{
    IdentityFuture, LogPresenter, Presenter, ResponseCallback, Session,
    SessionConfig, SessionError, SessionStore, View,
};
use roverlink_transport::{
    Connection, Endpoint, EventReceiver, Transport,
};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::RoverError;

/// Settings for a [`RoverClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Session tunables (speeds, identity timeout, retention).
    pub session: SessionConfig,

    /// Send `heartbeat[clientId]` this often once the identity is known.
    /// Default: `None` (no heartbeat).
    pub heartbeat_interval: Option<Duration>,

    /// Capacity of the command channel between handles and the actor.
    /// Default: 64.
    pub command_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            heartbeat_interval: None,
            command_buffer: 64,
        }
    }
}

/// Work for the actor. The closure runs with exclusive access to the
/// session.
type Job = Box<dyn FnOnce(&mut Session) + Send + 'static>;

enum ClientCommand {
    Run(Job),
    Shutdown,
}

/// Builder for configuring and starting a [`RoverClient`].
///
/// # Example
///
/// ```rust,no_run
/// use roverlink::prelude::*;
///
/// # async fn demo() -> Result<(), RoverError> {
/// let endpoint = Endpoint::new("rover.local", 9000);
/// let client = RoverClient::builder()
///     .heartbeat_interval(std::time::Duration::from_secs(5))
///     .connect(&endpoint)
///     .await?;
/// let _id = client.identity().wait().await?;
/// client.enter_driver_mode().await?;
/// # Ok(())
/// # }
/// ```
pub struct RoverClientBuilder<P: Presenter = LogPresenter> {
    config: ClientConfig,
    presenter: P,
}

impl RoverClientBuilder {
    /// Creates a builder with default settings and a [`LogPresenter`].
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            presenter: LogPresenter,
        }
    }
}

impl Default for RoverClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Presenter> RoverClientBuilder<P> {
    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Enables the periodic heartbeat.
    pub fn heartbeat_interval(mut self, every: Duration) -> Self {
        self.config.heartbeat_interval = Some(every);
        self
    }

    /// Sets who renders notifications and the blocked dialog.
    pub fn presenter<Q: Presenter>(self, presenter: Q) -> RoverClientBuilder<Q> {
        RoverClientBuilder {
            config: self.config,
            presenter,
        }
    }

    /// Dials the endpoint over WebSocket and starts the client.
    ///
    /// # Errors
    /// [`RoverError::Transport`] if the endpoint is rejected or the
    /// connection cannot be opened.
    #[cfg(feature = "websocket")]
    pub async fn connect(self, endpoint: &Endpoint) -> Result<RoverClient, RoverError> {
        self.connect_with(&roverlink_transport::WebSocketTransport, endpoint)
            .await
    }

    /// Connects with any [`Transport`] and starts the client.
    pub async fn connect_with<T: Transport>(
        self,
        transport: &T,
        endpoint: &Endpoint,
    ) -> Result<RoverClient, RoverError> {
        let connection = transport.connect(endpoint).await?;
        Ok(self.start(connection))
    }

    /// Starts the client over an already established connection.
    ///
    /// The identity deadline starts now. Must be called from within a
    /// Tokio runtime.
    pub fn start(self, connection: Connection) -> RoverClient {
        let (transport, events) = connection.into_parts();
        let session = Session::new(
            self.config.session,
            transport,
            self.presenter,
        );
        let state = session.subscribe();
        let identity = session.identity();

        let (tx, rx) = mpsc::channel(self.config.command_buffer.max(1));
        let heartbeat = self.config.heartbeat_interval.map(|every| {
            let mut interval = tokio::time::interval_at(Instant::now() + every, every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        let actor = ClientActor {
            session,
            events: Some(events),
            commands: rx,
            heartbeat,
        };
        tokio::spawn(actor.run());

        RoverClient {
            commands: tx,
            state,
            identity,
        }
    }
}

/// Handle to a running client. Cheap to clone.
///
/// Read access goes straight to the shared [`SessionStore`] and never
/// waits on the actor. Commands are forwarded to the actor and return the
/// allocated [`RequestId`].
#[derive(Clone)]
pub struct RoverClient {
    commands: mpsc::Sender<ClientCommand>,
    state: watch::Receiver<SessionStore>,
    identity: IdentityFuture,
}

impl RoverClient {
    /// Creates a new builder.
    pub fn builder() -> RoverClientBuilder {
        RoverClientBuilder::new()
    }

    // -- Read access --

    /// Whether the socket is open, as of the last lifecycle event the
    /// actor handled. Same value as [`SessionStore::is_connected`].
    pub fn is_connected(&self) -> bool {
        self.state.borrow().is_connected()
    }

    /// The session identity future. Resolves once `setClientId` arrives,
    /// or fails with [`SessionError::IdentityTimeout`].
    pub fn identity(&self) -> IdentityFuture {
        self.identity.clone()
    }

    /// The identity held right now, assigned or not.
    pub fn client_id(&self) -> ClientId {
        self.state.borrow().client_id()
    }

    /// A copy of the current store.
    pub fn store(&self) -> SessionStore {
        self.state.borrow().clone()
    }

    /// A receiver that is notified on every store change.
    pub fn watch(&self) -> watch::Receiver<SessionStore> {
        self.state.clone()
    }

    // -- Plumbing --

    /// Runs `f` on the actor with exclusive access to the session.
    ///
    /// # Errors
    /// [`RoverError::Shutdown`] if the actor has stopped.
    pub async fn call<R, F>(&self, f: F) -> Result<R, RoverError>
    where
        R: Send + 'static,
        F: FnOnce(&mut Session) -> R + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |session| {
            let _ = reply_tx.send(f(session));
        });
        self.commands
            .send(ClientCommand::Run(job))
            .await
            .map_err(|_| RoverError::Shutdown)?;
        reply_rx.await.map_err(|_| RoverError::Shutdown)
    }

    async fn send<F>(&self, f: F) -> Result<RequestId, RoverError>
    where
        F: FnOnce(&mut Session) -> Result<RequestId, SessionError> + Send + 'static,
    {
        Ok(self.call(f).await??)
    }

    /// Stops the actor. Other handles get [`RoverError::Shutdown`]
    /// afterwards.
    pub async fn shutdown(&self) -> Result<(), RoverError> {
        self.commands
            .send(ClientCommand::Shutdown)
            .await
            .map_err(|_| RoverError::Shutdown)
    }

    // -- View --

    /// Tells the client which screen the operator is on. Only the driving
    /// view re-requests an empty driver seat.
    pub async fn set_view(&self, view: View) -> Result<(), RoverError> {
        self.call(move |s| s.set_view(view)).await
    }

    // -- Commands --

    pub async fn send_ping(&self) -> Result<RequestId, RoverError> {
        self.send(|s| s.send_ping()).await
    }

    pub async fn heartbeat(&self) -> Result<RequestId, RoverError> {
        self.send(|s| s.heartbeat()).await
    }

    pub async fn stop(&self) -> Result<RequestId, RoverError> {
        self.send(|s| s.stop()).await
    }

    pub async fn drive_forward(&self) -> Result<RequestId, RoverError> {
        self.send(|s| s.drive_forward()).await
    }

    pub async fn drive_backward(&self) -> Result<RequestId, RoverError> {
        self.send(|s| s.drive_backward()).await
    }

    pub async fn drive_continuously(
        &self,
        angle: i32,
        speed: i32,
    ) -> Result<RequestId, RoverError> {
        self.send(move |s| s.drive_continuously(angle, speed)).await
    }

    pub async fn turn_left(&self) -> Result<RequestId, RoverError> {
        self.send(|s| s.turn_left()).await
    }

    pub async fn turn_right(&self) -> Result<RequestId, RoverError> {
        self.send(|s| s.turn_right()).await
    }

    pub async fn camera_move_up(&self) -> Result<RequestId, RoverError> {
        self.send(|s| s.camera_move_up()).await
    }

    pub async fn camera_move_down(&self) -> Result<RequestId, RoverError> {
        self.send(|s| s.camera_move_down()).await
    }

    pub async fn camera_move_left(&self) -> Result<RequestId, RoverError> {
        self.send(|s| s.camera_move_left()).await
    }

    pub async fn camera_move_right(&self) -> Result<RequestId, RoverError> {
        self.send(|s| s.camera_move_right()).await
    }

    pub async fn camera_reset_position(&self) -> Result<RequestId, RoverError> {
        self.send(|s| s.camera_reset_position()).await
    }

    pub async fn set_killswitch(
        &self,
        enabled: bool,
        message: impl Into<String>,
    ) -> Result<RequestId, RoverError> {
        let message = message.into();
        self.send(move |s| s.set_killswitch(enabled, message)).await
    }

    pub async fn request_killswitch_state(&self) -> Result<RequestId, RoverError> {
        self.send(|s| s.request_killswitch_state()).await
    }

    pub async fn set_max_speed(&self, value: i32) -> Result<RequestId, RoverError> {
        self.send(move |s| s.set_max_speed(value)).await
    }

    pub async fn request_max_speed(&self) -> Result<RequestId, RoverError> {
        self.send(|s| s.request_max_speed()).await
    }

    pub async fn release_driver(&self) -> Result<RequestId, RoverError> {
        self.send(|s| s.release_driver()).await
    }

    pub async fn block_ip(&self, ip: impl Into<String>) -> Result<RequestId, RoverError> {
        let ip = ip.into();
        self.send(move |s| s.block_ip(ip)).await
    }

    pub async fn unblock_ip(&self, ip: impl Into<String>) -> Result<RequestId, RoverError> {
        let ip = ip.into();
        self.send(move |s| s.unblock_ip(ip)).await
    }

    /// Requests a camera frame. `callback` runs on the client task when
    /// `incomingSnapshot` arrives; a later request replaces it.
    pub async fn get_camera_snapshot(
        &self,
        callback: impl FnOnce(Value) + Send + 'static,
    ) -> Result<RequestId, RoverError> {
        let callback: ResponseCallback = Box::new(callback);
        self.send(move |s| s.get_camera_snapshot(callback)).await
    }

    /// Requests log entries after `last_entry` (all of them for `None`).
    pub async fn get_logging_entries(
        &self,
        last_entry: Option<String>,
        callback: impl FnOnce(Value) + Send + 'static,
    ) -> Result<RequestId, RoverError> {
        let callback: ResponseCallback = Box::new(callback);
        self.send(move |s| s.get_logging_entries(last_entry, callback))
            .await
    }

    /// Requests the rover's uptime. Refused with an error notification
    /// while no identity is assigned.
    pub async fn get_system_up_time(
        &self,
        callback: impl FnOnce(Value) + Send + 'static,
    ) -> Result<RequestId, RoverError> {
        let callback: ResponseCallback = Box::new(callback);
        self.send(move |s| s.get_system_up_time(callback)).await
    }

    pub async fn send_alert_notification(
        &self,
        message: impl Into<String>,
    ) -> Result<RequestId, RoverError> {
        let message = message.into();
        self.send(move |s| s.send_alert_notification(message)).await
    }

    /// Shows an alert locally without sending anything.
    pub async fn show_alert_notification(
        &self,
        message: impl Into<String>,
    ) -> Result<(), RoverError> {
        let message = message.into();
        self.call(move |s| s.show_alert_notification(message)).await
    }

    /// Asks for the driver seat.
    ///
    /// The request goes out as soon as the identity is known. Await the
    /// returned future to learn whether it ever will be.
    pub async fn enter_driver_mode(&self) -> Result<IdentityFuture, RoverError> {
        Ok(self.call(|s| s.enter_driver_mode()).await??)
    }

    pub async fn exit_driver_mode(&self) -> Result<RequestId, RoverError> {
        self.send(|s| s.exit_driver_mode()).await
    }
}

impl std::fmt::Debug for RoverClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoverClient")
            .field("client_id", &self.client_id())
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// The task that owns the session.
struct ClientActor {
    session: Session,
    /// `None` once the transport's event stream has ended.
    events: Option<EventReceiver>,
    commands: mpsc::Receiver<ClientCommand>,
    heartbeat: Option<Interval>,
}

/// One wake-up of the actor loop.
enum Step {
    Event(Option<roverlink_transport::TransportEvent>),
    Command(Option<ClientCommand>),
    IdentityDeadline,
    Heartbeat,
}

impl ClientActor {
    /// Runs the actor loop until shutdown or until every handle is gone.
    async fn run(mut self) {
        tracing::info!("client actor started");

        loop {
            let deadline = self.session.identity_deadline();
            let step = tokio::select! {
                event = recv_event(&mut self.events), if self.events.is_some() => {
                    Step::Event(event)
                }
                command = self.commands.recv() => Step::Command(command),
                _ = sleep_until(deadline), if deadline.is_some() => {
                    Step::IdentityDeadline
                }
                _ = tick(&mut self.heartbeat), if self.heartbeat.is_some() => {
                    Step::Heartbeat
                }
            };

            match step {
                Step::Event(Some(event)) => self.session.handle_event(event),
                Step::Event(None) => {
                    tracing::debug!("transport event stream ended");
                    self.events = None;
                }
                Step::Command(Some(ClientCommand::Run(job))) => job(&mut self.session),
                Step::Command(Some(ClientCommand::Shutdown)) => {
                    tracing::info!("client shutting down");
                    break;
                }
                Step::Command(None) => break,
                Step::IdentityDeadline => self.session.on_identity_deadline(),
                Step::Heartbeat => self.send_heartbeat(),
            }
        }

        tracing::info!("client actor stopped");
    }

    fn send_heartbeat(&mut self) {
        match self.session.heartbeat() {
            Ok(id) => tracing::trace!(%id, "heartbeat"),
            Err(SessionError::IdentityUnavailable) => {
                tracing::debug!("skipping heartbeat, no client id yet");
            }
            Err(e) => tracing::debug!(error = %e, "heartbeat failed"),
        }
    }
}

async fn recv_event(
    events: &mut Option<EventReceiver>,
) -> Option<roverlink_transport::TransportEvent> {
    match events {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
