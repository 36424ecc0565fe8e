//! Connection manager.
//!
//! Owns the transport, the keepalive task, and the session state machine
//! for one session at a time. Inbound frames are decoded and applied in the
//! order the transport delivers them. A reconnect fully retires the old
//! session's tasks before the new transport is opened, so at most one
//! transport and one keepalive timer exist at any point.

use empire_wagers::{
    ActionError, Applied, ChatMessage, ModifierKey, SessionMachine, SessionSettings, SessionView,
    messages::{self, ClientIntent, KEEPALIVE_TOKEN},
};
use std::{collections::VecDeque, time::Duration};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{self, Instant},
};
use url::Url;

use crate::transport::{Connector, Transport, TransportError};

/// How long a retired transport loop gets to close before it's aborted.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Chat lines kept for the current session.
pub const MAX_CHAT_LINES: usize = 32;

/// What the player asked for when joining.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionParams {
    /// Room size, 2 to 4.
    pub desired_players: u8,
    pub name: String,
}

/// The game URL for `params` on top of `endpoint`. Existing query pairs on
/// the endpoint are replaced.
#[must_use]
pub fn game_url(endpoint: &Url, params: &SessionParams) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .clear()
        .append_pair("desired_players", &params.desired_players.to_string())
        .append_pair("name", &params.name);
    url
}

/// Something the UI should react to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionUpdate {
    /// Session state changed. Re-render.
    Changed,
    /// A chat line, already added to the chat log. Session state is
    /// untouched.
    Chat(ChatMessage),
    /// The game ended and the transport is being closed.
    Finished,
    /// The transport closed. `reset` tells whether the session went back to
    /// idle, which happens unless the game had already ended.
    Closed {
        reason: Option<String>,
        reset: bool,
    },
}

#[derive(Debug)]
enum Inbound {
    Frame(String),
    /// The loop ended on its own. Carries the error, if any.
    Closed(Option<String>),
}

/// Channels and tasks of one open transport.
struct Link {
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    shutdown: oneshot::Sender<()>,
    keepalive: JoinHandle<()>,
    transport_loop: JoinHandle<()>,
}

impl Link {
    /// Stop the keepalive and tell the loop to close. Doesn't wait. Dropping
    /// the inbound receiver here means nothing the old loop still reads can
    /// reach a later session.
    fn retire(self) -> JoinHandle<()> {
        let Self {
            shutdown,
            keepalive,
            transport_loop,
            ..
        } = self;
        keepalive.abort();
        // Err means the loop already ended
        let _ = shutdown.send(());
        transport_loop
    }
}

pub struct ConnectionManager<C: Connector> {
    connector: C,
    keepalive_period: Duration,
    machine: SessionMachine,
    name: String,
    chat_log: VecDeque<ChatMessage>,
    link: Option<Link>,
    closing: Option<JoinHandle<()>>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, keepalive_period: Duration, settings: SessionSettings) -> Self {
        Self {
            connector,
            keepalive_period,
            machine: SessionMachine::new(settings),
            name: String::new(),
            chat_log: VecDeque::new(),
            link: None,
            closing: None,
        }
    }

    /// Open a new session, closing any existing one first.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport can't be opened. The session is
    /// left idle.
    pub async fn connect(
        &mut self,
        endpoint: &Url,
        params: &SessionParams,
    ) -> Result<(), TransportError> {
        if self.link.is_some() {
            tracing::info!("closing the current session before reconnecting");
        }
        self.retire_link();
        self.finish_closing().await;
        self.machine.reset();
        self.chat_log.clear();

        let url = game_url(endpoint, params);
        tracing::info!(%url, "connecting");
        let transport = self.connector.open(&url).await?;

        self.machine.begin_session();
        self.name.clone_from(&params.name);

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let transport_loop = tokio::spawn(transport_loop(
            transport,
            outbound_rx,
            inbound_tx,
            shutdown_rx,
        ));
        let keepalive = spawn_keepalive(outbound_tx.clone(), self.keepalive_period);
        tracing::info!(period = ?self.keepalive_period, "connected, keepalive started");

        self.link = Some(Link {
            outbound: outbound_tx,
            inbound: inbound_rx,
            shutdown: shutdown_tx,
            keepalive,
            transport_loop,
        });
        Ok(())
    }

    /// Close the session. The keepalive is stopped and sends become no-ops
    /// before anything is awaited. Resets to idle unless the game is over.
    pub async fn disconnect(&mut self, reason: &str) {
        tracing::info!(reason, "disconnecting");
        self.retire_link();
        self.machine.transport_closed();
        self.finish_closing().await;
    }

    /// Wait for the next inbound change. Frames that don't decode or don't
    /// apply are skipped. Returns `None` when there's no open transport.
    ///
    /// Cancel safe.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        loop {
            let link = self.link.as_mut()?;
            let inbound = link
                .inbound
                .recv()
                .await
                .unwrap_or_else(|| Inbound::Closed(Some("transport loop ended".to_string())));

            match inbound {
                Inbound::Frame(frame) => {
                    let Some(event) = messages::decode(&frame) else {
                        continue;
                    };
                    match self.machine.apply(event) {
                        Applied::Updated => return Some(SessionUpdate::Changed),
                        Applied::Chat(message) => {
                            self.log_chat(message.clone());
                            return Some(SessionUpdate::Chat(message));
                        }
                        Applied::Ignored => {}
                        Applied::Finished => {
                            tracing::info!("game over, closing transport");
                            self.retire_link();
                            return Some(SessionUpdate::Finished);
                        }
                    }
                }
                Inbound::Closed(reason) => {
                    tracing::info!(reason = reason.as_deref().unwrap_or("closed by server"), "transport closed");
                    self.retire_link();
                    let reset = self.machine.transport_closed();
                    return Some(SessionUpdate::Closed { reason, reset });
                }
            }
        }
    }

    /// Queue an intent on the open transport. Returns whether it was queued;
    /// without an open transport this does nothing.
    pub fn send_action(&self, intent: &ClientIntent) -> bool {
        let Some(link) = &self.link else {
            tracing::debug!(%intent, "not connected, dropping");
            return false;
        };
        match messages::encode(intent) {
            Ok(frame) => {
                let sent = link.outbound.send(frame).is_ok();
                if !sent {
                    tracing::debug!(%intent, "transport loop gone, dropping");
                }
                sent
            }
            Err(error) => {
                tracing::warn!(%error, "failed to encode intent");
                false
            }
        }
    }

    // === Player actions ===

    /// The armed modifier is spent even if the frame is dropped. Dropped
    /// frames are logged at debug.
    pub fn draw(&mut self) -> Result<(), ActionError> {
        let intent = self.machine.draw()?;
        self.send_action(&intent);
        Ok(())
    }

    pub fn stand(&mut self) -> Result<(), ActionError> {
        let intent = self.machine.stand()?;
        self.send_action(&intent);
        Ok(())
    }

    /// Toggle the modifier for the next action. Nothing is sent.
    pub fn arm_modifier(&mut self, key: ModifierKey) -> Result<Option<ModifierKey>, ActionError> {
        self.machine.arm_modifier(key)
    }

    pub fn disarm_modifier(&mut self) {
        self.machine.disarm_modifier();
    }

    pub fn advance_round(&mut self) -> Result<(), ActionError> {
        self.machine.advance_round()
    }

    /// Send a chat line under the session's display name. The line is
    /// echoed into the chat log and returned.
    pub fn chat(&mut self, text: &str) -> Result<ChatMessage, ActionError> {
        let intent = self.machine.chat(&self.name, text)?;
        self.send_action(&intent);
        let message = ChatMessage {
            user: self.name.clone(),
            text: text.trim().to_string(),
        };
        self.log_chat(message.clone());
        Ok(message)
    }

    fn log_chat(&mut self, message: ChatMessage) {
        if self.chat_log.len() == MAX_CHAT_LINES {
            self.chat_log.pop_front();
        }
        self.chat_log.push_back(message);
    }

    // === Queries ===

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    #[must_use]
    pub fn machine(&self) -> &SessionMachine {
        &self.machine
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        self.machine.view()
    }

    /// Chat lines of the current session, oldest first.
    #[must_use]
    pub fn chat_log(&self) -> &VecDeque<ChatMessage> {
        &self.chat_log
    }

    fn retire_link(&mut self) {
        if let Some(link) = self.link.take() {
            tracing::debug!("keepalive stopped");
            let handle = link.retire();
            if let Some(previous) = self.closing.replace(handle) {
                previous.abort();
            }
        }
    }

    async fn finish_closing(&mut self) {
        if let Some(mut handle) = self.closing.take()
            && time::timeout(SHUTDOWN_TIMEOUT, &mut handle).await.is_err()
        {
            tracing::warn!("transport didn't close in time, aborting");
            handle.abort();
        }
    }
}

fn spawn_keepalive(outbound: mpsc::UnboundedSender<String>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        loop {
            ticker.tick().await;
            if outbound.send(KEEPALIVE_TOKEN.to_string()).is_err() {
                break;
            }
        }
    })
}

async fn transport_loop<T: Transport>(
    mut transport: T,
    mut outbound: mpsc::UnboundedReceiver<String>,
    inbound: mpsc::UnboundedSender<Inbound>,
    mut shutdown: oneshot::Receiver<()>,
) {
    tracing::debug!("transport loop started");
    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                if let Err(error) = transport.close().await {
                    tracing::warn!(%error, "failed to close transport");
                }
                break;
            }

            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    let _ = transport.close().await;
                    break;
                };
                if let Err(error) = transport.send(frame).await {
                    tracing::warn!(%error, "transport send failed");
                    let _ = inbound.send(Inbound::Closed(Some(error.to_string())));
                    break;
                }
            }

            incoming = transport.recv() => {
                match incoming {
                    Some(Ok(frame)) => {
                        if inbound.send(Inbound::Frame(frame)).is_err() {
                            let _ = transport.close().await;
                            break;
                        }
                    }
                    Some(Err(error)) => {
                        tracing::warn!(%error, "transport receive failed");
                        let _ = inbound.send(Inbound::Closed(Some(error.to_string())));
                        break;
                    }
                    None => {
                        let _ = inbound.send(Inbound::Closed(None));
                        break;
                    }
                }
            }
        }
    }
    tracing::debug!("transport loop ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(name: &str) -> SessionParams {
        SessionParams {
            desired_players: 3,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_game_url() {
        let endpoint = Url::parse("ws://localhost:8000/ws/game").unwrap();
        let url = game_url(&endpoint, &params("Operador_21"));
        assert_eq!(
            url.as_str(),
            "ws://localhost:8000/ws/game?desired_players=3&name=Operador_21"
        );
    }

    #[test]
    fn test_game_url_encodes_name() {
        let endpoint = Url::parse("wss://example.com/ws/game").unwrap();
        let url = game_url(&endpoint, &params("Ana & Bo"));
        assert_eq!(
            url.as_str(),
            "wss://example.com/ws/game?desired_players=3&name=Ana+%26+Bo"
        );
    }

    #[test]
    fn test_game_url_replaces_query() {
        let endpoint = Url::parse("ws://localhost:8000/ws/game?name=old").unwrap();
        let url = game_url(&endpoint, &params("new"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("desired_players".to_string(), "3".to_string()),
                ("name".to_string(), "new".to_string()),
            ]
        );
    }
}
