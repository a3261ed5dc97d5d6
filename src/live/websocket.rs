//! WebSocket client for the live endpoint

use std::collections::VecDeque;

use futures::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use async_trait::async_trait;

use crate::live::protocol::{ClientMessage, ServerMessage};
use crate::live::{LiveTransport, ServerEvent, SessionSetup};
use crate::{Error, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Live session over a WebSocket connection
pub struct WsLive {
    endpoint: String,
    api_key: SecretString,
    socket: Option<WsStream>,
    queued: VecDeque<ServerEvent>,
    remote_closed: bool,
}

impl WsLive {
    /// Create a client for the given endpoint
    #[must_use]
    pub fn new(endpoint: String, api_key: SecretString) -> Self {
        Self {
            endpoint,
            api_key,
            socket: None,
            queued: VecDeque::new(),
            remote_closed: false,
        }
    }

    /// Endpoint URL with the API key attached
    fn connect_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| Error::Connection(format!("invalid live endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("key", self.api_key.expose_secret());
        Ok(url)
    }

    /// Read messages until the handshake acknowledgement arrives
    async fn await_setup_complete(socket: &mut WsStream) -> Result<()> {
        while let Some(message) = socket.next().await {
            let message = message.map_err(|e| Error::Connection(e.to_string()))?;
            let Some(parsed) = parse_server_message(&message) else {
                continue;
            };
            if parsed.setup_complete.is_some() {
                return Ok(());
            }
            tracing::warn!("unexpected message before setup acknowledgement");
        }
        Err(Error::Connection(
            "stream closed during handshake".to_string(),
        ))
    }
}

/// Parse a WebSocket frame as a server message, if it carries one
fn parse_server_message(message: &Message) -> Option<ServerMessage> {
    let parsed = match message {
        Message::Text(text) => serde_json::from_str(text),
        Message::Binary(bytes) => serde_json::from_slice(bytes),
        _ => return None,
    };

    match parsed {
        Ok(server_message) => Some(server_message),
        Err(e) => {
            tracing::warn!(error = %e, "skipping unparseable server message");
            None
        }
    }
}

#[async_trait]
impl LiveTransport for WsLive {
    async fn connect(&mut self, setup: &SessionSetup) -> Result<()> {
        if self.socket.is_some() {
            return Err(Error::Connection("already connected".to_string()));
        }

        let url = self.connect_url()?;
        tracing::debug!(model = %setup.model, voice = %setup.voice, "connecting live session");

        let (mut socket, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        let handshake = serde_json::to_string(&ClientMessage::setup(setup))?;
        socket
            .send(Message::Text(handshake))
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        Self::await_setup_complete(&mut socket).await?;

        self.socket = Some(socket);
        self.remote_closed = false;
        tracing::info!("live session established");
        Ok(())
    }

    async fn send_audio(&mut self, pcm: &[u8]) -> Result<()> {
        let socket = self
            .socket
            .as_mut()
            .ok_or_else(|| Error::Connection("not connected".to_string()))?;

        let frame = serde_json::to_string(&ClientMessage::audio_frame(pcm))?;
        socket
            .send(Message::Text(frame))
            .await
            .map_err(|e| Error::Connection(e.to_string()))
    }

    async fn next_event(&mut self) -> Option<Result<ServerEvent>> {
        loop {
            if let Some(event) = self.queued.pop_front() {
                return Some(Ok(event));
            }
            if self.remote_closed {
                return None;
            }

            let socket = self.socket.as_mut()?;
            match socket.next().await {
                Some(Ok(Message::Close(_))) | None => {
                    self.remote_closed = true;
                    return Some(Ok(ServerEvent::Closed));
                }
                Some(Ok(message)) => {
                    if let Some(parsed) = parse_server_message(&message) {
                        self.queued.extend(parsed.into_events());
                    }
                }
                Some(Err(e)) => {
                    self.remote_closed = true;
                    return Some(Err(Error::Connection(e.to_string())));
                }
            }
        }
    }

    async fn close(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            if let Err(e) = socket.close(None).await {
                tracing::debug!(error = %e, "error closing live socket");
            }
        }
        self.queued.clear();
    }
}
