//! Single WebSocket connection to the push feed.
//!
//! A `FeedConnection`:
//! 1. Connects to the feed WebSocket endpoint (TLS).
//! 2. Sends the subscription message.
//! 3. Hands each received frame's payload to the caller as a raw byte chunk.
//! 4. Sends periodic keep-alive pings while waiting, if configured.
//!
//! There is no reconnect: a failed dial, a read error, a close frame, or the
//! end of the stream is returned as a [`FeedError`] and the caller stops.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderName, HeaderValue, ORIGIN};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::error::FeedError;

/// Keep-alive message understood by the feed; answered with `{"op":"pong"}`.
pub const PING_MSG: &str = r#"{"op":"ping"}"#;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration for the feed connection.
#[derive(Debug, Clone)]
pub struct WsConnConfig {
    /// Full WebSocket URL (e.g. `wss://ws.blockchain.info:443/inv`).
    pub url: String,
    /// Message to send immediately after connection (subscription request).
    pub subscribe_msg: Option<String>,
    /// `Origin` header for the handshake.
    pub origin: Option<String>,
    /// Extra HTTP headers for the handshake.
    pub extra_headers: HashMap<String, String>,
    /// Interval between keep-alive pings.
    pub ping_interval: Option<Duration>,
}

impl WsConnConfig {
    /// Build the connection config from the `feed` section of the app config.
    pub fn from_feed(feed: &FeedConfig) -> Self {
        Self {
            url: feed.effective_url(),
            subscribe_msg: Some(feed.subscribe_msg()),
            origin: Some(feed.effective_origin()),
            extra_headers: feed.extra_headers.clone().unwrap_or_default(),
            ping_interval: feed.ping_interval(),
        }
    }
}

/// An established, subscribed feed connection.
pub struct FeedConnection {
    url: String,
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
    ping: Option<Interval>,
}

impl FeedConnection {
    /// Dial the feed and send the subscription message.
    pub async fn connect(config: &WsConnConfig) -> Result<Self, FeedError> {
        info!("[feed] connecting to {}", config.url);

        let mut request = config.url.as_str().into_client_request().map_err(ws_err)?;
        let headers = request.headers_mut();
        if let Some(origin) = &config.origin {
            headers.insert(ORIGIN, HeaderValue::from_str(origin).map_err(ws_err)?);
        }
        for (key, value) in &config.extra_headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(ws_err)?;
            headers.insert(name, HeaderValue::from_str(value).map_err(ws_err)?);
        }

        let (stream, _response) = tokio_tungstenite::connect_async(request).await.map_err(ws_err)?;
        info!("[feed] connected");

        let (mut write, read) = stream.split();

        if let Some(ref sub_msg) = config.subscribe_msg {
            info!("[feed] subscribing with {sub_msg}");
            write.send(Message::Text(sub_msg.clone().into())).await.map_err(ws_err)?;
        }

        let ping = config.ping_interval.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        Ok(Self { url: config.url.clone(), write, read, ping })
    }

    /// Wait for the next frame and return its payload bytes.
    ///
    /// Control frames are handled internally. Any condition that ends the
    /// connection is returned as an error.
    pub async fn next_chunk(&mut self) -> Result<Vec<u8>, FeedError> {
        loop {
            tokio::select! {
                msg = self.read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => return Ok(text.as_bytes().to_vec()),
                        Some(Ok(Message::Binary(data))) => return Ok(data.to_vec()),
                        Some(Ok(Message::Ping(data))) => {
                            self.write.send(Message::Pong(data)).await.map_err(ws_err)?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            warn!("[feed] received close frame from {}", self.url);
                            let reason = frame.map(|f| f.reason.as_str().to_string()).unwrap_or_default();
                            return Err(FeedError::StreamClosed(format!("close frame: {reason}")));
                        }
                        Some(Err(e)) => return Err(ws_err(e)),
                        None => return Err(FeedError::StreamClosed("stream ended".into())),
                        _ => {} // Pong, Frame — ignore
                    }
                }

                _ = ping_tick(&mut self.ping) => {
                    debug!("[feed] ping");
                    self.write.send(Message::Text(PING_MSG.into())).await.map_err(ws_err)?;
                }
            }
        }
    }

    /// Send a close frame. Errors are ignored; the connection is going away.
    pub async fn close(mut self) {
        let _ = self.write.close().await;
        info!("[feed] closed connection to {}", self.url);
    }
}

/// Resolves on the next ping tick, or never if pinging is disabled.
async fn ping_tick(ping: &mut Option<Interval>) {
    match ping {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn ws_err(e: impl std::fmt::Display) -> FeedError {
    FeedError::WebSocket(e.to_string())
}
