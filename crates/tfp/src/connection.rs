//! IP connection to the bridge daemon
//!
//! A connection owns one TCP socket. A session task reads packets off the
//! socket, hands responses to the request that is waiting for them and
//! dispatches callbacks to whoever registered for them. When the socket goes
//! away without `disconnect()` being called the session reconnects on its own
//! and reports `ConnectReason::AutoReconnect`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::packet::{BROADCAST_UID, MAX_PACKET_SIZE, Packet, function};
use crate::types::{ConnectReason, DisconnectReason, EnumerateEvent};

/// Connection tuning
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// How long a request waits for its response
    pub timeout: Duration,
    /// Reconnect after the socket is lost
    pub auto_reconnect: bool,
    /// Delay between reconnect attempts
    pub reconnect_interval: Duration,
    /// Send a keepalive request after this long without traffic
    pub keepalive_interval: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(2500),
            auto_reconnect: true,
            reconnect_interval: Duration::from_millis(100),
            keepalive_interval: Duration::from_secs(5),
        }
    }
}

/// Handler invoked with the payload of a device callback
type CallbackHandler = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Key used to match a response to its request
type ResponseKey = (u32, u8, u8);

struct Inner {
    config: ConnectionConfig,
    writer: tokio::sync::Mutex<Option<OwnedWriteHalf>>,
    session: parking_lot::Mutex<Option<JoinHandle<()>>>,
    connected: AtomicBool,
    sequence: AtomicU8,
    pending: DashMap<ResponseKey, oneshot::Sender<Packet>>,
    callbacks: DashMap<(u32, u8), CallbackHandler>,
    enumerate_listeners: parking_lot::Mutex<Vec<mpsc::UnboundedSender<EnumerateEvent>>>,
    connected_listeners: parking_lot::Mutex<Vec<mpsc::UnboundedSender<ConnectReason>>>,
}

/// Cloneable handle to a bridge connection
#[derive(Clone)]
pub struct IpConnection {
    inner: Arc<Inner>,
}

impl Default for IpConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl IpConnection {
    pub fn new() -> Self {
        Self::with_config(ConnectionConfig::default())
    }

    pub fn with_config(config: ConnectionConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                writer: tokio::sync::Mutex::new(None),
                session: parking_lot::Mutex::new(None),
                connected: AtomicBool::new(false),
                sequence: AtomicU8::new(0),
                pending: DashMap::new(),
                callbacks: DashMap::new(),
                enumerate_listeners: parking_lot::Mutex::new(Vec::new()),
                connected_listeners: parking_lot::Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    /// Whether the socket is currently open
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Open the connection and start the session task.
    pub async fn connect(&self, host: &str, port: u16) -> Result<()> {
        if self.has_session() {
            return Err(Error::AlreadyConnected);
        }

        let stream = TcpStream::connect((host, port)).await?;
        let reader = self.inner.attach(stream).await;

        let session = tokio::spawn(Inner::run_session(
            self.inner.clone(),
            host.to_string(),
            port,
            reader,
        ));
        *self.inner.session.lock() = Some(session);

        tracing::info!("Connected to {}:{}", host, port);
        self.inner.notify_connected(ConnectReason::Request);
        Ok(())
    }

    /// Close the connection. Stops auto-reconnect.
    ///
    /// A session that already ended on its own (auto-reconnect off) counts as
    /// not connected.
    pub async fn disconnect(&self) -> Result<()> {
        let session = self.inner.session.lock().take();
        let Some(session) = session.filter(|session| !session.is_finished()) else {
            return Err(Error::NotConnected);
        };

        session.abort();
        let _ = session.await;

        self.inner.connection_lost(DisconnectReason::Request).await;
        Ok(())
    }

    /// Ask every attached device to report itself via an enumerate callback.
    pub async fn enumerate(&self) -> Result<()> {
        self.send_without_response(BROADCAST_UID, function::ENUMERATE, &[])
            .await
    }

    /// Send a request and wait for its response payload.
    pub async fn request(&self, uid: u32, function_id: u8, payload: &[u8]) -> Result<Bytes> {
        let sequence = self.inner.next_sequence();
        let key = (uid, function_id, sequence);
        let packet = Packet::request(uid, function_id, sequence, true, payload);

        let (tx, rx) = oneshot::channel();
        self.inner.pending.insert(key, tx);

        if let Err(e) = self.inner.send(&packet).await {
            self.inner.pending.remove(&key);
            return Err(e);
        }

        match tokio::time::timeout(self.inner.config.timeout, rx).await {
            Ok(Ok(response)) => match Error::from_error_code(response.header.error_code) {
                Some(e) => Err(e),
                None => Ok(response.payload),
            },
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                self.inner.pending.remove(&key);
                Err(Error::Timeout)
            }
        }
    }

    /// Send a request without asking for a response.
    pub async fn send_without_response(
        &self,
        uid: u32,
        function_id: u8,
        payload: &[u8],
    ) -> Result<()> {
        let sequence = self.inner.next_sequence();
        let packet = Packet::request(uid, function_id, sequence, false, payload);
        self.inner.send(&packet).await
    }

    /// Register the handler for callbacks of `function_id` from `uid`.
    ///
    /// Replaces any handler previously registered for the same pair.
    pub fn register_callback<F>(&self, uid: u32, function_id: u8, handler: F)
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        self.inner.callbacks.insert((uid, function_id), Arc::new(handler));
    }

    /// Stream of enumerate callbacks
    pub fn enumerate_events(&self) -> mpsc::UnboundedReceiver<EnumerateEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.enumerate_listeners.lock().push(tx);
        rx
    }

    /// Stream of connect notifications
    pub fn connected_events(&self) -> mpsc::UnboundedReceiver<ConnectReason> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.connected_listeners.lock().push(tx);
        rx
    }

    fn has_session(&self) -> bool {
        self.inner
            .session
            .lock()
            .as_ref()
            .is_some_and(|session| !session.is_finished())
    }
}

impl Inner {
    fn next_sequence(&self) -> u8 {
        (self.sequence.fetch_add(1, Ordering::SeqCst) % 15) + 1
    }

    async fn attach(&self, stream: TcpStream) -> OwnedReadHalf {
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!("Could not set TCP_NODELAY: {}", e);
        }

        let (reader, writer) = stream.into_split();
        *self.writer.lock().await = Some(writer);
        self.connected.store(true, Ordering::SeqCst);
        reader
    }

    async fn send(&self, packet: &Packet) -> Result<()> {
        let mut writer = self.writer.lock().await;
        let Some(writer) = writer.as_mut() else {
            return Err(Error::NotConnected);
        };

        writer.write_all(&packet.to_bytes()).await?;
        Ok(())
    }

    /// Read, reconnect, repeat. Ends when auto-reconnect is off or the task
    /// is aborted by `disconnect()`.
    async fn run_session(inner: Arc<Inner>, host: String, port: u16, mut reader: OwnedReadHalf) {
        loop {
            let reason = inner.read_packets(&mut reader).await;
            inner.connection_lost(reason).await;

            if !inner.config.auto_reconnect {
                return;
            }

            reader = inner.reconnect(&host, port).await;
            tracing::info!("Reconnected to {}:{}", host, port);
            inner.notify_connected(ConnectReason::AutoReconnect);
        }
    }

    async fn reconnect(&self, host: &str, port: u16) -> OwnedReadHalf {
        loop {
            tokio::time::sleep(self.config.reconnect_interval).await;

            match TcpStream::connect((host, port)).await {
                Ok(stream) => return self.attach(stream).await,
                Err(e) => tracing::debug!("Reconnect to {}:{} failed: {}", host, port, e),
            }
        }
    }

    async fn read_packets(&self, reader: &mut OwnedReadHalf) -> DisconnectReason {
        let mut buf = BytesMut::with_capacity(MAX_PACKET_SIZE * 4);
        let mut keepalive = tokio::time::interval(self.config.keepalive_interval);
        keepalive.tick().await;
        let mut last_received = Instant::now();

        loop {
            tokio::select! {
                read = reader.read_buf(&mut buf) => match read {
                    Ok(0) => return DisconnectReason::Shutdown,
                    Ok(_) => {
                        last_received = Instant::now();
                        loop {
                            match Packet::take_from(&mut buf) {
                                Ok(Some(packet)) => self.dispatch(packet),
                                Ok(None) => break,
                                Err(e) => {
                                    tracing::warn!("Dropping connection: {}", e);
                                    return DisconnectReason::Error;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Socket error: {}", e);
                        return DisconnectReason::Error;
                    }
                },
                _ = keepalive.tick() => {
                    if last_received.elapsed() >= self.config.keepalive_interval {
                        let packet = Packet::request(
                            BROADCAST_UID,
                            function::KEEPALIVE,
                            self.next_sequence(),
                            false,
                            &[],
                        );
                        if let Err(e) = self.send(&packet).await {
                            tracing::debug!("Keepalive failed: {}", e);
                        }
                    }
                }
            }
        }
    }

    fn dispatch(&self, packet: Packet) {
        let header = packet.header;

        if !header.is_callback() {
            match self.pending.remove(&(header.uid, header.function_id, header.sequence)) {
                Some((_, tx)) => {
                    let _ = tx.send(packet);
                }
                None => tracing::debug!(
                    "Unexpected response: uid={}, function={}, sequence={}",
                    header.uid,
                    header.function_id,
                    header.sequence
                ),
            }
            return;
        }

        if header.function_id == function::CALLBACK_ENUMERATE {
            match EnumerateEvent::decode(&packet.payload) {
                Ok(event) => self
                    .enumerate_listeners
                    .lock()
                    .retain(|tx| tx.send(event.clone()).is_ok()),
                Err(e) => tracing::warn!("Bad enumerate callback: {}", e),
            }
            return;
        }

        let handler = self
            .callbacks
            .get(&(header.uid, header.function_id))
            .map(|entry| entry.value().clone());

        match handler {
            Some(handler) => handler(&packet.payload[..]),
            None => tracing::trace!(
                "No handler for callback: uid={}, function={}",
                header.uid,
                header.function_id
            ),
        }
    }

    async fn connection_lost(&self, reason: DisconnectReason) {
        self.connected.store(false, Ordering::SeqCst);

        if let Some(mut writer) = self.writer.lock().await.take() {
            let _ = writer.shutdown().await;
        }

        // Dropping the senders wakes every waiting request with ConnectionClosed
        self.pending.clear();

        match reason {
            DisconnectReason::Request => tracing::info!("Disconnected"),
            other => tracing::warn!("Connection lost ({:?})", other),
        }
    }

    fn notify_connected(&self, reason: ConnectReason) {
        self.connected_listeners
            .lock()
            .retain(|tx| tx.send(reason).is_ok());
    }
}
