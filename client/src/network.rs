//! Online play: the channel contract, its transports, and the relay
//! controller that stands in for the remote player.
//!
//! The manager only ever polls. Anything asynchronous lives behind a
//! [`NetworkChannel`] and hands packets over through non-blocking queues.

use crate::controller::InputController;
use log::{debug, info, warn};
use pong_shared::protocol::PROTOCOL_VERSION;
use pong_shared::{CodecError, GameStateView, Movement, Packet, ServerSnapshot, Side, SideMap};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("channel is closed")]
    Closed,

    #[error("invalid server address {0}")]
    Address(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// What the simulation needs from a connection to the authority.
pub trait NetworkChannel {
    /// Queues a packet for delivery. Never waits on the network.
    fn send(&mut self, packet: Packet) -> Result<(), NetworkError>;

    /// Next received packet, if one is waiting.
    fn try_recv(&mut self) -> Option<Packet>;

    /// Shuts the channel down. Safe to call more than once.
    fn close(&mut self);
}

/// In-process link over unbounded mpsc queues.
pub struct ChannelLink {
    outbound: Option<UnboundedSender<Packet>>,
    inbound: UnboundedReceiver<Packet>,
}

impl ChannelLink {
    /// Two connected ends: what one sends, the other receives.
    pub fn pair() -> (ChannelLink, ChannelLink) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (
            ChannelLink {
                outbound: Some(a_tx),
                inbound: b_rx,
            },
            ChannelLink {
                outbound: Some(b_tx),
                inbound: a_rx,
            },
        )
    }

    pub fn is_open(&self) -> bool {
        self.outbound
            .as_ref()
            .map(|tx| !tx.is_closed())
            .unwrap_or(false)
    }
}

impl NetworkChannel for ChannelLink {
    fn send(&mut self, packet: Packet) -> Result<(), NetworkError> {
        let sender = self.outbound.as_ref().ok_or(NetworkError::Closed)?;
        sender.send(packet).map_err(|_| NetworkError::Closed)
    }

    fn try_recv(&mut self) -> Option<Packet> {
        match self.inbound.try_recv() {
            Ok(packet) => Some(packet),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    fn close(&mut self) {
        self.outbound = None;
        self.inbound.close();
    }
}

/// UDP transport. Two background tasks move bincode packets between the
/// socket and a [`ChannelLink`]; the game side only touches the link.
pub struct UdpLink {
    link: ChannelLink,
    reader: Option<JoinHandle<()>>,
    server_addr: SocketAddr,
}

impl UdpLink {
    /// Binds a local socket, sends `Hello`, and starts the bridge tasks.
    /// Must be called from within a tokio runtime.
    pub async fn connect(server_addr: &str, name: &str) -> Result<Self, NetworkError> {
        let server_addr: SocketAddr = server_addr
            .parse()
            .map_err(|_| NetworkError::Address(server_addr.to_string()))?;
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(server_addr).await?;

        let hello = Packet::Hello {
            client_version: PROTOCOL_VERSION,
            name: name.to_string(),
        };
        socket.send(&hello.encode()?).await?;
        info!("Connecting to {}", server_addr);

        let socket = std::sync::Arc::new(socket);
        let (game_end, mut wire_end) = ChannelLink::pair();

        let inbound_tx = wire_end
            .outbound
            .take()
            .ok_or(NetworkError::Closed)?;
        let recv_socket = std::sync::Arc::clone(&socket);
        let reader = tokio::spawn(async move {
            let mut buffer = [0u8; 2048];
            loop {
                match recv_socket.recv(&mut buffer).await {
                    Ok(len) => match Packet::decode(&buffer[..len]) {
                        Ok(packet) => {
                            if inbound_tx.send(packet).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Dropping undecodable packet: {}", e),
                    },
                    Err(e) => {
                        warn!("Error receiving packet: {}", e);
                        break;
                    }
                }
            }
        });

        let mut outbound_rx = wire_end.inbound;
        let writer = tokio::spawn(async move {
            while let Some(packet) = outbound_rx.recv().await {
                match packet.encode() {
                    Ok(data) => {
                        if let Err(e) = socket.send(&data).await {
                            warn!("Error sending packet: {}", e);
                        }
                    }
                    Err(e) => warn!("Dropping unencodable packet: {}", e),
                }
            }
        });

        // The writer exits by itself once the game end drops its sender.
        drop(writer);

        Ok(Self {
            link: game_end,
            reader: Some(reader),
            server_addr,
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }
}

impl NetworkChannel for UdpLink {
    fn send(&mut self, packet: Packet) -> Result<(), NetworkError> {
        self.link.send(packet)
    }

    fn try_recv(&mut self) -> Option<Packet> {
        self.link.try_recv()
    }

    fn close(&mut self) {
        if self.link.is_open() {
            let _ = self.link.send(Packet::Disconnect {
                reason: "client closed".to_string(),
            });
        }
        self.link.close();
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

impl Drop for UdpLink {
    fn drop(&mut self) {
        self.close();
    }
}

/// Relays local movement to the authority and collects its snapshots.
pub struct NetworkController {
    channel: Option<Box<dyn NetworkChannel>>,
    local_side: Side,
    assigned_side: Option<Side>,
    side_map: Option<SideMap>,
    latest: Option<ServerSnapshot>,
    last_delivered_tick: Option<u32>,
    last_sent: Movement,
    next_sequence: u32,
}

impl NetworkController {
    /// `local_side` is the side this client expects to play.
    pub fn new(channel: Box<dyn NetworkChannel>, local_side: Side) -> Self {
        Self {
            channel: Some(channel),
            local_side,
            assigned_side: None,
            side_map: None,
            latest: None,
            last_delivered_tick: None,
            last_sent: Movement::Idle,
            next_sequence: 1,
        }
    }

    /// Fire-and-forget. A failed send is logged and dropped.
    pub fn send_movement(&mut self, movement: Movement) {
        self.last_sent = movement;
        let Some(channel) = self.channel.as_mut() else {
            return;
        };

        let packet = Packet::Movement {
            sequence: self.next_sequence,
            movement,
        };
        self.next_sequence = self.next_sequence.wrapping_add(1);

        if let Err(e) = channel.send(packet) {
            warn!("Error sending movement: {}", e);
        }
    }

    /// Most recent snapshot received since the last call, if any. Snapshots
    /// older than the last one handed out are dropped.
    pub fn server_game_state(&mut self) -> Option<ServerSnapshot> {
        self.drain_inbound();
        let snapshot = self.latest.take()?;
        self.last_delivered_tick = Some(snapshot.tick);
        Some(snapshot)
    }

    pub fn side_map(&self) -> Option<SideMap> {
        self.side_map
    }

    /// Side the server placed this client on, once the session has started.
    pub fn assigned_side(&self) -> Option<Side> {
        self.assigned_side
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    fn drain_inbound(&mut self) {
        let Some(channel) = self.channel.as_mut() else {
            return;
        };

        let mut disconnected = false;
        while let Some(packet) = channel.try_recv() {
            match packet {
                Packet::SessionStart { left, right, you } => {
                    info!("Session started: left={} right={} you={}", left, right, you);
                    let sides = SideMap { left, right };
                    self.side_map = Some(sides);
                    self.assigned_side = sides.side_of(you);
                    self.latest = None;
                    self.last_delivered_tick = None;

                    match self.assigned_side {
                        Some(side) if side != self.local_side => warn!(
                            "Server placed us on the {} side, configured for {}",
                            side, self.local_side
                        ),
                        None => warn!("Session id {} is not one of the two players", you),
                        Some(_) => {}
                    }
                }
                Packet::Snapshot(snapshot) => {
                    let after_delivered = self
                        .last_delivered_tick
                        .map(|tick| snapshot.tick > tick)
                        .unwrap_or(true);
                    let newer = after_delivered
                        && self
                            .latest
                            .as_ref()
                            .map(|current| snapshot.tick >= current.tick)
                            .unwrap_or(true);
                    if newer {
                        self.latest = Some(snapshot);
                    } else {
                        debug!("Discarding stale snapshot for tick {}", snapshot.tick);
                    }
                }
                Packet::Disconnect { reason } => {
                    warn!("Disconnected: {}", reason);
                    disconnected = true;
                    break;
                }
                other => {
                    warn!("Unexpected packet type: {:?}", other);
                }
            }
        }

        if disconnected {
            self.destroy();
        }
    }
}

impl InputController for NetworkController {
    fn movement(&mut self, _view: GameStateView<'_>) -> Movement {
        self.last_sent
    }

    fn destroy(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
    }

    fn as_network_mut(&mut self) -> Option<&mut NetworkController> {
        Some(self)
    }
}
