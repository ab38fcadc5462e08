//! Server network layer: UDP transport and the single-writer event loop

use crate::client_manager::ClientManager;
use crate::config::{RejectionPolicy, ServerConfig};
use crate::game::{Dispatch, Rejection, Session};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: u32 },
    Shutdown,
}

/// Messages sent from the main loop to the sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
        exclude: Option<u32>,
    },
}

/// Stops a running server from another task
#[derive(Clone)]
pub struct ShutdownHandle {
    server_tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        if self.server_tx.send(ServerMessage::Shutdown).is_err() {
            debug!("Server already stopped");
        }
    }
}

/// Game server owning the session
///
/// Only `run` touches the session, one event at a time, so transitions are
/// serialized without a lock around the game state.
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    session: Session,
    rejection_policy: RejectionPolicy,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        config: &ServerConfig,
        session: Session,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(config.bind_addr()).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(
                config.max_connections,
                config.client_timeout,
            ))),
            session,
            rejection_policy: config.rejection_policy,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            server_tx: self.server_tx.clone(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Spawns task that continuously listens for incoming packets
    async fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes outgoing packet queue
    async fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastPacket { packet, exclude } => {
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_client_addrs()
                        };

                        for (client_id, addr) in client_addrs {
                            if Some(client_id) == exclude {
                                continue;
                            }

                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to client {}: {}", client_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    async fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        return;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    fn broadcast_packet(&self, packet: Packet, exclude: Option<u32>) {
        if let Err(e) = self
            .game_tx
            .send(GameMessage::BroadcastPacket { packet, exclude })
        {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Queues the packets a transition produced, in order
    async fn dispatch(&self, dispatches: Vec<Dispatch>) {
        for dispatch in dispatches {
            match dispatch {
                Dispatch::ToClient { client_id, packet } => {
                    let addr = {
                        let clients = self.clients.read().await;
                        clients.addr_of(client_id)
                    };

                    match addr {
                        Some(addr) => self.send_packet(packet, addr),
                        None => debug!("Client {} is gone, dropping packet", client_id),
                    }
                }
                Dispatch::Broadcast { packet, exclude } => self.broadcast_packet(packet, exclude),
            }
        }
    }

    /// Single decision point for refused transitions
    async fn reject(&self, client_id: u32, rejection: Rejection) {
        debug!("Ignoring request from client {}: {}", client_id, rejection);

        if self.rejection_policy == RejectionPolicy::Notify {
            self.dispatch(vec![Dispatch::ToClient {
                client_id,
                packet: Packet::Rejected {
                    reason: rejection.to_string(),
                },
            }])
            .await;
        }
    }

    async fn apply(&self, client_id: u32, result: Result<Vec<Dispatch>, Rejection>) {
        match result {
            Ok(dispatches) => self.dispatch(dispatches).await,
            Err(rejection) => self.reject(client_id, rejection).await,
        }
    }

    async fn handle_connect(&mut self, client_version: u32, addr: SocketAddr) {
        info!(
            "Client connecting from {} (version: {})",
            addr, client_version
        );

        if client_version != PROTOCOL_VERSION {
            self.send_packet(
                Packet::Disconnected {
                    reason: "Protocol version mismatch".to_string(),
                },
                addr,
            );
            return;
        }

        // A repeated handshake gets the same id back
        let existing = {
            let mut clients = self.clients.write().await;
            clients.touch(addr)
        };
        if let Some(client_id) = existing {
            self.send_packet(Packet::Connected { client_id }, addr);
            return;
        }

        let candidate = self.clients.read().await.peek_next_id();
        if let Err(rejection) = self.session.admit(candidate) {
            info!("Refusing {}: {}", addr, rejection);
            self.send_packet(Packet::RoomFull, addr);
            return;
        }

        let client_id = {
            let mut clients = self.clients.write().await;
            clients.add_client(addr)
        };

        match client_id {
            Some(client_id) => {
                self.send_packet(Packet::Connected { client_id }, addr);
                let welcome = self.session.welcome(client_id);
                self.dispatch(welcome).await;
            }
            None => {
                self.send_packet(
                    Packet::Disconnected {
                        reason: "Server full".to_string(),
                    },
                    addr,
                );
            }
        }
    }

    async fn handle_disconnect(&mut self, client_id: u32) {
        {
            let mut clients = self.clients.write().await;
            clients.remove_client(&client_id);
        }
        let dispatches = self.session.disconnect(client_id);
        self.dispatch(dispatches).await;
    }

    /// Processes incoming packets and drives the session
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        if let Packet::Connect { client_version } = packet {
            self.handle_connect(client_version, addr).await;
            return;
        }

        let client_id = {
            let mut clients = self.clients.write().await;
            clients.touch(addr)
        };
        let Some(client_id) = client_id else {
            debug!("Ignoring packet from unregistered address {}", addr);
            return;
        };

        match packet {
            Packet::Heartbeat => {}
            Packet::ChooseSymbol { symbol } => {
                let result = self.session.choose_symbol(client_id, symbol);
                self.apply(client_id, result).await;
            }
            Packet::MakeMove { cell } => {
                let result = self.session.make_move(client_id, cell);
                self.apply(client_id, result).await;
            }
            Packet::Reset => {
                info!("Client {} requested a reset", client_id);
                let dispatches = self.session.reset();
                self.dispatch(dispatches).await;
            }
            Packet::Disconnect => {
                self.handle_disconnect(client_id).await;
            }
            _ => {
                warn!("Unexpected packet type from client {}", client_id);
            }
        }
    }

    /// Main server loop: applies events to the session one at a time
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver().await;
        self.spawn_network_sender().await;
        self.spawn_timeout_checker().await;

        info!("Server started successfully");

        while let Some(message) = self.server_rx.recv().await {
            match message {
                ServerMessage::PacketReceived { packet, addr } => {
                    self.handle_packet(packet, addr).await;
                }
                ServerMessage::ClientTimeout { client_id } => {
                    info!("Client {} timed out", client_id);
                    let dispatches = self.session.disconnect(client_id);
                    self.dispatch(dispatches).await;
                }
                ServerMessage::Shutdown => {
                    info!("Server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}
