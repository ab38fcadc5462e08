use crate::game::ClientGameState;
use crate::input::InputManager;
use crate::rendering::Renderer;
use bincode::{deserialize, serialize};
use log::{error, info, warn};
use macroquad::prelude::*;
use shared::{Packet, PROTOCOL_VERSION};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

/// Pace of both heartbeats and handshake retries
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// Non-blocking UDP link to the server, polled once per frame
pub struct Connection {
    socket: UdpSocket,
    server_addr: SocketAddr,
    last_heartbeat: Instant,
    last_handshake: Option<Instant>,
}

impl Connection {
    pub fn open(server_addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;

        Ok(Connection {
            socket,
            server_addr: server_addr.parse()?,
            last_heartbeat: Instant::now(),
            last_handshake: None,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn send(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr)?;
        Ok(())
    }

    /// Drains every datagram that has arrived since the last call
    pub fn poll(&self) -> Vec<Packet> {
        let mut packets = Vec::new();
        let mut buffer = [0u8; 2048];

        loop {
            match self.socket.recv_from(&mut buffer) {
                Ok((len, addr)) => match deserialize::<Packet>(&buffer[..len]) {
                    Ok(packet) => packets.push(packet),
                    Err(e) => warn!("Failed to deserialize packet from {}: {}", addr, e),
                },
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    error!("Error receiving packet: {}", e);
                    break;
                }
            }
        }

        packets
    }

    /// Sends a heartbeat if the interval has elapsed
    pub fn keep_alive(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.last_heartbeat.elapsed() >= HEARTBEAT_INTERVAL {
            self.last_heartbeat = Instant::now();
            self.send(&Packet::Heartbeat)?;
        }
        Ok(())
    }

    /// Sends `Connect` now, then again every interval until called off
    pub fn retry_handshake(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let due = self
            .last_handshake
            .map_or(true, |sent| sent.elapsed() >= HEARTBEAT_INTERVAL);
        if due {
            if self.last_handshake.is_some() {
                info!("No answer from server yet, retrying handshake");
            }
            self.last_handshake = Some(Instant::now());
            self.send(&Packet::Connect {
                client_version: PROTOCOL_VERSION,
            })?;
        }
        Ok(())
    }

    /// Retries the handshake while it is unanswered, heartbeats once connected
    pub fn maintain(&mut self, state: &ClientGameState) -> Result<(), Box<dyn std::error::Error>> {
        if state.awaiting_handshake() {
            self.retry_handshake()
        } else if state.is_connected() {
            self.keep_alive()
        } else {
            Ok(())
        }
    }
}

pub struct Client {
    connection: Connection,
    game_state: ClientGameState,
    input_manager: InputManager,
    renderer: Renderer,
}

impl Client {
    pub fn new(
        server_addr: &str,
        width: usize,
        height: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Client {
            connection: Connection::open(server_addr)?,
            game_state: ClientGameState::new(),
            input_manager: InputManager::new(),
            renderer: Renderer::new(width, height),
        })
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to server...");

        loop {
            for packet in self.connection.poll() {
                self.game_state.apply_packet(packet);
            }

            if let Err(e) = self.connection.maintain(&self.game_state) {
                error!("Error keeping connection alive: {}", e);
            }

            if self.game_state.is_connected() {
                let intent = self
                    .input_manager
                    .update(self.renderer.layout(), &mut self.game_state);
                if let Some(intent) = intent {
                    if let Err(e) = self.connection.send(&intent.into_packet()) {
                        error!("Error sending {:?}: {}", intent, e);
                    }
                }
            }

            self.renderer.render(&self.game_state);

            if is_key_pressed(KeyCode::Escape) {
                break;
            }

            next_frame().await;
        }

        if self.game_state.is_connected() {
            let _ = self.connection.send(&Packet::Disconnect);
        }

        Ok(())
    }
}
