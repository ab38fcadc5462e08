//! Connection registry for the game server
//!
//! This module tracks every admitted connection, including ones that have not
//! picked a symbol yet:
//! - Client id assignment and address lookup for routing replies
//! - Connection capacity enforcement
//! - Liveness tracking and timeout detection
//!
//! Whether a connection may play is decided by the session, not here. The
//! registry only knows who is connected and where to send their packets.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A connected client
#[derive(Debug)]
pub struct Client {
    /// Unique client identifier assigned by the server
    pub id: u32,
    /// Network address for sending responses
    pub addr: SocketAddr,
    /// Last time we received any packet from this client
    pub last_seen: Instant,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
        }
    }

    /// Returns true if nothing has arrived from this client within `timeout`
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Manages all connected clients
///
/// Client ids start at 1 and are never reused during a server's lifetime, so a
/// late packet for a removed connection cannot be mistaken for a new one.
pub struct ClientManager {
    clients: HashMap<u32, Client>,
    next_client_id: u32,
    max_clients: usize,
    timeout: Duration,
}

impl ClientManager {
    pub fn new(max_clients: usize, timeout: Duration) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
            timeout,
        }
    }

    /// Returns the id the next successful `add_client` will hand out
    pub fn peek_next_id(&self) -> u32 {
        self.next_client_id
    }

    /// Attempts to register a new connection
    ///
    /// Returns Some(client_id) if successful, None if the server is at capacity.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<u32> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(client_id, Client::new(client_id, addr));

        Some(client_id)
    }

    /// Removes a client. Returns false if it was already gone.
    pub fn remove_client(&mut self, client_id: &u32) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!("Client {} disconnected", client.id);
            true
        } else {
            false
        }
    }

    pub fn addr_of(&self, client_id: u32) -> Option<SocketAddr> {
        self.clients.get(&client_id).map(|client| client.addr)
    }

    /// Marks the client at `addr` as alive and returns its id
    pub fn touch(&mut self, addr: SocketAddr) -> Option<u32> {
        let client = self.clients.values_mut().find(|client| client.addr == addr)?;
        client.last_seen = Instant::now();
        Some(client.id)
    }

    /// Removes and returns clients that have been silent past the timeout
    pub fn check_timeouts(&mut self) -> Vec<u32> {
        let timed_out: Vec<u32> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(self.timeout))
            .map(|(id, _)| *id)
            .collect();

        for client_id in &timed_out {
            self.remove_client(client_id);
        }

        timed_out
    }

    /// Gets (id, address) pairs for broadcasting
    pub fn get_client_addrs(&self) -> Vec<(u32, SocketAddr)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.addr))
            .collect()
    }
}
