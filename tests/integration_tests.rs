//! Integration tests for the game server over real UDP sockets
//!
//! Each test starts its own server on an ephemeral port and drives it with
//! plain sockets speaking the shared packet protocol.

use bincode::{deserialize, serialize};
use server::config::{RejectionPolicy, ServerConfig};
use server::game::Session;
use server::network::{Server, ShutdownHandle};
use shared::{Outcome, Packet, SessionSnapshot, Symbol, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

async fn start_server(policy: RejectionPolicy) -> (SocketAddr, ShutdownHandle) {
    start_server_with(ServerConfig {
        port: 0,
        rejection_policy: policy,
        ..ServerConfig::default()
    })
    .await
}

async fn start_server_with(config: ServerConfig) -> (SocketAddr, ShutdownHandle) {
    let mut server = Server::new(&config, Session::new()).await.unwrap();
    let addr = server.local_addr().unwrap();
    let handle = server.shutdown_handle();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    (addr, handle)
}

struct TestClient {
    socket: UdpSocket,
    server: SocketAddr,
}

impl TestClient {
    async fn new(server: SocketAddr) -> Self {
        TestClient {
            socket: UdpSocket::bind("127.0.0.1:0").await.unwrap(),
            server,
        }
    }

    /// Performs the handshake and returns the assigned id
    async fn join(server: SocketAddr) -> (Self, u32) {
        let client = Self::new(server).await;
        client
            .send(&Packet::Connect {
                client_version: PROTOCOL_VERSION,
            })
            .await;
        match client.recv().await {
            Packet::Connected { client_id } => (client, client_id),
            other => panic!("Expected Connected, got {:?}", other),
        }
    }

    async fn send(&self, packet: &Packet) {
        let data = serialize(packet).unwrap();
        self.socket.send_to(&data, self.server).await.unwrap();
    }

    async fn try_recv(&self, wait: Duration) -> Option<Packet> {
        let mut buf = [0u8; 2048];
        match timeout(wait, self.socket.recv_from(&mut buf)).await {
            Ok(Ok((len, _))) => Some(deserialize(&buf[..len]).unwrap()),
            _ => None,
        }
    }

    async fn recv(&self) -> Packet {
        self.try_recv(RECV_TIMEOUT)
            .await
            .expect("timed out waiting for packet")
    }

    /// Skips packets until one matches
    async fn recv_until(&self, wanted: impl Fn(&Packet) -> bool) -> Packet {
        loop {
            let packet = self.recv().await;
            if wanted(&packet) {
                return packet;
            }
        }
    }

    async fn next_state(&self) -> SessionSnapshot {
        match self
            .recv_until(|p| matches!(p, Packet::StateUpdate(_)))
            .await
        {
            Packet::StateUpdate(snapshot) => snapshot,
            _ => unreachable!(),
        }
    }

    /// Collects everything that arrives until the socket goes quiet
    async fn drain(&self) -> Vec<Packet> {
        let mut packets = Vec::new();
        while let Some(packet) = self.try_recv(Duration::from_millis(150)).await {
            packets.push(packet);
        }
        packets
    }
}

/// Two joined clients with P1 holding `first` and P2 holding `second`
async fn seated_pair(
    server: SocketAddr,
    first: Symbol,
    second: Symbol,
) -> (TestClient, TestClient) {
    let (p1, _) = TestClient::join(server).await;
    let (p2, _) = TestClient::join(server).await;

    p1.send(&Packet::ChooseSymbol { symbol: first }).await;
    assert!(matches!(p1.recv().await, Packet::SymbolAssigned { symbol } if symbol == first));
    match p2.recv().await {
        Packet::RemainingSymbols { symbols } => {
            assert_eq!(symbols.len(), 5);
            assert!(!symbols.contains(&first));
        }
        other => panic!("Expected RemainingSymbols, got {:?}", other),
    }

    p2.send(&Packet::ChooseSymbol { symbol: second }).await;
    assert!(matches!(p2.recv().await, Packet::SymbolAssigned { symbol } if symbol == second));

    let state = p1.next_state().await;
    assert_eq!(state.current_player, Some(first));
    assert_eq!(p2.next_state().await.current_player, Some(first));

    (p1, p2)
}

/// FULL GAME FLOW TESTS
mod game_flow_tests {
    use super::*;

    #[tokio::test]
    async fn top_row_win_sends_individual_outcomes() {
        let (server, handle) = start_server(RejectionPolicy::Silent).await;
        let (p1, p2) = seated_pair(server, Symbol::Bear, Symbol::Monkey).await;

        for (mover, cell) in [(&p1, 0), (&p2, 4), (&p1, 1), (&p2, 5), (&p1, 2)] {
            mover.send(&Packet::MakeMove { cell }).await;
            // Wait until the move is on the board before the next one goes out
            p1.recv_until(|p| {
                matches!(p, Packet::StateUpdate(state) if state.board[cell as usize].is_some())
            })
            .await;
        }

        match p1.recv_until(|p| matches!(p, Packet::GameOver { .. })).await {
            Packet::GameOver {
                winner,
                loser,
                message,
            } => {
                assert_eq!(winner, Outcome::Winner(Symbol::Bear));
                assert_eq!(loser, Some(Symbol::Monkey));
                assert!(message.starts_with("Congratulations"));
            }
            _ => unreachable!(),
        }

        match p2.recv_until(|p| matches!(p, Packet::GameOver { .. })).await {
            Packet::GameOver { winner, message, .. } => {
                assert_eq!(winner, Outcome::Winner(Symbol::Bear));
                assert!(message.starts_with("You lost"));
            }
            _ => unreachable!(),
        }

        handle.shutdown();
    }

    #[tokio::test]
    async fn out_of_turn_and_occupied_moves_are_silent() {
        let (server, handle) = start_server(RejectionPolicy::Silent).await;
        let (p1, p2) = seated_pair(server, Symbol::Fox, Symbol::Cow).await;

        p2.send(&Packet::MakeMove { cell: 0 }).await;
        p1.send(&Packet::MakeMove { cell: 42 }).await;
        assert!(p1.drain().await.is_empty());
        assert!(p2.drain().await.is_empty());

        p1.send(&Packet::MakeMove { cell: 4 }).await;
        p1.drain().await;
        p2.drain().await;

        p2.send(&Packet::MakeMove { cell: 4 }).await;
        assert!(p1.drain().await.is_empty());
        assert!(p2.drain().await.is_empty());

        handle.shutdown();
    }

    #[tokio::test]
    async fn taken_symbol_is_ignored() {
        let (server, handle) = start_server(RejectionPolicy::Silent).await;
        let (p1, _) = TestClient::join(server).await;
        let (p2, _) = TestClient::join(server).await;

        p1.send(&Packet::ChooseSymbol {
            symbol: Symbol::Rabbit,
        })
        .await;
        p1.recv().await;
        p2.recv().await;

        p2.send(&Packet::ChooseSymbol {
            symbol: Symbol::Rabbit,
        })
        .await;
        assert!(p1.drain().await.is_empty());
        assert!(p2.drain().await.is_empty());

        handle.shutdown();
    }

    #[tokio::test]
    async fn notify_policy_explains_rejections() {
        let (server, handle) = start_server(RejectionPolicy::Notify).await;
        let (p1, p2) = seated_pair(server, Symbol::Koala, Symbol::Bear).await;

        p2.send(&Packet::MakeMove { cell: 0 }).await;
        match p2.recv_until(|p| matches!(p, Packet::Rejected { .. })).await {
            Packet::Rejected { reason } => assert_eq!(reason, "not your turn"),
            _ => unreachable!(),
        }
        assert!(p1.drain().await.is_empty());

        handle.shutdown();
    }
}

/// ADMISSION AND RESET TESTS
mod session_lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn third_player_gets_room_full() {
        let (server, handle) = start_server(RejectionPolicy::Silent).await;
        let (p1, p2) = seated_pair(server, Symbol::Bear, Symbol::Monkey).await;
        p1.drain().await;
        p2.drain().await;

        let third = TestClient::new(server).await;
        third
            .send(&Packet::Connect {
                client_version: PROTOCOL_VERSION,
            })
            .await;
        assert!(matches!(third.recv().await, Packet::RoomFull));

        // Not registered: further requests do nothing
        third.send(&Packet::Reset).await;
        assert!(p1.drain().await.is_empty());
        assert!(third.drain().await.is_empty());

        handle.shutdown();
    }

    #[tokio::test]
    async fn late_joiner_sees_remaining_pool() {
        let (server, handle) = start_server(RejectionPolicy::Silent).await;
        let (p1, _) = TestClient::join(server).await;
        p1.send(&Packet::ChooseSymbol { symbol: Symbol::Cow }).await;
        p1.recv().await;

        let (late, _) = TestClient::join(server).await;
        match late.recv().await {
            Packet::RemainingSymbols { symbols } => assert!(!symbols.contains(&Symbol::Cow)),
            other => panic!("Expected RemainingSymbols, got {:?}", other),
        }

        handle.shutdown();
    }

    #[tokio::test]
    async fn reset_broadcasts_empty_state() {
        let (server, handle) = start_server(RejectionPolicy::Silent).await;
        let (p1, p2) = seated_pair(server, Symbol::Bear, Symbol::Monkey).await;

        p1.send(&Packet::MakeMove { cell: 0 }).await;
        p1.drain().await;
        p2.drain().await;

        p2.send(&Packet::Reset).await;
        for client in [&p1, &p2] {
            let state = client.next_state().await;
            assert!(state.is_reset());
            assert!(state.board.iter().all(Option::is_none));
            assert_eq!(state.winner, None);
        }

        // Symbols can be picked again after a reset
        p2.send(&Packet::ChooseSymbol {
            symbol: Symbol::Bear,
        })
        .await;
        assert!(matches!(
            p2.recv().await,
            Packet::SymbolAssigned {
                symbol: Symbol::Bear
            }
        ));

        handle.shutdown();
    }

    #[tokio::test]
    async fn disconnect_of_either_player_resets_for_both() {
        for leaver_is_first in [true, false] {
            let (server, handle) = start_server(RejectionPolicy::Silent).await;
            let (p1, p2) = seated_pair(server, Symbol::Fox, Symbol::Rabbit).await;
            p1.drain().await;
            p2.drain().await;

            let (leaver, stayer) = if leaver_is_first { (&p1, &p2) } else { (&p2, &p1) };
            leaver.send(&Packet::Disconnect).await;

            let state = stayer.next_state().await;
            assert!(state.is_reset());

            // The room has space again
            let (newcomer, _) = TestClient::join(server).await;
            newcomer.send(&Packet::ChooseSymbol { symbol: Symbol::Fox }).await;
            assert!(matches!(
                newcomer.recv().await,
                Packet::SymbolAssigned { symbol: Symbol::Fox }
            ));

            handle.shutdown();
        }
    }

    #[tokio::test]
    async fn silent_player_times_out_and_resets_the_game() {
        let (server, handle) = start_server_with(ServerConfig {
            port: 0,
            client_timeout: Duration::from_millis(1500),
            ..ServerConfig::default()
        })
        .await;
        let (silent, active) = seated_pair(server, Symbol::Cow, Symbol::Koala).await;
        silent.drain().await;
        active.drain().await;

        let mut reset = None;
        for _ in 0..8 {
            active.send(&Packet::Heartbeat).await;
            if let Some(Packet::StateUpdate(state)) =
                active.try_recv(Duration::from_millis(500)).await
            {
                reset = Some(state);
                break;
            }
        }

        let state = reset.expect("no reset after the silent player timed out");
        assert!(state.is_reset());

        // The survivor is still registered and can start over
        active.send(&Packet::ChooseSymbol { symbol: Symbol::Cow }).await;
        assert!(matches!(
            active.recv().await,
            Packet::SymbolAssigned { symbol: Symbol::Cow }
        ));

        handle.shutdown();
    }

    #[tokio::test]
    async fn wrong_protocol_version_is_refused() {
        let (server, handle) = start_server(RejectionPolicy::Silent).await;
        let client = TestClient::new(server).await;
        client
            .send(&Packet::Connect {
                client_version: PROTOCOL_VERSION + 1,
            })
            .await;

        match client.recv().await {
            Packet::Disconnected { reason } => assert!(reason.contains("version")),
            other => panic!("Expected Disconnected, got {:?}", other),
        }

        handle.shutdown();
    }

    #[tokio::test]
    async fn repeated_connect_keeps_client_id() {
        let (server, handle) = start_server(RejectionPolicy::Silent).await;
        let (client, first_id) = TestClient::join(server).await;

        client
            .send(&Packet::Connect {
                client_version: PROTOCOL_VERSION,
            })
            .await;
        assert!(matches!(
            client.recv().await,
            Packet::Connected { client_id } if client_id == first_id
        ));

        handle.shutdown();
    }
}

/// PROTOCOL ROBUSTNESS TESTS
mod protocol_tests {
    use super::*;

    #[tokio::test]
    async fn garbage_datagrams_are_ignored() {
        let (server, handle) = start_server(RejectionPolicy::Silent).await;
        let raw = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        raw.send_to(&[0xFF, 0x00, 0x13], server).await.unwrap();

        // Server still answers afterwards
        let (_, client_id) = TestClient::join(server).await;
        assert!(client_id >= 1);

        handle.shutdown();
    }

    #[test]
    fn malformed_packet_handling() {
        let valid_data = serialize(&Packet::MakeMove { cell: 4 }).unwrap();

        let truncated: Result<Packet, _> = deserialize(&valid_data[..valid_data.len() / 2]);
        assert!(truncated.is_err(), "Should fail to deserialize truncated packet");

        let mut corrupted = valid_data.clone();
        corrupted[0] = 0xFF;
        let corrupted: Result<Packet, _> = deserialize(&corrupted);
        assert!(corrupted.is_err(), "Should fail to deserialize corrupted packet");

        let empty: Result<Packet, _> = deserialize(&[]);
        assert!(empty.is_err(), "Should fail to deserialize empty packet");
    }
}
