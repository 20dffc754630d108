//! Fan-out of session state to every connected observer.
//!
//! The hub is the only place where inbound messages turn into session mutations.
//! Every mutation and the broadcast that follows it happen while the registry lock
//! is held, so observers receive snapshots in the order the reveals were applied
//! and a newly connected observer can never miss an update between its initial
//! snapshot and the next broadcast.

use crate::client_manager::{ObserverId, ObserverRegistry};
use crate::error::SessionError;
use crate::game::GameSession;
use log::{debug, error, info, warn};
use shared::{
    parse_inbound, Board, CardIndex, ClientEvent, Inbound, RevealedCards, ServerEvent, PONG,
};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

const GAME_UNAVAILABLE: &str = "Game unavailable";

#[derive(Debug, Error)]
pub enum HubError {
    #[error("observer limit of {0} reached")]
    Full(usize),
}

/// What the hub did with one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Liveness check answered to the sender only.
    Pong,
    /// Card revealed and the new snapshot queued for `recipients` observers.
    Broadcast { card: CardIndex, recipients: usize },
    /// Input refused; the reply text was sent to the sender only.
    Rejected(&'static str),
}

pub struct BroadcastHub {
    session: Arc<GameSession>,
    observers: Mutex<ObserverRegistry>,
}

impl BroadcastHub {
    /// Creates a hub for `session` accepting at most `max_observers` connections.
    pub fn new(session: Arc<GameSession>, max_observers: usize) -> Self {
        Self {
            session,
            observers: Mutex::new(ObserverRegistry::new(max_observers)),
        }
    }

    /// The game session observers of this hub are watching.
    pub fn session(&self) -> &Arc<GameSession> {
        &self.session
    }

    /// Number of currently registered observers.
    ///
    /// Observers dropped for a closed or stalled queue no longer count.
    pub async fn observer_count(&self) -> usize {
        self.observers.lock().await.len()
    }

    /// Registers an observer and sends it the current revealed cards.
    ///
    /// `sender` is the observer's bounded outbound queue. Fails with
    /// [`HubError::Full`] when the observer limit is reached.
    pub async fn on_connect(
        &self,
        addr: SocketAddr,
        sender: mpsc::Sender<String>,
    ) -> Result<ObserverId, HubError> {
        let mut observers = self.observers.lock().await;
        let id = observers
            .add_observer(addr, sender)
            .ok_or(HubError::Full(observers.capacity()))?;

        let revealed = self.session.revealed().await;
        match ServerEvent::snapshot(&revealed).to_text() {
            Ok(text) => {
                observers.send_to(id, text);
            }
            Err(e) => error!("Failed to encode snapshot for observer {}: {}", id, e),
        }

        Ok(id)
    }

    /// Handles one text frame from observer `id`.
    pub async fn on_message(&self, id: ObserverId, raw: &str) -> Dispatch {
        let mut observers = self.observers.lock().await;

        match parse_inbound(raw) {
            Ok(Inbound::Ping) => {
                observers.send_to(id, PONG.to_owned());
                Dispatch::Pong
            }
            Ok(Inbound::Event(ClientEvent::RevealCard { card })) => {
                self.reveal(&mut observers, id, card).await
            }
            Err(e) => {
                warn!("Rejected message from observer {}: {}", id, e);
                let reply = e.rejection();
                observers.send_to(id, reply.to_owned());
                Dispatch::Rejected(reply)
            }
        }
    }

    /// Unregisters observer `id` after its connection ended.
    ///
    /// Returns false if it was already gone, for example because it was dropped
    /// for falling behind.
    pub async fn on_disconnect(&self, id: ObserverId) -> bool {
        self.observers.lock().await.remove_observer(id)
    }

    /// Starts a new game and pushes the cleared reveal state to every observer.
    pub async fn reset(&self) -> Result<Board, SessionError> {
        let mut observers = self.observers.lock().await;
        self.session.reset().await;
        let board = self.session.board().await?;

        let recipients = Self::publish(&mut observers, &RevealedCards::new());
        info!("New game started, notified {} observers", recipients);
        Ok(board)
    }

    async fn reveal(
        &self,
        observers: &mut ObserverRegistry,
        id: ObserverId,
        card: CardIndex,
    ) -> Dispatch {
        match self.session.reveal(usize::from(card)).await {
            Ok(revealed) => {
                let recipients = Self::publish(observers, &revealed);
                debug!(
                    "Observer {} revealed card {}, broadcast to {} observers",
                    id, card, recipients
                );
                Dispatch::Broadcast { card, recipients }
            }
            Err(e) => {
                warn!("Observer {} could not reveal card {}: {}", id, card, e);
                let reply = match e {
                    SessionError::IndexOutOfRange(_) => "Unknown event",
                    _ => GAME_UNAVAILABLE,
                };
                observers.send_to(id, reply.to_owned());
                Dispatch::Rejected(reply)
            }
        }
    }

    fn publish(observers: &mut ObserverRegistry, revealed: &RevealedCards) -> usize {
        match ServerEvent::snapshot(revealed).to_text() {
            Ok(text) => observers.broadcast(&text),
            Err(e) => {
                error!("Failed to encode snapshot: {}", e);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client_manager::OUTBOUND_QUEUE;
    use crate::words::WordPool;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::parse_server_event;

    fn test_addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn hub_with_corpus(words: usize, max_observers: usize) -> BroadcastHub {
        let text = (0..words).map(|i| format!("word{i}")).collect::<Vec<_>>().join("\n");
        let session = GameSession::new(WordPool::from_text(&text), StdRng::seed_from_u64(17));
        BroadcastHub::new(Arc::new(session), max_observers)
    }

    fn hub() -> BroadcastHub {
        hub_with_corpus(100, 8)
    }

    async fn connect(
        hub: &BroadcastHub,
        port: u16,
    ) -> (ObserverId, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
        let id = hub.on_connect(test_addr(port), tx).await.unwrap();
        (id, rx)
    }

    fn revealed(text: &str) -> RevealedCards {
        parse_server_event(text).unwrap().revealed()
    }

    #[tokio::test]
    async fn test_connect_sends_snapshot() {
        let hub = hub();
        hub.session().reveal(4).await.unwrap();

        let (_, mut rx) = connect(&hub, 9000).await;
        let first = rx.try_recv().unwrap();
        assert_eq!(revealed(&first), [4].into_iter().collect());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_connect_does_not_generate_board() {
        let hub = hub();
        let (_, mut rx) = connect(&hub, 9000).await;
        assert!(revealed(&rx.try_recv().unwrap()).is_empty());
        assert!(!hub.session().is_ready().await);
    }

    #[tokio::test]
    async fn test_connect_when_full() {
        let hub = hub_with_corpus(100, 1);
        let _first = connect(&hub, 9000).await;
        let (tx, _rx) = mpsc::channel(OUTBOUND_QUEUE);
        let err = hub.on_connect(test_addr(9001), tx).await.unwrap_err();
        assert!(matches!(err, HubError::Full(1)));
        assert_eq!(hub.observer_count().await, 1);
    }

    #[tokio::test]
    async fn test_reveal_fans_out_to_all_including_sender() {
        let hub = hub();
        let (a, mut rx_a) = connect(&hub, 9000).await;
        let (_, mut rx_b) = connect(&hub, 9001).await;
        let (_, mut rx_c) = connect(&hub, 9002).await;
        for rx in [&mut rx_a, &mut rx_b, &mut rx_c] {
            rx.try_recv().unwrap();
        }

        let dispatch = hub.on_message(a, r#"{"type":"revealCard","card":5}"#).await;
        assert_eq!(dispatch, Dispatch::Broadcast { card: 5, recipients: 3 });

        for rx in [&mut rx_a, &mut rx_b, &mut rx_c] {
            assert!(revealed(&rx.try_recv().unwrap()).contains(&5));
        }
    }

    #[tokio::test]
    async fn test_bogus_message_rejected_to_sender_only() {
        let hub = hub();
        let (a, mut rx_a) = connect(&hub, 9000).await;
        let (_, mut rx_b) = connect(&hub, 9001).await;
        rx_a.try_recv().unwrap();
        rx_b.try_recv().unwrap();

        let dispatch = hub.on_message(a, r#"{"type":"bogus"}"#).await;
        assert_eq!(dispatch, Dispatch::Rejected("Unknown event"));
        assert_eq!(rx_a.try_recv().unwrap(), "Unknown event");
        assert!(rx_b.try_recv().is_err());
        assert!(hub.session().revealed().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_json_rejected() {
        let hub = hub();
        let (a, mut rx_a) = connect(&hub, 9000).await;
        rx_a.try_recv().unwrap();

        let dispatch = hub.on_message(a, "{not json").await;
        assert_eq!(dispatch, Dispatch::Rejected("Invalid message format"));
        assert_eq!(rx_a.try_recv().unwrap(), "Invalid message format");
    }

    #[tokio::test]
    async fn test_out_of_range_card_rejected() {
        let hub = hub();
        let (a, mut rx_a) = connect(&hub, 9000).await;
        rx_a.try_recv().unwrap();

        let dispatch = hub.on_message(a, r#"{"type":"revealCard","card":25}"#).await;
        assert_eq!(dispatch, Dispatch::Rejected("Unknown event"));
        assert!(hub.session().revealed().await.is_empty());
    }

    #[tokio::test]
    async fn test_ping_answered_without_mutation() {
        let hub = hub();
        let (a, mut rx_a) = connect(&hub, 9000).await;
        let (_, mut rx_b) = connect(&hub, 9001).await;
        rx_a.try_recv().unwrap();
        rx_b.try_recv().unwrap();

        assert_eq!(hub.on_message(a, "ping").await, Dispatch::Pong);
        assert_eq!(rx_a.try_recv().unwrap(), "pong");
        assert!(rx_b.try_recv().is_err());
        assert!(!hub.session().is_ready().await);
    }

    #[tokio::test]
    async fn test_disconnected_observer_gets_nothing() {
        let hub = hub();
        let (a, mut rx_a) = connect(&hub, 9000).await;
        let (b, mut rx_b) = connect(&hub, 9001).await;
        rx_a.try_recv().unwrap();
        rx_b.try_recv().unwrap();

        assert!(hub.on_disconnect(b).await);
        assert!(!hub.on_disconnect(b).await);

        let dispatch = hub.on_message(a, r#"{"type":"revealCard","card":1}"#).await;
        assert_eq!(dispatch, Dispatch::Broadcast { card: 1, recipients: 1 });
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropped_connection_does_not_block_broadcast() {
        let hub = hub();
        let (a, mut rx_a) = connect(&hub, 9000).await;
        let (_, rx_b) = connect(&hub, 9001).await;
        rx_a.try_recv().unwrap();
        drop(rx_b);

        let dispatch = hub.on_message(a, r#"{"type":"revealCard","card":2}"#).await;
        assert_eq!(dispatch, Dispatch::Broadcast { card: 2, recipients: 1 });
        assert_eq!(hub.observer_count().await, 1);
    }

    #[tokio::test]
    async fn test_reveal_with_broken_corpus_reports_unavailable() {
        let hub = hub_with_corpus(5, 4);
        let (a, mut rx_a) = connect(&hub, 9000).await;
        rx_a.try_recv().unwrap();

        let dispatch = hub.on_message(a, r#"{"type":"revealCard","card":2}"#).await;
        assert_eq!(dispatch, Dispatch::Rejected(GAME_UNAVAILABLE));
        assert_eq!(rx_a.try_recv().unwrap(), GAME_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_reset_broadcasts_empty_snapshot() {
        let hub = hub();
        let (a, mut rx_a) = connect(&hub, 9000).await;
        rx_a.try_recv().unwrap();
        hub.on_message(a, r#"{"type":"revealCard","card":3}"#).await;
        rx_a.try_recv().unwrap();
        let before = hub.session().board().await.unwrap();

        let after = hub.reset().await.unwrap();
        assert_ne!(before, after);
        assert!(revealed(&rx_a.try_recv().unwrap()).is_empty());
        assert!(hub.session().revealed().await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_reveals_arrive_monotonically() {
        let hub = Arc::new(hub());
        let mut receivers = Vec::new();
        let mut ids = Vec::new();
        for port in 9000..9004 {
            let (id, mut rx) = connect(&hub, port).await;
            rx.try_recv().unwrap();
            ids.push(id);
            receivers.push(rx);
        }

        let tasks: Vec<_> = (0..25u8)
            .map(|card| {
                let hub = Arc::clone(&hub);
                let id = ids[usize::from(card) % ids.len()];
                tokio::spawn(async move {
                    let raw = format!(r#"{{"type":"revealCard","card":{card}}}"#);
                    hub.on_message(id, &raw).await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        for rx in &mut receivers {
            let mut previous = RevealedCards::new();
            let mut updates = 0;
            while let Ok(text) = rx.try_recv() {
                let current = revealed(&text);
                assert!(previous.is_subset(&current));
                assert_eq!(current.len(), previous.len() + 1);
                previous = current;
                updates += 1;
            }
            assert_eq!(updates, 25);
            assert_eq!(previous.len(), 25);
        }
    }

    #[tokio::test]
    async fn test_stalled_observer_is_dropped() {
        let hub = hub();
        let (a, mut rx_a) = connect(&hub, 9000).await;
        let (b, _rx_b) = connect(&hub, 9001).await;
        rx_a.try_recv().unwrap();

        for _ in 0..OUTBOUND_QUEUE * 4 {
            hub.on_message(a, r#"{"type":"revealCard","card":5}"#).await;
            while rx_a.try_recv().is_ok() {}
        }

        assert_eq!(hub.observer_count().await, 1);
        assert!(!hub.on_disconnect(b).await);
        let dispatch = hub.on_message(a, r#"{"type":"revealCard","card":6}"#).await;
        assert_eq!(dispatch, Dispatch::Broadcast { card: 6, recipients: 1 });
    }
}
