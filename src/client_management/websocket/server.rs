use crate::{websocket::StreamHandler, GameStore};
use log::{debug, error, info};
use tokio::{net::TcpListener, spawn};

#[derive(Debug)]
pub enum ErrorKind {
    ErrorListening(std::io::Error),
}

/// The authoritative game server. Every accepted connection is handled by
/// its own [`StreamHandler`] task; all of them share one [`GameStore`].
#[derive(Clone)]
pub struct WebSocketServer {
    pub port: u16,
    pub host: String,
    pub store: GameStore,
}

impl Default for WebSocketServer {
    fn default() -> Self {
        Self::with_store(GameStore::default())
    }
}

impl WebSocketServer {
    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";

    /// Reads `WEBSOCKET_HOST` and `WEBSOCKET_PORT`, falling back to the
    /// defaults when they are unset or invalid.
    pub fn from_env(store: GameStore) -> Self {
        let host =
            std::env::var("WEBSOCKET_HOST").unwrap_or_else(|_| Self::DEFAULT_HOST.to_string());
        let port = std::env::var("WEBSOCKET_PORT")
            .ok()
            .and_then(|x| x.parse().ok())
            .unwrap_or(Self::DEFAULT_PORT);

        Self::new(host, port, store)
    }

    pub fn new(host: String, port: u16, store: GameStore) -> Self {
        Self { host, port, store }
    }

    pub fn with_store(store: GameStore) -> Self {
        Self::new(Self::DEFAULT_HOST.to_string(), Self::DEFAULT_PORT, store)
    }

    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub async fn bind(&self) -> Result<TcpListener, ErrorKind> {
        let addr = self.get_address();
        debug!("Listening on {}", addr);
        TcpListener::bind(addr)
            .await
            .map_err(ErrorKind::ErrorListening)
    }

    pub async fn start(&mut self) -> Result<(), ErrorKind> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    pub async fn serve(&self, listener: TcpListener) -> Result<(), ErrorKind> {
        info!(
            "server started on {}",
            listener
                .local_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| self.get_address())
        );

        loop {
            match listener.accept().await {
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
                Ok((stream, peer)) => {
                    debug!("new connection from {}", peer);
                    let store = self.store.clone();
                    spawn(async move {
                        if let Err(e) = StreamHandler::handle_stream(stream, store).await {
                            error!("Error handling stream: {:?}", e)
                        }
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        ChannelError, GameConfig, GameStatus, GameView, Mark, RemoteSession, ServerMessage,
        SessionView, SourceError,
    };
    use futures_util::{SinkExt, StreamExt};
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_tungstenite::{connect_async, tungstenite::Message};

    async fn start_server() -> (String, GameStore) {
        let _ = env_logger::builder().is_test(true).try_init();

        let store = GameStore::default();
        let server = WebSocketServer::new(
            WebSocketServer::DEFAULT_HOST.to_string(),
            0,
            store.clone(),
        );
        let listener = server.bind().await.unwrap();
        let url = format!("ws://{}/ws/game", listener.local_addr().unwrap());
        spawn(async move {
            server.serve(listener).await.unwrap();
        });
        (url, store)
    }

    async fn wait_for(
        session: &RemoteSession,
        predicate: impl FnMut(&SessionView) -> bool,
    ) -> SessionView {
        let mut updates = session.subscribe();
        let view = timeout(Duration::from_secs(2), updates.wait_for(predicate))
            .await
            .expect("timed out waiting for the session")
            .expect("session view dropped");
        view.clone()
    }

    fn moves_made(view: &SessionView) -> usize {
        view.state()
            .map(|state| {
                state
                    .board
                    .rows()
                    .iter()
                    .flatten()
                    .filter(|field| !field.is_vacant())
                    .count()
            })
            .unwrap_or_default()
    }

    /// Ann creates a game, Bo joins it. Returns both sessions and the game id.
    async fn seated_pair(url: &str, config: GameConfig) -> (RemoteSession, RemoteSession, String) {
        let ann = RemoteSession::connect(url).await.unwrap();
        let bo = RemoteSession::connect(url).await.unwrap();

        ann.create_game(config, Some("Ann")).unwrap();
        let game_id = wait_for(&ann, |view| view.game_id.is_some())
            .await
            .game_id
            .unwrap();

        bo.join_game(&game_id, "Bo").unwrap();
        for session in [&ann, &bo] {
            wait_for(session, |view| view.state().is_some()).await;
        }
        (ann, bo, game_id)
    }

    #[tokio::test]
    async fn full_game_over_the_wire() {
        let (url, _store) = start_server().await;
        let (mut ann, bo, game_id) = seated_pair(&url, GameConfig::normalized(3, 3)).await;

        let state = bo.view().state().unwrap();
        assert_eq!(state.status, GameStatus::Active);
        assert_eq!(state.board.size(), 3);
        assert_eq!(state.players.as_ref().unwrap().x, "Ann");
        assert_eq!(state.players.as_ref().unwrap().o, "Bo");

        let moves = [(0, 0), (1, 1), (0, 1), (1, 0), (0, 2)];
        for (index, coordinates) in moves.into_iter().enumerate() {
            let session = if index % 2 == 0 { &ann } else { &bo };
            session.make_move(coordinates).unwrap();
            for session in [&ann, &bo] {
                wait_for(session, |view| moves_made(view) == index + 1).await;
            }
        }

        for session in [&ann, &bo] {
            let state = session.view().state().unwrap();
            assert_eq!(state.status, GameStatus::Won);
            assert_eq!(state.winner, Some(Mark::X));
        }

        let view = GameView::project(&ann);
        assert_eq!(view.game_id, Some(game_id));
        assert_eq!(view.status_line, "Player X won!");
        assert!(!view.input_enabled);
        assert_eq!(view.winning_line, vec![(0, 0), (0, 1), (0, 2)]);

        ann.close();
        ann.close();
        assert!(!ann.is_open());
        assert_eq!(
            ann.make_move((2, 2)),
            Err(SourceError::Channel(ChannelError::Closed))
        );
    }

    #[tokio::test]
    async fn rejected_move_keeps_the_last_snapshot() {
        let (url, _store) = start_server().await;
        let (ann, bo, _) = seated_pair(&url, GameConfig::normalized(5, 4)).await;

        ann.make_move((2, 2)).unwrap();
        wait_for(&bo, |view| moves_made(view) == 1).await;
        let before = bo.view().state();

        bo.make_move((2, 2)).unwrap();
        let view = wait_for(&bo, |view| view.notice.is_some()).await;
        assert_eq!(
            view.notice.as_deref(),
            Some("Invalid move: cell is already occupied")
        );
        assert_eq!(view.state(), before);

        bo.make_move((5, 5)).unwrap();
        let view = wait_for(&bo, |view| {
            view.notice.as_deref() == Some("Invalid move: coordinates are outside the board")
        })
        .await;
        assert_eq!(view.state(), before);
    }

    #[tokio::test]
    async fn join_unknown_game() {
        let (url, _store) = start_server().await;
        let session = RemoteSession::connect(&url).await.unwrap();

        session.join_game("nope1234", "Cy").unwrap();
        let view = wait_for(&session, |view| view.notice.is_some()).await;
        assert_eq!(view.notice.as_deref(), Some("Game not found: nope1234"));
        assert_eq!(view.state(), None);
        assert_eq!(view.game_id, None);
    }

    #[tokio::test]
    async fn intents_before_a_game() {
        let (url, _store) = start_server().await;
        let session = RemoteSession::connect(&url).await.unwrap();

        assert_eq!(session.make_move((0, 0)), Err(SourceError::NoGameInProgress));
        assert_eq!(
            session.join_game("abcd1234", "  "),
            Err(SourceError::MissingInput("Please enter your name"))
        );
        assert_eq!(
            session.join_game("", "Cy"),
            Err(SourceError::MissingInput("Please enter a game ID"))
        );
        assert_eq!(session.view().notice.as_deref(), Some("Please enter a game ID"));
    }

    #[tokio::test]
    async fn reset_starts_a_new_game() {
        let (url, store) = start_server().await;
        let (ann, bo, game_id) = seated_pair(&url, GameConfig::normalized(4, 3)).await;

        ann.make_move((0, 0)).unwrap();
        wait_for(&ann, |view| moves_made(view) == 1).await;

        ann.reset_game().unwrap();
        assert_eq!(ann.view().state(), None);
        let view = wait_for(&ann, |view| {
            view.game_id.as_ref().is_some_and(|id| *id != game_id)
        })
        .await;
        let new_id = view.game_id.unwrap();
        assert_eq!(view.notice.as_deref(), Some("Game reset. Waiting for another player..."));
        assert_eq!(store.config(&new_id).unwrap(), GameConfig::normalized(4, 3));

        // Ann keeps her seat in the new game, Bo can join it
        bo.join_game(&new_id, "Bo").unwrap();
        let view = wait_for(&ann, |view| view.state().is_some()).await;
        let state = view.state().unwrap();
        assert!(state.board.is_empty());
        assert_eq!(state.board.size(), 4);
        assert_eq!(state.players.unwrap().x, "Ann");
    }

    #[tokio::test]
    async fn malformed_messages_get_an_error() {
        let (url, _store) = start_server().await;
        let (ws_stream, _) = timeout(Duration::from_secs(1), connect_async(url.as_str()))
            .await
            .unwrap()
            .unwrap();
        let (mut write, mut read) = ws_stream.split();

        write
            .send(Message::Text(r#"{"action":"fly"}"#.to_string()))
            .await
            .unwrap();
        let msg = timeout(Duration::from_secs(1), read.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(
            serde_json::from_str::<ServerMessage>(&msg.to_string()).unwrap(),
            ServerMessage::Error {
                message: "Unknown action: fly".to_string()
            }
        );

        write
            .send(Message::Text(r#"{"action":"make_move","row":"a","col":0}"#.to_string()))
            .await
            .unwrap();
        let msg = read.next().await.unwrap().unwrap();
        let msg = serde_json::from_str::<ServerMessage>(&msg.to_string()).unwrap();
        assert!(matches!(
            msg,
            ServerMessage::Error { ref message } if message.starts_with("Error processing message")
        ));

        write
            .send(Message::Text(r#"{"action":"make_move","row":0,"col":0}"#.to_string()))
            .await
            .unwrap();
        let msg = read.next().await.unwrap().unwrap();
        assert_eq!(
            serde_json::from_str::<ServerMessage>(&msg.to_string()).unwrap(),
            ServerMessage::Error {
                message: "No game associated with this session".to_string()
            }
        );
    }

    #[tokio::test]
    async fn closed_session_stops_applying_snapshots() {
        let (url, _store) = start_server().await;
        let (mut ann, bo, _) = seated_pair(&url, GameConfig::normalized(3, 3)).await;

        ann.make_move((0, 0)).unwrap();
        for session in [&ann, &bo] {
            wait_for(session, |view| moves_made(view) == 1).await;
        }

        ann.close();
        let frozen = ann.view();
        assert!(!frozen.connected);

        bo.make_move((1, 1)).unwrap();
        wait_for(&bo, |view| moves_made(view) == 2).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ann.view(), frozen);
    }

    #[tokio::test]
    async fn joining_a_released_game_keeps_the_connection() {
        let (url, store) = start_server().await;
        let host = RemoteSession::connect(&url).await.unwrap();
        host.create_game(GameConfig::normalized(3, 3), Some("Ann"))
            .unwrap();
        let game_id = wait_for(&host, |view| view.game_id.is_some())
            .await
            .game_id
            .unwrap();

        drop(host);
        timeout(Duration::from_secs(2), async {
            while !store.is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("game was never released");

        let (ws_stream, _) = connect_async(url.as_str()).await.unwrap();
        let (mut write, mut read) = ws_stream.split();
        let join = format!(r#"{{"action":"join_game","gameId":"{}","playerName":"Bo"}}"#, game_id);
        write.send(Message::Text(join)).await.unwrap();
        let msg = timeout(Duration::from_secs(1), read.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(
            serde_json::from_str::<ServerMessage>(&msg.to_string()).unwrap(),
            ServerMessage::Error {
                message: format!("Game not found: {}", game_id)
            }
        );
        assert!(store.is_empty());

        write
            .send(Message::Text(r#"{"action":"reset_game"}"#.to_string()))
            .await
            .unwrap();
        write
            .send(Message::Text(r#"{"action":"make_move","row":0,"col":0}"#.to_string()))
            .await
            .unwrap();
        let msg = timeout(Duration::from_secs(1), read.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(
            serde_json::from_str::<ServerMessage>(&msg.to_string()).unwrap(),
            ServerMessage::Error {
                message: "No game associated with this session".to_string()
            }
        );
    }

    #[tokio::test]
    async fn creator_without_name_waits_for_two_players() {
        let (url, store) = start_server().await;
        let host = RemoteSession::connect(&url).await.unwrap();

        host.create_game(GameConfig::with_size(10), None).unwrap();
        let game_id = wait_for(&host, |view| view.snapshot.is_some())
            .await
            .game_id
            .unwrap();
        assert_eq!(host.view().state(), None);
        assert_eq!(store.config(&game_id).unwrap().win_length(), 5);

        let view = GameView::project(&host);
        assert_eq!(view.status_line, GameView::WAITING);
        assert!(!view.input_enabled);
    }
}
