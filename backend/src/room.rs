use crate::client::{ConnectionId, SendMsg};
use crate::util;
use common::messages::{ColorConfirmed, Handshake, Response, Snapshot, ValidMoves, Welcome};
use common::{render_board, Action, ActionError, GameError, GameState, PlayerNum};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub type SharedRoom<S> = Arc<RwLock<Room<S>>>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Player {0} is already taken")]
    AlreadyTaken(PlayerNum),
    #[error("Room is full")]
    RoomFull,
    #[error("No player with id {0:?} has been in this room")]
    NoSuchSession(String),
    #[error("This connection is not bound to a player")]
    NotBound,
}

#[derive(Error, Debug)]
pub enum RoomError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Game(#[from] GameError),
}

#[derive(Debug)]
struct Connection<S> {
    id: ConnectionId,
    sender: S,
}

// A claimed seat keeps its player id after its connection drops, so the
// player can reconnect into it later.
#[derive(Debug)]
struct Seat<S> {
    player_id: Uuid,
    connection: Option<Connection<S>>,
}

/// Frames assembled under the room lock. They must be delivered before the lock
/// is released, or two seats can see snapshots out of order.
#[derive(Debug)]
pub struct Outbox<S> {
    deliveries: Vec<(S, Response)>,
}

impl<S> Outbox<S> {
    fn new() -> Self {
        Outbox {
            deliveries: Vec::new(),
        }
    }

    fn push(&mut self, sender: S, response: Response) {
        self.deliveries.push((sender, response));
    }

    fn extend(&mut self, other: Outbox<S>) {
        self.deliveries.extend(other.deliveries);
    }

    pub fn responses(&self) -> impl Iterator<Item = &Response> {
        self.deliveries.iter().map(|(_, response)| response)
    }
}

impl<S: SendMsg> Outbox<S> {
    pub fn deliver(self) {
        for (sender, response) in self.deliveries {
            send_response(&sender, &response);
        }
    }
}

pub fn send_response(client: &impl SendMsg, response: &Response) {
    match serde_json::to_string(response) {
        Ok(msg) => {
            // If the message fails to send even after retries, there's not much we can do but proceed
            let _ = util::retry(1, || client.send(&msg));
        }
        Err(err) => error!("failed to serialize {} response: {}", response.tag(), err),
    }
}

/// Two seats bound to one game.
#[derive(Debug)]
pub struct Room<S> {
    game_state: GameState,
    // Indexed by PlayerNum::index
    seats: [Option<Seat<S>>; 2],
}

impl<S: SendMsg + Clone> Room<S> {
    pub fn new(game_state: GameState) -> Self {
        Room {
            game_state,
            seats: [None, None],
        }
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    /// The seat a connection is currently bound to, if any.
    pub fn player_for(&self, id: ConnectionId) -> Option<PlayerNum> {
        PlayerNum::both().into_iter().find(|p| {
            self.seats[p.index()]
                .as_ref()
                .and_then(|seat| seat.connection.as_ref())
                .map_or(false, |conn| conn.id == id)
        })
    }

    pub fn is_connected(&self, player_num: PlayerNum) -> bool {
        self.sender(player_num).is_some()
    }

    fn sender(&self, player_num: PlayerNum) -> Option<&S> {
        self.seats[player_num.index()]
            .as_ref()
            .and_then(|seat| seat.connection.as_ref())
            .map(|conn| &conn.sender)
    }

    /// Binds a fresh connection according to its handshake.
    pub fn accept(
        &mut self,
        handshake: Handshake,
        id: ConnectionId,
        sender: S,
    ) -> Result<Welcome, SessionError> {
        match handshake {
            Handshake::NewPlayer => {
                let (you_are, player_id) = self.join(id, sender)?;
                Ok(Welcome {
                    you_are,
                    player_id: player_id.as_simple().to_string(),
                })
            }
            Handshake::Claim(player_num) => {
                let player_id = self.connect(player_num, id, sender)?;
                Ok(Welcome {
                    you_are: player_num,
                    player_id: player_id.as_simple().to_string(),
                })
            }
            Handshake::Reconnect { player_id } => {
                let you_are = self.reconnect(&player_id, id, sender)?;
                Ok(Welcome { you_are, player_id })
            }
        }
    }

    /// Seats a new player in the first seat nobody has claimed yet.
    pub fn join(&mut self, id: ConnectionId, sender: S) -> Result<(PlayerNum, Uuid), SessionError> {
        let player_num = PlayerNum::both()
            .into_iter()
            .find(|p| self.seats[p.index()].is_none())
            .ok_or(SessionError::RoomFull)?;
        let player_id = self.connect(player_num, id, sender)?;
        Ok((player_num, player_id))
    }

    pub fn connect(
        &mut self,
        player_num: PlayerNum,
        id: ConnectionId,
        sender: S,
    ) -> Result<Uuid, SessionError> {
        let seat = &mut self.seats[player_num.index()];
        if seat.is_some() {
            return Err(SessionError::AlreadyTaken(player_num));
        }
        let player_id = Uuid::new_v4();
        *seat = Some(Seat {
            player_id,
            connection: Some(Connection { id, sender }),
        });
        info!("connection {} took seat {}", id, player_num);

        if self.seats.iter().all(Option::is_some) && self.game_state.begin_selection() {
            info!("both seats taken, players are selecting colors");
        }
        Ok(player_id)
    }

    /// Rebinds a previously claimed seat to a new connection. Game state is untouched.
    pub fn reconnect(
        &mut self,
        player_id: &str,
        id: ConnectionId,
        sender: S,
    ) -> Result<PlayerNum, SessionError> {
        let no_session = || SessionError::NoSuchSession(player_id.to_string());
        let uuid = Uuid::parse_str(player_id).map_err(|_| no_session())?;
        let (player_num, seat) = PlayerNum::both()
            .into_iter()
            .zip(self.seats.iter_mut())
            .find_map(|(p, seat)| match seat {
                Some(seat) if seat.player_id == uuid => Some((p, seat)),
                _ => None,
            })
            .ok_or_else(no_session)?;
        if let Some(previous) = seat.connection.replace(Connection { id, sender }) {
            warn!(
                "seat {} was still bound to {}, rebinding to {}",
                player_num, previous.id, id
            );
        }
        info!("connection {} reconnected to seat {}", id, player_num);
        Ok(player_num)
    }

    /// Unbinds a connection from its seat. The seat stays claimed.
    pub fn disconnect(&mut self, id: ConnectionId) -> Option<PlayerNum> {
        let player_num = self.player_for(id)?;
        if let Some(seat) = self.seats[player_num.index()].as_mut() {
            seat.connection = None;
        }
        Some(player_num)
    }

    /// Applies a client message and pushes every resulting frame to its recipient.
    /// Returns how many frames went out.
    pub fn apply(&mut self, id: ConnectionId, msg: &str) -> Result<usize, RoomError> {
        let outbox = self.handle_message(id, msg)?;
        let sent = outbox.responses().count();
        outbox.deliver();
        Ok(sent)
    }

    pub fn handle_message(&mut self, id: ConnectionId, msg: &str) -> Result<Outbox<S>, RoomError> {
        let player_num = self.player_for(id).ok_or(SessionError::NotBound)?;
        let action = Action::parse(msg)?;
        self.dispatch(player_num, action)
    }

    pub fn dispatch(&mut self, player_num: PlayerNum, action: Action) -> Result<Outbox<S>, RoomError> {
        let mut outbox = Outbox::new();
        match action {
            Action::CommitColor(color) => {
                self.game_state.commit_color(player_num, color)?;
                info!("player {} committed a color", player_num);
                if let Some(sender) = self.sender(player_num) {
                    outbox.push(
                        sender.clone(),
                        Response::ColorConfirmed(ColorConfirmed { player: player_num }),
                    );
                }
            }
            Action::Move { color, destination } => {
                let outcome = self.game_state.make_move(player_num, color, destination)?;
                info!(
                    "player {} moved {} to {}, outcome {:?}",
                    player_num, color, destination, outcome
                );
            }
            Action::Guess(color) => {
                let outcome = self.game_state.guess(player_num, color)?;
                info!("player {} guessed {}, outcome {:?}", player_num, color, outcome);
            }
            Action::RequestMoves(color) => {
                let moves = self.game_state.legal_moves(color);
                if let Some(sender) = self.sender(player_num) {
                    outbox.push(sender.clone(), Response::ValidMoves(ValidMoves { color, moves }));
                }
            }
        }

        if action.is_mutating() {
            debug!(
                "board after player {}'s action:\n{}",
                player_num,
                render_board(&self.game_state)
            );
            outbox.extend(self.broadcast());
        }
        Ok(outbox)
    }

    /// One snapshot per connected seat, each marked with its recipient.
    pub fn broadcast(&self) -> Outbox<S> {
        let mut outbox = Outbox::new();
        for player_num in PlayerNum::both() {
            if let Some(sender) = self.sender(player_num) {
                let snapshot = Snapshot::new(&self.game_state, player_num);
                outbox.push(sender.clone(), Response::GameState(snapshot));
            }
        }
        outbox
    }
}
