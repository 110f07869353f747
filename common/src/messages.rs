use crate::thaler::{Cell, Color, GameState, InvalidPlayerNum, Outcome, Phase, PlayerNum};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HandshakeError {
    #[error("Could not read handshake: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("expected hello but got: {0}")]
    UnexpectedHeader(String),
    #[error(transparent)]
    InvalidPlayer(#[from] InvalidPlayerNum),
    #[error("No player_id given to reconnect with")]
    MissingPlayerId,
    #[error("Player {0:?} is not a number")]
    UnreadablePlayer(String),
}

// Clients send the seat either as a number or as a numeric string
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RawPlayer {
    Number(i64),
    Text(String),
}

impl RawPlayer {
    fn player_num(self) -> Result<PlayerNum, HandshakeError> {
        let n = match self {
            RawPlayer::Number(n) => n,
            RawPlayer::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|_| HandshakeError::UnreadablePlayer(text))?,
        };
        Ok(PlayerNum::try_from(n)?)
    }
}

#[derive(Deserialize, Debug, Default)]
struct RawHello {
    player: Option<RawPlayer>,
    player_id: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawHandshake(String, #[serde(default)] RawHello);

/// The first message a client sends on a fresh connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Handshake {
    NewPlayer,
    Claim(PlayerNum),
    Reconnect { player_id: String },
}

impl Handshake {
    pub fn parse(msg: &str) -> Result<Self, HandshakeError> {
        let RawHandshake(header, hello) = serde_json::from_str(msg)?;
        match header.as_str() {
            "hello" => match hello.player {
                Some(player) => Ok(Handshake::Claim(player.player_num()?)),
                None => Ok(Handshake::NewPlayer),
            },
            "reconnect" => hello
                .player_id
                .map(|player_id| Handshake::Reconnect { player_id })
                .ok_or(HandshakeError::MissingPlayerId),
            _ => Err(HandshakeError::UnexpectedHeader(header)),
        }
    }
}

/// The public view of a game, addressed to one player.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub pegs: BTreeMap<Color, Cell>,
    pub thaler_pos: Cell,
    pub current_phase: Phase,
    pub outcome: Outcome,
    pub you_are: PlayerNum,
}

impl Snapshot {
    pub fn new(game_state: &GameState, you_are: PlayerNum) -> Self {
        Snapshot {
            pegs: game_state.pegs().collect(),
            thaler_pos: game_state.thaler(),
            current_phase: game_state.phase(),
            outcome: game_state.outcome(),
            you_are,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Welcome {
    pub you_are: PlayerNum,
    pub player_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ColorConfirmed {
    pub player: PlayerNum,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ValidMoves {
    pub color: Color,
    pub moves: Vec<Cell>,
}

// Every server frame goes out as a `[tag, payload]` pair
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    HelloOkay(Welcome),
    TryAgain(String),
    GameState(Snapshot),
    ColorConfirmed(ColorConfirmed),
    ValidMoves(ValidMoves),
    InvalidAction(String),
}

impl Response {
    pub fn tag(&self) -> &'static str {
        match self {
            Response::HelloOkay(_) => "hello_okay",
            Response::TryAgain(_) => "try_again",
            Response::GameState(_) => "game_state",
            Response::ColorConfirmed(_) => "color_confirmed",
            Response::ValidMoves(_) => "valid_moves",
            Response::InvalidAction(_) => "invalid_action",
        }
    }
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tag = self.tag();
        match self {
            Response::HelloOkay(welcome) => (tag, welcome).serialize(serializer),
            Response::TryAgain(reason) | Response::InvalidAction(reason) => {
                (tag, reason).serialize(serializer)
            }
            Response::GameState(snapshot) => (tag, snapshot).serialize(serializer),
            Response::ColorConfirmed(confirmed) => (tag, confirmed).serialize(serializer),
            Response::ValidMoves(moves) => (tag, moves).serialize(serializer),
        }
    }
}
