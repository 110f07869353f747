use crate::thaler::board::Cell;
use crate::thaler::color::Color;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Could not read message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Unrecognized action {0:?}")]
    UnrecognizedAction(String),
    #[error("No color given")]
    MissingColor,
    #[error("No valid color: {0:?}")]
    InvalidColor(String),
    #[error("No destination given")]
    MissingDestination,
    #[error("Destination {0} is not a cell on the board")]
    InvalidDestination(i64),
}

// Loosely typed payload, exactly as it arrives from a client
#[derive(Clone, Deserialize, Debug, Default)]
pub struct RawPayload {
    pub color: Option<String>,
    pub dst: Option<i64>,
}

/// An inbound action frame: `[name, payload]`.
#[derive(Clone, Deserialize, Debug)]
pub struct RawAction(pub String, #[serde(default)] pub RawPayload);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    CommitColor(Color),
    Move { color: Color, destination: Cell },
    Guess(Color),
    RequestMoves(Color),
}

impl Action {
    pub fn parse(msg: &str) -> Result<Self, ActionError> {
        let raw: RawAction = serde_json::from_str(msg)?;
        Action::new(raw)
    }

    // validates:
    // - action name
    // - presence of the fields the action needs
    // - color names and board cells
    pub fn new(raw: RawAction) -> Result<Self, ActionError> {
        let RawAction(name, payload) = raw;
        match name.as_str() {
            "commit_color" | "make_player_choice" => Ok(Action::CommitColor(color(&payload)?)),
            "move" | "make_player_move" => {
                let color = color(&payload)?;
                let dst = payload.dst.ok_or(ActionError::MissingDestination)?;
                let destination =
                    Cell::try_from(dst).map_err(|_| ActionError::InvalidDestination(dst))?;
                Ok(Action::Move { color, destination })
            }
            "guess" | "make_player_guess" => Ok(Action::Guess(color(&payload)?)),
            "request_moves" => Ok(Action::RequestMoves(color(&payload)?)),
            _ => Err(ActionError::UnrecognizedAction(name)),
        }
    }

    /// Whether applying this action can change the game state.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Action::RequestMoves(_))
    }
}

fn color(payload: &RawPayload) -> Result<Color, ActionError> {
    let raw = payload.color.as_deref().ok_or(ActionError::MissingColor)?;
    raw.parse::<Color>()
        .map_err(|_| ActionError::InvalidColor(raw.to_string()))
}
