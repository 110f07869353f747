mod action;
mod board;
mod color;
mod game_state;
mod player;
mod render;

pub use action::{Action, ActionError, RawAction, RawPayload};
pub use board::{BoardError, Cell, BOARD_WIDTH, CELL_COUNT, DIRECTIONS};
pub use color::{Color, ParseColorError, COLOR_COUNT};
pub use game_state::{GameError, GameState, Outcome, Phase};
pub use player::{InvalidPlayerNum, PlayerNum};
pub use render::render_board;
