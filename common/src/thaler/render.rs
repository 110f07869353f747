use crate::thaler::board::{Cell, BOARD_WIDTH};
use crate::thaler::game_state::GameState;

const RESET: &str = "\x1b[0m";
const CHECKER: &str = "\x1b[100m";
const THALER: &str = "\x1b[47m";

/// Paints the board with ANSI colors for terminal debugging.
pub fn render_board(state: &GameState) -> String {
    let width = usize::from(BOARD_WIDTH);
    let mut cells: Vec<String> = Cell::all()
        .map(|c| {
            let shade = if c.index() % 2 == 0 { RESET } else { CHECKER };
            format!("{}{}  ", RESET, shade)
        })
        .collect();
    for (color, cell) in state.pegs() {
        cells[usize::from(cell.index())] = format!("{}{}{} ", RESET, color.ansi_code(), color.letter());
    }
    cells[usize::from(state.thaler().index())] = format!("{}{}T ", RESET, THALER);

    cells
        .chunks(width)
        .map(|row| format!("{}{}", row.concat(), RESET))
        .collect::<Vec<String>>()
        .join("\n")
}
