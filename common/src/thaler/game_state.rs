use crate::thaler::board::{BoardError, Cell, DIRECTIONS};
use crate::thaler::color::{Color, COLOR_COUNT};
use crate::thaler::player::PlayerNum;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    #[error("Not started yet!")]
    NotStarted,
    #[error("Game is already running!")]
    AlreadyRunning,
    #[error("Can't make a move while the game is initializing!")]
    Initializing,
    #[error("It's not Player {0}'s turn!")]
    NotYourTurn(PlayerNum),
    #[error("The {color} peg cannot move to cell {destination}")]
    IllegalMove { color: Color, destination: Cell },
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    #[serde(rename = "Waiting for start")]
    WaitingForStart,
    #[serde(rename = "Selecting")]
    Selecting,
    #[serde(rename = "P1 Turn")]
    P1Turn,
    #[serde(rename = "P2 Turn")]
    P2Turn,
    #[serde(rename = "Game ended")]
    Ended,
}

impl Phase {
    fn turn_of(player_num: PlayerNum) -> Self {
        match player_num {
            PlayerNum::P1 => Phase::P1Turn,
            PlayerNum::P2 => Phase::P2Turn,
        }
    }

    /// The player allowed to act, if the game is in a turn phase.
    pub fn current_player(self) -> Option<PlayerNum> {
        match self {
            Phase::P1Turn => Some(PlayerNum::P1),
            Phase::P2Turn => Some(PlayerNum::P2),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    #[serde(rename = "Not_yet")]
    NotYet,
    #[serde(rename = "P1_won")]
    P1Won,
    #[serde(rename = "P2_won")]
    P2Won,
}

impl Outcome {
    pub fn win_for(player_num: PlayerNum) -> Self {
        match player_num {
            PlayerNum::P1 => Outcome::P1Won,
            PlayerNum::P2 => Outcome::P2Won,
        }
    }

    pub fn winner(self) -> Option<PlayerNum> {
        match self {
            Outcome::NotYet => None,
            Outcome::P1Won => Some(PlayerNum::P1),
            Outcome::P2Won => Some(PlayerNum::P2),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    // Indexed by Color::index
    pegs: [Cell; COLOR_COUNT],
    thaler: Cell,
    phase: Phase,
    // Indexed by PlayerNum::index
    secrets: [Option<Color>; 2],
    outcome: Outcome,
}

impl Default for GameState {
    fn default() -> Self {
        GameState::random(&mut rand::thread_rng())
    }
}

impl GameState {
    /// Places the seven pegs and the thaler on eight distinct cells drawn
    /// without replacement.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let board: Vec<Cell> = Cell::all().collect();
        let drawn: Vec<Cell> = board
            .choose_multiple(rng, COLOR_COUNT + 1)
            .copied()
            .collect();
        let pegs = std::array::from_fn(|i| drawn[i]);
        Self::fresh(pegs, drawn[COLOR_COUNT])
    }

    /// Builds a board from explicit positions, indexed by `Color::index`.
    pub fn with_positions(pegs: [Cell; COLOR_COUNT], thaler: Cell) -> Result<Self, BoardError> {
        let mut seen = Vec::with_capacity(COLOR_COUNT + 1);
        for cell in pegs.iter().chain(std::iter::once(&thaler)) {
            if seen.contains(cell) {
                return Err(BoardError::Overlap(*cell));
            }
            seen.push(*cell);
        }
        Ok(Self::fresh(pegs, thaler))
    }

    fn fresh(pegs: [Cell; COLOR_COUNT], thaler: Cell) -> Self {
        GameState {
            pegs,
            thaler,
            phase: Phase::WaitingForStart,
            secrets: [None, None],
            outcome: Outcome::NotYet,
        }
    }

    pub fn peg(&self, color: Color) -> Cell {
        self.pegs[color.index()]
    }

    pub fn pegs(&self) -> impl Iterator<Item = (Color, Cell)> + '_ {
        Color::ALL.into_iter().map(|c| (c, self.peg(c)))
    }

    pub fn thaler(&self) -> Cell {
        self.thaler
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn secret(&self, player_num: PlayerNum) -> Option<Color> {
        self.secrets[player_num.index()]
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::Ended)
    }

    /// Moves a waiting game into color selection. Returns whether the phase changed.
    pub fn begin_selection(&mut self) -> bool {
        if self.phase == Phase::WaitingForStart {
            self.phase = Phase::Selecting;
            true
        } else {
            false
        }
    }

    /// Records a player's secret color. Later commits by the same player are ignored.
    pub fn commit_color(&mut self, player_num: PlayerNum, color: Color) -> Result<(), GameError> {
        match self.phase {
            Phase::WaitingForStart => return Err(GameError::NotStarted),
            Phase::P1Turn | Phase::P2Turn | Phase::Ended => return Err(GameError::AlreadyRunning),
            Phase::Selecting => {}
        }
        let secret = &mut self.secrets[player_num.index()];
        if secret.is_none() {
            *secret = Some(color);
        }
        if self.secrets.iter().all(Option::is_some) {
            self.phase = Phase::P1Turn;
        }
        Ok(())
    }

    fn is_occupied(&self, cell: Cell) -> bool {
        self.pegs.contains(&cell)
    }

    /// Every cell the peg may move to: one step or an unobstructed two-step
    /// leap in any of the eight directions, onto a free cell strictly closer
    /// to the thaler.
    pub fn legal_moves(&self, color: Color) -> Vec<Cell> {
        let current = self.peg(color);
        let current_distance = current.distance(self.thaler);
        let is_closer = |cell: Cell| cell.distance(self.thaler) < current_distance;

        let mut moves = Vec::new();
        for (dx, dy) in DIRECTIONS {
            let (dx, dy) = (i32::from(dx), i32::from(dy));
            let step = current.add_xy(dx, dy);
            if let Some(cell) = step {
                if !self.is_occupied(cell) && is_closer(cell) {
                    moves.push(cell);
                }
            }
            let leap = current.add_xy(dx * 2, dy * 2);
            if let (Some(skipped), Some(cell)) = (step, leap) {
                if !self.is_occupied(skipped) && !self.is_occupied(cell) && is_closer(cell) {
                    moves.push(cell);
                }
            }
        }
        moves
    }

    // Only the acting player may move or guess, and only once play has begun
    fn check_turn(&self, player_num: PlayerNum) -> Result<(), GameError> {
        match self.phase {
            Phase::WaitingForStart | Phase::Selecting => Err(GameError::Initializing),
            phase if phase.current_player() == Some(player_num) => Ok(()),
            _ => Err(GameError::NotYourTurn(player_num)),
        }
    }

    pub fn make_move(
        &mut self,
        player_num: PlayerNum,
        color: Color,
        destination: Cell,
    ) -> Result<Outcome, GameError> {
        self.check_turn(player_num)?;
        if !self.legal_moves(color).contains(&destination) {
            return Err(GameError::IllegalMove { color, destination });
        }
        self.pegs[color.index()] = destination;

        if destination == self.thaler {
            self.outcome = self.attribute_win(player_num, color);
            self.phase = Phase::Ended;
        } else {
            self.phase = Phase::turn_of(player_num.other());
        }
        Ok(self.outcome)
    }

    // Decides who wins once a peg of `landed` color reaches the thaler.
    // Checked in order, first match wins. Identical secrets hand the win to
    // the player who did not move.
    fn attribute_win(&self, mover: PlayerNum, landed: Color) -> Outcome {
        let is_p1_secret = self.secret(PlayerNum::P1) == Some(landed);
        let is_p2_secret = self.secret(PlayerNum::P2) == Some(landed);
        match (mover, is_p1_secret, is_p2_secret) {
            (PlayerNum::P1, true, true) => Outcome::P2Won,
            (PlayerNum::P1, true, false) => Outcome::P1Won,
            (PlayerNum::P2, true, true) => Outcome::P1Won,
            (PlayerNum::P2, false, true) => Outcome::P2Won,
            (PlayerNum::P1, _, _) => Outcome::P2Won,
            (PlayerNum::P2, _, _) => Outcome::P1Won,
        }
    }

    /// Guesses the opponent's secret color. Right or wrong, the game ends.
    pub fn guess(&mut self, player_num: PlayerNum, guessed: Color) -> Result<Outcome, GameError> {
        self.check_turn(player_num)?;
        self.outcome = if self.secret(player_num.other()) == Some(guessed) {
            Outcome::win_for(player_num)
        } else {
            Outcome::win_for(player_num.other())
        };
        self.phase = Phase::Ended;
        Ok(self.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cell(idx: u8) -> Cell {
        Cell::new(idx).unwrap()
    }

    // Pegs in Color::ALL order: red, orange, yellow, green, blue, pink, purple
    fn state_with(pegs: [u8; 7], thaler: u8) -> GameState {
        GameState::with_positions(pegs.map(cell), cell(thaler)).unwrap()
    }

    fn started(pegs: [u8; 7], thaler: u8, p1: Color, p2: Color) -> GameState {
        let mut state = state_with(pegs, thaler);
        state.begin_selection();
        state.commit_color(PlayerNum::P1, p1).unwrap();
        state.commit_color(PlayerNum::P2, p2).unwrap();
        state
    }

    // Red two columns left of the thaler at the center, everything else far away
    const SPREAD: [u8; 7] = [22, 0, 6, 42, 48, 3, 45];

    fn sorted(mut cells: Vec<Cell>) -> Vec<Cell> {
        cells.sort();
        cells
    }

    #[test]
    fn test_random_placement_is_distinct() {
        for seed in 0..200 {
            let state = GameState::random(&mut StdRng::seed_from_u64(seed));
            let mut cells: Vec<Cell> = state.pegs().map(|(_, c)| c).collect();
            cells.push(state.thaler());
            cells.sort();
            cells.dedup();
            assert_eq!(cells.len(), 8);
            assert!(cells.iter().all(|c| c.index() < 49));
            assert_eq!(state.phase(), Phase::WaitingForStart);
            assert_eq!(state.outcome(), Outcome::NotYet);
        }
    }

    #[test]
    fn test_with_positions_rejects_overlap() {
        let pegs = [1, 2, 3, 4, 5, 6, 7].map(cell);
        assert_eq!(
            GameState::with_positions(pegs, cell(4)),
            Err(BoardError::Overlap(cell(4)))
        );
        let pegs = [1, 2, 3, 4, 5, 6, 1].map(cell);
        assert_eq!(
            GameState::with_positions(pegs, cell(30)),
            Err(BoardError::Overlap(cell(1)))
        );
    }

    #[test]
    fn test_adjacent_peg_can_reach_thaler() {
        let state = state_with([23, 0, 6, 42, 48, 3, 45], 24);
        assert_eq!(state.legal_moves(Color::Red), vec![cell(24)]);
    }

    #[test]
    fn test_legal_moves_steps_and_leaps() {
        let state = state_with(SPREAD, 24);
        assert_eq!(
            sorted(state.legal_moves(Color::Red)),
            vec![cell(16), cell(23), cell(24), cell(30)]
        );
    }

    #[test]
    fn test_legal_moves_blocked_by_pegs() {
        // Orange sits between red and the thaler, so the leap is blocked too
        let state = state_with([22, 23, 6, 42, 48, 3, 45], 24);
        assert_eq!(
            sorted(state.legal_moves(Color::Red)),
            vec![cell(16), cell(30)]
        );

        // Yellow occupies a step destination
        let state = state_with([22, 0, 16, 42, 48, 3, 45], 24);
        assert_eq!(
            sorted(state.legal_moves(Color::Red)),
            vec![cell(23), cell(24), cell(30)]
        );
    }

    #[test]
    fn test_leap_onto_peg_is_illegal() {
        let state = state_with([8, 0, 6, 42, 48, 3, 45], 32);
        assert_eq!(sorted(state.legal_moves(Color::Red)), vec![cell(16), cell(24)]);

        // Orange on the landing cell, the cell jumped over is still free
        let mut state = started([8, 24, 6, 42, 48, 3, 45], 32, Color::Blue, Color::Green);
        assert_eq!(state.legal_moves(Color::Red), vec![cell(16)]);
        let before = state.clone();
        assert_eq!(
            state.make_move(PlayerNum::P1, Color::Red, cell(24)),
            Err(GameError::IllegalMove {
                color: Color::Red,
                destination: cell(24)
            })
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_legal_moves_properties() {
        for seed in 0..100 {
            let state = GameState::random(&mut StdRng::seed_from_u64(seed));
            for color in Color::ALL {
                let from = state.peg(color);
                for to in state.legal_moves(color) {
                    assert!(!state.pegs().any(|(_, c)| c == to));
                    assert!(to.distance(state.thaler()) < from.distance(state.thaler()));
                    let reachable = DIRECTIONS.iter().any(|&(dx, dy)| {
                        let (dx, dy) = (i32::from(dx), i32::from(dy));
                        let step = from.add_xy(dx, dy);
                        step == Some(to)
                            || (from.add_xy(dx * 2, dy * 2) == Some(to)
                                && step.map_or(false, |s| !state.pegs().any(|(_, c)| c == s)))
                    });
                    assert!(reachable, "{:?} -> {:?} is not a step or leap", from, to);
                }
            }
        }
    }

    #[test]
    fn test_commit_color_phases() {
        let mut state = state_with(SPREAD, 24);
        assert_eq!(
            state.commit_color(PlayerNum::P1, Color::Red),
            Err(GameError::NotStarted)
        );
        assert!(state.begin_selection());
        assert!(!state.begin_selection());

        state.commit_color(PlayerNum::P2, Color::Blue).unwrap();
        assert_eq!(state.phase(), Phase::Selecting);
        // A second commit by the same player changes nothing
        state.commit_color(PlayerNum::P2, Color::Green).unwrap();
        assert_eq!(state.secret(PlayerNum::P2), Some(Color::Blue));
        assert_eq!(state.phase(), Phase::Selecting);

        state.commit_color(PlayerNum::P1, Color::Red).unwrap();
        assert_eq!(state.phase(), Phase::P1Turn);

        let before = state.clone();
        assert_eq!(
            state.commit_color(PlayerNum::P1, Color::Pink),
            Err(GameError::AlreadyRunning)
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_turns_alternate() {
        let mut state = started(SPREAD, 24, Color::Red, Color::Blue);
        assert_eq!(
            state.make_move(PlayerNum::P2, Color::Red, cell(23)),
            Err(GameError::NotYourTurn(PlayerNum::P2))
        );
        assert_eq!(
            state.make_move(PlayerNum::P1, Color::Red, cell(23)),
            Ok(Outcome::NotYet)
        );
        assert_eq!(state.peg(Color::Red), cell(23));
        assert_eq!(state.phase(), Phase::P2Turn);
        assert_eq!(
            state.guess(PlayerNum::P1, Color::Blue),
            Err(GameError::NotYourTurn(PlayerNum::P1))
        );
    }

    #[test]
    fn test_move_before_start() {
        let mut state = state_with(SPREAD, 24);
        assert_eq!(
            state.make_move(PlayerNum::P1, Color::Red, cell(23)),
            Err(GameError::Initializing)
        );
        state.begin_selection();
        assert_eq!(
            state.guess(PlayerNum::P1, Color::Red),
            Err(GameError::Initializing)
        );
    }

    #[test]
    fn test_illegal_move_leaves_state_unchanged() {
        let mut state = started(SPREAD, 24, Color::Red, Color::Blue);
        let before = state.clone();
        // Moving away from the thaler
        assert_eq!(
            state.make_move(PlayerNum::P1, Color::Red, cell(21)),
            Err(GameError::IllegalMove {
                color: Color::Red,
                destination: cell(21)
            })
        );
        // Onto another peg
        assert!(state.make_move(PlayerNum::P1, Color::Red, cell(0)).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn test_identical_secrets_mover_loses() {
        let mut state = started([0, 6, 23, 42, 48, 3, 45], 24, Color::Yellow, Color::Yellow);
        assert_eq!(
            state.make_move(PlayerNum::P1, Color::Yellow, cell(24)),
            Ok(Outcome::P2Won)
        );
        assert_eq!(state.phase(), Phase::Ended);
        assert!(state.is_over());
    }

    #[test]
    fn test_own_color_wins_for_mover() {
        let mut state = started([0, 6, 2, 42, 23, 3, 45], 24, Color::Blue, Color::Green);
        assert_eq!(
            state.make_move(PlayerNum::P1, Color::Blue, cell(24)),
            Ok(Outcome::P1Won)
        );
        assert_eq!(state.phase(), Phase::Ended);
    }

    #[test]
    fn test_win_attribution_on_p2_turn() {
        let pegs = [0, 6, 2, 42, 23, 3, 25];
        // P2 lands its own color
        let mut state = started(pegs, 24, Color::Red, Color::Blue);
        state.make_move(PlayerNum::P1, Color::Red, cell(8)).unwrap();
        assert_eq!(
            state.make_move(PlayerNum::P2, Color::Blue, cell(24)),
            Ok(Outcome::P2Won)
        );

        // P2 lands P1's color
        let mut state = started(pegs, 24, Color::Blue, Color::Red);
        state.make_move(PlayerNum::P1, Color::Red, cell(8)).unwrap();
        assert_eq!(
            state.make_move(PlayerNum::P2, Color::Blue, cell(24)),
            Ok(Outcome::P1Won)
        );

        // Identical secrets on P2's turn
        let mut state = started(pegs, 24, Color::Blue, Color::Blue);
        state.make_move(PlayerNum::P1, Color::Red, cell(8)).unwrap();
        assert_eq!(
            state.make_move(PlayerNum::P2, Color::Blue, cell(24)),
            Ok(Outcome::P1Won)
        );

        // Nobody's color
        let mut state = started(pegs, 24, Color::Red, Color::Green);
        state.make_move(PlayerNum::P1, Color::Red, cell(8)).unwrap();
        assert_eq!(
            state.make_move(PlayerNum::P2, Color::Purple, cell(24)),
            Ok(Outcome::P1Won)
        );
    }

    #[test]
    fn test_landing_foreign_color_loses_for_p1() {
        let mut state = started([0, 6, 2, 42, 23, 3, 45], 24, Color::Red, Color::Green);
        assert_eq!(
            state.make_move(PlayerNum::P1, Color::Blue, cell(24)),
            Ok(Outcome::P2Won)
        );
    }

    #[test]
    fn test_guess() {
        let mut state = started(SPREAD, 24, Color::Pink, Color::Green);
        state.make_move(PlayerNum::P1, Color::Red, cell(23)).unwrap();
        assert_eq!(state.guess(PlayerNum::P2, Color::Pink), Ok(Outcome::P2Won));
        assert_eq!(state.phase(), Phase::Ended);

        let mut state = started(SPREAD, 24, Color::Pink, Color::Green);
        state.make_move(PlayerNum::P1, Color::Red, cell(23)).unwrap();
        assert_eq!(state.guess(PlayerNum::P2, Color::Red), Ok(Outcome::P1Won));
        assert_eq!(state.phase(), Phase::Ended);
    }

    #[test]
    fn test_no_actions_after_end() {
        let mut state = started(SPREAD, 24, Color::Pink, Color::Green);
        state.guess(PlayerNum::P1, Color::Green).unwrap();
        let before = state.clone();
        assert_eq!(
            state.make_move(PlayerNum::P2, Color::Red, cell(23)),
            Err(GameError::NotYourTurn(PlayerNum::P2))
        );
        assert_eq!(
            state.guess(PlayerNum::P1, Color::Green),
            Err(GameError::NotYourTurn(PlayerNum::P1))
        );
        assert_eq!(state, before);
        assert_eq!(state.outcome().winner(), Some(PlayerNum::P1));
    }
}
