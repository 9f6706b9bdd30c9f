//! Game session: one board, its random source, score and the floating score popups.

use crate::board::{Board, BoardConfig, BoardError};
use crate::bubble::Bubble;
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// How long a "+N" popup stays on screen.
const POPUP_LIFETIME_MS: u32 = 1500;
/// Popups rise one row per step.
const POPUP_STEP_MS: u32 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScorePopup {
    pub column: usize,
    pub row: usize,
    pub amount: u32,
    /// Kind of the popped group, for colouring the label.
    pub kind: u8,
    pub age_ms: u32,
}

#[derive(Debug)]
pub struct GameSession {
    board: Board,
    rng: StdRng,
    score: u32,
    /// Successful pops this game.
    pops: u32,
    pub popups: Vec<ScorePopup>,
}

impl GameSession {
    /// Session with an empty board; call [`GameSession::init`] to deal bubbles.
    pub fn new(config: BoardConfig, seed: Option<u64>) -> Result<Self, BoardError> {
        Ok(Self::from_board(Board::new(config)?, seed))
    }

    /// Wrap an existing board (e.g. one built with [`Board::from_kinds`]).
    pub fn from_board(board: Board, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            board,
            rng,
            score: 0,
            pops: 0,
            popups: Vec::new(),
        }
    }

    /// Reset score and deal a fresh board.
    pub fn init(&mut self) {
        self.board.init(&mut self.rng);
        self.score = 0;
        self.pops = 0;
        self.popups.clear();
        info!(
            "new game on {}x{} board",
            self.board.width(),
            self.board.height()
        );
    }

    pub fn select(&mut self, column: i32, row: i32) {
        self.board.select(column, row);
    }

    pub fn clear_selection(&mut self) {
        self.board.clear_selection();
    }

    /// Pop the selected group. Returns the number of bubbles removed (0 if the group is too small).
    pub fn pop(&mut self) -> usize {
        let removed = self.board.pop(&mut self.rng);
        if removed == 0 {
            return 0;
        }
        let amount = removed as u32;
        self.score += amount;
        self.pops += 1;
        if let Some(first) = self.board.popped().first() {
            self.popups.push(ScorePopup {
                column: first.column(),
                row: first.row(),
                amount,
                kind: first.kind(),
                age_ms: 0,
            });
        }
        if self.is_game_over() {
            info!("no moves left after {} pops, score {}", self.pops, self.score);
        }
        removed
    }

    pub fn is_game_over(&self) -> bool {
        !self.board.has_more_moves()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn pops(&self) -> u32 {
        self.pops
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn bubbles(&self) -> impl Iterator<Item = &Bubble> {
        self.board.bubbles()
    }

    pub fn selection_len(&self) -> usize {
        self.board.selection_len()
    }

    /// Bubbles removed by the last pop; hands ownership to the caller.
    pub fn take_popped(&mut self) -> Vec<Bubble> {
        self.board.take_popped()
    }

    pub fn tick_popups(&mut self, delta_ms: u32) {
        self.popups.retain_mut(|p| {
            let old_steps = p.age_ms / POPUP_STEP_MS;
            p.age_ms += delta_ms;
            if p.age_ms / POPUP_STEP_MS > old_steps {
                p.row = p.row.saturating_sub(1);
            }
            p.age_ms < POPUP_LIFETIME_MS
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Adjacency;
    use crate::board::BoardState;

    fn scenario() -> GameSession {
        let board = Board::from_kinds(
            BoardConfig::new(3, 3, 2),
            &[0, 0, 1, 0, 1, 1, 1, 1, 0],
        )
        .unwrap();
        GameSession::from_board(board, Some(9))
    }

    #[test]
    fn test_new_rejects_bad_config() {
        assert!(GameSession::new(BoardConfig::new(0, 3, 3), None).is_err());
        assert!(GameSession::new(BoardConfig::new(3, 3, 0), None).is_err());
    }

    #[test]
    fn test_init_deals_full_board_and_resets_score() {
        let mut session = scenario();
        session.select(0, 0);
        session.pop();
        assert_eq!(session.score(), 3);

        session.init();
        assert_eq!(session.score(), 0);
        assert_eq!(session.pops(), 0);
        assert!(session.popups.is_empty());
        assert_eq!(session.bubbles().count(), 9);
        assert_eq!(session.selection_len(), 0);
    }

    #[test]
    fn test_pop_scores_group_size() {
        let mut session = scenario();
        session.select(0, 0);
        assert_eq!(session.pop(), 3);
        assert_eq!(session.score(), 3);
        assert_eq!(session.pops(), 1);
        assert_eq!(session.popups.len(), 1);
        assert_eq!(session.popups[0].amount, 3);
        assert_eq!((session.popups[0].column, session.popups[0].row), (0, 0));
        assert_eq!(session.take_popped().len(), 3);
    }

    #[test]
    fn test_pop_lone_bubble_scores_nothing() {
        let mut session = scenario();
        session.select(2, 2);
        assert_eq!(session.pop(), 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.pops(), 0);
        assert!(session.popups.is_empty());
    }

    #[test]
    fn test_pop_without_selection_scores_nothing() {
        let mut session = scenario();
        assert_eq!(session.pop(), 0);
        session.select(0, 0);
        session.clear_selection();
        assert_eq!(session.pop(), 0);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn test_score_never_decreases() {
        let mut session = GameSession::new(BoardConfig::new(8, 6, 3), Some(21)).unwrap();
        session.init();
        let mut last = 0;
        'game: for _ in 0..100 {
            for row in 0..6 {
                for column in 0..8 {
                    session.select(column, row);
                    let size = session.selection_len();
                    let removed = session.pop();
                    assert!(removed == 0 || removed == size);
                    assert_eq!(session.score(), last + removed as u32);
                    last = session.score();
                    if session.is_game_over() {
                        break 'game;
                    }
                }
            }
        }
        assert!(session.bubbles().count() == 48);
    }

    #[test]
    fn test_same_seed_deals_same_board() {
        let config = BoardConfig::new(6, 6, 5);
        let mut a = GameSession::new(config, Some(77)).unwrap();
        let mut b = GameSession::new(config, Some(77)).unwrap();
        a.init();
        b.init();
        let kinds = |s: &GameSession| s.bubbles().map(Bubble::kind).collect::<Vec<_>>();
        assert_eq!(kinds(&a), kinds(&b));
    }

    #[test]
    fn test_game_over_on_striped_board() {
        let kinds: Vec<u8> = (0..4)
            .flat_map(|r| (0..4).map(move |c| ((c + r) % 3) as u8))
            .collect();
        let config = BoardConfig {
            adjacency: Adjacency::Four,
            ..BoardConfig::new(4, 4, 3)
        };
        let session = GameSession::from_board(Board::from_kinds(config, &kinds).unwrap(), None);
        assert!(session.is_game_over());
        assert_eq!(session.board().state(), BoardState::GameOver);
    }

    #[test]
    fn test_popups_rise_and_expire() {
        let mut session = scenario();
        session.popups.push(ScorePopup {
            column: 1,
            row: 2,
            amount: 4,
            kind: 0,
            age_ms: 0,
        });
        session.tick_popups(POPUP_STEP_MS);
        assert_eq!(session.popups[0].row, 1);
        session.tick_popups(POPUP_LIFETIME_MS);
        assert!(session.popups.is_empty());
    }
}
