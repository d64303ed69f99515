use shakmaty::{Chess, Color, Move, Position, Role, Square};
use thiserror::Error;

use crate::RulesEngine;
use crate::grid::OccupancyGrid;

/// A piece was picked up from `from` and set down on `to`, and no legal
/// move for the side to move does that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no legal move from {from} to {to}")]
pub struct IllegalRelocation {
    pub from: Square,
    pub to: Square,
}

/// Standard chess rules backed by `shakmaty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShakmatyRules {
    promotion: Role,
}

impl Default for ShakmatyRules {
    /// Promotes to a queen; the board has no way to pick another piece.
    fn default() -> Self {
        Self {
            promotion: Role::Queen,
        }
    }
}

impl ShakmatyRules {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules that promote pawns to `role` instead of a queen.
    pub fn promoting_to(role: Role) -> Self {
        Self { promotion: role }
    }

    fn allowed(&self, mv: &Move) -> bool {
        mv.promotion().is_none_or(|role| role == self.promotion)
    }
}

impl RulesEngine for ShakmatyRules {
    type Position = Chess;
    type Move = Move;

    fn starting_position(&self) -> Chess {
        Chess::default()
    }

    fn occupancy(&self, position: &Chess) -> OccupancyGrid {
        position.board().occupied().into()
    }

    fn turn(&self, position: &Chess) -> Color {
        position.turn()
    }

    fn find_legal_move(
        &self,
        position: &Chess,
        from: Square,
        to: Square,
    ) -> Result<Move, IllegalRelocation> {
        position
            .legal_moves()
            .into_iter()
            .find(|mv| mv.from() == Some(from) && mv.to() == to && self.allowed(mv))
            .ok_or(IllegalRelocation { from, to })
    }

    fn apply(&self, position: &Chess, mv: &Move) -> Chess {
        let mut after = position.clone();
        after.play_unchecked(mv.clone());
        after
    }

    fn is_game_over(&self, position: &Chess) -> bool {
        position.is_game_over()
    }

    fn legal_moves(&self, position: &Chess) -> Vec<Move> {
        position
            .legal_moves()
            .into_iter()
            .filter(|mv| self.allowed(mv))
            .collect()
    }
}
