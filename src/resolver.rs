use std::fmt;

use shakmaty::Color;
use thiserror::Error;

use crate::RulesEngine;
use crate::grid::{self, OccupancyGrid, SquareDelta};
use crate::rules::IllegalRelocation;

/// Outcome of reconciling one sensor reading with the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum State {
    /// Nothing has been polled yet.
    #[default]
    NullState,
    /// The pieces do not yet stand on their starting squares.
    WaitingForSetup,
    /// The board agrees with the game; [`MoveResolver::side_to_move`] says whose turn it is.
    WaitingForMoveBySideToMove,
    /// The board disagrees in a way that is not one finished move.
    PieceInTransit,
    /// One piece was relocated to a square no legal move reaches.
    MoveRejected,
    /// The game has ended. Terminal.
    GameOver,
}

impl State {
    #[inline]
    pub fn is_terminal(self) -> bool {
        self == State::GameOver
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::NullState => "null",
            State::WaitingForSetup => "waiting for setup",
            State::WaitingForMoveBySideToMove => "waiting for move",
            State::PieceInTransit => "piece in transit",
            State::MoveRejected => "move rejected",
            State::GameOver => "game over",
        };
        f.write_str(name)
    }
}

/// Failure to apply a move the host picked from [`MoveResolver::candidates`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no sensor reading has been polled yet")]
    NoGrid,
    #[error("the board has not been set up yet")]
    SetupIncomplete,
    #[error("{0} does not produce the board as last read")]
    NotACandidate(String),
    #[error("the game is over")]
    GameOver,
}

/// Turns sensor readings into moves on the logical board.
///
/// The resolver diffs every reading against the last grid that agreed with
/// the game (not against the previous raw reading), so a piece can spend any
/// number of polls in the air without confusing it. Only a single square
/// emptied plus a single square filled is ever played automatically; every
/// other shape waits, and the host can settle it through [`Self::confirm`].
pub struct MoveResolver<R: RulesEngine> {
    rules: R,

    /// The logical position. Only replaced as a whole by a played move.
    position: R::Position,

    /// Moves played since the resolver was created.
    history: Vec<R::Move>,

    /// Last reading known to agree with `position`.
    confirmed: OccupancyGrid,

    /// Most recent reading passed to `poll`.
    last_grid: Option<OccupancyGrid>,

    delta: SquareDelta,
    rejection: Option<IllegalRelocation>,
    state: State,
    awaiting_setup: bool,
}

impl<R: RulesEngine> MoveResolver<R> {
    /// Creates a resolver for a board that already shows the starting position.
    pub fn new(rules: R) -> Self {
        let position = rules.starting_position();
        Self::from_position(rules, position)
    }

    /// Creates a resolver that reports [`State::WaitingForSetup`] until the
    /// pieces are placed on their starting squares.
    pub fn awaiting_setup(rules: R) -> Self {
        let mut resolver = Self::new(rules);
        resolver.awaiting_setup = true;
        resolver
    }

    /// Creates a resolver for a board that already shows `position`.
    pub fn from_position(rules: R, position: R::Position) -> Self {
        let confirmed = rules.occupancy(&position);
        Self {
            rules,
            position,
            history: Vec::new(),
            confirmed,
            last_grid: None,
            delta: SquareDelta::default(),
            rejection: None,
            state: State::NullState,
            awaiting_setup: false,
        }
    }

    /// Reconcile one sensor reading with the game.
    ///
    /// Plays the move when the reading is exactly one legal relocation away
    /// from the confirmed grid. Once the game is over, readings are still
    /// diffed for diagnostics but never change the position.
    pub fn poll(&mut self, grid: OccupancyGrid) -> State {
        self.last_grid = Some(grid);
        self.rejection = None;

        let state = self.resolve(grid);
        if state != self.state {
            log::debug!("{} -> {}", self.state, state);
        }
        self.state = state;
        state
    }

    fn resolve(&mut self, grid: OccupancyGrid) -> State {
        if self.state.is_terminal() {
            self.delta = grid::diff(&self.confirmed, &grid);
            return State::GameOver;
        }

        let expected = self.expected_grid();
        let matches = grid::equals(&grid, &expected);

        if self.awaiting_setup {
            if !matches {
                self.delta = grid::diff(&grid, &expected);
                return State::WaitingForSetup;
            }
            self.awaiting_setup = false;
            log::info!("board set up, {:?} to move", self.side_to_move());
        }

        if matches {
            self.confirmed = grid;
            self.delta = SquareDelta::default();
            return State::WaitingForMoveBySideToMove;
        }

        self.delta = grid::diff(&self.confirmed, &grid);
        let Some((from, to)) = self.delta.single_relocation() else {
            return State::PieceInTransit;
        };

        log::debug!("trying move {from}{to}");
        match self.rules.find_legal_move(&self.position, from, to) {
            Ok(mv) => {
                let after = self.rules.apply(&self.position, &mv);
                // En passant matches the endpoints but also empties the captured pawn's square.
                if !grid::equals(&self.rules.occupancy(&after), &grid) {
                    log::debug!("{mv} changes more squares than {from}{to}");
                    return State::PieceInTransit;
                }
                self.commit(mv, after, grid)
            }
            Err(rejection) => {
                log::debug!("rejected: {rejection}");
                self.rejection = Some(rejection);
                State::MoveRejected
            }
        }
    }

    /// Legal moves that would leave the board exactly as last read.
    ///
    /// This is how castling, en passant and captures get resolved: the poll
    /// reports [`State::PieceInTransit`] for them and the host offers these
    /// moves to the player.
    pub fn candidates(&self) -> Vec<R::Move> {
        let Some(grid) = self.last_grid else {
            return Vec::new();
        };
        if self.awaiting_setup || self.state.is_terminal() {
            return Vec::new();
        }

        self.rules
            .legal_moves(&self.position)
            .into_iter()
            .filter(|mv| {
                let after = self.rules.apply(&self.position, mv);
                grid::equals(&self.rules.occupancy(&after), &grid)
            })
            .collect()
    }

    /// Play a move the host picked from [`Self::candidates`].
    pub fn confirm(&mut self, mv: &R::Move) -> Result<State, ResolveError> {
        if self.state.is_terminal() {
            return Err(ResolveError::GameOver);
        }
        let grid = self.last_grid.ok_or(ResolveError::NoGrid)?;
        if self.awaiting_setup {
            return Err(ResolveError::SetupIncomplete);
        }
        if !self.candidates().contains(mv) {
            return Err(ResolveError::NotACandidate(mv.to_string()));
        }

        let after = self.rules.apply(&self.position, mv);
        let state = self.commit(mv.clone(), after, grid);
        log::debug!("{} -> {} (confirmed by host)", self.state, state);
        self.rejection = None;
        self.state = state;
        Ok(state)
    }

    fn commit(&mut self, mv: R::Move, after: R::Position, grid: OccupancyGrid) -> State {
        log::info!("played {mv}");
        self.position = after;
        self.history.push(mv);
        self.confirmed = grid;
        self.delta = SquareDelta::default();

        if self.rules.is_game_over(&self.position) {
            log::info!("game over after {} moves", self.history.len());
            State::GameOver
        } else {
            State::WaitingForMoveBySideToMove
        }
    }

    /// The occupancy the board should show for the current position.
    #[inline]
    pub fn expected_grid(&self) -> OccupancyGrid {
        self.rules.occupancy(&self.position)
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.rules.turn(&self.position)
    }

    #[inline]
    pub fn position(&self) -> &R::Position {
        &self.position
    }

    #[inline]
    pub fn rules(&self) -> &R {
        &self.rules
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// Squares that differ from the confirmed grid in the last reading.
    ///
    /// While waiting for setup this instead lists the squares that still need
    /// a piece (`added`) or must be cleared (`removed`).
    #[inline]
    pub fn delta(&self) -> &SquareDelta {
        &self.delta
    }

    #[inline]
    pub fn confirmed(&self) -> &OccupancyGrid {
        &self.confirmed
    }

    #[inline]
    pub fn history(&self) -> &[R::Move] {
        &self.history
    }

    /// The relocation behind the last [`State::MoveRejected`], until the next poll.
    #[inline]
    pub fn last_rejection(&self) -> Option<IllegalRelocation> {
        self.rejection
    }
}

impl<R: RulesEngine> fmt::Debug for MoveResolver<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoveResolver")
            .field("state", &self.state)
            .field("side_to_move", &self.side_to_move())
            .field("moves", &self.history.len())
            .field("confirmed", &self.confirmed)
            .field("awaiting_setup", &self.awaiting_setup)
            .finish()
    }
}
