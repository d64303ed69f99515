use std::fmt;

use shakmaty::{Color, Square};

pub mod config;
pub mod grid;
pub mod resolver;
pub mod rules;
pub mod sensor;

use grid::OccupancyGrid;
use rules::IllegalRelocation;

/// Trait for reading single-byte registers from the board controller.
///
/// Abstracts over the I2C bus (ESP32) and mock/scripted boards, so
/// [`sensor::SensorGrid`] owns an explicit handle instead of reaching for a
/// global device.
pub trait RegisterBus {
    /// Error type for bus read failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read one register of the board controller.
    fn read_register(&mut self, register: u8) -> Result<u8, Self::Error>;
}

/// Trait for the chess rules the resolver checks sensor readings against.
///
/// [`rules::ShakmatyRules`] implements standard chess; tests plug in small
/// stubs so the state machine can be exercised without a move generator.
pub trait RulesEngine {
    type Position: Clone;
    type Move: Clone + PartialEq + fmt::Debug + fmt::Display;

    /// The position a freshly set up board represents.
    fn starting_position(&self) -> Self::Position;

    /// Which squares hold a piece, independent of piece identity.
    fn occupancy(&self, position: &Self::Position) -> OccupancyGrid;

    /// Side to move.
    fn turn(&self, position: &Self::Position) -> Color;

    /// The legal move carrying a piece from `from` to `to`, if there is one.
    fn find_legal_move(
        &self,
        position: &Self::Position,
        from: Square,
        to: Square,
    ) -> Result<Self::Move, IllegalRelocation>;

    /// The position after playing a move returned by this engine.
    fn apply(&self, position: &Self::Position, mv: &Self::Move) -> Self::Position;

    /// True once the side to move has no legal reply or the game is otherwise decided.
    fn is_game_over(&self, position: &Self::Position) -> bool;

    /// Every move the side to move could play on the physical board.
    fn legal_moves(&self, position: &Self::Position) -> Vec<Self::Move>;
}

#[cfg(target_os = "espidf")]
pub mod esp32;

#[cfg(not(target_os = "espidf"))]
pub mod cli;

#[cfg(not(target_os = "espidf"))]
pub mod mock;
