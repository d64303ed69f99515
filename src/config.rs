use std::time::Duration;

use crate::grid::Orientation;

/// I2C address the board controller answers on.
pub const DEFAULT_ADDRESS: u8 = 0x50;

/// Non-zero while the controller holds a reading the host has not fetched yet.
pub const CHANGED_REGISTER: u8 = 0x8F;

/// Row 0 (rank 8) lives here; rows 1..=7 follow consecutively.
pub const FIRST_ROW_REGISTER: u8 = 0x90;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Hardware and loop settings for one physical board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub address: u8,
    pub changed_register: u8,
    pub first_row_register: u8,
    pub poll_interval: Duration,
    pub orientation: Orientation,
    /// Hold in `WaitingForSetup` until the pieces match the starting position.
    pub require_setup: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            changed_register: CHANGED_REGISTER,
            first_row_register: FIRST_ROW_REGISTER,
            poll_interval: DEFAULT_POLL_INTERVAL,
            orientation: Orientation::default(),
            require_setup: true,
        }
    }
}
