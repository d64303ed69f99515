use std::collections::VecDeque;

use shakmaty::{Chess, Position, Square};
use thiserror::Error;

use crate::RegisterBus;
use crate::config::{BoardConfig, CHANGED_REGISTER, FIRST_ROW_REGISTER};
use crate::grid::{OccupancyGrid, SIZE};

/// Error when parsing a board script.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid square notation: '{0}'")]
pub struct ParseError(String);

/// Simulated bus failure, injected with [`ScriptedBus::fail_next_reads`].
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("simulated bus fault on register {0:#04x}")]
pub struct BusFault(pub u8);

/// A scriptable stand-in for the board controller.
///
/// Holds the reed switch state and serves it through the same register map
/// as the real controller, so it can sit behind a
/// [`SensorGrid`](crate::sensor::SensorGrid). Script batches are applied on
/// demand; new script can be appended at any time for interactive use.
///
/// Serves the default register map unless moved with
/// [`ScriptedBus::with_register_map`].
#[derive(Debug, Clone)]
pub struct ScriptedBus {
    grid: OccupancyGrid,
    changed: bool,
    changed_register: u8,
    first_row_register: u8,
    failing_reads: usize,
    pending_batches: VecDeque<Vec<Square>>,
}

impl Default for ScriptedBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBus {
    /// Create with the starting chess position.
    pub fn new() -> Self {
        Self::from_grid(Chess::default().board().occupied().into())
    }

    /// Create from a specific switch state.
    pub fn from_grid(grid: OccupancyGrid) -> Self {
        Self {
            grid,
            changed: true,
            changed_register: CHANGED_REGISTER,
            first_row_register: FIRST_ROW_REGISTER,
            failing_reads: 0,
            pending_batches: VecDeque::new(),
        }
    }

    /// Serve the registers `config` points a [`SensorGrid`](crate::sensor::SensorGrid) at.
    pub fn with_register_map(mut self, config: &BoardConfig) -> Self {
        self.changed_register = config.changed_register;
        self.first_row_register = config.first_row_register;
        self
    }

    /// Current switch state.
    #[inline]
    pub fn grid(&self) -> OccupancyGrid {
        self.grid
    }

    /// Flip the switch under `square`.
    pub fn toggle(&mut self, square: Square) {
        self.grid = self.grid.toggled(square);
        self.changed = true;
    }

    /// Replace the switch state (for FEN loading) and drop pending batches.
    pub fn load_grid(&mut self, grid: OccupancyGrid) {
        self.grid = grid;
        self.changed = true;
        self.pending_batches.clear();
    }

    /// Make the next `count` register reads fail.
    pub fn fail_next_reads(&mut self, count: usize) {
        self.failing_reads = count;
    }

    /// Parse and queue additional script for execution.
    ///
    /// Format:
    /// - Squares are 2 characters (e.g., "e2", "a1") and toggle that switch
    /// - Spaces separate squares in the same batch
    /// - Periods (". ") end a batch
    ///
    /// Examples:
    /// - `"e2e4."` - Toggle e2 & e4 together, then tick
    /// - `"e2 e4."` - Same (explicit space)
    /// - `"e2.  e4."` - Toggle e2, tick, toggle e4, tick
    pub fn push_script(&mut self, script: &str) -> Result<(), ParseError> {
        let batches = parse_script(script)?;
        self.pending_batches.extend(batches);
        Ok(())
    }

    /// Number of batches not yet applied.
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending_batches.len()
    }

    /// Apply the next pending batch, returning the new switch state.
    /// Returns None if no batches are pending.
    pub fn tick(&mut self) -> Option<OccupancyGrid> {
        let batch = self.pending_batches.pop_front()?;
        for square in batch {
            self.toggle(square);
        }
        Some(self.grid)
    }

    /// Apply all pending batches, calling the provided callback for each.
    pub fn drain<F>(&mut self, mut on_tick: F)
    where
        F: FnMut(OccupancyGrid),
    {
        while let Some(grid) = self.tick() {
            on_tick(grid);
        }
    }
}

impl RegisterBus for ScriptedBus {
    type Error = BusFault;

    fn read_register(&mut self, register: u8) -> Result<u8, BusFault> {
        if self.failing_reads > 0 {
            self.failing_reads -= 1;
            return Err(BusFault(register));
        }

        let row = usize::from(register.wrapping_sub(self.first_row_register));
        let value = if register == self.changed_register {
            u8::from(std::mem::take(&mut self.changed))
        } else if row < SIZE {
            self.grid.to_row_bytes()[row]
        } else {
            0
        };
        Ok(value)
    }
}

/// Parse a board script into batches of squares to toggle.
pub fn parse_script(script: &str) -> Result<Vec<Vec<Square>>, ParseError> {
    let mut batches: Vec<Vec<Square>> = vec![Vec::new()];
    let mut current_token = String::new();

    for ch in script.chars() {
        match ch {
            '.' => {
                flush_token(&mut current_token, &mut batches)?;
                batches.push(Vec::new());
            }
            c if c.is_whitespace() => {
                flush_token(&mut current_token, &mut batches)?;
            }
            _ => {
                current_token.push(ch);

                if current_token.len() == 2 {
                    flush_token(&mut current_token, &mut batches)?;
                }
            }
        }
    }

    flush_token(&mut current_token, &mut batches)?;

    batches.retain(|b| !b.is_empty());
    Ok(batches)
}

/// Add current token to the last batch and clear it.
fn flush_token(token: &mut String, batches: &mut [Vec<Square>]) -> Result<(), ParseError> {
    if token.is_empty() {
        return Ok(());
    }
    let square: Square = token.parse().map_err(|_| ParseError(token.clone()))?;
    if let Some(batch) = batches.last_mut() {
        batch.push(square);
    }
    token.clear();
    Ok(())
}
