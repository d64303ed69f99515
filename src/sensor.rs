use thiserror::Error;

use crate::RegisterBus;
use crate::config::BoardConfig;
use crate::grid::{self, OccupancyGrid, Orientation, SIZE, SquareDelta};

/// Failure to read the reed switch array over the bus.
///
/// A poll that hits this error produces no update; the caller retries on the
/// next cycle.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to read register {register:#04x}: {source}")]
    Read {
        register: u8,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Owns the bus handle and the most recent snapshots read through it.
#[derive(Debug)]
pub struct SensorGrid<B> {
    bus: B,
    changed_register: u8,
    first_row_register: u8,
    orientation: Orientation,
    latest: Option<OccupancyGrid>,
    previous: Option<OccupancyGrid>,
}

impl<B: RegisterBus> SensorGrid<B> {
    pub fn new(bus: B, config: &BoardConfig) -> Self {
        Self {
            bus,
            changed_register: config.changed_register,
            first_row_register: config.first_row_register,
            orientation: config.orientation,
            latest: None,
            previous: None,
        }
    }

    /// Reads all eight row registers and returns the oriented grid.
    ///
    /// Nothing is stored if any register read fails.
    pub fn capture(&mut self) -> Result<OccupancyGrid, TransportError> {
        let mut rows = [0u8; SIZE];
        for (offset, row) in rows.iter_mut().enumerate() {
            *row = self.read(self.first_row_register.wrapping_add(offset as u8))?;
        }

        let grid = OccupancyGrid::from_row_bytes(rows).oriented(self.orientation);
        log::trace!("captured grid {grid:?}");
        self.previous = self.latest.replace(grid);
        Ok(grid)
    }

    /// Asks the board controller whether the switches changed since the last read.
    pub fn has_new_state(&mut self) -> Result<bool, TransportError> {
        Ok(self.read(self.changed_register)? > 0)
    }

    #[inline]
    pub fn diff(a: &OccupancyGrid, b: &OccupancyGrid) -> SquareDelta {
        grid::diff(a, b)
    }

    #[inline]
    pub fn equals(a: &OccupancyGrid, b: &OccupancyGrid) -> bool {
        grid::equals(a, b)
    }

    #[inline]
    pub fn latest(&self) -> Option<OccupancyGrid> {
        self.latest
    }

    #[inline]
    pub fn previous(&self) -> Option<OccupancyGrid> {
        self.previous
    }

    /// True when the last two captures differ.
    pub fn changed(&self) -> bool {
        match (self.previous, self.latest) {
            (Some(previous), Some(latest)) => !grid::equals(&previous, &latest),
            (None, Some(_)) => true,
            _ => false,
        }
    }

    #[inline]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    #[inline]
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    fn read(&mut self, register: u8) -> Result<u8, TransportError> {
        self.bus
            .read_register(register)
            .map_err(|err| TransportError::Read {
                register,
                source: Box::new(err),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Rotation;
    use shakmaty::{Chess, Position, Square};

    #[derive(Debug, Error)]
    #[error("bus nack")]
    struct Nack;

    /// Serves fixed row bytes and can be told to fail on one register.
    struct FakeBus {
        rows: [u8; SIZE],
        changed: u8,
        fail_on: Option<u8>,
    }

    impl RegisterBus for FakeBus {
        type Error = Nack;

        fn read_register(&mut self, register: u8) -> Result<u8, Nack> {
            if self.fail_on == Some(register) {
                return Err(Nack);
            }
            match register {
                0x8F => Ok(self.changed),
                0x90..=0x97 => Ok(self.rows[usize::from(register - 0x90)]),
                _ => Ok(0),
            }
        }
    }

    fn sensor_with(grid: OccupancyGrid) -> SensorGrid<FakeBus> {
        let bus = FakeBus {
            rows: grid.to_row_bytes(),
            changed: 0,
            fail_on: None,
        };
        SensorGrid::new(bus, &BoardConfig::default())
    }

    #[test]
    fn test_capture_reads_start_position() {
        let start: OccupancyGrid = Chess::default().board().occupied().into();
        let mut sensor = sensor_with(start);

        let grid = sensor.capture().expect("fake bus never fails");

        assert_eq!(grid, start);
        assert_eq!(sensor.latest(), Some(start));
        assert!(sensor.changed());
    }

    #[test]
    fn test_capture_tracks_previous() {
        let start: OccupancyGrid = Chess::default().board().occupied().into();
        let mut sensor = sensor_with(start);
        sensor.capture().unwrap();

        let lifted = start.toggled(Square::E2);
        sensor.bus_mut().rows = lifted.to_row_bytes();
        sensor.capture().unwrap();

        assert_eq!(sensor.previous(), Some(start));
        assert_eq!(sensor.latest(), Some(lifted));
        assert!(sensor.changed());

        sensor.capture().unwrap();
        assert!(!sensor.changed());
    }

    #[test]
    fn test_failed_read_keeps_last_snapshot() {
        let start: OccupancyGrid = Chess::default().board().occupied().into();
        let mut sensor = sensor_with(start);
        sensor.capture().unwrap();

        sensor.bus_mut().rows = start.toggled(Square::E2).to_row_bytes();
        sensor.bus_mut().fail_on = Some(0x96);
        let err = sensor.capture().unwrap_err();

        assert!(matches!(err, TransportError::Read { register: 0x96, .. }));
        assert_eq!(err.to_string(), "failed to read register 0x96: bus nack");
        assert_eq!(sensor.latest(), Some(start));
    }

    #[test]
    fn test_capture_applies_orientation() {
        let raw = OccupancyGrid::EMPTY.toggled(Square::A8);
        let bus = FakeBus {
            rows: raw.to_row_bytes(),
            changed: 0,
            fail_on: None,
        };
        let config = BoardConfig {
            orientation: Orientation {
                rotation: Rotation::Cw90,
                mirror: false,
            },
            ..BoardConfig::default()
        };
        let mut sensor = SensorGrid::new(bus, &config);

        let grid = sensor.capture().unwrap();

        assert!(grid.is_occupied(Square::H8));
    }

    #[test]
    fn test_has_new_state_reads_flag_register() {
        let mut sensor = sensor_with(OccupancyGrid::EMPTY);
        assert!(!sensor.has_new_state().unwrap());

        sensor.bus_mut().changed = 1;
        assert!(sensor.has_new_state().unwrap());

        sensor.bus_mut().fail_on = Some(0x8F);
        assert!(sensor.has_new_state().is_err());
    }
}
