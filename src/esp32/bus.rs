use esp_idf_svc::hal::delay::TickType;
use esp_idf_svc::hal::i2c::I2cDriver;
use esp_idf_svc::sys::EspError;

use crate::RegisterBus;

/// Per-transfer I2C timeout. A stuck bus fails the poll instead of hanging the loop.
const READ_TIMEOUT_MS: u64 = 50;

/// Error types for ESP32 I2C bus operations
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("I2C transfer with {address:#04x} failed: {source}")]
    Transfer {
        address: u8,
        #[source]
        source: EspError,
    },
}

/// Board controller reached over I2C.
///
/// The controller latches all 64 reed switches into eight row registers and
/// raises a flag register when they change; see [`crate::config`] for the
/// register map. One register is read per write-then-read transfer.
pub struct I2cRegisterBus<'d> {
    driver: I2cDriver<'d>,
    address: u8,
}

impl<'d> I2cRegisterBus<'d> {
    pub fn new(driver: I2cDriver<'d>, address: u8) -> Self {
        log::debug!("chessboard on I2C bus at {address:#04x}");
        Self { driver, address }
    }
}

impl RegisterBus for I2cRegisterBus<'_> {
    type Error = BusError;

    fn read_register(&mut self, register: u8) -> Result<u8, BusError> {
        let mut result = [0u8; 1];
        self.driver
            .write_read(
                self.address,
                &[register],
                &mut result,
                TickType::new_millis(READ_TIMEOUT_MS).ticks(),
            )
            .map_err(|source| BusError::Transfer {
                address: self.address,
                source,
            })?;
        Ok(result[0])
    }
}
