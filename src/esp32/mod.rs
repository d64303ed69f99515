mod bus;

pub use bus::{BusError, I2cRegisterBus};

use esp_idf_svc::hal::delay::FreeRtos;

use crate::RegisterBus;
use crate::config::BoardConfig;
use crate::resolver::{MoveResolver, State};
use crate::rules::ShakmatyRules;
use crate::sensor::SensorGrid;

/// Capture and reconcile forever, one poll per configured interval.
///
/// Bus failures skip the poll and leave the game untouched.
pub fn run_board<B: RegisterBus>(
    sensor: &mut SensorGrid<B>,
    resolver: &mut MoveResolver<ShakmatyRules>,
    config: &BoardConfig,
) -> ! {
    let delay_ms = u32::try_from(config.poll_interval.as_millis()).unwrap_or(u32::MAX);
    let mut last = State::NullState;

    loop {
        match sensor.capture() {
            Ok(grid) => {
                let state = resolver.poll(grid);
                if state != last {
                    log::info!("{state} ({:?} to move)", resolver.side_to_move());
                    last = state;
                }
            }
            Err(e) => log::warn!("skipping poll: {e}"),
        }
        FreeRtos::delay_ms(delay_ms);
    }
}
