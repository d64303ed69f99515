use std::io::Write;
use std::time::Duration;

use crate::config::BoardConfig;
use crate::grid::{Orientation, Rotation};

/// Board options shared by the host binaries.
#[derive(clap::Args, Debug, Clone)]
pub struct BoardArgs {
    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Assume the pieces already stand on their starting squares
    #[arg(long)]
    pub skip_setup: bool,

    /// Clockwise rotation of the switch array in degrees (0, 90, 180, 270)
    #[arg(long, value_parser = parse_rotation, default_value = "0")]
    pub rotate: Rotation,

    /// Mirror the switch array left to right
    #[arg(long)]
    pub mirror: bool,

    /// Poll interval in milliseconds
    #[arg(long, default_value_t = 250)]
    pub poll_ms: u64,
}

impl BoardArgs {
    pub fn config(&self) -> BoardConfig {
        BoardConfig {
            poll_interval: Duration::from_millis(self.poll_ms),
            orientation: Orientation {
                rotation: self.rotate,
                mirror: self.mirror,
            },
            require_setup: !self.skip_setup,
            ..BoardConfig::default()
        }
    }

    /// Initialize `env_logger` on stderr, honouring `RUST_LOG` when set.
    pub fn init_logging(&self) {
        let log_level = if self.debug { "debug" } else { "warn" };
        env_logger::Builder::from_env(
            env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level),
        )
        .format(|buf, record| {
            writeln!(buf, "[{}] {}: {}", record.level(), record.target(), record.args())
        })
        .target(env_logger::Target::Stderr)
        .init();
    }
}

fn parse_rotation(s: &str) -> Result<Rotation, String> {
    s.parse::<u16>()
        .ok()
        .and_then(Rotation::from_degrees)
        .ok_or_else(|| format!("rotation must be 0, 90, 180 or 270, got '{s}'"))
}
