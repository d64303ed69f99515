#[cfg(target_os = "espidf")]
fn main() -> Result<(), esp_idf_svc::sys::EspError> {
    use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::prelude::*;
    use reed_chessboard::config::BoardConfig;
    use reed_chessboard::esp32::{I2cRegisterBus, run_board};
    use reed_chessboard::resolver::MoveResolver;
    use reed_chessboard::rules::ShakmatyRules;
    use reed_chessboard::sensor::SensorGrid;

    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("Reed Switch Chess Board - ESP32");

    let config = BoardConfig::default();
    let peripherals = Peripherals::take()?;
    let i2c_config = I2cConfig::new().baudrate(100.kHz().into());
    let driver = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &i2c_config,
    )?;

    let mut sensor = SensorGrid::new(I2cRegisterBus::new(driver, config.address), &config);
    let mut resolver = if config.require_setup {
        MoveResolver::awaiting_setup(ShakmatyRules::new())
    } else {
        MoveResolver::new(ShakmatyRules::new())
    };

    run_board(&mut sensor, &mut resolver, &config)
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    use clap::Parser;
    use reed_chessboard::cli::BoardArgs;

    /// Reed switch chess board simulator
    #[derive(Parser, Debug)]
    #[command(author, version, about, long_about = None)]
    struct Args {
        #[command(flatten)]
        board: BoardArgs,
    }

    let args = Args::parse();
    args.board.init_logging();
    reed_chessboard::mock::run_interactive_terminal(args.board.config());
}
