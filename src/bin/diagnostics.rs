//! Dumps raw reed switch readings the way the board controller prints them
//! over serial, together with what the resolver makes of each one.

#[cfg(target_os = "espidf")]
fn main() -> Result<(), esp_idf_svc::sys::EspError> {
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::prelude::*;
    use reed_chessboard::config::BoardConfig;
    use reed_chessboard::esp32::I2cRegisterBus;
    use reed_chessboard::sensor::SensorGrid;

    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("Reed Switch Chess Board - diagnostics");

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

    loop {
        match sensor.has_new_state() {
            Ok(true) => match sensor.capture() {
                Ok(grid) => log::info!("Board state:\n{grid}"),
                Err(e) => log::warn!("{e}"),
            },
            Ok(false) => {}
            Err(e) => log::warn!("{e}"),
        }
        FreeRtos::delay_ms(100);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    use clap::Parser;
    use reed_chessboard::cli::BoardArgs;
    use reed_chessboard::mock::ScriptedBus;
    use reed_chessboard::resolver::MoveResolver;
    use reed_chessboard::rules::ShakmatyRules;
    use reed_chessboard::sensor::SensorGrid;
    use shakmaty::{CastlingMode, Chess, Position, fen::Fen};

    /// Replay a board script and print every reading with the resolver's state
    #[derive(Parser, Debug)]
    #[command(author, version, about, long_about = None)]
    struct Args {
        /// Board script, e.g. "e2. e4. e7e5."
        script: String,

        /// Position the board starts from instead of the standard one
        #[arg(long)]
        fen: Option<String>,

        #[command(flatten)]
        board: BoardArgs,
    }

    let args = Args::parse();
    args.board.init_logging();

    let position: Chess = match &args.fen {
        Some(fen) => match fen
            .parse::<Fen>()
            .map_err(|e| e.to_string())
            .and_then(|fen| {
                fen.into_position(CastlingMode::Standard)
                    .map_err(|e| e.to_string())
            }) {
            Ok(position) => position,
            Err(e) => {
                eprintln!("Invalid FEN: {e}");
                std::process::exit(2);
            }
        },
        None => Chess::default(),
    };

    let config = args.board.config();
    let mut bus =
        ScriptedBus::from_grid(position.board().occupied().into()).with_register_map(&config);
    if let Err(e) = bus.push_script(&args.script) {
        eprintln!("{e}");
        std::process::exit(2);
    }

    let mut sensor = SensorGrid::new(bus, &config);
    let mut resolver = MoveResolver::from_position(ShakmatyRules::new(), position);

    loop {
        match sensor.capture() {
            Ok(grid) => {
                let state = resolver.poll(grid);
                println!("{grid}");
                println!("state: {state} ({:?} to move)", resolver.side_to_move());
                let delta = resolver.delta();
                if !delta.is_empty() {
                    println!("added: {:?} removed: {:?}", delta.added, delta.removed);
                }
                if let Some(rejection) = resolver.last_rejection() {
                    println!("rejected: {rejection}");
                }
                for mv in resolver.candidates() {
                    println!("candidate: {mv}");
                }
                println!();
            }
            Err(e) => log::warn!("{e}"),
        }
        if sensor.bus_mut().tick().is_none() {
            break;
        }
    }

    for (ply, mv) in resolver.history().iter().enumerate() {
        println!("{:>3}. {mv}", ply + 1);
    }
}
