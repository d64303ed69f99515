use std::io::{self, Write};

use super::ScriptedBus;
use crate::config::BoardConfig;
use crate::grid::OccupancyGrid;
use crate::resolver::{MoveResolver, State};
use crate::rules::ShakmatyRules;
use crate::sensor::SensorGrid;
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, File, Position, Rank, Role, Square, fen::Fen,
};

/// Clears the screen and moves cursor to top-left.
#[inline]
fn clear_screen() {
    print!("\x1B[2J\x1B[H");
}

/// Simulated board: a scripted bus behind a sensor grid, feeding a resolver.
struct Session {
    sensor: SensorGrid<ScriptedBus>,
    resolver: MoveResolver<ShakmatyRules>,
    state: State,
    message: Option<String>,
}

impl Session {
    fn new(config: &BoardConfig) -> Self {
        let start: OccupancyGrid = Chess::default().board().occupied().into();
        let (bus, resolver) = if config.require_setup {
            // Leave the white king off so the setup phase is visible.
            let bus = ScriptedBus::from_grid(start.toggled(Square::E1));
            (bus, MoveResolver::awaiting_setup(ShakmatyRules::new()))
        } else {
            (ScriptedBus::from_grid(start), MoveResolver::new(ShakmatyRules::new()))
        };
        let mut session = Self {
            sensor: SensorGrid::new(bus.with_register_map(config), config),
            resolver,
            state: State::NullState,
            message: None,
        };
        session.poll();
        session
    }

    fn load(&mut self, position: Chess) {
        let grid = position.board().occupied().into();
        self.sensor.bus_mut().load_grid(grid);
        self.resolver = MoveResolver::from_position(ShakmatyRules::new(), position);
        self.poll();
    }

    /// Capture through the bus and feed the reading to the resolver.
    fn poll(&mut self) {
        match self.sensor.capture() {
            Ok(grid) => self.state = self.resolver.poll(grid),
            Err(e) => {
                log::warn!("skipping poll: {e}");
                self.message = Some(format!("⚠ {e}"));
            }
        }
    }

    fn run_script(&mut self, script: &str) {
        if let Err(e) = self.sensor.bus_mut().push_script(script) {
            self.message = Some(format!("❌ {e}"));
            return;
        }
        while self.sensor.bus().pending() > 0 {
            self.sensor.bus_mut().tick();
            self.poll();
        }
    }

    fn confirm(&mut self, uci: &str) {
        let chosen = self
            .resolver
            .candidates()
            .into_iter()
            .find(|mv| mv.to_uci(CastlingMode::Standard).to_string() == uci);
        self.message = Some(match chosen {
            Some(mv) => match self.resolver.confirm(&mv) {
                Ok(state) => {
                    self.state = state;
                    format!("✅ played {mv}")
                }
                Err(e) => format!("❌ {e}"),
            },
            None => format!("❌ {uci} is not a candidate"),
        });
    }
}

/// Runs an interactive terminal interface for simulating the reed switch board.
///
/// Displays raw sensor state alongside the logical game and the resolver's state.
pub fn run_interactive_terminal(config: BoardConfig) {
    let mut session = Session::new(&config);

    clear_screen();
    draw_interface(&mut session);

    loop {
        print!("> ");
        if let Err(e) = io::stdout().flush() {
            eprintln!("Failed to flush stdout: {}", e);
            break;
        }

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Failed to read input: {}", e);
                break;
            }
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "t" => match parts.get(1).map(|s| s.parse::<Square>()) {
                Some(Ok(square)) => {
                    session.sensor.bus_mut().toggle(square);
                    session.poll();
                }
                Some(Err(e)) => session.message = Some(format!("Invalid square: {}", e)),
                None => session.message = Some("Usage: t <square>".to_string()),
            },
            "s" => {
                let script = input.trim_start()[1..].trim();
                session.run_script(script);
            }
            "c" => match parts.get(1) {
                Some(uci) => session.confirm(uci),
                None => session.message = Some("Usage: c <uci>".to_string()),
            },
            "load" => {
                if parts.len() < 2 {
                    session.message = Some("Usage: load <fen> | load startpos".to_string());
                } else {
                    let fen_str = if parts[1] == "startpos" {
                        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
                    } else {
                        // Rejoin the rest of the parts as FEN might contain spaces
                        input.trim_start()[4..].trim()
                    };

                    session.message = Some(match fen_str.parse::<Fen>() {
                        Ok(fen) => match fen.into_position::<Chess>(CastlingMode::Standard) {
                            Ok(chess) => {
                                session.load(chess);
                                "✅ Position loaded from FEN".to_string()
                            }
                            Err(_) => "❌ Invalid FEN setup".to_string(),
                        },
                        Err(e) => format!("❌ Invalid FEN: {}", e),
                    });
                }
            }
            "r" => {
                session = Session::new(&config);
                session.message = Some("🔄 Reset to initial state".to_string());
            }
            "p" => {}
            "q" => break,
            _ => session.message = Some("Unknown command".to_string()),
        }

        clear_screen();
        draw_interface(&mut session);
    }
}

/// Draws the complete interface: help text, state, and dual boards.
fn draw_interface(session: &mut Session) {
    println!("♟️  Reed Switch Chess Board Simulator");
    println!();
    println!(
        "Commands: t <square> | s <script> | c <uci> | load <fen> | r (reset) | p (refresh) | q (quit)"
    );
    println!();

    draw_dual_boards(session);

    let resolver = &session.resolver;
    let side = match resolver.side_to_move() {
        Color::White => "white",
        Color::Black => "black",
    };
    println!("State:    {} ({} to move)", session.state, side);
    println!(
        "FEN:      {}",
        Fen::from_position(resolver.position(), EnPassantMode::Legal)
    );

    let delta = resolver.delta();
    if !delta.is_empty() {
        println!(
            "Delta:    +{} -{}",
            join_squares(&delta.added),
            join_squares(&delta.removed)
        );
    }
    if let Some(rejection) = resolver.last_rejection() {
        println!("Rejected: {rejection}");
    }
    if session.state == State::PieceInTransit {
        let candidates: Vec<String> = resolver
            .candidates()
            .iter()
            .map(|mv| mv.to_uci(CastlingMode::Standard).to_string())
            .collect();
        if !candidates.is_empty() {
            println!("Confirm:  {} (c <uci>)", candidates.join(" "));
        }
    }
    if let Some(message) = session.message.take() {
        println!();
        println!("{message}");
    }
}

fn join_squares(squares: &[Square]) -> String {
    squares
        .iter()
        .map(|sq| sq.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Draws both boards side-by-side: raw sensors (left) and game state (right).
fn draw_dual_boards(session: &Session) {
    let sensor_grid = session.sensor.latest().unwrap_or_default();

    println!("╔═════════════════════════════╦═════════════════════════════╗");
    println!("║       Raw Sensors           ║       Game State            ║");
    println!("╠═══╦═════════════════════════╬═══╦═════════════════════════╣");

    for rank in Rank::ALL.iter().rev() {
        print!("║ {} ║", rank.char());
        for file in File::ALL {
            let square = Square::from_coords(file, *rank);
            let has_sensor = sensor_grid.is_occupied(square);
            print!("{}", if has_sensor { " ♟ " } else { " · " });
        }

        print!(" ║");

        print!(" {} ║", rank.char());
        for file in File::ALL {
            let square = Square::from_coords(file, *rank);
            print!("{}", game_state_symbol(square, &sensor_grid, &session.resolver));
        }

        println!(" ║");
    }

    println!("╠═══╬═════════════════════════╬═══╬═════════════════════════╣");
    println!("║   ║ a  b  c  d  e  f  g  h  ║   ║ a  b  c  d  e  f  g  h  ║");
    println!("╚═══╩═════════════════════════╩═══╩═════════════════════════╝");

    println!(
        "Sensor:   {:?} | Pieces: {:02}",
        sensor_grid,
        sensor_grid.count()
    );
}

/// Get the display symbol for a square on the game state board.
fn game_state_symbol(
    square: Square,
    sensor_grid: &OccupancyGrid,
    resolver: &MoveResolver<ShakmatyRules>,
) -> &'static str {
    let has_sensor = sensor_grid.is_occupied(square);

    match resolver.position().board().piece_at(square) {
        Some(piece) if has_sensor => match (piece.role, piece.color) {
            (Role::Pawn, Color::White) => " P ",
            (Role::Knight, Color::White) => " N ",
            (Role::Bishop, Color::White) => " B ",
            (Role::Rook, Color::White) => " R ",
            (Role::Queen, Color::White) => " Q ",
            (Role::King, Color::White) => " K ",
            (Role::Pawn, Color::Black) => " p ",
            (Role::Knight, Color::Black) => " n ",
            (Role::Bishop, Color::Black) => " b ",
            (Role::Rook, Color::Black) => " r ",
            (Role::Queen, Color::Black) => " q ",
            (Role::King, Color::Black) => " k ",
        },
        // Missing piece
        Some(_) => " ○ ",
        // Extra piece
        None if has_sensor => " ⚠ ",
        None => " · ",
    }
}
