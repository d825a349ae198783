// src/main.rs
use std::env;
use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use chess_3d::config::{Config, DEFAULT_CONFIG_FILENAME};
use chess_3d::engine::EngineBridge;
use chess_3d::error::CommandError;
use chess_3d::render::{AssetLoader, StandardInventory, TextRenderer};
use chess_3d::session::{Outcome, Session};
use chess_3d::BoardState;
use log::{error, warn};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config_path = env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));
    let config = Config::load(&config_path)?;

    let asset_paths: Vec<PathBuf> = config.asset_paths.iter().map(PathBuf::from).collect();
    let inventory = StandardInventory.load_piece_inventory(&asset_paths)?;
    let board = BoardState::setup(&inventory)?;

    println!("==============================");
    println!("|      Game Of Chess 3D      |");
    println!("==============================");
    print_help();

    let mut session = Session::new(board, TextRenderer::stdout(), &config);

    // --- Engine Setup ---
    if config.engine.enabled {
        match EngineBridge::start(&config.engine) {
            Ok(engine) => {
                println!("Engine ready: {}", engine.name().unwrap_or(config.engine.path.as_str()));
                session.attach_engine(engine);
            }
            Err(e) => {
                error!("{}", e);
                println!("ERROR: {}. Playing without the engine.", e);
            }
        }
    }

    // --- Main Command Loop ---
    session.render();
    'command_loop: loop {
        print!("Please enter a command: ");
        io::stdout().flush()?;

        let mut input_line = String::new();
        match io::stdin().read_line(&mut input_line) {
            Ok(0) => {
                println!("\nEnd of input detected.");
                break 'command_loop;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}. Try again or use 'quit'.", CommandError::from(e));
                continue 'command_loop;
            }
        }
        let input = input_line.trim();
        if input.is_empty() { continue 'command_loop; }

        match session.execute_line(input) {
            Ok(Outcome::Moved(report)) => {
                match &report.captured {
                    Some(victim) => println!("{} takes {} on {}", report.piece, victim, report.to),
                    None => println!("{} moved from {} to {}", report.piece, report.from, report.to),
                }
                match session.engine_reply() {
                    Ok(Some(reply)) => {
                        println!("Engine best move: {}", reply.best);
                        if let Err(e) = reply.applied {
                            println!("Engine move {} could not be shown on the board: {}", reply.best, e);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("Engine unavailable: {}", e),
                }
            }
            Ok(Outcome::ViewChanged) => {}
            Ok(Outcome::Quit) => break 'command_loop,
            Err(CommandError::InvalidCommand(_)) => println!("Invalid command or move!!"),
            Err(e) => println!("Error: {}", e),
        }
    }

    // --- Post-Game ---
    if let Some(filename) = &config.stats_file {
        if let Err(e) = session.save_stats(filename) {
            warn!("{}", e);
            println!("Warning: {}", e);
        }
    }
    session.disconnect_engine();
    println!("Thanks for playing!!");
    Ok(())
}

/// Prints available commands.
fn print_help() {
    println!("\nAvailable Commands:");
    println!("  move <from><to>               Move a piece, e.g. 'move e2e4'.");
    println!("  camera <theta> <phi> <radius> Place the camera (theta 10-80, phi 0-360).");
    println!("  light <theta> <phi> <radius>  Place the light (same ranges).");
    println!("  power <value>                 Set the light intensity.");
    println!("  quit                          Exit the game.");
    println!();
}
