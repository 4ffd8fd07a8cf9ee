use std::env;
use std::error::Error;
use std::fs;
use std::process;

use env_logger::{Builder, Env};

use chip8_shell::display::MonoTermSurface;
use chip8_shell::input::{KeyMap, TermInput};
use chip8_shell::interpreter::{Interpreter, TestCardCore};
use chip8_shell::runtime::{Config, Runtime, StopToken};

fn main() -> Result<(), Box<dyn Error>> {
    // logs land on stderr, away from the raw-mode display
    Builder::from_env(Env::default().default_filter_or("warn")).init();

    let rom_path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: chip8-shell <rom>");
            process::exit(2);
        }
    };
    let rom = fs::read(&rom_path)?;

    // TestCardCore has no CPU; swap in any Interpreter to run the rom for
    // real. Esc quits.
    let config = Config::default();
    let core = TestCardCore::new();
    let surface = MonoTermSurface::new(
        core.width() * config.scale_factor,
        core.height() * config.scale_factor,
    )?;
    let input = TermInput::new()?;

    let mut shell = Runtime::new(core, surface, input, KeyMap::conventional(), &config);
    shell.supply_rom(rom);
    shell.run(&StopToken::new())?;

    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..12 {
        println!();
    }
    Ok(())
}
