use std::{env, process};
use tiabus::debug::{describe_cartridge, describe_page_table};
use tiabus::{Cartridge, CartridgeVariant, Console, Serializer, Settings};

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);

    let rom_path = match args.next() {
        Some(path) => path,
        None => {
            eprintln!("Usage: tiabus <rom> [state-file]");
            process::exit(2);
        }
    };
    let state_path = args.next();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("{}", err);
            process::exit(2);
        }
    };

    let cartridge = match CartridgeVariant::from_file(&rom_path) {
        Ok(cartridge) => cartridge,
        Err(err) => {
            log::error!("Could not load {}: {}", rom_path, err);
            process::exit(1);
        }
    };

    let ok = match cartridge {
        CartridgeVariant::Rom4K(c) => run(c, &settings, state_path.as_deref()),
        CartridgeVariant::Bank3E(c) => run(c, &settings, state_path.as_deref()),
    };

    if !ok {
        process::exit(1);
    }
}

fn run<C: Cartridge>(cartridge: C, settings: &Settings, state_path: Option<&str>) -> bool {
    let mut console = Console::new(cartridge, settings);
    console.reset();

    println!("{}", describe_cartridge(console.cartridge()));
    print!("{}", describe_page_table(console.board().page_table()));

    let path = match state_path {
        Some(path) => path,
        None => return true,
    };

    let mut state = Serializer::new();
    if !console.save(&mut state) {
        return false;
    }

    match state.write_to_file(path) {
        Ok(()) => {
            log::info!("Wrote {} byte state to {}", state.as_bytes().len(), path);
            true
        }
        Err(err) => {
            log::error!("Could not write state to {}: {}", path, err);
            false
        }
    }
}
