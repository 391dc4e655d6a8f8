use arrh::Arrh;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::{env, process};

fn main() {
    if let Err(err) = SimpleLogger::new().with_level(LevelFilter::Warn).env().init() {
        eprintln!("Failed to initialise logging: {}", err);
    }
    let mut args = env::args().skip(1);
    let path = match args.next() {
        Some(path) => path,
        None => {
            eprintln!("Usage: arrh <file> [args...]");
            process::exit(2);
        }
    };
    let args: Vec<String> = args.collect();
    match Arrh::new().exec_file(&path, &args) {
        Ok(execution) => println!("{}", execution.output),
        Err(err) => {
            eprintln!("Arrh interpretation terminated with fault: {}", err);
            process::exit(1);
        }
    }
}
