use std::env;
use std::fs;
use std::process::exit;

use color_eyre::eyre::Result;
use log::LevelFilter;
use simple_logger::SimpleLogger;

use ls8::memory::parse::parse_program;
use ls8::memory::StdMem;
use ls8::processor::{Console, Processor};

// One distinct exit status per failure cause.
const EXIT_USAGE: i32 = 0;
const EXIT_BAD_LITERAL: i32 = 1;
const EXIT_FAULT: i32 = 2;
const EXIT_UNREADABLE: i32 = 3;
const EXIT_EMPTY: i32 = 4;
const EXIT_TOO_LARGE: i32 = 5;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new()
        .with_level(LevelFilter::Warn)
        .init()
        .unwrap(); // logging

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        println!("Usage: ls8 <program.ls8>");
        exit(EXIT_USAGE);
    }

    let source = match fs::read_to_string(&args[1]) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("couldn't open `{}`: {}", args[1], err);
            exit(EXIT_UNREADABLE);
        }
    };

    let image = match parse_program(&source) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("{}", err);
            exit(EXIT_BAD_LITERAL);
        }
    };

    if image.is_empty() {
        eprintln!("program was empty");
        exit(EXIT_EMPTY);
    }

    let mut memory = StdMem::default();
    if let Err(kind) = memory.load(&image) {
        eprintln!("{}", kind);
        exit(EXIT_TOO_LARGE);
    }

    let mut cpu = Processor::new();
    if let Err(fault) = cpu.run(&mut memory, &mut Console) {
        eprintln!("{}", fault);
        exit(EXIT_FAULT);
    }

    Ok(())
}
