use color_eyre::eyre::Result;

use ls8::memory::StdMem;
use ls8::processor::{Console, Processor};
use ls8::program;
use log::LevelFilter;
use simple_logger::SimpleLogger;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .unwrap(); // logging

    let mut memory = StdMem::default();
    let mut cpu = Processor::new();

    use ls8::processor::Instruction::*;
    memory.load(&program![
        LDI, 0, 8,
        LDI, 1, 9,
        MUL, 0, 1,
        PRN, 0,
        HLT
    ])?;

    cpu.run(&mut memory, &mut Console)?;

    Ok(())
}
