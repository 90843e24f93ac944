use color_eyre::eyre::Result;

use ls8::memory::StdMem;
use ls8::processor::{Console, Processor};
use ls8::program;
use log::LevelFilter;
use simple_logger::SimpleLogger;

/// Counts down from 5 to 1, printing each value. There is no SUB, so the
/// decrement is an ADD of 255, wrapping modulo 256.
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
        LDI, 0, 5,    //  0: counter
        LDI, 1, 255,  //  3: decrement
        LDI, 2, 0,    //  6: comparand
        LDI, 4, 12,   //  9: loop head
        PRN, 0,       // 12
        ADD, 0, 1,    // 14
        CMP, 0, 2,    // 17
        JNE, 4,       // 20
        HLT           // 22
    ])?;

    cpu.run(&mut memory, &mut Console)?;

    Ok(())
}
