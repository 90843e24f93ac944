use color_eyre::eyre::Result;

use ls8::memory::StdMem;
use ls8::processor::{Console, Processor};
use ls8::program;
use simple_logger::SimpleLogger;

/// Doubles R0 in a subroutine, then prints it.
fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new().init().unwrap(); // logging

    let mut memory = StdMem::default();
    let mut cpu = Processor::new();

    use ls8::processor::Instruction::*;
    memory.load(&program![
        LDI, 0, 5,    //  0
        LDI, 1, 11,   //  3: subroutine address
        CALL, 1,      //  6
        PRN, 0,       //  8
        HLT,          // 10
        ADD, 0, 0,    // 11: the subroutine
        RET           // 14
    ])?;

    cpu.run(&mut memory, &mut Console)?;

    Ok(())
}
