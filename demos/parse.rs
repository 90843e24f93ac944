use color_eyre::eyre::Result;

use ls8::memory::StdMem;
use ls8::processor::{Console, Processor};
use simple_logger::SimpleLogger;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new().init().unwrap(); // logging

    let mut memory = StdMem::from_file("demos/programs/mult.ls8")?;
    let mut cpu = Processor::new();

    cpu.run(&mut memory, &mut Console)?;

    Ok(())
}
