//! # LS-8 emulator.
//!
//! `ls8` emulates the LS-8, an 8-bit computer with 256 bytes of RAM and
//! eight general-purpose registers, the last of which serves as the stack
//! pointer. Usage starts with loading a program image into a
//! [`memory::StdMem`], then driving a [`processor::Processor`] until it
//! halts or faults.
//!
//! ```
//! use ls8::memory::StdMem;
//! use ls8::processor::{Instruction::*, Processor};
//! use ls8::program;
//!
//! let mut memory = StdMem::default();
//! memory.load(&program![LDI, 0, 8, PRN, 0, HLT]).unwrap();
//!
//! let mut cpu = Processor::new();
//! let mut printed = Vec::new();
//! cpu.run(&mut memory, &mut printed).unwrap();
//!
//! assert_eq!(printed, vec![8]);
//! ```

pub mod fault;
pub mod memory;
pub mod processor;
