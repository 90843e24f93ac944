use std::convert::TryFrom;
use std::fmt;
use std::fmt::Write as _;

use crate::fault::{Fault, FaultKind, Result};
use crate::memory::{Byte, Memory, Word};
use log::*;
use num_enum::IntoPrimitive;
use num_enum::TryFromPrimitive;

/// Number of general-purpose registers.
pub const NUM_REGISTERS: usize = 8;

/// Index of the register reserved as the stack pointer.
pub const SP: usize = 7;

/// Address the stack pointer holds on an empty stack. The stack grows
/// downward from here; popping at or above this address underflows.
pub const STACK_TOP: Byte = 0xF4;

/// Collaborator receiving the values printed by `PRN`.
pub trait Output {
    /// Called once per `PRN`, in program order.
    fn print(&mut self, value: Byte);
}

/// Collects printed values instead of writing them anywhere.
impl Output for Vec<Byte> {
    fn print(&mut self, value: Byte) {
        self.push(value);
    }
}

/// Prints each value as a decimal on its own line on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Console;

impl Output for Console {
    fn print(&mut self, value: Byte) {
        println!("{}", value);
    }
}

/// Condition flags, set only by `CMP` and read by the conditional jumps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags {
    /// Equal
    pub e: bool,
    /// Less-than
    pub l: bool,
    /// Greater-than
    pub g: bool,
}

/// Execution state of the machine. `Halted` and `Faulted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Running,
    Halted,
    Faulted,
}

/// Emulates a CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Processor {
    /// Program counter
    pub pc: Word,
    /// General-purpose registers. `reg[SP]` is the stack pointer.
    pub reg: [Byte; NUM_REGISTERS],
    /// Condition flags
    pub fl: Flags,
    /// Execution state
    pub state: State,
}

impl Default for Processor {
    /// Initializes a new CPU
    fn default() -> Self {
        Self::new()
    }
}

impl Processor {
    /// Initializes a new CPU with the stack pointer at [`STACK_TOP`].
    pub fn new() -> Self {
        let mut reg = [0; NUM_REGISTERS];
        reg[SP] = STACK_TOP;

        Self {
            pc: 0,
            reg,
            fl: Flags::default(),
            state: State::Running,
        }
    }

    fn reg_index(r: Byte) -> Result<usize, FaultKind> {
        if (r as usize) < NUM_REGISTERS {
            Ok(r as usize)
        } else {
            Err(FaultKind::RegisterIndexOutOfRange { index: r })
        }
    }

    /// Reads a general-purpose register.
    pub fn reg_read(&self, r: Byte) -> Result<Byte, FaultKind> {
        Ok(self.reg[Self::reg_index(r)?])
    }

    /// Writes a general-purpose register.
    pub fn reg_write(&mut self, r: Byte, value: Byte) -> Result<(), FaultKind> {
        self.reg[Self::reg_index(r)?] = value;
        Ok(())
    }

    /// Performs an ALU operation on the two registers selected by index.
    ///
    /// `ADD` and `MUL` write the result, wrapped modulo 256, back into
    /// `reg_a`. `CMP` mutates no register and only sets the flags. The ALU
    /// never touches PC.
    pub fn alu(&mut self, op: Instruction, reg_a: Byte, reg_b: Byte) -> Result<(), FaultKind> {
        let a = self.reg_read(reg_a)?;
        let b = self.reg_read(reg_b)?;

        match op {
            Instruction::ADD => {
                let result = a.wrapping_add(b);
                self.reg_write(reg_a, result)?;

                debug!("ADD {} {}: {}", a, b, result);
            }
            Instruction::MUL => {
                let result = a.wrapping_mul(b);
                self.reg_write(reg_a, result)?;

                debug!("MUL {} {}: {}", a, b, result);
            }
            Instruction::CMP => {
                self.fl = Flags {
                    e: a == b,
                    l: a < b,
                    g: a > b,
                };

                debug!("CMP {} {}: {:?}", a, b, self.fl);
            }
            _ => return Err(FaultKind::UnsupportedAluOperation { opcode: op.into() }),
        }

        Ok(())
    }

    /// Pushes a byte onto the stack. SP moves down by one before the write;
    /// neither is committed if the other cannot happen.
    fn push_byte<const S: usize>(
        &mut self,
        memory: &mut Memory<S>,
        value: Byte,
    ) -> Result<(), FaultKind> {
        let sp = self.reg[SP];
        if sp == 0 {
            return Err(FaultKind::StackOverflow);
        }

        memory.write_byte((sp - 1) as Word, value)?;
        self.reg[SP] = sp - 1;
        Ok(())
    }

    /// Pops a byte off the stack. Popping with SP at or above [`STACK_TOP`]
    /// is an underflow.
    fn pop_byte<const S: usize>(&mut self, memory: &mut Memory<S>) -> Result<Byte, FaultKind> {
        let sp = self.reg[SP];
        if sp >= STACK_TOP {
            return Err(FaultKind::StackUnderflow);
        }

        let value = memory.read_byte(sp as Word)?;
        self.reg[SP] = sp + 1;
        Ok(value)
    }

    /// Executes a single, already decoded instruction.
    ///
    /// Every arm performs exactly one PC mutation: the default advance of
    /// `1 + operand count` for straight-line instructions, or one explicit
    /// assignment for the control-transfer instructions.
    pub fn execute_instruction<const S: usize, O: Output>(
        &mut self,
        instruction: Instruction,
        memory: &mut Memory<S>,
        output: &mut O,
    ) -> Result<(), FaultKind> {
        match instruction {
            Instruction::HLT => {
                self.state = State::Halted;
                self.pc += instruction.size();

                debug!("HLT");
            }
            Instruction::LDI => {
                let r = memory.read_byte(self.pc + 1)?;
                let value = memory.read_byte(self.pc + 2)?;
                self.reg_write(r, value)?;
                self.pc += instruction.size();

                debug!("LDI R{} {}", r, value);
            }
            Instruction::PRN => {
                let r = memory.read_byte(self.pc + 1)?;
                let value = self.reg_read(r)?;
                output.print(value);
                self.pc += instruction.size();

                debug!("PRN R{}: {}", r, value);
            }
            Instruction::ADD | Instruction::MUL | Instruction::CMP => {
                let reg_a = memory.read_byte(self.pc + 1)?;
                let reg_b = memory.read_byte(self.pc + 2)?;
                self.alu(instruction, reg_a, reg_b)?;
                self.pc += instruction.size();
            }
            Instruction::PUSH => {
                let r = memory.read_byte(self.pc + 1)?;
                let value = self.reg_read(r)?;
                self.push_byte(memory, value)?;
                self.pc += instruction.size();

                debug!("PUSH R{}: {}", r, value);
            }
            Instruction::POP => {
                let r = memory.read_byte(self.pc + 1)?;
                // Validate the register before the stack moves, so a bad
                // operand rejects the instruction with no effects applied.
                let index = Self::reg_index(r)?;
                let value = self.pop_byte(memory)?;
                self.reg[index] = value;
                self.pc += instruction.size();

                debug!("POP R{}: {}", r, value);
            }
            Instruction::CALL => {
                let r = memory.read_byte(self.pc + 1)?;
                let target = self.reg_read(r)?;
                // The return address is PC plus the fixed encoded length of
                // CALL, known a priori from the opcode table.
                let ret = self.pc + instruction.size();
                if ret as usize >= S {
                    return Err(FaultKind::MemoryAddressOutOfRange { address: ret });
                }
                self.push_byte(memory, ret as Byte)?;
                self.pc = target as Word;

                debug!("CALL R{} -> 0x{:02X} (ret 0x{:02X})", r, target, ret);
            }
            Instruction::RET => {
                self.pc = self.pop_byte(memory)? as Word;

                debug!("RET -> 0x{:02X}", self.pc);
            }
            Instruction::JMP => {
                let r = memory.read_byte(self.pc + 1)?;
                self.pc = self.reg_read(r)? as Word;

                debug!("JMP 0x{:02X}", self.pc);
            }
            Instruction::JEQ => {
                let r = memory.read_byte(self.pc + 1)?;
                let target = self.reg_read(r)?;
                if self.fl.e {
                    self.pc = target as Word;
                } else {
                    self.pc += instruction.size();
                }

                debug!("JEQ R{} (e={})", r, self.fl.e);
            }
            Instruction::JNE => {
                let r = memory.read_byte(self.pc + 1)?;
                let target = self.reg_read(r)?;
                if !self.fl.e {
                    self.pc = target as Word;
                } else {
                    self.pc += instruction.size();
                }

                debug!("JNE R{} (e={})", r, self.fl.e);
            }
        }

        Ok(())
    }

    /// Runs one fetch-decode-execute step.
    ///
    /// Terminal states are sticky: on a halted or faulted machine this is a
    /// no-op, so callers keep a live machine to inspect post-mortem.
    pub fn execute<const S: usize, O: Output>(
        &mut self,
        memory: &mut Memory<S>,
        output: &mut O,
    ) -> Result<()> {
        if self.state != State::Running {
            return Ok(());
        }

        trace!("{}", self.trace(memory));

        let pc = self.pc;
        let ir = match memory.read_byte(pc) {
            Ok(byte) => byte,
            Err(kind) => return Err(self.fault(kind, pc, 0)),
        };
        let instruction = match Instruction::try_from(ir) {
            Ok(instruction) => instruction,
            Err(_) => return Err(self.fault(FaultKind::UnrecognizedOpcode, pc, ir)),
        };

        self.execute_instruction(instruction, memory, output)
            .map_err(|kind| self.fault(kind, pc, ir))
    }

    /// Runs the dispatch loop until the machine halts or faults.
    pub fn run<const S: usize, O: Output>(
        &mut self,
        memory: &mut Memory<S>,
        output: &mut O,
    ) -> Result<()> {
        self.run_with_budget(memory, output, None)
    }

    /// Runs the dispatch loop, faulting once `budget` steps have executed
    /// without the machine leaving the `Running` state. Callers testing
    /// programs that may never halt pass a budget instead of looping forever.
    pub fn run_with_budget<const S: usize, O: Output>(
        &mut self,
        memory: &mut Memory<S>,
        output: &mut O,
        budget: Option<u64>,
    ) -> Result<()> {
        let mut steps: u64 = 0;

        while self.state == State::Running {
            if let Some(limit) = budget {
                if steps >= limit {
                    let pc = self.pc;
                    let ir = memory.read_byte(pc).unwrap_or(0);
                    return Err(self.fault(FaultKind::StepBudgetExceeded { budget: limit }, pc, ir));
                }
            }

            self.execute(memory, output)?;
            steps += 1;
        }

        Ok(())
    }

    /// Formats the machine state in one line. Handy when a program
    /// misbehaves; emitted at trace level on every dispatch step.
    pub fn trace<const S: usize>(&self, memory: &Memory<S>) -> String {
        let mut line = format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            self.pc,
            memory.read_byte(self.pc).unwrap_or(0),
            memory.read_byte(self.pc + 1).unwrap_or(0),
            memory.read_byte(self.pc + 2).unwrap_or(0),
        );

        for value in &self.reg {
            let _ = write!(line, " {:02X}", value);
        }

        line
    }

    /// Transitions into the terminal `Faulted` state.
    fn fault(&mut self, kind: FaultKind, pc: Word, ir: Byte) -> Fault {
        self.state = State::Faulted;
        let fault = Fault::new(kind, pc, ir);
        error!("{}", fault);
        fault
    }
}

macro_rules! instructions {
    ( $( $( #[doc = $doc:expr] )+ $name:ident ( $operands:literal ) = $repr:literal , )+ ) => {
        /// Defines the instructions
        /// Operands are register indices, except the immediate of `LDI`
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(TryFromPrimitive, IntoPrimitive)]
        pub enum Instruction {
            $(
                $( #[doc = $doc] )+
                $name = $repr,
            )+
        }

        impl Instruction {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];

            /// Number of operand bytes following the opcode.
            pub const fn operands(self) -> Word {
                match self {
                    $( Self::$name => $operands , )+
                }
            }

            /// Encoded length of the instruction, opcode byte included.
            pub const fn size(self) -> Word {
                1 + self.operands()
            }
        }

        impl fmt::Display for Instruction {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $( Self::$name => f.write_str(stringify!($name)) , )+
                }
            }
        }
    }
}

instructions! {
    /// Halt the CPU and hand control back to the caller
    HLT (0) = 0b0000_0001,
    /// Pop the return address pushed by the matching CALL into PC
    RET (0) = 0b0001_0001,
    /// Push the value of a register onto the stack
    /// @param register The register to read
    PUSH (1) = 0b0100_0101,
    /// Pop the top of the stack into a register
    /// @param register The register to write
    POP (1) = 0b0100_0110,
    /// Print the decimal value of a register
    /// @param register The register to print
    PRN (1) = 0b0100_0111,
    /// Push the address of the next instruction and jump to the address
    /// held in a register
    CALL (1) = 0b0101_0000,
    /// Jump to the address held in a register
    JMP (1) = 0b0101_0100,
    /// Jump like JMP if the Equal flag is set, fall through otherwise
    JEQ (1) = 0b0101_0101,
    /// Jump like JMP if the Equal flag is clear, fall through otherwise
    JNE (1) = 0b0101_0110,
    /// Set a register to an immediate value
    /// @param register The register to write
    /// @param value The immediate value
    LDI (2) = 0b1000_0010,
    /// Add two registers, storing the wrapped sum in the first
    ADD (2) = 0b1010_0000,
    /// Multiply two registers, storing the wrapped product in the first
    MUL (2) = 0b1010_0010,
    /// Compare two registers and set the E/L/G flags
    CMP (2) = 0b1010_0111,
}
