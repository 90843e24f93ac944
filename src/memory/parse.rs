//! Text program images: one binary byte literal per line.
//!
//! ```text
//! # mult.ls8
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! ```
//!
//! `#` starts a comment running to the end of the line; blank and
//! comment-only lines are skipped.

use std::error;
use std::fmt;
use std::fs;
use std::path::Path;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};

use super::{Byte, Memory};

/// A line of a program listing that does not parse as a byte literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    line_nr: usize,
    literal: String,
}

impl ParseError {
    fn new(line_nr: usize, literal: &str) -> Self {
        Self {
            line_nr,
            literal: literal.to_owned(),
        }
    }

    /// 1-based line number of the offending line.
    pub fn line_nr(&self) -> usize {
        self.line_nr
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error [ln: {}]: invalid binary literal `{}`",
            self.line_nr, self.literal
        )
    }
}

impl error::Error for ParseError {}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;

/// Parses a program listing into the raw bytes of its image.
///
/// Each line carries one byte, written in binary. The literal must fit in
/// 8 bits; anything on a line after a `#` is ignored.
pub fn parse_program(source: &str) -> Result<Vec<Byte>> {
    let mut image = Vec::new();

    for (nr, line) in source.lines().enumerate() {
        let literal = line.split('#').next().unwrap_or("").trim();

        if literal.is_empty() {
            // Comment or empty line; skip
            continue;
        }

        match Byte::from_str_radix(literal, 2) {
            Ok(byte) => image.push(byte),
            Err(_) => return Err(ParseError::new(nr + 1, literal)),
        }
    }

    Ok(image)
}

impl<const S: usize> Memory<S> {
    /// Parses a program listing and loads it at address 0 of a fresh memory.
    pub fn from_source(source: &str) -> EyreResult<Self> {
        let image = parse_program(source).wrap_err("failed to parse program")?;

        let mut memory = Self::default();
        memory
            .load(&image)
            .map_err(|kind| eyre!(kind))
            .wrap_err("failed to load program")?;

        Ok(memory)
    }

    /// Reads a program listing from a file and loads it at address 0 of a
    /// fresh memory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> EyreResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .wrap_err_with(|| format!("couldn't open `{}`", path.display()))?;

        Self::from_source(&source)
    }
}

#[cfg(test)]
mod tests {
    use crate::memory::StdMem;
    use crate::processor::Instruction;

    use super::*;
    use color_eyre::eyre::Result;

    #[test]
    fn test_parse_print8() -> Result<()> {
        let source = r#"
            # print8.ls8: store 8 in R0 and print it
            10000010 # LDI R0,8
            00000000
            00001000
            01000111 # PRN R0
            00000000
            00000001 # HLT
        "#;

        let image = parse_program(source)?;

        assert_eq!(
            image,
            vec![
                Instruction::LDI as Byte,
                0,
                8,
                Instruction::PRN as Byte,
                0,
                Instruction::HLT as Byte,
            ]
        );

        Ok(())
    }

    #[test]
    fn test_comment_only_and_blank_lines_are_skipped() -> Result<()> {
        let source = "# just a comment\n\n   \n#another\n";
        assert_eq!(parse_program(source)?, Vec::<Byte>::new());

        Ok(())
    }

    #[test]
    fn test_invalid_literal_reports_line_number() {
        let source = "10000010\n00000000\nnot-a-byte\n";
        let err = parse_program(source).unwrap_err();

        assert_eq!(err.line_nr(), 3);
        assert_eq!(
            err.to_string(),
            "error [ln: 3]: invalid binary literal `not-a-byte`"
        );
    }

    #[test]
    fn test_literal_wider_than_a_byte_is_rejected() {
        let err = parse_program("100000100\n").unwrap_err();
        assert_eq!(err.line_nr(), 1);
    }

    #[test]
    fn test_from_source_runs_end_to_end() -> Result<()> {
        use crate::processor::{Processor, State};

        let source = "10000010\n00000000\n00001000\n01000111\n00000000\n00000001\n";
        let mut memory = StdMem::from_source(source)?;

        let mut cpu = Processor::new();
        let mut printed = Vec::new();
        cpu.run(&mut memory, &mut printed)?;

        assert_eq!(printed, vec![8]);
        assert_eq!(cpu.state, State::Halted);

        Ok(())
    }
}
