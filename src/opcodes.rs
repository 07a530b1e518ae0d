//! Instruction set for the intcode machine
//!
//! An instruction is a single word: the two lowest decimal digits select the
//! operation, every digit above them is the addressing mode of one parameter,
//! least significant first. Parameters follow the instruction word directly.

use crate::Word;
use crate::error::{Error, Result};
use crate::memory::Memory;

/// Largest parameter count of any operation
pub const MAX_PARAMS: usize = 3;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// target = a + b
    Add = 1,
    /// target = a * b
    Multiply = 2,
    /// target = next value from the input stream
    Input = 3,
    /// push a onto the output queue
    Output = 4,
    /// ip = b if a != 0
    JumpIfTrue = 5,
    /// ip = b if a == 0
    JumpIfFalse = 6,
    /// target = (a < b) as 1/0
    LessThan = 7,
    /// target = (a == b) as 1/0
    Equals = 8,
    /// Halt the machine
    Terminate = 99,
}

/// Whether a parameter is read as a value or names an address to store into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Read,
    Write,
}

use Param::{Read, Write};

impl Opcode {
    /// Look up the operation selected by an instruction word
    pub fn from_word(word: Word) -> Option<Self> {
        match word % 100 {
            1 => Some(Opcode::Add),
            2 => Some(Opcode::Multiply),
            3 => Some(Opcode::Input),
            4 => Some(Opcode::Output),
            5 => Some(Opcode::JumpIfTrue),
            6 => Some(Opcode::JumpIfFalse),
            7 => Some(Opcode::LessThan),
            8 => Some(Opcode::Equals),
            99 => Some(Opcode::Terminate),
            _ => None,
        }
    }

    pub fn code(self) -> Word {
        self as u8 as Word
    }

    /// Parameter tags in order, one per argument word
    pub fn params(self) -> &'static [Param] {
        match self {
            Opcode::Add | Opcode::Multiply | Opcode::LessThan | Opcode::Equals => {
                &[Read, Read, Write]
            }
            Opcode::Input => &[Write],
            Opcode::Output => &[Read],
            Opcode::JumpIfTrue | Opcode::JumpIfFalse => &[Read, Read],
            Opcode::Terminate => &[],
        }
    }

    pub fn arity(self) -> usize {
        self.params().len()
    }
}

/// Addressing mode of a single parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// The argument is an address
    #[default]
    Position,
    /// The argument is the value itself
    Immediate,
}

impl Mode {
    /// The `n`-th mode digit (0-based, least significant first) of
    /// `mode_digits`. Digits past the encoded ones are always 0.
    pub fn digit(mode_digits: Word, n: usize) -> Word {
        let mut digits = mode_digits;
        for _ in 0..n {
            if digits == 0 {
                break;
            }
            digits /= 10;
        }
        digits % 10
    }

    pub fn from_digit(digit: Word) -> Option<Self> {
        match digit {
            0 => Some(Mode::Position),
            1 => Some(Mode::Immediate),
            _ => None,
        }
    }
}

/// A decoded instruction, valid only for the memory state it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    /// Address of the instruction word
    pub ip: usize,
    modes: [Mode; MAX_PARAMS],
    args: [Word; MAX_PARAMS],
}

impl Instruction {
    /// Decode the instruction at `ip`, reading exactly as many argument words
    /// as the operation takes.
    pub fn decode(memory: &Memory, ip: usize) -> Result<Self> {
        let word = memory.fetch(ip)?;
        let opcode = Opcode::from_word(word).ok_or(Error::InvalidOpcode {
            opcode: word % 100,
            ip,
        })?;

        let mode_digits = word / 100;
        let mut modes = [Mode::Position; MAX_PARAMS];
        let mut args = [0; MAX_PARAMS];

        for n in 0..opcode.arity() {
            let digit = Mode::digit(mode_digits, n);
            modes[n] = Mode::from_digit(digit).ok_or(Error::InvalidMode { mode: digit, ip })?;
            args[n] = memory.fetch(ip + 1 + n)?;
        }

        Ok(Instruction {
            opcode,
            ip,
            modes,
            args,
        })
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes[..self.opcode.arity()]
    }

    /// Raw argument words as stored after the instruction word
    pub fn args(&self) -> &[Word] {
        &self.args[..self.opcode.arity()]
    }

    /// Address of the instruction that follows this one
    pub fn next_ip(&self) -> usize {
        self.ip + 1 + self.opcode.arity()
    }

    /// Turn raw arguments into operands.
    ///
    /// Read parameters become values, write parameters stay addresses. Memory
    /// is only read here, never written.
    pub fn resolve(&self, memory: &Memory) -> Result<Operands> {
        let mut operands = Operands::default();

        for (position, param) in self.opcode.params().iter().enumerate() {
            let raw = self.args[position];
            let value = match (self.modes[position], param) {
                (Mode::Position, Read) => memory.read_at(raw)?,
                (Mode::Position, Write) => raw,
                (Mode::Immediate, Read) => raw,
                (Mode::Immediate, Write) => {
                    return Err(Error::ImmediateWrite {
                        ip: self.ip,
                        position,
                    });
                }
            };
            operands.push(value);
        }

        Ok(operands)
    }
}

/// Resolved operands of one instruction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Operands {
    words: [Word; MAX_PARAMS],
    len: usize,
}

impl Operands {
    fn push(&mut self, word: Word) {
        self.words[self.len] = word;
        self.len += 1;
    }

    pub fn as_slice(&self) -> &[Word] {
        &self.words[..self.len]
    }
}
