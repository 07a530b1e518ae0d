//! Error types for the intcode machine and amplifier network

use thiserror::Error;

use crate::opcodes::Opcode;
use crate::{MachineId, Word};

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure a program, machine or network can raise.
///
/// None of these are recoverable at the point they occur; they surface to
/// whoever is driving the machine with enough context to locate the fault.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid opcode {opcode} at ip {ip}")]
    InvalidOpcode { opcode: Word, ip: usize },

    #[error("invalid addressing mode {mode} at ip {ip}")]
    InvalidMode { mode: Word, ip: usize },

    #[error("immediate mode used for write parameter {position} at ip {ip}")]
    ImmediateWrite { ip: usize, position: usize },

    #[error("{opcode:?} expects {expected} arguments, got {found}")]
    ArityMismatch {
        opcode: Opcode,
        expected: usize,
        found: usize,
    },

    #[error("address {address} out of bounds for memory of length {len}")]
    OutOfBounds { address: Word, len: usize },

    #[error("input exhausted at ip {ip}")]
    InputExhausted { ip: usize },

    #[error("input is wired to machine {machine}, which is not reachable from a standalone machine")]
    DetachedSource { machine: MachineId },

    #[error("machine {machine} is waiting on its own output")]
    Deadlock { machine: MachineId },

    #[error("machine {machine} halted without producing output")]
    NoOutput { machine: MachineId },

    #[error("no phase settings given")]
    NoPhases,

    #[error("phase setting {0} appears more than once")]
    DuplicatePhase(Word),

    #[error("no machine with id {0}")]
    UnknownMachine(MachineId),

    #[error("program is empty")]
    EmptyProgram,

    #[error("invalid integer {token:?} at position {position}")]
    Parse { position: usize, token: String },

    #[error("failed to decode program: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("unsupported program format version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
}
