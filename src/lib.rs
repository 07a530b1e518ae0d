//! Intcode VM
//!
//! A small virtual machine for programs made of signed integers, plus the
//! wiring to run several machines as an amplifier network.
//!
//! # Architecture
//!
//! - **Memory**: the program itself, mutable and fixed in size
//! - **Opcodes**: nine operations; the low two digits of an instruction word
//!   select the operation, the remaining digits give per-parameter addressing
//!   modes
//! - **Machine**: fetch-decode-execute loop over its own memory, reading from
//!   an input [`Stream`] and appending to an output queue
//! - **Network**: machines addressed by index; a machine blocked on input pulls
//!   from its producer, and so on up the chain, which lets a ring of machines
//!   run without threads
//!
//! # Example Usage
//!
//! ```
//! use intcode::{Machine, Program, Topology, best_phase_setting};
//!
//! let program: Program = "3,0,4,0,99".parse().unwrap();
//! let mut machine = Machine::new(&program).with_input(vec![42]);
//! machine.run_to_terminal().unwrap();
//! assert_eq!(machine.outputs(), &[42]);
//!
//! let amplifier = Program::new(vec![3, 15, 3, 16, 1002, 16, 10, 16, 1, 16, 15, 15, 4, 15, 99, 0, 0]);
//! let (phases, signal) = best_phase_setting(&amplifier, &[0, 1, 2, 3, 4], Topology::Chain).unwrap();
//! assert_eq!(signal, 43210);
//! assert_eq!(phases, vec![4, 3, 2, 1, 0]);
//! ```

// Core modules
pub mod error;
pub mod machine;
pub mod memory;
pub mod network;
pub mod opcodes;
pub mod program;
pub mod stream;

#[cfg(feature = "python")]
pub mod python_bindings;


// Re-export main types for convenience
pub use error::{Error, Result};
pub use machine::{Machine, Outputs, Step};
pub use memory::Memory;
pub use network::{
    Network, Permutations, Topology, best_phase_setting, permutations, run_amplifiers,
};
pub use opcodes::{Instruction, Mode, Opcode, Param};
pub use program::Program;
pub use stream::{Pull, Source, Stream};

/// A memory cell, operand or I/O value
pub type Word = i64;

/// Index of a machine within a [`Network`]
pub type MachineId = usize;

/// Current serialized program format version
pub const PROGRAM_FORMAT_VERSION: u32 = 1;
