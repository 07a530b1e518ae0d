use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::memory::Memory;
use crate::opcodes::{Instruction, Opcode};
use crate::program::Program;
use crate::stream::{Pull, Stream};
use crate::{MachineId, Word};

/// Outcome of a single fetch-decode-execute cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// An instruction ran and the machine can keep going
    Continue,
    /// The machine is halted
    Halted,
    /// An Input instruction needs a value that machine `0` has to produce.
    /// Nothing was changed; the same instruction runs again once the value
    /// is available on the input stream.
    Blocked(MachineId),
}

/// Intcode execution engine
///
/// A machine owns its memory and output queue and consumes its own input
/// stream. It runs until it executes Terminate; once halted it stays halted.
#[derive(Debug, Clone)]
pub struct Machine {
    memory: Memory,

    /// Address of the next instruction word
    ip: usize,

    /// Values written by Output and not yet consumed
    outputs: VecDeque<Word>,

    halted: bool,

    input: Stream,
}

impl Machine {
    /// Create a machine running a fresh copy of `program`
    pub fn new(program: &Program) -> Self {
        Machine::from_words(program.words().to_vec())
    }

    pub fn from_words(words: Vec<Word>) -> Self {
        Machine {
            memory: Memory::new(words),
            ip: 0,
            outputs: VecDeque::new(),
            halted: false,
            input: Stream::empty(),
        }
    }

    /// Builder-style [`Machine::set_input_stream`]
    pub fn with_input(mut self, input: impl Into<Stream>) -> Self {
        self.input = input.into();
        self
    }

    pub fn set_input_stream(&mut self, input: Stream) {
        self.input = input;
    }

    pub fn input_mut(&mut self) -> &mut Stream {
        &mut self.input
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn outputs(&self) -> &VecDeque<Word> {
        &self.outputs
    }

    pub fn outputs_mut(&mut self) -> &mut VecDeque<Word> {
        &mut self.outputs
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Execute one instruction, returning whether the machine is now halted.
    ///
    /// Fails with [`Error::DetachedSource`] if the input stream defers to
    /// another machine; machines wired together are driven through a
    /// [`crate::Network`] instead.
    pub fn step(&mut self) -> Result<bool> {
        match self.try_step()? {
            Step::Continue => Ok(false),
            Step::Halted => Ok(true),
            Step::Blocked(machine) => Err(Error::DetachedSource { machine }),
        }
    }

    /// Execute one instruction.
    ///
    /// State is only committed once the instruction has fully succeeded, so an
    /// error or [`Step::Blocked`] leaves the machine exactly as it was.
    pub fn try_step(&mut self) -> Result<Step> {
        if self.halted {
            return Ok(Step::Halted);
        }

        let instruction = Instruction::decode(&self.memory, self.ip)?;
        let operands = instruction.resolve(&self.memory)?;
        let opcode = instruction.opcode;
        let mut next_ip = instruction.next_ip();

        trace!(ip = self.ip, ?opcode, args = ?operands.as_slice(), "step");

        match (opcode, operands.as_slice()) {
            (Opcode::Add, &[a, b, target]) => {
                self.memory.set(target, a.wrapping_add(b))?;
            }
            (Opcode::Multiply, &[a, b, target]) => {
                self.memory.set(target, a.wrapping_mul(b))?;
            }
            (Opcode::Input, &[target]) => {
                let value = match self.input.next() {
                    Pull::Value(value) => value,
                    Pull::End => return Err(Error::InputExhausted { ip: self.ip }),
                    Pull::Upstream(source) => return Ok(Step::Blocked(source)),
                };
                if let Err(err) = self.memory.set(target, value) {
                    self.input.push_front(value);
                    return Err(err);
                }
            }
            (Opcode::Output, &[value]) => {
                debug!(ip = self.ip, value, "output");
                self.outputs.push_back(value);
            }
            (Opcode::JumpIfTrue, &[condition, to]) => {
                if condition != 0 {
                    next_ip = self.jump_target(to)?;
                }
            }
            (Opcode::JumpIfFalse, &[condition, to]) => {
                if condition == 0 {
                    next_ip = self.jump_target(to)?;
                }
            }
            (Opcode::LessThan, &[a, b, target]) => {
                self.memory.set(target, Word::from(a < b))?;
            }
            (Opcode::Equals, &[a, b, target]) => {
                self.memory.set(target, Word::from(a == b))?;
            }
            (Opcode::Terminate, &[]) => {
                debug!(ip = self.ip, "halted");
                self.ip = next_ip;
                self.halted = true;
                return Ok(Step::Halted);
            }
            (opcode, operands) => {
                return Err(Error::ArityMismatch {
                    opcode,
                    expected: opcode.arity(),
                    found: operands.len(),
                });
            }
        }

        self.ip = next_ip;
        Ok(Step::Continue)
    }

    /// Step until Terminate has executed
    pub fn run_to_terminal(&mut self) -> Result<()> {
        while !self.step()? {}
        Ok(())
    }

    /// Step until there is something in the output queue or the machine halts
    pub fn run_to_next_output(&mut self) -> Result<()> {
        while !self.halted && self.outputs.is_empty() {
            self.step()?;
        }
        Ok(())
    }

    /// Lazily drain this machine's output, running it as values are demanded
    pub fn output_stream(&mut self) -> Outputs<'_> {
        Outputs {
            machine: self,
            failed: false,
        }
    }

    fn jump_target(&self, to: Word) -> Result<usize> {
        usize::try_from(to).map_err(|_| Error::OutOfBounds {
            address: to,
            len: self.memory.len(),
        })
    }
}

/// Output stream of a standalone [`Machine`]
///
/// Each pull takes the oldest queued value, running the machine first if the
/// queue is empty. Ends once the machine has halted with nothing queued, or
/// after yielding the first error.
pub struct Outputs<'a> {
    machine: &'a mut Machine,
    failed: bool,
}

impl Iterator for Outputs<'_> {
    type Item = Result<Word>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        if let Err(err) = self.machine.run_to_next_output() {
            self.failed = true;
            return Some(Err(err));
        }

        self.machine.outputs.pop_front().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(words: Vec<Word>, input: Vec<Word>) -> Machine {
        let mut machine = Machine::from_words(words).with_input(input);
        machine.run_to_terminal().unwrap();
        machine
    }

    #[test]
    fn test_add_and_multiply() {
        let machine = run(vec![1, 9, 10, 3, 2, 3, 11, 0, 99, 30, 40, 50], vec![]);
        assert_eq!(
            machine.memory().as_slice(),
            &[3500, 9, 10, 70, 2, 3, 11, 0, 99, 30, 40, 50]
        );
    }

    #[test]
    fn test_small_programs() {
        let cases: Vec<(Vec<Word>, Vec<Word>)> = vec![
            (vec![1, 0, 0, 0, 99], vec![2, 0, 0, 0, 99]),
            (vec![2, 3, 0, 3, 99], vec![2, 3, 0, 6, 99]),
            (vec![1, 1, 1, 4, 99, 5, 6, 0, 99], vec![30, 1, 1, 4, 2, 5, 6, 0, 99]),
        ];

        for (program, expected) in cases {
            assert_eq!(run(program, vec![]).memory().as_slice(), expected.as_slice());
        }
    }

    #[test]
    fn test_immediate_mode_and_negatives() {
        let machine = run(vec![1101, 100, -1, 4, 0], vec![]);
        assert_eq!(machine.memory().as_slice(), &[1101, 100, -1, 4, 99]);
    }

    #[test]
    fn test_echo_input() {
        let machine = run(vec![3, 0, 4, 0, 99], vec![-37]);
        assert_eq!(machine.outputs(), &[-37]);
        assert!(machine.is_halted());
    }

    #[test]
    fn test_jumps() {
        // Outputs 0 if the input was 0, otherwise 1
        let position = vec![3, 12, 6, 12, 15, 1, 13, 14, 13, 4, 13, 99, -1, 0, 1, 9];
        let immediate = vec![3, 3, 1105, -1, 9, 1101, 0, 0, 12, 4, 12, 99, 1];

        for program in [position, immediate] {
            assert_eq!(run(program.clone(), vec![0]).outputs(), &[0]);
            assert_eq!(run(program, vec![5]).outputs(), &[1]);
        }
    }

    #[test]
    fn test_step_is_idempotent_once_halted() {
        let mut machine = Machine::from_words(vec![99]);
        assert!(machine.step().unwrap());
        let ip = machine.ip();

        for _ in 0..3 {
            assert!(machine.step().unwrap());
            assert_eq!(machine.ip(), ip);
        }
        assert_eq!(machine.try_step().unwrap(), Step::Halted);
    }

    #[test]
    fn test_input_exhausted() {
        let mut machine = Machine::from_words(vec![3, 0, 3, 0, 99]).with_input(vec![1]);
        assert_eq!(machine.run_to_terminal(), Err(Error::InputExhausted { ip: 2 }));
        // Nothing was stored for the failed read
        assert_eq!(machine.memory().as_slice(), &[1, 0, 3, 0, 99]);
        assert_eq!(machine.ip(), 2);
    }

    #[test]
    fn test_detached_source() {
        let mut machine = Machine::from_words(vec![3, 0, 99]);
        machine.set_input_stream(Stream::output_of(4));
        assert_eq!(machine.step(), Err(Error::DetachedSource { machine: 4 }));
        assert_eq!(machine.try_step(), Ok(Step::Blocked(4)));
        assert_eq!(machine.ip(), 0);
    }

    #[test]
    fn test_errors_surface() {
        let mut machine = Machine::from_words(vec![1, 0, 0, 7, 99]);
        assert_eq!(
            machine.run_to_terminal(),
            Err(Error::OutOfBounds { address: 7, len: 5 })
        );

        let mut machine = Machine::from_words(vec![11101, 1, 1, 0, 99]);
        assert_eq!(
            machine.run_to_terminal(),
            Err(Error::ImmediateWrite { ip: 0, position: 2 })
        );

        let mut machine = Machine::from_words(vec![1105, 1, -3]);
        assert_eq!(
            machine.run_to_terminal(),
            Err(Error::OutOfBounds { address: -3, len: 3 })
        );

        // Running off the end of memory
        let mut machine = Machine::from_words(vec![1101, 1, 1, 0]);
        assert_eq!(
            machine.run_to_terminal(),
            Err(Error::OutOfBounds { address: 4, len: 4 })
        );
    }

    #[test]
    fn test_output_stream_runs_on_demand() {
        // Emits the input twice, doubled the second time
        let program = vec![3, 11, 4, 11, 1002, 11, 2, 11, 4, 11, 99, 0];
        let mut machine = Machine::from_words(program).with_input(vec![21]);

        let mut outputs = machine.output_stream();
        assert_eq!(outputs.next(), Some(Ok(21)));
        drop(outputs);
        // Only ran as far as the first output
        assert!(!machine.is_halted());
        assert_eq!(machine.ip(), 4);

        let rest: Result<Vec<Word>> = machine.output_stream().collect();
        assert_eq!(rest, Ok(vec![42]));
        assert!(machine.is_halted());
        assert_eq!(machine.output_stream().next(), None);
    }

    #[test]
    fn test_output_stream_stops_after_error() {
        let mut machine = Machine::from_words(vec![3, 0, 99]);
        let mut outputs = machine.output_stream();
        assert_eq!(outputs.next(), Some(Err(Error::InputExhausted { ip: 0 })));
        assert_eq!(outputs.next(), None);
    }
}
