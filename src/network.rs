//! Amplifier networks: several machines wired output-to-input
//!
//! Machines are addressed by their index in the network. A machine whose input
//! stream is [`Stream::output_of`] another machine does not call into that
//! machine itself; it reports [`Step::Blocked`] and the network pulls the value
//! for it. A pull walks the chain of producers with an explicit work list of
//! waiting consumers, so a feedback ring runs with no scheduler and no threads,
//! and chain length is not limited by the call stack.

use std::collections::HashSet;

use tracing::{debug, info, trace};

use crate::error::{Error, Result};
use crate::machine::{Machine, Step};
use crate::program::Program;
use crate::stream::{Pull, Stream};
use crate::{MachineId, Word};

/// How the last amplifier's output is wired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    /// A path: the first amplifier reads its phase and a 0 signal, the last
    /// amplifier's output leaves the network
    #[default]
    Chain,
    /// A ring: the last amplifier's output feeds back into the first
    Feedback,
}

/// Machines addressed by index, wired together through their input streams
#[derive(Debug, Clone)]
pub struct Network {
    machines: Vec<Machine>,

    /// Machines currently suspended on an Input, waiting for an upstream pull
    /// to return
    waiting: Vec<bool>,
}

impl Network {
    /// Wire arbitrary machines together. Their input streams may refer to each
    /// other by index with [`Stream::output_of`].
    pub fn from_machines(machines: Vec<Machine>) -> Self {
        let waiting = vec![false; machines.len()];
        Network { machines, waiting }
    }

    /// Build an amplifier network: one copy of `program` per phase setting,
    /// each amplifier reading its phase and then the previous amplifier's
    /// output.
    pub fn amplifiers(program: &Program, phases: &[Word], topology: Topology) -> Result<Self> {
        check_phases(phases)?;

        let last = phases.len() - 1;
        let machines = phases
            .iter()
            .enumerate()
            .map(|(i, &phase)| {
                let tail = match (i, topology) {
                    (0, Topology::Chain) => Stream::from_values([0]),
                    (0, Topology::Feedback) => Stream::prefix(0, Stream::output_of(last)),
                    (i, _) => Stream::output_of(i - 1),
                };
                Machine::new(program).with_input(Stream::prefix(phase, tail))
            })
            .collect();

        Ok(Network::from_machines(machines))
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    pub fn machine(&self, id: MachineId) -> Result<&Machine> {
        self.machines.get(id).ok_or(Error::UnknownMachine(id))
    }

    pub fn machine_mut(&mut self, id: MachineId) -> Result<&mut Machine> {
        self.machines.get_mut(id).ok_or(Error::UnknownMachine(id))
    }

    /// Execute one instruction on machine `id`, first pulling any input it
    /// needs from upstream machines.
    pub fn step(&mut self, id: MachineId) -> Result<bool> {
        loop {
            match self.machine_mut(id)?.try_step()? {
                Step::Continue => return Ok(false),
                Step::Halted => return Ok(true),
                Step::Blocked(source) => self.feed(id, source)?,
            }
        }
    }

    pub fn run_to_terminal(&mut self, id: MachineId) -> Result<()> {
        while !self.step(id)? {}
        Ok(())
    }

    /// Step machine `id` until it has output queued or has halted, driving
    /// whichever producers it blocks on along the way.
    pub fn run_to_next_output(&mut self, id: MachineId) -> Result<()> {
        let mut consumers = Vec::new();
        let result = self.drive(id, &mut consumers);

        // Only non-empty after an error
        for consumer in consumers {
            self.waiting[consumer] = false;
        }
        result
    }

    /// Take the next value from machine `id`'s output, running it (and
    /// transitively its producers) as needed. `None` once it has halted with
    /// nothing queued.
    pub fn pull_output(&mut self, id: MachineId) -> Result<Option<Word>> {
        self.run_to_next_output(id)?;
        Ok(self.machines[id].outputs_mut().pop_front())
    }

    /// Pull the next value from a stream that may defer to machines in this
    /// network
    pub fn pull(&mut self, stream: &mut Stream) -> Result<Option<Word>> {
        match stream.next() {
            Pull::Value(value) => Ok(Some(value)),
            Pull::End => Ok(None),
            Pull::Upstream(id) => self.pull_output(id),
        }
    }

    /// Run the last machine to completion and report the first value left in
    /// its output queue.
    pub fn run(&mut self) -> Result<Word> {
        if self.is_empty() {
            return Err(Error::NoPhases);
        }
        let last = self.len() - 1;
        self.run_to_terminal(last)?;

        self.machines[last]
            .outputs()
            .front()
            .copied()
            .ok_or(Error::NoOutput { machine: last })
    }

    /// Work-list loop behind [`Network::run_to_next_output`]. `consumers`
    /// holds the machines blocked on the one currently running, innermost
    /// last; each is marked waiting until its value is delivered.
    fn drive(&mut self, id: MachineId, consumers: &mut Vec<MachineId>) -> Result<()> {
        let mut current = id;
        loop {
            let machine = self.machine(current)?;
            if machine.is_halted() || !machine.outputs().is_empty() {
                let Some(consumer) = consumers.pop() else {
                    return Ok(());
                };
                self.waiting[consumer] = false;
                self.deliver(current, consumer)?;
                current = consumer;
                continue;
            }

            // Running it would need the value this pull is supposed to deliver
            if self.waiting[current] {
                return Err(Error::Deadlock { machine: current });
            }

            if let Step::Blocked(source) = self.machines[current].try_step()? {
                trace!(machine = current, source, "pulling input");
                self.waiting[current] = true;
                consumers.push(current);
                current = source;
            }
        }
    }

    fn feed(&mut self, id: MachineId, source: MachineId) -> Result<()> {
        trace!(machine = id, source, "pulling input");

        self.waiting[id] = true;
        let pulled = self.run_to_next_output(source);
        self.waiting[id] = false;

        pulled?;
        self.deliver(source, id)
    }

    /// Move the oldest output of `source` to the front of `consumer`'s input
    fn deliver(&mut self, source: MachineId, consumer: MachineId) -> Result<()> {
        match self.machines[source].outputs_mut().pop_front() {
            Some(value) => {
                self.machines[consumer].input_mut().push_front(value);
                Ok(())
            }
            None => Err(Error::InputExhausted {
                ip: self.machines[consumer].ip(),
            }),
        }
    }
}

fn check_phases(phases: &[Word]) -> Result<()> {
    if phases.is_empty() {
        return Err(Error::NoPhases);
    }

    let mut seen = HashSet::with_capacity(phases.len());
    match phases.iter().find(|&&phase| !seen.insert(phase)) {
        Some(&duplicate) => Err(Error::DuplicatePhase(duplicate)),
        None => Ok(()),
    }
}

/// Run one amplifier network for a single phase assignment
pub fn run_amplifiers(program: &Program, phases: &[Word], topology: Topology) -> Result<Word> {
    let signal = Network::amplifiers(program, phases, topology)?.run()?;
    debug!(?phases, signal, "amplifier run");
    Ok(signal)
}

/// Every ordering of `items`, generated lazily with Heap's algorithm
pub fn permutations(items: &[Word]) -> Permutations {
    Permutations {
        current: items.to_vec(),
        counters: vec![0; items.len()],
        i: 1,
        started: false,
    }
}

/// Iterator returned by [`permutations`]. Holds one ordering at a time.
#[derive(Debug, Clone)]
pub struct Permutations {
    current: Vec<Word>,
    counters: Vec<usize>,
    i: usize,
    started: bool,
}

impl Iterator for Permutations {
    type Item = Vec<Word>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            return Some(self.current.clone());
        }

        while self.i < self.current.len() {
            let i = self.i;
            if self.counters[i] < i {
                let swap_with = if i % 2 == 0 { 0 } else { self.counters[i] };
                self.current.swap(swap_with, i);
                self.counters[i] += 1;
                self.i = 1;
                return Some(self.current.clone());
            }
            self.counters[i] = 0;
            self.i += 1;
        }

        None
    }
}

/// Try every ordering of `candidates` as the phase assignment and return the
/// one producing the largest signal, together with that signal.
pub fn best_phase_setting(
    program: &Program,
    candidates: &[Word],
    topology: Topology,
) -> Result<(Vec<Word>, Word)> {
    check_phases(candidates)?;

    let mut best: Option<(Vec<Word>, Word)> = None;
    for phases in permutations(candidates) {
        let signal = run_amplifiers(program, &phases, topology)?;
        if best.as_ref().is_none_or(|&(_, max)| signal > max) {
            best = Some((phases, signal));
        }
    }

    let (phases, signal) = best.ok_or(Error::NoPhases)?;
    info!(?phases, signal, ?topology, "best phase setting");
    Ok((phases, signal))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(words: &[Word]) -> Program {
        Program::new(words.to_vec())
    }

    const CHAIN_43210: &[Word] = &[3, 15, 3, 16, 1002, 16, 10, 16, 1, 16, 15, 15, 4, 15, 99, 0, 0];

    const FEEDBACK_139629729: &[Word] = &[
        3, 26, 1001, 26, -4, 26, 3, 27, 1002, 27, 2, 27, 1, 27, 26, 27, 4, 27, 1001, 28, -1, 28,
        1005, 28, 6, 99, 0, 0, 5,
    ];

    #[test]
    fn test_chain_single_assignment() {
        let signal = run_amplifiers(&program(CHAIN_43210), &[4, 3, 2, 1, 0], Topology::Chain);
        assert_eq!(signal, Ok(43210));
    }

    #[test]
    fn test_feedback_single_assignment() {
        let signal = run_amplifiers(
            &program(FEEDBACK_139629729),
            &[9, 8, 7, 6, 5],
            Topology::Feedback,
        );
        assert_eq!(signal, Ok(139629729));
    }

    #[test]
    fn test_feedback_leaves_last_output_unconsumed() {
        let mut network =
            Network::amplifiers(&program(FEEDBACK_139629729), &[9, 8, 7, 6, 5], Topology::Feedback)
                .unwrap();
        network.run().unwrap();

        assert!(network.machine(4).unwrap().is_halted());
        // Every earlier output of the last amplifier was fed back to the first
        assert_eq!(network.machine(4).unwrap().outputs(), &[139629729]);
    }

    #[test]
    fn test_pull_through_stream() {
        let mut network =
            Network::amplifiers(&program(CHAIN_43210), &[4, 3, 2, 1, 0], Topology::Chain).unwrap();

        let mut output = Stream::output_of(4);
        assert_eq!(network.pull(&mut output), Ok(Some(43210)));
        assert_eq!(network.pull(&mut output), Ok(None));

        let mut literal = Stream::prefix(7, Stream::empty());
        assert_eq!(network.pull(&mut literal), Ok(Some(7)));
        assert_eq!(network.pull(&mut literal), Ok(None));
    }

    #[test]
    fn test_pull_only_runs_what_is_needed() {
        let mut network =
            Network::amplifiers(&program(CHAIN_43210), &[4, 3, 2, 1, 0], Topology::Chain).unwrap();

        assert_eq!(network.pull_output(1), Ok(Some(43)));
        assert!(network.machine(0).unwrap().outputs().is_empty());
        assert!(!network.machine(2).unwrap().is_halted());
        assert_eq!(network.machine(2).unwrap().ip(), 0);
    }

    #[test]
    fn test_self_feeding_machine_deadlocks() {
        // Reads its own output before ever writing any
        let echo = Machine::from_words(vec![3, 0, 4, 0, 99]).with_input(Stream::output_of(0));
        let mut network = Network::from_machines(vec![echo]);

        assert_eq!(network.run(), Err(Error::Deadlock { machine: 0 }));
        // The waiting flag is cleared on the way out
        assert_eq!(network.run(), Err(Error::Deadlock { machine: 0 }));
    }

    #[test]
    fn test_upstream_halts_without_output() {
        let silent = Machine::from_words(vec![99]);
        let reader = Machine::from_words(vec![3, 0, 99]).with_input(Stream::output_of(0));
        let mut network = Network::from_machines(vec![silent, reader]);

        assert_eq!(network.run(), Err(Error::InputExhausted { ip: 0 }));
    }

    #[test]
    fn test_no_output() {
        let mut network = Network::from_machines(vec![Machine::from_words(vec![99])]);
        assert_eq!(network.run(), Err(Error::NoOutput { machine: 0 }));
    }

    #[test]
    fn test_unknown_machine() {
        let reader = Machine::from_words(vec![3, 0, 99]).with_input(Stream::output_of(3));
        let mut network = Network::from_machines(vec![reader]);
        assert_eq!(network.run(), Err(Error::UnknownMachine(3)));
    }

    #[test]
    fn test_phase_validation() {
        let program = program(CHAIN_43210);
        assert_eq!(
            run_amplifiers(&program, &[], Topology::Chain),
            Err(Error::NoPhases)
        );
        assert_eq!(
            run_amplifiers(&program, &[1, 2, 1], Topology::Chain),
            Err(Error::DuplicatePhase(1))
        );
        assert_eq!(
            best_phase_setting(&program, &[], Topology::Feedback),
            Err(Error::NoPhases)
        );
    }

    #[test]
    fn test_permutations() {
        let mut perms: Vec<_> = permutations(&[1, 2, 3]).collect();
        assert_eq!(perms.len(), 6);
        assert_eq!(perms[0], vec![1, 2, 3]);
        perms.sort();
        perms.dedup();
        assert_eq!(perms.len(), 6);
        assert_eq!(perms[0], vec![1, 2, 3]);
        assert_eq!(perms[5], vec![3, 2, 1]);

        assert_eq!(permutations(&[]).collect::<Vec<_>>(), vec![Vec::<Word>::new()]);
        assert_eq!(permutations(&[5]).collect::<Vec<_>>(), vec![vec![5]]);
        assert_eq!(permutations(&[0, 1, 2, 3, 4]).count(), 120);
    }

    #[test]
    fn test_permutations_are_lazy() {
        // 12! orderings; only the first few are ever built
        let candidates: Vec<Word> = (0..12).collect();
        let first: Vec<_> = permutations(&candidates).take(3).collect();
        assert_eq!(first.len(), 3);
        assert_eq!(first[0], candidates);
        assert_ne!(first[1], first[0]);
    }

    /// Reads a phase, then a signal, and outputs the signal plus one
    const INCREMENT: &[Word] = &[3, 11, 3, 12, 101, 1, 12, 12, 4, 12, 99, 0, 0];

    #[test]
    fn test_long_chain_does_not_exhaust_stack() {
        let phases: Vec<Word> = (0..5000).collect();
        assert_eq!(
            run_amplifiers(&program(INCREMENT), &phases, Topology::Chain),
            Ok(5000)
        );
        assert_eq!(
            run_amplifiers(&program(INCREMENT), &phases, Topology::Feedback),
            Ok(5000)
        );
    }

    #[test]
    fn test_error_clears_waiting_consumers() {
        // Machine 1 pulls through machine 0, which reads from a machine that
        // does not exist
        let relay = Machine::from_words(vec![3, 0, 4, 0, 99]).with_input(Stream::output_of(7));
        let reader = Machine::from_words(vec![3, 0, 99]).with_input(Stream::output_of(0));
        let mut network = Network::from_machines(vec![relay, reader]);

        assert_eq!(network.run(), Err(Error::UnknownMachine(7)));
        // A machine left marked as waiting would report a deadlock here
        assert_eq!(network.run(), Err(Error::UnknownMachine(7)));
        assert_eq!(network.pull_output(0), Err(Error::UnknownMachine(7)));
    }

    #[test]
    fn test_empty_network() {
        let mut network = Network::from_machines(Vec::new());
        assert!(network.is_empty());
        assert_eq!(network.run(), Err(Error::NoPhases));
    }

    #[test]
    fn test_best_phase_setting() {
        let (phases, signal) =
            best_phase_setting(&program(CHAIN_43210), &[0, 1, 2, 3, 4], Topology::Chain).unwrap();
        assert_eq!(phases, vec![4, 3, 2, 1, 0]);
        assert_eq!(signal, 43210);
    }
}
