use std::collections::VecDeque;

use crate::{MachineId, Word};

/// Where a stream's values come from once its buffered values run out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Nothing follows the buffered values
    Finite,
    /// Values are produced on demand by the machine with this id
    Machine(MachineId),
}

/// Outcome of pulling one element from a [`Stream`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    Value(Word),
    /// The stream is exhausted
    End,
    /// The next value has to be produced by another machine first
    Upstream(MachineId),
}

/// Single-consumer, pull-based sequence of words.
///
/// A stream is a queue of buffered values followed by a [`Source`]. Pulling
/// consumes the value for good; nothing can be rewound. Composition is plain
/// data: [`Stream::prefix`] puts a value in front of another stream, and a
/// machine-backed source is just the producer's id, resolved by whoever owns
/// that machine (see [`crate::Network`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stream {
    buffered: VecDeque<Word>,
    source: Source,
}

impl Stream {
    /// A stream with no values at all
    pub fn empty() -> Self {
        Stream {
            buffered: VecDeque::new(),
            source: Source::Finite,
        }
    }

    /// A finite stream yielding `values` in order, then the end
    pub fn from_values(values: impl IntoIterator<Item = Word>) -> Self {
        Stream {
            buffered: values.into_iter().collect(),
            source: Source::Finite,
        }
    }

    /// The output of machine `id`
    pub fn output_of(id: MachineId) -> Self {
        Stream {
            buffered: VecDeque::new(),
            source: Source::Machine(id),
        }
    }

    /// A stream that yields `value` and then everything `tail` would yield
    pub fn prefix(value: Word, mut tail: Stream) -> Self {
        tail.push_front(value);
        tail
    }

    /// Put `value` ahead of everything else in this stream
    pub fn push_front(&mut self, value: Word) {
        self.buffered.push_front(value);
    }

    pub fn next(&mut self) -> Pull {
        if let Some(value) = self.buffered.pop_front() {
            return Pull::Value(value);
        }

        match self.source {
            Source::Finite => Pull::End,
            Source::Machine(id) => Pull::Upstream(id),
        }
    }

    /// Number of values available without consulting the source
    pub fn buffered(&self) -> usize {
        self.buffered.len()
    }
}

impl Default for Stream {
    fn default() -> Self {
        Stream::empty()
    }
}

impl From<Vec<Word>> for Stream {
    fn from(values: Vec<Word>) -> Self {
        Stream {
            buffered: values.into(),
            source: Source::Finite,
        }
    }
}

impl FromIterator<Word> for Stream {
    fn from_iter<I: IntoIterator<Item = Word>>(iter: I) -> Self {
        Stream::from_values(iter)
    }
}
