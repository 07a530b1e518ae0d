use std::ops::RangeInclusive;
use std::str::FromStr;

use tracing::{info, trace};

use crate::error::{Error, Result};
use crate::machine::Machine;
use crate::memory::Memory;
use crate::{PROGRAM_FORMAT_VERSION, Word};

/// Address of the noun cell overwritten by [`Program::find_noun_verb`]
const NOUN_ADDRESS: Word = 1;
/// Address of the verb cell
const VERB_ADDRESS: Word = 2;

/// Protobuf wire format for programs
pub mod proto {
    /// A serialized intcode program
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Program {
        /// Program format version
        #[prost(uint32, tag = "1")]
        pub version: u32,

        /// Initial memory contents
        #[prost(sint64, repeated, tag = "2")]
        pub words: ::prost::alloc::vec::Vec<i64>,
    }
}

/// An intcode program: the initial contents of a machine's memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    words: Vec<Word>,
}

impl Program {
    pub fn new(words: Vec<Word>) -> Self {
        Program { words }
    }

    /// Parse the comma-separated text encoding, e.g. `"1,0,0,3,99"`.
    ///
    /// Whitespace around each number (including a trailing newline) is
    /// ignored.
    pub fn parse(source: &str) -> Result<Self> {
        let source = source.trim();
        if source.is_empty() {
            return Err(Error::EmptyProgram);
        }

        let words = source
            .split(',')
            .enumerate()
            .map(|(position, token)| {
                let token = token.trim();
                token.parse::<Word>().map_err(|_| Error::Parse {
                    position,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Program { words })
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Copy of this program with some initial memory cells overwritten
    pub fn patched(&self, patches: &[(Word, Word)]) -> Result<Self> {
        let mut memory = Memory::new(self.words.clone());
        for &(address, value) in patches {
            memory.set(address, value)?;
        }
        Ok(Program {
            words: memory.into_vec(),
        })
    }

    /// Search for the noun (cell 1) and verb (cell 2) that leave `target` in
    /// cell 0 once the patched program has halted.
    ///
    /// Pairs are tried noun-major over `range`. Any run that fails aborts the
    /// search with its error; `Ok(None)` means every pair ran and none matched.
    pub fn find_noun_verb(
        &self,
        target: Word,
        range: RangeInclusive<Word>,
    ) -> Result<Option<(Word, Word)>> {
        for noun in range.clone() {
            for verb in range.clone() {
                let program = self.patched(&[(NOUN_ADDRESS, noun), (VERB_ADDRESS, verb)])?;
                let mut machine = Machine::new(&program);
                machine.run_to_terminal()?;

                let result = machine.memory().fetch(0)?;
                trace!(noun, verb, result, "noun/verb attempt");
                if result == target {
                    info!(noun, verb, target, "found noun/verb pair");
                    return Ok(Some((noun, verb)));
                }
            }
        }

        Ok(None)
    }

    /// Deserialize a Program from protobuf bytes
    pub fn from_proto_bytes(bytes: &[u8]) -> Result<Self> {
        use prost::Message;

        let proto_program = proto::Program::decode(bytes)?;
        Self::from_proto(proto_program)
    }

    /// Convert from protobuf Program message
    pub fn from_proto(proto: proto::Program) -> Result<Self> {
        if proto.version != PROGRAM_FORMAT_VERSION {
            return Err(Error::UnsupportedVersion {
                found: proto.version,
                expected: PROGRAM_FORMAT_VERSION,
            });
        }
        Ok(Program { words: proto.words })
    }

    /// Serialize to protobuf bytes
    pub fn to_proto_bytes(&self) -> Vec<u8> {
        use prost::Message;

        self.to_proto().encode_to_vec()
    }

    /// Convert to protobuf Program message
    pub fn to_proto(&self) -> proto::Program {
        proto::Program {
            version: PROGRAM_FORMAT_VERSION,
            words: self.words.clone(),
        }
    }
}

impl FromStr for Program {
    type Err = Error;

    fn from_str(source: &str) -> Result<Self> {
        Program::parse(source)
    }
}

impl From<Vec<Word>> for Program {
    fn from(words: Vec<Word>) -> Self {
        Program::new(words)
    }
}
