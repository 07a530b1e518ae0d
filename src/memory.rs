use crate::Word;
use crate::error::{Error, Result};

/// Linear, fixed-size store of words a machine executes from and writes to.
///
/// Memory never grows: every address must fall inside the initial program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    cells: Vec<Word>,
}

impl Memory {
    pub fn new(cells: Vec<Word>) -> Self {
        Memory { cells }
    }

    /// Read the word at `address`
    pub fn read_at(&self, address: Word) -> Result<Word> {
        let index = self.index(address)?;
        Ok(self.cells[index])
    }

    /// Overwrite the word at `address` in place
    pub fn set(&mut self, address: Word, value: Word) -> Result<()> {
        let index = self.index(address)?;
        self.cells[index] = value;
        Ok(())
    }

    /// Read the word at an instruction-pointer offset
    pub fn fetch(&self, index: usize) -> Result<Word> {
        self.cells.get(index).copied().ok_or(Error::OutOfBounds {
            address: Word::try_from(index).unwrap_or(Word::MAX),
            len: self.cells.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn as_slice(&self) -> &[Word] {
        &self.cells
    }

    pub fn into_vec(self) -> Vec<Word> {
        self.cells
    }

    fn index(&self, address: Word) -> Result<usize> {
        usize::try_from(address)
            .ok()
            .filter(|&index| index < self.cells.len())
            .ok_or(Error::OutOfBounds {
                address,
                len: self.cells.len(),
            })
    }
}

impl From<Vec<Word>> for Memory {
    fn from(cells: Vec<Word>) -> Self {
        Memory::new(cells)
    }
}
