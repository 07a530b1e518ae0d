//! Python bindings for the intcode VM
//!
//! This module exposes the machine and amplifier search to Python using PyO3.
//! Built only with the `python` feature.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyBytes;

use crate::error::Error;
use crate::machine::Machine;
use crate::network::{self, Topology};
use crate::program::Program;

fn to_py_err(err: Error) -> PyErr {
    match err {
        Error::EmptyProgram
        | Error::Parse { .. }
        | Error::Decode(_)
        | Error::UnsupportedVersion { .. }
        | Error::NoPhases
        | Error::DuplicatePhase(_) => PyValueError::new_err(err.to_string()),
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

fn topology(feedback: bool) -> Topology {
    if feedback {
        Topology::Feedback
    } else {
        Topology::Chain
    }
}

/// An intcode program
///
/// Example:
///     >>> program = Program.parse("3,0,4,0,99")
///     >>> program.words
///     [3, 0, 4, 0, 99]
#[pyclass(name = "Program")]
#[derive(Clone)]
struct PyProgram {
    inner: Program,
}

#[pymethods]
impl PyProgram {
    #[new]
    fn new(words: Vec<i64>) -> Self {
        PyProgram {
            inner: Program::new(words),
        }
    }

    /// Parse the comma-separated text encoding
    ///
    /// Raises:
    ///     ValueError: If a token is not an integer or the text is empty
    #[staticmethod]
    fn parse(source: &str) -> PyResult<Self> {
        Program::parse(source)
            .map(|inner| PyProgram { inner })
            .map_err(to_py_err)
    }

    /// Initial memory contents
    #[getter]
    fn words(&self) -> Vec<i64> {
        self.inner.words().to_vec()
    }

    /// Serialize the program to protobuf bytes
    fn to_bytes<'py>(&self, py: Python<'py>) -> Bound<'py, PyBytes> {
        PyBytes::new(py, &self.inner.to_proto_bytes())
    }

    /// Deserialize a program from protobuf bytes
    ///
    /// Raises:
    ///     ValueError: If the bytes are not a valid program
    #[staticmethod]
    fn from_bytes(data: &[u8]) -> PyResult<Self> {
        Program::from_proto_bytes(data)
            .map(|inner| PyProgram { inner })
            .map_err(to_py_err)
    }

    /// Find the noun and verb (cells 1 and 2) that leave `target` in cell 0
    ///
    /// Returns:
    ///     tuple[int, int] | None: The first matching pair, noun-major
    #[pyo3(signature = (target, max=99))]
    fn find_noun_verb(&self, target: i64, max: i64) -> PyResult<Option<(i64, i64)>> {
        self.inner.find_noun_verb(target, 0..=max).map_err(to_py_err)
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!("<Program words={}>", self.inner.len())
    }
}

/// A single machine with a finite input
///
/// Example:
///     >>> machine = Machine(Program.parse("3,0,4,0,99"), [7])
///     >>> machine.run()
///     [7]
#[pyclass(name = "Machine")]
struct PyMachine {
    inner: Machine,
}

#[pymethods]
impl PyMachine {
    #[new]
    #[pyo3(signature = (program, input=None))]
    fn new(program: &PyProgram, input: Option<Vec<i64>>) -> Self {
        PyMachine {
            inner: Machine::new(&program.inner).with_input(input.unwrap_or_default()),
        }
    }

    /// Execute one instruction; returns True once the machine has halted
    fn step(&mut self) -> PyResult<bool> {
        self.inner.step().map_err(to_py_err)
    }

    /// Run to completion and return everything left in the output queue
    fn run(&mut self) -> PyResult<Vec<i64>> {
        self.inner.run_to_terminal().map_err(to_py_err)?;
        Ok(self.inner.outputs().iter().copied().collect())
    }

    #[getter]
    fn outputs(&self) -> Vec<i64> {
        self.inner.outputs().iter().copied().collect()
    }

    #[getter]
    fn memory(&self) -> Vec<i64> {
        self.inner.memory().as_slice().to_vec()
    }

    #[getter]
    fn halted(&self) -> bool {
        self.inner.is_halted()
    }

    fn __repr__(&self) -> String {
        format!(
            "<Machine ip={} halted={} outputs={}>",
            self.inner.ip(),
            self.inner.is_halted(),
            self.inner.outputs().len()
        )
    }
}

/// Run an amplifier network for one phase assignment
///
/// Args:
///     program (Program): Amplifier program, copied into every amplifier
///     phases (list[int]): One distinct phase setting per amplifier
///     feedback (bool): Wire the last amplifier back into the first
///
/// Returns:
///     int: The signal left by the last amplifier
#[pyfunction]
#[pyo3(signature = (program, phases, feedback=false))]
fn run_amplifiers(program: &PyProgram, phases: Vec<i64>, feedback: bool) -> PyResult<i64> {
    network::run_amplifiers(&program.inner, &phases, topology(feedback)).map_err(to_py_err)
}

/// Search every ordering of the phase candidates
///
/// Returns:
///     tuple[list[int], int]: The best phase assignment and its signal
#[pyfunction]
#[pyo3(signature = (program, candidates, feedback=false))]
fn best_phase_setting(
    program: &PyProgram,
    candidates: Vec<i64>,
    feedback: bool,
) -> PyResult<(Vec<i64>, i64)> {
    network::best_phase_setting(&program.inner, &candidates, topology(feedback)).map_err(to_py_err)
}

/// Python module definition
#[pymodule]
fn _intcode_rust(m: &Bound<'_, pyo3::types::PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(run_amplifiers, m)?)?;
    m.add_function(wrap_pyfunction!(best_phase_setting, m)?)?;

    m.add_class::<PyProgram>()?;
    m.add_class::<PyMachine>()?;

    m.add("PROGRAM_FORMAT_VERSION", crate::PROGRAM_FORMAT_VERSION)?;

    Ok(())
}
