#![no_main]

use intcode::{Network, Program, Topology};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&flags, rest)) = data.split_first() else {
        return;
    };

    // Only straight-line programs: no jumps means every run terminates
    let words: Vec<i64> = rest
        .iter()
        .map(|&byte| match i64::from(byte) % 10 {
            5 | 6 => 99,
            word => word,
        })
        .collect();
    if words.is_empty() || words.len() > 512 {
        return;
    }

    let topology = if flags & 1 == 0 {
        Topology::Chain
    } else {
        Topology::Feedback
    };
    let amplifiers = usize::from(flags >> 1) % 5 + 1;
    let phases: Vec<i64> = (0..amplifiers as i64).collect();

    // May fail with any error, including deadlock, but should never panic or
    // recurse without bound
    if let Ok(mut network) = Network::amplifiers(&Program::new(words), &phases, topology) {
        let _ = network.run();
    }
});
