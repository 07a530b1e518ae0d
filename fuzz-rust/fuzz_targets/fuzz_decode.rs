#![no_main]

use intcode::{Instruction, Memory};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Full-width words, so every opcode/mode combination and both signs show up
    let words: Vec<i64> = data
        .chunks_exact(8)
        .map(|chunk| i64::from_le_bytes(chunk.try_into().unwrap()))
        .collect();
    if words.is_empty() {
        return;
    }

    let memory = Memory::new(words);

    for ip in 0..memory.len() {
        // Decoding may fail, but should never panic
        let Ok(instruction) = Instruction::decode(&memory, ip) else {
            continue;
        };

        // Property: exactly one mode and one argument per parameter
        assert_eq!(instruction.modes().len(), instruction.opcode.arity());
        assert_eq!(instruction.args().len(), instruction.opcode.arity());
        assert_eq!(instruction.next_ip(), ip + 1 + instruction.opcode.arity());

        // Property: resolving twice gives the same answer
        assert_eq!(instruction.resolve(&memory), instruction.resolve(&memory));
    }
});
