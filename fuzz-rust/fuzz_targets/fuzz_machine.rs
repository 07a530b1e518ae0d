#![no_main]

use intcode::Machine;
use libfuzzer_sys::fuzz_target;

const MAX_STEPS: usize = 10_000;

fuzz_target!(|data: &[u8]| {
    // Small words so that addresses usually land inside memory
    let words: Vec<i64> = data
        .chunks_exact(2)
        .map(|chunk| i64::from(i16::from_le_bytes([chunk[0], chunk[1]])))
        .collect();
    if words.is_empty() || words.len() > 4096 {
        return;
    }

    let len = words.len();
    let input: Vec<i64> = words.iter().rev().take(8).copied().collect();
    let mut machine = Machine::from_words(words).with_input(input);

    // Random programs may loop forever; stop after a fixed budget
    for _ in 0..MAX_STEPS {
        let before = machine.memory().clone();
        let ip = machine.ip();

        match machine.step() {
            Ok(true) => {
                // Property: halting is permanent and changes nothing afterwards
                let memory = machine.memory().clone();
                assert_eq!(machine.step(), Ok(true));
                assert_eq!(machine.memory(), &memory);
                break;
            }
            Ok(false) => {}
            Err(_) => {
                // Property: a failed step commits nothing
                assert_eq!(machine.memory(), &before);
                assert_eq!(machine.ip(), ip);
                break;
            }
        }

        // Property: memory never grows
        assert_eq!(machine.memory().len(), len);
    }
});
