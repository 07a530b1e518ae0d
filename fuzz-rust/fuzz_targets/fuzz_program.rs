#![no_main]

use intcode::Program;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes as protobuf: may fail, should never panic
    let _ = Program::from_proto_bytes(data);

    if let Ok(source) = std::str::from_utf8(data) {
        // Skip very large inputs to avoid timeouts
        if source.len() > 10000 {
            return;
        }

        if let Ok(program) = Program::parse(source) {
            // Property: one word per comma-separated token
            assert_eq!(program.len(), source.trim().split(',').count());

            // Property: protobuf round-trip preserves the program
            let decoded = Program::from_proto_bytes(&program.to_proto_bytes())
                .expect("Protobuf round-trip should work");
            assert_eq!(decoded, program);
        }
    }
});
