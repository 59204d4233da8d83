#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(parts) = cipherledger_envelope::wire::decode_wire(data) {
        assert_eq!(parts.encoded_len(), data.len());
    }
    let _ = cipherledger_envelope::inspect(data);
});
