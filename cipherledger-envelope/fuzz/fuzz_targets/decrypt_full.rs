#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the passphrase split; the rest is the envelope.
    let split = (data[0] as usize) % data.len();
    let (passphrase, envelope) = data[1..].split_at(split.min(data.len() - 1));

    // PBKDF2 only runs once the header parses, so most inputs stay cheap.
    let _ = cipherledger_envelope::decrypt_file(envelope, passphrase);
});
