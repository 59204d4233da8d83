//! Known Answer tests (fixed salt and nonce, `kat` feature)

use cipherledger_envelope::kdf::{derive_key, KEY_BYTES, PBKDF2_ROUNDS, SALT_BYTES};
use cipherledger_envelope::wire::{decode_wire, LENGTH_PREFIX_BYTES, MIN_ENVELOPE_BYTES};
use cipherledger_envelope::{decrypt_file, encrypt_with_parts, Algorithm};

fn kat_salt() -> [u8; SALT_BYTES] {
    core::array::from_fn(|i| i as u8)
}

struct Vector {
    algorithm: Algorithm,
    nonce: &'static [u8],
    ciphertext: &'static str,
    tag: &'static str,
}

const HELLO_VECTORS: &[Vector] = &[
    Vector {
        algorithm: Algorithm::Aes256Gcm,
        nonce: &[0x24; 12],
        ciphertext: "afee8b92da",
        tag: "809f9e4df69b3828e60d2a59ac036579",
    },
    Vector {
        algorithm: Algorithm::Aes256Gcm,
        nonce: &[0x24; 16],
        ciphertext: "171b247136",
        tag: "334b5c45aba96d8307ace3daf7defbb9",
    },
    Vector {
        algorithm: Algorithm::Blowfish256Eax,
        nonce: &[0x42; 16],
        ciphertext: "0383484c4b",
        tag: "7a5f40eb30ea0f4b",
    },
    Vector {
        algorithm: Algorithm::ChaCha20Poly1305,
        nonce: &[0x24; 12],
        ciphertext: "26dd76ccbd",
        tag: "f871fcac6cdcd370555732cd15156ace",
    },
];

#[test]
fn test_constants() {
    assert_eq!(SALT_BYTES, 16);
    assert_eq!(KEY_BYTES, 32);
    assert_eq!(PBKDF2_ROUNDS, 200_000);
    assert_eq!(LENGTH_PREFIX_BYTES, 2);
    assert_eq!(MIN_ENVELOPE_BYTES, 7);
}

#[test]
fn test_kdf_vectors() {
    assert_eq!(
        hex::encode(*derive_key(b"pw", &kat_salt())),
        "d52696f4d04e49a178e2e26b8d57ac585d3b7a2288d07eee527e0bf101daebd2"
    );
    assert_eq!(
        hex::encode(*derive_key(b"", &[0u8; SALT_BYTES])),
        "486e8eb8d6b8cac87b9ac86e7943aeeca507bcd1cc2ffb958e272a300b2eda88"
    );
}

#[test]
fn test_hello_vectors() {
    for v in HELLO_VECTORS {
        let sealed = encrypt_with_parts(b"hello", b"pw", v.algorithm, &kat_salt(), v.nonce).unwrap();
        assert_eq!(hex::encode(&sealed.tag), v.tag, "{} tag", v.algorithm);

        let parts = decode_wire(&sealed.envelope).unwrap();
        assert_eq!(parts.algorithm_id, v.algorithm.id());
        assert_eq!(hex::encode(parts.ciphertext), v.ciphertext, "{} ciphertext", v.algorithm);

        let opened = decrypt_file(&sealed.envelope, b"pw").unwrap();
        assert_eq!(opened.plaintext, b"hello");
    }
}

#[test]
fn test_full_envelope_bytes() {
    let sealed = encrypt_with_parts(
        b"hello",
        b"pw",
        Algorithm::Aes256Gcm,
        &kat_salt(),
        &[0x24; 12],
    )
    .unwrap();
    let expected = concat!(
        "01",
        "1000",
        "000102030405060708090a0b0c0d0e0f",
        "0c00",
        "242424242424242424242424",
        "1000",
        "809f9e4df69b3828e60d2a59ac036579",
        "afee8b92da",
    );
    assert_eq!(hex::encode(&sealed.envelope), expected);
}
