use cipherledger_envelope::wire::{decode_wire, encode_wire, MIN_ENVELOPE_BYTES};
use cipherledger_envelope::{decrypt_file, encrypt, encrypt_file, Algorithm, EnvelopeError};

use proptest::prelude::*;

#[test]
fn roundtrip_every_algorithm() {
    for alg in Algorithm::ALL {
        let sealed = encrypt_file(b"ledgered payload", b"correct horse", alg.name()).unwrap();
        let opened = decrypt_file(&sealed.envelope, b"correct horse").unwrap();
        assert_eq!(opened.plaintext, b"ledgered payload");
        assert_eq!(opened.algorithm, alg);
        assert!(opened.dec_millis >= 0.0);
    }
}

#[test]
fn roundtrip_empty_plaintext() {
    for alg in Algorithm::ALL {
        let sealed = encrypt(b"", b"pw", alg).unwrap();
        assert_eq!(
            sealed.envelope.len(),
            MIN_ENVELOPE_BYTES + 16 + alg.nonce_len() + alg.tag_len()
        );
        assert!(decrypt_file(&sealed.envelope, b"pw").unwrap().plaintext.is_empty());
    }
}

#[test]
fn roundtrip_large_plaintext() {
    let plaintext = vec![0xABu8; 1 << 20];
    for alg in Algorithm::ALL {
        let sealed = encrypt(&plaintext, b"pw", alg).unwrap();
        assert_eq!(decrypt_file(&sealed.envelope, b"pw").unwrap().plaintext, plaintext);
    }
}

#[test]
fn wrong_passphrase_fails_uniformly() {
    for alg in Algorithm::ALL {
        let sealed = encrypt(b"data", b"pw", alg).unwrap();
        assert_eq!(
            decrypt_file(&sealed.envelope, b"wrong").unwrap_err(),
            EnvelopeError::AuthenticationFailure
        );
    }
}

#[test]
fn ciphertext_and_tag_tampering_detected() {
    for alg in Algorithm::ALL {
        let sealed = encrypt(b"tamper me", b"pw", alg).unwrap();
        let tag_start = sealed.envelope.len() - 9 - alg.tag_len();
        for i in tag_start..sealed.envelope.len() {
            let mut bad = sealed.envelope.clone();
            bad[i] ^= 0x01;
            assert_eq!(
                decrypt_file(&bad, b"pw").unwrap_err(),
                EnvelopeError::AuthenticationFailure,
                "{alg}: byte {i} flipped"
            );
        }
    }
}

#[test]
fn salt_tampering_detected() {
    let sealed = encrypt(b"data", b"pw", Algorithm::ChaCha20Poly1305).unwrap();
    let mut bad = sealed.envelope.clone();
    bad[3] ^= 0xFF; // first salt byte
    assert_eq!(
        decrypt_file(&bad, b"pw").unwrap_err(),
        EnvelopeError::AuthenticationFailure
    );
}

#[test]
fn unknown_algorithm_id() {
    let sealed = encrypt(b"data", b"pw", Algorithm::Aes256Gcm).unwrap();
    for id in [0u8, 4, 0xFF] {
        let mut bad = sealed.envelope.clone();
        bad[0] = id;
        assert_eq!(
            decrypt_file(&bad, b"pw").unwrap_err(),
            EnvelopeError::UnknownAlgorithmId(id)
        );
    }
}

#[test]
fn truncated_header_is_malformed() {
    let sealed = encrypt(b"data", b"pw", Algorithm::Aes256Gcm).unwrap();
    let err = decrypt_file(&sealed.envelope[..10], b"pw").unwrap_err();
    assert!(matches!(err, EnvelopeError::Malformed(_)));
    assert!(err.is_input_error());
}

#[test]
fn widened_gcm_nonce_takes_legacy_path() {
    let sealed = encrypt(b"x", b"pw", Algorithm::Aes256Gcm).unwrap();
    let parts = decode_wire(&sealed.envelope).unwrap();
    let mut nonce = parts.nonce.to_vec();
    nonce.extend_from_slice(&[0u8; 4]);
    let reframed = encode_wire(1, parts.salt, &nonce, parts.tag, parts.ciphertext).unwrap();
    // 16-byte nonce is accepted by the parser but derives a different counter.
    assert_eq!(
        decrypt_file(&reframed, b"pw").unwrap_err(),
        EnvelopeError::AuthenticationFailure
    );
}

#[test]
fn fresh_salt_and_nonce_every_call() {
    let a = encrypt(b"same", b"pw", Algorithm::Blowfish256Eax).unwrap();
    let b = encrypt(b"same", b"pw", Algorithm::Blowfish256Eax).unwrap();
    assert_ne!(a.salt, b.salt);
    assert_ne!(a.nonce, b.nonce);
    assert_ne!(a.envelope, b.envelope);
    assert_eq!(a.file_hash, b.file_hash);
}

proptest! {
    // Each case runs PBKDF2 twice per algorithm.
    #![proptest_config(ProptestConfig::with_cases(4))]

    #[test]
    fn arbitrary_content_roundtrips(
        data in proptest::collection::vec(any::<u8>(), 0..2048),
        pass in proptest::collection::vec(any::<u8>(), 0..32),
    ) {
        for alg in Algorithm::ALL {
            let sealed = encrypt(&data, &pass, alg).unwrap();
            let opened = decrypt_file(&sealed.envelope, &pass).unwrap();
            prop_assert_eq!(&opened.plaintext, &data);
            prop_assert_eq!(opened.algorithm, alg);
        }
    }

    #[test]
    fn arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..64)) {
        let _ = decode_wire(&data);
        let _ = cipherledger_envelope::inspect(&data);
    }
}
