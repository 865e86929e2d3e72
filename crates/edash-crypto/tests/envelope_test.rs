//! Integration tests: bundle JSON produced by `seal` resolves back to the
//! original archive, and nothing but the right passphrase opens it.

use edash_crypto::{resolve_bytes, seal, CryptoError, EncryptedBundle, KdfParams};
use proptest::prelude::*;
use secrecy::SecretString;

fn params() -> KdfParams {
    KdfParams { iterations: 500 }
}

#[test]
fn sealed_bundle_json_resolves_to_archive() {
    let archive: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
    let passphrase = SecretString::from("dashboard-2030");

    let bundle = seal(&archive, &passphrase, &params()).unwrap();
    let raw = bundle.to_vec().unwrap();

    assert_eq!(resolve_bytes(&raw, &passphrase).unwrap(), archive);
}

#[test]
fn bundle_fields_are_url_safe() {
    let bundle = seal(&[0xFFu8; 300], &SecretString::from("pw"), &params()).unwrap();
    for field in [
        &bundle.kdf.salt,
        &bundle.wrap.wrapped_key,
        &bundle.wrap.iv,
        &bundle.data.ciphertext,
        &bundle.data.iv,
    ] {
        assert!(
            !field.contains('+') && !field.contains('/') && !field.contains('='),
            "field is not base64url: {field}"
        );
    }
}

#[test]
fn handwritten_bundle_missing_data_is_format_error() {
    let raw = br#"{"kdf":{"salt":"AQEB","iterations":10},"wrap":{"wrappedKey":"AA","iv":"AA"}}"#;
    match resolve_bytes(raw, &SecretString::from("pw")) {
        Err(CryptoError::Format(msg)) => assert!(msg.contains("data")),
        other => panic!("expected format error, got {other:?}"),
    }
}

#[test]
fn extra_top_level_fields_are_tolerated() {
    let bundle = seal(b"zip", &SecretString::from("pw"), &params()).unwrap();
    let mut value = serde_json::to_value(&bundle).unwrap();
    value["generator"] = serde_json::json!("export-tool 1.2");

    let parsed = EncryptedBundle::from_slice(&serde_json::to_vec(&value).unwrap()).unwrap();
    assert_eq!(parsed, bundle);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn wrong_passphrase_never_yields_bytes(
        right in "[a-zA-Z0-9]{1,16}",
        wrong in "[a-zA-Z0-9]{1,16}",
        archive in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        prop_assume!(right != wrong);
        let bundle = seal(&archive, &SecretString::from(right.clone()), &params()).unwrap();
        let raw = bundle.to_vec().unwrap();

        prop_assert_eq!(
            resolve_bytes(&raw, &SecretString::from(right)).unwrap(),
            archive
        );
        let err = resolve_bytes(&raw, &SecretString::from(wrong)).unwrap_err();
        prop_assert!(err.is_authentication());
    }
}
