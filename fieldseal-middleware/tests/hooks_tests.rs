mod common;

use common::{camilla, record, FlakyProvider};
use fieldseal_crypto::PassthroughProvider;
use fieldseal_middleware::{
    is_ciphertext_only, is_encrypted, Codec, EncryptError, EncryptionHooks, WipeMode,
    ENCRYPTED_DATA_KEY,
};
use fieldseal_model::{apply_modifications, to_modifications, FieldUpdate, Modifications, TableSchema};
use fieldseal_storage::TableHooks;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn hooks_with(codec: Codec) -> EncryptionHooks {
    EncryptionHooks::new(TableSchema::parse("friends", "++id, name, age").unwrap(), codec)
}

fn passthrough_codec() -> Codec {
    Codec::new(Arc::new(PassthroughProvider))
}

fn stored_camilla(codec: &Codec) -> fieldseal_model::Record {
    let mut stored = camilla();
    stored.insert("id".into(), json!(1));
    let hooks = hooks_with(codec.clone());
    hooks.on_create(&mut stored).unwrap();
    stored
}

// ── Recursion guard ─────────────────────────────────────────────

#[test]
fn ciphertext_only_detection() {
    let mut only = Modifications::new();
    assert!(is_ciphertext_only(&only));
    only.insert(ENCRYPTED_DATA_KEY.into(), FieldUpdate::Set(json!("abc")));
    assert!(is_ciphertext_only(&only));
    only.insert("street".into(), FieldUpdate::Unset);
    assert!(!is_ciphertext_only(&only));
}

#[test]
fn ciphertext_only_update_is_left_alone() {
    let provider = Arc::new(FlakyProvider::default());
    let codec = Codec::new(provider.clone());
    let stored = stored_camilla(&codec);
    let calls = provider.encrypt_calls.load(Ordering::SeqCst);

    let mut modifications = Modifications::new();
    modifications.insert(ENCRYPTED_DATA_KEY.into(), FieldUpdate::Set(json!("e30=")));

    let result = hooks_with(codec).on_update(&modifications, &json!(1), &stored).unwrap();
    assert_eq!(result, None);
    assert_eq!(provider.encrypt_calls.load(Ordering::SeqCst), calls);
}

// ── Merge ───────────────────────────────────────────────────────

#[test]
fn update_reencrypts_the_merged_record() {
    let codec = passthrough_codec();
    let hooks = hooks_with(codec.clone());
    let current = stored_camilla(&codec);

    let incoming = to_modifications(record(json!({"street": "Elm Street"})));
    let extra = hooks.on_update(&incoming, &json!(1), &current).unwrap().unwrap();

    // What the engine does: incoming first, hook output on top.
    let mut all = incoming;
    all.extend(extra);
    let mut next = current;
    apply_modifications(&mut next, &all);

    assert!(is_encrypted(&next));
    assert!(!next.contains_key("street"));
    let plain = codec.decrypt(next, WipeMode::Delete).unwrap();
    assert_eq!(plain["street"], "Elm Street");
    assert_eq!(plain["name"], "Camilla");
    assert_eq!(plain["age"], 25);
    assert_eq!(plain["picture"], "camilla.png");
}

#[test]
fn update_can_remove_an_encrypted_field() {
    let codec = passthrough_codec();
    let hooks = hooks_with(codec.clone());
    let current = stored_camilla(&codec);

    let mut incoming = Modifications::new();
    incoming.insert("picture".into(), FieldUpdate::Unset);
    let extra = hooks.on_update(&incoming, &json!(1), &current).unwrap().unwrap();

    let mut next = current;
    apply_modifications(&mut next, &incoming);
    apply_modifications(&mut next, &extra);
    let plain = codec.decrypt(next, WipeMode::Delete).unwrap();
    assert!(!plain.contains_key("picture"));
    assert_eq!(plain["street"], "East 13:th Street");
}

#[test]
fn update_of_a_legacy_plaintext_row_encrypts_it() {
    let codec = passthrough_codec();
    let hooks = hooks_with(codec.clone());
    let mut current = camilla();
    current.insert("id".into(), json!(2));

    let incoming = to_modifications(record(json!({"age": 26})));
    let extra = hooks.on_update(&incoming, &json!(2), &current).unwrap().unwrap();

    assert_eq!(extra["age"], FieldUpdate::Set(json!(26)));
    assert_eq!(extra["street"], FieldUpdate::Unset);
    assert!(extra.contains_key(ENCRYPTED_DATA_KEY));
}

// ── Read and errors ─────────────────────────────────────────────

#[test]
fn read_returns_plaintext_without_ciphertext_field() {
    let codec = passthrough_codec();
    let stored = stored_camilla(&codec);

    let plain = hooks_with(codec).on_read(stored).unwrap();
    let mut expected = camilla();
    expected.insert("id".into(), json!(1));
    assert_eq!(plain, expected);
}

#[test]
fn hook_errors_box_the_middleware_error() {
    let codec = Codec::new(Arc::new(FlakyProvider::failing()));
    let err = hooks_with(codec).on_create(&mut camilla()).unwrap_err();
    let err = err.downcast::<EncryptError>().unwrap();
    assert!(matches!(*err, EncryptError::Provider(_)));
}
