use fieldseal_middleware::{classify, Scenario, ENCRYPTION_SETTINGS_TABLE};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

// ── Truth table ─────────────────────────────────────────────────

#[test]
fn classifies_every_membership_combination() {
    let cases = [
        (false, false, Scenario::UnencryptedNoChange),
        (false, true, Scenario::UnencryptedToEncrypted),
        (true, false, Scenario::EncryptedToUnencrypted),
        (true, true, Scenario::EncryptedNoChange),
    ];
    for (was, wants, expected) in cases {
        let previous: Vec<&str> = if was { vec!["friends"] } else { vec![] };
        let requested: Vec<&str> = if wants { vec!["friends"] } else { vec![] };
        assert_eq!(classify("friends", &requested, &previous), expected);
    }
}

#[test]
fn settings_table_wins_over_membership() {
    let both = [ENCRYPTION_SETTINGS_TABLE];
    assert_eq!(
        classify(ENCRYPTION_SETTINGS_TABLE, &both, &both),
        Scenario::IsSettingsTable
    );
    assert_eq!(
        classify::<&str>(ENCRYPTION_SETTINGS_TABLE, &[], &[]),
        Scenario::IsSettingsTable
    );
}

#[test]
fn membership_is_exact_name_equality() {
    assert_eq!(
        classify("Friends", &["friends"], &[]),
        Scenario::UnencryptedNoChange
    );
    assert_eq!(
        classify("friends", &["friends "], &[]),
        Scenario::UnencryptedNoChange
    );
}

#[test]
fn only_encrypted_outcomes_install_hooks() {
    assert!(Scenario::UnencryptedToEncrypted.installs_hooks());
    assert!(Scenario::EncryptedNoChange.installs_hooks());
    assert!(!Scenario::EncryptedToUnencrypted.installs_hooks());
    assert!(!Scenario::UnencryptedNoChange.installs_hooks());
    assert!(!Scenario::IsSettingsTable.installs_hooks());
}

// ── Properties ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn classification_follows_membership(
        table in "[a-z]{1,8}",
        requested in prop::collection::vec("[a-z]{1,8}", 0..5),
        previous in prop::collection::vec("[a-z]{1,8}", 0..5),
    ) {
        let was = previous.contains(&table);
        let wants = requested.contains(&table);
        let expected = match (was, wants) {
            (false, false) => Scenario::UnencryptedNoChange,
            (false, true) => Scenario::UnencryptedToEncrypted,
            (true, false) => Scenario::EncryptedToUnencrypted,
            (true, true) => Scenario::EncryptedNoChange,
        };
        prop_assert_eq!(classify(&table, &requested, &previous), expected);
    }
}
