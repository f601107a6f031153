// ABOUTME: Integration tests for staging key material into transient files.
// ABOUTME: Covers byte fidelity, lifetimes and public key derivation.

mod support;

use keyward::auth::{Error, Stager, TempFileStager, derive_public_key};
use proptest::prelude::*;

/// Test: Staged file holds exactly the supplied bytes until released.
/// Expected: Contents match; the file is gone after release.
#[test]
fn staged_file_round_trip() {
    support::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let stager = TempFileStager::in_dir(dir.path());

    let staged = stager
        .stage("ssh://git@example.com/repo.git", support::PRIVATE_KEY.as_bytes())
        .unwrap();
    let path = staged.path().to_path_buf();
    assert!(path.starts_with(dir.path()));
    assert_eq!(std::fs::read(&path).unwrap(), support::PRIVATE_KEY.as_bytes());

    staged.release().unwrap();
    assert!(!path.exists());
    assert!(support::files_in(dir.path()).is_empty());
}

/// Test: Staging the same label twice.
/// Expected: Two distinct files coexist.
#[test]
fn same_label_gets_distinct_files() {
    let dir = tempfile::tempdir().unwrap();
    let stager = TempFileStager::in_dir(dir.path());

    let first = stager.stage("repo", b"one").unwrap();
    let second = stager.stage("repo", b"two").unwrap();

    assert_ne!(first.path(), second.path());
    assert_eq!(support::files_in(dir.path()).len(), 2);
}

/// Test: Staging into a directory that does not exist.
/// Expected: Staging error naming the label.
#[test]
fn staging_into_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let stager = TempFileStager::in_dir(dir.path().join("absent"));

    let err = stager.stage("repo", b"key").unwrap_err();
    assert!(matches!(err, Error::Staging { ref label, .. } if label == "repo"));
}

/// Test: Derive the public key of an OpenSSH ed25519 key.
/// Expected: Same line ssh-keygen -y prints, without the comment.
#[test]
fn derives_authorized_keys_line() {
    let public = derive_public_key(support::PRIVATE_KEY.as_bytes()).unwrap();
    assert_eq!(String::from_utf8(public).unwrap(), support::public_key_line());
}

/// Test: Derive from bytes that are not a key.
/// Expected: KeyDerivation error.
#[test]
fn derivation_rejects_garbage() {
    let err = derive_public_key(b"-----BEGIN NOTHING-----\n").unwrap_err();
    assert!(matches!(err, Error::KeyDerivation { .. }));

    let err = derive_public_key(&[0xff, 0xfe, 0x00]).unwrap_err();
    assert!(matches!(err, Error::KeyDerivation { .. }));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Arbitrary bytes come back unchanged and never outlive release.
    #[test]
    fn arbitrary_bytes_are_staged_verbatim(bytes in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let dir = tempfile::tempdir().unwrap();
        let staged = TempFileStager::in_dir(dir.path()).stage("prop", &bytes).unwrap();
        let path = staged.path().to_path_buf();

        prop_assert_eq!(std::fs::read(&path).unwrap(), bytes);
        staged.release().unwrap();
        prop_assert!(!path.exists());
    }
}
