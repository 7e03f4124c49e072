//! SSH key fixtures.
//!
//! The keys are throwaway material generated for tests only.

use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-fixtures/keys")
        .join(name)
}

/// Unencrypted ed25519 private key in OpenSSH format.
pub fn ed25519_private_key() -> PathBuf {
    fixture("id_ed25519")
}

/// A file with a PEM envelope but no valid key inside.
pub fn malformed_private_key() -> PathBuf {
    fixture("malformed_key")
}
