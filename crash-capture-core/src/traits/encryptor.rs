use std::path::{Path, PathBuf};

use crate::models::error::PersistError;

/// All-or-nothing encryption of a persist job's artifact set.
///
/// The default implementation is `HybridEncryptor` (per-job AES-256-GCM key,
/// wrapped under a recipient X25519 public key).
pub trait ArtifactEncryptor: Send + Sync {
    /// Encrypt each of the `inputs` to the matching entry of `outputs` under
    /// one fresh symmetric key, then wrap that key under the recipient
    /// public key and write it to `key_dest`.
    ///
    /// Succeeds only if every encryption and the wrap succeed. The symmetric
    /// key must never reach storage in plaintext and must not outlive the
    /// call. The caller decides whether to delete partial outputs after a
    /// reported failure.
    fn encrypt_all(
        &self,
        inputs: &[PathBuf],
        outputs: &[PathBuf],
        key_dest: &Path,
    ) -> Result<(), PersistError>;

    /// Algorithm identifier (e.g., "X25519+AES-256-GCM").
    fn algorithm(&self) -> &str;
}
