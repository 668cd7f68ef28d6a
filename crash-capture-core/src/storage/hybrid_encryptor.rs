use std::fs;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use sha2::{Digest, Sha256};
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};

use crate::models::error::PersistError;
use crate::traits::encryptor::ArtifactEncryptor;

/// Length of the AES-GCM nonce prefix of every sealed file.
pub const NONCE_LEN: usize = 12;
/// Length of the GCM authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;
/// Length of the ephemeral public key prefix of a wrapped-key file.
pub const EPHEMERAL_KEY_LEN: usize = 32;

/// Hybrid encryption of a persist job's artifact set.
///
/// One fresh AES-256-GCM key is generated per `encrypt_all` call and used
/// for every file of the set; the key itself is wrapped sealed-box style
/// under the recipient's X25519 public key and never reaches storage in
/// plaintext.
///
/// File formats:
/// ```text
/// sealed artifact:  [nonce:12][ciphertext][tag:16]
/// wrapped key:      [ephemeral_pubkey:32][nonce:12][ciphertext][tag:16]
/// ```
pub struct HybridEncryptor {
    recipient: PublicKey,
}

impl HybridEncryptor {
    /// `recipient_public_key` is the opaque 32-byte X25519 public key loaded
    /// by the caller's resource loader.
    pub fn new(recipient_public_key: [u8; 32]) -> Self {
        Self {
            recipient: PublicKey::from(recipient_public_key),
        }
    }
}

impl ArtifactEncryptor for HybridEncryptor {
    fn encrypt_all(
        &self,
        inputs: &[PathBuf],
        outputs: &[PathBuf],
        key_dest: &Path,
    ) -> Result<(), PersistError> {
        if inputs.len() != outputs.len() {
            return Err(PersistError::Encryption(format!(
                "input/output count mismatch: {} vs {}",
                inputs.len(),
                outputs.len()
            )));
        }

        // fresh symmetric key for this call only; dropped on return
        let file_key = Aes256Gcm::generate_key(&mut OsRng);
        let cipher = Aes256Gcm::new(&file_key);

        for (input, output) in inputs.iter().zip(outputs) {
            let plaintext = fs::read(input).map_err(|e| {
                PersistError::Io(format!("failed to read plaintext {}: {}", input.display(), e))
            })?;
            let sealed = seal(&cipher, &plaintext)
                .map_err(|e| PersistError::Encryption(format!("sealing {} failed: {}", input.display(), e)))?;
            fs::write(output, &sealed).map_err(|e| {
                PersistError::Io(format!("failed to write ciphertext {}: {}", output.display(), e))
            })?;
        }

        wrap_key(&file_key, &self.recipient, key_dest)
    }

    fn algorithm(&self) -> &str {
        "X25519+AES-256-GCM"
    }
}

/// Encrypt `plaintext` under `cipher` with a fresh random nonce.
///
/// Returns `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
fn seal(cipher: &Aes256Gcm, plaintext: &[u8]) -> Result<Vec<u8>, aes_gcm::Error> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher.encrypt(&nonce, plaintext)?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(nonce.as_slice());
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Wrap the per-job symmetric key under the recipient public key.
///
/// Ephemeral X25519 Diffie-Hellman with the recipient, SHA-256 of the shared
/// secret as key-encryption key, AES-256-GCM over the symmetric key bytes.
fn wrap_key(
    file_key: &Key<Aes256Gcm>,
    recipient: &PublicKey,
    dest: &Path,
) -> Result<(), PersistError> {
    let ephemeral = EphemeralSecret::random_from_rng(&mut OsRng);
    let ephemeral_public = PublicKey::from(&ephemeral);
    let shared = ephemeral.diffie_hellman(recipient);

    let kek = Sha256::digest(shared.as_bytes());
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(kek.as_slice()));
    let sealed = seal(&cipher, file_key.as_slice())
        .map_err(|e| PersistError::Encryption(format!("wrapping the symmetric key failed: {}", e)))?;

    let mut out = Vec::with_capacity(EPHEMERAL_KEY_LEN + sealed.len());
    out.extend_from_slice(ephemeral_public.as_bytes());
    out.extend_from_slice(&sealed);
    fs::write(dest, &out).map_err(|e| {
        PersistError::Io(format!("failed to write wrapped key {}: {}", dest.display(), e))
    })?;
    Ok(())
}

/// Recover the symmetric key from a wrapped-key file with the recipient's
/// secret key.
pub fn unwrap_key(
    wrapped: &[u8],
    recipient_secret: &StaticSecret,
) -> Result<Key<Aes256Gcm>, PersistError> {
    if wrapped.len() < EPHEMERAL_KEY_LEN + NONCE_LEN + TAG_LEN {
        return Err(PersistError::Encryption("wrapped key file too short".into()));
    }

    let mut ephemeral_public = [0u8; EPHEMERAL_KEY_LEN];
    ephemeral_public.copy_from_slice(&wrapped[..EPHEMERAL_KEY_LEN]);
    let shared = recipient_secret.diffie_hellman(&PublicKey::from(ephemeral_public));

    let kek = Sha256::digest(shared.as_bytes());
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(kek.as_slice()));
    let key_bytes = open(&cipher, &wrapped[EPHEMERAL_KEY_LEN..])
        .map_err(|e| PersistError::Encryption(format!("unwrapping the symmetric key failed: {}", e)))?;

    if key_bytes.len() != 32 {
        return Err(PersistError::Encryption("unwrapped key has wrong length".into()));
    }
    Ok(*Key::<Aes256Gcm>::from_slice(&key_bytes))
}

/// Decrypt one sealed artifact file with the unwrapped symmetric key.
pub fn decrypt_file(path: &Path, file_key: &Key<Aes256Gcm>) -> Result<Vec<u8>, PersistError> {
    let sealed = fs::read(path)
        .map_err(|e| PersistError::Io(format!("failed to read ciphertext {}: {}", path.display(), e)))?;
    if sealed.len() < NONCE_LEN + TAG_LEN {
        return Err(PersistError::Encryption("ciphertext file too short".into()));
    }
    let cipher = Aes256Gcm::new(file_key);
    open(&cipher, &sealed)
        .map_err(|e| PersistError::Encryption(format!("decrypting {} failed: {}", path.display(), e)))
}

fn open(cipher: &Aes256Gcm, sealed: &[u8]) -> Result<Vec<u8>, aes_gcm::Error> {
    let nonce = Nonce::from_slice(&sealed[..NONCE_LEN]);
    cipher.decrypt(nonce, &sealed[NONCE_LEN..])
}
