//! Ed25519 challenge signing
//!
//! Account keys are base58 strings holding either the 64-byte keypair form
//! (seed followed by public key) or a bare 32-byte seed. Signatures and
//! addresses are base58 encoded.

use ed25519_dalek::{Signer as _, SigningKey};
use rewardpilot_core::Signer;
use rewardpilot_domain::{KeyHandle, Result, RewardPilotError};

const SEED_LEN: usize = 32;
const KEYPAIR_LEN: usize = 64;

/// Signs challenges with the account's Ed25519 key.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Signer;

impl Signer for Ed25519Signer {
    fn sign(&self, message: &[u8], key: &KeyHandle) -> Result<String> {
        let signing_key = signing_key(key)?;
        Ok(bs58::encode(signing_key.sign(message).to_bytes()).into_string())
    }
}

/// Base58 public key (the wallet address) for `key`.
///
/// # Errors
/// Returns `RewardPilotError::Signing` if the key is not valid base58 or
/// has the wrong length.
pub fn derive_address(key: &KeyHandle) -> Result<String> {
    let signing_key = signing_key(key)?;
    Ok(bs58::encode(signing_key.verifying_key().as_bytes()).into_string())
}

fn signing_key(key: &KeyHandle) -> Result<SigningKey> {
    let bytes = bs58::decode(key.expose().trim())
        .into_vec()
        .map_err(|e| RewardPilotError::Signing(format!("private key is not base58: {e}")))?;

    match bytes.len() {
        KEYPAIR_LEN => {
            let mut keypair = [0u8; KEYPAIR_LEN];
            keypair.copy_from_slice(&bytes);
            SigningKey::from_keypair_bytes(&keypair)
                .map_err(|e| RewardPilotError::Signing(format!("rejected private key: {e}")))
        }
        SEED_LEN => {
            let mut seed = [0u8; SEED_LEN];
            seed.copy_from_slice(&bytes);
            Ok(SigningKey::from_bytes(&seed))
        }
        other => Err(RewardPilotError::Signing(format!(
            "private key must be {SEED_LEN} or {KEYPAIR_LEN} bytes, got {other}"
        ))),
    }
}
