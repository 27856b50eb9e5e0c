//! Wallet credential loading.
//!
//! Two credential files per run: the source (signing) wallet and the
//! vault (destination) wallet. Both carry the same four fields and both
//! are validated on load; signing material is only ever decoded for the
//! source, and only on the live path.

use std::fs;
use std::path::Path;

use ed25519_dalek::SigningKey;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::PipelineError;

#[derive(Debug, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    seed: Option<String>,
    #[serde(default)]
    public_key: Option<String>,
    #[serde(default)]
    private_key: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

/// A validated wallet credential. Immutable for the run's lifetime and
/// never written back. Secret fields redact themselves in Debug output.
#[derive(Debug)]
pub struct WalletCredential {
    pub address: String,
    pub public_key: String,
    private_key: SecretString,
    seed: SecretString,
}

impl WalletCredential {
    /// Load and validate a credential file. No side effects.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::MissingFile(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path).map_err(|e| PipelineError::InvalidCredential {
            path: path.to_path_buf(),
            reason: format!("unreadable: {e}"),
        })?;
        Self::parse(&raw).map_err(|reason| PipelineError::InvalidCredential {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse and validate the JSON body. Split from `load` so the
    /// validation rules are testable without a filesystem.
    fn parse(raw: &str) -> Result<Self, String> {
        let file: CredentialFile =
            serde_json::from_str(raw).map_err(|e| format!("malformed JSON: {e}"))?;

        Ok(Self {
            address: required("address", file.address)?,
            public_key: required("public_key", file.public_key)?,
            private_key: SecretString::from(required("private_key", file.private_key)?),
            seed: SecretString::from(required("seed", file.seed)?),
        })
    }

    pub fn seed(&self) -> &SecretString {
        &self.seed
    }

    /// Decode the ed25519 signing key and cross-check it against the
    /// recorded public key. Only the live path calls this.
    pub fn signing_key(&self) -> Result<SigningKey, String> {
        let sk_bytes = decode_key_hex(self.private_key.expose_secret())?;
        let signing_key = SigningKey::from_bytes(&sk_bytes);
        let pk_bytes = decode_key_hex(&self.public_key)?;
        if signing_key.verifying_key().to_bytes() != pk_bytes {
            return Err("public key does not match signing key".into());
        }
        Ok(signing_key)
    }
}

fn required(name: &str, value: Option<String>) -> Result<String, String> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(format!("missing or empty field `{name}`")),
    }
}

/// Key material is hex, optionally carrying the ledger's ED marker byte.
fn decode_key_hex(raw: &str) -> Result<[u8; 32], String> {
    let trimmed = raw.trim();
    let hex_part = if trimmed.len() == 66 && trimmed[..2].eq_ignore_ascii_case("ed") {
        &trimmed[2..]
    } else {
        trimmed
    };
    let bytes = hex::decode(hex_part).map_err(|e| format!("bad key hex: {e}"))?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| format!("key must be 32 bytes, got {}", bytes.len()))
}
