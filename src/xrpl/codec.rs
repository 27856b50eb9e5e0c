//! Canonical payment serialization and the account-ID codec.
//!
//! The ledger signs and hashes transactions over a deterministic binary
//! form: fields ordered by (type, field) code, XRP amounts as 64-bit
//! values with the positive bit set, account IDs as base58-check in the
//! ledger's own alphabet. Only the Payment shape this pipeline submits
//! is encoded here.

use sha2::{Digest, Sha256, Sha512};

/// The ledger's base58 alphabet. `r` is the zero digit, which is why
/// every classic address starts with one.
const ALPHABET: &[u8; 58] = b"rpshnaf39wBUDNEGHJKLM4PQRST7VWXYZ2bcdeCg65jkm8oFqi1tuvAxyz";

/// Classic address version byte.
const ACCOUNT_ID_VERSION: u8 = 0x00;

/// Single-signature signing prefix ("STX\0").
const PREFIX_SIGN: [u8; 4] = [0x53, 0x54, 0x58, 0x00];
/// Signed-transaction hash prefix ("TXN\0").
const PREFIX_TXN: [u8; 4] = [0x54, 0x58, 0x4E, 0x00];

// Field ids as (type code, field code), listed in canonical order.
const FIELD_TRANSACTION_TYPE: (u8, u8) = (1, 2);
const FIELD_SEQUENCE: (u8, u8) = (2, 4);
const FIELD_LAST_LEDGER_SEQUENCE: (u8, u8) = (2, 27);
const FIELD_AMOUNT: (u8, u8) = (6, 1);
const FIELD_FEE: (u8, u8) = (6, 8);
const FIELD_SIGNING_PUB_KEY: (u8, u8) = (7, 3);
const FIELD_TXN_SIGNATURE: (u8, u8) = (7, 4);
const FIELD_ACCOUNT: (u8, u8) = (8, 1);
const FIELD_DESTINATION: (u8, u8) = (8, 3);

const PAYMENT_TRANSACTION_TYPE: u16 = 0;

/// Positive-XRP discriminator bit in the 64-bit amount encoding.
const XRP_POSITIVE_BIT: u64 = 0x4000_0000_0000_0000;

/// Decode a classic address to its 20-byte account ID, verifying the
/// version byte and the double-SHA256 checksum.
pub fn decode_account_id(address: &str) -> Result<[u8; 20], String> {
    let raw = b58_decode(address)?;
    if raw.len() != 25 {
        return Err(format!(
            "account id must decode to 25 bytes, got {}",
            raw.len()
        ));
    }
    let (payload, checksum) = raw.split_at(21);
    if checksum != &sha256d(payload)[..4] {
        return Err("bad address checksum".into());
    }
    if payload[0] != ACCOUNT_ID_VERSION {
        return Err(format!("unexpected version byte {:#04x}", payload[0]));
    }
    let mut id = [0u8; 20];
    id.copy_from_slice(&payload[1..]);
    Ok(id)
}

/// Encode a 20-byte account ID back to a classic address.
pub fn encode_account_id(id: &[u8; 20]) -> String {
    let mut payload = Vec::with_capacity(25);
    payload.push(ACCOUNT_ID_VERSION);
    payload.extend_from_slice(id);
    let check = sha256d(&payload);
    payload.extend_from_slice(&check[..4]);
    b58_encode(&payload)
}

/// The unsigned fields of one payment instruction, ready for canonical
/// serialization.
#[derive(Debug, Clone)]
pub struct Payment {
    pub account: [u8; 20],
    pub destination: [u8; 20],
    pub amount_drops: u64,
    pub fee_drops: u64,
    pub sequence: u32,
    pub last_ledger_sequence: u32,
    /// 33 bytes: the ED marker plus the ed25519 public key.
    pub signing_pub_key: Vec<u8>,
}

impl Payment {
    /// Bytes the source key signs over.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut out = PREFIX_SIGN.to_vec();
        self.serialize_fields(&mut out, None);
        out
    }

    /// Fully signed canonical blob, ready for `submit`.
    pub fn signed_blob(&self, signature: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        self.serialize_fields(&mut out, Some(signature));
        out
    }

    /// Hash a signed blob the way the ledger identifies transactions:
    /// SHA-512Half over the TXN prefix plus the blob.
    pub fn tx_hash(signed_blob: &[u8]) -> [u8; 32] {
        let mut hasher = Sha512::new();
        hasher.update(PREFIX_TXN);
        hasher.update(signed_blob);
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest[..32]);
        out
    }

    // Canonical order: ascending (type, field). The signature slot sits
    // between SigningPubKey and Account; the signing payload omits it.
    fn serialize_fields(&self, out: &mut Vec<u8>, signature: Option<&[u8]>) {
        field_header(FIELD_TRANSACTION_TYPE, out);
        out.extend_from_slice(&PAYMENT_TRANSACTION_TYPE.to_be_bytes());
        field_header(FIELD_SEQUENCE, out);
        out.extend_from_slice(&self.sequence.to_be_bytes());
        field_header(FIELD_LAST_LEDGER_SEQUENCE, out);
        out.extend_from_slice(&self.last_ledger_sequence.to_be_bytes());
        field_header(FIELD_AMOUNT, out);
        out.extend_from_slice(&(self.amount_drops | XRP_POSITIVE_BIT).to_be_bytes());
        field_header(FIELD_FEE, out);
        out.extend_from_slice(&(self.fee_drops | XRP_POSITIVE_BIT).to_be_bytes());
        field_header(FIELD_SIGNING_PUB_KEY, out);
        write_vl(&self.signing_pub_key, out);
        if let Some(sig) = signature {
            field_header(FIELD_TXN_SIGNATURE, out);
            write_vl(sig, out);
        }
        field_header(FIELD_ACCOUNT, out);
        write_vl(&self.account, out);
        field_header(FIELD_DESTINATION, out);
        write_vl(&self.destination, out);
    }
}

fn field_header((type_code, field_code): (u8, u8), out: &mut Vec<u8>) {
    debug_assert!(type_code < 16);
    if field_code < 16 {
        out.push((type_code << 4) | field_code);
    } else {
        out.push(type_code << 4);
        out.push(field_code);
    }
}

/// Variable-length prefix. Everything in a payment fits the single-byte
/// form (length <= 192).
fn write_vl(data: &[u8], out: &mut Vec<u8>) {
    debug_assert!(data.len() <= 192);
    out.push(data.len() as u8);
    out.extend_from_slice(data);
}

fn sha256d(data: &[u8]) -> [u8; 32] {
    Sha256::digest(Sha256::digest(data)).into()
}

fn b58_decode(s: &str) -> Result<Vec<u8>, String> {
    let mut big: Vec<u8> = Vec::new(); // big-endian byte accumulator
    for ch in s.bytes() {
        let idx = ALPHABET
            .iter()
            .position(|&a| a == ch)
            .ok_or_else(|| format!("invalid base58 character {:?}", ch as char))? as u32;
        let mut carry = idx;
        for b in big.iter_mut().rev() {
            carry += (*b as u32) * 58;
            *b = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            big.insert(0, (carry & 0xff) as u8);
            carry >>= 8;
        }
    }
    let zeros = s.bytes().take_while(|&c| c == ALPHABET[0]).count();
    let mut out = vec![0u8; zeros];
    out.extend(big);
    Ok(out)
}

fn b58_encode(data: &[u8]) -> String {
    let zeros = data.iter().take_while(|&&b| b == 0).count();
    let mut digits: Vec<u8> = Vec::new(); // base58 digits, little-endian
    for &byte in data {
        let mut carry = byte as u32;
        for d in digits.iter_mut() {
            carry += (*d as u32) << 8;
            *d = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }
    let mut out = String::with_capacity(zeros + digits.len());
    for _ in 0..zeros {
        out.push(ALPHABET[0] as char);
    }
    for &d in digits.iter().rev() {
        out.push(ALPHABET[d as usize] as char);
    }
    out
}
