//! EVM address helpers (EIP-55 checksums, format checks)

use sha3::{Digest, Keccak256};

/// Render 20 bytes as an EIP-55 checksummed address
pub fn to_checksum_address(bytes: &[u8; 20]) -> String {
    let lower = hex::encode(bytes);
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let shift = if i % 2 == 0 { 4 } else { 0 };
        let nibble = (hash[i / 2] >> shift) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Deterministic contract address for a named token: the first 20 bytes of
/// `keccak256(name)`
pub fn derive_token_address(name: &str) -> String {
    let digest = Keccak256::digest(name.as_bytes());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[..20]);
    to_checksum_address(&bytes)
}

/// `0x` followed by 40 hex digits, any case
pub fn is_address(s: &str) -> bool {
    match s.strip_prefix("0x") {
        Some(body) => body.len() == 40 && hex::decode(body).is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eip55_reference_vector() {
        let bytes: [u8; 20] = hex::decode("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed")
            .unwrap()
            .try_into()
            .unwrap();
        assert_eq!(
            to_checksum_address(&bytes),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }

    #[test]
    fn test_token_address_is_stable() {
        let a = derive_token_address("Premium .eth Bundle Token");
        let b = derive_token_address("Premium .eth Bundle Token");
        assert_eq!(a, b);
        assert!(is_address(&a));
        assert_ne!(a, derive_token_address("Gaming Domains Pro Bundle Token"));
    }

    #[test]
    fn test_is_address() {
        assert!(is_address("0x0000000000000000000000000000000000000000"));
        assert!(is_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
        assert!(!is_address("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
        assert!(!is_address("0x1234...5678"));
        assert!(!is_address("0xzz00000000000000000000000000000000000000"));
    }
}
