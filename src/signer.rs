use crate::orders::OrderData;

/// Stand-in for an unsigned order: `0x` + 65 zero bytes
pub const PLACEHOLDER_SIGNATURE: &str = concat!(
    "0x",
    "0000000000000000000000000000000000000000000000000000000000000000",
    "0000000000000000000000000000000000000000000000000000000000000000",
    "00"
);

/// Signs orders before they reach the orderbook.
///
/// Key custody and the actual cryptography live with the implementor;
/// the core only needs the 0x-prefixed signature string back.
pub trait OrderSigner: Send + Sync {
    fn sign_order(&self, order: &OrderData) -> crate::core::Result<String>;
    fn signer_type(&self) -> SignerType;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerType { Placeholder, External }

/// Leaves orders unsigned
pub struct PlaceholderSigner;

impl OrderSigner for PlaceholderSigner {
    fn sign_order(&self, _order: &OrderData) -> crate::core::Result<String> {
        Ok(PLACEHOLDER_SIGNATURE.to_string())
    }
    fn signer_type(&self) -> SignerType { SignerType::Placeholder }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_shape() {
        assert_eq!(PLACEHOLDER_SIGNATURE.len(), 2 + 130);
        assert!(PLACEHOLDER_SIGNATURE[2..].chars().all(|c| c == '0'));
    }
}
