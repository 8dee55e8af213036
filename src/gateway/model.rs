use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedOrder {
    pub order_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceFee {
    pub fee_recipient: String,
    pub basis_points: u32,
    pub fee_type: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeeSchedule {
    #[serde(default)]
    pub marketplace_fees: Vec<MarketplaceFee>,
}

impl FeeSchedule {
    pub fn total_basis_points(&self) -> u32 {
        self.marketplace_fees.iter().map(|f| f.basis_points).sum()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    // Native currency has no contract
    #[serde(default)]
    pub contract_address: Option<String>,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CurrenciesResponse {
    #[serde(default)]
    pub currencies: Vec<Currency>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CancelListingRequest {
    pub order_id: String,
    pub signature: String,
}
