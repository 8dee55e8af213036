//! Orderbook wire model
//!
//! Field names and value encodings follow the exchange's order schema
//! exactly: integers that can exceed 64 bits travel as decimal strings,
//! discriminants as small integers.

use serde::{Deserialize, Serialize};

/// Kind of asset moved by an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ItemType {
    Native,
    /// Fungible token
    Erc20,
    Erc721,
    Erc1155,
}

impl From<ItemType> for u8 {
    fn from(t: ItemType) -> u8 {
        match t {
            ItemType::Native => 0,
            ItemType::Erc20 => 1,
            ItemType::Erc721 => 2,
            ItemType::Erc1155 => 3,
        }
    }
}

impl TryFrom<u8> for ItemType {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(ItemType::Native),
            1 => Ok(ItemType::Erc20),
            2 => Ok(ItemType::Erc721),
            3 => Ok(ItemType::Erc1155),
            other => Err(format!("unsupported item type {}", other)),
        }
    }
}

/// Who may fulfil the order and whether partial fills are allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum OrderType {
    /// Anyone may fulfil, no partial fills
    FullOpen,
    PartialOpen,
    FullRestricted,
    PartialRestricted,
}

impl From<OrderType> for u8 {
    fn from(t: OrderType) -> u8 {
        match t {
            OrderType::FullOpen => 0,
            OrderType::PartialOpen => 1,
            OrderType::FullRestricted => 2,
            OrderType::PartialRestricted => 3,
        }
    }
}

impl TryFrom<u8> for OrderType {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(OrderType::FullOpen),
            1 => Ok(OrderType::PartialOpen),
            2 => Ok(OrderType::FullRestricted),
            3 => Ok(OrderType::PartialRestricted),
            other => Err(format!("unsupported order type {}", other)),
        }
    }
}

/// What the offerer gives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferItem {
    pub item_type: ItemType,
    pub token: String,
    pub identifier_or_criteria: String,
    pub start_amount: String,
    pub end_amount: String,
}

/// What the offerer (or a third party) receives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsiderationItem {
    pub item_type: ItemType,
    pub token: String,
    pub identifier_or_criteria: String,
    pub start_amount: String,
    pub end_amount: String,
    pub recipient: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderParameters {
    pub offerer: String,
    pub zone: String,
    pub order_type: OrderType,
    pub start_time: String,
    pub end_time: String,
    pub zone_hash: String,
    pub salt: String,
    pub offer: Vec<OfferItem>,
    pub consideration: Vec<ConsiderationItem>,
    pub total_original_consideration_items: u32,
    pub conduit_key: String,
    pub counter: String,
}

/// Order as submitted to the orderbook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderData {
    pub orderbook: String,
    pub chain_id: String,
    pub parameters: OrderParameters,
    pub signature: String,
}
