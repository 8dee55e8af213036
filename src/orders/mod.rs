//! Order construction for the external orderbook

pub mod builder;
pub mod model;
pub mod units;

pub use builder::OrderBuilder;
pub use model::{ConsiderationItem, ItemType, OfferItem, OrderData, OrderParameters, OrderType};
pub use units::{from_base_units, to_base_units};
