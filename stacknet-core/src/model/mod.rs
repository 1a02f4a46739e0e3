//! Network composition, training orchestration and the persisted document
//! schema.

pub mod network;
pub mod schema;

pub use network::Network;
pub use schema::{LayerDocument, LayerParamsDocument, NetworkDocument, NetworkSection};
