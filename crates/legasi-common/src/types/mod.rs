//! Core data model for the Legasi risk engine

pub mod agent;
pub mod asset;
pub mod gad;
pub mod ids;
pub mod position;
pub mod price;
pub mod reputation;
pub mod units;
