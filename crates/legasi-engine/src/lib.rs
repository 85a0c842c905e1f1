//! # Legasi Engine
//!
//! Stateful side of the Legasi lending protocol: the position ledger,
//! reputation store, agent limits, lending and GAD controllers, LP vault,
//! flash loans and x402 payments, all driven through [`LegasiProtocol`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     LegasiProtocol                       │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐    │
//! │  │   Lending    │  │     GAD      │  │    x402      │    │
//! │  │  Controller  │  │  Controller  │  │   Gateway    │    │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘    │
//! │         │                 │                 │            │
//! │  ┌──────┴─────────────────┴─────────────────┴───────┐    │
//! │  │                 ProtocolContext                  │    │
//! │  │  ledger · reputation · agents · markets · vault  │    │
//! │  └──────┬─────────────────┬─────────────────┬───────┘    │
//! │         │                 │                 │            │
//! │     Clock            PriceSource      TokenCustody       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Risk math lives in `legasi-risk`; nothing here recomputes a formula.

pub mod agent;
pub mod config;
pub mod context;
pub mod flash;
pub mod gad;
pub mod infra;
pub mod keeper;
pub mod ledger;
pub mod lending;
pub mod market;
pub mod protocol;
pub mod reputation;
pub mod scenario;
pub mod vault;
pub mod x402;

pub use config::EngineConfig;
pub use context::ProtocolContext;
pub use flash::{FlashLender, FlashLoan, FlashReceipt};
pub use gad::{CrankOutcome, GadController, GadExecution, SeizedCollateral};
pub use infra::{Clock, InMemoryCustody, InMemoryPriceFeed, ManualClock, PriceSource, SystemClock, TokenCustody};
pub use keeper::{GadKeeper, SweepReport};
pub use lending::{LendingController, RepayOutcome};
pub use protocol::LegasiProtocol;
pub use scenario::{Scenario, ScenarioReport, ScenarioRunner, Step};
pub use vault::{LpPool, LpVault};
pub use x402::{X402PaymentRequest, X402Receipt, X402Stats};

/// Engine version
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
