//! External collaborators: clock, price source, token custody

pub mod clock;
pub mod custody;
pub mod oracle;

pub use clock::{Clock, ManualClock, SystemClock};
pub use custody::{InMemoryCustody, TokenCustody};
pub use oracle::{InMemoryPriceFeed, PriceSource};
