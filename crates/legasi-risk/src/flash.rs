//! Flash loan fee

use legasi_common::{BPS_DENOMINATOR, FLASH_LOAN_FEE_BPS, MIN_FLASH_LOAN_FEE};

/// Fee owed on a flash loan of `amount` native units
///
/// 9 bps of the principal, rounded down, never below one native unit.
pub fn flash_fee(amount: u64) -> u64 {
    let fee = amount as u128 * FLASH_LOAN_FEE_BPS as u128 / BPS_DENOMINATOR as u128;
    (fee as u64).max(MIN_FLASH_LOAN_FEE)
}
