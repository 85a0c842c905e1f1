//! x402 agent payments
//!
//! An agent pays an HTTP 402 payment request by borrowing the amount against
//! its own position and sending it straight to the recipient. Payment ids are
//! single-use.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use legasi_common::{
    to_usd6, AccountId, AssetId, LegasiError, Result, MAX_X402_PAYMENT_USD6,
};

use crate::context::ProtocolContext;
use crate::lending::LendingController;

/// Payment requested by a 402 response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct X402PaymentRequest {
    pub payment_id: String,
    pub recipient: AccountId,
    pub asset: AssetId,
    /// Native units of `asset`
    pub amount: u64,
    /// Unix seconds after which the request is void
    pub expires_at: i64,
    #[serde(default)]
    pub memo: Option<String>,
}

/// Proof of a settled payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct X402Receipt {
    pub receipt_id: Uuid,
    pub payment_id: String,
    pub payer: AccountId,
    pub recipient: AccountId,
    pub asset: AssetId,
    pub amount: u64,
    pub amount_usd6: u64,
    pub paid_at: i64,
}

/// Running totals per paying agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct X402Stats {
    pub payments: u64,
    pub total_paid_usd6: u64,
    pub last_payment_at: i64,
}

/// Settles x402 requests through the lending path
#[derive(Debug)]
pub struct X402Gateway {
    ctx: Arc<ProtocolContext>,
    lending: LendingController,
    receipts: DashMap<String, X402Receipt>,
    stats: DashMap<AccountId, X402Stats>,
}

impl X402Gateway {
    pub fn new(ctx: Arc<ProtocolContext>, lending: LendingController) -> Self {
        Self {
            ctx,
            lending,
            receipts: DashMap::new(),
            stats: DashMap::new(),
        }
    }

    /// Borrow and pay `request` on behalf of `account`
    #[instrument(skip(self, request), fields(payment_id = %request.payment_id))]
    pub fn pay(&self, account: &AccountId, request: &X402PaymentRequest) -> Result<X402Receipt> {
        let enabled = self
            .ctx
            .agents
            .get(account)
            .map(|agent| agent.x402_enabled)
            .unwrap_or(false);
        if !enabled {
            return Err(LegasiError::X402Disabled(account.clone()));
        }

        let now = self.ctx.now();
        if now > request.expires_at {
            return Err(LegasiError::PaymentExpired {
                expires_at: request.expires_at,
            });
        }
        if request.amount == 0 {
            return Err(LegasiError::InvalidAmount);
        }
        let config = self.ctx.markets.active_borrowable(&request.asset)?;
        let amount_usd6 = to_usd6(request.amount, config.decimals)?;
        if amount_usd6 > MAX_X402_PAYMENT_USD6 {
            return Err(LegasiError::InvalidAmount);
        }

        let receipt = match self.receipts.entry(request.payment_id.clone()) {
            Entry::Occupied(_) => {
                return Err(LegasiError::DuplicatePayment(request.payment_id.clone()));
            }
            Entry::Vacant(slot) => {
                self.lending
                    .borrow_to(account, &request.recipient, &request.asset, request.amount)?;
                let receipt = X402Receipt {
                    receipt_id: Uuid::now_v7(),
                    payment_id: request.payment_id.clone(),
                    payer: account.clone(),
                    recipient: request.recipient.clone(),
                    asset: request.asset.clone(),
                    amount: request.amount,
                    amount_usd6,
                    paid_at: now,
                };
                slot.insert(receipt.clone());
                receipt
            }
        };

        let mut stats = self.stats.entry(account.clone()).or_default();
        stats.payments += 1;
        stats.total_paid_usd6 = stats.total_paid_usd6.saturating_add(amount_usd6);
        stats.last_payment_at = now;

        info!(
            payer = %account,
            recipient = %request.recipient,
            amount_usd6,
            memo = request.memo.as_deref().unwrap_or(""),
            "x402 payment settled"
        );
        Ok(receipt)
    }

    pub fn receipt(&self, payment_id: &str) -> Option<X402Receipt> {
        self.receipts.get(payment_id).map(|r| r.clone())
    }

    pub fn stats(&self, account: &AccountId) -> X402Stats {
        self.stats.get(account).map(|s| *s).unwrap_or_default()
    }
}
