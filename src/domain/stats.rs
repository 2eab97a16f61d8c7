// Dashboard statistics
// Pure aggregation over a user's transactions and positions

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use super::catalog::Opportunity;
use super::ledger::Position;

/// Transaction amounts summed per day, ISO week and month
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionStats {
    pub daily: BTreeMap<String, Decimal>,
    pub weekly: BTreeMap<String, Decimal>,
    pub monthly: BTreeMap<String, Decimal>,
}

/// Groups `(created_at, amount)` pairs
///
/// Keys are `YYYY-MM-DD`, `{isoWeek}-{year}` and `{month}-{year}`.
pub fn transaction_stats<I>(transactions: I) -> TransactionStats
where
    I: IntoIterator<Item = (DateTime<Utc>, Decimal)>,
{
    let mut stats = TransactionStats::default();
    for (at, amount) in transactions {
        *stats
            .daily
            .entry(at.format("%Y-%m-%d").to_string())
            .or_default() += amount;
        *stats
            .weekly
            .entry(format!("{}-{}", at.iso_week().week(), at.year()))
            .or_default() += amount;
        *stats
            .monthly
            .entry(format!("{}-{}", at.month(), at.year()))
            .or_default() += amount;
    }
    stats
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentStats {
    pub total_investment: i64,
    pub active_investment: i64,
    pub gross_yield: Decimal,
    pub net_yield: Decimal,
    pub potential_equity: Decimal,
}

/// Summarises positions valued at the opportunity's current unit price
///
/// There is no fee model, so net yield equals gross yield.
pub fn investment_stats<'a, I>(holdings: I) -> InvestmentStats
where
    I: IntoIterator<Item = (&'a Position, &'a Opportunity)>,
{
    let mut stats = InvestmentStats::default();
    for (position, opportunity) in holdings {
        stats.total_investment += i64::from(position.total_investment());
        if position.is_active() {
            stats.active_investment += 1;
            let market_value = opportunity.amount * Decimal::from(position.quantity());
            stats.gross_yield += market_value - position.purchase_price();
        }
        stats.potential_equity += position.purchase_price() * (Decimal::ONE + opportunity.growth());
    }
    stats.net_yield = stats.gross_yield;
    stats.potential_equity = stats.potential_equity.round_dp(2);
    stats
}
