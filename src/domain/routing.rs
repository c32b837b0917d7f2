//! Vendor scoring and selection.
//!
//! Candidates are ordered by uptime (descending), then error rate
//! (ascending), then fee for the payment amount (ascending). A vendor without
//! an applicable pricing model is treated as infinitely expensive, so it only
//! wins when nothing else is left.

use super::vendor::VendorHealth;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeSet;

fn compare_fees(a: Option<Decimal>, b: Option<Decimal>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Returns the eligible candidates, best first.
///
/// Down vendors and vendors in `excluded` are dropped. `fee` is looked up
/// once per remaining vendor.
pub fn rank<'a, F>(
    candidates: &'a [VendorHealth],
    excluded: &BTreeSet<String>,
    fee: F,
) -> Vec<&'a VendorHealth>
where
    F: Fn(&str) -> Option<Decimal>,
{
    let mut scored: Vec<(&VendorHealth, Option<Decimal>)> = candidates
        .iter()
        .filter(|v| !v.down && !excluded.contains(&v.vendor_id))
        .map(|v| (v, fee(&v.vendor_id)))
        .collect();

    scored.sort_by(|(a, fee_a), (b, fee_b)| {
        b.uptime_score
            .total_cmp(&a.uptime_score)
            .then_with(|| a.error_rate.total_cmp(&b.error_rate))
            .then_with(|| compare_fees(*fee_a, *fee_b))
    });

    scored.into_iter().map(|(v, _)| v).collect()
}

/// Picks the best vendor, or `None` when every candidate is down or excluded.
pub fn select<'a, F>(
    candidates: &'a [VendorHealth],
    excluded: &BTreeSet<String>,
    fee: F,
) -> Option<&'a VendorHealth>
where
    F: Fn(&str) -> Option<Decimal>,
{
    rank(candidates, excluded, fee).into_iter().next()
}
