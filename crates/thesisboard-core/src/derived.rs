//! Derived fields: recomputed from live and manual values every cycle.
//!
//! Nothing here is a source of truth. Every division goes through
//! [`safe_div`] or [`Drops::percent_of`], so a missing or zero denominator
//! yields `None` rather than NaN or infinity.

use crate::amount::{Drops, safe_div};
use crate::state::{DerivedFields, FlowDay, StateBlob};

/// Initial ledger supply: 100 billion native units.
pub const INITIAL_SUPPLY_DROPS: Drops = Drops::from_native(100_000_000_000);

pub fn compute_derived(state: &StateBlob) -> DerivedFields {
    let price = state.price.value.usd;
    let flows = &state.flows.value;
    let ledger = &state.ledger.value;

    let flow_sum_7d_usd = rolling_sum(&flows.days, 7);
    let flow_sum_30d_usd = rolling_sum(&flows.days, 30);

    let burned_drops = ledger
        .total_coins_drops
        .and_then(|total| INITIAL_SUPPLY_DROPS.checked_sub(total));

    let tracked_pct_of_supply = match (ledger.tracked_balance_drops, ledger.total_coins_drops) {
        (Some(tracked), Some(total)) => tracked.percent_of(total),
        _ => None,
    };

    let volume_progress_pct = safe_div(
        state.manual.get_f64("volume_achieved_usd"),
        state.manual.get_f64("volume_target_usd"),
    )
    .map(|ratio| ratio * 100.0);

    let yield_spread_10y_2y = match (state.yields.value.us_10y, state.yields.value.us_2y) {
        (Some(long), Some(short)) => Some(long - short),
        _ => None,
    };

    DerivedFields {
        flow_sum_7d_usd,
        flow_sum_30d_usd,
        flow_sum_7d_native: safe_div(flow_sum_7d_usd, price),
        currency_volume_native: safe_div(flows.currency_volume_usd, price),
        burned_drops,
        burned_native: burned_drops.map(Drops::to_native),
        tracked_pct_of_supply,
        volume_progress_pct,
        yield_spread_10y_2y,
    }
}

/// Sum of the newest `window` days. Shorter histories sum what is there;
/// an empty history has no sum.
fn rolling_sum(days: &[FlowDay], window: usize) -> Option<f64> {
    if days.is_empty() {
        return None;
    }
    let sum: f64 = days.iter().take(window).map(|d| d.net_flow_usd).sum();
    sum.is_finite().then_some(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn days(values: &[f64]) -> Vec<FlowDay> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| FlowDay {
                date: format!("2026-10-{:02}", 17 - i),
                net_flow_usd: *v,
            })
            .collect()
    }

    #[test]
    fn flow_windows_take_newest_days() {
        let mut state = StateBlob::default();
        state.flows.value.days = days(&[10.0; 40]);
        let d = compute_derived(&state);
        assert_eq!(d.flow_sum_7d_usd, Some(70.0));
        assert_eq!(d.flow_sum_30d_usd, Some(300.0));
    }

    #[test]
    fn short_history_sums_available_days() {
        let mut state = StateBlob::default();
        state.flows.value.days = days(&[5.0, -2.0]);
        let d = compute_derived(&state);
        assert_eq!(d.flow_sum_7d_usd, Some(3.0));
        assert_eq!(d.flow_sum_30d_usd, Some(3.0));
    }

    #[test]
    fn native_conversion_needs_a_price() {
        let mut state = StateBlob::default();
        state.flows.value.days = days(&[100.0]);
        state.flows.value.currency_volume_usd = Some(50.0);

        let d = compute_derived(&state);
        assert_eq!(d.flow_sum_7d_native, None);
        assert_eq!(d.currency_volume_native, None);

        state.price.value.usd = Some(0.0);
        let d = compute_derived(&state);
        assert_eq!(d.flow_sum_7d_native, None);
        assert_eq!(d.currency_volume_native, None);

        state.price.value.usd = Some(2.0);
        let d = compute_derived(&state);
        assert_eq!(d.flow_sum_7d_native, Some(50.0));
        assert_eq!(d.currency_volume_native, Some(25.0));
    }

    #[test]
    fn burned_supply_is_exact() {
        let mut state = StateBlob::default();
        state.ledger.value.total_coins_drops = Some("99985687626634189".parse().unwrap());
        let d = compute_derived(&state);
        assert_eq!(d.burned_drops, Some(Drops::new(14_312_373_365_811)));
        let native = d.burned_native.unwrap();
        assert!((native - 14_312_373.365811).abs() < 1e-6);
    }

    #[test]
    fn pct_of_supply_guards_zero_total() {
        let mut state = StateBlob::default();
        state.ledger.value.tracked_balance_drops = Some(Drops::new(10));
        state.ledger.value.total_coins_drops = Some(Drops::new(0));
        assert_eq!(compute_derived(&state).tracked_pct_of_supply, None);

        state.ledger.value.total_coins_drops = Some(Drops::new(1000));
        assert_eq!(compute_derived(&state).tracked_pct_of_supply, Some(1.0));
    }

    #[test]
    fn volume_progress_guards_zero_target() {
        let mut state = StateBlob::default();
        state.manual.0.insert("volume_achieved_usd".into(), json!(300));
        state.manual.0.insert("volume_target_usd".into(), json!(0));
        assert_eq!(compute_derived(&state).volume_progress_pct, None);

        state.manual.0.insert("volume_target_usd".into(), json!(1200));
        assert_eq!(compute_derived(&state).volume_progress_pct, Some(25.0));
    }

    #[test]
    fn empty_state_derives_all_none() {
        let d = compute_derived(&StateBlob::default());
        assert_eq!(d, DerivedFields::default());
        let json = serde_json::to_string(&d).unwrap();
        assert!(!json.contains("NaN"));
        assert!(!json.contains("inf"));
    }
}
