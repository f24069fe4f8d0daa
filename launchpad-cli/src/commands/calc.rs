//! Offline curve calculator
//!
//! Prices a trade from raw curve inputs with `lib-curve` alone. The
//! arithmetic is the engine's own, so results match what a live pool in the
//! same position would quote.

use lib_curve::{
    average_price, bps_of, buy_cost, checked_add, checked_div, checked_sub, current_price,
    sell_return, PoolConfig, BPS_DENOMINATOR, U256,
};
use serde_json::json;

use crate::argument_parsing::{CalcAction, CurveInputs};
use crate::error::{CliError, CliResult};
use crate::output::Report;

/// Result of an offline calculation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveCalculation {
    pub kind: &'static str,
    /// Gross curve value
    pub value: U256,
    pub fee: U256,
    /// Buyer pays / seller receives
    pub total: U256,
    pub sold_after: U256,
    pub price_before: U256,
    pub price_after: U256,
    /// Floor of `value / amount`
    pub average_price: U256,
}

fn curve(inputs: &CurveInputs) -> CliResult<PoolConfig> {
    if inputs.amount.is_zero() {
        return Err(CliError::InvalidArgument(
            "amount must be greater than zero".to_string(),
        ));
    }
    if u64::from(inputs.fee_bps) > BPS_DENOMINATOR {
        return Err(CliError::InvalidArgument(format!(
            "fee_bps {} exceeds {}",
            inputs.fee_bps, BPS_DENOMINATOR
        )));
    }
    // Supply bounds are a pool concern; the calculator prices any span
    Ok(PoolConfig::new(inputs.base_price, inputs.slope, U256::MAX, U256::MAX))
}

pub fn calculate_buy(inputs: &CurveInputs) -> CliResult<CurveCalculation> {
    let config = curve(inputs)?;
    let value = buy_cost(&config, inputs.sold, inputs.amount)?;
    let fee = bps_of(value, inputs.fee_bps)?;
    let sold_after = checked_add(inputs.sold, inputs.amount)?;

    Ok(CurveCalculation {
        kind: "buy",
        value,
        fee,
        total: checked_add(value, fee)?,
        sold_after,
        price_before: current_price(&config, inputs.sold)?,
        price_after: current_price(&config, sold_after)?,
        average_price: average_price(&config, inputs.sold, inputs.amount)?,
    })
}

pub fn calculate_sell(inputs: &CurveInputs) -> CliResult<CurveCalculation> {
    let config = curve(inputs)?;
    let value = sell_return(&config, inputs.sold, inputs.amount)?;
    let fee = bps_of(value, inputs.fee_bps)?;
    let sold_after = checked_sub(inputs.sold, inputs.amount)?;

    Ok(CurveCalculation {
        kind: "sell",
        value,
        fee,
        total: checked_sub(value, fee)?,
        sold_after,
        price_before: current_price(&config, inputs.sold)?,
        price_after: current_price(&config, sold_after)?,
        average_price: checked_div(value, inputs.amount)?,
    })
}

pub fn handle_calc_command(action: &CalcAction, report: &Report) -> CliResult<()> {
    let (inputs, calc) = match action {
        CalcAction::Buy(inputs) => (inputs, calculate_buy(inputs)?),
        CalcAction::Sell(inputs) => (inputs, calculate_sell(inputs)?),
    };

    report.show(&json!({
        "kind": calc.kind,
        "amount": inputs.amount.to_string(),
        "fee_bps": inputs.fee_bps,
        "value": calc.value.to_string(),
        "fee": calc.fee.to_string(),
        "total": calc.total.to_string(),
        "sold_after": calc.sold_after.to_string(),
        "price_before": calc.price_before.to_string(),
        "price_after": calc.price_after.to_string(),
        "average_price": calc.average_price.to_string(),
    }))
}
