//! Pure conversions between MyPts amounts and currency amounts.
//! The numeric values are never pre-rounded; only display strings are fixed
//! to two decimals, so repeated conversions do not compound rounding error.

use serde::Serialize;

use crate::error::ClientError;
use crate::rates::ResolvedRate;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyValue {
    pub total_value: f64,
    pub formatted: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyPtsValue {
    pub my_pts: f64,
    pub formatted: String,
}

pub fn to_currency(my_pts: f64, rate: &ResolvedRate) -> CurrencyValue {
    let total_value = my_pts * rate.value_per_my_pt;
    CurrencyValue {
        total_value,
        formatted: format!("{}{:.2}", rate.symbol, total_value),
    }
}

/// Inverse conversion. A resolver never hands out a zero rate, but the
/// calculator still refuses to divide by one.
pub fn to_my_pts(currency_amount: f64, rate: &ResolvedRate) -> Result<MyPtsValue, ClientError> {
    if rate.value_per_my_pt == 0.0 {
        return Err(ClientError::DivisionByZero);
    }

    let my_pts = currency_amount / rate.value_per_my_pt;
    Ok(MyPtsValue {
        my_pts,
        formatted: format!("{:.2} MyPts", my_pts),
    })
}
