use wasm_bindgen::prelude::*;

use crate::format::{format_money, format_money_f64, format_percent, MoneyFormat};

/// Format an amount, e.g. `-$1,234.50`.
#[wasm_bindgen(js_name = formatMoney)]
pub fn js_format_money(value: f64, options: Option<MoneyFormat>) -> String {
    format_money_f64(value, options.unwrap_or_default())
}

/// Format a decimal string amount without loss of precision.
#[wasm_bindgen(js_name = formatMoneyDecimal)]
pub fn js_format_money_decimal(value: &str, options: Option<MoneyFormat>) -> crate::Result<String> {
    let value = value
        .trim()
        .parse()
        .map_err(|err| crate::Error::custom(format!("invalid amount `{value}`: {err}")))?;
    Ok(format_money(value, options.unwrap_or_default()))
}

/// Format a percentage, e.g. `+5.13%`.
#[wasm_bindgen(js_name = formatPercent)]
pub fn js_format_percent(value: f64, sign: Option<bool>) -> String {
    format_percent(value, sign.unwrap_or(false))
}
