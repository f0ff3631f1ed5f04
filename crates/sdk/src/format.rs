use num_format::{Locale, ToFormattedString};
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Options of [`format_money`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(js, derive(tsify_next::Tsify))]
#[cfg_attr(js, tsify(from_wasm_abi))]
#[serde(default)]
pub struct MoneyFormat {
    /// Prefix positive values with `+`.
    pub sign: bool,
    /// Prefix with `$`.
    pub currency: bool,
}

impl Default for MoneyFormat {
    fn default() -> Self {
        Self {
            sign: false,
            currency: true,
        }
    }
}

impl MoneyFormat {
    /// Show the sign of positive values too.
    pub fn signed() -> Self {
        Self {
            sign: true,
            ..Default::default()
        }
    }
}

fn sign_prefix(negative: bool, positive: bool, options: &MoneyFormat) -> &'static str {
    if negative {
        "-"
    } else if positive && options.sign {
        "+"
    } else {
        ""
    }
}

/// Format an amount with two decimals and thousands separators,
/// e.g. `-$1,234.50`.
pub fn format_money(value: Decimal, options: MoneyFormat) -> String {
    let prefix = sign_prefix(value.is_sign_negative() && !value.is_zero(), value > Decimal::ZERO, &options);
    let symbol = if options.currency { "$" } else { "" };
    format!("{prefix}{symbol}{}", format_abs(value))
}

/// Same as [`format_money`] for floating point amounts.
pub fn format_money_f64(value: f64, options: MoneyFormat) -> String {
    match Decimal::try_from(value) {
        Ok(value) => format_money(value, options),
        Err(_) => {
            let prefix = sign_prefix(value < 0.0, value > 0.0, &options);
            let symbol = if options.currency { "$" } else { "" };
            format!("{prefix}{symbol}{:.2}", value.abs())
        }
    }
}

/// Format a percentage with two decimals, e.g. `+5.13%`.
pub fn format_percent(value: f64, sign: bool) -> String {
    let prefix = if value >= 0.0 && sign { "+" } else { "" };
    format!("{prefix}{value:.2}%")
}

fn format_abs(value: Decimal) -> String {
    let rounded = value
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let int = rounded.trunc();
    let cents = ((rounded - int) * Decimal::ONE_HUNDRED)
        .to_u8()
        .unwrap_or_default();
    match int.to_u128() {
        Some(int) => format!("{}.{cents:02}", int.to_formatted_string(&Locale::en)),
        None => format!("{rounded:.2}"),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn money() {
        assert_eq!(format_money(dec!(1234.5), MoneyFormat::default()), "$1,234.50");
        assert_eq!(format_money(dec!(-1234567.891), MoneyFormat::default()), "-$1,234,567.89");
        assert_eq!(format_money(dec!(40), MoneyFormat::signed()), "+$40.00");
        assert_eq!(format_money(Decimal::ZERO, MoneyFormat::signed()), "$0.00");
        assert_eq!(format_money(dec!(0.005), MoneyFormat::default()), "$0.01");
        assert_eq!(
            format_money(
                dec!(-20),
                MoneyFormat {
                    sign: true,
                    currency: false,
                }
            ),
            "-20.00"
        );
    }

    #[test]
    fn money_from_float() {
        assert_eq!(format_money_f64(10512.5, MoneyFormat::default()), "$10,512.50");
        assert_eq!(format_money_f64(-0.25, MoneyFormat::signed()), "-$0.25");
    }

    #[test]
    fn percent() {
        assert_eq!(format_percent(5.126, true), "+5.13%");
        assert_eq!(format_percent(-1.5, true), "-1.50%");
        assert_eq!(format_percent(0.0, true), "+0.00%");
        assert_eq!(format_percent(66.666, false), "66.67%");
    }
}
