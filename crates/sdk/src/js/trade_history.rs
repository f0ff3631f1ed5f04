use serde::Serialize;
use serde_json::Value;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;

use crate::trade_history::aggregate;

/// Aggregate raw trade records into table rows, an equity series and
/// summary statistics.
///
/// Amounts are returned as decimal strings.
#[wasm_bindgen(js_name = aggregateTradeHistory)]
pub fn aggregate_trade_history(trades: JsValue) -> crate::Result<JsValue> {
    let trades: Vec<Value> = if trades.is_null() || trades.is_undefined() {
        Vec::new()
    } else {
        serde_wasm_bindgen::from_value(trades)?
    };
    let report = aggregate(&trades);
    Ok(report.serialize(&Serializer::json_compatible())?)
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use serde_json::json;
    use wasm_bindgen_test::wasm_bindgen_test;

    use super::*;

    #[wasm_bindgen_test]
    fn aggregates_js_records() {
        let trades = serde_wasm_bindgen::to_value(&json!([
            {"positionId": 1, "side": "BUY", "closeTime": "2026-04-01T10:00:00Z", "profit": 50},
            {"positionId": 2, "side": "SELL", "closeTime": "2026-04-02T10:00:00Z", "profit": "-20"},
        ]))
        .unwrap();
        let report: Value = serde_wasm_bindgen::from_value(aggregate_trade_history(trades).unwrap()).unwrap();
        assert_eq!(report["stats"]["tradeCount"], json!(2));
        assert_eq!(report["stats"]["netTotal"], json!("30"));
        assert_eq!(report["series"][1]["cumulativeNet"], json!("30"));
    }
}
