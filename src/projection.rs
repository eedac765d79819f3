// 🔒 Projector / Sanitizer
// Reduce each route to time + coordinates; no postal code or country survives

use crate::geocode::EnrichedTransaction;
use crate::parser::Passthrough;
use crate::reference::Coordinate;
use serde::Serialize;
use serde_json::{Number, Value};

// ============================================================================
// OUTPUT RECORD
// ============================================================================

/// The public shape of one route. Serialized field order is the declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    /// Epoch milliseconds
    pub time: i64,

    /// Payee location as "[lon,lat]"
    pub to_coordinate: String,

    /// Payer location as "[lon,lat]"
    pub from_coordinate: String,

    #[serde(flatten)]
    pub passthrough: Option<PassthroughFields>,
}

/// Extended variant fields, present (possibly null) only when configured
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassthroughFields {
    pub date: Value,
    pub app_id: Value,
    pub amount: Value,
}

impl From<Passthrough> for PassthroughFields {
    fn from(p: Passthrough) -> Self {
        PassthroughFields {
            date: infer_scalar(p.capture_day),
            app_id: infer_scalar(p.pr_id),
            amount: infer_scalar(p.gross),
        }
    }
}

// ============================================================================
// PROJECTION
// ============================================================================

/// "[longitude,latitude]" using the reference table's literals
pub fn coordinate_text(coordinate: &Coordinate) -> String {
    format!("[{},{}]", coordinate.longitude, coordinate.latitude)
}

pub fn project(tx: EnrichedTransaction) -> OutputRecord {
    OutputRecord {
        time: tx.time_ms,
        to_coordinate: coordinate_text(&tx.payee_coordinate),
        from_coordinate: coordinate_text(&tx.payer_coordinate),
        passthrough: tx.passthrough.map(PassthroughFields::from),
    }
}

pub fn project_batch(batch: Vec<EnrichedTransaction>) -> Vec<OutputRecord> {
    batch.into_iter().map(project).collect()
}

/// Type a passthrough cell the way a tabular reader would: integers and
/// floats become numbers, anything else stays a string. Digit strings with a
/// leading zero stay strings so identifiers are not altered.
pub fn infer_scalar(cell: Option<String>) -> Value {
    let Some(text) = cell else {
        return Value::Null;
    };

    let unsigned = text.strip_prefix('-').unwrap_or(text.as_str());
    let leading_zero = unsigned.len() > 1 && unsigned.starts_with('0') && !unsigned.starts_with("0.");
    if leading_zero {
        return Value::String(text);
    }

    if let Ok(int) = text.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Ok(int) = text.parse::<u64>() {
        return Value::Number(int.into());
    }

    // only literals written as floats become floats; wider integers stay text
    let float_literal = unsigned.bytes().any(|b| b == b'.' || b == b'e' || b == b'E');
    let looks_numeric = unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || b == b'.' || b == b'e' || b == b'E' || b == b'-' || b == b'+');
    if float_literal && looks_numeric {
        if let Some(number) = text.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(number);
        }
    }

    Value::String(text)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Degrees;
    use serde_json::json;

    fn coordinate(lon: &str, lat: &str) -> Coordinate {
        Coordinate {
            longitude: Degrees::parse(lon).unwrap(),
            latitude: Degrees::parse(lat).unwrap(),
        }
    }

    fn enriched(passthrough: Option<Passthrough>) -> EnrichedTransaction {
        EnrichedTransaction {
            time_ms: 1412207786000,
            payer_coordinate: coordinate("-75.4894", "42.312"),
            payee_coordinate: coordinate("-77.0007", "38.9832"),
            passthrough,
            line_number: 2,
        }
    }

    #[test]
    fn test_coordinate_longitude_first() {
        assert_eq!(
            coordinate_text(&coordinate("-77.0007", "38.9832")),
            "[-77.0007,38.9832]"
        );
    }

    #[test]
    fn test_coordinate_keeps_reference_precision() {
        assert_eq!(coordinate_text(&coordinate("-77.0", "38.98320")), "[-77.0,38.98320]");
    }

    #[test]
    fn test_projection_renames_and_drops_fields() {
        let record = project(enriched(None));
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(
            value,
            json!({
                "time": 1412207786000i64,
                "to_coordinate": "[-77.0007,38.9832]",
                "from_coordinate": "[-75.4894,42.312]",
            })
        );
    }

    #[test]
    fn test_field_order_in_json() {
        let text = serde_json::to_string(&project(enriched(None))).unwrap();
        assert_eq!(
            text,
            r#"{"time":1412207786000,"to_coordinate":"[-77.0007,38.9832]","from_coordinate":"[-75.4894,42.312]"}"#
        );
    }

    #[test]
    fn test_passthrough_fields_follow_core_fields() {
        let record = project(enriched(Some(Passthrough {
            capture_day: Some("2014-10-01".to_string()),
            pr_id: Some("4321".to_string()),
            gross: None,
        })));
        let text = serde_json::to_string(&record).unwrap();

        assert_eq!(
            text,
            r#"{"time":1412207786000,"to_coordinate":"[-77.0007,38.9832]","from_coordinate":"[-75.4894,42.312]","date":"2014-10-01","app_id":4321,"amount":null}"#
        );
    }

    #[test]
    fn test_infer_scalar() {
        assert_eq!(infer_scalar(None), Value::Null);
        assert_eq!(infer_scalar(Some("42".to_string())), json!(42));
        assert_eq!(infer_scalar(Some("-3".to_string())), json!(-3));
        assert_eq!(infer_scalar(Some("25.5".to_string())), json!(25.5));
        assert_eq!(infer_scalar(Some("0.75".to_string())), json!(0.75));
        assert_eq!(infer_scalar(Some("007".to_string())), json!("007"));
        assert_eq!(infer_scalar(Some("2014-10-01".to_string())), json!("2014-10-01"));
        assert_eq!(infer_scalar(Some("inf".to_string())), json!("inf"));
        assert_eq!(infer_scalar(Some("1e3".to_string())), json!(1000.0));
    }

    #[test]
    fn test_infer_scalar_wide_integers_not_rounded() {
        assert_eq!(
            infer_scalar(Some("12345678901234567891".to_string())),
            json!(12345678901234567891u64)
        );
        assert_eq!(
            serde_json::to_string(&infer_scalar(Some("12345678901234567891".to_string()))).unwrap(),
            "12345678901234567891"
        );
        assert_eq!(
            infer_scalar(Some("123456789012345678901234".to_string())),
            json!("123456789012345678901234")
        );
        assert_eq!(
            infer_scalar(Some("-99999999999999999999".to_string())),
            json!("-99999999999999999999")
        );
    }
}
