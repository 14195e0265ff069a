//! Schema step between raw backend JSON and typed records.
//!
//! The backend has shipped several field spellings and envelope shapes over
//! time. Every accepted variant is listed here; anything else is a
//! `DataShape` error rather than a silently empty value.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use gasto_core::{Recommendation, StatsSummary, Transaction, TxnKind};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::ApiError;

const INCOME_FIELDS: &[&str] = &["total_income", "income_total", "ingresos", "totalIncome"];
const EXPENSE_FIELDS: &[&str] = &["total_expense", "expense_total", "gastos", "totalExpense"];
const BALANCE_FIELDS: &[&str] = &["balance", "saldo"];

type Object = Map<String, Value>;

fn shape(msg: impl Into<String>) -> ApiError {
    ApiError::DataShape(msg.into())
}

/// Statistics payload → summary. Missing totals count as zero.
pub fn stats_from_value(value: &Value) -> Result<StatsSummary, ApiError> {
    let obj = value
        .as_object()
        .ok_or_else(|| shape("statistics: expected an object"))?;

    let income = decimal_field(obj, INCOME_FIELDS)?.unwrap_or_default().abs();
    let expense = decimal_field(obj, EXPENSE_FIELDS)?.unwrap_or_default().abs();
    let balance = decimal_field(obj, BALANCE_FIELDS)?;

    Ok(StatsSummary::with_server_balance(income, expense, balance))
}

/// Transactions payload: a bare list, or `{items: [...]}` / `{transactions: [...]}`
pub fn transactions_from_value(value: &Value) -> Result<Vec<Transaction>, ApiError> {
    let items = list_payload(value, &["items", "transactions"], "transactions")?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| transaction_from_value(i, item))
        .collect()
}

fn transaction_from_value(index: usize, value: &Value) -> Result<Transaction, ApiError> {
    let obj = value
        .as_object()
        .ok_or_else(|| shape(format!("transaction #{index}: expected an object")))?;

    let id = id_field(obj).unwrap_or_else(|| format!("txn-{index}"));
    let amount = decimal_field(obj, &["amount", "monto"])?.unwrap_or_default();
    let kind = string_field(obj, &["type", "kind", "tipo"])?
        .as_deref()
        .and_then(TxnKind::parse);
    let date_raw = string_field(obj, &["date", "fecha"])?
        .ok_or_else(|| shape(format!("transaction {id}: missing date")))?;
    let date = parse_date(&date_raw)
        .ok_or_else(|| shape(format!("transaction {id}: invalid date '{date_raw}'")))?;

    Ok(Transaction {
        id,
        amount,
        kind,
        category: string_field(obj, &["category", "categoria"])?,
        description: string_field(obj, &["description", "descripcion"])?,
        merchant: string_field(obj, &["merchant"])?,
        date,
    })
}

/// Recommendations payload: a bare list or `{recommendations: [...]}`
pub fn recommendations_from_value(value: &Value) -> Result<Vec<Recommendation>, ApiError> {
    let items = list_payload(value, &["recommendations", "items"], "recommendations")?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let obj = item
                .as_object()
                .ok_or_else(|| shape(format!("recommendation #{i}: expected an object")))?;
            recommendation_from_object(obj)
        })
        .collect()
}

fn recommendation_from_object(obj: &Object) -> Result<Recommendation, ApiError> {
    let score = match obj.get("score") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(other) => return Err(shape(format!("recommendation score: unexpected {other}"))),
    };
    let applied = match obj.get("applied") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => return Err(shape(format!("recommendation applied: unexpected {other}"))),
    };

    Ok(Recommendation {
        id: id_field(obj),
        kind: string_field(obj, &["type", "kind"])?.unwrap_or_else(|| "generic".to_string()),
        title: string_field(obj, &["title"])?.unwrap_or_else(|| "Recomendación".to_string()),
        detail: string_field(obj, &["detail"])?.unwrap_or_default(),
        score,
        suggested_action: string_field(obj, &["suggested_action", "suggestedAction"])?,
        applied,
    })
}

/// Apply response → the updated recommendation.
///
/// Accepts either an updated recommendation object or the `{success, detail}`
/// envelope (whose `detail` may itself be a `{success, detail}` envelope).
pub fn applied_from_value(value: &Value, original: &Recommendation) -> Result<Recommendation, ApiError> {
    let obj = value
        .as_object()
        .ok_or_else(|| shape("apply: expected an object"))?;

    if obj.contains_key("title") {
        let mut rec = recommendation_from_object(obj)?;
        if !obj.contains_key("applied") {
            rec.applied = true;
        }
        return Ok(rec);
    }

    match envelope_outcome(obj)? {
        Ok(()) => {
            let mut rec = original.clone();
            rec.applied = true;
            Ok(rec)
        }
        Err(detail) => Err(ApiError::Rejected(detail)),
    }
}

fn envelope_outcome(obj: &Object) -> Result<Result<(), String>, ApiError> {
    let success = match obj.get("success") {
        Some(Value::Bool(b)) => *b,
        _ => return Err(shape("apply: missing 'success' flag")),
    };
    match obj.get("detail") {
        Some(Value::Object(inner)) if inner.contains_key("success") => {
            if success {
                envelope_outcome(inner)
            } else {
                Ok(Err(detail_text(inner)))
            }
        }
        _ if success => Ok(Ok(())),
        _ => Ok(Err(detail_text(obj))),
    }
}

fn detail_text(obj: &Object) -> String {
    match obj.get("detail") {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Best-effort human message from an error body:
/// `{detail: "..."}`, `{message: "..."}`, `{detail: [{msg}]}`, `{error: {message}}`
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    find_message(&value).filter(|m| !m.trim().is_empty())
}

fn find_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(find_message),
        Value::Object(obj) => ["detail", "message", "msg", "error"]
            .iter()
            .filter_map(|k| obj.get(*k))
            .find_map(find_message),
        _ => None,
    }
}

fn list_payload<'a>(value: &'a Value, keys: &[&str], what: &str) -> Result<&'a Vec<Value>, ApiError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(obj) => keys
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_array))
            .ok_or_else(|| shape(format!("{what}: object without a list field ({})", keys.join("/")))),
        other => Err(shape(format!("{what}: expected a list, got {}", kind_of(other)))),
    }
}

/// First present field among `names`. Null counts as absent.
fn decimal_field(obj: &Object, names: &[&str]) -> Result<Option<Decimal>, ApiError> {
    let Some((name, value)) = first_present(obj, names) else {
        return Ok(None);
    };
    match value {
        Value::Number(n) => parse_decimal(&n.to_string())
            .map(Some)
            .ok_or_else(|| shape(format!("{name}: unreadable number {n}"))),
        Value::String(s) => parse_decimal(s)
            .map(Some)
            .ok_or_else(|| shape(format!("{name}: '{s}' is not a number"))),
        other => Err(shape(format!("{name}: expected a number, got {}", kind_of(other)))),
    }
}

fn string_field(obj: &Object, names: &[&str]) -> Result<Option<String>, ApiError> {
    let Some((name, value)) = first_present(obj, names) else {
        return Ok(None);
    };
    match value {
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(shape(format!("{name}: expected a string, got {}", kind_of(other)))),
    }
}

fn id_field(obj: &Object) -> Option<String> {
    match first_present(obj, &["id", "_id"])?.1 {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        // Mongo extended JSON: {"$oid": "..."}
        Value::Object(o) => o.get("$oid").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn first_present<'a>(obj: &'a Object, names: &[&'a str]) -> Option<(&'a str, &'a Value)> {
    names.iter().find_map(|n| match obj.get(*n) {
        None | Some(Value::Null) => None,
        Some(v) => Some((*n, v)),
    })
}

/// Accepts `1500`, `-1500.50`, `"1,500.50"`, `"$ 1500"` and scientific notation
fn parse_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stats_synonyms() {
        let s = stats_from_value(&json!({"ingresos": 2000, "gastos": "1,200"})).unwrap();
        assert_eq!(s.total_income, Decimal::from(2000));
        assert_eq!(s.total_expense, Decimal::from(1200));
        assert_eq!(s.balance, Decimal::from(800));

        let server = stats_from_value(&json!({"income_total": 10, "total_expense": 4, "balance": 99})).unwrap();
        assert_eq!(server.balance, Decimal::from(99));
    }

    #[test]
    fn test_stats_missing_fields_are_zero() {
        let s = stats_from_value(&json!({"total_income": null})).unwrap();
        assert_eq!(s, StatsSummary::default());
    }

    #[test]
    fn test_stats_shape_mismatch() {
        assert!(matches!(stats_from_value(&json!([1, 2])), Err(ApiError::DataShape(_))));
        assert!(matches!(
            stats_from_value(&json!({"total_income": {"value": 3}})),
            Err(ApiError::DataShape(_))
        ));
        assert!(matches!(
            stats_from_value(&json!({"total_income": "mucho"})),
            Err(ApiError::DataShape(_))
        ));
    }

    #[test]
    fn test_transactions_envelopes() {
        let item = json!({"_id": {"$oid": "abc"}, "amount": 50.5, "type": "gasto", "category": "comida", "date": "2025-10-02T14:30:00"});
        let bare = transactions_from_value(&json!([item.clone()])).unwrap();
        let wrapped = transactions_from_value(&json!({"items": [item]})).unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare[0].id, "abc");
        assert_eq!(bare[0].kind, Some(TxnKind::Expense));
        assert_eq!(bare[0].amount, Decimal::new(505, 1));
        assert_eq!(bare[0].date, NaiveDate::from_ymd_opt(2025, 10, 2).unwrap());
    }

    #[test]
    fn test_transaction_defaults_and_errors() {
        let txns = transactions_from_value(&json!([{"date": "2025-10-01"}])).unwrap();
        assert_eq!(txns[0].id, "txn-0");
        assert_eq!(txns[0].amount, Decimal::ZERO);
        assert_eq!(txns[0].kind, None);

        assert!(transactions_from_value(&json!([{"amount": 3}])).is_err());
        assert!(transactions_from_value(&json!({"data": []})).is_err());
        assert!(transactions_from_value(&json!([{"date": "2025-10-01", "category": 7}])).is_err());
    }

    #[test]
    fn test_recommendations_defaults() {
        let recs = recommendations_from_value(&json!({"recommendations": [
            {"type": "suggest_goal", "title": "Crea una meta", "detail": "10%", "score": 0.7, "suggested_action": "Crear meta"},
            {}
        ]}))
        .unwrap();
        assert_eq!(recs[0].suggested_action.as_deref(), Some("Crear meta"));
        assert_eq!(recs[1].kind, "generic");
        assert_eq!(recs[1].title, "Recomendación");
        assert_eq!(recs[1].score, None);
    }

    #[test]
    fn test_apply_envelopes() {
        let rec = Recommendation::new("suggest_goal", "Crea una meta", "", 0.7);

        let ok = applied_from_value(&json!({"success": true, "detail": {"success": true, "detail": "Meta creada"}}), &rec).unwrap();
        assert!(ok.applied);
        assert_eq!(ok.title, rec.title);

        let rejected = applied_from_value(
            &json!({"success": true, "detail": {"success": false, "detail": "Acción no confirmada por el usuario."}}),
            &rec,
        );
        assert_eq!(rejected, Err(ApiError::Rejected("Acción no confirmada por el usuario.".into())));

        let updated = applied_from_value(&json!({"id": "r1", "type": "suggest_goal", "title": "Meta creada", "detail": ""}), &rec).unwrap();
        assert!(updated.applied);
        assert_eq!(updated.id.as_deref(), Some("r1"));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(extract_error_message(r#"{"detail":"Usuario no autenticado"}"#).as_deref(), Some("Usuario no autenticado"));
        assert_eq!(extract_error_message(r#"{"message":"boom"}"#).as_deref(), Some("boom"));
        assert_eq!(
            extract_error_message(r#"{"detail":[{"loc":["query"],"msg":"field required"}]}"#).as_deref(),
            Some("field required")
        );
        assert_eq!(extract_error_message(r#"{"error":{"message":"nested"}}"#).as_deref(), Some("nested"));
        assert_eq!(extract_error_message("<html>502</html>"), None);
        assert_eq!(extract_error_message(r#"{"detail":""}"#), None);
    }
}
