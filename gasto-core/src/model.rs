//! Record types shared by the aggregator, the advice rules and the API client

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Label used for expenses that arrive without a category
pub const UNCATEGORIZED: &str = "uncategorized";

/// Direction of a transaction as reported by the backend's `type` field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TxnKind {
    #[serde(rename = "income")]
    Income,
    #[serde(rename = "expense")]
    Expense,
}

impl TxnKind {
    /// Parse the spellings the backend has used over time (English and Spanish).
    /// Returns None for anything unrecognized.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "income" | "ingreso" | "in" | "deposit" => Some(TxnKind::Income),
            "expense" | "gasto" | "out" | "withdrawal" => Some(TxnKind::Expense),
            _ => None,
        }
    }
}

/// A single income or expense movement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    /// Signed amount. A negative value marks an expense regardless of `kind`.
    pub amount: Decimal,
    /// Explicit direction, when the backend sent a recognizable one
    pub kind: Option<TxnKind>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub merchant: Option<String>,
    pub date: NaiveDate,
}

impl Transaction {
    /// Create a transaction with only the fields the aggregator needs
    pub fn new(
        id: impl Into<String>,
        date: NaiveDate,
        amount: Decimal,
        kind: Option<TxnKind>,
        category: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            amount,
            kind,
            category: category.map(str::to_string),
            description: None,
            merchant: None,
            date,
        }
    }

    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant = Some(merchant.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Expense when typed as one OR when the amount is negative.
    /// A negative amount typed as income still counts as an expense.
    pub fn is_expense(&self) -> bool {
        self.kind == Some(TxnKind::Expense) || self.amount < Decimal::ZERO
    }

    pub fn is_income(&self) -> bool {
        !self.is_expense()
    }

    /// Get the absolute amount
    pub fn abs_amount(&self) -> Decimal {
        self.amount.abs()
    }

    /// Grouping key: the trimmed category, or `uncategorized` when missing/blank
    pub fn category_label(&self) -> &str {
        match self.category.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c,
            _ => UNCATEGORIZED,
        }
    }

    /// Merchant (or description) normalized for repeat-charge detection
    pub fn merchant_key(&self) -> Option<String> {
        let raw = self
            .merchant
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .or(self.description.as_deref())?;
        let key = raw.trim().to_lowercase();
        if key.is_empty() { None } else { Some(key) }
    }
}

/// Aggregated totals for a date range
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StatsSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
}

impl StatsSummary {
    /// Build from totals, deriving the balance
    pub fn from_totals(total_income: Decimal, total_expense: Decimal) -> Self {
        Self {
            total_income,
            total_expense,
            balance: total_income - total_expense,
        }
    }

    /// Build from server totals, keeping the server's balance when it sent one
    pub fn with_server_balance(
        total_income: Decimal,
        total_expense: Decimal,
        balance: Option<Decimal>,
    ) -> Self {
        Self {
            total_income,
            total_expense,
            balance: balance.unwrap_or(total_income - total_expense),
        }
    }

    pub fn is_over_budget(&self) -> bool {
        self.total_expense > self.total_income
    }
}

/// Expense total for one category. Derived per fetch, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
    /// Share of all expenses, 0-100 with two decimals
    pub percent: Decimal,
}

impl CategoryTotal {
    pub fn new(category: impl Into<String>, total: Decimal, percent: Decimal) -> Self {
        Self {
            category: category.into(),
            total,
            percent,
        }
    }
}

/// A scored recommendation as served by the backend's recommendations endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub detail: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub suggested_action: Option<String>,
    #[serde(default)]
    pub applied: bool,
}

impl Recommendation {
    pub fn new(
        kind: impl Into<String>,
        title: impl Into<String>,
        detail: impl Into<String>,
        score: f64,
    ) -> Self {
        Self {
            id: None,
            kind: kind.into(),
            title: title.into(),
            detail: detail.into(),
            score: Some(score),
            suggested_action: None,
            applied: false,
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.suggested_action = Some(action.into());
        self
    }

    /// Score used for ordering; missing scores sort last
    pub fn rank(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }
}

/// Payload for confirming the action behind a recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplyRequest {
    pub rec_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    pub confirm: bool,
}

impl ApplyRequest {
    /// Confirmed request for a recommendation, carrying its id (if any) as metadata
    pub fn confirm(rec: &Recommendation) -> Self {
        let metadata = rec.id.as_ref().map(|id| {
            let mut m = serde_json::Map::new();
            m.insert("id".to_string(), serde_json::Value::String(id.clone()));
            m
        });
        Self {
            rec_type: rec.kind.clone(),
            metadata,
            confirm: true,
        }
    }
}

/// Per-user thresholds that feed the insight rules
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UserSettings {
    #[serde(default)]
    pub savings_goal: Option<Decimal>,
    #[serde(default)]
    pub spending_limit: Option<Decimal>,
}
