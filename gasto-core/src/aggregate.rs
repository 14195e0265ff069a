//! Aggregator: reduces a transaction list to income/expense totals and
//! per-category expense shares.

use crate::model::{CategoryTotal, StatsSummary, Transaction};
use crate::money::round_half_up;
use crate::range::DateRange;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of categories surfaced by the panels
pub const TOP_CATEGORIES: usize = 3;

/// Result of one aggregation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Aggregation {
    pub summary: StatsSummary,
    /// Every expense category, largest first. Equal totals keep encounter order.
    pub categories: Vec<CategoryTotal>,
}

impl Aggregation {
    /// The largest `TOP_CATEGORIES` categories
    pub fn top_categories(&self) -> &[CategoryTotal] {
        let n = self.categories.len().min(TOP_CATEGORIES);
        &self.categories[..n]
    }
}

/// Aggregate the transactions dated inside `range`
pub fn aggregate(txns: &[Transaction], range: &DateRange) -> Aggregation {
    let in_range: Vec<&Transaction> = txns.iter().filter(|t| range.contains(t.date)).collect();
    reduce(&in_range)
}

/// Aggregate every transaction, ignoring dates
pub fn aggregate_all(txns: &[Transaction]) -> Aggregation {
    let all: Vec<&Transaction> = txns.iter().collect();
    reduce(&all)
}

fn reduce(txns: &[&Transaction]) -> Aggregation {
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;

    // Group by category, remembering first-seen order for tie breaks
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, Decimal> = HashMap::new();

    for txn in txns {
        if txn.is_expense() {
            let amount = txn.abs_amount();
            expense += amount;
            let label = txn.category_label();
            match totals.get_mut(label) {
                Some(total) => *total += amount,
                None => {
                    order.push(label.to_string());
                    totals.insert(label.to_string(), amount);
                }
            }
        } else {
            income += txn.amount;
        }
    }

    let grouped: Decimal = totals.values().copied().sum();
    let denominator = grouped.max(expense).max(Decimal::ONE);

    let mut categories: Vec<CategoryTotal> = order
        .into_iter()
        .map(|category| {
            let total = totals.get(&category).copied().unwrap_or_default();
            let percent = round_half_up(total * Decimal::ONE_HUNDRED / denominator, 2);
            CategoryTotal {
                category,
                total,
                percent,
            }
        })
        .collect();

    // sort_by is stable: equal totals stay in encounter order
    categories.sort_by(|a, b| b.total.cmp(&a.total));

    Aggregation {
        summary: StatsSummary::from_totals(income, expense),
        categories,
    }
}
