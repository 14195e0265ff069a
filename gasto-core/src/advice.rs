//! Recommendation Generator: fixed heuristics that turn totals into advice text.
//!
//! Order matters, the panel reads the lines top to bottom:
//! - over budget: headline, one cut per top category, short-term goal
//! - otherwise: headline, savings suggestion, emergency fund target
//! - always: the generic tip last

use crate::model::{CategoryTotal, StatsSummary};
use crate::money::{format_cop, format_percent, round_half_up};
use rust_decimal::Decimal;

/// Closing tip appended to every advice list
pub const GENERIC_ADVICE: &str =
    "Registra tus gastos a diario: es la forma más sencilla de detectar fugas de dinero.";

/// Months of expenses an emergency fund should cover
const EMERGENCY_FUND_MONTHS: i64 = 3;

/// Suggested reduction for one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutSuggestion {
    pub category: String,
    /// Share of total expenses the category represents
    pub share: Decimal,
    /// Suggested cut, in percent of the category total
    pub cut_percent: Decimal,
    /// Amount saved by the cut, rounded to whole currency units
    pub saved: Decimal,
}

/// Savings targets for a month that closes with money left over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurplusPlan {
    pub surplus: Decimal,
    pub suggested_saving: Decimal,
    pub emergency_fund: Decimal,
}

/// Cut tier by share of expenses: >30% → 25, >15% → 15, else 10
pub fn cut_tier(share: Decimal) -> Decimal {
    if share > Decimal::from(30) {
        Decimal::from(25)
    } else if share > Decimal::from(15) {
        Decimal::from(15)
    } else {
        Decimal::from(10)
    }
}

pub fn suggest_cuts(top: &[CategoryTotal]) -> Vec<CutSuggestion> {
    top.iter()
        .map(|c| {
            let cut_percent = cut_tier(c.percent);
            CutSuggestion {
                category: c.category.clone(),
                share: c.percent,
                cut_percent,
                saved: round_half_up(c.total * cut_percent / Decimal::ONE_HUNDRED, 0),
            }
        })
        .collect()
}

pub fn surplus_plan(summary: &StatsSummary) -> SurplusPlan {
    SurplusPlan {
        surplus: summary.total_income - summary.total_expense,
        suggested_saving: round_half_up(summary.total_income / Decimal::TEN, 0),
        emergency_fund: summary.total_expense * Decimal::from(EMERGENCY_FUND_MONTHS),
    }
}

/// Percent of current spending that must go to close the deficit
pub fn reduction_needed(summary: &StatsSummary) -> Decimal {
    let deficit = summary.total_expense - summary.total_income;
    if summary.total_expense <= Decimal::ZERO || deficit <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round_half_up(deficit * Decimal::ONE_HUNDRED / summary.total_expense, 2)
}

/// Advice lines for a summary and its top categories. Pure and infallible.
pub fn advise(summary: &StatsSummary, top: &[CategoryTotal]) -> Vec<String> {
    let mut lines = Vec::new();

    if summary.is_over_budget() {
        let deficit = summary.total_expense - summary.total_income;
        lines.push(format!(
            "Estás gastando más de lo que ingresas: tu déficit es de {}.",
            format_cop(deficit, 0)
        ));

        for cut in suggest_cuts(top) {
            lines.push(format!(
                "{} representa el {} de tus gastos. Redúcelo un {} y ahorrarás {}.",
                cut.category,
                format_percent(cut.share),
                format_percent(cut.cut_percent),
                format_cop(cut.saved, 0)
            ));
        }

        lines.push(format!(
            "Meta a corto plazo: reduce tus gastos un {} para equilibrar tu presupuesto.",
            format_percent(reduction_needed(summary))
        ));
    } else {
        let plan = surplus_plan(summary);
        lines.push(format!(
            "¡Vas bien! Este periodo te sobran {}.",
            format_cop(plan.surplus, 0)
        ));
        lines.push(format!(
            "Ahorra al menos el 10% de tus ingresos: {} este periodo.",
            format_cop(plan.suggested_saving, 0)
        ));
        lines.push(format!(
            "Construye un fondo de emergencia de {} ({} meses de gastos).",
            format_cop(plan.emergency_fund, 0),
            EMERGENCY_FUND_MONTHS
        ));
    }

    lines.push(GENERIC_ADVICE.to_string());
    lines
}
