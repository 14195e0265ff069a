//! Scored recommendations derived from raw transactions and user settings.
//!
//! Same rule set and scores as the backend's recommendations endpoint, so the
//! recommendations panel can derive them locally from the transaction list.
//! Transactions are classified the way the aggregator does it: untyped rows
//! count by sign instead of being skipped.

use crate::aggregate::aggregate_all;
use crate::model::{Recommendation, StatsSummary, Transaction, UserSettings};
use crate::money::{format_cop, round_half_up};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::{HashMap, HashSet};

/// Expenses at or below this amount count as "small"
const SMALL_EXPENSE: i64 = 20_000;
/// Repeat charges from one merchant that suggest a subscription
const SUBSCRIPTION_MIN_CHARGES: usize = 3;
/// Categories inspected for share alerts
const CATEGORY_WINDOW: usize = 5;

pub fn generate_insights(txns: &[Transaction], settings: &UserSettings) -> Vec<Recommendation> {
    let agg = aggregate_all(txns);
    let summary = agg.summary;
    let mut recs = Vec::new();

    balance_rule(&summary, &mut recs);

    let grouped: Decimal = agg.categories.iter().map(|c| c.total).sum();
    for cat in agg.categories.iter().take(CATEGORY_WINDOW) {
        // thresholds apply to the exact share, not the rounded display percent
        let pct = category_share(cat.total, grouped);
        let amount = format_cop(cat.total, 0);
        if pct >= Decimal::from(30) {
            recs.push(
                Recommendation::new(
                    "reduce_category",
                    format!("Reduce gastos en {}", cat.category),
                    format!(
                        "Has gastado {}% en {} ({amount}). Revisa suscripciones y hábitos.",
                        one_decimal(pct),
                        cat.category
                    ),
                    0.95,
                )
                .with_action(format!("Revisar gastos en {}", cat.category)),
            );
        } else if pct >= Decimal::from(15) {
            recs.push(
                Recommendation::new(
                    "monitor_category",
                    format!("Vigila {}", cat.category),
                    format!(
                        "{}% de tus gastos están en {}. Considera reducir un 10% para ahorrar.",
                        one_decimal(pct),
                        cat.category
                    ),
                    0.6,
                )
                .with_action(format!("Reducir gastos en {}", cat.category)),
            );
        }
    }

    subscription_rule(txns, &mut recs);
    small_expenses_rule(txns, &summary, &mut recs);

    let income = summary.total_income;
    let expense = summary.total_expense;

    if income > Decimal::ZERO && expense > income * Decimal::new(7, 1) {
        recs.push(
            Recommendation::new(
                "high_expense_ratio",
                "Gastos muy altos en relación a ingresos",
                "Tus gastos superan el 70% de tus ingresos. Revisa prioridades y reduce gastos no esenciales.",
                0.9,
            )
            .with_action("Reducir gastos no esenciales"),
        );
    }

    if let Some(limit) = settings.spending_limit.filter(|l| !l.is_zero()) {
        if expense > limit {
            recs.push(
                Recommendation::new(
                    "over_limit",
                    "Has superado tu límite de gastos",
                    format!(
                        "Tus gastos ({}) exceden el límite configurado ({}).",
                        format_cop(expense, 0),
                        format_cop(limit, 0)
                    ),
                    0.92,
                )
                .with_action("Revisar límite o reducir gastos"),
            );
        } else {
            recs.push(Recommendation::new(
                "within_limit",
                "Dentro del límite",
                format!("Estás dentro del límite mensual ({}).", format_cop(limit, 0)),
                0.25,
            ));
        }
    }

    let has_goal = settings.savings_goal.is_some_and(|g| !g.is_zero());
    if !has_goal && income > Decimal::ZERO {
        let suggested = round_half_up(income / Decimal::TEN, 0);
        recs.push(
            Recommendation::new(
                "suggest_goal",
                "Crea una meta de ahorro",
                format!(
                    "Sugerimos una meta inicial de {} mensuales (≈10% de tus ingresos).",
                    format_cop(suggested, 0)
                ),
                0.7,
            )
            .with_action("Crear meta"),
        );
    }

    recs.push(
        Recommendation::new(
            "daily_tracking",
            "Registra tus movimientos",
            "Llevar control diario ayuda a identificar fugas de dinero.",
            0.05,
        )
        .with_action("Registrar diariamente"),
    );
    recs.push(
        Recommendation::new(
            "automate_saving",
            "Ahorro automático",
            "Automatiza un porcentaje (ej. 5-20%) para construir el hábito de ahorrar.",
            0.04,
        )
        .with_action("Configurar transferencia automática"),
    );

    if txns.is_empty() {
        recs.insert(
            0,
            Recommendation::new(
                "no_data",
                "No hay datos suficientes",
                "Registra ingresos y gastos para obtener recomendaciones personalizadas.",
                1.0,
            )
            .with_action("Registrar transacciones"),
        );
    }

    tracing::debug!(
        income = %income,
        expense = %expense,
        txns = txns.len(),
        generated = recs.len(),
        "generated insights"
    );

    rank_and_dedupe(recs)
}

fn balance_rule(summary: &StatsSummary, recs: &mut Vec<Recommendation>) {
    let income = summary.total_income;
    let expense = summary.total_expense;
    let balance = income - expense;

    if income.is_zero() && expense > Decimal::ZERO {
        recs.push(
            Recommendation::new(
                "no_income",
                "No se detectaron ingresos",
                "Registra tus ingresos para obtener recomendaciones más precisas.",
                1.0,
            )
            .with_action("Registrar ingreso"),
        );
    } else if balance < Decimal::ZERO {
        recs.push(
            Recommendation::new(
                "negative_balance",
                "Gastas más de lo que ingresas",
                format!(
                    "Tus gastos ({}) superan tus ingresos ({}). Considera reducir gastos.",
                    format_cop(expense, 0),
                    format_cop(income, 0)
                ),
                0.98,
            )
            .with_action("Revisar presupuesto"),
        );
    } else if income > Decimal::ZERO && balance / income < Decimal::new(5, 2) {
        recs.push(
            Recommendation::new(
                "low_saving_margin",
                "Margen de ahorro bajo",
                format!(
                    "Tu ahorro es {}% de tus ingresos. Intenta ahorrar al menos 5-10%.",
                    one_decimal(balance * Decimal::ONE_HUNDRED / income)
                ),
                0.9,
            )
            .with_action("Crear meta de ahorro"),
        );
    } else {
        recs.push(
            Recommendation::new(
                "healthy_balance",
                "Balance saludable",
                "Tu balance es positivo. Considera crear o aumentar metas de ahorro.",
                0.2,
            )
            .with_action("Crear o aumentar meta"),
        );
    }
}

fn subscription_rule(txns: &[Transaction], recs: &mut Vec<Recommendation>) {
    let mut order: Vec<String> = Vec::new();
    let mut charges: HashMap<String, Vec<Decimal>> = HashMap::new();

    for txn in txns.iter().filter(|t| t.is_expense()) {
        let Some(key) = txn.merchant_key() else { continue };
        charges
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(txn.abs_amount());
    }

    for merchant in order {
        let amounts = &charges[&merchant];
        if amounts.len() < SUBSCRIPTION_MIN_CHARGES {
            continue;
        }
        let total: Decimal = amounts.iter().sum();
        let avg = total / Decimal::from(amounts.len());
        recs.push(
            Recommendation::new(
                "possible_subscription",
                format!("Revisa posible suscripción: {merchant}"),
                format!(
                    "Se detectaron {} cargos frecuentes (~{}) en {merchant}.",
                    amounts.len(),
                    format_cop(avg, 0)
                ),
                0.85,
            )
            .with_action("Revisar suscripción"),
        );
    }
}

fn small_expenses_rule(txns: &[Transaction], summary: &StatsSummary, recs: &mut Vec<Recommendation>) {
    let small: Vec<Decimal> = txns
        .iter()
        .filter(|t| t.is_expense())
        .map(|t| t.abs_amount())
        .filter(|a| *a <= Decimal::from(SMALL_EXPENSE))
        .collect();
    let total: Decimal = small.iter().sum();
    let income = summary.total_income;

    if income > Decimal::ZERO && small.len() >= 3 && total > income / Decimal::TEN {
        recs.push(
            Recommendation::new(
                "many_small_expenses",
                "Gastos pequeños que suman mucho",
                format!(
                    "Tienes {} gastos pequeños que suman {}, más del 10% de tus ingresos.",
                    small.len(),
                    format_cop(total, 0)
                ),
                0.8,
            )
            .with_action("Consolidar o reducir gastos pequeños"),
        );
    }
}

/// Highest score first (stable), dropping repeated (kind, title) pairs
pub fn rank_and_dedupe(mut recs: Vec<Recommendation>) -> Vec<Recommendation> {
    recs.sort_by(|a, b| b.rank().total_cmp(&a.rank()));
    let mut seen = HashSet::new();
    recs.retain(|r| seen.insert((r.kind.clone(), r.title.clone())));
    recs
}

fn category_share(total: Decimal, grouped: Decimal) -> Decimal {
    if grouped.is_zero() {
        return Decimal::ZERO;
    }
    total * Decimal::ONE_HUNDRED / grouped
}

fn one_decimal(value: Decimal) -> String {
    let v = round_half_up(value, 1).to_f64().unwrap_or(0.0);
    format!("{v:.1}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TxnKind;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, day).unwrap()
    }

    fn expense(id: &str, amount: i64, cat: &str) -> Transaction {
        Transaction::new(id, d(1), Decimal::from(amount), Some(TxnKind::Expense), Some(cat))
    }

    fn income(id: &str, amount: i64) -> Transaction {
        Transaction::new(id, d(1), Decimal::from(amount), Some(TxnKind::Income), Some("salario"))
    }

    fn kinds(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.kind.as_str()).collect()
    }

    #[test]
    fn test_no_data_goes_first() {
        let recs = generate_insights(&[], &UserSettings::default());
        assert_eq!(recs[0].kind, "no_data");
        assert!(kinds(&recs).contains(&"daily_tracking"));
        assert!(kinds(&recs).contains(&"automate_saving"));
        assert!(!kinds(&recs).contains(&"suggest_goal"));
    }

    #[test]
    fn test_negative_balance_and_category_alerts() {
        let txns = vec![
            income("i", 1_000_000),
            expense("a", 900_000, "arriendo"),
            expense("b", 300_000, "comida"),
        ];
        let recs = generate_insights(&txns, &UserSettings::default());
        let k = kinds(&recs);
        assert_eq!(k[0], "negative_balance");
        assert!(k.contains(&"reduce_category"));
        assert!(k.contains(&"monitor_category"));
        assert!(k.contains(&"high_expense_ratio"));
        assert!(k.contains(&"suggest_goal"));

        let goal = recs.iter().find(|r| r.kind == "suggest_goal").unwrap();
        assert!(goal.detail.contains("$ 100.000"), "{}", goal.detail);
    }

    #[test]
    fn test_scores_descending() {
        let txns = vec![income("i", 2_000_000), expense("a", 100_000, "comida")];
        let recs = generate_insights(&txns, &UserSettings::default());
        for w in recs.windows(2) {
            assert!(w[0].rank() >= w[1].rank(), "not sorted by score");
        }
        assert!(kinds(&recs).contains(&"healthy_balance"));
    }

    #[test]
    fn test_subscription_detection() {
        let mut txns = vec![income("i", 5_000_000)];
        for i in 0..3 {
            txns.push(expense(&format!("n{i}"), 45_000, "ocio").with_merchant("Netflix "));
        }
        let recs = generate_insights(&txns, &UserSettings::default());
        let sub = recs.iter().find(|r| r.kind == "possible_subscription").unwrap();
        assert_eq!(sub.title, "Revisa posible suscripción: netflix");
        assert!(sub.detail.contains("3 cargos"));
    }

    #[test]
    fn test_many_small_expenses() {
        let mut txns = vec![income("i", 100_000)];
        for i in 0..4 {
            txns.push(expense(&format!("s{i}"), 5_000, &format!("c{i}")));
        }
        let recs = generate_insights(&txns, &UserSettings::default());
        assert!(kinds(&recs).contains(&"many_small_expenses"));
    }

    #[test]
    fn test_spending_limit_rules() {
        let txns = vec![income("i", 1_000_000), expense("a", 400_000, "comida")];
        let over = UserSettings {
            savings_goal: Some(Decimal::from(50_000)),
            spending_limit: Some(Decimal::from(300_000)),
        };
        let recs = generate_insights(&txns, &over);
        assert!(kinds(&recs).contains(&"over_limit"));
        assert!(!kinds(&recs).contains(&"suggest_goal"));

        let within = UserSettings {
            spending_limit: Some(Decimal::from(500_000)),
            ..over
        };
        assert!(kinds(&generate_insights(&txns, &within)).contains(&"within_limit"));
    }

    #[test]
    fn test_share_just_below_threshold_is_monitored() {
        // 29.996% rounds to 30.00 for display but stays under the reduce threshold
        let txns = vec![
            income("i", 100_000_000),
            expense("a", 29_996, "comida"),
            expense("b", 35_002, "arriendo"),
            expense("c", 35_002, "transporte"),
        ];
        let recs = generate_insights(&txns, &UserSettings::default());
        assert!(recs.iter().any(|r| r.kind == "monitor_category" && r.title == "Vigila comida"));
        assert!(!recs.iter().any(|r| r.kind == "reduce_category" && r.title.ends_with("comida")));
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let recs = rank_and_dedupe(vec![
            Recommendation::new("x", "same", "first", 0.5),
            Recommendation::new("x", "same", "second", 0.5),
            Recommendation::new("y", "other", "third", 0.9),
        ]);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].kind, "y");
        assert_eq!(recs[1].detail, "first");
    }
}
