//! gasto-core: transaction model, aggregation and advice rules for the GastoSmart panels

pub mod model;
pub mod range;
pub mod money;
pub mod aggregate;
pub mod advice;
pub mod insights;

pub use model::{
    ApplyRequest, CategoryTotal, Recommendation, StatsSummary, Transaction, TxnKind, UserSettings,
    UNCATEGORIZED,
};
pub use range::DateRange;
pub use money::{format_cop, format_percent, round_half_up};
pub use aggregate::{aggregate, aggregate_all, Aggregation, TOP_CATEGORIES};
pub use advice::{advise, suggest_cuts, surplus_plan, CutSuggestion, SurplusPlan, GENERIC_ADVICE};
pub use insights::generate_insights;
