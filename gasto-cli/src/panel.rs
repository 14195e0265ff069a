//! Toggleable panel state machine.
//!
//! A panel is `Closed` until opened. Opening (or refreshing) issues a [`FetchTicket`]
//! and moves it to `Loading`; the fetch result is committed only when it belongs to
//! the newest ticket and the panel is still open. Older or orphaned results are dropped.

use gasto_api::{ApiError, Messages};
use gasto_core::{Aggregation, DateRange, Recommendation, StatsSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    /// Totals from the statistics endpoint
    Alerts,
    /// Transactions aggregated locally plus advice text
    Advice,
    /// Scored recommendation records with per-item apply
    Recommendations,
}

impl PanelKind {
    pub const ALL: [PanelKind; 3] = [PanelKind::Alerts, PanelKind::Advice, PanelKind::Recommendations];

    pub fn title(self) -> &'static str {
        match self {
            PanelKind::Alerts => "Alertas",
            PanelKind::Advice => "Consejos",
            PanelKind::Recommendations => "Recomendaciones",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationItem {
    pub rec: Recommendation,
    pub applying: bool,
    pub error: Option<String>,
}

impl RecommendationItem {
    pub fn new(rec: Recommendation) -> Self {
        Self {
            rec,
            applying: false,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelData {
    Summary(StatsSummary),
    Advice {
        aggregation: Aggregation,
        advice: Vec<String>,
    },
    Recommendations(Vec<RecommendationItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelState {
    Closed,
    Loading,
    Loaded(PanelData),
    /// User-facing message
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub request_id: u64,
    pub kind: PanelKind,
    pub range: DateRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplyTicket {
    /// Fetch the item list came from
    pub fetch_id: u64,
    pub index: usize,
    pub rec: Recommendation,
}

#[derive(Debug, Clone)]
pub struct Panel {
    kind: PanelKind,
    state: PanelState,
    range: DateRange,
    latest: u64,
    messages: Messages,
}

impl Panel {
    pub fn new(kind: PanelKind, range: DateRange, messages: Messages) -> Self {
        Self {
            kind,
            state: PanelState::Closed,
            range,
            latest: 0,
            messages,
        }
    }

    pub fn kind(&self) -> PanelKind {
        self.kind
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, PanelState::Closed)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, PanelState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            PanelState::Error(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<&PanelData> {
        match &self.state {
            PanelState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    /// Totals shown by the panel, if it has any loaded
    pub fn stats(&self) -> Option<&StatsSummary> {
        match self.data()? {
            PanelData::Summary(summary) => Some(summary),
            PanelData::Advice { aggregation, .. } => Some(&aggregation.summary),
            PanelData::Recommendations(_) => None,
        }
    }

    /// Opening an already open panel starts over with the new range and supersedes any
    /// fetch still in flight.
    pub fn open(&mut self, range: DateRange) -> FetchTicket {
        self.range = range;
        self.start_fetch()
    }

    /// Re-fetches the current range. Only valid once a fetch has settled.
    pub fn refresh(&mut self) -> Option<FetchTicket> {
        match self.state {
            PanelState::Loaded(_) | PanelState::Error(_) => Some(self.start_fetch()),
            PanelState::Closed | PanelState::Loading => None,
        }
    }

    pub fn close(&mut self) {
        if self.is_loading() {
            tracing::debug!(kind = ?self.kind, request_id = self.latest, "closed while loading");
        }
        self.state = PanelState::Closed;
    }

    /// Commits a fetch result. Returns false when it was stale and got dropped.
    pub fn resolve(&mut self, request_id: u64, result: Result<PanelData, ApiError>) -> bool {
        if request_id != self.latest || !self.is_loading() {
            tracing::debug!(
                kind = ?self.kind,
                request_id,
                latest = self.latest,
                open = self.is_open(),
                "dropping stale fetch result"
            );
            return false;
        }

        self.state = match result {
            Ok(data) => PanelState::Loaded(data),
            Err(e) => {
                tracing::warn!(kind = ?self.kind, request_id, error = %e, "fetch failed");
                PanelState::Error(e.user_message(&self.messages))
            }
        };
        true
    }

    /// Marks a recommendation as being applied and returns the job to run
    pub fn begin_apply(&mut self, index: usize) -> Option<ApplyTicket> {
        let fetch_id = self.latest;
        let item = self.items_mut()?.get_mut(index)?;
        if item.applying || item.rec.applied {
            return None;
        }
        item.applying = true;
        item.error = None;
        Some(ApplyTicket {
            fetch_id,
            index,
            rec: item.rec.clone(),
        })
    }

    /// A failed apply marks only that item; the list itself is kept.
    pub fn finish_apply(&mut self, ticket: &ApplyTicket, result: Result<Recommendation, ApiError>) -> bool {
        if ticket.fetch_id != self.latest {
            return false;
        }
        let messages = self.messages.clone();
        let Some(item) = self.items_mut().and_then(|items| items.get_mut(ticket.index)) else {
            return false;
        };
        item.applying = false;
        match result {
            Ok(updated) => {
                item.rec = updated;
                item.error = None;
            }
            Err(e) => {
                tracing::warn!(rec_type = %ticket.rec.kind, error = %e, "apply failed");
                item.error = Some(e.user_message(&messages));
            }
        }
        true
    }

    fn items_mut(&mut self) -> Option<&mut Vec<RecommendationItem>> {
        match &mut self.state {
            PanelState::Loaded(PanelData::Recommendations(items)) => Some(items),
            _ => None,
        }
    }

    fn start_fetch(&mut self) -> FetchTicket {
        self.latest += 1;
        self.state = PanelState::Loading;
        tracing::debug!(kind = ?self.kind, request_id = self.latest, "fetch issued");
        FetchTicket {
            request_id: self.latest,
            kind: self.kind,
            range: self.range,
        }
    }
}
