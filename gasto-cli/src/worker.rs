use tokio::sync::mpsc;

use gasto_api::ApiError;
use gasto_core::Recommendation;

use crate::loader::Loader;
use crate::panel::{ApplyTicket, FetchTicket, PanelData, PanelKind};

#[derive(Debug, Clone)]
pub enum Job {
    Fetch(FetchTicket),
    Apply { kind: PanelKind, ticket: ApplyTicket },
}

#[derive(Debug, Clone)]
pub enum PanelEvent {
    Fetched {
        kind: PanelKind,
        request_id: u64,
        result: Result<PanelData, ApiError>,
    },
    Applied {
        kind: PanelKind,
        ticket: ApplyTicket,
        result: Result<Recommendation, ApiError>,
    },
}

/// Runs every job to completion on its own task. In-flight requests are never
/// aborted; the panel drops results it no longer wants.
pub async fn run_worker(
    loader: Loader,
    mut rx: mpsc::UnboundedReceiver<Job>,
    tx: std::sync::mpsc::Sender<PanelEvent>,
) {
    while let Some(job) = rx.recv().await {
        let loader = loader.clone();
        let tx2 = tx.clone();
        tokio::spawn(async move {
            let event = match job {
                Job::Fetch(ticket) => {
                    let result = loader.load(ticket.kind, &ticket.range).await;
                    if let Err(e) = &result {
                        tracing::warn!(kind = ?ticket.kind, request_id = ticket.request_id, error = %e, "load failed");
                    }
                    PanelEvent::Fetched {
                        kind: ticket.kind,
                        request_id: ticket.request_id,
                        result,
                    }
                }
                Job::Apply { kind, ticket } => {
                    let result = loader.apply(&ticket.rec).await;
                    PanelEvent::Applied { kind, ticket, result }
                }
            };
            // receiver gone means the UI exited
            let _ = tx2.send(event);
        });
    }
}
