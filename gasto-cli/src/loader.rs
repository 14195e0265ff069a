use gasto_api::{ApiClient, ApiError};
use gasto_core::{advise, aggregate, generate_insights, DateRange, Recommendation, UserSettings};

use crate::config::{Config, RecommendationSource};
use crate::panel::{PanelData, PanelKind, RecommendationItem};

/// Runs the fetch-and-compute cycle behind each panel kind
#[derive(Debug, Clone)]
pub struct Loader {
    client: ApiClient,
    transactions_limit: u32,
    settings: UserSettings,
    source: RecommendationSource,
}

impl Loader {
    pub fn new(client: ApiClient, cfg: &Config) -> Self {
        Self {
            client,
            transactions_limit: cfg.api.transactions_limit,
            settings: cfg.user_settings(),
            source: cfg.recommendations.source,
        }
    }

    pub fn with_source(mut self, source: RecommendationSource) -> Self {
        self.source = source;
        self
    }

    pub async fn load(&self, kind: PanelKind, range: &DateRange) -> Result<PanelData, ApiError> {
        match kind {
            PanelKind::Alerts => Ok(PanelData::Summary(self.client.statistics(range).await?)),
            PanelKind::Advice => {
                let txns = self.client.transactions(range, self.transactions_limit).await?;
                let aggregation = aggregate(&txns, range);
                let advice = advise(&aggregation.summary, aggregation.top_categories());
                Ok(PanelData::Advice { aggregation, advice })
            }
            PanelKind::Recommendations => {
                let recs = self.recommendations(range).await?;
                Ok(PanelData::Recommendations(
                    recs.into_iter().map(RecommendationItem::new).collect(),
                ))
            }
        }
    }

    pub async fn apply(&self, rec: &Recommendation) -> Result<Recommendation, ApiError> {
        self.client.apply(rec).await
    }

    async fn recommendations(&self, range: &DateRange) -> Result<Vec<Recommendation>, ApiError> {
        match self.source {
            RecommendationSource::Server => self.client.recommendations().await,
            RecommendationSource::Local => {
                let txns = self.client.transactions(range, self.transactions_limit).await?;
                let in_range: Vec<_> = txns.into_iter().filter(|t| range.contains(t.date)).collect();
                Ok(generate_insights(&in_range, &self.settings))
            }
        }
    }
}
