use std::sync::Arc;
use todoc_api::endpoints::daily_tips::{DailyTip, Language};
use todoc_api::{Gateway, Request};

use super::call;
use crate::error::AppError;

pub struct TipService {
    gateway: Arc<Gateway>,
    latest: Option<DailyTip>,
}

impl TipService {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            latest: None,
        }
    }

    pub fn latest(&self) -> Option<&DailyTip> {
        self.latest.as_ref()
    }

    /// Fetch a random tip; `None` when none exist for the language
    pub async fn random(&mut self, language: Language) -> Result<Option<&DailyTip>, AppError> {
        let tip = call(&self.gateway, Request::daily_tips().random(language)).await?;
        if tip.is_none() {
            tracing::debug!("No daily tips available for {:?}", language);
        }
        self.latest = tip;
        Ok(self.latest.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use todoc_api::testing::TestGateway;

    #[tokio::test]
    async fn test_random_tip() {
        let t = TestGateway::new();
        t.transport
            .respond_json(
                200,
                json!({"id": 1, "content": "Tummy time helps.", "language": "eng",
                       "created_at": "2024-05-01T00:00:00", "updated_at": "2024-05-01T00:00:00"}),
            )
            .respond(200, "null");
        let mut service = TipService::new(Arc::new(t.gateway));

        let tip = service.random(Language::Eng).await.unwrap().cloned();
        assert_eq!(tip.unwrap().content, "Tummy time helps.");

        assert!(service.random(Language::Eng).await.unwrap().is_none());
        assert!(service.latest().is_none());
    }
}
