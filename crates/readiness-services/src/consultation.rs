//! HTTP consultation intake (webhook style).

use async_trait::async_trait;
use tracing::instrument;

use readiness_core::traits::{ConsultationIntake, ConsultationRequest};

use crate::http::{build_client, check_status, send_error};

/// Posts consultation requests as JSON to a webhook URL.
pub struct HttpConsultationIntake {
    webhook_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpConsultationIntake {
    pub fn new(webhook_url: &str, api_key: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            webhook_url: webhook_url.to_string(),
            api_key,
            client: build_client()?,
        })
    }
}

#[async_trait]
impl ConsultationIntake for HttpConsultationIntake {
    fn name(&self) -> &str {
        "webhook"
    }

    #[instrument(skip(self, request), fields(company = %request.company))]
    async fn submit(&self, request: &ConsultationRequest) -> anyhow::Result<()> {
        let mut builder = self.client.post(&self.webhook_url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await.map_err(send_error)?;
        check_status(response).await?;
        tracing::info!("consultation request submitted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readiness_core::traits::CONSULTATION_SOURCE;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_contact_fields() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/hooks/consult"))
            .and(body_partial_json(serde_json::json!({
                "name": "Dana Reyes",
                "email": "dana@acme.example",
                "company": "Acme",
                "phone": "",
                "source": CONSULTATION_SOURCE
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let intake =
            HttpConsultationIntake::new(&format!("{}/hooks/consult", server.uri()), None).unwrap();
        let request = ConsultationRequest::new("Dana Reyes", "dana@acme.example", "Acme");
        intake.submit(&request).await.unwrap();
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let intake = HttpConsultationIntake::new(&server.uri(), None).unwrap();
        let request = ConsultationRequest::new("Dana Reyes", "dana@acme.example", "Acme");
        let err = intake.submit(&request).await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
