// Copyright (c) 2026 rezky_nightky

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::error::SubmitError;
use crate::form::{FieldMap, FormKind};
use crate::workflow::{Delivery, Receipt};

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

#[derive(Debug, Default, Deserialize)]
struct ApiReply {
    #[serde(default)]
    message: Option<String>,
}

fn reply_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiReply>(body)
        .ok()
        .and_then(|r| r.message)
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SubmitError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ghostgrid/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // Any 2xx is accepted; its body is optional.
    pub async fn submit(&self, kind: FormKind, fields: &FieldMap) -> Result<Receipt, SubmitError> {
        let url = self.url(&format!("/api/{}", kind.endpoint()));
        tracing::info!(%url, form = ?kind, "posting submission");

        let resp = self.http.post(&url).json(fields).send().await?;
        let status = resp.status();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(%url, error = %e, "could not read reply body");
                String::new()
            }
        };

        if status.is_success() {
            return Ok(Receipt {
                message: reply_message(&body),
            });
        }

        let message = reply_message(&body);
        tracing::warn!(%url, status = status.as_u16(), ?message, "submission rejected");
        Err(SubmitError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn list(&self, path: &str) -> Result<Vec<Value>, SubmitError> {
        let url = self.url(path);
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                message: reply_message(&body),
            });
        }
        serde_json::from_str(&body)
            .map_err(|e| SubmitError::Transport(format!("malformed listing from {url}: {e}")))
    }

    pub async fn list_signups(&self) -> Result<Vec<Value>, SubmitError> {
        self.list("/api/signups").await
    }

    pub async fn list_messages(&self) -> Result<Vec<Value>, SubmitError> {
        self.list("/api/messages").await
    }
}

impl Delivery for ApiClient {
    async fn deliver(&self, kind: FormKind, fields: &FieldMap) -> Result<Receipt, SubmitError> {
        self.submit(kind, fields).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::form::FieldValue;

    fn contact_fields() -> FieldMap {
        [("name", "A"), ("email", "a@b.co"), ("message", "hi")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), FieldValue::from(v)))
            .collect()
    }

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn contact_posts_exact_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/contact"))
            .and(body_json(json!({"name": "A", "email": "a@b.co", "message": "hi"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "success", "message": "Message sent successfully"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let receipt = client(&server)
            .submit(FormKind::Contact, &contact_fields())
            .await
            .unwrap();
        assert_eq!(receipt.message.as_deref(), Some("Message sent successfully"));
    }

    #[tokio::test]
    async fn signup_sends_interests_as_a_list() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/signup"))
            .and(body_json(json!({
                "name": "Ada",
                "email": "ada@ghost.dev",
                "expertise": "intermediate",
                "interests": ["ctf", "osint"]
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let mut fields = FieldMap::new();
        fields.insert("name".into(), "Ada".into());
        fields.insert("email".into(), "ada@ghost.dev".into());
        fields.insert("expertise".into(), "intermediate".into());
        fields.insert(
            "interests".into(),
            FieldValue::from(vec!["ctf".to_string(), "osint".to_string()]),
        );
        let receipt = client(&server)
            .submit(FormKind::Signup, &fields)
            .await
            .unwrap();
        assert_eq!(receipt.message, None);
    }

    #[tokio::test]
    async fn server_error_surfaces_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/contact"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({"status": "error", "message": "quota exceeded"})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .submit(FormKind::Contact, &contact_fields())
            .await
            .unwrap_err();
        match err {
            SubmitError::Rejected { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message.as_deref(), Some("quota exceeded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejection_without_json_has_no_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .submit(FormKind::Contact, &contact_fields())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Rejected {
                status: 404,
                message: None
            }
        ));
    }

    #[tokio::test]
    async fn success_with_garbage_body_still_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok!"))
            .mount(&server)
            .await;

        let receipt = client(&server)
            .submit(FormKind::Contact, &contact_fields())
            .await
            .unwrap();
        assert_eq!(receipt, Receipt::default());
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let api = ApiClient::new("http://127.0.0.1:1/", Duration::from_secs(2)).unwrap();
        assert_eq!(api.base_url(), "http://127.0.0.1:1");
        let err = api
            .submit(FormKind::Contact, &contact_fields())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Transport(_)), "{err:?}");
    }

    #[tokio::test]
    async fn listing_endpoints_return_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/signups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 2, "name": "Bo", "email": "bo@x.io", "timestamp": "2026-01-02T00:00:00"},
                {"id": 1, "name": "Al", "email": "al@x.io", "timestamp": "2026-01-01T00:00:00"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/messages"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "db down"})))
            .mount(&server)
            .await;

        let api = client(&server);
        let rows = api.list_signups().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "Bo");

        let err = api.list_messages().await.unwrap_err();
        assert_eq!(err.user_message(FormKind::Contact), "db down");
    }
}
