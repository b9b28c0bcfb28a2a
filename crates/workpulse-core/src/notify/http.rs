//! HTTP push gateway.
//!
//! One POST per logical send. The payload follows the legacy FCM
//! multicast shape: `registration_ids` plus a `notification` block for
//! display and a `data` block for the receiving app. The sweep runs
//! synchronously, so the blocking client is used.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;
use crate::model::WorkerId;
use crate::notify::{DeliveryReport, PushGateway, PushMessage};
use crate::store::PushConfig;

#[derive(Serialize)]
struct PushEnvelope<'a> {
    registration_ids: &'a [String],
    notification: NotificationBlock<'a>,
    data: DataBlock<'a>,
}

#[derive(Serialize)]
struct NotificationBlock<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Serialize)]
struct DataBlock<'a> {
    action: &'a str,
    user_id: WorkerId,
}

/// Multicast result body. Gateways that answer 2xx with another shape
/// just yield zero counts; the send itself still succeeded.
#[derive(Debug, Default, Deserialize)]
struct GatewayResponse {
    #[serde(default)]
    success: u32,
    #[serde(default)]
    failure: u32,
}

/// Push gateway speaking HTTP to a configured endpoint.
pub struct HttpPushGateway {
    client: reqwest::blocking::Client,
    endpoint: String,
    server_key: String,
}

impl HttpPushGateway {
    /// Build a gateway from the push configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &PushConfig) -> Result<Self, NotifyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            server_key: config.server_key.clone(),
        })
    }
}

impl PushGateway for HttpPushGateway {
    fn send(&self, message: &PushMessage) -> Result<DeliveryReport, NotifyError> {
        if message.tokens.is_empty() {
            return Err(NotifyError::NoDestination(message.recipient));
        }

        let envelope = PushEnvelope {
            registration_ids: &message.tokens,
            notification: NotificationBlock {
                title: &message.title,
                body: &message.body,
            },
            data: DataBlock {
                action: &message.action,
                user_id: message.recipient,
            },
        };

        let mut request = self.client.post(&self.endpoint).json(&envelope);
        if !self.server_key.is_empty() {
            request = request.bearer_auth(&self.server_key);
        }

        let response = request.send()?;
        if response.status().is_success() {
            let counts: GatewayResponse = response.json().unwrap_or_default();
            Ok(DeliveryReport {
                delivered: counts.success,
                failed: counts.failure,
            })
        } else {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            Err(NotifyError::Rejected { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway_for(server: &mockito::ServerGuard, key: &str) -> HttpPushGateway {
        HttpPushGateway::new(&PushConfig {
            endpoint: format!("{}/send", server.url()),
            server_key: key.to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn send_posts_envelope_and_parses_counts() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/send")
            .match_header("authorization", "Bearer test-key")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "registration_ids": ["tok-a", "tok-b"],
                "notification": { "title": "Tracking stopped" },
                "data": { "action": "resume", "user_id": 7 }
            })))
            .with_status(200)
            .with_body(r#"{"success":2,"failure":0,"multicast_id":1}"#)
            .create();

        let gateway = gateway_for(&server, "test-key");
        let message = PushMessage::resume(7, vec!["tok-a".into(), "tok-b".into()]);
        let report = gateway.send(&message).unwrap();

        mock.assert();
        assert_eq!(
            report,
            DeliveryReport {
                delivered: 2,
                failed: 0
            }
        );
    }

    #[test]
    fn partial_failure_counts_surface() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/send")
            .with_status(200)
            .with_body(r#"{"success":1,"failure":1}"#)
            .create();

        let gateway = gateway_for(&server, "");
        let message = PushMessage::stop(3, vec!["a".into(), "b".into()]);
        let report = gateway.send(&message).unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn non_success_status_is_rejected() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/send")
            .with_status(401)
            .with_body("bad key")
            .create();

        let gateway = gateway_for(&server, "wrong");
        let message = PushMessage::resume(1, vec!["tok".into()]);
        match gateway.send(&message) {
            Err(NotifyError::Rejected { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn empty_token_list_is_refused_without_a_request() {
        let server = mockito::Server::new();
        let gateway = gateway_for(&server, "k");
        let message = PushMessage::resume(42, Vec::new());
        match gateway.send(&message) {
            Err(NotifyError::NoDestination(worker)) => assert_eq!(worker, 42),
            other => panic!("expected NoDestination, got {other:?}"),
        }
    }

    #[test]
    fn unrecognized_success_body_yields_zero_counts() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/send")
            .with_status(200)
            .with_body("ok")
            .create();

        let gateway = gateway_for(&server, "");
        let message = PushMessage::early_arrival(5, vec!["tok".into()]);
        let report = gateway.send(&message).unwrap();
        assert_eq!(report, DeliveryReport::default());
    }
}
