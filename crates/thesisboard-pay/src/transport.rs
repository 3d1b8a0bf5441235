use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::PayError;
use crate::protocol::PAYMENT_HEADER;

/// What the agent needs from a paywall response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaywallResponse {
    pub status: u16,
    /// Header names lowercased.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl PaywallResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// GET a paywalled resource, optionally with an `X-PAYMENT` header.
#[async_trait]
pub trait PaywallTransport: Send + Sync {
    async fn get(&self, url: &str, payment: Option<&str>) -> Result<PaywallResponse, PayError>;
}

pub struct HttpPaywall {
    client: reqwest::Client,
}

impl HttpPaywall {
    pub fn new(timeout: Duration) -> Result<Self, PayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PaywallTransport for HttpPaywall {
    async fn get(&self, url: &str, payment: Option<&str>) -> Result<PaywallResponse, PayError> {
        let mut request = self.client.get(url);
        if let Some(header) = payment {
            request = request.header(PAYMENT_HEADER, header);
        }
        let resp = request.send().await?;
        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = resp.text().await?;
        Ok(PaywallResponse {
            status,
            headers,
            body,
        })
    }
}
