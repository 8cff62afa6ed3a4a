//! `reqwest`-backed `WalletTransport` against a wallet node's `/burst`
//! endpoint.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::ports::outbound::{RpcMethod, WalletTransport};

pub struct HttpWalletTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpWalletTransport {
    pub fn new(wallet_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client build is infallible with these options");
        Self {
            base_url: format!("{}/burst", wallet_url.trim_end_matches('/')),
            client,
        }
    }
}

#[async_trait]
impl WalletTransport for HttpWalletTransport {
    fn label(&self) -> &str {
        &self.base_url
    }

    async fn request(
        &self,
        method: RpcMethod,
        params: &HashMap<&'static str, String>,
    ) -> Result<serde_json::Value, String> {
        let builder = match method {
            RpcMethod::Get => self.client.get(&self.base_url).query(params),
            RpcMethod::Post => self.client.post(&self.base_url).query(params),
        };

        let response = builder.send().await.map_err(|e| e.to_string())?;
        response.json::<serde_json::Value>().await.map_err(|e| e.to_string())
    }
}
