//! Outbound port: a single upstream wallet node's `/burst` RPC endpoint.
//!
//! Implemented by `HttpWalletTransport` (see `adapters::http`) in
//! production and by an in-memory stub in tests.

use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcMethod {
    Get,
    Post,
}

#[async_trait]
pub trait WalletTransport: Send + Sync {
    /// A label for logging; typically the wallet's base URL.
    fn label(&self) -> &str;

    /// Issues a `requestType=...` GET or POST against the wallet's `/burst`
    /// endpoint and returns the raw JSON body.
    async fn request(
        &self,
        method: RpcMethod,
        params: &HashMap<&'static str, String>,
    ) -> Result<serde_json::Value, String>;
}
