//! Typed clients for the backend services' unary RPC surfaces.

pub mod document_service;
pub mod user_service;

pub use document_service::DocumentServiceClient;
pub use user_service::UserServiceClient;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::status::{RpcError, RpcStatus};

/// A failed backend call, carrying the wire status so the gateway can map it
/// onto the right HTTP response without parsing message text.
#[derive(Debug, Clone)]
pub struct ClientError {
    pub status: RpcStatus,
    pub message: String,
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.status, self.message)
    }
}

impl std::error::Error for ClientError {}

impl ClientError {
    fn transport(message: impl Into<String>) -> Self {
        Self {
            status: RpcStatus::Internal,
            message: message.into(),
        }
    }
}

/// One unary call: POST the request to `{base}/rpc/{method}`, parse the
/// reply on success or the error envelope on failure.
pub(crate) async fn call_unary<Req, Reply>(
    http: &reqwest::Client,
    base_url: &str,
    method: &str,
    request: &Req,
) -> Result<Reply, ClientError>
where
    Req: Serialize,
    Reply: DeserializeOwned,
{
    let url = format!("{base_url}/rpc/{method}");
    let response = http
        .post(&url)
        .json(request)
        .send()
        .await
        .map_err(|e| ClientError::transport(format!("failed to call {url}: {e}")))?;

    if response.status().is_success() {
        response
            .json::<Reply>()
            .await
            .map_err(|e| ClientError::transport(format!("failed to parse reply from {url}: {e}")))
    } else {
        let status = response.status();
        match response.json::<RpcError>().await {
            Ok(envelope) => Err(ClientError {
                status: envelope.code,
                message: envelope.message,
            }),
            Err(_) => Err(ClientError::transport(format!(
                "call to {url} failed with http status {status} and no error envelope"
            ))),
        }
    }
}
