//! [`RpcSender`] over HTTP POST.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::config::RpcClientConfig;
use crate::error::RpcError;
use crate::request::{Response, RpcRequest};
use crate::sender::RpcSender;

#[derive(Debug, Clone)]
pub struct HttpSender {
    // reqwest::Client is internally reference counted.
    client: Client,
    url: Url,
    max_response_size: usize,
}

impl HttpSender {
    pub fn new(config: &RpcClientConfig) -> Result<Self, RpcError> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, config.http_url()?, config.max_response_size))
    }

    pub fn with_client(client: Client, url: Url, max_response_size: usize) -> Self {
        Self {
            client,
            url,
            max_response_size,
        }
    }

    async fn post<B: serde::Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        body: &B,
    ) -> Result<T, RpcError> {
        let body = serde_json::to_vec(body)?;
        let mut response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if let Some(len) = response.content_length() {
            if len > self.max_response_size as u64 {
                return Err(self.too_large());
            }
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() + chunk.len() > self.max_response_size {
                return Err(self.too_large());
            }
            bytes.extend_from_slice(&chunk);
        }
        trace!(%status, len = bytes.len(), "http response");

        match serde_json::from_slice(&bytes) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(RpcError::Transport(format!(
                "http status {status}: {}",
                String::from_utf8_lossy(&bytes[..bytes.len().min(256)])
            ))),
            Err(e) => Err(e.into()),
        }
    }

    fn too_large(&self) -> RpcError {
        RpcError::LimitExceeded(format!(
            "response larger than {} bytes",
            self.max_response_size
        ))
    }
}

#[async_trait]
impl RpcSender for HttpSender {
    async fn send(&self, request: RpcRequest) -> Result<Response, RpcError> {
        debug!(id = request.id, method = %request.method, "http request");
        self.post(&request).await
    }

    async fn send_batch(&self, requests: Vec<RpcRequest>) -> Result<Vec<Response>, RpcError> {
        debug!(len = requests.len(), "http batch");
        match self.post::<_, Value>(&requests).await? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).map_err(RpcError::from))
                .collect(),
            // A batch the server refused as a whole comes back as one
            // error object instead of an array.
            other => {
                let reply: Response = serde_json::from_value(other)?;
                match reply.error {
                    Some(error) => Err(RpcError::BatchRejected {
                        code: error.code,
                        message: error.message,
                    }),
                    None => Err(RpcError::InvalidResponse(
                        "batch reply is not an array".into(),
                    )),
                }
            }
        }
    }

    fn url(&self) -> String {
        self.url.to_string()
    }
}
