//! Kubo RPC Client - IPFS Node HTTP API
//!
//! Implements the `ContentStore` port against a Kubo node's `/api/v0`
//! RPC. Every RPC is a POST. Uploads are pinned and use CIDv1 so the
//! same bytes always produce the same identifier across nodes.
//!
//! No retries: a failed upload is reported to the publisher, which
//! isolates it to one publishing step.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::ContentStoreConfig;
use crate::domain::artifact::ContentId;
use crate::ports::content_store::ContentStore;

/// Response of `/api/v0/add`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddResponse {
  #[allow(dead_code)]
  name: String,
  hash: String,
}

/// Error body returned by Kubo on a failed RPC.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RpcError {
  message: String,
}

/// HTTP client for a Kubo node.
pub struct KuboClient {
  /// Underlying HTTP client.
  http: Client,
  /// `<api_url>/api/v0`, no trailing slash.
  base_url: String,
}

impl KuboClient {
  /// Create a new client from config.
  pub fn new(config: &ContentStoreConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .pool_max_idle_per_host(2)
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self {
      http,
      base_url: rpc_base(&config.api_url),
    })
  }

  fn endpoint(&self, command: &str) -> String {
    format!("{}/{command}", self.base_url)
  }

  /// POST a command with query args and turn non-2xx into an error
  /// carrying Kubo's message.
  async fn post(&self, command: &str, args: &[(&str, &str)]) -> Result<Response> {
    let response = self
      .http
      .post(self.endpoint(command))
      .query(args)
      .send()
      .await
      .with_context(|| format!("Kubo {command} request failed"))?;
    check_status(command, response).await
  }
}

/// Normalize the configured API URL into the RPC base.
fn rpc_base(api_url: &str) -> String {
  let trimmed = api_url.trim_end_matches('/');
  if trimmed.ends_with("/api/v0") {
    trimmed.to_owned()
  } else {
    format!("{trimmed}/api/v0")
  }
}

async fn check_status(command: &str, response: Response) -> Result<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }
  let body = response.text().await.unwrap_or_default();
  bail!("Kubo {command} error {status}: {}", error_message(&body))
}

/// Kubo's error message, or the raw body if it is not the JSON shape.
fn error_message(body: &str) -> String {
  serde_json::from_str::<RpcError>(body)
    .map(|e| e.message)
    .unwrap_or_else(|_| body.trim().to_owned())
}

fn is_missing_path(message: &str) -> bool {
  message.contains("does not exist") || message.contains("file not found")
}

#[async_trait]
impl ContentStore for KuboClient {
  #[instrument(skip(self, bytes), fields(size = bytes.len()))]
  async fn add(&self, name: &str, bytes: Vec<u8>) -> Result<ContentId> {
    let part = Part::bytes(bytes)
      .file_name(name.to_owned())
      .mime_str("application/octet-stream")
      .context("Invalid upload MIME type")?;
    let form = Form::new().part("file", part);

    let response = self
      .http
      .post(self.endpoint("add"))
      .query(&[("pin", "true"), ("cid-version", "1")])
      .multipart(form)
      .send()
      .await
      .context("Kubo add request failed")?;
    let response = check_status("add", response).await?;

    let added: AddResponse = response
      .json()
      .await
      .context("Kubo add returned an unexpected body")?;

    debug!(cid = %added.hash, "Content added");
    Ok(ContentId::new(added.hash))
  }

  async fn make_dir(&self, path: &str) -> Result<()> {
    self
      .post("files/mkdir", &[("arg", path), ("parents", "true")])
      .await?;
    Ok(())
  }

  async fn remove(&self, path: &str) -> Result<bool> {
    let response = self
      .http
      .post(self.endpoint("files/rm"))
      .query(&[("arg", path)])
      .send()
      .await
      .context("Kubo files/rm request failed")?;

    let status = response.status();
    if status.is_success() {
      return Ok(true);
    }
    let message = error_message(&response.text().await.unwrap_or_default());
    if is_missing_path(&message) {
      return Ok(false);
    }
    bail!("Kubo files/rm error {status}: {message}")
  }

  async fn link(&self, cid: &ContentId, path: &str) -> Result<()> {
    let source = cid.ipfs_path();
    self
      .post(
        "files/cp",
        &[("arg", source.as_str()), ("arg", path), ("parents", "true")],
      )
      .await?;
    Ok(())
  }

  async fn is_healthy(&self) -> bool {
    self.post("version", &[]).await.is_ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_rpc_base_normalization() {
    assert_eq!(rpc_base("http://127.0.0.1:5001"), "http://127.0.0.1:5001/api/v0");
    assert_eq!(rpc_base("http://127.0.0.1:5001/"), "http://127.0.0.1:5001/api/v0");
    assert_eq!(rpc_base("http://ipfs:5001/api/v0/"), "http://ipfs:5001/api/v0");
  }

  #[test]
  fn test_add_response_parsing() {
    let body = r#"{"Name":"round-1.json","Hash":"bafkreiabc","Size":"120"}"#;
    let parsed: AddResponse = serde_json::from_str(body).unwrap();
    assert_eq!(parsed.hash, "bafkreiabc");
  }

  #[test]
  fn test_missing_path_is_tolerated() {
    let body = r#"{"Message":"file does not exist","Code":0,"Type":"error"}"#;
    assert!(is_missing_path(&error_message(body)));
    assert!(!is_missing_path(&error_message("permission denied")));
  }
}
