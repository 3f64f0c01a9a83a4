//! # Request Command
//!
//! Sends an arbitrary request through the authenticated client, with the
//! same bearer injection and session expiry handling as every other call.
//!
//! ```bash
//! portal request GET /wallet
//! portal request GET /jobs --param category=design --param page=2
//! portal request POST /businesses --data '{"name":"Acme"}'
//! ```

use anyhow::Result;
use reqwest::Method;

use crate::api::{ApiClient, RequestConfig};
use crate::errors::display_validation_error;
use crate::exit_codes::*;

use super::{build_client, report};

/// Arguments for the request command
#[derive(Debug, Clone)]
pub struct RequestArgs {
    /// HTTP method
    pub method: String,
    /// Path relative to the base URL
    pub path: String,
    /// Query parameters as `key=value`
    pub params: Vec<String>,
    /// JSON body
    pub data: Option<String>,
}

/// Execute the request command
///
/// Prints the response body, pretty-printed when it is JSON.
pub async fn execute(args: RequestArgs) -> Result<i32> {
    let client = build_client()?;
    run(&client, &args).await
}

pub(crate) async fn run(client: &ApiClient, args: &RequestArgs) -> Result<i32> {
    let request = match build_request(args) {
        Ok(request) => request,
        Err(message) => {
            display_validation_error(&message);
            return Ok(EXIT_INVALID_INPUT);
        }
    };

    let response = match client.send(request).await {
        Ok(response) => response,
        Err(e) => return Ok(report(&e)),
    };

    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            crate::errors::display_network_error(&e.to_string());
            return Ok(EXIT_NETWORK_ERROR);
        }
    };

    if !text.trim().is_empty() {
        println!("{}", pretty_body(&text));
    }
    Ok(EXIT_SUCCESS)
}

fn build_request(args: &RequestArgs) -> Result<RequestConfig, String> {
    let method = Method::from_bytes(args.method.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| format!("Unknown HTTP method: {}", args.method))?;

    let mut request = RequestConfig::new(method, args.path.trim());
    for param in &args.params {
        let (key, value) = parse_param(param)?;
        request = request.param(key, value);
    }

    if let Some(data) = &args.data {
        let body: serde_json::Value =
            serde_json::from_str(data).map_err(|e| format!("--data is not valid JSON: {}", e))?;
        request = request.body(body);
    }

    Ok(request)
}

fn parse_param(param: &str) -> Result<(&str, &str), String> {
    match param.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(format!("Expected key=value, got '{}'", param)),
    }
}

fn pretty_body(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| text.to_string())
}
