use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use super::{RemoteFault, RpcTransport, TransportError};

/// Odoo's `/jsonrpc` endpoint. Every call is a single POST; the service
/// (`common`, `object`) and method travel in the request params.
#[derive(Clone, Debug)]
pub struct JsonRpcTransport {
    http: reqwest::Client,
    endpoint: String,
}

impl JsonRpcTransport {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self { http, endpoint: format!("{}/jsonrpc", base_url.trim_end_matches('/')) }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: RpcParams<'a>,
    id: String,
}

#[derive(Debug, Serialize)]
struct RpcParams<'a> {
    service: &'a str,
    method: &'a str,
    args: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<RpcErrorData>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorData {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn request_body<'a>(service: &'a str, method: &'a str, args: Vec<Value>) -> RpcRequest<'a> {
    RpcRequest {
        jsonrpc: "2.0",
        method: "call",
        params: RpcParams { service, method, args },
        id: uuid::Uuid::new_v4().to_string(),
    }
}

// `data.message` carries the exception text; the top-level message is a
// generic "Odoo Server Error" banner.
fn into_result(response: RpcResponse) -> Result<Value, TransportError> {
    match response.error {
        Some(error) => {
            let (name, message) = match error.data {
                Some(data) => (data.name, data.message.unwrap_or(error.message)),
                None => (None, error.message),
            };
            Err(TransportError::Fault(RemoteFault { name, message }))
        }
        None => Ok(response.result.unwrap_or(Value::Null)),
    }
}

fn describe(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl JsonRpcTransport {
    fn map_send_error(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout { endpoint: self.endpoint.clone() }
        } else if error.is_decode() || error.is_body() {
            TransportError::Decode { endpoint: self.endpoint.clone(), message: describe(&error) }
        } else {
            TransportError::Connect { endpoint: self.endpoint.clone(), message: describe(&error) }
        }
    }
}

#[async_trait]
impl RpcTransport for JsonRpcTransport {
    async fn call(
        &self,
        service: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, TransportError> {
        let body = request_body(service, method, args);
        trace!(event_name = "odoo.jsonrpc.request", service, method, request_id = %body.id);

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|error| self.map_send_error(error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let decoded =
            response.json::<RpcResponse>().await.map_err(|error| self.map_send_error(error))?;
        into_result(decoded)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{into_result, request_body, JsonRpcTransport, RpcResponse};
    use crate::transport::TransportError;

    #[test]
    fn request_envelope_matches_odoo_jsonrpc() {
        let body = request_body("common", "version", vec![]);
        let value = serde_json::to_value(&body).expect("serialize request");

        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["method"], "call");
        assert_eq!(value["params"], json!({"service": "common", "method": "version", "args": []}));
        assert!(value["id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[test]
    fn endpoint_is_derived_from_base_url() {
        let transport = JsonRpcTransport::new(reqwest::Client::new(), "https://erp.example.com/");
        assert_eq!(transport.endpoint(), "https://erp.example.com/jsonrpc");
    }

    #[test]
    fn error_payload_becomes_named_fault() {
        let response: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": "1",
            "error": {
                "code": 200,
                "message": "Odoo Server Error",
                "data": {
                    "name": "odoo.exceptions.MissingError",
                    "message": "Record does not exist or has been deleted.",
                    "debug": "Traceback ..."
                }
            }
        }))
        .expect("decode error payload");

        match into_result(response) {
            Err(TransportError::Fault(fault)) => {
                assert!(fault.is("MissingError"));
                assert_eq!(fault.message, "Record does not exist or has been deleted.");
            }
            other => panic!("expected a fault, got {other:?}"),
        }
    }

    #[test]
    fn error_without_data_keeps_top_level_message() {
        let response: RpcResponse =
            serde_json::from_value(json!({"error": {"code": -32601, "message": "Not found"}}))
                .expect("decode error payload");

        match into_result(response) {
            Err(TransportError::Fault(fault)) => {
                assert_eq!(fault.name, None);
                assert_eq!(fault.message, "Not found");
            }
            other => panic!("expected a fault, got {other:?}"),
        }
    }

    #[test]
    fn null_result_is_a_value() {
        let response: RpcResponse =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": "1", "result": null}))
                .expect("decode result payload");
        assert_eq!(into_result(response), Ok(serde_json::Value::Null));
    }
}
