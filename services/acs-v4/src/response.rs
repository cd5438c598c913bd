use crate::constants::X_ACS_REQUEST_ID;
use crate::request::ResponseBodyType;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use log::debug;
use popsign_core::{Error, Result};
use serde_json::{Map, Value};

/// ServiceError is the error answered by the ACS gateway.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ServiceError {
    /// HTTP status code.
    pub status_code: u16,
    /// Service error code, for example `Throttling`.
    pub code: String,
    /// Composed message: `code: {status}, {message} request id: {request_id}`.
    pub message: String,
    /// Message as answered by the service.
    pub raw_message: String,
    /// Longer description, if any.
    pub description: String,
    /// Request id assigned by the gateway.
    pub request_id: String,
    /// Decoded error body with `statusCode` inserted.
    pub data: Value,
}

impl From<ServiceError> for Error {
    fn from(err: ServiceError) -> Self {
        Error::service_failure(err.to_string()).with_source(err)
    }
}

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// No body, answered with `204 No Content`.
    Empty,
    /// Raw body passed through untouched.
    Binary(Bytes),
    /// Body read as bytes.
    Bytes(Vec<u8>),
    /// Body read as text.
    String(String),
    /// Body parsed as JSON.
    Json(Value),
}

/// ApiResponse is the decoded, successful response of an ACS call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Decoded body.
    pub body: ResponseBody,
}

/// Decode a response according to the declared body type.
///
/// Statuses in `400..600` are turned into a [`ServiceError`].
pub fn decode_response(
    body_type: ResponseBodyType,
    resp: http::Response<Bytes>,
) -> Result<ApiResponse> {
    let (parts, body) = resp.into_parts();
    let status = parts.status;

    if status.is_client_error() || status.is_server_error() {
        return Err(service_error(status, &parts.headers, &body).into());
    }

    let body = if status == StatusCode::NO_CONTENT {
        ResponseBody::Empty
    } else {
        match body_type {
            ResponseBodyType::Binary => ResponseBody::Binary(body),
            ResponseBodyType::Byte => ResponseBody::Bytes(body.to_vec()),
            ResponseBodyType::Json | ResponseBodyType::Array => {
                ResponseBody::Json(serde_json::from_slice(&body)?)
            }
            ResponseBodyType::String | ResponseBodyType::Default => {
                ResponseBody::String(String::from_utf8(body.to_vec())?)
            }
        }
    };

    Ok(ApiResponse {
        status,
        headers: parts.headers,
        body,
    })
}

fn service_error(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> ServiceError {
    let mut data = serde_json::from_slice::<Value>(body).unwrap_or_else(|err| {
        debug!("error response body is not json: {err}");
        Value::Object(Map::new())
    });

    let mut request_id = field(&data, &["RequestId", "requestId"]);
    if let Some(v) = headers
        .get(X_ACS_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
    {
        request_id = v.to_string();
    }
    let code = field(&data, &["Code", "code"]);
    let raw_message = field(&data, &["Message", "message"]);
    let description = field(&data, &["Description", "description"]);

    if let Value::Object(map) = &mut data {
        map.insert("statusCode".to_string(), Value::from(status.as_u16()));
    }

    ServiceError {
        status_code: status.as_u16(),
        code,
        message: format!(
            "code: {}, {} request id: {}",
            status.as_u16(),
            raw_message,
            request_id
        ),
        raw_message,
        description,
        request_id,
        data,
    }
}

/// Read the first present, non-null key as a string.
fn field(data: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| match data.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(v) => Some(v.to_string()),
        })
        .unwrap_or_default()
}
