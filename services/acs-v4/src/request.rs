use crate::constants::*;
use crate::SignatureAlgorithm;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use percent_encoding::utf8_percent_encode;
use popsign_core::Result;
use serde_json::Value;
use std::convert::Infallible;
use std::fmt::{Debug, Formatter};
use std::io::{Cursor, Read};
use std::str::FromStr;

/// How a structured body is serialized before signing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestBodyType {
    /// Serialize as JSON text.
    Json,
    /// Serialize as a URL-form-encoded string.
    Form,
    /// No declared encoding; structured bodies fall back to form encoding.
    #[default]
    Raw,
}

impl FromStr for RequestBodyType {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "json" => RequestBodyType::Json,
            "form" | "formData" => RequestBodyType::Form,
            _ => RequestBodyType::Raw,
        })
    }
}

/// How the response body is decoded on success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseBodyType {
    /// Parse as a JSON value.
    Json,
    /// Parse as a JSON value, no array check is made.
    Array,
    /// Read as text.
    String,
    /// Read as bytes.
    Byte,
    /// Pass the raw body through untouched.
    Binary,
    /// Read as text.
    #[default]
    Default,
}

impl FromStr for ResponseBodyType {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "json" => ResponseBodyType::Json,
            "array" => ResponseBodyType::Array,
            "string" => ResponseBodyType::String,
            "byte" => ResponseBodyType::Byte,
            "binary" => ResponseBodyType::Binary,
            _ => ResponseBodyType::Default,
        })
    }
}

/// Whether a request is signed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthType {
    /// Signed with an access key credential.
    #[default]
    AccessKey,
    /// Sent without `Authorization`.
    Anonymous,
}

impl FromStr for AuthType {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "Anonymous" => AuthType::Anonymous,
            _ => AuthType::AccessKey,
        })
    }
}

/// Request body before signing.
#[derive(Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// Raw bytes read from a stream; read exactly once while signing.
    Stream(Box<dyn Read + Send + Sync>),
    /// Structured value serialized per [`RequestBodyType`].
    Structured(Value),
}

impl Debug for Body {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Stream(_) => f.write_str("Stream(..)"),
            Body::Structured(v) => f.debug_tuple("Structured").field(v).finish(),
        }
    }
}

/// Materialized body ready to be hashed and sent.
#[derive(Debug)]
pub(crate) struct Payload {
    pub bytes: Bytes,
    pub content_type: Option<&'static str>,
}

impl Body {
    /// Consume the body into an owned buffer.
    pub(crate) fn into_payload(self, kind: RequestBodyType) -> Result<Payload> {
        match self {
            Body::Empty | Body::Structured(Value::Null) => Ok(Payload {
                bytes: Bytes::new(),
                content_type: None,
            }),
            Body::Stream(mut r) => {
                let mut buf = Vec::new();
                r.read_to_end(&mut buf)?;
                Ok(Payload {
                    bytes: buf.into(),
                    content_type: Some(CONTENT_TYPE_STREAM),
                })
            }
            Body::Structured(v) if kind == RequestBodyType::Json => Ok(Payload {
                bytes: serde_json::to_vec(&v)?.into(),
                content_type: Some(CONTENT_TYPE_JSON),
            }),
            Body::Structured(v) => Ok(Payload {
                bytes: to_form(&v).into(),
                content_type: Some(CONTENT_TYPE_FORM),
            }),
        }
    }
}

/// Serialize a structured value into a URL-form-encoded string.
///
/// Nested objects are flattened as `a.b`, arrays as `a.1`, `a.2`, ... and
/// nulls are skipped.
pub fn to_form(value: &Value) -> String {
    let mut pairs = Vec::new();
    flatten("", value, &mut pairs);

    let mut s = form_urlencoded::Serializer::new(String::new());
    for (k, v) in &pairs {
        s.append_pair(k, v);
    }
    s.finish()
}

fn flatten(prefix: &str, value: &Value, pairs: &mut Vec<(String, String)>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    };

    match value {
        Value::Null => {}
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                flatten(&join(&(idx + 1).to_string()), item, pairs);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten(&join(key), item, pairs);
            }
        }
        Value::String(s) => pairs.push((prefix.to_string(), s.clone())),
        v => pairs.push((prefix.to_string(), v.to_string())),
    }
}

/// ApiRequest is an ACS API call before signing.
#[derive(Debug)]
pub struct ApiRequest {
    /// Product id, for example `Ecs`.
    pub product_id: String,
    /// API action, sent as `x-acs-action`.
    pub action: String,
    /// API version, sent as `x-acs-version`.
    pub version: String,
    /// HTTP method.
    pub method: Method,
    /// Request path, `/` when empty.
    pub pathname: String,
    /// Query parameters, signed in the given order.
    pub query: Vec<(String, String)>,
    /// Caller headers; they override the generated defaults.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Body,
    /// Encoding of a structured body.
    pub req_body_type: RequestBodyType,
    /// Decoding of the response body.
    pub body_type: ResponseBodyType,
    /// Whether the request is signed.
    pub auth_type: AuthType,
    /// Signature algorithm, default to `ACS4-HMAC-SHA256`.
    pub signature_algorithm: Option<SignatureAlgorithm>,
    /// User agent sent with the request.
    pub user_agent: Option<String>,
}

impl ApiRequest {
    /// Create a new POST request for `action` of `product_id` at `version`.
    pub fn new(product_id: &str, action: &str, version: &str) -> Self {
        Self {
            product_id: product_id.to_string(),
            action: action.to_string(),
            version: version.to_string(),
            method: Method::POST,
            pathname: "/".to_string(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: Body::Empty,
            req_body_type: RequestBodyType::default(),
            body_type: ResponseBodyType::default(),
            auth_type: AuthType::default(),
            signature_algorithm: None,
            user_agent: None,
        }
    }

    /// Set the HTTP method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the path.
    pub fn with_pathname(mut self, pathname: &str) -> Self {
        self.pathname = pathname.to_string();
        self
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Insert a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Use a JSON encoded body.
    pub fn with_json_body(mut self, body: Value) -> Self {
        self.body = Body::Structured(body);
        self.req_body_type = RequestBodyType::Json;
        self
    }

    /// Use a URL-form-encoded body.
    pub fn with_form_body(mut self, body: Value) -> Self {
        self.body = Body::Structured(body);
        self.req_body_type = RequestBodyType::Form;
        self
    }

    /// Use a raw byte stream as body.
    pub fn with_stream(mut self, stream: impl Read + Send + Sync + 'static) -> Self {
        self.body = Body::Stream(Box::new(stream));
        self
    }

    /// Set how the response body is decoded.
    pub fn with_body_type(mut self, body_type: ResponseBodyType) -> Self {
        self.body_type = body_type;
        self
    }

    /// Set the signature algorithm.
    pub fn with_signature_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.signature_algorithm = Some(algorithm);
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = Some(user_agent.to_string());
        self
    }

    /// Send the request without signing it.
    pub fn anonymous(mut self) -> Self {
        self.auth_type = AuthType::Anonymous;
        self
    }
}

/// SignedRequest is the owned result of signing, ready for the transport.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// URL scheme.
    pub protocol: String,
    /// Resolved endpoint host.
    pub endpoint: String,
    /// HTTP method.
    pub method: Method,
    /// Request path.
    pub pathname: String,
    /// Query parameters.
    pub query: Vec<(String, String)>,
    /// Headers including `Authorization` for signed requests.
    pub headers: HeaderMap,
    /// Materialized body.
    pub body: Bytes,
    /// Decoding of the response body.
    pub body_type: ResponseBodyType,
}

impl SignedRequest {
    /// A fresh reader over the body.
    ///
    /// Each call starts from the beginning, independent of earlier readers.
    pub fn body_reader(&self) -> Cursor<Bytes> {
        Cursor::new(self.body.clone())
    }

    /// Build the URI of this request.
    pub fn uri(&self) -> String {
        let path = if self.pathname.is_empty() {
            "/"
        } else {
            &self.pathname
        };
        let mut s = format!("{}://{}", self.protocol, self.endpoint);
        s.extend(utf8_percent_encode(path, &ACS_PATH_ENCODE_SET));

        for (idx, (k, v)) in self.query.iter().enumerate() {
            s.push(if idx == 0 { '?' } else { '&' });
            s.extend(utf8_percent_encode(k, &ACS_QUERY_ENCODE_SET));
            if !v.is_empty() {
                s.push('=');
                s.extend(utf8_percent_encode(v, &ACS_QUERY_ENCODE_SET));
            }
        }

        s
    }

    /// Convert into an `http::Request` for the transport.
    pub fn into_http(self) -> Result<http::Request<Bytes>> {
        let mut req = http::Request::builder()
            .method(self.method.clone())
            .uri(self.uri())
            .body(self.body)?;
        *req.headers_mut() = self.headers;

        Ok(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_to_form() {
        let body = json!({
            "RegionId": "cn-hangzhou",
            "DryRun": false,
            "PageSize": 10,
            "Tag": [{"Key": "env", "Value": "prod test"}],
            "Empty": null,
        });

        assert_eq!(
            to_form(&body),
            "DryRun=false&PageSize=10&RegionId=cn-hangzhou&Tag.1.Key=env&Tag.1.Value=prod+test"
        );
    }

    #[test]
    fn test_stream_payload_is_rewrapped() -> anyhow::Result<()> {
        let body = Body::Stream(Box::new(Cursor::new(b"hello world".to_vec())));
        let payload = body.into_payload(RequestBodyType::Raw)?;
        assert_eq!(payload.content_type, Some(CONTENT_TYPE_STREAM));

        let signed = SignedRequest {
            protocol: "https".to_string(),
            endpoint: "example.com".to_string(),
            method: Method::PUT,
            pathname: "/".to_string(),
            query: vec![],
            headers: HeaderMap::new(),
            body: payload.bytes,
            body_type: ResponseBodyType::Default,
        };

        for _ in 0..2 {
            let mut s = String::new();
            signed.body_reader().read_to_string(&mut s)?;
            assert_eq!(s, "hello world");
        }
        Ok(())
    }

    #[test]
    fn test_structured_payload() -> anyhow::Result<()> {
        let payload = Body::Structured(json!({"Name": "test"})).into_payload(RequestBodyType::Json)?;
        assert_eq!(payload.bytes.as_ref(), br#"{"Name":"test"}"#);
        assert_eq!(payload.content_type, Some(CONTENT_TYPE_JSON));

        let payload = Body::Structured(json!({"Name": "test"})).into_payload(RequestBodyType::Raw)?;
        assert_eq!(payload.bytes.as_ref(), b"Name=test");
        assert_eq!(payload.content_type, Some(CONTENT_TYPE_FORM));

        let payload = Body::Empty.into_payload(RequestBodyType::Json)?;
        assert!(payload.bytes.is_empty());
        assert_eq!(payload.content_type, None);
        Ok(())
    }

    #[test]
    fn test_into_http() -> anyhow::Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert("x-acs-action", HeaderValue::from_static("DescribeRegions"));

        let signed = SignedRequest {
            protocol: "https".to_string(),
            endpoint: "ecs.cn-hangzhou.aliyuncs.com".to_string(),
            method: Method::GET,
            pathname: String::new(),
            query: vec![
                ("RegionId".to_string(), "cn-hangzhou".to_string()),
                ("Name".to_string(), "a b*".to_string()),
                ("Flag".to_string(), String::new()),
            ],
            headers,
            body: Bytes::new(),
            body_type: ResponseBodyType::Json,
        };

        let req = signed.into_http()?;
        assert_eq!(
            req.uri().to_string(),
            "https://ecs.cn-hangzhou.aliyuncs.com/?RegionId=cn-hangzhou&Name=a%20b%2A&Flag"
        );
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.headers()["x-acs-action"], "DescribeRegions");
        Ok(())
    }

    #[test]
    fn test_into_http_encodes_path() -> anyhow::Result<()> {
        let signed = SignedRequest {
            protocol: "https".to_string(),
            endpoint: "cs.cn-hangzhou.aliyuncs.com".to_string(),
            method: Method::GET,
            pathname: "/clusters/my cluster/nodes".to_string(),
            query: vec![],
            headers: HeaderMap::new(),
            body: Bytes::new(),
            body_type: ResponseBodyType::Json,
        };

        let req = signed.into_http()?;
        assert_eq!(
            req.uri().to_string(),
            "https://cs.cn-hangzhou.aliyuncs.com/clusters/my%20cluster/nodes"
        );
        Ok(())
    }

    #[test]
    fn test_parse_declared_kinds() {
        assert_eq!("json".parse::<RequestBodyType>(), Ok(RequestBodyType::Json));
        assert_eq!("formData".parse::<RequestBodyType>(), Ok(RequestBodyType::Form));
        assert_eq!("byte".parse::<ResponseBodyType>(), Ok(ResponseBodyType::Byte));
        assert_eq!("unknown".parse::<ResponseBodyType>(), Ok(ResponseBodyType::Default));
        assert_eq!("Anonymous".parse::<AuthType>(), Ok(AuthType::Anonymous));
        assert_eq!("AK".parse::<AuthType>(), Ok(AuthType::AccessKey));
    }
}
