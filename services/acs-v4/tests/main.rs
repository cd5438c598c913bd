use async_trait::async_trait;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE, HOST};
use http::{Method, StatusCode};
use log::debug;
use popsign_acs_v4::{
    ApiRequest, Client, Config, ResponseBody, ResponseBodyType, ServiceError,
    SignatureAlgorithm, StaticCredentialProvider,
};
use popsign_core::{Context, ErrorKind, HttpSend, Result, StaticEnv};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// MockHttpSend answers with a canned response and records every request.
#[derive(Debug, Clone)]
struct MockHttpSend {
    status: u16,
    headers: Vec<(&'static str, &'static str)>,
    body: &'static str,
    sent: Arc<Mutex<Vec<http::Request<Bytes>>>>,
}

impl MockHttpSend {
    fn new(status: u16, body: &'static str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
            sent: Arc::default(),
        }
    }

    fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    fn sent(&self) -> Vec<http::Request<Bytes>> {
        std::mem::take(&mut *self.sent.lock().expect("lock must not be poisoned"))
    }
}

#[async_trait]
impl HttpSend for MockHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        debug!("mock received request: {req:?}");
        self.sent
            .lock()
            .expect("lock must not be poisoned")
            .push(req);

        let mut builder = http::Response::builder().status(self.status);
        for (k, v) in &self.headers {
            builder = builder.header(*k, *v);
        }
        Ok(builder.body(Bytes::from_static(self.body.as_bytes()))?)
    }
}

fn init_client(http: MockHttpSend) -> Client {
    let _ = env_logger::builder().is_test(true).try_init();

    let ctx = Context::new().with_http_send(http).with_env(StaticEnv {
        envs: HashMap::from([(
            "ALIBABA_CLOUD_REGION_ID".to_string(),
            "cn-hangzhou".to_string(),
        )]),
    });
    let config = Config::default()
        .with_endpoint_rule("regional")
        .from_env(&ctx);

    Client::new(
        ctx,
        config,
        StaticCredentialProvider::new("accessKeyId", "accessKeySecret"),
    )
}

#[tokio::test]
async fn test_call_json_api() -> Result<()> {
    let http = MockHttpSend::new(200, r#"{"RequestId":"r-1","Regions":{"Region":[]}}"#);
    let client = init_client(http.clone());

    let req = ApiRequest::new("Ecs", "DescribeRegions", "2014-05-26")
        .with_method(Method::GET)
        .with_query("RegionId", "cn-hangzhou")
        .with_body_type(ResponseBodyType::Json);
    let resp = client.call(req).await?;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.body,
        ResponseBody::Json(json!({"RequestId": "r-1", "Regions": {"Region": []}}))
    );

    let sent = http.sent();
    assert_eq!(sent.len(), 1);
    let req = &sent[0];
    assert_eq!(req.method(), Method::GET);
    assert_eq!(
        req.uri().to_string(),
        "https://ecs.cn-hangzhou.aliyuncs.com/?RegionId=cn-hangzhou"
    );
    assert_eq!(req.headers()[HOST], "ecs.cn-hangzhou.aliyuncs.com");
    assert_eq!(req.headers()["x-acs-action"], "DescribeRegions");
    assert_eq!(req.headers()["x-acs-version"], "2014-05-26");

    let authorization = req.headers()[AUTHORIZATION].to_str()?;
    assert!(authorization.starts_with("ACS4-HMAC-SHA256 Credential=accessKeyId/"));
    assert!(authorization.contains("/cn-hangzhou/Ecs/aliyun_v4_request,SignedHeaders=host;x-acs-action;x-acs-content-sha256;x-acs-date;x-acs-signature-nonce;x-acs-version,Signature="));
    Ok(())
}

#[tokio::test]
async fn test_call_with_form_body_and_sm3() -> Result<()> {
    let http = MockHttpSend::new(200, "ok");
    let client = init_client(http.clone());

    let req = ApiRequest::new("Ecs", "CreateInstance", "2014-05-26")
        .with_form_body(json!({"InstanceName": "my instance", "Tag": [{"Key": "a"}]}))
        .with_signature_algorithm(SignatureAlgorithm::HmacSm3);
    let resp = client.call(req).await?;
    assert_eq!(resp.body, ResponseBody::String("ok".to_string()));

    let sent = http.sent();
    let req = &sent[0];
    assert_eq!(req.method(), Method::POST);
    assert_eq!(req.body().as_ref(), b"InstanceName=my+instance&Tag.1.Key=a");
    assert_eq!(
        req.headers()[CONTENT_TYPE],
        "application/x-www-form-urlencoded"
    );
    assert!(req.headers().get("x-acs-content-sm3").is_some());
    assert!(req.headers()[AUTHORIZATION]
        .to_str()?
        .starts_with("ACS4-HMAC-SM3 "));
    Ok(())
}

#[tokio::test]
async fn test_call_service_error() {
    let http = MockHttpSend::new(
        500,
        r#"{"Code":"Throttling","Message":"too many requests","RequestId":"abc-1"}"#,
    );
    let client = init_client(http);

    let req = ApiRequest::new("Ecs", "DescribeRegions", "2014-05-26");
    let err = client.call(req).await.expect_err("500 must fail");

    assert_eq!(err.kind(), ErrorKind::ServiceFailure);
    let se = err
        .downcast_ref::<ServiceError>()
        .expect("source must be a service error");
    assert_eq!(se.code, "Throttling");
    assert_eq!(se.request_id, "abc-1");
    assert_eq!(se.status_code, 500);
    assert!(err.to_string().contains("500"));
    assert!(err.to_string().contains("too many requests"));
}

#[tokio::test]
async fn test_call_service_error_request_id_header() {
    let http = MockHttpSend::new(403, r#"{"Code":"Forbidden.RAM","RequestId":"body-id"}"#)
        .with_header("x-acs-request-id", "header-id");
    let client = init_client(http);

    let req = ApiRequest::new("Ecs", "DescribeRegions", "2014-05-26");
    let err = client.call(req).await.expect_err("403 must fail");

    let se = err
        .downcast_ref::<ServiceError>()
        .expect("source must be a service error");
    assert_eq!(se.request_id, "header-id");
    assert_eq!(se.code, "Forbidden.RAM");
}

#[tokio::test]
async fn test_call_anonymous() -> Result<()> {
    let http = MockHttpSend::new(204, "");
    let _ = env_logger::builder().is_test(true).try_init();
    let ctx = Context::new().with_http_send(http.clone());
    let client = Client::new(
        ctx,
        Config::default().with_endpoint("acs.example.com"),
        StaticCredentialProvider::new("", ""),
    );

    let req = ApiRequest::new("Sts", "GetCallerIdentity", "2015-04-01").anonymous();
    let resp = client.call(req).await?;
    assert_eq!(resp.body, ResponseBody::Empty);

    let sent = http.sent();
    let req = &sent[0];
    assert_eq!(req.uri().to_string(), "https://acs.example.com/");
    assert!(req.headers().get(AUTHORIZATION).is_none());
    assert!(req.headers().get("x-acs-accesskey-id").is_none());
    Ok(())
}

#[tokio::test]
async fn test_sign_without_valid_credential() {
    let http = MockHttpSend::new(200, "");
    let ctx = Context::new().with_http_send(http.clone());
    let client = Client::new(
        ctx,
        Config::default(),
        StaticCredentialProvider::new("", ""),
    );

    let req = ApiRequest::new("Ecs", "DescribeRegions", "2014-05-26");
    let err = client.call(req).await.expect_err("empty credential must fail");
    assert!(err.is_credential_error());
    assert!(http.sent().is_empty());
}

#[tokio::test]
async fn test_sign_with_security_token() -> Result<()> {
    let ctx = Context::new();
    let client = Client::new(
        ctx,
        Config::default()
            .with_region_id("cn-beijing")
            .with_region_endpoint("cn-beijing", "ecs.cn-beijing.aliyuncs.com"),
        StaticCredentialProvider::new("accessKeyId", "accessKeySecret")
            .with_security_token("securityToken"),
    );

    let signed = client
        .sign(ApiRequest::new("ecs", "DescribeRegions", "2014-05-26"))
        .await?;

    assert_eq!(signed.endpoint, "ecs.cn-beijing.aliyuncs.com");
    assert_eq!(signed.headers["x-acs-accesskey-id"], "accessKeyId");
    assert_eq!(signed.headers["x-acs-security-token"], "securityToken");
    assert!(signed.headers[AUTHORIZATION]
        .to_str()?
        .contains("/cn-beijing/ecs/aliyun_v4_request,SignedHeaders=host;x-acs-accesskey-id;x-acs-action;x-acs-content-sha256;x-acs-date;x-acs-security-token;"));
    Ok(())
}
