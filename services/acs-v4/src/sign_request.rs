use crate::canonical::canonical_request;
use crate::constants::*;
use crate::endpoint::{resolve_endpoint, signing_region, DefaultEndpointRule, EndpointRule};
use crate::request::{ApiRequest, AuthType, SignedRequest};
use crate::{Config, Credential, SignatureAlgorithm};
use async_trait::async_trait;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HOST, USER_AGENT};
use http::{HeaderMap, HeaderValue};
use log::debug;
use popsign_core::time::{format_date, format_iso8601, now, DateTime};
use popsign_core::{Context, Error, Result, SignRequest};
use rand::RngCore;
use std::sync::Arc;

/// RequestSigner that implements the ACS v4 signature.
///
/// - [Request syntax and signature method V3](https://help.aliyun.com/zh/sdk/product-overview/v3-request-structure-and-signature)
///
/// Every call builds a fresh header set from the request it consumes. Nothing
/// is shared between requests beyond the immutable config.
#[derive(Debug)]
pub struct RequestSigner {
    config: Config,
    rule: Arc<dyn EndpointRule>,

    time: Option<DateTime>,
    nonce: Option<String>,
}

impl RequestSigner {
    /// Create a new signer with the default endpoint rule.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            rule: Arc::new(DefaultEndpointRule),

            time: None,
            nonce: None,
        }
    }

    /// Use a custom endpoint rule.
    pub fn with_endpoint_rule(mut self, rule: impl EndpointRule) -> Self {
        self.rule = Arc::new(rule);
        self
    }

    /// Get the config of this signer.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    #[cfg(test)]
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Specify the signature nonce.
    ///
    /// Only use this function for testing.
    #[cfg(test)]
    pub fn with_nonce(mut self, nonce: &str) -> Self {
        self.nonce = Some(nonce.to_string());
        self
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;
    type Request = ApiRequest;
    type Signed = SignedRequest;

    fn requires_credential(&self, req: &ApiRequest) -> bool {
        req.auth_type != AuthType::Anonymous
    }

    async fn sign_request(
        &self,
        _: &Context,
        req: ApiRequest,
        credential: Option<&Self::Credential>,
    ) -> Result<SignedRequest> {
        let ApiRequest {
            product_id,
            action,
            version,
            method,
            pathname,
            query,
            headers: extra_headers,
            body,
            req_body_type,
            body_type,
            auth_type,
            signature_algorithm,
            user_agent,
        } = req;

        let now = self.time.unwrap_or_else(now);
        let algorithm = signature_algorithm.unwrap_or_default();
        let endpoint = resolve_endpoint(&product_id, &self.config, self.rule.as_ref())?;
        debug!("resolved endpoint for {product_id}: {endpoint}");
        let nonce = self.nonce.clone().unwrap_or_else(generate_nonce);

        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_str(&endpoint)?);
        headers.insert(X_ACS_VERSION, HeaderValue::from_str(&version)?);
        headers.insert(X_ACS_ACTION, HeaderValue::from_str(&action)?);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))?,
        );
        headers.insert(X_ACS_DATE, HeaderValue::from_str(&format_iso8601(now))?);
        headers.insert(X_ACS_SIGNATURE_NONCE, HeaderValue::from_str(&nonce)?);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));
        // Caller headers override the defaults above.
        headers.extend(extra_headers);

        let payload = body.into_payload(req_body_type)?;
        let hashed_payload = algorithm.hex_hash(&payload.bytes);
        if let Some(content_type) = payload.content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        headers.insert(
            algorithm.content_hash_header(),
            HeaderValue::from_str(&hashed_payload)?,
        );

        let mut signed = SignedRequest {
            protocol: self.config.protocol.clone(),
            endpoint,
            method,
            pathname,
            query,
            headers,
            body: payload.bytes,
            body_type,
        };

        if auth_type == AuthType::Anonymous {
            debug!("request {action} is anonymous, skip signing");
            return Ok(signed);
        }
        let Some(cred) = credential else {
            return Err(Error::credential_invalid(
                "credential is required to sign the request",
            ));
        };

        if let Some(token) = cred.security_token() {
            signed
                .headers
                .insert(X_ACS_ACCESSKEY_ID, HeaderValue::from_str(&cred.access_key_id)?);
            let mut value = HeaderValue::from_str(token)?;
            value.set_sensitive(true);
            signed.headers.insert(X_ACS_SECURITY_TOKEN, value);
        }

        let region = signing_region(&product_id, &signed.endpoint);
        let date = format_date(now);
        let authorization = authorization(
            algorithm,
            &signed,
            &hashed_payload,
            cred,
            &product_id,
            &region,
            &date,
        )?;
        signed.headers.insert(AUTHORIZATION, authorization);

        Ok(signed)
    }
}

/// Build the `Authorization` header value.
///
/// `{alg} Credential={ak}/{date}/{region}/{product}/aliyun_v4_request,SignedHeaders={names},Signature={hex}`
fn authorization(
    algorithm: SignatureAlgorithm,
    req: &SignedRequest,
    hashed_payload: &str,
    cred: &Credential,
    product: &str,
    region: &str,
    date: &str,
) -> Result<HeaderValue> {
    let pathname = if req.pathname.is_empty() {
        "/"
    } else {
        &req.pathname
    };
    let creq = canonical_request(&req.method, pathname, &req.query, &req.headers, hashed_payload)?;
    debug!("calculated canonical request: {}", creq.text);

    // StringToSign:
    //
    // ACS4-HMAC-SHA256
    // <hashed_canonical_request>
    let string_to_sign = format!("{}\n{}", algorithm, algorithm.hex_hash(creq.text.as_bytes()));
    debug!("calculated string to sign: {string_to_sign}");

    let signing_key =
        generate_signing_key(algorithm, &cred.access_key_secret, product, region, date);
    let signature = algorithm.hex_hmac(&signing_key, string_to_sign.as_bytes());

    let scope = format!("{date}/{region}/{product}/{SCOPE_TERMINATOR}");
    debug!("calculated scope: {scope}");

    let mut value = HeaderValue::from_str(&format!(
        "{} Credential={}/{},SignedHeaders={},Signature={}",
        algorithm,
        cred.access_key_id,
        scope,
        creq.signed_headers_str(),
        signature
    ))?;
    value.set_sensitive(true);

    Ok(value)
}

/// Derive the signing key.
///
/// ```text
/// k_date    = HMAC("aliyun_v4" + secret, date)
/// k_region  = HMAC(k_date, region)
/// k_product = HMAC(k_region, product)
/// k_signing = HMAC(k_product, "aliyun_v4_request")
/// ```
pub fn generate_signing_key(
    algorithm: SignatureAlgorithm,
    secret: &str,
    product: &str,
    region: &str,
    date: &str,
) -> Vec<u8> {
    let secret = format!("{SECRET_PREFIX}{secret}");
    let sign_date = algorithm.hmac(secret.as_bytes(), date.as_bytes());
    let sign_region = algorithm.hmac(&sign_date, region.as_bytes());
    let sign_product = algorithm.hmac(&sign_region, product.as_bytes());
    algorithm.hmac(&sign_product, SCOPE_TERMINATOR.as_bytes())
}

/// Generate a random signature nonce.
fn generate_nonce() -> String {
    let mut buf = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}
