//! Endpoint resolution and signing region derivation.

use crate::constants::{CENTER_REGION, ENDPOINT_DOMAIN};
use crate::Config;
use popsign_core::{Error, Result};
use std::fmt::Debug;

/// EndpointRule generates an endpoint from product and network settings.
///
/// This is the last step of endpoint resolution, used only when neither an
/// explicit endpoint nor a region override is configured.
pub trait EndpointRule: Debug + Send + Sync + 'static {
    /// Generate the endpoint host.
    fn endpoint(
        &self,
        product_id: &str,
        region_id: &str,
        endpoint_rule: &str,
        network: &str,
        suffix: &str,
    ) -> Result<String>;
}

/// DefaultEndpointRule builds the standard Alibaba Cloud endpoints.
///
/// - `regional`: `{product}{-suffix}{-network}.{region}.aliyuncs.com`
/// - anything else: `{product}{-suffix}{-network}.aliyuncs.com`
///
/// The network part is omitted for `public`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEndpointRule;

impl EndpointRule for DefaultEndpointRule {
    fn endpoint(
        &self,
        product_id: &str,
        region_id: &str,
        endpoint_rule: &str,
        network: &str,
        suffix: &str,
    ) -> Result<String> {
        let network = if network.is_empty() || network == "public" {
            String::new()
        } else {
            format!("-{network}")
        };
        let suffix = if suffix.is_empty() {
            String::new()
        } else {
            format!("-{suffix}")
        };
        let product = product_id.to_lowercase();

        if endpoint_rule == "regional" {
            if region_id.is_empty() {
                return Err(Error::config_invalid(
                    "RegionId is empty, please set a valid RegionId",
                ));
            }
            return Ok(format!(
                "{product}{suffix}{network}.{region_id}.{ENDPOINT_DOMAIN}"
            ));
        }

        Ok(format!("{product}{suffix}{network}.{ENDPOINT_DOMAIN}"))
    }
}

/// Resolve the endpoint host for a product.
///
/// First match wins:
///
/// 1. `config.endpoint` if non-empty
/// 2. `config.endpoint_map[region_id]`
/// 3. `rule`
pub fn resolve_endpoint(product_id: &str, config: &Config, rule: &dyn EndpointRule) -> Result<String> {
    if let Some(endpoint) = config.endpoint.as_deref().filter(|v| !v.is_empty()) {
        return Ok(endpoint.to_string());
    }

    let region_id = config.region_id.as_deref().unwrap_or_default();
    if let Some(endpoint) = config.endpoint_map.get(region_id) {
        return Ok(endpoint.clone());
    }

    rule.endpoint(
        product_id,
        region_id,
        config.endpoint_rule.as_deref().unwrap_or_default(),
        config.network.as_deref().unwrap_or_default(),
        config.suffix.as_deref().unwrap_or_default(),
    )
}

/// Derive the signing region from the product id and endpoint.
///
/// Strips the lower-cased product id, then `aliyuncs.com`, then every `.`
/// from the endpoint, in that order. Falls back to `center`.
pub fn signing_region(product_id: &str, endpoint: &str) -> String {
    if product_id.is_empty() || endpoint.is_empty() {
        return CENTER_REGION.to_string();
    }

    let region = endpoint
        .replace(&product_id.to_lowercase(), "")
        .replace(ENDPOINT_DOMAIN, "")
        .replace('.', "");
    if region.is_empty() {
        CENTER_REGION.to_string()
    } else {
        region
    }
}
