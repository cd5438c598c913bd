use crate::constants::*;
use popsign_core::Context;
use std::collections::HashMap;

/// Config carries the endpoint configuration for ACS v4 requests.
///
/// Every field is an input of endpoint resolution; the resolved host is
/// written to the signed request, not back into the config.
#[derive(Clone, Debug)]
pub struct Config {
    /// `region_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_REGION_ID`]
    pub region_id: Option<String>,
    /// `endpoint` overrides every other endpoint source. It will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_ENDPOINT`]
    pub endpoint: Option<String>,
    /// Region id to endpoint overrides, consulted before the endpoint rule.
    pub endpoint_map: HashMap<String, String>,
    /// Endpoint rule handed to the endpoint generator, for example `regional`.
    pub endpoint_rule: Option<String>,
    /// Network type such as `public`, `vpc` or `intl`.
    pub network: Option<String>,
    /// Endpoint suffix, for example `share`.
    pub suffix: Option<String>,
    /// URL scheme used for the request, default to `https`.
    pub protocol: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region_id: None,
            endpoint: None,
            endpoint_map: HashMap::new(),
            endpoint_rule: None,
            network: None,
            suffix: None,
            protocol: "https".to_string(),
        }
    }
}

impl Config {
    /// Load config from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_REGION_ID) {
            self.region_id.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_ENDPOINT) {
            self.endpoint.get_or_insert(v);
        }

        self
    }

    /// Set the region id.
    pub fn with_region_id(mut self, region_id: &str) -> Self {
        self.region_id = Some(region_id.to_string());
        self
    }

    /// Set the explicit endpoint.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    /// Set the endpoint rule, for example `regional` or `central`.
    pub fn with_endpoint_rule(mut self, rule: &str) -> Self {
        self.endpoint_rule = Some(rule.to_string());
        self
    }

    /// Set the network type, for example `vpc`.
    pub fn with_network(mut self, network: &str) -> Self {
        self.network = Some(network.to_string());
        self
    }

    /// Set the endpoint suffix, for example `share`.
    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.suffix = Some(suffix.to_string());
        self
    }

    /// Add an endpoint override for a region.
    pub fn with_region_endpoint(mut self, region_id: &str, endpoint: &str) -> Self {
        self.endpoint_map
            .insert(region_id.to_string(), endpoint.to_string());
        self
    }
}
