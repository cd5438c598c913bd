//! Alibaba Cloud ACS v4 signing implementation for popsign.
//!
//! This crate signs requests for the Alibaba Cloud API gateway ("POP") with
//! the `ACS4-HMAC-SHA256` or `ACS4-HMAC-SM3` algorithm, and decodes the
//! gateway's responses.
//!
//! ## Overview
//!
//! A call goes through a fixed pipeline:
//!
//! 1. resolve the endpoint host from [`Config`]
//! 2. build the default `x-acs-*` headers and merge caller headers on top
//! 3. materialize and hash the body
//! 4. compute the canonical request, string to sign and `Authorization`
//! 5. send through the [`HttpSend`](popsign_core::HttpSend) in the context
//! 6. decode the response, turning `4xx`/`5xx` into a [`ServiceError`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use popsign_acs_v4::{ApiRequest, Client, Config, DefaultCredentialProvider};
//! use popsign_core::{Context, OsEnv, Result};
//!
//! # async fn example() -> Result<()> {
//! let ctx = Context::new().with_env(OsEnv);
//! let config = Config::default()
//!     .with_region_id("cn-hangzhou")
//!     .with_endpoint_rule("regional")
//!     .from_env(&ctx);
//!
//! let client = Client::new(ctx, config, DefaultCredentialProvider::new());
//!
//! // Sign only, for callers that send the request themselves.
//! let req = ApiRequest::new("Ecs", "DescribeRegions", "2014-05-26")
//!     .with_query("RegionId", "cn-hangzhou");
//! let signed = client.sign(req).await?;
//! let _req: http::Request<bytes::Bytes> = signed.into_http()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Credential Sources
//!
//! ```bash
//! export ALIBABA_CLOUD_ACCESS_KEY_ID=your-access-key-id
//! export ALIBABA_CLOUD_ACCESS_KEY_SECRET=your-access-key-secret
//! export ALIBABA_CLOUD_SECURITY_TOKEN=your-sts-token  # Optional, for STS
//! ```
//!
//! [`StaticCredentialProvider`] takes the access key pair directly.
//!
//! ## Endpoints
//!
//! The endpoint host is resolved in this order:
//!
//! 1. [`Config::endpoint`]
//! 2. [`Config::endpoint_map`] keyed by the region id
//! 3. the [`EndpointRule`], [`DefaultEndpointRule`] unless replaced with
//!    [`RequestSigner::with_endpoint_rule`]

#![warn(missing_docs)]

mod algorithm;
pub use algorithm::SignatureAlgorithm;

pub mod canonical;

mod client;
pub use client::Client;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod endpoint;
pub use endpoint::{resolve_endpoint, signing_region, DefaultEndpointRule, EndpointRule};

mod request;
pub use request::{to_form, ApiRequest, AuthType, Body, RequestBodyType, ResponseBodyType, SignedRequest};

mod response;
pub use response::{decode_response, ApiResponse, ResponseBody, ServiceError};

mod sign_request;
pub use sign_request::{generate_signing_key, RequestSigner};

mod provide_credential;
pub use provide_credential::*;

mod constants;
