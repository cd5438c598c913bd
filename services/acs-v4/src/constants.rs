// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use http::HeaderName;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

// Env values used in aliyun services.
pub const ALIBABA_CLOUD_ACCESS_KEY_ID: &str = "ALIBABA_CLOUD_ACCESS_KEY_ID";
pub const ALIBABA_CLOUD_ACCESS_KEY_SECRET: &str = "ALIBABA_CLOUD_ACCESS_KEY_SECRET";
pub const ALIBABA_CLOUD_SECURITY_TOKEN: &str = "ALIBABA_CLOUD_SECURITY_TOKEN";
pub const ALIBABA_CLOUD_REGION_ID: &str = "ALIBABA_CLOUD_REGION_ID";
pub const ALIBABA_CLOUD_ENDPOINT: &str = "ALIBABA_CLOUD_ENDPOINT";

// Headers used in ACS v4 signing.
pub const X_ACS_VERSION: HeaderName = HeaderName::from_static("x-acs-version");
pub const X_ACS_ACTION: HeaderName = HeaderName::from_static("x-acs-action");
pub const X_ACS_DATE: HeaderName = HeaderName::from_static("x-acs-date");
pub const X_ACS_SIGNATURE_NONCE: HeaderName = HeaderName::from_static("x-acs-signature-nonce");
pub const X_ACS_CONTENT_SHA256: HeaderName = HeaderName::from_static("x-acs-content-sha256");
pub const X_ACS_CONTENT_SM3: HeaderName = HeaderName::from_static("x-acs-content-sm3");
pub const X_ACS_ACCESSKEY_ID: HeaderName = HeaderName::from_static("x-acs-accesskey-id");
pub const X_ACS_SECURITY_TOKEN: HeaderName = HeaderName::from_static("x-acs-security-token");
pub const X_ACS_REQUEST_ID: HeaderName = HeaderName::from_static("x-acs-request-id");

pub const SIGNED_HEADER_PREFIX: &str = "x-acs-";

// Signing scope literals.
pub const SECRET_PREFIX: &str = "aliyun_v4";
pub const SCOPE_TERMINATOR: &str = "aliyun_v4_request";

/// Region used when none can be derived from the endpoint.
pub const CENTER_REGION: &str = "center";
pub const ENDPOINT_DOMAIN: &str = "aliyuncs.com";

pub const CONTENT_TYPE_STREAM: &str = "application/octet-stream";
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
pub const ACCEPT_JSON: &str = "application/json";

pub const DEFAULT_USER_AGENT: &str = concat!("popsign-acs-v4/", env!("CARGO_PKG_VERSION"));

/// AsciiSet for ACS percent encoding in canonical query strings.
///
/// - Encode every byte except the unreserved characters: 'A'-'Z', 'a'-'z', '0'-'9', '-', '.', '_', and '~'.
pub static ACS_QUERY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// AsciiSet for the request path on the wire, same as the query set but `/` is kept.
pub static ACS_PATH_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');
