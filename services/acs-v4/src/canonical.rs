//! Canonical request construction for ACS v4.

use crate::constants::{ACS_QUERY_ENCODE_SET, SIGNED_HEADER_PREFIX};
use http::header::{CONTENT_TYPE, HOST};
use http::{HeaderMap, Method};
use percent_encoding::utf8_percent_encode;
use popsign_core::Result;
use std::collections::BTreeSet;
use std::fmt::Write;

/// CanonicalRequest is the text that gets hashed into the string to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    /// Full canonical request text.
    pub text: String,
    /// Lower-cased signed header names, sorted and deduplicated.
    pub signed_headers: Vec<String>,
}

impl CanonicalRequest {
    /// Signed header names joined by `;`.
    pub fn signed_headers_str(&self) -> String {
        self.signed_headers.join(";")
    }
}

/// Select the header names to sign.
///
/// A name is signed when, lower-cased, it starts with `x-acs-` or equals
/// `host` or `content-type`.
pub fn signed_headers<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    names
        .into_iter()
        .map(|name| name.to_lowercase())
        .filter(|name| {
            name.starts_with(SIGNED_HEADER_PREFIX)
                || name == HOST.as_str()
                || name == CONTENT_TYPE.as_str()
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Build the canonical query string.
///
/// Pairs keep their given order. Keys and values are percent-encoded, a pair
/// with an empty value is rendered as the bare key.
pub fn canonical_query_string(query: &[(String, String)]) -> String {
    let mut s = String::new();
    for (k, v) in query {
        if !s.is_empty() {
            s.push('&');
        }
        s.extend(utf8_percent_encode(k, &ACS_QUERY_ENCODE_SET));
        if !v.is_empty() {
            s.push('=');
            s.extend(utf8_percent_encode(v, &ACS_QUERY_ENCODE_SET));
        }
    }
    s
}

/// Build the canonical headers block, one `name:value\n` line per signed
/// header present in `headers`.
///
/// A header with several values is rendered as its trimmed values joined by `,`.
pub fn canonical_headers(headers: &HeaderMap, signed: &[String]) -> Result<String> {
    let mut s = String::new();
    for name in signed {
        let values = headers
            .get_all(name.as_str())
            .iter()
            .map(|v| v.to_str().map(str::trim))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if values.is_empty() {
            continue;
        }
        writeln!(&mut s, "{}:{}", name, values.join(","))?;
    }
    Ok(s)
}

/// Build the canonical request.
///
/// ```text
/// METHOD
/// PATHNAME
/// CANONICAL_QUERY
/// CANONICAL_HEADERS
///
/// SIGNED;HEADERS
/// HASHED_PAYLOAD
/// ```
pub fn canonical_request(
    method: &Method,
    pathname: &str,
    query: &[(String, String)],
    headers: &HeaderMap,
    hashed_payload: &str,
) -> Result<CanonicalRequest> {
    let signed_headers = signed_headers(headers.keys().map(|k| k.as_str()));
    let canonical_headers = canonical_headers(headers, &signed_headers)?;

    let text = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method.as_str(),
        pathname,
        canonical_query_string(query),
        canonical_headers,
        signed_headers.join(";"),
        hashed_payload
    );

    Ok(CanonicalRequest {
        text,
        signed_headers,
    })
}
