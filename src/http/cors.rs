//! CORS policy construction.
//!
//! A `"*"` entry means "anything". Browsers reject a literal `*` together
//! with credentials, so when credentials are allowed a wildcard is served by
//! mirroring the request's origin and headers instead.

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::CorsConfig;

fn is_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v.trim() == "*")
}

fn parse_all<T, F>(kind: &str, values: &[String], parse: F) -> Vec<T>
where
    F: Fn(&str) -> Option<T>,
{
    values
        .iter()
        .filter_map(|v| {
            let parsed = parse(v.trim());
            if parsed.is_none() {
                tracing::warn!(kind, value = %v, "Ignoring invalid CORS entry");
            }
            parsed
        })
        .collect()
}

pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let credentials = config.allow_credentials;

    let origins = if is_wildcard(&config.allow_origins) {
        if credentials {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::any()
        }
    } else {
        AllowOrigin::list(parse_all("origin", &config.allow_origins, |v| {
            HeaderValue::from_str(v).ok()
        }))
    };

    let methods = if is_wildcard(&config.allow_methods) {
        if credentials {
            AllowMethods::mirror_request()
        } else {
            AllowMethods::any()
        }
    } else {
        AllowMethods::list(parse_all("method", &config.allow_methods, |v| {
            Method::from_bytes(v.to_ascii_uppercase().as_bytes()).ok()
        }))
    };

    let headers = if is_wildcard(&config.allow_headers) {
        if credentials {
            AllowHeaders::mirror_request()
        } else {
            AllowHeaders::any()
        }
    } else {
        AllowHeaders::list(parse_all("header", &config.allow_headers, |v| {
            HeaderName::from_bytes(v.as_bytes()).ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(credentials)
}
