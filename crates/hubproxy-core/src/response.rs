//! Response header rewriting
//!
//! Registries answer unauthenticated requests with a `Www-Authenticate`
//! challenge whose realm names the real auth service. Pointing that realm
//! at the proxy keeps the client's token fetch going through `/token`.

use http::header::{self, HeaderMap, HeaderValue};
use tracing::debug;

/// Rewrite auth challenges to point back at the proxy
///
/// Every occurrence of `auth_origin` in each `Www-Authenticate` value is
/// replaced with `https://{proxy_host}`. Other headers are untouched.
pub fn rewrite_challenge(headers: &mut HeaderMap, auth_origin: &str, proxy_host: &str) {
    let replacement = format!("https://{proxy_host}");

    for (name, value) in headers.iter_mut() {
        if *name != header::WWW_AUTHENTICATE {
            continue;
        }
        let Ok(current) = value.to_str() else {
            continue;
        };
        if !current.contains(auth_origin) {
            continue;
        }

        let rewritten = current.replace(auth_origin, &replacement);
        match HeaderValue::from_str(&rewritten) {
            Ok(new_value) => {
                debug!(challenge = %rewritten, "Rewrote auth challenge");
                *value = new_value;
            }
            Err(_) => debug!("Skipping challenge rewrite, proxy host is not a valid header value"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTH_ORIGIN: &str = "https://auth.docker.io";

    #[test]
    fn test_rewrites_realm() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static(
                r#"Bearer realm="https://auth.docker.io/token",service="registry.docker.io",scope="repository:library/alpine:pull""#,
            ),
        );
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        rewrite_challenge(&mut headers, AUTH_ORIGIN, "hub.example.com");

        assert_eq!(
            headers[header::WWW_AUTHENTICATE],
            r#"Bearer realm="https://hub.example.com/token",service="registry.docker.io",scope="repository:library/alpine:pull""#
        );
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_replaces_every_occurrence() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Bearer realm=\"https://auth.docker.io/token\",x=\"https://auth.docker.io\""),
        );

        rewrite_challenge(&mut headers, AUTH_ORIGIN, "hub.example.com:8443");

        assert_eq!(
            headers[header::WWW_AUTHENTICATE],
            "Bearer realm=\"https://hub.example.com:8443/token\",x=\"https://hub.example.com:8443\""
        );
    }

    #[test]
    fn test_leaves_other_realms() {
        let challenge = r#"Bearer realm="https://ghcr.io/token",service="ghcr.io""#;
        let mut headers = HeaderMap::new();
        headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(challenge));

        rewrite_challenge(&mut headers, AUTH_ORIGIN, "hub.example.com");

        assert_eq!(headers[header::WWW_AUTHENTICATE], challenge);
    }

    #[test]
    fn test_multiple_challenges() {
        let mut headers = HeaderMap::new();
        headers.append(header::WWW_AUTHENTICATE, HeaderValue::from_static("Basic realm=\"x\""));
        headers.append(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Bearer realm=\"https://auth.docker.io/token\""),
        );

        rewrite_challenge(&mut headers, AUTH_ORIGIN, "hub.example.com");

        let values: Vec<_> = headers.get_all(header::WWW_AUTHENTICATE).iter().collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], "Basic realm=\"x\"");
        assert_eq!(values[1], "Bearer realm=\"https://hub.example.com/token\"");
    }

    #[test]
    fn test_no_challenge() {
        let mut headers = HeaderMap::new();
        rewrite_challenge(&mut headers, AUTH_ORIGIN, "hub.example.com");
        assert!(headers.is_empty());
    }
}
