// src/middleware/security.rs

use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::Mutex,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::routes::{classify, RateLimitConfig, RouteBucket, RoutePolicy},
};

// Cabeçalhos aplicados a toda resposta
const BASELINE_HEADERS: &[(&str, &str)] = &[
    (
        "content-security-policy",
        "default-src 'self'; script-src 'self' 'unsafe-eval' 'unsafe-inline'; \
         style-src 'self' 'unsafe-inline' https://fonts.googleapis.com; img-src 'self' data: https:; \
         font-src 'self' https://fonts.gstatic.com; connect-src 'self' https://*.supabase.co wss://*.supabase.co; \
         frame-ancestors 'none'; base-uri 'self'; form-action 'self'; upgrade-insecure-requests",
    ),
    ("strict-transport-security", "max-age=31536000; includeSubDomains; preload"),
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    (
        "permissions-policy",
        "camera=(), microphone=(), geolocation=(self), fullscreen=(self), payment=()",
    ),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-site"),
    ("x-healthcare-app", "SwamiCare"),
    ("x-download-options", "noopen"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "1; mode=block"),
];

pub fn apply_security_headers(headers: &mut HeaderMap, policy: &RoutePolicy) {
    for &(name, value) in BASELINE_HEADERS.iter().chain(policy.custom_headers) {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
}

// ---
// Rate limiting (janela fixa por bucket + cliente)
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

#[derive(Debug)]
struct Window {
    count: u32,
    reset_at: Instant,
}

type WindowKey = (RouteBucket, &'static str, String);

// Acima disso, janelas vencidas são descartadas a cada acesso
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<WindowKey, Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(
        &self,
        policy: &RoutePolicy,
        limit: &RateLimitConfig,
        client: &str,
        now: Instant,
    ) -> RateDecision {
        let mut windows = self.windows.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if windows.len() > PRUNE_THRESHOLD {
            windows.retain(|_, w| w.reset_at > now);
        }

        let key = (policy.bucket, policy.path_prefix, client.to_string());
        let window = windows.entry(key).or_insert(Window { count: 0, reset_at: now + limit.window });

        if now >= window.reset_at {
            window.count = 0;
            window.reset_at = now + limit.window;
        }

        if window.count >= limit.max_requests {
            return RateDecision::Limited { retry_after: window.reset_at - now };
        }

        window.count += 1;
        RateDecision::Allowed { remaining: limit.max_requests - window.count }
    }
}

/// IP do cliente para o rate limit.
///
/// `x-forwarded-for`/`x-real-ip` só são lidos com `trust_proxy`: sem um
/// proxy que os sobrescreva, o cliente escolhe o próprio IP a cada request.
pub fn client_identifier(headers: &HeaderMap, peer: Option<IpAddr>, trust_proxy: bool) -> String {
    let forwarded = trust_proxy
        .then(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
                .map(str::to_string)
        })
        .flatten();

    forwarded
        .or_else(|| peer.map(|ip| ip.to_string()))
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

// Camada externa: resolve a política, aplica rate limit e cabeçalhos.
pub async fn security_layer(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let policy = classify(request.uri().path());

    if let Some(limit) = policy.rate_limit {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let client = client_identifier(request.headers(), peer, app_state.config.trust_proxy);
        let decision = app_state.rate_limiter.check(&policy, &limit, &client, Instant::now());

        if let RateDecision::Limited { retry_after } = decision {
            tracing::warn!(
                "Rate limit exceeded: bucket={} client={} path={}",
                policy.bucket.as_str(),
                client,
                request.uri().path()
            );
            let mut response = AppError::RateLimited {
                message: limit.message,
                retry_after_secs: retry_after.as_secs_f64().ceil() as u64,
            }
            .into_response();
            apply_security_headers(response.headers_mut(), &policy);
            return response;
        }
    }

    request.extensions_mut().insert(policy);

    let mut response = next.run(request).await;
    apply_security_headers(response.headers_mut(), &policy);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_max_requests_until_window_resets() {
        let limiter = RateLimiter::new();
        let policy = classify("/api/auth/logout");
        let limit = policy.rate_limit.unwrap();
        let start = Instant::now();

        for _ in 0..limit.max_requests {
            assert!(matches!(
                limiter.check(&policy, &limit, "10.0.0.1", start),
                RateDecision::Allowed { .. }
            ));
        }

        let blocked = limiter.check(&policy, &limit, "10.0.0.1", start + Duration::from_secs(60));
        assert_eq!(
            blocked,
            RateDecision::Limited { retry_after: limit.window - Duration::from_secs(60) }
        );

        // outro cliente não é afetado
        assert!(matches!(
            limiter.check(&policy, &limit, "10.0.0.2", start),
            RateDecision::Allowed { .. }
        ));

        // janela nova
        assert_eq!(
            limiter.check(&policy, &limit, "10.0.0.1", start + limit.window),
            RateDecision::Allowed { remaining: limit.max_requests - 1 }
        );
    }

    #[test]
    fn client_identifier_prefers_forwarded_for_behind_proxy() {
        let peer = Some(IpAddr::from([10, 0, 0, 2]));
        let mut headers = HeaderMap::new();
        assert_eq!(client_identifier(&headers, None, true), "127.0.0.1");
        assert_eq!(client_identifier(&headers, peer, true), "10.0.0.2");

        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.9"));
        assert_eq!(client_identifier(&headers, peer, true), "192.168.1.9");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_identifier(&headers, peer, true), "203.0.113.7");
    }

    #[test]
    fn forwarded_headers_are_ignored_without_trusted_proxy() {
        let peer = Some(IpAddr::from([198, 51, 100, 20]));
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.9"));

        assert_eq!(client_identifier(&headers, peer, false), "198.51.100.20");
    }

    #[test]
    fn custom_headers_are_added_on_top_of_baseline() {
        let mut headers = HeaderMap::new();
        apply_security_headers(&mut headers, &classify("/admin/reports"));
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert_eq!(headers.get("x-admin-access").unwrap(), "true");
        assert_eq!(headers.get("cache-control").unwrap(), "no-cache, no-store, must-revalidate");
    }
}
