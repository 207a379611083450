// src/middleware/routes.rs

use std::time::Duration;

/// Bucket de segurança de uma rota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteBucket {
    Public,
    Auth,
    Api,
    Admin,
    PatientScoped,
    Default,
}

impl RouteBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteBucket::Public => "public",
            RouteBucket::Auth => "auth",
            RouteBucket::Api => "api",
            RouteBucket::Admin => "admin",
            RouteBucket::PatientScoped => "patient",
            RouteBucket::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
    pub message: &'static str,
}

const FIFTEEN_MINUTES: Duration = Duration::from_secs(15 * 60);

pub const AUTH_RATE_LIMIT: RateLimitConfig = RateLimitConfig {
    window: FIFTEEN_MINUTES,
    max_requests: 10,
    message: "Too many authentication attempts, please try again later",
};

pub const API_RATE_LIMIT: RateLimitConfig = RateLimitConfig {
    window: FIFTEEN_MINUTES,
    max_requests: 100,
    message: "API rate limit exceeded",
};

pub const ADMIN_RATE_LIMIT: RateLimitConfig = RateLimitConfig {
    window: FIFTEEN_MINUTES,
    max_requests: 50,
    message: "Admin access rate limit exceeded",
};

pub const DEFAULT_RATE_LIMIT: RateLimitConfig = RateLimitConfig {
    window: FIFTEEN_MINUTES,
    max_requests: 100,
    message: "Too many requests, please try again later",
};

const NO_STORE: (&str, &str) = ("cache-control", "no-cache, no-store, must-revalidate");

const ADMIN_HEADERS: &[(&str, &str)] = &[("x-admin-access", "true"), NO_STORE];

const PATIENT_HEADERS: &[(&str, &str)] = &[
    ("x-healthcare-data", "true"),
    ("x-data-classification", "confidential"),
    NO_STORE,
];

/// Política resolvida uma vez por requisição e passada adiante pelas
/// extensions. Imutável: nada de singleton reconfigurado por rota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePolicy {
    pub bucket: RouteBucket,
    pub path_prefix: &'static str,
    pub is_public: bool,
    pub rate_limit: Option<RateLimitConfig>,
    pub custom_headers: &'static [(&'static str, &'static str)],
}

impl RoutePolicy {
    const fn public(prefix: &'static str, rate_limit: Option<RateLimitConfig>) -> Self {
        Self {
            bucket: RouteBucket::Public,
            path_prefix: prefix,
            is_public: true,
            rate_limit,
            custom_headers: &[],
        }
    }

    const fn protected(
        bucket: RouteBucket,
        prefix: &'static str,
        rate_limit: RateLimitConfig,
        custom_headers: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self {
            bucket,
            path_prefix: prefix,
            is_public: false,
            rate_limit: Some(rate_limit),
            custom_headers,
        }
    }
}

// Tabela de prefixos. O mais longo que casar vence.
const ROUTE_TABLE: &[RoutePolicy] = &[
    RoutePolicy::public("/login", None),
    // Login é público mas continua com o limite estrito de auth
    RoutePolicy::public("/api/auth/login", Some(AUTH_RATE_LIMIT)),
    RoutePolicy::public("/api/health", None),
    RoutePolicy::public("/api/status", None),
    RoutePolicy::public("/api/test", None),
    RoutePolicy::public("/_next", None),
    RoutePolicy::public("/favicon.ico", None),
    RoutePolicy::public("/unauthorized", None),
    RoutePolicy::public("/admin/test", None),
    RoutePolicy::protected(RouteBucket::Auth, "/api/auth/", AUTH_RATE_LIMIT, &[]),
    RoutePolicy::protected(RouteBucket::Api, "/api/", API_RATE_LIMIT, &[]),
    RoutePolicy::protected(RouteBucket::Admin, "/admin/", ADMIN_RATE_LIMIT, ADMIN_HEADERS),
];

const STATIC_ASSET: RoutePolicy = RoutePolicy::public("", None);

const PATIENT_SCOPED: RoutePolicy =
    RoutePolicy::protected(RouteBucket::PatientScoped, "", DEFAULT_RATE_LIMIT, PATIENT_HEADERS);

const DEFAULT_POLICY: RoutePolicy =
    RoutePolicy::protected(RouteBucket::Default, "", DEFAULT_RATE_LIMIT, &[]);

const STATIC_EXTENSIONS: [&str; 6] = ["svg", "png", "jpg", "jpeg", "gif", "webp"];

fn is_static_asset(path: &str) -> bool {
    path.rsplit_once('.')
        .map(|(_, ext)| !ext.contains('/') && STATIC_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Classificação determinística, sem I/O.
pub fn classify(path: &str) -> RoutePolicy {
    if is_static_asset(path) {
        return STATIC_ASSET;
    }

    let matched = ROUTE_TABLE
        .iter()
        .filter(|policy| path.starts_with(policy.path_prefix))
        .max_by_key(|policy| policy.path_prefix.len());

    match matched {
        Some(policy) => *policy,
        None if path.contains("/patient") => PATIENT_SCOPED,
        None => DEFAULT_POLICY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_routes_short_circuit() {
        for path in [
            "/login",
            "/api/health",
            "/api/status",
            "/api/test/notifications/check",
            "/_next/static/chunk.js",
            "/favicon.ico",
            "/unauthorized",
            "/admin/test/seed",
            "/api/auth/login",
            "/images/logo.svg",
            "/doctor/avatar.PNG",
        ] {
            let policy = classify(path);
            assert!(policy.is_public, "{} should be public", path);
            assert_eq!(policy.bucket, RouteBucket::Public);
        }
    }

    #[test]
    fn longest_prefix_wins() {
        assert_eq!(classify("/api/auth/logout").bucket, RouteBucket::Auth);
        assert_eq!(classify("/api/v1/patients").bucket, RouteBucket::Api);
        assert_eq!(classify("/admin/dashboard").bucket, RouteBucket::Admin);
        // o login público mantém o limite de auth
        assert_eq!(classify("/api/auth/login").rate_limit, Some(AUTH_RATE_LIMIT));
    }

    #[test]
    fn patient_scoped_and_default() {
        let patient = classify("/receptionist/patients/42");
        assert_eq!(patient.bucket, RouteBucket::PatientScoped);
        assert!(patient.custom_headers.contains(&("x-data-classification", "confidential")));

        assert_eq!(classify("/doctor/dashboard").bucket, RouteBucket::Default);
        assert_eq!(classify("/").bucket, RouteBucket::Default);
    }

    #[test]
    fn admin_carries_its_headers_and_limit() {
        let admin = classify("/admin/users");
        assert_eq!(admin.rate_limit, Some(ADMIN_RATE_LIMIT));
        assert!(admin.custom_headers.contains(&("x-admin-access", "true")));
        assert!(!admin.is_public);
    }

    #[test]
    fn dotted_directories_are_not_assets() {
        assert!(!is_static_asset("/files.png/edit"));
        assert!(!is_static_asset("/doctor/dashboard"));
    }
}
