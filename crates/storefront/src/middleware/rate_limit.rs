//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Two layers, keyed by client IP:
//! - `otp_rate_limiter`: strict, for send-OTP and verify-OTP (~10/min)
//! - `api_rate_limiter`: relaxed, for cart, checkout and catalog (~100/min)
//!
//! Verify-OTP is additionally limited per email by [`EmailAttemptLimiter`],
//! so rotating client addresses doesn't buy more guesses at one code.

use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use little_monsters_core::Email;

/// Client IP for rate limiting.
///
/// The peer address is used unless `trust_proxy_headers` is set, in which
/// case the proxy headers win: `CF-Connecting-IP`, the first
/// `X-Forwarded-For` hop, `X-Real-IP`, `Fly-Client-IP`. Only enable that
/// behind a proxy that overwrites those headers.
#[derive(Debug, Clone, Copy)]
pub struct ClientIpKeyExtractor {
    trust_proxy_headers: bool,
}

impl ClientIpKeyExtractor {
    #[must_use]
    pub const fn new(trust_proxy_headers: bool) -> Self {
        Self {
            trust_proxy_headers,
        }
    }
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        self.trust_proxy_headers
            .then(|| client_ip(req.headers()))
            .flatten()
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|info| info.0.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse().ok())
}

/// First parseable client IP among the proxy headers.
#[must_use]
pub fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    ["cf-connecting-ip", "x-forwarded-for", "x-real-ip", "fly-client-ip"]
        .into_iter()
        .find_map(|name| header_ip(headers, name))
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Rate limiter for the OTP endpoints: ~10 requests per minute per IP.
///
/// 1 token every 6 seconds, burst of 5.
///
/// # Panics
///
/// Never in practice: both quotas are non-zero constants.
#[must_use]
pub fn otp_rate_limiter(trust_proxy_headers: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor::new(trust_proxy_headers))
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("non-zero OTP quota");
    GovernorLayer::new(Arc::new(config))
}

/// Rate limiter for the rest of the API: ~100 requests per minute per IP.
///
/// 1 token per second, burst of 50.
///
/// # Panics
///
/// Never in practice: both quotas are non-zero constants.
#[must_use]
pub fn api_rate_limiter(trust_proxy_headers: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor::new(trust_proxy_headers))
        .per_second(1)
        .burst_size(50)
        .finish()
        .expect("non-zero API quota");
    GovernorLayer::new(Arc::new(config))
}

/// Verify attempts allowed per email: a burst of 5, then one every 12 seconds.
const VERIFY_ATTEMPTS_PER_MINUTE: NonZeroU32 = match NonZeroU32::new(5) {
    Some(n) => n,
    None => panic!("verify quota must be non-zero"),
};

/// Tracked emails before idle entries are pruned.
const MAX_TRACKED_EMAILS: usize = 10_000;

/// Per-email limit on OTP verification attempts.
///
/// Keys are normalized emails, so case and whitespace variants share a
/// bucket. A refused attempt never reaches the OTP store.
pub struct EmailAttemptLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
}

impl EmailAttemptLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(VERIFY_ATTEMPTS_PER_MINUTE)),
        }
    }

    /// Take one attempt for `email`. `false` when the email is over quota.
    pub fn try_attempt(&self, email: &str) -> bool {
        if self.limiter.len() > MAX_TRACKED_EMAILS {
            self.limiter.retain_recent();
        }
        self.limiter.check_key(&Email::normalize(email)).is_ok()
    }
}

impl Default for EmailAttemptLimiter {
    fn default() -> Self {
        Self::new()
    }
}
