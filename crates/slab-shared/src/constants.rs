/// Application name
pub const APP_NAME: &str = "Slab City Legends";

/// Password accepted by the admin gate when no `ADMIN_PASSWORD` is configured.
/// Development only; the server logs a warning when it is in effect.
pub const FALLBACK_ADMIN_PASSWORD: &str = "slab-admin";

/// Session tokens are 32 random bytes, hex-encoded on the wire.
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Default admin session lifetime (12 hours)
pub const DEFAULT_ADMIN_SESSION_TTL_SECS: i64 = 12 * 60 * 60;

/// Default member session lifetime (7 days)
pub const DEFAULT_MEMBER_SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Maximum inline image size accepted by the editors (5 MiB)
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Member account rules
pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Largest single donation accepted, in cents ($1,000,000).
pub const MAX_DONATION_CENTS: i64 = 100_000_000;

/// Image shown for scaffolded characters and locations until one is uploaded.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Role given to characters promoted from community card submissions.
pub const COMMUNITY_ROLE: &str = "Community Creation";
