pub mod client;
pub use self::client::RecordingClient;

use std::str::FromStr;
use std::sync::LazyLock;

/// One part's worth of data at the default part size.
pub const P: usize = 5 * 1024 * 1024;

pub static TRACER: LazyLock<()> = LazyLock::new(|| {
    let level = std::env::var("LOG_LEVEL")
        .map(|l| tracing::Level::from_str(l.as_str()).unwrap())
        .unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init()
});

/// Deterministic test payload: `b[i] = i mod 251`.
pub fn test_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// MD5 hex digest, the form the store uses for unquoted part entity tags.
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}
