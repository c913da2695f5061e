use sha1::{Digest, Sha1};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber: `RUST_LOG` filter (default `info`) and a
/// fmt layer. Later calls are no-ops.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Renders identities, challenges and keys for log lines. Unless verbatim
/// logging is enabled only a short SHA-1 fingerprint is shown.
#[derive(Debug, Clone, Copy, Default)]
pub struct Redactor {
    verbatim: bool,
}

impl Redactor {
    pub fn new(verbatim: bool) -> Self {
        Self { verbatim }
    }

    pub fn bytes(&self, value: &[u8]) -> String {
        if self.verbatim {
            hex::encode(value)
        } else {
            let digest = Sha1::digest(value);
            format!("sha1:{}", hex::encode(&digest[..4]))
        }
    }
}
