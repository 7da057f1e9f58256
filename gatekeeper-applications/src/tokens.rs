//! Random token generation

use rand::{rngs::OsRng, RngCore};

/// Source of opaque random tokens
pub trait TokenGenerator: Send + Sync {
    /// `bytes` random bytes rendered as upper-case hex
    fn hex_token(&self, bytes: usize) -> String;
}

/// Token generator backed by the operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureTokenGenerator;

impl TokenGenerator for SecureTokenGenerator {
    fn hex_token(&self, bytes: usize) -> String {
        let mut buf = vec![0u8; bytes];
        OsRng.fill_bytes(&mut buf);
        hex::encode_upper(buf)
    }
}
