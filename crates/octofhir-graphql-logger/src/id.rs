//! Correlation id generation.

use async_trait::async_trait;
use rand::Rng;

const HEX_ALPHABET: &[u8] = b"1234567890abcdef";

/// Default correlation id length.
pub const DEFAULT_ID_LENGTH: usize = 10;

/// Produces the id that tags every line of one request.
///
/// Generation may be asynchronous; the plugin awaits it before emitting
/// the first line of a request. Any `Fn() -> String` closure is a generator.
#[async_trait]
pub trait IdGenerator: Send + Sync {
    async fn generate(&self) -> String;
}

#[async_trait]
impl<F> IdGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    async fn generate(&self) -> String {
        (self)()
    }
}

/// Random lowercase hexadecimal ids of a fixed length.
#[derive(Debug, Clone, Copy)]
pub struct HexIdGenerator {
    length: usize,
}

impl HexIdGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for HexIdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ID_LENGTH)
    }
}

#[async_trait]
impl IdGenerator for HexIdGenerator {
    async fn generate(&self) -> String {
        random_hex(self.length)
    }
}

fn random_hex(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| HEX_ALPHABET[rng.gen_range(0..HEX_ALPHABET.len())] as char)
        .collect()
}
