use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Length of every short code handed out by the service.
pub const CODE_LENGTH: usize = 6;

/// The 62 characters a short code is drawn from.
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Source of short code candidates.
///
/// Implementations never look at storage. Two calls may return the same
/// code; resolving collisions is up to the caller.
pub trait CodeGenerator: Send + Sync + 'static {
    fn generate(&self) -> String;
}

/// Draws each code from the calling thread's RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngGenerator;

impl CodeGenerator for ThreadRngGenerator {
    fn generate(&self) -> String {
        random_code(&mut rand::thread_rng())
    }
}

/// Deterministic generator for tests and reproducible runs.
#[derive(Debug)]
pub struct SeededGenerator {
    rng: Mutex<StdRng>,
}

impl SeededGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl CodeGenerator for SeededGenerator {
    fn generate(&self) -> String {
        random_code(&mut *self.rng.lock())
    }
}

/// Generate a random `CODE_LENGTH` string over `ALPHABET`.
pub fn random_code<R: Rng>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// `true` if `code` has the shape of a generated short code.
pub fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_alphanumeric())
}
