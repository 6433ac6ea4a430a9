use rand::RngCore;

use crate::constants::STORAGE_ID_LEN;
use crate::ids::RawId;

/// Source of fresh storage keys.
pub trait KeyGenerator {
    fn generate(&mut self) -> RawId;
}

/// Keys drawn from the operating system's CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomKeyGenerator;

impl KeyGenerator for RandomKeyGenerator {
    fn generate(&mut self) -> RawId {
        generate_storage_key()
    }
}

/// Deterministic keys (`[0xC0, 0, .., n]`), for tests and replaying a pass.
#[derive(Debug, Default, Clone)]
pub struct SequentialKeyGenerator {
    next: u64,
}

impl SequentialKeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys handed out so far.
    pub fn issued(&self) -> u64 {
        self.next
    }
}

impl KeyGenerator for SequentialKeyGenerator {
    fn generate(&mut self) -> RawId {
        self.next += 1;
        let mut raw = [0u8; STORAGE_ID_LEN];
        raw[0] = 0xC0;
        raw[STORAGE_ID_LEN - 8..].copy_from_slice(&self.next.to_be_bytes());
        RawId(raw)
    }
}

impl<F> KeyGenerator for F
where
    F: FnMut() -> RawId,
{
    fn generate(&mut self) -> RawId {
        self()
    }
}

pub fn generate_storage_key() -> RawId {
    let mut raw = [0u8; STORAGE_ID_LEN];
    rand::rngs::OsRng.fill_bytes(&mut raw);
    RawId(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_keys_differ() {
        let mut keys = RandomKeyGenerator;
        assert_ne!(keys.generate(), keys.generate());
    }

    #[test]
    fn test_sequential_keys_are_stable() {
        let mut a = SequentialKeyGenerator::new();
        let mut b = SequentialKeyGenerator::new();
        let first = a.generate();
        assert_eq!(first, b.generate());
        assert_ne!(first, a.generate());
        assert_eq!(a.issued(), 2);
    }

    #[test]
    fn test_closure_generator() {
        let mut calls = 0u8;
        let mut keys = || {
            calls += 1;
            RawId([calls; STORAGE_ID_LEN])
        };
        assert_eq!(keys.generate(), RawId([1; STORAGE_ID_LEN]));
        assert_eq!(keys.generate(), RawId([2; STORAGE_ID_LEN]));
    }
}
