//! Per-node key sample.
//!
//! Until the sample is full, keys are appended in arrival order. Once full,
//! each new key overwrites a uniformly chosen slot. This is a fixed-size
//! random-replacement cache, not Algorithm R: the newest key always gets in,
//! so the sample is biased towards recent keys.

use rand::Rng;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySample {
    keys: Vec<String>,
}

impl KeySample {
    pub fn new() -> Self {
        Self { keys: Vec::new() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[String] {
        &self.keys
    }

    /// First sampled key, used as the representative of a report row.
    #[inline]
    pub fn first(&self) -> Option<&str> {
        self.keys.first().map(String::as_str)
    }

    /// Add one key, keeping at most `limit` entries.
    pub fn add<R: Rng + ?Sized>(&mut self, key: impl Into<String>, limit: usize, rng: &mut R) {
        let len = self.keys.len();
        if len >= limit {
            // limit > 0 is validated by the config, so len > 0 here.
            let slot = rng.gen_range(0..len);
            self.keys[slot] = key.into();
        } else {
            self.keys.push(key.into());
        }
    }

    /// Absorb another sample key by key, in its order.
    pub fn absorb<R: Rng + ?Sized>(&mut self, other: KeySample, limit: usize, rng: &mut R) {
        for key in other.keys {
            self.add(key, limit, rng);
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_fills_in_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = KeySample::new();
        for k in ["a", "b", "c"] {
            s.add(k, 5, &mut rng);
        }
        assert_eq!(s.as_slice(), &["a", "b", "c"]);
        assert_eq!(s.first(), Some("a"));
    }

    #[test]
    fn test_full_sample_replaces_a_slot() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut s = KeySample::new();
        s.add("a", 2, &mut rng);
        s.add("b", 2, &mut rng);
        s.add("c", 2, &mut rng);

        assert_eq!(s.len(), 2);
        // The newest key always lands; exactly one of the old ones survives.
        assert!(s.as_slice().contains(&"c".to_string()));
        let survivors = ["a", "b"]
            .iter()
            .filter(|k| s.as_slice().iter().any(|x| x == *k))
            .count();
        assert_eq!(survivors, 1);
    }

    #[test]
    fn test_absorb_respects_limit() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut left = KeySample::new();
        let mut right = KeySample::new();
        for i in 0..4 {
            left.add(format!("l{i}"), 4, &mut rng);
            right.add(format!("r{i}"), 4, &mut rng);
        }

        left.absorb(right, 4, &mut rng);
        assert_eq!(left.len(), 4);
        // The last absorbed key always lands.
        assert!(left.as_slice().contains(&"r3".to_string()));
    }

    #[test]
    fn test_absorb_into_empty_keeps_order() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut src = KeySample::new();
        src.add("x", 3, &mut rng);
        src.add("y", 3, &mut rng);

        let mut dst = KeySample::new();
        dst.absorb(src, 3, &mut rng);
        assert_eq!(dst.into_vec(), vec!["x".to_string(), "y".to_string()]);
    }
}
