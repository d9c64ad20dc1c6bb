//! Deterministic nonce derivation
//!
//! Both peers derive the nonce for chunk `i` independently from the shared
//! `iv_base` and the chunk index, rather than transmitting nonces on the
//! wire. The control channel uses the same `iv_base` with the top counter
//! bit forced to 1, separating its nonce space from the payload channel's.

/// Derive a 12-byte AES-GCM nonce from a session's `iv_base`.
///
/// The nonce is `iv_base` with its low 8 bytes XORed against `counter`
/// (little-endian). When `is_control` is set, bit 63 of the counter is
/// forced to 1 before the XOR, which partitions the control channel's
/// nonce space from the payload channel's even when both share one
/// `iv_base` and happen to reuse a counter value.
pub fn derive_nonce(iv_base: &[u8; 12], counter: u64, is_control: bool) -> [u8; 12] {
    let counter = if is_control {
        counter | (1u64 << 63)
    } else {
        counter
    };

    let mut nonce = *iv_base;
    let counter_bytes = counter.to_le_bytes();
    for i in 0..8 {
        nonce[4 + i] ^= counter_bytes[i];
    }
    nonce
}

/// Stateful nonce sequence for a single direction of a session.
///
/// Wraps [`derive_nonce`] with a monotonically increasing counter so callers
/// encrypting a stream of chunks don't have to track the index themselves.
#[derive(Debug, Clone)]
pub struct NonceSequence {
    iv_base: [u8; 12],
    is_control: bool,
    counter: u64,
}

impl NonceSequence {
    /// Create a new sequence over the given `iv_base`.
    pub fn new(iv_base: [u8; 12], is_control: bool) -> Self {
        Self {
            iv_base,
            is_control,
            counter: 0,
        }
    }

    /// Derive the next nonce and advance the counter.
    pub fn next_nonce(&mut self) -> [u8; 12] {
        let nonce = derive_nonce(&self.iv_base, self.counter, self.is_control);
        self.counter = self.counter.wrapping_add(1);
        nonce
    }

    /// The nonce for an arbitrary counter value, without advancing state.
    ///
    /// Used on resume, when a receiver needs the nonce for a chunk index it
    /// has not sequentially reached yet.
    pub fn nonce_for(&self, counter: u64) -> [u8; 12] {
        derive_nonce(&self.iv_base, counter, self.is_control)
    }

    /// Current counter value.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Fast-forward the counter, e.g. when resuming a partially-sent stream.
    pub fn set_counter(&mut self, counter: u64) {
        self.counter = counter;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_same_inputs() {
        let iv_base = [7u8; 12];
        assert_eq!(derive_nonce(&iv_base, 42, false), derive_nonce(&iv_base, 42, false));
    }

    #[test]
    fn distinct_counters_yield_distinct_nonces() {
        let iv_base = [7u8; 12];
        assert_ne!(derive_nonce(&iv_base, 0, false), derive_nonce(&iv_base, 1, false));
    }

    #[test]
    fn control_and_payload_channels_never_collide() {
        let iv_base = [9u8; 12];
        for counter in [0u64, 1, 1000, u32::MAX as u64] {
            assert_ne!(
                derive_nonce(&iv_base, counter, false),
                derive_nonce(&iv_base, counter, true)
            );
        }
    }

    #[test]
    fn high_bytes_of_iv_base_are_untouched() {
        let iv_base = [0xAAu8; 12];
        let nonce = derive_nonce(&iv_base, u64::MAX, false);
        assert_eq!(&nonce[..4], &iv_base[..4]);
    }

    #[test]
    fn sequence_advances_counter() {
        let mut seq = NonceSequence::new([1u8; 12], false);
        assert_eq!(seq.counter(), 0);
        let n0 = seq.next_nonce();
        assert_eq!(seq.counter(), 1);
        let n1 = seq.next_nonce();
        assert_ne!(n0, n1);
        assert_eq!(n0, seq.nonce_for(0));
        assert_eq!(n1, seq.nonce_for(1));
    }

    #[test]
    fn sequence_resume_via_set_counter() {
        let mut seq = NonceSequence::new([3u8; 12], true);
        seq.set_counter(50);
        assert_eq!(seq.next_nonce(), seq.nonce_for(50));
        assert_eq!(seq.counter(), 51);
    }
}
