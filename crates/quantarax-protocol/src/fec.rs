//! Forward error correction (C3): Reed-Solomon encode/reconstruct over
//! fixed-size shard sets.

use reed_solomon_erasure::galois_8::ReedSolomon;

use crate::{ProtocolError, Result};

/// Data/parity shard counts for one FEC group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FecParams {
    /// Data shard count, `1..=256`
    pub k: usize,
    /// Parity shard count, `1..=256`
    pub r: usize,
}

impl FecParams {
    /// Validate `k` and `r` against the supported range.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 || self.k > 256 || self.r == 0 || self.r > 256 {
            return Err(ProtocolError::InvalidFECParameters { k: self.k, r: self.r });
        }
        Ok(())
    }
}

/// A Reed-Solomon codec fixed to one `(K, R)` shard configuration.
pub struct FecCodec {
    params: FecParams,
    rs: ReedSolomon,
}

impl FecCodec {
    /// Build a codec for the given parameters.
    pub fn new(params: FecParams) -> Result<Self> {
        params.validate()?;
        let rs = ReedSolomon::new(params.k, params.r)
            .map_err(|_| ProtocolError::InvalidFECParameters { k: params.k, r: params.r })?;
        Ok(Self { params, rs })
    }

    /// Shard/parity configuration this codec was built for.
    pub fn params(&self) -> FecParams {
        self.params
    }

    /// Encode exactly `K` equal-size data shards into `R` parity shards.
    pub fn encode(&self, data_shards: &[Vec<u8>]) -> Result<Vec<Vec<u8>>> {
        if data_shards.len() != self.params.k {
            return Err(ProtocolError::InvalidArgument(format!(
                "expected {} data shards, got {}",
                self.params.k,
                data_shards.len()
            )));
        }
        let shard_len = data_shards[0].len();
        if data_shards.iter().any(|s| s.len() != shard_len) {
            return Err(ProtocolError::InvalidArgument("data shards are not equal-sized".into()));
        }

        let mut shards: Vec<Vec<u8>> = data_shards.to_vec();
        shards.extend((0..self.params.r).map(|_| vec![0u8; shard_len]));

        self.rs
            .encode(&mut shards)
            .map_err(|e| ProtocolError::CorruptionDetected(format!("FEC encode failed: {e}")))?;

        Ok(shards.split_off(self.params.k))
    }

    /// Repair up to `R` missing shards in place. `shards` must have exactly
    /// `K + R` entries, with missing ones represented as `None`.
    pub fn reconstruct(&self, shards: &mut [Option<Vec<u8>>]) -> Result<()> {
        let total = self.params.k + self.params.r;
        if shards.len() != total {
            return Err(ProtocolError::InvalidArgument(format!(
                "expected {total} shards, got {}",
                shards.len()
            )));
        }

        let missing = shards.iter().filter(|s| s.is_none()).count();
        if missing > self.params.r {
            return Err(ProtocolError::TooManyMissingShards { missing, max_recoverable: self.params.r });
        }

        self.rs
            .reconstruct(shards)
            .map_err(|e| ProtocolError::CorruptionDetected(format!("FEC reconstruct failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shards_of(data: &[&[u8]]) -> Vec<Vec<u8>> {
        data.iter().map(|d| d.to_vec()).collect()
    }

    #[test]
    fn encode_then_full_reconstruct_recovers_original() {
        let codec = FecCodec::new(FecParams { k: 3, r: 2 }).unwrap();
        let data = shards_of(&[b"AAAA", b"BBBB", b"CCCC"]);
        let parity = codec.encode(&data).unwrap();
        assert_eq!(parity.len(), 2);

        let mut shards: Vec<Option<Vec<u8>>> =
            data.iter().cloned().map(Some).chain(parity.into_iter().map(Some)).collect();

        shards[0] = None;
        shards[4] = None;
        codec.reconstruct(&mut shards).unwrap();

        assert_eq!(shards[0].as_ref().unwrap(), &data[0]);
    }

    #[test]
    fn more_than_r_missing_is_fatal() {
        let codec = FecCodec::new(FecParams { k: 3, r: 2 }).unwrap();
        let data = shards_of(&[b"AAAA", b"BBBB", b"CCCC"]);
        let parity = codec.encode(&data).unwrap();
        let mut shards: Vec<Option<Vec<u8>>> =
            data.into_iter().map(Some).chain(parity.into_iter().map(Some)).collect();
        shards[0] = None;
        shards[1] = None;
        shards[2] = None;

        let err = codec.reconstruct(&mut shards).unwrap_err();
        assert!(matches!(err, ProtocolError::TooManyMissingShards { missing: 3, max_recoverable: 2 }));
    }

    #[test]
    fn rejects_wrong_number_of_data_shards() {
        let codec = FecCodec::new(FecParams { k: 3, r: 2 }).unwrap();
        let data = shards_of(&[b"AAAA", b"BBBB"]);
        assert!(codec.encode(&data).is_err());
    }

    #[test]
    fn rejects_unequal_size_shards() {
        let codec = FecCodec::new(FecParams { k: 2, r: 2 }).unwrap();
        let data = shards_of(&[b"AAAA", b"BB"]);
        assert!(codec.encode(&data).is_err());
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        assert!(FecCodec::new(FecParams { k: 0, r: 2 }).is_err());
        assert!(FecCodec::new(FecParams { k: 2, r: 0 }).is_err());
        assert!(FecCodec::new(FecParams { k: 300, r: 2 }).is_err());
    }

    #[test]
    fn no_missing_shards_reconstructs_trivially() {
        let codec = FecCodec::new(FecParams { k: 2, r: 2 }).unwrap();
        let data = shards_of(&[b"AAAA", b"BBBB"]);
        let parity = codec.encode(&data).unwrap();
        let mut shards: Vec<Option<Vec<u8>>> =
            data.into_iter().map(Some).chain(parity.into_iter().map(Some)).collect();
        codec.reconstruct(&mut shards).unwrap();
    }
}
