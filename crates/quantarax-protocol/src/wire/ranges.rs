//! Range compression for ACK/NACK chunk-index sets
//!
//! A sorted set of unique indices is encoded as comma-separated runs:
//! `"0-2,4-6,8,10-11"`. Decompression is lenient (it accepts unordered and
//! duplicate-containing input); compression always canonicalizes.

use crate::{ProtocolError, Result};

/// Compress a set of indices into canonical comma-separated runs.
///
/// The input need not be sorted or deduplicated; the output always is.
pub fn compress_ranges(indices: &[u32]) -> String {
    let mut sorted: Vec<u32> = indices.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    if sorted.is_empty() {
        return String::new();
    }

    let mut runs = Vec::new();
    let mut start = sorted[0];
    let mut end = sorted[0];

    for &n in &sorted[1..] {
        if n == end + 1 {
            end = n;
        } else {
            runs.push(format_run(start, end));
            start = n;
            end = n;
        }
    }
    runs.push(format_run(start, end));

    runs.join(",")
}

fn format_run(start: u32, end: u32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}-{end}")
    }
}

/// Decompress a comma-separated run string back into a sorted, deduplicated
/// list of indices.
///
/// Leniently accepts unordered runs and trailing commas; malformed runs
/// (non-numeric, or a descending range) yield [`ProtocolError::MalformedFrame`].
pub fn decompress_ranges(s: &str) -> Result<Vec<u32>> {
    let mut out = Vec::new();

    for token in s.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        match token.split_once('-') {
            Some((a, b)) => {
                let start: u32 = a
                    .parse()
                    .map_err(|_| ProtocolError::MalformedFrame(format!("bad range start: {token}")))?;
                let end: u32 = b
                    .parse()
                    .map_err(|_| ProtocolError::MalformedFrame(format!("bad range end: {token}")))?;
                if end < start {
                    return Err(ProtocolError::MalformedFrame(format!("descending range: {token}")));
                }
                out.extend(start..=end);
            }
            None => {
                let n: u32 = token
                    .parse()
                    .map_err(|_| ProtocolError::MalformedFrame(format!("bad index: {token}")))?;
                out.push(n);
            }
        }
    }

    out.sort_unstable();
    out.dedup();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn literal_scenario_from_spec() {
        let indices = [0, 1, 2, 4, 5, 6, 8, 10, 11];
        let compressed = compress_ranges(&indices);
        assert_eq!(compressed, "0-2,4-6,8,10-11");
        assert_eq!(decompress_ranges(&compressed).unwrap(), indices.to_vec());
    }

    #[test]
    fn empty_input_roundtrips() {
        assert_eq!(compress_ranges(&[]), "");
        assert_eq!(decompress_ranges("").unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn single_value() {
        assert_eq!(compress_ranges(&[5]), "5");
    }

    #[test]
    fn unordered_input_is_canonicalized() {
        assert_eq!(compress_ranges(&[5, 1, 3, 2, 4]), "1-5");
    }

    #[test]
    fn duplicates_are_collapsed() {
        assert_eq!(compress_ranges(&[1, 1, 2, 2, 3]), "1-3");
    }

    #[test]
    fn decompress_rejects_descending_range() {
        assert!(decompress_ranges("5-1").is_err());
    }

    #[test]
    fn decompress_rejects_garbage() {
        assert!(decompress_ranges("not-a-number").is_err());
    }

    #[test]
    fn decompress_is_lenient_to_unordered_input_with_trailing_comma() {
        assert_eq!(decompress_ranges("3,1,2,").unwrap(), vec![1, 2, 3]);
    }

    proptest! {
        #[test]
        fn roundtrip_any_sorted_unique_set(mut indices in proptest::collection::vec(0u32..5000, 0..200)) {
            indices.sort_unstable();
            indices.dedup();
            let compressed = compress_ranges(&indices);
            let decompressed = decompress_ranges(&compressed).unwrap();
            prop_assert_eq!(decompressed, indices);
        }
    }
}
