//! Frequency analysis over byte sources.
//!
//! Counting is the one embarrassingly-parallel step of the pipeline: chunk
//! histograms merge by per-symbol summation, which is commutative and
//! associative, so chunk boundaries and worker scheduling cannot change the
//! result.

use std::collections::BTreeMap;
use std::io::Read;

use tracing::trace;

use crate::config::CodecConfig;
use crate::error::CodecError;

/// Symbol -> occurrence count, keyed in ascending symbol order.
pub type FrequencyTable = BTreeMap<u8, u64>;

fn histogram(data: &[u8]) -> [u64; 256] {
    let mut counts = [0u64; 256];
    for &b in data {
        counts[b as usize] += 1;
    }
    counts
}

fn into_table(counts: [u64; 256]) -> FrequencyTable {
    counts
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count > 0)
        .map(|(symbol, &count)| (symbol as u8, count))
        .collect()
}

/// Count symbol frequencies in a byte slice. An empty slice yields an empty
/// table.
pub fn count_slice(data: &[u8]) -> FrequencyTable {
    into_table(histogram(data))
}

/// Count symbol frequencies from a reader, streaming in `chunk_size` batches.
/// I/O errors propagate to the caller unchanged.
pub fn count_reader<R: Read>(
    source: &mut R,
    chunk_size: usize,
) -> Result<FrequencyTable, CodecError> {
    let mut counts = [0u64; 256];
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        let n = source.read(&mut buf)?;
        if n == 0 {
            break;
        }
        for &b in &buf[..n] {
            counts[b as usize] += 1;
        }
    }
    Ok(into_table(counts))
}

/// Count symbol frequencies by fanning chunks out to blocking worker tasks,
/// at most `max_workers` in flight, then summing the partial histograms.
pub async fn count_parallel(
    data: &[u8],
    config: &CodecConfig,
) -> Result<FrequencyTable, CodecError> {
    let chunk_size = config.chunk_size.max(1);
    let max_workers = config.max_workers.max(1);

    trace!(
        len = data.len(),
        chunk_size,
        max_workers,
        "counting frequencies in parallel"
    );

    let mut counts = [0u64; 256];
    let mut chunks = data.chunks(chunk_size).map(|chunk| chunk.to_vec());
    loop {
        let wave: Vec<Vec<u8>> = chunks.by_ref().take(max_workers).collect();
        if wave.is_empty() {
            break;
        }
        let handles: Vec<_> = wave
            .into_iter()
            .map(|chunk| tokio::task::spawn_blocking(move || histogram(&chunk)))
            .collect();
        for handle in handles {
            let partial = handle.await?;
            for (total, part) in counts.iter_mut().zip(partial.iter()) {
                *total += part;
            }
        }
    }
    Ok(into_table(counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    #[test]
    fn test_exact_counts() {
        let table = count_slice(b"abracadabra");
        assert_eq!(table.get(&b'a'), Some(&5));
        assert_eq!(table.get(&b'b'), Some(&2));
        assert_eq!(table.get(&b'r'), Some(&2));
        assert_eq!(table.get(&b'c'), Some(&1));
        assert_eq!(table.get(&b'd'), Some(&1));
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_empty_source() {
        assert!(count_slice(b"").is_empty());
    }

    #[test]
    fn test_reader_matches_slice() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(40);
        let mut cursor = Cursor::new(data.clone());
        let from_reader = count_reader(&mut cursor, 7).unwrap();
        assert_eq!(from_reader, count_slice(&data));
    }

    #[test]
    fn test_reader_error_propagates() {
        struct FailingReader;
        impl Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken"))
            }
        }
        let err = count_reader(&mut FailingReader, 1024).unwrap_err();
        assert!(matches!(err, CodecError::Io(_)));
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let config = CodecConfig {
            chunk_size: 333,
            max_workers: 4,
        };
        let parallel = count_parallel(&data, &config).await.unwrap();
        assert_eq!(parallel, count_slice(&data));
    }

    #[tokio::test]
    async fn test_chunk_size_does_not_affect_result() {
        let data = b"mississippi river delta".repeat(100);
        let mut results = Vec::new();
        for chunk_size in [1, 13, 1024, 100_000] {
            let config = CodecConfig {
                chunk_size,
                max_workers: 3,
            };
            results.push(count_parallel(&data, &config).await.unwrap());
        }
        assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
    }
}
