//! Bit-level packing of symbol codes into body bytes.
//!
//! Bits are packed MSB-first; the decoder mirrors the same order. The final
//! byte is completed with zero bits and the number of those padding bits is
//! returned alongside the body.

use std::io::Read;
use std::sync::Arc;

use bitstream_io::{BigEndian, BitWrite, BitWriter};
use tracing::trace;

use crate::codebook::CodeTable;
use crate::config::CodecConfig;
use crate::error::CodecError;

/// Pack a byte slice into body bytes. Returns the packed bytes and the
/// padding-bit count, which is 0 iff the bit length was already a multiple
/// of 8. Empty input yields an empty body with zero padding.
pub fn encode(data: &[u8], codes: &CodeTable) -> Result<(Vec<u8>, u8), CodecError> {
    let mut writer = BitWriter::endian(Vec::new(), BigEndian);
    let mut total_bits: u64 = 0;
    for &byte in data {
        total_bits += write_code(&mut writer, codes, byte)?;
    }
    finish(writer, total_bits)
}

/// Same contract as [`encode`], streaming the source in fixed-size batches.
/// Partial bytes carry across batch boundaries inside the bit writer.
pub fn encode_reader<R: Read>(
    source: &mut R,
    codes: &CodeTable,
    chunk_size: usize,
) -> Result<(Vec<u8>, u8), CodecError> {
    let mut writer = BitWriter::endian(Vec::new(), BigEndian);
    let mut total_bits: u64 = 0;
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        let n = source.read(&mut buf)?;
        if n == 0 {
            break;
        }
        for &byte in &buf[..n] {
            total_bits += write_code(&mut writer, codes, byte)?;
        }
    }
    finish(writer, total_bits)
}

/// Parallel variant: each chunk is packed by a blocking worker (a pure
/// function of table and chunk), then the per-chunk bit runs are stitched
/// back into one stream in their original order. The output is bit-identical
/// to [`encode`].
pub async fn encode_parallel(
    data: &[u8],
    codes: &CodeTable,
    config: &CodecConfig,
) -> Result<(Vec<u8>, u8), CodecError> {
    let chunk_size = config.chunk_size.max(1);
    let max_workers = config.max_workers.max(1);
    let codes = Arc::new(codes.clone());

    trace!(
        len = data.len(),
        chunk_size,
        max_workers,
        "encoding chunks in parallel"
    );

    let mut writer = BitWriter::endian(Vec::new(), BigEndian);
    let mut total_bits: u64 = 0;

    let mut chunks = data.chunks(chunk_size).map(|chunk| chunk.to_vec());
    loop {
        let wave: Vec<Vec<u8>> = chunks.by_ref().take(max_workers).collect();
        if wave.is_empty() {
            break;
        }
        let handles: Vec<_> = wave
            .into_iter()
            .map(|chunk| {
                let codes = Arc::clone(&codes);
                tokio::task::spawn_blocking(move || encode_chunk(&chunk, &codes))
            })
            .collect();
        for handle in handles {
            let (packed, bits) = handle.await??;
            append_bits(&mut writer, &packed, bits)?;
            total_bits += bits;
        }
    }
    finish(writer, total_bits)
}

fn write_code(
    writer: &mut BitWriter<Vec<u8>, BigEndian>,
    codes: &CodeTable,
    byte: u8,
) -> Result<u64, CodecError> {
    let code = codes.get(&byte).ok_or(CodecError::UnknownSymbol(byte))?;
    for bit in code.bytes() {
        writer.write_bit(bit == b'1')?;
    }
    Ok(code.len() as u64)
}

fn encode_chunk(chunk: &[u8], codes: &CodeTable) -> Result<(Vec<u8>, u64), CodecError> {
    let mut writer = BitWriter::endian(Vec::new(), BigEndian);
    let mut bits: u64 = 0;
    for &byte in chunk {
        bits += write_code(&mut writer, codes, byte)?;
    }
    writer.byte_align()?;
    Ok((writer.into_writer(), bits))
}

fn append_bits(
    writer: &mut BitWriter<Vec<u8>, BigEndian>,
    packed: &[u8],
    bits: u64,
) -> Result<(), CodecError> {
    let mut index = 0;
    if writer.byte_aligned() {
        let whole = (bits / 8) as usize;
        writer.write_bytes(&packed[..whole])?;
        index = bits - bits % 8;
    }
    while index < bits {
        let bit = (packed[(index / 8) as usize] >> (7 - index % 8)) & 1 == 1;
        writer.write_bit(bit)?;
        index += 1;
    }
    Ok(())
}

fn finish(
    mut writer: BitWriter<Vec<u8>, BigEndian>,
    total_bits: u64,
) -> Result<(Vec<u8>, u8), CodecError> {
    let padding_bits = ((8 - total_bits % 8) % 8) as u8;
    writer.byte_align()?;
    Ok((writer.into_writer(), padding_bits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn small_table() -> CodeTable {
        CodeTable::from([
            (b'a', "0".to_string()),
            (b'b', "10".to_string()),
            (b'c', "11".to_string()),
        ])
    }

    #[test]
    fn test_known_packing() {
        // "abc" -> 0 10 11 -> 01011 padded to 01011000
        let (body, padding) = encode(b"abc", &small_table()).unwrap();
        assert_eq!(body, vec![0b0101_1000]);
        assert_eq!(padding, 3);
    }

    #[test]
    fn test_padding_zero_on_byte_boundary() {
        // "bbbb" -> 10 10 10 10, exactly one byte
        let (body, padding) = encode(b"bbbb", &small_table()).unwrap();
        assert_eq!(body, vec![0b1010_1010]);
        assert_eq!(padding, 0);
    }

    #[test]
    fn test_empty_input() {
        let (body, padding) = encode(b"", &small_table()).unwrap();
        assert!(body.is_empty());
        assert_eq!(padding, 0);
    }

    #[test]
    fn test_unknown_symbol_is_error() {
        let err = encode(b"abz", &small_table()).unwrap_err();
        assert!(matches!(err, CodecError::UnknownSymbol(b'z')));
    }

    #[test]
    fn test_reader_matches_slice() {
        let data = b"abcabcaabbcc".repeat(50);
        let expected = encode(&data, &small_table()).unwrap();
        let mut cursor = Cursor::new(data);
        let streamed = encode_reader(&mut cursor, &small_table(), 5).unwrap();
        assert_eq!(streamed, expected);
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let table = CodeTable::from([
            (b'a', "0".to_string()),
            (b'b', "10".to_string()),
            (b'c', "110".to_string()),
            (b'd', "111".to_string()),
        ]);
        let data = b"abacabadabacaba".repeat(100);
        let expected = encode(&data, &table).unwrap();
        for chunk_size in [1, 3, 64, 1 << 16] {
            let config = CodecConfig {
                chunk_size,
                max_workers: 4,
            };
            let parallel = encode_parallel(&data, &table, &config).await.unwrap();
            assert_eq!(parallel, expected, "chunk_size {}", chunk_size);
        }
    }

    #[tokio::test]
    async fn test_parallel_unknown_symbol_is_error() {
        let config = CodecConfig::default();
        let err = encode_parallel(b"abz", &small_table(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, CodecError::UnknownSymbol(b'z')));
    }
}
