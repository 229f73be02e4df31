//! huffstream: streaming Huffman codec with deterministic output.
//!
//! The pipeline:
//! - frequency analysis over the input bytes (parallelizable)
//! - greedy prefix-tree construction with reproducible tie-breaking
//! - code-table derivation (left = 0, right = 1)
//! - textual header plus MSB-first packed body
//!
//! Compression is a single-shot, deterministic transform: the same input
//! always produces a byte-identical artifact, on both the sequential and
//! parallel paths.

pub mod codebook;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frequency;
pub mod header;
pub mod tree;

use std::io::{BufRead, Cursor, Write};

use tracing::debug;

pub use crate::codebook::{CodeTable, ReverseCodeTable};
pub use crate::config::CodecConfig;
pub use crate::error::CodecError;
pub use crate::frequency::FrequencyTable;
pub use crate::header::Header;
pub use crate::tree::HuffNode;

/// Compressed artifact plus statistics about the run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CompressedOutput {
    pub original_size: usize,
    pub compressed_size: usize,
    pub padding_bits: u8,
    pub data: Vec<u8>,
    pub ratio: f64,
    pub metadata: CompressionMetadata,
}

/// Metadata about the compression process
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CompressionMetadata {
    pub entropy_bits: f64,
    pub distinct_symbols: usize,
    pub chunk_count: usize,
}

/// The codec engine.
pub struct HuffmanCodec {
    config: CodecConfig,
}

impl HuffmanCodec {
    /// Create a codec with the given configuration.
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Compress `data` into a self-describing artifact (header + packed
    /// body).
    ///
    /// Empty input is valid: the artifact carries `PaddingBits:0`, an empty
    /// code table, and an empty body.
    pub fn compress(&self, data: &[u8]) -> Result<CompressedOutput, CodecError> {
        let frequencies = frequency::count_slice(data);
        let codes = codes_for(&frequencies)?;
        let (body, padding_bits) = encoder::encode(data, &codes)?;
        self.assemble(data, &codes, body, padding_bits)
    }

    /// Compress using the parallel frequency-counting and encoding paths.
    /// The artifact is byte-identical to [`Self::compress`].
    pub async fn compress_parallel(&self, data: &[u8]) -> Result<CompressedOutput, CodecError> {
        let frequencies = frequency::count_parallel(data, &self.config).await?;
        let codes = codes_for(&frequencies)?;
        let (body, padding_bits) = encoder::encode_parallel(data, &codes, &self.config).await?;
        self.assemble(data, &codes, body, padding_bits)
    }

    /// Decompress a full artifact produced by [`Self::compress`].
    pub fn decompress(&self, artifact: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut cursor = Cursor::new(artifact);
        let parsed = header::read_header(&mut cursor)?;
        let body = &artifact[parsed.body_offset as usize..];
        let reverse = codebook::reverse_table(&parsed.codes);
        let output = decoder::decode(body, &reverse, parsed.padding_bits)?;
        debug!(
            compressed = artifact.len(),
            original = output.len(),
            "decompressed"
        );
        Ok(output)
    }

    /// Streaming decompression. `total_len` is the artifact's full length in
    /// bytes (e.g. the file size), from which the body length is derived
    /// once the header has been read.
    pub fn decompress_reader<R: BufRead, W: Write>(
        &self,
        source: &mut R,
        total_len: u64,
        sink: &mut W,
    ) -> Result<u64, CodecError> {
        let parsed = header::read_header(source)?;
        if total_len < parsed.body_offset {
            return Err(CodecError::CorruptStream(format!(
                "artifact length {} is shorter than its {}-byte header",
                total_len, parsed.body_offset
            )));
        }
        let body_len = total_len - parsed.body_offset;
        let reverse = codebook::reverse_table(&parsed.codes);
        decoder::decode_reader(
            source,
            body_len,
            &reverse,
            parsed.padding_bits,
            self.config.chunk_size,
            sink,
        )
    }

    fn assemble(
        &self,
        data: &[u8],
        codes: &CodeTable,
        body: Vec<u8>,
        padding_bits: u8,
    ) -> Result<CompressedOutput, CodecError> {
        let mut artifact = Vec::with_capacity(body.len() + codes.len() * 12 + 32);
        header::write_header(&mut artifact, codes, padding_bits)?;
        artifact.extend_from_slice(&body);

        let ratio = if data.is_empty() {
            1.0
        } else {
            artifact.len() as f64 / data.len() as f64
        };
        let chunk_size = self.config.chunk_size.max(1);
        debug!(
            original = data.len(),
            compressed = artifact.len(),
            padding_bits,
            "compressed"
        );

        Ok(CompressedOutput {
            original_size: data.len(),
            compressed_size: artifact.len(),
            padding_bits,
            ratio,
            metadata: CompressionMetadata {
                entropy_bits: shannon_entropy(data),
                distinct_symbols: codes.len(),
                chunk_count: data.len().div_ceil(chunk_size).max(1),
            },
            data: artifact,
        })
    }
}

impl Default for HuffmanCodec {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

fn codes_for(frequencies: &FrequencyTable) -> Result<CodeTable, CodecError> {
    if frequencies.is_empty() {
        return Ok(CodeTable::new());
    }
    let root = tree::build_tree(frequencies)?;
    codebook::generate_code_table(&root)
}

/// Compute Shannon entropy of data in bits per byte
pub fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut freq = [0u64; 256];
    for &b in data {
        freq[b as usize] += 1;
    }
    let len = data.len() as f64;
    let mut entropy = 0.0;
    for &f in &freq {
        if f > 0 {
            let p = f as f64 / len;
            entropy -= p * p.log2();
        }
    }
    entropy
}
