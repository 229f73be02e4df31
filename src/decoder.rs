//! Bitstream decoding against a reverse code table.
//!
//! Decoding is inherently sequential: code boundaries depend on every bit
//! that came before, so there is no parallel variant. Bits are consumed
//! MSB-first, mirroring the encoder.

use std::io::{Read, Write};

use bitstream_io::{BigEndian, BitRead, BitReader};

use crate::codebook::ReverseCodeTable;
use crate::error::CodecError;

/// Candidate-code state carried across bits (and across batch reads in the
/// streaming path).
struct Walker<'a> {
    reverse: &'a ReverseCodeTable,
    longest: usize,
    candidate: String,
}

impl<'a> Walker<'a> {
    fn new(reverse: &'a ReverseCodeTable) -> Self {
        Walker {
            reverse,
            longest: reverse.keys().map(|code| code.len()).max().unwrap_or(0),
            candidate: String::new(),
        }
    }

    fn step(&mut self, bit: bool) -> Result<Option<u8>, CodecError> {
        self.candidate.push(if bit { '1' } else { '0' });
        if let Some(&symbol) = self.reverse.get(self.candidate.as_str()) {
            self.candidate.clear();
            return Ok(Some(symbol));
        }
        // longer codes do not exist, so this run can never match
        if self.candidate.len() >= self.longest {
            return Err(CodecError::CorruptStream(format!(
                "bit run {:?} matches no code",
                self.candidate
            )));
        }
        Ok(None)
    }

    fn finish(&self) -> Result<(), CodecError> {
        if self.candidate.is_empty() {
            Ok(())
        } else {
            Err(CodecError::CorruptStream(format!(
                "{} trailing bits do not form a code",
                self.candidate.len()
            )))
        }
    }
}

/// Decode a packed body, trimming `padding_bits` filler bits from the end.
/// Leftover bits that match no code are an error, never silently dropped.
pub fn decode(
    body: &[u8],
    reverse: &ReverseCodeTable,
    padding_bits: u8,
) -> Result<Vec<u8>, CodecError> {
    if padding_bits > 7 {
        return Err(CodecError::InvalidPadding(padding_bits));
    }
    if body.is_empty() {
        if padding_bits != 0 {
            return Err(CodecError::CorruptStream(
                "padding recorded for an empty body".to_string(),
            ));
        }
        return Ok(Vec::new());
    }

    let total_bits = body.len() as u64 * 8 - padding_bits as u64;
    let mut reader = BitReader::endian(body, BigEndian);
    let mut walker = Walker::new(reverse);
    let mut output = Vec::new();
    for _ in 0..total_bits {
        let bit = reader.read_bit()?;
        if let Some(symbol) = walker.step(bit)? {
            output.push(symbol);
        }
    }
    walker.finish()?;
    Ok(output)
}

/// Streaming decode. The caller supplies `body_len` (e.g. file size minus
/// header offset) so the final batch, and with it the padding trim, is known
/// in advance. The candidate code carries across batch boundaries. Returns
/// the number of bytes written to `sink`.
pub fn decode_reader<R: Read, W: Write>(
    source: &mut R,
    body_len: u64,
    reverse: &ReverseCodeTable,
    padding_bits: u8,
    chunk_size: usize,
    sink: &mut W,
) -> Result<u64, CodecError> {
    if padding_bits > 7 {
        return Err(CodecError::InvalidPadding(padding_bits));
    }
    if body_len == 0 {
        if padding_bits != 0 {
            return Err(CodecError::CorruptStream(
                "padding recorded for an empty body".to_string(),
            ));
        }
        return Ok(0);
    }

    let mut remaining_bits = body_len * 8 - padding_bits as u64;
    let mut consumed: u64 = 0;
    let mut written: u64 = 0;
    let mut walker = Walker::new(reverse);
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut batch_out = Vec::new();

    while consumed < body_len {
        let want = buf.len().min((body_len - consumed) as usize);
        let n = source.read(&mut buf[..want])?;
        if n == 0 {
            return Err(CodecError::CorruptStream(format!(
                "body ended after {} of {} bytes",
                consumed, body_len
            )));
        }
        consumed += n as u64;

        batch_out.clear();
        for &byte in &buf[..n] {
            let take = remaining_bits.min(8);
            for i in 0..take {
                let bit = (byte >> (7 - i)) & 1 == 1;
                if let Some(symbol) = walker.step(bit)? {
                    batch_out.push(symbol);
                }
            }
            remaining_bits -= take;
        }
        sink.write_all(&batch_out)?;
        written += batch_out.len() as u64;
    }

    walker.finish()?;
    Ok(written)
}
