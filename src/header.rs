//! Textual artifact header: padding-bit count plus the code table.
//!
//! Layout, one newline-terminated record per line:
//!
//! ```text
//! PaddingBits:<decimal 0..=7>
//! <escaped-symbol>:<bitstring>
//! ...
//! DATA_STARTS:
//! ```
//!
//! The packed body begins at the byte immediately after the sentinel line.
//! Symbol keys that would collide with the line structure are escaped: a
//! newline symbol becomes an empty key, a space becomes the token `SPACE`,
//! and a colon doubles the delimiter so the line carries exactly two colons.
//! Every other symbol is written as its single raw byte.

use std::io::{BufRead, Write};

use crate::codebook::CodeTable;
use crate::error::CodecError;

/// Sentinel line separating the header from the packed body.
pub const DATA_SENTINEL: &str = "DATA_STARTS:";

const PADDING_FIELD: &str = "PaddingBits:";
const SPACE_TOKEN: &str = "SPACE";

/// Parsed header contents plus the byte offset where the body begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub codes: CodeTable,
    pub padding_bits: u8,
    pub body_offset: u64,
}

/// Serialize the padding count and code table.
///
/// The engine packs the body before calling this, so the padding value is
/// final when written; the header is never amended in place.
pub fn write_header<W: Write>(
    sink: &mut W,
    codes: &CodeTable,
    padding_bits: u8,
) -> Result<(), CodecError> {
    if padding_bits > 7 {
        return Err(CodecError::InvalidPadding(padding_bits));
    }

    writeln!(sink, "{}{}", PADDING_FIELD, padding_bits)?;
    for (&symbol, code) in codes {
        match symbol {
            b'\n' => writeln!(sink, ":{}", code)?,
            b' ' => writeln!(sink, "{}:{}", SPACE_TOKEN, code)?,
            b':' => writeln!(sink, "::{}", code)?,
            other => {
                sink.write_all(&[other])?;
                writeln!(sink, ":{}", code)?;
            }
        }
    }
    writeln!(sink, "{}", DATA_SENTINEL)?;
    Ok(())
}

/// Parse a header, reading line by line until the sentinel. Returns the code
/// table, the padding count, and the offset of the first body byte.
pub fn read_header<R: BufRead>(source: &mut R) -> Result<Header, CodecError> {
    let mut codes = CodeTable::new();
    let mut padding_bits: Option<u8> = None;
    let mut offset: u64 = 0;
    let mut line = Vec::new();

    loop {
        line.clear();
        let n = source.read_until(b'\n', &mut line)?;
        if n == 0 {
            return Err(CodecError::MalformedHeader(
                "missing DATA_STARTS sentinel".to_string(),
            ));
        }
        offset += n as u64;

        let record: &[u8] = match line.last() {
            Some(&b'\n') => &line[..line.len() - 1],
            _ => &line,
        };

        if record == DATA_SENTINEL.as_bytes() {
            let padding_bits = padding_bits.ok_or_else(|| {
                CodecError::MalformedHeader("missing PaddingBits field".to_string())
            })?;
            return Ok(Header {
                codes,
                padding_bits,
                body_offset: offset,
            });
        }

        if let Some(value) = record.strip_prefix(PADDING_FIELD.as_bytes()) {
            if padding_bits.is_some() {
                return Err(CodecError::MalformedHeader(
                    "duplicate PaddingBits field".to_string(),
                ));
            }
            let parsed = std::str::from_utf8(value)
                .ok()
                .and_then(|v| v.parse::<u8>().ok())
                .filter(|&v| v <= 7)
                .ok_or_else(|| {
                    CodecError::MalformedHeader(format!(
                        "invalid PaddingBits value {:?}",
                        String::from_utf8_lossy(value)
                    ))
                })?;
            padding_bits = Some(parsed);
            continue;
        }

        let (symbol, bits) = parse_code_line(record)?;
        if codes.insert(symbol, bits).is_some() {
            return Err(CodecError::MalformedHeader(format!(
                "duplicate code for symbol {:#04x}",
                symbol
            )));
        }
    }
}

fn parse_code_line(record: &[u8]) -> Result<(u8, String), CodecError> {
    let colons: Vec<usize> = record
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b == b':')
        .map(|(i, _)| i)
        .collect();

    let (symbol, bits): (u8, &[u8]) = match colons.len() {
        1 => {
            let key = &record[..colons[0]];
            let symbol = match key {
                b"" => b'\n',
                k if k == SPACE_TOKEN.as_bytes() => b' ',
                [single] => *single,
                _ => {
                    return Err(CodecError::MalformedHeader(format!(
                        "unrecognized symbol key {:?}",
                        String::from_utf8_lossy(key)
                    )))
                }
            };
            (symbol, &record[colons[0] + 1..])
        }
        // a colon symbol doubles the delimiter: exactly two colons, adjacent
        2 if record.starts_with(b"::") => (b':', &record[2..]),
        _ => {
            return Err(CodecError::MalformedHeader(format!(
                "malformed code line {:?}",
                String::from_utf8_lossy(record)
            )))
        }
    };

    if bits.is_empty() || bits.iter().any(|&b| b != b'0' && b != b'1') {
        return Err(CodecError::MalformedHeader(format!(
            "code for symbol {:#04x} is not a bitstring",
            symbol
        )));
    }

    Ok((symbol, bits.iter().map(|&b| b as char).collect()))
}
