//! Code-table derivation from a prefix tree.

use std::collections::{BTreeMap, HashMap};

use crate::error::CodecError;
use crate::tree::HuffNode;

/// Symbol -> code bitstring of ASCII '0'/'1'. Keyed in ascending symbol
/// order so serialization is deterministic.
pub type CodeTable = BTreeMap<u8, String>;

/// Code bitstring -> symbol, rebuilt from a header for each decode.
pub type ReverseCodeTable = HashMap<String, u8>;

/// Walk the tree with an explicit worklist and record each leaf's path.
///
/// Left edges append '0', right edges append '1'. A bare leaf root (single
/// distinct symbol in the input) is assigned the one-bit code "0".
pub fn generate_code_table(root: &HuffNode) -> Result<CodeTable, CodecError> {
    let mut codes = CodeTable::new();
    let mut worklist: Vec<(&HuffNode, String)> = vec![(root, String::new())];

    while let Some((node, path)) = worklist.pop() {
        match node {
            HuffNode::Leaf { symbol, .. } => {
                let code = if path.is_empty() {
                    "0".to_string()
                } else {
                    path
                };
                if codes.insert(*symbol, code).is_some() {
                    return Err(CodecError::InvalidTree(format!(
                        "symbol {:#04x} appears in more than one leaf",
                        symbol
                    )));
                }
            }
            HuffNode::Internal { left, right, .. } => {
                worklist.push((right, format!("{}1", path)));
                worklist.push((left, format!("{}0", path)));
            }
        }
    }

    Ok(codes)
}

/// Invert a code table for decoding.
pub fn reverse_table(codes: &CodeTable) -> ReverseCodeTable {
    codes
        .iter()
        .map(|(&symbol, code)| (code.clone(), symbol))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::count_slice;
    use crate::frequency::FrequencyTable;
    use crate::tree::build_tree;

    #[test]
    fn test_left_zero_right_one() {
        let table = FrequencyTable::from([(b'a', 1), (b'b', 2)]);
        let root = build_tree(&table).unwrap();
        let codes = generate_code_table(&root).unwrap();
        assert_eq!(codes.get(&b'a').unwrap(), "0");
        assert_eq!(codes.get(&b'b').unwrap(), "1");
    }

    #[test]
    fn test_known_code_lengths() {
        let table = FrequencyTable::from([(b'a', 1), (b'b', 2), (b'c', 4), (b'd', 5)]);
        let root = build_tree(&table).unwrap();
        let codes = generate_code_table(&root).unwrap();
        assert_eq!(codes.get(&b'a').unwrap().len(), 3);
        assert_eq!(codes.get(&b'b').unwrap().len(), 3);
        assert_eq!(codes.get(&b'c').unwrap().len(), 2);
        assert_eq!(codes.get(&b'd').unwrap().len(), 1);
    }

    #[test]
    fn test_bare_leaf_root_gets_one_bit_code() {
        let root = HuffNode::Leaf {
            symbol: b'x',
            weight: 10,
        };
        let codes = generate_code_table(&root).unwrap();
        assert_eq!(codes.len(), 1);
        assert_eq!(codes.get(&b'x').unwrap(), "0");
    }

    #[test]
    fn test_prefix_property() {
        let data = b"no code may prefix another, for any input distribution";
        let root = build_tree(&count_slice(data)).unwrap();
        let codes = generate_code_table(&root).unwrap();
        let all: Vec<&String> = codes.values().collect();
        for (i, a) in all.iter().enumerate() {
            for (j, b) in all.iter().enumerate() {
                if i != j {
                    assert!(!b.starts_with(a.as_str()), "{} prefixes {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_duplicate_leaf_symbol_is_invalid() {
        let root = HuffNode::Internal {
            weight: 2,
            left: Box::new(HuffNode::Leaf {
                symbol: b'a',
                weight: 1,
            }),
            right: Box::new(HuffNode::Leaf {
                symbol: b'a',
                weight: 1,
            }),
        };
        let err = generate_code_table(&root).unwrap_err();
        assert!(matches!(err, CodecError::InvalidTree(_)));
    }

    #[test]
    fn test_reverse_table_inverts() {
        let data = b"invertible";
        let root = build_tree(&count_slice(data)).unwrap();
        let codes = generate_code_table(&root).unwrap();
        let reverse = reverse_table(&codes);
        assert_eq!(reverse.len(), codes.len());
        for (symbol, code) in &codes {
            assert_eq!(reverse.get(code.as_str()), Some(symbol));
        }
    }
}
