//! BER-TLV decoder for EMV data
//!
//! Decodes a hex-encoded TLV byte stream into a tree of tagged
//! elements, handling multi-byte tag numbers, long-form lengths and
//! recursion into constructed tags. Malformed input is rejected with a
//! [`MalformedTlv`] error carrying the byte offset of the defect;
//! the decoder never emits a truncated or partial element.

use thiserror::Error;

use crate::tags;

/// Decoding failure in a TLV byte stream.
///
/// Offsets are byte positions into the decoded input (half the hex
/// character position).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedTlv {
    #[error("input has an odd number of hex characters ({0})")]
    OddLength(usize),
    #[error("invalid hex character at byte offset {offset}")]
    InvalidHex { offset: usize },
    #[error("truncated tag at byte offset {offset}")]
    TruncatedTag { offset: usize },
    #[error("truncated or empty length field at byte offset {offset}")]
    TruncatedLength { offset: usize },
    #[error("declared length {declared} exceeds {available} remaining bytes at offset {offset}")]
    ValueOutOfBounds {
        offset: usize,
        declared: usize,
        available: usize,
    },
}

/// Value of a TLV element: raw hex for primitive tags, a decoded
/// child sequence for constructed tags (first tag octet bit 0x20).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlvValue {
    Primitive(String),
    Constructed(Vec<TlvElement>),
}

impl TlvValue {
    /// Raw hex string, if this is a primitive value.
    pub fn as_primitive(&self) -> Option<&str> {
        match self {
            TlvValue::Primitive(v) => Some(v),
            TlvValue::Constructed(_) => None,
        }
    }

    /// Child elements, if this is a constructed value.
    pub fn as_constructed(&self) -> Option<&[TlvElement]> {
        match self {
            TlvValue::Primitive(_) => None,
            TlvValue::Constructed(children) => Some(children),
        }
    }
}

/// A single decoded TLV element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvElement {
    /// Tag octets as upper-case hex (one or more bytes).
    pub tag: String,
    /// Raw length octets as read from the stream, upper-case hex.
    /// Kept distinct from the decoded numeric length for diagnostics.
    pub length: String,
    pub value: TlvValue,
    /// Human-readable name, filled in by [`describe`]; never set by
    /// [`decode`] itself.
    pub description: Option<String>,
}

/// Decode a hex-encoded TLV stream into a sequence of elements.
///
/// Empty input is valid and yields an empty sequence.
pub fn decode(hex_input: &str) -> Result<Vec<TlvElement>, MalformedTlv> {
    if hex_input.is_empty() {
        return Ok(Vec::new());
    }
    if hex_input.len() % 2 != 0 {
        return Err(MalformedTlv::OddLength(hex_input.len()));
    }
    let bytes = hex::decode(hex_input).map_err(|err| match err {
        hex::FromHexError::InvalidHexCharacter { index, .. } => {
            MalformedTlv::InvalidHex { offset: index / 2 }
        }
        _ => MalformedTlv::InvalidHex { offset: 0 },
    })?;
    decode_at(&bytes, 0)
}

/// Decode a byte slice; `base` is the slice's offset in the overall
/// input, used only for error reporting.
fn decode_at(data: &[u8], base: usize) -> Result<Vec<TlvElement>, MalformedTlv> {
    let mut elements = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let tag_start = pos;
        let first = data[pos];
        let constructed = first & 0x20 != 0;
        pos += 1;

        // Low five bits all set: multi-byte tag number, subsequent
        // octets continue while their high bit is set.
        if first & 0x1F == 0x1F {
            loop {
                let octet = *data.get(pos).ok_or(MalformedTlv::TruncatedTag {
                    offset: base + tag_start,
                })?;
                pos += 1;
                if octet & 0x80 == 0 {
                    break;
                }
            }
        }
        let tag = hex::encode_upper(&data[tag_start..pos]);

        let len_start = pos;
        let len_first = *data.get(pos).ok_or(MalformedTlv::TruncatedLength {
            offset: base + len_start,
        })?;
        pos += 1;

        let declared = if len_first & 0x80 == 0 {
            len_first as usize
        } else {
            // Long form: low 7 bits give the count of subsequent
            // big-endian length octets. A count of zero is the BER
            // indefinite form, which EMV does not use.
            let count = (len_first & 0x7F) as usize;
            if count == 0 || pos + count > data.len() {
                return Err(MalformedTlv::TruncatedLength {
                    offset: base + len_start,
                });
            }
            // A declared length wider than usize cannot fit any real
            // input; saturate so the bounds check below rejects it
            // instead of wrapping to a small value.
            let mut len = 0usize;
            for &octet in &data[pos..pos + count] {
                len = len.saturating_mul(256).saturating_add(octet as usize);
            }
            pos += count;
            len
        };
        let length = hex::encode_upper(&data[len_start..pos]);

        if declared > data.len() - pos {
            return Err(MalformedTlv::ValueOutOfBounds {
                offset: base + len_start,
                declared,
                available: data.len() - pos,
            });
        }

        let value_bytes = &data[pos..pos + declared];
        let value = if constructed {
            TlvValue::Constructed(decode_at(value_bytes, base + pos)?)
        } else {
            TlvValue::Primitive(hex::encode_upper(value_bytes))
        };
        pos += declared;

        elements.push(TlvElement {
            tag,
            length,
            value,
            description: None,
        });
    }

    Ok(elements)
}

/// Re-serialize a decoded element sequence to hex.
///
/// Round-trips: `encode(&decode(x)?) == x` for any well-formed `x`
/// (the raw length octets are preserved verbatim in `length`).
pub fn encode(elements: &[TlvElement]) -> String {
    let mut out = String::new();
    for element in elements {
        out.push_str(&element.tag);
        out.push_str(&element.length);
        match &element.value {
            TlvValue::Primitive(v) => out.push_str(v),
            TlvValue::Constructed(children) => out.push_str(&encode(children)),
        }
    }
    out
}

/// Find the first element with the given tag (case-insensitive) in a
/// decoded sequence.
pub fn find_element<'a>(tag: &str, elements: &'a [TlvElement]) -> Option<&'a TlvElement> {
    elements.iter().find(|el| el.tag.eq_ignore_ascii_case(tag))
}

/// Find the value of the first element with the given tag.
pub fn find_value<'a>(tag: &str, elements: &'a [TlvElement]) -> Option<&'a TlvValue> {
    find_element(tag, elements).map(|el| &el.value)
}

/// Decode and annotate: each top-level element and its direct
/// children get a `description` from the tag dictionary for the given
/// kernel, where one is known.
pub fn describe(hex_input: &str, kernel: &str) -> Result<Vec<TlvElement>, MalformedTlv> {
    let mut elements = decode(hex_input)?;
    for element in &mut elements {
        element.description = tags::lookup(&element.tag, kernel).map(str::to_owned);
        if let TlvValue::Constructed(children) = &mut element.value {
            for child in children {
                child.description = tags::lookup(&child.tag, kernel).map(str::to_owned);
            }
        }
    }
    Ok(elements)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_single_primitive() {
        // Tag 5A (PAN), length 08, value 4761739001010119
        let result = decode("5A084761739001010119").unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].tag, "5A");
        assert_eq!(result[0].length, "08");
        assert_eq!(
            result[0].value,
            TlvValue::Primitive("4761739001010119".to_string())
        );
        assert_eq!(result[0].description, None);
    }

    #[test]
    fn decodes_multiple_elements() {
        // Tag 5A (PAN) followed by tag 5F24 (expiry) and a zero-length 00
        let result = decode("5A0847617390010101195F24032712310000").unwrap();
        assert!(result.len() >= 2);
        assert_eq!(result[0].tag, "5A");
        assert_eq!(result[1].tag, "5F24");
        assert_eq!(result[1].value.as_primitive(), Some("271231"));
    }

    #[test]
    fn decodes_constructed_element() {
        // Tag 6F (FCI template) containing tag 84 (DF name)
        let result = decode("6F10840E325041592E5359532E4444463031").unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].tag, "6F");
        let children = result[0].value.as_constructed().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].tag, "84");
        assert_eq!(
            children[0].value.as_primitive(),
            Some("325041592E5359532E4444463031")
        );
    }

    #[test]
    fn constructed_children_cover_declared_length() {
        // 70, length 08: children 5A (4 bytes) and 90 (empty)
        let result = decode("70085A04112233449000").unwrap();
        let children = result[0].value.as_constructed().unwrap();
        assert_eq!(children.len(), 2);
        let encoded: usize = children
            .iter()
            .map(|c| c.tag.len() + c.length.len() + c.value.as_primitive().unwrap().len())
            .sum();
        // 0x08 bytes = 16 hex characters of child payload
        assert_eq!(encoded, 16);
    }

    #[test]
    fn decodes_multi_byte_tag() {
        // 9F46 is a two-byte tag (first octet low five bits all set)
        let result = decode("9F4602ABCD").unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].tag, "9F46");
        assert_eq!(result[0].value.as_primitive(), Some("ABCD"));
    }

    #[test]
    fn decodes_three_byte_tag() {
        // 9FDF01: second octet has its high bit set, third terminates
        let result = decode("9FDF010155").unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].tag, "9FDF01");
        assert_eq!(result[0].value.as_primitive(), Some("55"));
    }

    #[test]
    fn decodes_long_form_length() {
        // 81 90: one subsequent octet, length 0x90 = 144 bytes
        let value = "AB".repeat(144);
        let input = format!("5A8190{value}");
        let result = decode(&input).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].length, "8190");
        assert_eq!(result[0].value.as_primitive(), Some(value.as_str()));
    }

    #[test]
    fn decodes_two_octet_long_form_length() {
        let value = "CD".repeat(0x0123);
        let input = format!("5A820123{value}");
        let result = decode(&input).unwrap();
        assert_eq!(result[0].length, "820123");
        assert_eq!(result[0].value.as_primitive(), Some(value.as_str()));
    }

    #[test]
    fn normalizes_tags_to_upper_case() {
        let result = decode("5f2403271231").unwrap();
        assert_eq!(result[0].tag, "5F24");
    }

    #[test]
    fn empty_input_is_empty_sequence() {
        assert_eq!(decode("").unwrap(), Vec::new());
    }

    #[test]
    fn rejects_odd_length_input() {
        assert_eq!(decode("5A084"), Err(MalformedTlv::OddLength(5)));
    }

    #[test]
    fn rejects_non_hex_input() {
        assert!(matches!(
            decode("5A08ZZ"),
            Err(MalformedTlv::InvalidHex { .. })
        ));
    }

    #[test]
    fn rejects_value_exceeding_remaining_bytes() {
        assert_eq!(
            decode("5A0847"),
            Err(MalformedTlv::ValueOutOfBounds {
                offset: 1,
                declared: 8,
                available: 1,
            })
        );
    }

    #[test]
    fn rejects_missing_length() {
        assert_eq!(decode("5A"), Err(MalformedTlv::TruncatedLength { offset: 1 }));
    }

    #[test]
    fn rejects_truncated_long_form_length() {
        // 82 announces two subsequent octets, only one present
        assert_eq!(
            decode("5A8201"),
            Err(MalformedTlv::TruncatedLength { offset: 1 })
        );
    }

    #[test]
    fn rejects_long_form_length_wider_than_usize() {
        // Nine length octets declare 2^64 + 1 bytes; accumulation must
        // not wrap to 1 and emit a garbage element.
        assert!(matches!(
            decode("5A89010000000000000001AA"),
            Err(MalformedTlv::ValueOutOfBounds { declared, .. }) if declared > 1
        ));
    }

    #[test]
    fn accepts_long_form_length_with_leading_zero_octets() {
        // Nine octets, but the value itself fits: length 2
        let result = decode("5A89000000000000000002AABB").unwrap();
        assert_eq!(result[0].length, "89000000000000000002");
        assert_eq!(result[0].value.as_primitive(), Some("AABB"));
    }

    #[test]
    fn rejects_truncated_multi_byte_tag() {
        // 9F starts a multi-byte tag and the stream ends
        assert_eq!(decode("9F"), Err(MalformedTlv::TruncatedTag { offset: 0 }));
    }

    #[test]
    fn rejects_malformed_nested_value() {
        // Constructed 70 whose inner element declares too much
        assert!(matches!(
            decode("70035A0447"),
            Err(MalformedTlv::ValueOutOfBounds { .. })
        ));
    }

    #[test]
    fn round_trips_flat_and_nested_streams() {
        let long_form = format!("5A8190{}", "AB".repeat(144));
        for input in [
            "5A084761739001010119",
            "6F10840E325041592E5359532E4444463031",
            "5A0847617390010101195F2403271231",
            "70065A0411223344",
            long_form.as_str(),
        ] {
            let decoded = decode(input).unwrap();
            assert_eq!(encode(&decoded), input, "round trip of {input}");
        }
    }

    #[test]
    fn finds_elements_and_values() {
        let parsed = decode("5A0847617390010101195F2403271231").unwrap();
        let element = find_element("5a", &parsed).unwrap();
        assert_eq!(element.tag, "5A");
        assert_eq!(element.length, "08");
        assert_eq!(
            find_value("5F24", &parsed).and_then(TlvValue::as_primitive),
            Some("271231")
        );
        assert!(find_element("9F46", &parsed).is_none());
    }

    #[test]
    fn describe_annotates_top_level_and_children() {
        let described = describe("6F10840E325041592E5359532E4444463031", "Generic").unwrap();
        assert_eq!(
            described[0].description.as_deref(),
            Some("File Control Information (FCI) Template")
        );
        let children = described[0].value.as_constructed().unwrap();
        assert_eq!(
            children[0].description.as_deref(),
            Some("Dedicated File (DF) Name")
        );
    }

    #[test]
    fn describe_leaves_unknown_tags_unannotated() {
        let described = describe("D10100", "Generic").unwrap();
        assert_eq!(described[0].description, None);
    }
}
