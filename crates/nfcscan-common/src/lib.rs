//! NFC Scan Common - Shared EMV data structures and pure decoding logic
//!
//! This crate holds the pieces of the scanner that own no I/O: the
//! BER-TLV decoder, the EMV tag dictionary and the card scheme
//! classifier. Everything here is stateless and safe to call from any
//! number of threads without synchronization.

pub mod scheme;
pub mod tags;
pub mod tlv;

pub use scheme::{classify, CardScheme};
pub use tags::lookup;
pub use tlv::{decode, describe, encode, find_element, find_value, MalformedTlv, TlvElement, TlvValue};
