//! NFC Scan Card - contactless payment-card reading
//!
//! This crate drives a scripted APDU sequence against an NFC
//! transceiver to recover the primary account number, expiry date and
//! card scheme from an EMV payment card. The transceiver itself is
//! abstracted behind [`NfcTransceiver`]; a PC/SC implementation is
//! provided for desktop readers.
//!
//! No cryptographic verification is performed: the scan only extracts
//! plaintext TLV fields the card already returns.

pub mod apdu;
pub mod error;
pub mod reader;
pub mod scanner;
pub mod transceiver;

pub use error::NfcError;
pub use reader::PcscTransceiver;
pub use scanner::{CardReadResult, NfcScanner, ScanOptions, DEFAULT_SCAN_TIMEOUT};
pub use transceiver::{NfcTech, NfcTransceiver, TagEventOptions, TransportError};

/// Re-export the pure decoding layer for callers that want to decode
/// or classify without running a scan.
pub use nfcscan_common::{classify, decode, CardScheme, MalformedTlv, TlvElement, TlvValue};
