//! NFC transceiver interface
//!
//! The physical transceiver is an external collaborator; the
//! orchestrator only ever talks to it through this trait. The sole I/O
//! primitive is [`NfcTransceiver::transceive`], one call per APDU.

/// Opaque failure from the underlying NFC stack.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Card-communication technology to request from the transceiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NfcTech {
    /// ISO 14443-4, the technology EMV payment cards speak.
    IsoDep,
    NfcA,
    NfcB,
}

/// Reader-mode flags, numbered as Android's `NfcAdapter` defines them.
pub mod reader_flags {
    pub const NFC_A: u32 = 0x0001;
    pub const NFC_B: u32 = 0x0002;
    pub const NFC_F: u32 = 0x0004;
    pub const NFC_V: u32 = 0x0008;
    pub const SKIP_NDEF_CHECK: u32 = 0x0080;
    pub const NO_PLATFORM_SOUNDS: u32 = 0x0100;
}

/// Options passed to [`NfcTransceiver::register_tag_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagEventOptions {
    pub reader_mode_enabled: bool,
    pub reader_mode_flags: u32,
}

impl Default for TagEventOptions {
    /// Reader mode over NFC-A and NFC-B, skipping the NDEF check and
    /// platform sounds.
    fn default() -> Self {
        Self {
            reader_mode_enabled: true,
            reader_mode_flags: reader_flags::NFC_A
                | reader_flags::NFC_B
                | reader_flags::SKIP_NDEF_CHECK
                | reader_flags::NO_PLATFORM_SOUNDS,
        }
    }
}

/// Interface to the contactless front end. The channel is half-duplex
/// and stateful: a response must be received before the next command
/// is sent.
pub trait NfcTransceiver {
    fn is_supported(&self) -> bool;

    fn is_enabled(&self) -> bool;

    /// Bring the NFC stack up. Idempotent.
    fn start(&mut self) -> Result<(), TransportError>;

    /// Acquire exclusive use of the card-communication channel.
    fn request_technology(&mut self, tech: NfcTech) -> Result<(), TransportError>;

    /// Release the channel. Safe to call when none is held.
    fn cancel_technology_request(&mut self);

    fn register_tag_event(&mut self, options: &TagEventOptions) -> Result<(), TransportError>;

    fn unregister_tag_event(&mut self);

    /// Exchange one APDU with the card and return the raw response,
    /// status word included.
    fn transceive(&mut self, apdu: &[u8]) -> Result<Vec<u8>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tag_event_options_enable_reader_mode() {
        let options = TagEventOptions::default();
        assert!(options.reader_mode_enabled);
        assert_eq!(options.reader_mode_flags, 0x0183);
    }
}
