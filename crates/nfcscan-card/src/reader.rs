//! PC/SC-backed transceiver
//!
//! Implements [`NfcTransceiver`] over a PC/SC contactless reader.
//! Tag-event registration is a platform concern with no PC/SC
//! equivalent, so those calls are accepted and ignored.

use pcsc::{Card, Context, Protocols, Scope, ShareMode, MAX_BUFFER_SIZE};

use crate::transceiver::{NfcTech, NfcTransceiver, TagEventOptions, TransportError};

/// Transceiver over the first available PC/SC reader.
pub struct PcscTransceiver {
    context: Context,
    card: Option<Card>,
}

impl PcscTransceiver {
    /// Establish a user-scope PC/SC context.
    pub fn new() -> Result<Self, pcsc::Error> {
        let context = Context::establish(Scope::User)?;
        Ok(Self {
            context,
            card: None,
        })
    }

    fn first_reader(&self) -> Result<std::ffi::CString, pcsc::Error> {
        let mut readers_buf = [0; 2048];
        let mut readers = self.context.list_readers(&mut readers_buf)?;
        readers
            .next()
            .map(|r| r.to_owned())
            .ok_or(pcsc::Error::NoReadersAvailable)
    }
}

impl NfcTransceiver for PcscTransceiver {
    fn is_supported(&self) -> bool {
        // The context was already established in `new`.
        true
    }

    fn is_enabled(&self) -> bool {
        let mut readers_buf = [0; 2048];
        match self.context.list_readers(&mut readers_buf) {
            Ok(mut readers) => readers.next().is_some(),
            Err(_) => false,
        }
    }

    fn start(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn request_technology(&mut self, _tech: NfcTech) -> Result<(), TransportError> {
        let reader = self.first_reader()?;
        let card = self
            .context
            .connect(&reader, ShareMode::Shared, Protocols::ANY)?;
        self.card = Some(card);
        Ok(())
    }

    fn cancel_technology_request(&mut self) {
        // The card handle disconnects on drop.
        self.card = None;
    }

    fn register_tag_event(&mut self, _options: &TagEventOptions) -> Result<(), TransportError> {
        Ok(())
    }

    fn unregister_tag_event(&mut self) {}

    fn transceive(&mut self, apdu: &[u8]) -> Result<Vec<u8>, TransportError> {
        let card = self
            .card
            .as_ref()
            .ok_or_else(|| TransportError::from("no card channel acquired"))?;
        let mut rapdu_buf = [0; MAX_BUFFER_SIZE];
        let rapdu = card.transmit(apdu, &mut rapdu_buf)?;
        Ok(rapdu.to_vec())
    }
}
