//! Scan error kinds

use std::time::Duration;

use thiserror::Error;

use crate::transceiver::TransportError;

/// Failure modes of a card scan. A failed scan reports exactly one of
/// these; no partially-populated result ever escapes. No retries are
/// attempted at this layer.
#[derive(Debug, Error)]
pub enum NfcError {
    #[error("NFC is not supported on this device")]
    NotSupported,
    #[error("NFC is not enabled")]
    NotEnabled,
    #[error("no application identifier found in the PPSE response")]
    AidNotFound,
    #[error("card scheme is not supported")]
    UnsupportedCardScheme,
    #[error("card read failed")]
    CardReadFailed,
    #[error("scan timed out after {0:?}")]
    ScanTimeout(Duration),
    /// Opaque failure from the underlying transceiver, passed through
    /// unchanged.
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),
}
