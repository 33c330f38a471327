//! Card-read orchestration
//!
//! Drives the fixed APDU sequence against a transceiver: select the
//! contactless directory, pick and classify an application, select it,
//! run both record-extraction strategies and reconcile their results.
//! The whole sequence races a scan timeout; cancellation is
//! cooperative, observed at inter-command checkpoints.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use nfcscan_common::{classify, decode, find_element, CardScheme, TlvElement, TlvValue};

use crate::apdu::{commands, wire, ApduResponse};
use crate::error::NfcError;
use crate::transceiver::{NfcTech, NfcTransceiver, TagEventOptions};

/// Library default for the overall scan timeout.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Per-scan configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Overall scan timeout; `None` means [`DEFAULT_SCAN_TIMEOUT`].
    pub timeout: Option<Duration>,
}

/// Outcome of a successful scan. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardReadResult {
    /// Primary account number, plain digits.
    pub pan: String,
    /// Expiry date, `MM/YY`.
    pub expiry: String,
    pub scheme: CardScheme,
}

/// The two response-template layouts cards answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemplateStructure {
    /// Outer tag 70: PAN and expiry as sibling primitives.
    Flat,
    /// Outer tag 77: track-2 equivalent data in a single inner tag.
    Nested,
}

/// PAN and expiry recovered by one extraction strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TrackData {
    pan: String,
    expiry: String,
}

impl TrackData {
    fn is_complete(&self) -> bool {
        !self.pan.is_empty() && !self.expiry.is_empty()
    }
}

/// Orchestrates card scans over a transceiver.
///
/// One scan at a time: the transceiver channel is half-duplex and
/// stateful, so callers serialize `scan` invocations. The scanner
/// itself keeps no state across scans beyond the cancel flag.
pub struct NfcScanner<T: NfcTransceiver + Send + 'static> {
    transceiver: Arc<Mutex<T>>,
    cancel: Arc<AtomicBool>,
}

impl<T: NfcTransceiver + Send + 'static> NfcScanner<T> {
    pub fn new(transceiver: T) -> Self {
        Self {
            transceiver: Arc::new(Mutex::new(transceiver)),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.lock().is_supported()
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().is_enabled()
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        self.transceiver
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run one scan to completion, failure or timeout.
    ///
    /// The command sequence runs on a worker thread while this call
    /// waits for its result or the deadline. On timeout the worker is
    /// flagged to stop; it ceases issuing commands at its next
    /// checkpoint and releases the channel. Resource release
    /// (`cancel_technology_request`, `unregister_tag_event`) runs on
    /// every exit path of the sequence.
    pub fn scan(&self, options: &ScanOptions) -> Result<CardReadResult, NfcError> {
        let timeout = options.timeout.unwrap_or(DEFAULT_SCAN_TIMEOUT);

        {
            let mut transceiver = self.lock();
            if !transceiver.is_supported() {
                return Err(NfcError::NotSupported);
            }
            if !transceiver.is_enabled() {
                return Err(NfcError::NotEnabled);
            }
            transceiver.start().map_err(NfcError::Transport)?;
            transceiver
                .register_tag_event(&TagEventOptions::default())
                .map_err(NfcError::Transport)?;
        }

        self.cancel.store(false, Ordering::SeqCst);
        let deadline = Instant::now() + timeout;
        let transceiver = Arc::clone(&self.transceiver);
        let cancel = Arc::clone(&self.cancel);
        let (result_tx, result_rx) = mpsc::channel();

        thread::spawn(move || {
            let mut guard = transceiver
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let mut session = ScanSession::new(&mut *guard, &cancel, deadline, timeout);
            let result = session.read_card();
            session.release();
            // The receiver is gone if the scan already timed out.
            let _ = result_tx.send(result);
        });

        match result_rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                self.cancel.store(true, Ordering::SeqCst);
                warn!(timeout_ms = timeout.as_millis() as u64, "scan timed out");
                Err(NfcError::ScanTimeout(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(NfcError::CardReadFailed),
        }
    }

    /// Best-effort, fire-and-forget cancellation of an in-flight scan.
    /// The sequence stops at its next inter-command checkpoint.
    pub fn stop(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }
}

/// One scan attempt: the selected AID, the scheme derived from it and
/// the raw responses collected along the way. Lives for a single
/// `scan` invocation.
struct ScanSession<'a, T: NfcTransceiver> {
    transceiver: &'a mut T,
    cancel: &'a AtomicBool,
    deadline: Instant,
    timeout: Duration,
    aid: Option<String>,
    scheme: Option<CardScheme>,
    responses: Vec<Vec<u8>>,
}

impl<'a, T: NfcTransceiver> ScanSession<'a, T> {
    fn new(
        transceiver: &'a mut T,
        cancel: &'a AtomicBool,
        deadline: Instant,
        timeout: Duration,
    ) -> Self {
        Self {
            transceiver,
            cancel,
            deadline,
            timeout,
            aid: None,
            scheme: None,
            responses: Vec::new(),
        }
    }

    /// Inter-command abort point. An externally stopped scan or a
    /// passed deadline stops the sequence here; the command currently
    /// in flight is never interrupted.
    fn checkpoint(&self) -> Result<(), NfcError> {
        if self.cancel.load(Ordering::SeqCst) {
            debug!("scan cancelled, stopping command sequence");
            return Err(NfcError::CardReadFailed);
        }
        if Instant::now() >= self.deadline {
            debug!("scan deadline passed, stopping command sequence");
            return Err(NfcError::ScanTimeout(self.timeout));
        }
        Ok(())
    }

    fn transceive(&mut self, apdu: &[u8]) -> Result<Vec<u8>, NfcError> {
        self.checkpoint()?;
        debug!(command = %hex::encode_upper(apdu), "transceive");
        let response = self
            .transceiver
            .transceive(apdu)
            .map_err(NfcError::Transport)?;
        if let Some(parsed) = ApduResponse::from_raw(&response) {
            debug!(status = %parsed.status_string(), len = parsed.data.len(), "response");
        }
        self.responses.push(response.clone());
        Ok(response)
    }

    fn read_card(&mut self) -> Result<CardReadResult, NfcError> {
        self.checkpoint()?;
        self.transceiver
            .request_technology(NfcTech::IsoDep)
            .map_err(NfcError::Transport)?;

        let ppse = self.transceive(&commands::select_ppse().build())?;
        let candidates = extract_aid_candidates(&hex::encode_upper(&ppse));
        let aid = candidates.into_iter().next().ok_or(NfcError::AidNotFound)?;
        debug!(aid = %aid, "application identifier selected");

        let scheme = classify(&aid).ok_or(NfcError::UnsupportedCardScheme)?;
        info!(%scheme, "card scheme classified");
        self.aid = Some(aid.clone());
        self.scheme = Some(scheme);

        // Candidates are validated hex of even length, so this cannot
        // fail in practice.
        let aid_bytes = hex::decode(&aid).map_err(|_| NfcError::AidNotFound)?;
        self.transceive(&commands::select_application(&aid_bytes).build())?;

        // Both strategies run unconditionally; only their joint
        // failure is fatal.
        let flat = self.extract_record(TemplateStructure::Flat)?;
        let nested = self.extract_record(TemplateStructure::Nested)?;

        let track = match flat {
            Some(track) if track.is_complete() => Some(track),
            _ => nested,
        };
        let track = track
            .filter(TrackData::is_complete)
            .ok_or(NfcError::CardReadFailed)?;

        Ok(CardReadResult {
            pan: track.pan,
            expiry: track.expiry,
            scheme,
        })
    }

    /// Run one extraction strategy: issue its command sequence, decode
    /// the final response and pull track data from whichever template
    /// the card actually answered with. Transport errors are fatal;
    /// a strategy that decodes poorly or finds no usable pair yields
    /// nothing.
    fn extract_record(
        &mut self,
        structure: TemplateStructure,
    ) -> Result<Option<TrackData>, NfcError> {
        let sequence: Vec<Vec<u8>> = match structure {
            TemplateStructure::Flat => vec![
                commands::get_processing_options(wire::SHORT_PDOL_DATA.to_vec()).build(),
                commands::read_record(1, 2).build(),
            ],
            TemplateStructure::Nested => vec![
                commands::get_processing_options(wire::FULL_PDOL_DATA.to_vec()).build(),
            ],
        };

        let mut last = Vec::new();
        for command in sequence {
            last = self.transceive(&command)?;
        }

        let elements = match decode(&hex::encode_upper(&last)) {
            Ok(elements) => elements,
            Err(err) => {
                debug!(?structure, error = %err, "template response failed to decode");
                return Ok(None);
            }
        };

        let track = match elements.first().map(|el| el.tag.as_str()) {
            Some("70") => parse_flat_template(&elements),
            Some("77") => parse_nested_template(&elements),
            _ => None,
        };
        if track.is_none() {
            debug!(?structure, "extraction strategy yielded nothing");
        }
        Ok(track)
    }

    /// Release the channel and the tag-event registration. Runs on
    /// every exit path: success, failure, cancellation, timeout.
    fn release(&mut self) {
        self.transceiver.cancel_technology_request();
        self.transceiver.unregister_tag_event();
        debug!(
            aid = ?self.aid,
            scheme = ?self.scheme,
            responses = self.responses.len(),
            "scan session released"
        );
    }
}

/// Scan a response hex string for `4F <len> <aid>` occurrences.
///
/// A targeted pattern search, not a full TLV decode: PPSE FCI layouts
/// vary across issuers, so any embedded occurrence of tag 4F with a
/// plausible one-byte length is taken as a candidate. Candidates keep
/// stream order; the first one wins downstream.
fn extract_aid_candidates(response_hex: &str) -> Vec<String> {
    let bytes = response_hex.as_bytes();
    let mut aids = Vec::new();
    let mut i = 0;

    while i + 4 <= bytes.len() {
        if bytes[i] != b'4' || !matches!(bytes[i + 1], b'F' | b'f') {
            i += 1;
            continue;
        }
        let Ok(len) = usize::from_str_radix(&response_hex[i + 2..i + 4], 16) else {
            i += 1;
            continue;
        };
        let start = i + 4;
        let end = start + len * 2;
        if len == 0
            || end > bytes.len()
            || !response_hex[start..end].bytes().all(|b| b.is_ascii_hexdigit())
        {
            i += 1;
            continue;
        }
        aids.push(response_hex[start..end].to_ascii_uppercase());
        i = end;
    }

    aids
}

/// Reformat the four-character `YYMM` expiry prefix as `MM/YY`.
/// Anything shorter yields an empty (unusable) expiry.
fn format_expiry(yymm: &str) -> String {
    if yymm.len() < 4 || !yymm.is_ascii() {
        return String::new();
    }
    format!("{}/{}", &yymm[2..4], &yymm[0..2])
}

fn has_content(element: &TlvElement) -> bool {
    match &element.value {
        TlvValue::Primitive(v) => !v.is_empty(),
        TlvValue::Constructed(children) => !children.is_empty(),
    }
}

/// Flat template: outer tag 70 with the PAN in inner tag 5A and the
/// expiry (YYMMDD) in inner tag 5F24.
fn parse_flat_template(elements: &[TlvElement]) -> Option<TrackData> {
    let children = elements
        .iter()
        .find(|el| el.tag == "70" && has_content(el))
        .and_then(|el| el.value.as_constructed())?;

    let pan = find_element("5A", children)
        .and_then(|el| el.value.as_primitive())
        .unwrap_or("")
        .to_string();
    let expiry = find_element("5F24", children)
        .and_then(|el| el.value.as_primitive())
        .map(|v| format_expiry(&v[..v.len().min(4)]))
        .unwrap_or_default();

    Some(TrackData { pan, expiry })
}

/// Nested template: outer tag 77 with a single inner tag 57 holding
/// track-2 equivalent data, PAN and `YYMM...` separated by `D`.
fn parse_nested_template(elements: &[TlvElement]) -> Option<TrackData> {
    let children = elements
        .iter()
        .find(|el| el.tag == "77" && has_content(el))
        .and_then(|el| el.value.as_constructed())?;

    let track2 = find_element("57", children).and_then(|el| el.value.as_primitive())?;
    let (pan, rest) = track2.split_once('D')?;

    Some(TrackData {
        pan: pan.to_string(),
        expiry: format_expiry(&rest[..rest.len().min(4)]),
    })
}
