//! APDU (Application Protocol Data Unit) command handling

/// APDU response split into payload and status word.
#[derive(Debug, Clone)]
pub struct ApduResponse {
    /// Response data (without status word)
    pub data: Vec<u8>,
    /// Status word SW1
    pub sw1: u8,
    /// Status word SW2
    pub sw2: u8,
}

impl ApduResponse {
    /// Split a raw response into data and status word. `None` if the
    /// response is too short to carry a status word.
    pub fn from_raw(raw: &[u8]) -> Option<Self> {
        if raw.len() < 2 {
            return None;
        }
        Some(Self {
            data: raw[..raw.len() - 2].to_vec(),
            sw1: raw[raw.len() - 2],
            sw2: raw[raw.len() - 1],
        })
    }

    /// Check if the response indicates success (9000)
    pub fn is_success(&self) -> bool {
        self.sw1 == 0x90 && self.sw2 == 0x00
    }

    /// Get the full status word as a 16-bit value
    pub fn status_word(&self) -> u16 {
        ((self.sw1 as u16) << 8) | (self.sw2 as u16)
    }

    /// Get status word as hex string (e.g., "9000")
    pub fn status_string(&self) -> String {
        format!("{:02X}{:02X}", self.sw1, self.sw2)
    }
}

/// APDU command builder
pub struct ApduCommand {
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    data: Vec<u8>,
    le: Option<u8>,
}

impl ApduCommand {
    /// Create a new APDU command
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Vec::new(),
            le: None,
        }
    }

    /// Set command data
    pub fn data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    /// Set expected response length
    pub fn le(mut self, le: u8) -> Self {
        self.le = Some(le);
        self
    }

    /// Build the APDU command bytes
    pub fn build(&self) -> Vec<u8> {
        let mut apdu = vec![self.cla, self.ins, self.p1, self.p2];

        if !self.data.is_empty() {
            apdu.push(self.data.len() as u8);
            apdu.extend_from_slice(&self.data);
        }

        if let Some(le) = self.le {
            apdu.push(le);
        }

        apdu
    }
}

/// The commands of the read flow
pub mod commands {
    use super::ApduCommand;

    /// SELECT PPSE ("2PAY.SYS.DDF01", the contactless directory)
    pub fn select_ppse() -> ApduCommand {
        ApduCommand::new(0x00, 0xA4, 0x04, 0x00)
            .data(b"2PAY.SYS.DDF01".to_vec())
            .le(0x00)
    }

    /// SELECT by AID. Length byte computed from the AID's byte
    /// length; no Le byte.
    pub fn select_application(aid: &[u8]) -> ApduCommand {
        ApduCommand::new(0x00, 0xA4, 0x04, 0x00).data(aid.to_vec())
    }

    /// GET PROCESSING OPTIONS command
    pub fn get_processing_options(pdol_data: Vec<u8>) -> ApduCommand {
        ApduCommand::new(0x80, 0xA8, 0x00, 0x00)
            .data(pdol_data)
            .le(0x00)
    }

    /// READ RECORD command
    pub fn read_record(record_number: u8, sfi: u8) -> ApduCommand {
        let p2 = (sfi << 3) | 0x04;
        ApduCommand::new(0x00, 0xB2, record_number, p2).le(0x00)
    }
}

/// Fixed command payloads of the read flow.
pub mod wire {
    /// Empty command template (tag 83, zero length) for the short GET
    /// PROCESSING OPTIONS variant.
    pub const SHORT_PDOL_DATA: &[u8] = &[0x83, 0x00];

    /// Filled command template for the full GET PROCESSING OPTIONS
    /// variant: tag 83 over 33 bytes of terminal data (TTQ, amounts,
    /// country and currency codes, date, unpredictable number).
    pub const FULL_PDOL_DATA: &[u8] = &[
        0x83, 0x21, 0x28, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x02, 0x50, 0x00, 0x00, 0x00, 0x00, 0x00, 0x09, 0x78, 0x20,
        0x05, 0x26, 0x00, 0xE8, 0xDA, 0x93, 0x52,
    ];

    /// The exact command bytes on the wire, as hex.
    pub const SELECT_PPSE: &str = "00A404000E325041592E5359532E444446303100";
    pub const GPO_SHORT: &str = "80A8000002830000";
    pub const READ_RECORD_1_SFI_2: &str = "00B2011400";
    pub const GPO_FULL_PDOL: &str =
        "80A800002383212800000000000000000000000000000002500000000000097820052600E8DA935200";
}

#[cfg(test)]
mod tests {
    use super::commands;
    use super::wire;
    use super::ApduResponse;

    #[test]
    fn select_ppse_is_bit_exact() {
        assert_eq!(
            hex::encode_upper(commands::select_ppse().build()),
            wire::SELECT_PPSE
        );
    }

    #[test]
    fn short_gpo_is_bit_exact() {
        let cmd = commands::get_processing_options(wire::SHORT_PDOL_DATA.to_vec());
        assert_eq!(hex::encode_upper(cmd.build()), wire::GPO_SHORT);
    }

    #[test]
    fn read_record_is_bit_exact() {
        let cmd = commands::read_record(1, 2);
        assert_eq!(hex::encode_upper(cmd.build()), wire::READ_RECORD_1_SFI_2);
    }

    #[test]
    fn full_gpo_is_bit_exact() {
        let cmd = commands::get_processing_options(wire::FULL_PDOL_DATA.to_vec());
        assert_eq!(hex::encode_upper(cmd.build()), wire::GPO_FULL_PDOL);
    }

    #[test]
    fn select_application_computes_length_and_omits_le() {
        let aid = hex::decode("A0000000031010").unwrap();
        let built = commands::select_application(&aid).build();
        assert_eq!(hex::encode_upper(built), "00A4040007A0000000031010");
    }

    #[test]
    fn response_splits_status_word() {
        let resp = ApduResponse::from_raw(&[0x6F, 0x00, 0x90, 0x00]).unwrap();
        assert!(resp.is_success());
        assert_eq!(resp.status_word(), 0x9000);
        assert_eq!(resp.status_string(), "9000");
        assert_eq!(resp.data, vec![0x6F, 0x00]);
    }

    #[test]
    fn response_too_short_is_none() {
        assert!(ApduResponse::from_raw(&[0x90]).is_none());
        assert!(ApduResponse::from_raw(&[]).is_none());
    }

    #[test]
    fn failure_status_word() {
        let resp = ApduResponse::from_raw(&[0x6A, 0x82]).unwrap();
        assert!(!resp.is_success());
        assert_eq!(resp.status_string(), "6A82");
        assert!(resp.data.is_empty());
    }
}
