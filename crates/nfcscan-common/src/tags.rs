//! EMV tag dictionary
//!
//! Static mapping from (tag, kernel) to a human-readable name, used to
//! annotate decoded TLV trees. Lookups are purely descriptive: the
//! decoder never consults this table to make parsing decisions, and a
//! missing entry is not an error.

/// One dictionary row.
#[derive(Debug, Clone, Copy)]
pub struct TagInfo {
    pub tag: &'static str,
    pub kernel: &'static str,
    pub name: &'static str,
}

/// Tag names per EMV Book 3, Annex A. The "Generic" kernel carries the
/// tags common to all configurations; kernel-specific rows use the EMV
/// Contactless kernel numbering ("Kernel 2" Mastercard, "Kernel 3" Visa).
pub static EMV_TAGS: &[TagInfo] = &[
    TagInfo { tag: "42", kernel: "Generic", name: "Issuer Identification Number (IIN)" },
    TagInfo { tag: "4F", kernel: "Generic", name: "Application Dedicated File (ADF) Name" },
    TagInfo { tag: "50", kernel: "Generic", name: "Application Label" },
    TagInfo { tag: "56", kernel: "Generic", name: "Track 1 Data" },
    TagInfo { tag: "57", kernel: "Generic", name: "Track 2 Equivalent Data" },
    TagInfo { tag: "5A", kernel: "Generic", name: "Application Primary Account Number (PAN)" },
    TagInfo { tag: "5F20", kernel: "Generic", name: "Cardholder Name" },
    TagInfo { tag: "5F24", kernel: "Generic", name: "Application Expiration Date" },
    TagInfo { tag: "5F25", kernel: "Generic", name: "Application Effective Date" },
    TagInfo { tag: "5F28", kernel: "Generic", name: "Issuer Country Code" },
    TagInfo { tag: "5F2A", kernel: "Generic", name: "Transaction Currency Code" },
    TagInfo { tag: "5F2D", kernel: "Generic", name: "Language Preference" },
    TagInfo { tag: "5F30", kernel: "Generic", name: "Service Code" },
    TagInfo { tag: "5F34", kernel: "Generic", name: "Application PAN Sequence Number" },
    TagInfo { tag: "61", kernel: "Generic", name: "Application Template" },
    TagInfo { tag: "6F", kernel: "Generic", name: "File Control Information (FCI) Template" },
    TagInfo { tag: "70", kernel: "Generic", name: "READ RECORD Response Message Template" },
    TagInfo { tag: "77", kernel: "Generic", name: "Response Message Template Format 2" },
    TagInfo { tag: "80", kernel: "Generic", name: "Response Message Template Format 1" },
    TagInfo { tag: "82", kernel: "Generic", name: "Application Interchange Profile" },
    TagInfo { tag: "83", kernel: "Generic", name: "Command Template" },
    TagInfo { tag: "84", kernel: "Generic", name: "Dedicated File (DF) Name" },
    TagInfo { tag: "87", kernel: "Generic", name: "Application Priority Indicator" },
    TagInfo { tag: "88", kernel: "Generic", name: "Short File Identifier (SFI)" },
    TagInfo { tag: "8A", kernel: "Generic", name: "Authorisation Response Code" },
    TagInfo { tag: "8C", kernel: "Generic", name: "Card Risk Management Data Object List 1 (CDOL1)" },
    TagInfo { tag: "8D", kernel: "Generic", name: "Card Risk Management Data Object List 2 (CDOL2)" },
    TagInfo { tag: "8E", kernel: "Generic", name: "Cardholder Verification Method (CVM) List" },
    TagInfo { tag: "8F", kernel: "Generic", name: "Certification Authority Public Key Index" },
    TagInfo { tag: "90", kernel: "Generic", name: "Issuer Public Key Certificate" },
    TagInfo { tag: "92", kernel: "Generic", name: "Issuer Public Key Remainder" },
    TagInfo { tag: "93", kernel: "Generic", name: "Signed Static Application Data" },
    TagInfo { tag: "94", kernel: "Generic", name: "Application File Locator (AFL)" },
    TagInfo { tag: "95", kernel: "Generic", name: "Terminal Verification Results" },
    TagInfo { tag: "9A", kernel: "Generic", name: "Transaction Date" },
    TagInfo { tag: "9C", kernel: "Generic", name: "Transaction Type" },
    TagInfo { tag: "A5", kernel: "Generic", name: "File Control Information (FCI) Proprietary Template" },
    TagInfo { tag: "BF0C", kernel: "Generic", name: "FCI Issuer Discretionary Data" },
    TagInfo { tag: "9F02", kernel: "Generic", name: "Amount, Authorised (Numeric)" },
    TagInfo { tag: "9F03", kernel: "Generic", name: "Amount, Other (Numeric)" },
    TagInfo { tag: "9F06", kernel: "Generic", name: "Application Identifier (AID) - terminal" },
    TagInfo { tag: "9F07", kernel: "Generic", name: "Application Usage Control" },
    TagInfo { tag: "9F08", kernel: "Generic", name: "Application Version Number" },
    TagInfo { tag: "9F0D", kernel: "Generic", name: "Issuer Action Code - Default" },
    TagInfo { tag: "9F0E", kernel: "Generic", name: "Issuer Action Code - Denial" },
    TagInfo { tag: "9F0F", kernel: "Generic", name: "Issuer Action Code - Online" },
    TagInfo { tag: "9F10", kernel: "Generic", name: "Issuer Application Data" },
    TagInfo { tag: "9F11", kernel: "Generic", name: "Issuer Code Table Index" },
    TagInfo { tag: "9F12", kernel: "Generic", name: "Application Preferred Name" },
    TagInfo { tag: "9F17", kernel: "Generic", name: "Personal Identification Number (PIN) Try Counter" },
    TagInfo { tag: "9F1A", kernel: "Generic", name: "Terminal Country Code" },
    TagInfo { tag: "9F26", kernel: "Generic", name: "Application Cryptogram" },
    TagInfo { tag: "9F27", kernel: "Generic", name: "Cryptogram Information Data" },
    TagInfo { tag: "9F32", kernel: "Generic", name: "Issuer Public Key Exponent" },
    TagInfo { tag: "9F33", kernel: "Generic", name: "Terminal Capabilities" },
    TagInfo { tag: "9F34", kernel: "Generic", name: "Cardholder Verification Method (CVM) Results" },
    TagInfo { tag: "9F35", kernel: "Generic", name: "Terminal Type" },
    TagInfo { tag: "9F36", kernel: "Generic", name: "Application Transaction Counter (ATC)" },
    TagInfo { tag: "9F37", kernel: "Generic", name: "Unpredictable Number" },
    TagInfo { tag: "9F38", kernel: "Generic", name: "Processing Options Data Object List (PDOL)" },
    TagInfo { tag: "9F42", kernel: "Generic", name: "Application Currency Code" },
    TagInfo { tag: "9F44", kernel: "Generic", name: "Application Currency Exponent" },
    TagInfo { tag: "9F46", kernel: "Generic", name: "Integrated Circuit Card (ICC) Public Key Certificate" },
    TagInfo { tag: "9F47", kernel: "Generic", name: "Integrated Circuit Card (ICC) Public Key Exponent" },
    TagInfo { tag: "9F48", kernel: "Generic", name: "Integrated Circuit Card (ICC) Public Key Remainder" },
    TagInfo { tag: "9F4A", kernel: "Generic", name: "Static Data Authentication Tag List" },
    TagInfo { tag: "9F66", kernel: "Kernel 3", name: "Terminal Transaction Qualifiers (TTQ)" },
    TagInfo { tag: "9F6B", kernel: "Kernel 2", name: "Track 2 Data" },
    TagInfo { tag: "DF8117", kernel: "Kernel 2", name: "Card Data Input Capability" },
    TagInfo { tag: "DF8129", kernel: "Kernel 2", name: "Outcome Parameter Set" },
];

/// Look up the descriptive name for a tag within a kernel.
///
/// Both keys match case-insensitively; `None` means "no description",
/// never a failure.
pub fn lookup(tag: &str, kernel: &str) -> Option<&'static str> {
    EMV_TAGS
        .iter()
        .find(|row| row.tag.eq_ignore_ascii_case(tag) && row.kernel.eq_ignore_ascii_case(kernel))
        .map(|row| row.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_known_generic_tags() {
        assert_eq!(
            lookup("42", "Generic"),
            Some("Issuer Identification Number (IIN)")
        );
        assert_eq!(
            lookup("5A", "Generic"),
            Some("Application Primary Account Number (PAN)")
        );
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("5f24", "generic"), lookup("5F24", "Generic"));
        assert_eq!(lookup("bf0c", "GENERIC"), lookup("BF0C", "Generic"));
    }

    #[test]
    fn kernel_scopes_the_match() {
        assert_eq!(lookup("9F6B", "Kernel 2"), Some("Track 2 Data"));
        assert_eq!(lookup("9F6B", "Generic"), None);
    }

    #[test]
    fn unknown_tag_has_no_description() {
        assert_eq!(lookup("ZZZZ", "Generic"), None);
        assert_eq!(lookup("", "Generic"), None);
    }
}
