//! Card scheme classification from Application Identifier prefixes

use std::fmt;

/// Payment card scheme, determined purely from the AID prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardScheme {
    Visa,
    Mastercard,
    Jcb,
    Amex,
    UnionPay,
    Discover,
}

impl fmt::Display for CardScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardScheme::Visa => "VISA",
            CardScheme::Mastercard => "MASTERCARD",
            CardScheme::Jcb => "JCB",
            CardScheme::Amex => "AMEX",
            CardScheme::UnionPay => "UNIONPAY",
            CardScheme::Discover => "DISCOVER",
        };
        f.write_str(name)
    }
}

/// Ordered (prefix, scheme) table. The prefixes are mutually
/// non-overlapping, so order only matters for auditability.
static AID_PREFIXES: &[(&str, CardScheme)] = &[
    ("A000000003", CardScheme::Visa),
    ("A000000004", CardScheme::Mastercard),
    ("A000000065", CardScheme::Jcb),
    ("A000000025", CardScheme::Amex),
    ("A000000333", CardScheme::UnionPay),
    // Discover Global Network
    ("A000000152", CardScheme::Discover),
    // Diners Club International (under Discover)
    ("A000000324", CardScheme::Discover),
    // Older Diners AID
    ("A000000444", CardScheme::Discover),
];

/// Classify an AID hex string by its registered application provider
/// prefix. Case-insensitive; unknown or empty AIDs yield `None`.
pub fn classify(aid: &str) -> Option<CardScheme> {
    let aid = aid.to_ascii_uppercase();
    AID_PREFIXES
        .iter()
        .find(|(prefix, _)| aid.starts_with(prefix))
        .map(|&(_, scheme)| scheme)
}
