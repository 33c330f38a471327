//! Display formatting for scan results

/// Mask a PAN for display: first six and last four digits visible,
/// the rest starred. Short inputs are starred entirely.
pub fn mask_pan(pan: &str) -> String {
    if pan.len() <= 10 {
        return "*".repeat(pan.len());
    }
    let stars = "*".repeat(pan.len() - 10);
    format!("{}{}{}", &pan[..6], stars, &pan[pan.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_middle_digits() {
        assert_eq!(mask_pan("4761739001010119"), "476173******0119");
    }

    #[test]
    fn short_input_is_fully_masked() {
        assert_eq!(mask_pan("12345"), "*****");
        assert_eq!(mask_pan(""), "");
    }
}
