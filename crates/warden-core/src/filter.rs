//! Message content screening.

/// Link markers that get a message removed regardless of casing.
const LINK_MARKERS: [&str; 2] = ["http://", "https://"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Clean,
    Flagged,
}

/// Classify message text. Matching is case-insensitive and ignores where in
/// the text the marker appears.
pub fn classify(text: &str) -> Classification {
    let lowered = text.to_lowercase();
    if LINK_MARKERS.iter().any(|m| lowered.contains(m)) {
        return Classification::Flagged;
    }
    Classification::Clean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_http_and_https_links() {
        assert_eq!(classify("see http://spam.example"), Classification::Flagged);
        assert_eq!(
            classify("see https://spam.example now"),
            Classification::Flagged
        );
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(classify("HTTPS://SPAM.EXAMPLE"), Classification::Flagged);
        assert_eq!(classify("HtTp://x"), Classification::Flagged);
    }

    #[test]
    fn marker_can_sit_anywhere_in_the_text() {
        assert_eq!(
            classify("join us at https://evil.example today"),
            Classification::Flagged
        );
    }

    #[test]
    fn bare_domains_and_lookalikes_stay_clean() {
        assert_eq!(classify("visit example.com"), Classification::Clean);
        assert_eq!(classify("httpx://not-a-link"), Classification::Clean);
        assert_eq!(classify("talk about http later"), Classification::Clean);
    }

    #[test]
    fn empty_text_is_clean() {
        assert_eq!(classify(""), Classification::Clean);
    }
}
