//! Decision classification boundary.
//!
//! Maps free-text trainee input onto the closed action taxonomy. The trait
//! exists so a deployment can plug in an LLM-backed classifier; the keyword
//! default keeps the platform usable offline and in tests.

use async_trait::async_trait;

use gauntlet_core::taxonomy::UserAction;

/// Classifies a trainee response into the closed action taxonomy.
#[async_trait]
pub trait ActionClassifier: Send + Sync {
    /// Maps free text (plus whatever scenario context the implementation
    /// carries) to an action.
    async fn classify(&self, input: &str) -> UserAction;
}

/// Keyword-based default classifier.
///
/// Checks for reporting language first, then verification language, then
/// hesitation markers. Ambiguous input lands on `HesitatedThenComplied`.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

const REPORT_MARKERS: &[&str] = &[
    "report",
    "phishing",
    "scam",
    "fraud",
    "this is suspicious",
    "security team",
    "it security",
    "not falling for",
];

const VERIFY_MARKERS: &[&str] = &[
    "verify",
    "double-check",
    "double check",
    "confirm with",
    "call back",
    "call the official",
    "check with",
    "official number",
    "ask my manager",
];

const HESITATION_MARKERS: &[&str] = &[
    "not sure",
    "i guess",
    "if you say so",
    "are you sure",
    "okay then",
    "ok then",
    "fine,",
    "hmm",
];

const COMPLIANCE_MARKERS: &[&str] = &[
    "here is",
    "here's",
    "sure",
    "done",
    "sent",
    "clicked",
    "password is",
    "the code is",
    "right away",
    "of course",
];

#[async_trait]
impl ActionClassifier for KeywordClassifier {
    async fn classify(&self, input: &str) -> UserAction {
        let text = input.to_lowercase();
        let contains_any = |markers: &[&str]| markers.iter().any(|m| text.contains(m));

        if contains_any(REPORT_MARKERS) {
            UserAction::RecognizedAndReported
        } else if contains_any(VERIFY_MARKERS) {
            UserAction::VerifiedFirst
        } else if contains_any(HESITATION_MARKERS) {
            UserAction::HesitatedThenComplied
        } else if contains_any(COMPLIANCE_MARKERS) {
            UserAction::CompliedImmediately
        } else {
            UserAction::HesitatedThenComplied
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reporting_language_wins() {
        let classifier = KeywordClassifier;
        assert_eq!(
            classifier
                .classify("This looks like phishing, I'm forwarding it to the security team.")
                .await,
            UserAction::RecognizedAndReported
        );
    }

    #[tokio::test]
    async fn verification_language_is_detected() {
        let classifier = KeywordClassifier;
        assert_eq!(
            classifier
                .classify("Let me call back on the official number before doing anything.")
                .await,
            UserAction::VerifiedFirst
        );
    }

    #[tokio::test]
    async fn compliance_language_is_detected() {
        let classifier = KeywordClassifier;
        assert_eq!(
            classifier.classify("Sure, here is the code: 123456").await,
            UserAction::CompliedImmediately
        );
    }

    #[tokio::test]
    async fn ambiguous_input_defaults_to_hesitation() {
        let classifier = KeywordClassifier;
        assert_eq!(
            classifier.classify("what do you want exactly").await,
            UserAction::HesitatedThenComplied
        );
    }
}
