//! Template scenario library.
//!
//! Locally cached scripts used two ways: as the seed a threat actor
//! personalizes via the narrative provider, and as the fallback when the
//! actor or provider is unavailable. Training continuity beats narrative
//! richness, so every threat type always has at least one playable script.

use once_cell::sync::Lazy;
use std::sync::Arc;

use gauntlet_core::scenario::{ScenarioBeat, ScenarioScript};
use gauntlet_core::taxonomy::{ThreatType, UserAction, VulnerabilityCategory};

/// A fixed collection of scenario scripts keyed by threat type.
#[derive(Debug, Clone)]
pub struct ScenarioLibrary {
    scripts: Vec<ScenarioScript>,
}

static BUILTIN: Lazy<Arc<ScenarioLibrary>> = Lazy::new(|| {
    Arc::new(ScenarioLibrary {
        scripts: builtin_scripts(),
    })
});

impl ScenarioLibrary {
    /// The built-in script collection.
    pub fn builtin() -> Arc<ScenarioLibrary> {
        BUILTIN.clone()
    }

    /// Creates a library from explicit scripts (tests, custom content).
    pub fn new(scripts: Vec<ScenarioScript>) -> Self {
        Self { scripts }
    }

    /// All scripts for a threat type.
    pub fn scripts_for(&self, threat_type: ThreatType) -> Vec<&ScenarioScript> {
        self.scripts
            .iter()
            .filter(|s| s.threat_type == threat_type)
            .collect()
    }

    /// Pattern identifiers available for a threat type.
    pub fn pattern_ids(&self, threat_type: ThreatType) -> Vec<String> {
        self.scripts_for(threat_type)
            .iter()
            .map(|s| s.pattern_id.clone())
            .collect()
    }

    /// Looks up a script by its pattern identifier.
    pub fn script_by_pattern(&self, pattern_id: &str) -> Option<&ScenarioScript> {
        self.scripts.iter().find(|s| s.pattern_id == pattern_id)
    }

    /// The default fallback script for a threat type.
    ///
    /// Falls back to the first script of any type if the requested threat
    /// type has no content, and returns `None` only for an empty library.
    pub fn fallback_script(&self, threat_type: ThreatType) -> Option<ScenarioScript> {
        self.scripts_for(threat_type)
            .first()
            .copied()
            .or_else(|| self.scripts.first())
            .cloned()
    }
}

fn builtin_scripts() -> Vec<ScenarioScript> {
    vec![
        ScenarioScript {
            pattern_id: "phishing-overdue-invoice".to_string(),
            threat_type: ThreatType::Phishing,
            opening: "Subject: URGENT - Invoice #4482 overdue. Your account will be \
                      suspended within 24 hours unless payment is confirmed. Click the \
                      secure portal link below to verify your billing details."
                .to_string(),
            beats: vec![
                ScenarioBeat::probing(
                    "This is your final notice. The portal link expires in one hour - \
                     please confirm your credentials now to avoid service interruption.",
                    VulnerabilityCategory::Urgency,
                    UserAction::RecognizedAndReported,
                ),
                ScenarioBeat::probing(
                    "I understand your hesitation, but I'm writing on behalf of the \
                     finance director. She asked me to make sure this is settled today.",
                    VulnerabilityCategory::Authority,
                    UserAction::VerifiedFirst,
                ),
            ],
        },
        ScenarioScript {
            pattern_id: "phishing-prize-claim".to_string(),
            threat_type: ThreatType::Phishing,
            opening: "Congratulations! Your email was selected in our partner giveaway. \
                      A $500 gift card is reserved under your name - just confirm your \
                      details on the claim page to receive it."
                .to_string(),
            beats: vec![
                ScenarioBeat::probing(
                    "Only a few unclaimed cards remain. Enter your corporate login on \
                     the claim page so we can verify your eligibility.",
                    VulnerabilityCategory::Greed,
                    UserAction::RecognizedAndReported,
                ),
                ScenarioBeat::probing(
                    "Curious what the other winners received? Open the attached list \
                     to see the full results.",
                    VulnerabilityCategory::Curiosity,
                    UserAction::RecognizedAndReported,
                ),
            ],
        },
        ScenarioScript {
            pattern_id: "vishing-it-helpdesk".to_string(),
            threat_type: ThreatType::Vishing,
            opening: "Hi, this is Alex from IT support. We've detected suspicious sign-in \
                      activity on your account and need to secure it right away. Do you \
                      have a minute?"
                .to_string(),
            beats: vec![
                ScenarioBeat::probing(
                    "We're seeing active intrusion attempts as we speak. I'll need the \
                     verification code that was just sent to your phone to lock the \
                     attacker out.",
                    VulnerabilityCategory::Fear,
                    UserAction::RecognizedAndReported,
                ),
                ScenarioBeat::probing(
                    "Look, I've got twenty of these tickets today. Just read me the \
                     code and we're done - unless you'd rather explain the breach to \
                     your manager.",
                    VulnerabilityCategory::Urgency,
                    UserAction::VerifiedFirst,
                ),
            ],
        },
        ScenarioScript {
            pattern_id: "vishing-bank-alert".to_string(),
            threat_type: ThreatType::Vishing,
            opening: "This is an automated alert from your bank's fraud department. A \
                      charge of $1,240 was flagged on your card. Press nothing and stay \
                      on the line to speak with an agent."
                .to_string(),
            beats: vec![ScenarioBeat::probing(
                "To cancel the charge I need to confirm your card number and the \
                 three-digit code on the back. This call is recorded for your \
                 protection.",
                VulnerabilityCategory::Fear,
                UserAction::RecognizedAndReported,
            )],
        },
        ScenarioScript {
            pattern_id: "bec-wire-transfer".to_string(),
            threat_type: ThreatType::Bec,
            opening: "From: CEO. I'm in back-to-back meetings and need a favor handled \
                      discreetly. We're closing an acquisition and I need a wire of \
                      $48,500 sent before end of day. Can you take care of it?"
                .to_string(),
            beats: vec![
                ScenarioBeat::probing(
                    "Good. Use the account details attached. Time is critical - the \
                     deal falls through if the funds don't land today. Keep this \
                     between us for now.",
                    VulnerabilityCategory::Authority,
                    UserAction::VerifiedFirst,
                ),
                ScenarioBeat::probing(
                    "Why the delay? I don't have time for process right now. I'm \
                     counting on you specifically - don't let me down.",
                    VulnerabilityCategory::Urgency,
                    UserAction::RecognizedAndReported,
                ),
            ],
        },
        ScenarioScript {
            pattern_id: "physical-tailgate-visitor".to_string(),
            threat_type: ThreatType::Physical,
            opening: "A person in a delivery uniform waits by the badge-controlled door, \
                      arms full of boxes: \"Hey, could you grab the door for me? My badge \
                      is buried somewhere under all this.\""
                .to_string(),
            beats: vec![ScenarioBeat::probing(
                "\"Come on, I'm here every week - you've probably seen me around. \
                 These are for the third floor and they're heavy.\"",
                VulnerabilityCategory::Curiosity,
                UserAction::VerifiedFirst,
            )],
        },
        ScenarioScript {
            pattern_id: "insider-data-request".to_string(),
            threat_type: ThreatType::Insider,
            opening: "A colleague from another team pings you: \"Hey! I'm putting \
                      together numbers for leadership and the export tool is down. \
                      Could you pull the full customer list for me real quick?\""
                .to_string(),
            beats: vec![ScenarioBeat::probing(
                "\"It's for the VP's deck, due in an hour. You'd really be saving me \
                 here - I'll mention you helped.\"",
                VulnerabilityCategory::Authority,
                UserAction::VerifiedFirst,
            )],
        },
    ]
}
