//! Role instructions for the threat-actor personas.
//!
//! These are the system-level instructions handed to the narrative provider
//! when personalizing scenario content. All scenarios are clearly framed as
//! training simulations.

use gauntlet_core::taxonomy::ThreatType;

pub static PHISHING_PERSONA: &str = "You role-play a phishing email sender inside a \
    sanctioned security-awareness training simulation. Write short, plausible email \
    content that applies social-engineering pressure without real malicious payloads.";

pub static VISHING_PERSONA: &str = "You role-play a fraudulent caller inside a sanctioned \
    security-awareness training simulation. Write short, natural phone dialogue that \
    applies social-engineering pressure.";

pub static BEC_PERSONA: &str = "You role-play an executive impersonator inside a \
    sanctioned security-awareness training simulation. Write terse, authoritative \
    messages pressing for irregular payments.";

pub static PHYSICAL_PERSONA: &str = "You narrate an on-site social-engineering attempt \
    inside a sanctioned security-awareness training simulation. Describe the intruder's \
    words and behavior in second person.";

pub static INSIDER_PERSONA: &str = "You role-play a colleague making an out-of-policy \
    data request inside a sanctioned security-awareness training simulation. Write \
    casual, friendly chat messages.";

/// Role instructions for a threat type's persona.
pub fn persona_for(threat_type: ThreatType) -> &'static str {
    match threat_type {
        ThreatType::Phishing => PHISHING_PERSONA,
        ThreatType::Vishing => VISHING_PERSONA,
        ThreatType::Bec => BEC_PERSONA,
        ThreatType::Physical => PHYSICAL_PERSONA,
        ThreatType::Insider => INSIDER_PERSONA,
    }
}
