use crate::types::EqualizerSettings;
use serde::{Deserialize, Serialize};

/// Derived generation parameters ("rails") for one request.
///
/// Recomputed from the current equalizer settings on every request and
/// never cached; a rails value is immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRails {
    pub temperature: f64,
    pub top_k: u32,
    pub verbosity_cap: u32,
    pub praise_limit: u32,
    pub strictness: u32,
    pub grounding: u32,
}

/// Maps the four knobs to concrete rails.
///
/// The constants below define the tuning surface; changing any of them
/// changes user-visible behavior, so they are kept in one place.
pub fn map_equalizer(eq: &EqualizerSettings) -> GenerationRails {
    let eq = eq.clamped();
    let creativity = f64::from(eq.creativity);
    let factuality = f64::from(eq.factuality);
    let sociability = f64::from(eq.sociability);
    let obedience = f64::from(eq.obedience);

    GenerationRails {
        // 0.1..1.0
        temperature: 0.1 + (creativity / 100.0) * 0.9,
        // 10..70
        top_k: (10.0 + creativity * 0.6).round() as u32,
        // 1..6 sentences
        verbosity_cap: (1.0 + (sociability / 100.0) * 5.0).round() as u32,
        praise_limit: if eq.sociability < 40 {
            0
        } else if eq.sociability < 70 {
            1
        } else {
            2
        },
        // 50..100
        strictness: (50.0 + obedience * 0.5).round() as u32,
        // 0..10
        grounding: (factuality / 10.0).round() as u32,
    }
}

pub fn parental_header(parental: bool) -> &'static str {
    if parental {
        "Parental Mode: ON (G-rated, school-safe). Avoid mature topics; use kid-safe wording."
    } else {
        "Parental Mode: OFF (standard academic tone)."
    }
}

const RULES_LINE: &str = "Rules: Avoid exaggerated praise. Be precise; cite/hedge when unsure. Ask ONE short clarifying question if constraints conflict.";

/// Builds the system instruction sent to either backend.
///
/// Line order is fixed: parental header, rails summary, behavioral rules.
/// The rails summary is the only place `praise_limit`, `strictness` and
/// `grounding` surface; downstream models see them as descriptive values.
pub fn build_system_instruction(rails: &GenerationRails, parental: bool) -> String {
    [
        parental_header(parental).to_string(),
        format!(
            "Rails: temp={:.2} topK={} verbosityCap={} praiseLimit={} strictness={} grounding={}",
            rails.temperature,
            rails.top_k,
            rails.verbosity_cap,
            rails.praise_limit,
            rails.strictness,
            rails.grounding
        ),
        RULES_LINE.to_string(),
    ]
    .join("\n")
}
