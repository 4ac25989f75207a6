//! Risk-language detection for inbound messages, and the helpline list
//! surfaced alongside it.
//!
//! Detection is a plain case-insensitive substring match against a fixed
//! phrase list. It has no notion of context or negation, so "I'm not going
//! to relapse" is flagged; a false positive only costs the sender a prompt.

use axum::Json;

use pathway_types::models::Helpline;

/// Phrases indicating self-harm, suicidal ideation, relapse, homelessness
/// tonight, abuse or violence. Lower-case.
pub const RISK_PHRASES: &[&str] = &[
    // suicide and self-harm
    "suicide",
    "suicidal",
    "kill myself",
    "end my life",
    "end it all",
    "want to die",
    "self harm",
    "self-harm",
    "harm myself",
    "hurt myself",
    "cutting myself",
    "overdose",
    // relapse
    "relapse",
    "relapsing",
    "using again",
    "drinking again",
    // homelessness tonight
    "homeless tonight",
    "nowhere to sleep",
    "nowhere to stay tonight",
    "sleeping rough",
    "on the streets tonight",
    // abuse and violence
    "abuse",
    "abusive",
    "violence",
    "violent",
    "threatened me",
    "hit me",
    "beaten",
];

/// Returned with a flagged message. Advisory only; nothing is escalated.
pub const SAFEGUARDING_PROMPT: &str = "It sounds like things might be really hard right now. \
     If you or someone else is in immediate danger, call 999. You can talk to Samaritans \
     any time on 116 123, or call NHS 111 for urgent advice. Your support adviser can help too.";

pub fn detect_risk(text: &str) -> bool {
    let lowered = text.to_lowercase();
    RISK_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}

pub fn helplines() -> Vec<Helpline> {
    [
        ("Emergency services", "999", "If someone is in immediate danger."),
        ("NHS 111", "111", "Urgent medical and mental health advice."),
        ("Samaritans", "116 123", "24/7 emotional support in the UK."),
    ]
    .into_iter()
    .map(|(name, phone, note)| Helpline {
        name: name.to_string(),
        phone: phone.to_string(),
        note: note.to_string(),
    })
    .collect()
}

/// GET /api/safeguarding/helplines
pub async fn list_helplines() -> Json<Vec<Helpline>> {
    Json(helplines())
}
