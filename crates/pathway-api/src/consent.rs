//! Consent and erasure policy for user profiles.
//!
//! A profile is Active from registration until it is erased; erasure is
//! one-way. Self-service registration must accept consent, the admin path
//! may register without it.

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};

use pathway_types::api::{ConsentGrant, RegistrationDraft};

use crate::auth::{Caller, DELETE_CONFIRM_HEADER, header_text};
use crate::body::JsonBody;
use crate::error::ApiError;

/// Terms version recorded when the client accepts consent without naming one.
pub const CURRENT_CONSENT_VERSION: &str = "2026-02-07";

/// Literal value `X-Delete-Confirm` must carry for an erasure to proceed.
pub const ERASURE_CONFIRM_TOKEN: &str = "DELETE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationPath {
    /// Public registration; consent is mandatory.
    SelfService,
    /// Admin-created profile; consent is optional.
    Admin,
}

/// Validate a registration body into a draft.
pub fn registration_draft(
    body: &JsonBody,
    path: RegistrationPath,
    now: DateTime<Utc>,
) -> Result<RegistrationDraft, ApiError> {
    let name = body
        .text("name")
        .ok_or(ApiError::Validation("Name is required."))?;

    let accepted = body.flag("consentAccepted") == Some(true);
    if path == RegistrationPath::SelfService && !accepted {
        return Err(ApiError::Validation("Consent must be accepted to register."));
    }

    let consent = accepted.then(|| ConsentGrant {
        version: body
            .text("consentVersion")
            .unwrap_or_else(|| CURRENT_CONSENT_VERSION.to_string()),
        granted_at: now,
    });

    Ok(RegistrationDraft {
        name,
        email: body.email("email"),
        phone: body.text("phone"),
        area: body.text("area"),
        consent,
        safeguarding_opt_in: body.flag("safeguardingOptIn").unwrap_or(true),
    })
}

/// Export and erasure are open to the admin and to the profile's owner.
pub fn authorize_profile_access(caller: &Caller, target_id: &str) -> Result<(), ApiError> {
    if caller.admin || caller.is_self(target_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

pub fn require_erasure_confirmation(headers: &HeaderMap) -> Result<(), ApiError> {
    match header_text(headers, DELETE_CONFIRM_HEADER) {
        Some(token) if token == ERASURE_CONFIRM_TOKEN => Ok(()),
        _ => Err(ApiError::Confirmation),
    }
}
