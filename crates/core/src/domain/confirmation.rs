use serde::{Deserialize, Serialize};

use crate::domain::requirements::FieldName;

/// Confidence attached to keyword-derived values awaiting a soft confirmation.
pub const SOFT_CONFIRMATION_CONFIDENCE: f32 = 0.9;

/// A non-blocking prompt showing the user what was inferred for a field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationRequest {
    pub field: FieldName,
    pub value: String,
    pub display_label: String,
    pub confidence: f32,
}

impl ConfirmationRequest {
    pub fn new(field: FieldName, value: impl Into<String>, confidence: f32) -> Self {
        Self {
            field,
            value: value.into(),
            display_label: field.display_label(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn soft(field: FieldName, value: impl Into<String>) -> Self {
        Self::new(field, value, SOFT_CONFIRMATION_CONFIDENCE)
    }
}
