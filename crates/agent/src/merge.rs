use gtmscout_core::domain::confirmation::ConfirmationRequest;
use gtmscout_core::domain::requirements::Requirements;

use crate::conversation::{ExtractedFields, FieldUpdate};

/// Applies every update to `requirements` and returns the soft confirmations they raise.
///
/// List fields are unioned with what is already captured, keeping first-insertion order.
/// Scalar fields are overwritten.
pub fn apply_updates(
    requirements: &mut Requirements,
    fields: &ExtractedFields,
) -> Vec<ConfirmationRequest> {
    let mut confirmations = Vec::new();

    for update in fields.updates() {
        apply_update(requirements, update);

        let field = update.field();
        if field.requires_confirmation() {
            confirmations.push(ConfirmationRequest::soft(field, update.display_value()));
        }
    }

    confirmations
}

fn apply_update(requirements: &mut Requirements, update: &FieldUpdate) {
    match update {
        FieldUpdate::Industry(industry) => requirements.industry = Some(industry.clone()),
        FieldUpdate::Category(category) => requirements.category = Some(*category),
        FieldUpdate::Maturity(maturity) => requirements.maturity = Some(*maturity),
        FieldUpdate::Budget(amount) => requirements.budget = Some(*amount),
        FieldUpdate::StrategyType(strategy) => requirements.strategy_type = Some(*strategy),
        FieldUpdate::TechStack(values) => union_into(&mut requirements.tech_stack, values),
        FieldUpdate::NeededSpecializations(values) => {
            union_into(&mut requirements.needed_specializations, values)
        }
        FieldUpdate::TargetRegions(values) => union_into(&mut requirements.target_regions, values),
    }
}

fn union_into(existing: &mut Vec<String>, incoming: &[String]) {
    for value in incoming {
        if !existing.contains(value) {
            existing.push(value.clone());
        }
    }
}
