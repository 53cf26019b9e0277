use gtmscout_core::domain::confirmation::ConfirmationRequest;
use gtmscout_core::domain::requirements::FieldName;

/// Pending soft confirmations and the fields the user has accepted.
///
/// At most one confirmation is pending per field; a newer one replaces the older entry and
/// moves to the back of the queue. Pending entries survive across turns until the field is
/// confirmed or corrected.
#[derive(Clone, Debug, Default)]
pub struct ConfirmationTracker {
    pending: Vec<ConfirmationRequest>,
    confirmed: Vec<FieldName>,
}

impl ConfirmationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, requests: impl IntoIterator<Item = ConfirmationRequest>) {
        for request in requests {
            self.pending.retain(|pending| pending.field != request.field);
            self.pending.push(request);
        }
    }

    /// Marks `field` as confirmed and drops every pending confirmation for it.
    ///
    /// Returns `true` when the field had not been confirmed before.
    pub fn confirm(&mut self, field: FieldName) -> bool {
        self.pending.retain(|pending| pending.field != field);
        if self.confirmed.contains(&field) {
            return false;
        }
        self.confirmed.push(field);
        true
    }

    pub fn pending(&self) -> &[ConfirmationRequest] {
        &self.pending
    }

    pub fn confirmed(&self) -> &[FieldName] {
        &self.confirmed
    }

    pub fn is_confirmed(&self, field: FieldName) -> bool {
        self.confirmed.contains(&field)
    }
}

#[cfg(test)]
mod tests {
    use gtmscout_core::domain::confirmation::ConfirmationRequest;
    use gtmscout_core::domain::requirements::FieldName;

    use super::ConfirmationTracker;

    #[test]
    fn enqueue_keeps_latest_per_field() {
        let mut tracker = ConfirmationTracker::new();
        tracker.enqueue([
            ConfirmationRequest::soft(FieldName::Industry, "saas"),
            ConfirmationRequest::soft(FieldName::Budget, "20000"),
        ]);
        tracker.enqueue([ConfirmationRequest::soft(FieldName::Industry, "fintech")]);

        let pending = tracker
            .pending()
            .iter()
            .map(|request| (request.field, request.value.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(pending, vec![(FieldName::Budget, "20000"), (FieldName::Industry, "fintech")]);
    }

    #[test]
    fn confirm_clears_pending_and_records_field_once() {
        let mut tracker = ConfirmationTracker::new();
        tracker.enqueue([
            ConfirmationRequest::soft(FieldName::Category, "b2b_saas"),
            ConfirmationRequest::soft(FieldName::Budget, "50000"),
        ]);

        assert!(tracker.confirm(FieldName::Category));
        assert!(!tracker.confirm(FieldName::Category));

        assert_eq!(tracker.confirmed(), &[FieldName::Category]);
        assert_eq!(tracker.pending().len(), 1);
        assert_eq!(tracker.pending()[0].field, FieldName::Budget);
        assert!(tracker.is_confirmed(FieldName::Category));
    }

    #[test]
    fn confirming_a_field_without_pending_entry_still_records_it() {
        let mut tracker = ConfirmationTracker::new();
        assert!(tracker.confirm(FieldName::CompanyName));
        assert!(tracker.pending().is_empty());
        assert_eq!(tracker.confirmed(), &[FieldName::CompanyName]);
    }
}
