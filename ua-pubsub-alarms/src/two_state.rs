use serde::{Deserialize, Serialize};
use ua_pubsub_types::LocalizedText;

/// A boolean variable displayed as one of two localized labels.
///
/// The visible value is always the label selected by `id`; there is no way
/// to store a mismatched pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoStateVariable {
    id: bool,
    true_state: LocalizedText,
    false_state: LocalizedText,
}

impl TwoStateVariable {
    pub fn new(true_state: impl Into<LocalizedText>, false_state: impl Into<LocalizedText>) -> Self {
        Self {
            id: false,
            true_state: true_state.into(),
            false_state: false_state.into(),
        }
    }

    #[inline]
    pub fn id(&self) -> bool {
        self.id
    }

    /// The label matching the current boolean.
    #[inline]
    pub fn value(&self) -> &LocalizedText {
        if self.id {
            &self.true_state
        } else {
            &self.false_state
        }
    }

    #[inline]
    pub fn true_state(&self) -> &LocalizedText {
        &self.true_state
    }

    #[inline]
    pub fn false_state(&self) -> &LocalizedText {
        &self.false_state
    }

    /// Set the boolean. Returns whether the value actually changed.
    pub fn set(&mut self, id: bool) -> bool {
        let changed = self.id != id;
        self.id = id;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::TwoStateVariable;

    #[test]
    fn value_follows_the_id() {
        let mut v = TwoStateVariable::new("Acknowledged", "Unacknowledged");
        assert!(!v.id());
        assert_eq!(v.value().text.as_ref(), "Unacknowledged");

        assert!(v.set(true));
        assert_eq!(v.value().text.as_ref(), "Acknowledged");

        // Setting the same value again reports no change.
        assert!(!v.set(true));
    }
}
