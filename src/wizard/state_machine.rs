use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Where a staff member is in the two-step issuance flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WizardState {
    #[default]
    AwaitingStep1,
    AwaitingStep2,
    Registering,
    Confirmed,
    Failed,
}

/// Events that move the wizard between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardEvent {
    RecipientSaved,
    RecipientCleared,
    Submitted,
    Registered,
    Rejected,
}

impl WizardState {
    /// Next state, or `None` when the event is not allowed here
    pub fn transition(self, event: WizardEvent) -> Option<WizardState> {
        use WizardEvent::*;
        use WizardState::*;

        match (self, event) {
            (_, RecipientCleared) => Some(AwaitingStep1),
            (Registering, _) => match event {
                Registered => Some(Confirmed),
                Rejected => Some(Failed),
                _ => None,
            },
            (_, RecipientSaved) => Some(AwaitingStep2),
            (AwaitingStep2 | Failed, Submitted) => Some(Registering),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let state = WizardState::default();
        let state = state.transition(WizardEvent::RecipientSaved).unwrap();
        assert_eq!(state, WizardState::AwaitingStep2);
        let state = state.transition(WizardEvent::Submitted).unwrap();
        assert_eq!(state, WizardState::Registering);
        assert_eq!(
            state.transition(WizardEvent::Registered),
            Some(WizardState::Confirmed)
        );
    }

    #[test]
    fn test_failed_batch_can_be_resubmitted() {
        let state = WizardState::Registering
            .transition(WizardEvent::Rejected)
            .unwrap();
        assert_eq!(state, WizardState::Failed);
        assert_eq!(
            state.transition(WizardEvent::Submitted),
            Some(WizardState::Registering)
        );
    }

    #[test]
    fn test_cannot_submit_without_recipient() {
        assert_eq!(WizardState::AwaitingStep1.transition(WizardEvent::Submitted), None);
        assert_eq!(WizardState::Confirmed.transition(WizardEvent::Submitted), None);
        assert_eq!(WizardState::Registering.transition(WizardEvent::Submitted), None);
    }

    #[test]
    fn test_registering_ignores_step1_edits() {
        assert_eq!(WizardState::Registering.transition(WizardEvent::RecipientSaved), None);
        assert_eq!(
            WizardState::Confirmed.transition(WizardEvent::RecipientSaved),
            Some(WizardState::AwaitingStep2)
        );
    }
}
