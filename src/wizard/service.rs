use chrono::Local;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::CacheBackend;
use crate::certificates::{CertificateStore, IssuanceOutcome, IssuanceService};
use crate::config::AppConfig;
use crate::directory::{Directory, User};
use crate::wizard::{
    add_line, delete_line, duplicate_line, expand_group, limit_message, line_defaults, lookup_member,
    normalize_line_item, recipient_choices, submission_fingerprint, validate_lines, validate_recipient,
    ConfirmationView, EditResult, LineContext, LineItem, LookupResponse, SessionStore, Step1LookupRequest,
    Step1Saved, Step1View, Step2Action, Step2Outcome, Step2Request, Step2View, SubmissionGuard, TypeChoice,
    ValidRecipient, WizardError, WizardEvent, WizardSession, WizardState, RecipientInput,
};

/// The two-step issuance flow of one staff member at a time
#[derive(Clone)]
pub struct WizardService {
    sessions: SessionStore,
    guard: SubmissionGuard,
    directory: Arc<dyn Directory>,
    store: Arc<dyn CertificateStore>,
    issuance: IssuanceService,
    batch_limit: usize,
    default_membership_number: String,
}

impl WizardService {
    pub fn new(
        cache: Arc<dyn CacheBackend>,
        directory: Arc<dyn Directory>,
        store: Arc<dyn CertificateStore>,
        issuance: IssuanceService,
        config: &AppConfig,
    ) -> Self {
        Self {
            sessions: SessionStore::new(cache.clone()),
            guard: SubmissionGuard::new(cache),
            directory,
            store,
            issuance,
            batch_limit: config.batch_limit,
            default_membership_number: config.default_membership_number.clone(),
        }
    }

    /// Saved step 1 with the departments and signatures to choose from
    pub async fn step1_view(&self, user: &User, department: Option<Uuid>) -> Result<Step1View, WizardError> {
        let session = self.sessions.load(user.id).await?;
        let input = session.step1.unwrap_or_default();
        let choices =
            recipient_choices(self.directory.as_ref(), user.id, department.or(input.department)).await?;

        Ok(Step1View {
            state: session.state,
            input,
            choices,
        })
    }

    /// Validate and keep the recipient; invalid data is not saved
    pub async fn save_step1(&self, user: &User, input: RecipientInput) -> Result<Step1Saved, WizardError> {
        let valid = validate_recipient(
            self.directory.as_ref(),
            user,
            &input,
            &self.default_membership_number,
        )
        .await?;

        let mut session = self.sessions.load(user.id).await?;
        let mut input = input;
        // The default account is stored so step 2 sees the number actually used
        input.account_number = valid.batch.account_number.clone().unwrap_or_default();
        session.step1 = Some(input);
        session.state = session
            .state
            .transition(WizardEvent::RecipientSaved)
            .unwrap_or(session.state);
        self.sessions.save(user.id, &session).await?;

        tracing::debug!("Staff {} saved wizard step 1", user.id);
        Ok(Step1Saved {
            state: session.state,
            warnings: valid.warnings,
        })
    }

    pub async fn reset_step1(&self, user: &User) -> Result<WizardState, WizardError> {
        let mut session = self.sessions.load(user.id).await?;
        session.step1 = None;
        session.state = session
            .state
            .transition(WizardEvent::RecipientCleared)
            .unwrap_or(session.state);
        self.sessions.save(user.id, &session).await?;
        Ok(session.state)
    }

    /// Search members to fill in step 1; nothing is saved
    pub async fn lookup(&self, user: &User, request: Step1LookupRequest) -> Result<LookupResponse, WizardError> {
        let mut input = match request.input {
            Some(input) => input,
            None => self.sessions.load_step1(user.id).await?.unwrap_or_default(),
        };
        let members = lookup_member(self.directory.as_ref(), &request.lookup, &mut input).await?;
        Ok(LookupResponse { members, input })
    }

    /// Step 2 as saved; a new batch starts with one blank line
    pub async fn step2_view(&self, user: &User) -> Result<Step2View, WizardError> {
        let mut session = self.sessions.load(user.id).await?;
        let recipient = self.recipient(user, &session).await?;

        if session.step2.is_empty() {
            session.step2.push(LineItem::blank());
            self.sessions.save(user.id, &session).await?;
        }

        self.view(&session, recipient.department.id, EditResult::default())
            .await
    }

    /// Apply a step-2 action, or submit the batch
    pub async fn step2_post(&self, user: &User, request: Step2Request) -> Result<Step2Outcome, WizardError> {
        let mut session = self.sessions.load(user.id).await?;
        let recipient = self.recipient(user, &session).await?;
        let department_id = recipient.department.id;

        let edit = match request.action {
            Step2Action::Reset => {
                session.step2 = vec![LineItem::blank()];
                session.template_group = None;
                EditResult::default()
            }
            Step2Action::LoadGroup { group } => self.load_group(&mut session, department_id, group).await?,
            action => {
                if !request.fields.is_empty() {
                    session.step2 = apply_posted(&session.step2, &request.fields);
                }

                match action {
                    Step2Action::Add { key } => add_line(&mut session.step2, self.batch_limit, key),
                    Step2Action::Duplicate { key, count } => {
                        duplicate_line(&mut session.step2, self.batch_limit, &key, count.as_deref())
                    }
                    Step2Action::Delete { key } => delete_line(&mut session.step2, &key),
                    Step2Action::Reload { key } => EditResult {
                        refocus: Some(key),
                        warnings: Vec::new(),
                    },
                    _ => {
                        self.sessions.save(user.id, &session).await?;
                        let outcome = self.submit(user, session, recipient).await?;
                        return Ok(Step2Outcome::Submitted(outcome));
                    }
                }
            }
        };

        self.sessions.save(user.id, &session).await?;
        let view = self.view(&session, department_id, edit).await?;
        Ok(Step2Outcome::Edited(view))
    }

    /// Result of the last submission
    pub async fn confirmation(&self, user: &User) -> Result<ConfirmationView, WizardError> {
        let session = self.sessions.load(user.id).await?;
        session
            .outcome
            .as_ref()
            .map(ConfirmationView::from)
            .ok_or(WizardError::NothingToConfirm)
    }

    async fn recipient(&self, user: &User, session: &WizardSession) -> Result<ValidRecipient, WizardError> {
        let Some(input) = session.step1.as_ref() else {
            return Err(WizardError::Step1Incomplete);
        };

        match validate_recipient(self.directory.as_ref(), user, input, &self.default_membership_number).await {
            Err(WizardError::Fields(_)) => Err(WizardError::Step1Incomplete),
            result => result,
        }
    }

    async fn line_context(&self, department_id: Uuid) -> Result<LineContext, WizardError> {
        Ok(LineContext {
            types: self.store.types_for_department(department_id).await?,
            clubs: self.directory.clubs_for_department(department_id).await?,
        })
    }

    async fn load_group(
        &self,
        session: &mut WizardSession,
        department_id: Uuid,
        group_id: i32,
    ) -> Result<EditResult, WizardError> {
        let group = self
            .store
            .find_group(group_id)
            .await?
            .filter(|group| group.department_id == department_id)
            .ok_or(WizardError::GroupNotFound(group_id))?;

        let templates = self.store.group_templates(group.id).await?;
        let mut lines = expand_group(&templates);
        if lines.len() > self.batch_limit {
            return Ok(EditResult {
                refocus: None,
                warnings: vec![limit_message(self.batch_limit)],
            });
        }
        if lines.is_empty() {
            lines.push(LineItem::blank());
        }

        tracing::debug!("Loaded certificate group {} ({} lines)", group.name, lines.len());
        session.step2 = lines;
        session.template_group = Some(group.name);
        Ok(EditResult::default())
    }

    async fn view(
        &self,
        session: &WizardSession,
        department_id: Uuid,
        edit: EditResult,
    ) -> Result<Step2View, WizardError> {
        let context = self.line_context(department_id).await?;
        let groups = self.store.groups_for_department(department_id).await?;
        let today = Local::now().date_naive();

        let types = context
            .types
            .iter()
            .map(|certificate_type| TypeChoice {
                defaults: line_defaults(certificate_type, &context.clubs, today),
                certificate_type: certificate_type.clone(),
            })
            .collect();

        Ok(Step2View {
            state: session.state,
            lines: session.step2.clone(),
            types,
            clubs: context.clubs,
            groups,
            template_group: session.template_group.clone(),
            limit: self.batch_limit,
            refocus: edit.refocus,
            warnings: edit.warnings,
        })
    }

    async fn submit(
        &self,
        user: &User,
        mut session: WizardSession,
        recipient: ValidRecipient,
    ) -> Result<IssuanceOutcome, WizardError> {
        let context = self.line_context(recipient.department.id).await?;
        let certificates = validate_lines(&context, &session.step2)?;

        let step1 = session.step1.clone().unwrap_or_default();
        let fingerprint = submission_fingerprint(user.id, &step1, &session.step2);
        if !self.guard.claim(&fingerprint, user.id).await? {
            return Err(WizardError::DuplicateSubmission);
        }

        let previous = session.state;
        // A session left in Registering by an interrupted request may submit again;
        // the claimed fingerprint already rules out a concurrent submission
        session.state = previous.transition(WizardEvent::Submitted).unwrap_or_else(|| {
            tracing::debug!("Resubmitting wizard batch from state {:?}", previous);
            WizardState::Registering
        });
        self.sessions.save(user.id, &session).await?;

        let outcome = match self.issuance.issue(recipient.batch, certificates).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.guard.release(&fingerprint).await;
                session.state = previous;
                self.sessions.save(user.id, &session).await?;
                return Err(e.into());
            }
        };

        if outcome.success {
            tracing::info!(
                "Staff {} issued certificate batch {:?}",
                user.id,
                outcome.batch_id
            );
            session.step1 = None;
            session.step2.clear();
            session.template_group = None;
            session.state = session
                .state
                .transition(WizardEvent::Registered)
                .unwrap_or(WizardState::Confirmed);
        } else {
            tracing::warn!("Staff {} batch rejected: {:?}", user.id, outcome.errors);
            self.guard.release(&fingerprint).await;
            session.state = session
                .state
                .transition(WizardEvent::Rejected)
                .unwrap_or(WizardState::Failed);
        }

        session.outcome = Some(outcome.clone());
        self.sessions.save(user.id, &session).await?;
        Ok(outcome)
    }
}

/// Replace every saved line with its posted fields
fn apply_posted(lines: &[LineItem], fields: &BTreeMap<String, String>) -> Vec<LineItem> {
    lines
        .iter()
        .map(|line| normalize_line_item(fields, &line.key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::inventory::{CreateTicketResponse, MockInventoryClient};
    use crate::testing;
    use crate::wizard::{STEP1_INCOMPLETE, AT_LEAST_ONE_CERTIFICATE};

    fn service(fixture: &testing::Fixture, inventory: MockInventoryClient) -> WizardService {
        let mut config = AppConfig::for_tests();
        config.batch_limit = 3;
        WizardService::new(
            Arc::new(MemoryCache::new()),
            fixture.directory.clone(),
            fixture.store.clone(),
            fixture.issuance(Arc::new(inventory)),
            &config,
        )
    }

    fn recipient(fixture: &testing::Fixture) -> RecipientInput {
        RecipientInput {
            language: "en".into(),
            account_number: testing::MEMBER_NUMBER.into(),
            recipient_name: "Morgan".into(),
            recipient_email: testing::RECIPIENT_EMAIL.into(),
            department: Some(fixture.department.id),
            email_signature: Some(testing::GLOBAL_SIGNATURE),
            ..Default::default()
        }
    }

    fn default_line_fields(fixture: &testing::Fixture, key: &str) -> BTreeMap<String, String> {
        let prefix = crate::wizard::line_prefix(key);
        [
            ("type", fixture.default_type().id.to_string()),
            ("club", fixture.ontario_club().id.to_string()),
            ("quantity", "2".to_string()),
            ("power_cart", "2".to_string()),
            ("expiry_date", "31/12/2030".to_string()),
        ]
        .into_iter()
        .map(|(field, value)| (format!("{}{}", prefix, field), value))
        .collect()
    }

    fn accepting() -> MockInventoryClient {
        let mut inventory = MockInventoryClient::new();
        inventory.expect_ping().returning(|| Ok(true));
        inventory
            .expect_get_tender_methods_for_department()
            .returning(|_| Ok(testing::tender_methods()));
        inventory
            .expect_create_ticket()
            .times(1)
            .returning(|_| Ok(CreateTicketResponse::accepted()));
        inventory
    }

    #[tokio::test]
    async fn test_step2_requires_step1() {
        let fixture = testing::fixture();
        let wizard = service(&fixture, MockInventoryClient::new());

        let err = wizard.step2_view(&fixture.staff).await.unwrap_err();
        assert!(matches!(err, WizardError::Step1Incomplete));
        assert_eq!(err.to_string(), STEP1_INCOMPLETE);
    }

    #[tokio::test]
    async fn test_step1_round_trip_and_reset() {
        let fixture = testing::fixture();
        let wizard = service(&fixture, MockInventoryClient::new());

        let mut input = recipient(&fixture);
        input.account_number = String::new();
        let saved = wizard.save_step1(&fixture.staff, input).await.unwrap();
        assert_eq!(saved.state, WizardState::AwaitingStep2);
        assert_eq!(saved.warnings.len(), 1);

        let view = wizard.step1_view(&fixture.staff, None).await.unwrap();
        assert_eq!(view.input.account_number, AppConfig::for_tests().default_membership_number);

        let state = wizard.reset_step1(&fixture.staff).await.unwrap();
        assert_eq!(state, WizardState::AwaitingStep1);
        let view = wizard.step1_view(&fixture.staff, None).await.unwrap();
        assert_eq!(view.input, RecipientInput::default());
    }

    #[tokio::test]
    async fn test_invalid_step1_is_not_saved() {
        let fixture = testing::fixture();
        let wizard = service(&fixture, MockInventoryClient::new());

        let input = RecipientInput {
            recipient_email: "nope".into(),
            ..recipient(&fixture)
        };
        assert!(matches!(
            wizard.save_step1(&fixture.staff, input).await,
            Err(WizardError::Fields(_))
        ));
        assert!(wizard.step1_view(&fixture.staff, None).await.unwrap().input.recipient_email.is_empty());
    }

    #[tokio::test]
    async fn test_step2_starts_with_one_line_and_edits() {
        let fixture = testing::fixture();
        let wizard = service(&fixture, MockInventoryClient::new());
        wizard.save_step1(&fixture.staff, recipient(&fixture)).await.unwrap();

        let view = wizard.step2_view(&fixture.staff).await.unwrap();
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.limit, 3);
        let key = view.lines[0].key.clone();

        let request = Step2Request {
            fields: default_line_fields(&fixture, &key),
            action: Step2Action::Duplicate {
                key: key.clone(),
                count: Some("2".into()),
            },
        };
        let Step2Outcome::Edited(view) = wizard.step2_post(&fixture.staff, request).await.unwrap() else {
            panic!("expected an edit");
        };
        assert_eq!(view.lines.len(), 3);
        assert_eq!(view.lines[2].fields, view.lines[0].fields);

        let request = Step2Request {
            fields: BTreeMap::new(),
            action: Step2Action::Add { key: Some(key) },
        };
        let Step2Outcome::Edited(view) = wizard.step2_post(&fixture.staff, request).await.unwrap() else {
            panic!("expected an edit");
        };
        assert_eq!(view.lines.len(), 3);
        assert_eq!(view.warnings, vec![limit_message(3)]);

        let request = Step2Request {
            action: Step2Action::Reset,
            ..Default::default()
        };
        let Step2Outcome::Edited(view) = wizard.step2_post(&fixture.staff, request).await.unwrap() else {
            panic!("expected an edit");
        };
        assert_eq!(view.lines.len(), 1);
        assert!(view.lines[0].fields.is_empty());

        let request = Step2Request {
            action: Step2Action::Delete {
                key: view.lines[0].key.clone(),
            },
            ..Default::default()
        };
        let Step2Outcome::Edited(view) = wizard.step2_post(&fixture.staff, request).await.unwrap() else {
            panic!("expected an edit");
        };
        assert_eq!(view.warnings, vec![AT_LEAST_ONE_CERTIFICATE.to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_group_is_not_found() {
        let fixture = testing::fixture();
        let wizard = service(&fixture, MockInventoryClient::new());
        wizard.save_step1(&fixture.staff, recipient(&fixture)).await.unwrap();

        let request = Step2Request {
            action: Step2Action::LoadGroup { group: 404 },
            ..Default::default()
        };
        assert!(matches!(
            wizard.step2_post(&fixture.staff, request).await,
            Err(WizardError::GroupNotFound(404))
        ));
    }

    #[tokio::test]
    async fn test_invalid_lines_are_reported_with_prefix() {
        let fixture = testing::fixture();
        let wizard = service(&fixture, MockInventoryClient::new());
        wizard.save_step1(&fixture.staff, recipient(&fixture)).await.unwrap();
        let key = wizard.step2_view(&fixture.staff).await.unwrap().lines[0].key.clone();

        let Err(WizardError::Fields(errors)) =
            wizard.step2_post(&fixture.staff, Step2Request::default()).await
        else {
            panic!("expected field errors");
        };
        assert!(errors.contains(&format!("gc{}-type", key)));
        assert!(fixture.store.batch_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_successful_submit_clears_steps() {
        let fixture = testing::fixture();
        let wizard = service(&fixture, accepting());
        wizard.save_step1(&fixture.staff, recipient(&fixture)).await.unwrap();
        let key = wizard.step2_view(&fixture.staff).await.unwrap().lines[0].key.clone();

        let request = Step2Request {
            fields: default_line_fields(&fixture, &key),
            action: Step2Action::Submit,
        };
        let Step2Outcome::Submitted(outcome) = wizard.step2_post(&fixture.staff, request).await.unwrap() else {
            panic!("expected a submission");
        };
        assert!(outcome.success);
        assert_eq!(outcome.emailed_to.as_deref(), Some(testing::RECIPIENT_EMAIL));

        let confirmation = wizard.confirmation(&fixture.staff).await.unwrap();
        assert_eq!(confirmation.batch_id, outcome.batch_id);
        assert!(matches!(
            wizard.step2_view(&fixture.staff).await,
            Err(WizardError::Step1Incomplete)
        ));
        assert_eq!(wizard.step1_view(&fixture.staff, None).await.unwrap().state, WizardState::Confirmed);
    }

    #[tokio::test]
    async fn test_rejected_submit_keeps_session_and_allows_retry() {
        let fixture = testing::fixture();
        let mut inventory = MockInventoryClient::new();
        inventory.expect_ping().returning(|| Ok(true));
        inventory
            .expect_get_tender_methods_for_department()
            .returning(|_| Ok(testing::tender_methods()));
        inventory
            .expect_create_ticket()
            .times(2)
            .returning(|_| Ok(CreateTicketResponse::rejected("Tender mismatch")));
        let wizard = service(&fixture, inventory);
        wizard.save_step1(&fixture.staff, recipient(&fixture)).await.unwrap();
        let key = wizard.step2_view(&fixture.staff).await.unwrap().lines[0].key.clone();

        let request = Step2Request {
            fields: default_line_fields(&fixture, &key),
            action: Step2Action::Submit,
        };
        for _ in 0..2 {
            let Step2Outcome::Submitted(outcome) =
                wizard.step2_post(&fixture.staff, request.clone()).await.unwrap()
            else {
                panic!("expected a submission");
            };
            assert!(!outcome.success);
            assert_eq!(outcome.batch_id, None);
        }

        assert!(fixture.store.batch_ids().await.is_empty());
        let view = wizard.step2_view(&fixture.staff).await.unwrap();
        assert_eq!(view.state, WizardState::Failed);
        assert_eq!(view.lines.len(), 1);
        assert_eq!(
            wizard.confirmation(&fixture.staff).await.unwrap().errors,
            vec!["Tender mismatch".to_string()]
        );
    }

    #[tokio::test]
    async fn test_confirmation_without_submission() {
        let fixture = testing::fixture();
        let wizard = service(&fixture, MockInventoryClient::new());
        assert!(matches!(
            wizard.confirmation(&fixture.staff).await,
            Err(WizardError::NothingToConfirm)
        ));
    }
}
