//! The per-form finite state machine.
//!
//! Every entity form runs the same cycle:
//!
//! ```text
//! Closed -> Loading -> Ready -> Submitting -> Closed (+refresh)
//!                        ^                       |
//!                        +---- Ready(error) <----+
//! ```
//!
//! Opening fetches the form's reference data through a [`FormBackend`]; the
//! form is not usable before that fetch completes. Submission is
//! fire-and-wait: the machine sits in `Submitting` until the outcome arrives,
//! then either closes (raising a refresh signal for the list behind it) or
//! re-enters `Ready` with the error and the previously loaded options.
//! Dropping the flow mid-flight is a plain cancellation; nothing to undo.

use common::{EntityKind, Role, capabilities};
use serde_json::Value;

use crate::error::ClientError;

/// Result of one submission, as the form sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub success: bool,
    pub error: Option<String>,
}

/// Where a form can send its reads and writes. `ApiClient` is the HTTP
/// implementation; tests plug in a mock.
pub trait FormBackend {
    /// Fetch the drop-down option lists the entity's form needs.
    fn load_options(&self, entity: EntityKind) -> Result<Value, ClientError>;

    /// Create (`id` = `None`) or update (`id` = `Some`) one record.
    fn submit(
        &self,
        entity: EntityKind,
        id: Option<i32>,
        payload: &Value,
    ) -> Result<SubmissionOutcome, ClientError>;
}

/// The observable state of one form.
#[derive(Debug)]
pub enum FormState {
    Closed,
    Loading,
    Ready {
        options: Value,
        error: Option<String>,
    },
    Submitting,
}

impl FormState {
    pub fn is_closed(&self) -> bool {
        matches!(self, FormState::Closed)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, FormState::Ready { .. })
    }
}

/// One create-or-update form bound to an entity and a backend.
pub struct FormFlow<'a, B: FormBackend> {
    backend: &'a B,
    entity: EntityKind,
    /// `None` for a create form, `Some(id)` for an update form.
    target: Option<i32>,
    state: FormState,
    needs_refresh: bool,
}

impl<'a, B: FormBackend> FormFlow<'a, B> {
    pub fn create(backend: &'a B, entity: EntityKind) -> Self {
        FormFlow {
            backend,
            entity,
            target: None,
            state: FormState::Closed,
            needs_refresh: false,
        }
    }

    pub fn update(backend: &'a B, entity: EntityKind, id: i32) -> Self {
        FormFlow {
            backend,
            entity,
            target: Some(id),
            state: FormState::Closed,
            needs_refresh: false,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Whether the given role may open this form at all, per the shared
    /// capability table. The server enforces the same table on submission,
    /// so hiding the affordance and rejecting the write can never disagree.
    pub fn can_open(&self, role: Role) -> bool {
        let caps = capabilities(role, self.entity);
        match self.target {
            None => caps.can_create,
            Some(_) => caps.can_update,
        }
    }

    /// `Closed -> Loading -> Ready`. On a failed reference-data fetch the
    /// form stays closed and the error is returned to the caller.
    pub fn open(&mut self) -> Result<(), ClientError> {
        if !self.state.is_closed() {
            return Err(ClientError::State);
        }
        self.state = FormState::Loading;
        match self.backend.load_options(self.entity) {
            Ok(options) => {
                self.state = FormState::Ready {
                    options,
                    error: None,
                };
                Ok(())
            }
            Err(e) => {
                self.state = FormState::Closed;
                Err(e)
            }
        }
    }

    /// `Ready -> Submitting -> {Closed + refresh | Ready(error)}`.
    ///
    /// Returns whether the submission succeeded. Transport failures re-enter
    /// `Ready` with the error message, like server-side rejections; no
    /// partial mutation is assumed either way.
    pub fn submit(&mut self, payload: &Value) -> Result<bool, ClientError> {
        let options = match std::mem::replace(&mut self.state, FormState::Submitting) {
            FormState::Ready { options, .. } => options,
            other => {
                // Not submittable; put the state back untouched.
                self.state = other;
                return Err(ClientError::State);
            }
        };

        match self.backend.submit(self.entity, self.target, payload) {
            Ok(outcome) if outcome.success => {
                self.state = FormState::Closed;
                self.needs_refresh = true;
                Ok(true)
            }
            Ok(outcome) => {
                self.state = FormState::Ready {
                    options,
                    error: outcome.error,
                };
                Ok(false)
            }
            Err(e) => {
                self.state = FormState::Ready {
                    options,
                    error: Some(e.to_string()),
                };
                Ok(false)
            }
        }
    }

    /// Close the form without submitting. Discards any pending error.
    pub fn close(&mut self) {
        self.state = FormState::Closed;
    }

    /// Whether a successful submission happened since the last check. Reading
    /// the signal consumes it; the list behind the form refetches on `true`.
    pub fn take_refresh(&mut self) -> bool {
        std::mem::take(&mut self.needs_refresh)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;

    /// Scripted backend: options to serve and outcomes to return, in order.
    struct MockBackend {
        options: Result<Value, ()>,
        outcomes: RefCell<Vec<Result<SubmissionOutcome, ()>>>,
        submissions: RefCell<Vec<(EntityKind, Option<i32>, Value)>>,
    }

    impl MockBackend {
        fn new(options: Result<Value, ()>) -> Self {
            MockBackend {
                options,
                outcomes: RefCell::new(Vec::new()),
                submissions: RefCell::new(Vec::new()),
            }
        }

        fn push_outcome(&self, outcome: Result<SubmissionOutcome, ()>) {
            self.outcomes.borrow_mut().push(outcome);
        }
    }

    impl FormBackend for MockBackend {
        fn load_options(&self, _entity: EntityKind) -> Result<Value, ClientError> {
            self.options
                .clone()
                .map_err(|_| ClientError::Decode("boom".into()))
        }

        fn submit(
            &self,
            entity: EntityKind,
            id: Option<i32>,
            payload: &Value,
        ) -> Result<SubmissionOutcome, ClientError> {
            self.submissions
                .borrow_mut()
                .push((entity, id, payload.clone()));
            self.outcomes
                .borrow_mut()
                .remove(0)
                .map_err(|_| ClientError::Decode("transport down".into()))
        }
    }

    #[test]
    fn open_loads_options_then_becomes_ready() {
        let backend = MockBackend::new(Ok(json!({"subjects": []})));
        let mut flow = FormFlow::create(&backend, EntityKind::Teacher);

        assert!(flow.state().is_closed());
        flow.open().unwrap();
        let FormState::Ready { options, error } = flow.state() else {
            panic!("expected Ready");
        };
        assert_eq!(options["subjects"], json!([]));
        assert!(error.is_none());
    }

    #[test]
    fn failed_options_fetch_keeps_the_form_closed() {
        let backend = MockBackend::new(Err(()));
        let mut flow = FormFlow::create(&backend, EntityKind::Teacher);

        assert!(flow.open().is_err());
        assert!(flow.state().is_closed());
    }

    #[test]
    fn successful_submission_closes_and_raises_refresh() {
        let backend = MockBackend::new(Ok(json!({})));
        backend.push_outcome(Ok(SubmissionOutcome {
            success: true,
            error: None,
        }));
        let mut flow = FormFlow::create(&backend, EntityKind::Lesson);

        flow.open().unwrap();
        assert!(flow.submit(&json!({"name": "Algebra"})).unwrap());
        assert!(flow.state().is_closed());
        assert!(flow.take_refresh());
        // The signal is consumed on read.
        assert!(!flow.take_refresh());
    }

    #[test]
    fn failed_submission_reenters_ready_with_the_message_and_options() {
        let backend = MockBackend::new(Ok(json!({"lessons": [1, 2]})));
        backend.push_outcome(Ok(SubmissionOutcome {
            success: false,
            error: Some("score must be between 0 and 100".into()),
        }));
        let mut flow = FormFlow::create(&backend, EntityKind::Result);

        flow.open().unwrap();
        assert!(!flow.submit(&json!({"score": 200})).unwrap());
        let FormState::Ready { options, error } = flow.state() else {
            panic!("expected Ready");
        };
        assert_eq!(options["lessons"], json!([1, 2]));
        assert_eq!(error.as_deref(), Some("score must be between 0 and 100"));
        assert!(!flow.take_refresh());
    }

    #[test]
    fn transport_failure_also_reenters_ready() {
        let backend = MockBackend::new(Ok(json!({})));
        backend.push_outcome(Err(()));
        let mut flow = FormFlow::update(&backend, EntityKind::Exam, 7);

        flow.open().unwrap();
        assert!(!flow.submit(&json!({"title": "Midterm"})).unwrap());
        assert!(flow.state().is_ready());
    }

    #[test]
    fn submit_requires_an_open_form() {
        let backend = MockBackend::new(Ok(json!({})));
        let mut flow = FormFlow::create(&backend, EntityKind::Event);

        assert!(matches!(
            flow.submit(&json!({})),
            Err(ClientError::State)
        ));
        assert!(flow.state().is_closed());
        assert!(backend.submissions.borrow().is_empty());
    }

    #[test]
    fn update_forms_carry_their_target_id() {
        let backend = MockBackend::new(Ok(json!({})));
        backend.push_outcome(Ok(SubmissionOutcome {
            success: true,
            error: None,
        }));
        let mut flow = FormFlow::update(&backend, EntityKind::Class, 3);

        flow.open().unwrap();
        flow.submit(&json!({"capacity": 25})).unwrap();
        let submissions = backend.submissions.borrow();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].1, Some(3));
    }

    #[test]
    fn capability_table_gates_opening() {
        let backend = MockBackend::new(Ok(json!({})));
        let create_lesson = FormFlow::create(&backend, EntityKind::Lesson);
        assert!(create_lesson.can_open(Role::Admin));
        assert!(create_lesson.can_open(Role::Teacher));
        assert!(!create_lesson.can_open(Role::Student));

        let create_student = FormFlow::create(&backend, EntityKind::Student);
        assert!(create_student.can_open(Role::Admin));
        assert!(!create_student.can_open(Role::Teacher));
        assert!(!create_student.can_open(Role::None));
    }
}
