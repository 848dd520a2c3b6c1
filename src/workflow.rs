// Copyright (c) 2026 rezky_nightky

use std::cell::{Cell, RefCell};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{SubmitError, ValidationError};
use crate::form::{self, FieldMap, FieldValue, FormKind, SuccessPanel, WorkflowStage};
use crate::store::{BlobStore, SignupStore};

pub const DEFAULT_PANEL_DURATION: Duration = Duration::from_millis(5000);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Receipt {
    pub message: Option<String>,
}

pub trait Delivery {
    async fn deliver(&self, kind: FormKind, fields: &FieldMap) -> Result<Receipt, SubmitError>;
}

pub struct LocalDelivery<B> {
    store: SignupStore<B>,
}

impl<B: BlobStore> LocalDelivery<B> {
    pub fn new(store: SignupStore<B>) -> Self {
        Self { store }
    }

    #[cfg(test)]
    pub fn store(&self) -> &SignupStore<B> {
        &self.store
    }
}

impl<B: BlobStore> Delivery for LocalDelivery<B> {
    async fn deliver(&self, kind: FormKind, fields: &FieldMap) -> Result<Receipt, SubmitError> {
        match kind {
            FormKind::Signup => {
                let record = self.store.append(fields.clone())?;
                tracing::info!(timestamp = %record.timestamp, "signup stored locally");
            }
            FormKind::Contact => {
                tracing::info!(fields = fields.len(), "contact message accepted locally, not stored");
            }
        }
        Ok(Receipt::default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkflowPhase {
    Idle,
    Validating,
    Stage(usize),
    Succeeded,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitControl {
    pub label: String,
    pub original_label: String,
    pub disabled: bool,
}

impl SubmitControl {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            original_label: label.to_string(),
            disabled: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub kind: NoticeKind,
    pub text: String,
}

pub trait Presenter {
    fn phase(&self, _kind: FormKind, _phase: WorkflowPhase) {}
    fn control(&self, control: &SubmitControl);
    fn notify(&self, note: &Notification);
    fn clear_fields(&self, kind: FormKind);
    // `Some` shows the panel, `None` hides it.
    fn success_panel(&self, panel: Option<&SuccessPanel>);
}

#[derive(Debug)]
pub enum Outcome {
    Succeeded(Receipt),
    Failed(SubmitError),
    Invalid(ValidationError),
    Ignored,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded(_))
    }
}

// Clears `in_flight` and, if the submission was dropped mid-stage, puts the
// control and phase back to an interactive Idle.
struct InFlight<'a, D: Delivery, P: Presenter>(&'a SubmissionWorkflow<D, P>);

impl<D: Delivery, P: Presenter> Drop for InFlight<'_, D, P> {
    fn drop(&mut self) {
        let wf = self.0;
        wf.in_flight.set(false);
        let disabled = wf.control.try_borrow().map_or(false, |c| c.disabled);
        if !disabled && wf.phase.get() == WorkflowPhase::Idle {
            return;
        }
        tracing::debug!(form = ?wf.kind, phase = ?wf.phase.get(), "submission dropped, restoring form");
        if let Ok(mut control) = wf.control.try_borrow_mut() {
            control.label = control.original_label.clone();
            control.disabled = false;
            wf.presenter.control(&control);
        }
        wf.enter(WorkflowPhase::Idle);
    }
}

pub struct SubmissionWorkflow<D, P> {
    kind: FormKind,
    delivery: D,
    presenter: P,
    stages: Vec<WorkflowStage>,
    panel_duration: Duration,
    fields: RefCell<FieldMap>,
    control: RefCell<SubmitControl>,
    phase: Cell<WorkflowPhase>,
    in_flight: Cell<bool>,
    panel_until: Cell<Option<Instant>>,
}

impl<D: Delivery, P: Presenter> SubmissionWorkflow<D, P> {
    pub fn new(kind: FormKind, delivery: D, presenter: P) -> Self {
        Self {
            kind,
            delivery,
            presenter,
            stages: kind.default_stages(),
            panel_duration: DEFAULT_PANEL_DURATION,
            fields: RefCell::new(FieldMap::new()),
            control: RefCell::new(SubmitControl::new(kind.submit_label())),
            phase: Cell::new(WorkflowPhase::Idle),
            in_flight: Cell::new(false),
            panel_until: Cell::new(None),
        }
    }

    pub fn with_stages(mut self, stages: Vec<WorkflowStage>) -> Self {
        self.stages = stages;
        self
    }

    pub fn with_panel_duration(mut self, duration: Duration) -> Self {
        self.panel_duration = duration;
        self
    }

    #[cfg(test)]
    pub fn delivery(&self) -> &D {
        &self.delivery
    }

    #[cfg(test)]
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.phase.get()
    }

    pub fn control(&self) -> SubmitControl {
        self.control.borrow().clone()
    }

    pub fn fields(&self) -> FieldMap {
        self.fields.borrow().clone()
    }

    pub fn panel_visible(&self) -> bool {
        self.panel_until.get().is_some()
    }

    pub fn set_field(&self, name: &str, value: impl Into<FieldValue>) {
        let value = value.into();
        let mut fields = self.fields.borrow_mut();
        if value.is_blank() {
            fields.remove(name);
        } else {
            fields.insert(name.to_string(), value);
        }
    }

    fn enter(&self, phase: WorkflowPhase) {
        tracing::debug!(form = ?self.kind, ?phase, "workflow phase");
        self.phase.set(phase);
        self.presenter.phase(self.kind, phase);
    }

    fn update_control(&self, f: impl FnOnce(&mut SubmitControl)) {
        let snapshot = {
            let mut control = self.control.borrow_mut();
            f(&mut control);
            control.clone()
        };
        self.presenter.control(&snapshot);
    }

    fn notify(&self, kind: NoticeKind, text: String) {
        self.presenter.notify(&Notification { kind, text });
    }

    pub async fn submit(&self) -> Outcome {
        if self.in_flight.get() || self.control.borrow().disabled {
            tracing::debug!(form = ?self.kind, "submission already running, ignoring");
            return Outcome::Ignored;
        }
        self.in_flight.set(true);
        let _guard = InFlight(self);

        self.enter(WorkflowPhase::Validating);
        let fields = self.fields();
        if let Err(e) = form::validate(self.kind, &fields) {
            tracing::debug!(form = ?self.kind, error = %e, "validation failed");
            self.notify(NoticeKind::Error, e.user_message());
            self.enter(WorkflowPhase::Idle);
            return Outcome::Invalid(e);
        }

        self.update_control(|c| c.disabled = true);
        for (i, stage) in self.stages.iter().enumerate() {
            self.enter(WorkflowPhase::Stage(i));
            self.update_control(|c| c.label = stage.label.clone());
            tokio::time::sleep(stage.duration).await;
        }

        let result = self.delivery.deliver(self.kind, &fields).await;
        self.update_control(|c| {
            c.label = c.original_label.clone();
            c.disabled = false;
        });

        match result {
            Ok(receipt) => {
                tracing::info!(form = ?self.kind, reply = ?receipt.message, "submission delivered");
                self.fields.borrow_mut().clear();
                self.presenter.clear_fields(self.kind);
                self.notify(NoticeKind::Success, self.kind.success_text().to_string());
                if let Some(panel) = self.kind.success_panel() {
                    self.panel_until
                        .set(Some(Instant::now() + self.panel_duration));
                    self.presenter.success_panel(Some(panel));
                }
                self.enter(WorkflowPhase::Succeeded);
                self.enter(WorkflowPhase::Idle);
                Outcome::Succeeded(receipt)
            }
            Err(e) => {
                tracing::warn!(form = ?self.kind, error = %e, "submission failed");
                self.notify(NoticeKind::Error, e.user_message(self.kind));
                self.enter(WorkflowPhase::Failed);
                self.enter(WorkflowPhase::Idle);
                Outcome::Failed(e)
            }
        }
    }

    fn hide_panel(&self) {
        if self.panel_until.take().is_some() {
            self.presenter.success_panel(None);
        }
    }

    pub fn poll_panel(&self, now: Instant) -> bool {
        match self.panel_until.get() {
            Some(until) if now >= until => {
                self.hide_panel();
                true
            }
            _ => false,
        }
    }

    pub async fn settle(&self) {
        if let Some(until) = self.panel_until.get() {
            tokio::time::sleep_until(until).await;
            self.poll_panel(until);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::ApiClient;
    use crate::store::{MemoryBlobStore, StoredSignup};

    #[derive(Clone, Debug, PartialEq)]
    enum Event {
        Phase(WorkflowPhase),
        Control(String, bool),
        Notify(NoticeKind, String),
        Cleared,
        Panel(bool),
    }

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<Event>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<Event> {
            self.events.borrow().clone()
        }

        fn notes(&self) -> Vec<(NoticeKind, String)> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    Event::Notify(k, t) => Some((k, t)),
                    _ => None,
                })
                .collect()
        }

        fn controls(&self) -> Vec<(String, bool)> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    Event::Control(l, d) => Some((l, d)),
                    _ => None,
                })
                .collect()
        }
    }

    impl Presenter for Recorder {
        fn phase(&self, _kind: FormKind, phase: WorkflowPhase) {
            self.events.borrow_mut().push(Event::Phase(phase));
        }
        fn control(&self, control: &SubmitControl) {
            self.events
                .borrow_mut()
                .push(Event::Control(control.label.clone(), control.disabled));
        }
        fn notify(&self, note: &Notification) {
            self.events
                .borrow_mut()
                .push(Event::Notify(note.kind, note.text.clone()));
        }
        fn clear_fields(&self, _kind: FormKind) {
            self.events.borrow_mut().push(Event::Cleared);
        }
        fn success_panel(&self, panel: Option<&SuccessPanel>) {
            self.events.borrow_mut().push(Event::Panel(panel.is_some()));
        }
    }

    struct Scripted {
        calls: Cell<usize>,
        reply: fn() -> Result<Receipt, SubmitError>,
    }

    impl Scripted {
        fn ok() -> Self {
            Self {
                calls: Cell::new(0),
                reply: || Ok(Receipt::default()),
            }
        }

        fn failing() -> Self {
            Self {
                calls: Cell::new(0),
                reply: || {
                    Err(SubmitError::Rejected {
                        status: 500,
                        message: Some("quota exceeded".into()),
                    })
                },
            }
        }
    }

    impl Delivery for Scripted {
        async fn deliver(&self, _kind: FormKind, _fields: &FieldMap) -> Result<Receipt, SubmitError> {
            self.calls.set(self.calls.get() + 1);
            (self.reply)()
        }
    }

    fn quick_stages(labels: &[&str]) -> Vec<WorkflowStage> {
        labels
            .iter()
            .map(|l| WorkflowStage::new(*l, Duration::from_millis(1)))
            .collect()
    }

    fn filled_contact<D: Delivery>(delivery: D) -> SubmissionWorkflow<D, Recorder> {
        let wf = SubmissionWorkflow::new(FormKind::Contact, delivery, Recorder::default())
            .with_stages(quick_stages(&["Encrypting...", "Sending..."]));
        wf.set_field("name", "A");
        wf.set_field("email", "a@b.co");
        wf.set_field("message", "hi");
        wf
    }

    #[tokio::test]
    async fn stages_run_in_order_under_their_labels() {
        let wf = filled_contact(Scripted::ok());
        let outcome = wf.submit().await;
        assert!(outcome.is_success());

        assert_eq!(
            wf.presenter().controls(),
            vec![
                ("Send Message".to_string(), true),
                ("Encrypting...".to_string(), true),
                ("Sending...".to_string(), true),
                ("Send Message".to_string(), false),
            ]
        );
        let phases: Vec<_> = wf
            .presenter()
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Phase(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![
                WorkflowPhase::Validating,
                WorkflowPhase::Stage(0),
                WorkflowPhase::Stage(1),
                WorkflowPhase::Succeeded,
                WorkflowPhase::Idle,
            ]
        );
        assert_eq!(wf.delivery().calls.get(), 1);
        assert!(wf.fields().is_empty());
        assert!(wf.presenter().events().contains(&Event::Cleared));
        assert_eq!(
            wf.presenter().notes(),
            vec![(NoticeKind::Success, "Message sent successfully!".to_string())]
        );
        assert!(!wf.panel_visible());
    }

    #[tokio::test]
    async fn invalid_input_runs_no_stages() {
        let wf = SubmissionWorkflow::new(FormKind::Signup, Scripted::ok(), Recorder::default())
            .with_stages(quick_stages(&["a", "b", "c"]));
        wf.set_field("name", "");
        wf.set_field("email", "ada@ghost.dev");

        let outcome = wf.submit().await;
        match outcome {
            Outcome::Invalid(e) => assert_eq!(e.field, "name"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(wf.delivery().calls.get(), 0);
        assert!(wf.presenter().controls().is_empty());
        assert!(!wf.control().disabled);
        assert_eq!(
            wf.presenter().notes(),
            vec![(NoticeKind::Error, "Please enter your name.".to_string())]
        );
        assert_eq!(wf.phase(), WorkflowPhase::Idle);
        assert_eq!(wf.fields().len(), 1);
    }

    #[tokio::test]
    async fn failure_keeps_fields_and_reenables_control() {
        let wf = filled_contact(Scripted::failing());
        let before = wf.fields();

        let outcome = wf.submit().await;
        assert!(matches!(outcome, Outcome::Failed(SubmitError::Rejected { .. })));
        assert_eq!(wf.fields(), before);
        assert_eq!(wf.control(), SubmitControl::new("Send Message"));
        assert_eq!(
            wf.presenter().notes(),
            vec![(NoticeKind::Error, "quota exceeded".to_string())]
        );
        assert!(!wf.presenter().events().contains(&Event::Cleared));
        assert_eq!(wf.phase(), WorkflowPhase::Idle);

        // the form can be resubmitted afterwards
        let again = wf.submit().await;
        assert!(matches!(again, Outcome::Failed(_)));
        assert_eq!(wf.delivery().calls.get(), 2);
    }

    #[tokio::test]
    async fn concurrent_submit_is_ignored() {
        let wf = filled_contact(Scripted::ok());
        let (first, second) = tokio::join!(wf.submit(), wf.submit());
        assert!(first.is_success());
        assert!(matches!(second, Outcome::Ignored));
        assert_eq!(wf.delivery().calls.get(), 1);
    }

    #[tokio::test]
    async fn dropped_submit_leaves_the_form_usable() {
        let wf = filled_contact(Scripted::ok())
            .with_stages(vec![WorkflowStage::new("slow", Duration::from_secs(60))]);

        let cut = tokio::time::timeout(Duration::from_millis(10), wf.submit()).await;
        assert!(cut.is_err());
        assert_eq!(wf.phase(), WorkflowPhase::Idle);
        assert_eq!(wf.control(), SubmitControl::new("Send Message"));
        assert_eq!(
            wf.presenter().controls().last(),
            Some(&("Send Message".to_string(), false))
        );
        assert_eq!(wf.fields().len(), 3);
        assert_eq!(wf.delivery().calls.get(), 0);

        // a fresh submit starts over instead of being ignored
        let again = tokio::time::timeout(Duration::from_millis(10), wf.submit()).await;
        assert!(again.is_err());
        let validating = wf
            .presenter()
            .events()
            .into_iter()
            .filter(|e| *e == Event::Phase(WorkflowPhase::Validating))
            .count();
        assert_eq!(validating, 2);
        assert_eq!(wf.control(), SubmitControl::new("Send Message"));
    }

    #[tokio::test]
    async fn local_signup_is_stored_and_shows_panel() {
        let store = SignupStore::new(MemoryBlobStore::default());
        let wf = SubmissionWorkflow::new(
            FormKind::Signup,
            LocalDelivery::new(store),
            Recorder::default(),
        )
        .with_stages(quick_stages(&["Encrypting Data..."]))
        .with_panel_duration(Duration::from_millis(5));
        wf.set_field("name", "Ada");
        wf.set_field("email", "ada@ghost.dev");
        wf.set_field("interests", vec!["ctf".to_string()]);

        assert!(wf.submit().await.is_success());
        let stored = wf.delivery().store().load().unwrap();
        assert_eq!(stored.len(), 1);
        let StoredSignup::Record(record) = &stored[0] else {
            panic!("expected a record, got {:?}", stored[0]);
        };
        assert_eq!(record.fields["name"], FieldValue::from("Ada"));
        assert!(wf.panel_visible());
        assert!(!wf.poll_panel(Instant::now() - Duration::from_millis(1)));

        wf.settle().await;
        assert!(!wf.panel_visible());
        let panels: Vec<_> = wf
            .presenter()
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::Panel(_)))
            .collect();
        assert_eq!(panels, vec![Event::Panel(true), Event::Panel(false)]);
        assert_eq!(
            wf.presenter().notes(),
            vec![(NoticeKind::Success, "Application submitted successfully!".to_string())]
        );
    }

    #[tokio::test]
    async fn poll_panel_hides_after_the_window() {
        let wf = SubmissionWorkflow::new(
            FormKind::Signup,
            LocalDelivery::new(SignupStore::new(MemoryBlobStore::default())),
            Recorder::default(),
        )
        .with_stages(Vec::new())
        .with_panel_duration(Duration::from_millis(50));
        wf.set_field("name", "Ada");
        wf.set_field("email", "ada@ghost.dev");
        assert!(wf.submit().await.is_success());

        assert!(wf.poll_panel(Instant::now() + Duration::from_secs(1)));
        assert!(!wf.panel_visible());
        assert!(!wf.poll_panel(Instant::now() + Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn contact_round_trip_against_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/contact"))
            .and(body_json(json!({"name": "A", "email": "a@b.co", "message": "hi"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "success", "message": "Message received"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let wf = filled_contact(api);
        match wf.submit().await {
            Outcome::Succeeded(receipt) => {
                assert_eq!(receipt.message.as_deref(), Some("Message received"))
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert!(wf.fields().is_empty());
        assert_eq!(
            wf.presenter().notes(),
            vec![(NoticeKind::Success, "Message sent successfully!".to_string())]
        );
    }

    #[tokio::test]
    async fn invalid_signup_never_reaches_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let wf = SubmissionWorkflow::new(FormKind::Signup, api, Recorder::default())
            .with_stages(quick_stages(&["x"]));
        wf.set_field("email", "ada@ghost.dev");
        assert!(matches!(wf.submit().await, Outcome::Invalid(_)));
        assert_eq!(
            wf.presenter().notes(),
            vec![(NoticeKind::Error, "Please enter your name.".to_string())]
        );
    }

    #[tokio::test]
    async fn backend_quota_error_is_shown_and_fields_stay() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/contact"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"message": "quota exceeded"})),
            )
            .mount(&server)
            .await;

        let api = ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let wf = filled_contact(api);
        assert!(matches!(wf.submit().await, Outcome::Failed(_)));
        assert_eq!(wf.fields()["message"], FieldValue::from("hi"));
        assert_eq!(
            wf.presenter().notes(),
            vec![(NoticeKind::Error, "quota exceeded".to_string())]
        );
    }
}
