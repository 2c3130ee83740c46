//! Mode coordinator: the single owner of session state.
//!
//! Owns the active [`Mode`], the conversation log, the builder form, the
//! builder view and the pending Chat→Builder transition. Every mutation goes
//! through `&mut self`, so there is exactly one writer; the
//! [`ActivityHandle`] additionally rejects overlapping calls of the same kind
//! and lets a surface poll in-flight state without touching the coordinator.
//!
//! Flow:
//! 1. **Chat** — `send_message` converses; a plan tool call schedules a
//!    delayed transition and returns its ticket
//! 2. **Transition** — `fire_transition` switches to Builder, reconciles the
//!    request over the form and auto-submits
//! 3. **Builder** — `submit_form` synthesizes; failure reverts to the form
//!    with a notice, success shows the document

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::inference::types::{Role, ToolSpec};
use crate::inference::{CoachConfig, GenerationService, InferenceError};
use crate::render::{PlanRenderer, RenderedArtifact};

use super::activity::{ActivityHandle, CallKind};
use super::conversation::{
    truncate_utf8, ConversationLog, APOLOGY, BUILDER_NOTICE, DEFAULT_HISTORY_WINDOW,
};
use super::errors::CoachError;
use super::extractor::extract;
use super::prompts::plan_tools;
use super::reconciler::reconcile;
use super::synthesis::PlanSynthesizer;
use super::types::{BuilderView, ConversationTurn, Mode, PlanDocument, PlanParameters, PlanRequest};

/// Shown in the builder when synthesis fails.
pub const SYNTHESIS_FAILED_NOTICE: &str = "Failed to generate plan. Please try again.";

const DEFAULT_TRANSITION_DELAY: Duration = Duration::from_millis(1000);

// ─── Types ──────────────────────────────────────────────────────────────────

/// Tunables for a coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    /// Recent turns sent as context with each message.
    pub history_window: usize,
    /// Pause between the builder notice and the automatic transition.
    pub transition_delay: Duration,
    /// Initial builder form values.
    pub initial_form: PlanParameters,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
            transition_delay: DEFAULT_TRANSITION_DELAY,
            initial_form: PlanParameters::default(),
        }
    }
}

impl CoordinatorSettings {
    /// Build settings from the loaded config, decoding `default_plan` into
    /// form values.
    pub fn from_config(config: &CoachConfig) -> Result<Self, CoachError> {
        let initial_form = match &config.default_plan {
            Some(raw) => serde_yaml::from_value::<PlanParameters>(raw.clone()).map_err(|e| {
                CoachError::InvalidParameters {
                    reason: format!("default_plan: {e}"),
                }
            })?,
            None => PlanParameters::default(),
        };

        Ok(Self {
            history_window: config.history_window,
            transition_delay: config.transition_delay(),
            initial_form,
        })
    }
}

/// Handle for a scheduled Chat→Builder transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTicket {
    pub id: Uuid,
    /// How long the surface should wait before firing.
    pub delay: Duration,
}

/// A scheduled transition and the request it carries.
#[derive(Debug, Clone)]
pub struct PendingTransition {
    pub ticket: TransitionTicket,
    pub request: PlanRequest,
}

/// Result of a chat turn.
#[derive(Debug)]
pub enum ChatOutcome {
    /// Ordinary reply, no mode change.
    Replied,
    /// The model asked for a program; fire the ticket after its delay.
    PlanRequested(TransitionTicket),
    /// The call failed; an apology turn was appended instead.
    Degraded(InferenceError),
}

/// Result of a synthesis attempt.
#[derive(Debug)]
pub enum SynthesisOutcome {
    Ready(PlanDocument),
    /// View is back on the form and a notice is set.
    Failed(InferenceError),
}

/// Everything that happened for one headless message.
#[derive(Debug)]
pub struct HandledMessage {
    pub chat: ChatOutcome,
    pub synthesis: Option<SynthesisOutcome>,
}

// ─── Coordinator ────────────────────────────────────────────────────────────

pub struct ModeCoordinator {
    service: Arc<dyn GenerationService>,
    synthesizer: PlanSynthesizer,
    tools: ToolSpec,
    settings: CoordinatorSettings,
    mode: Mode,
    log: ConversationLog,
    form: PlanParameters,
    view: BuilderView,
    notice: Option<String>,
    pending: Option<PendingTransition>,
    activity: ActivityHandle,
}

impl ModeCoordinator {
    pub fn new(service: Arc<dyn GenerationService>, settings: CoordinatorSettings) -> Self {
        let synthesizer = PlanSynthesizer::new(Arc::clone(&service));
        let form = settings.initial_form.clone();
        Self {
            service,
            synthesizer,
            tools: plan_tools(),
            settings,
            mode: Mode::Chat,
            log: ConversationLog::with_greeting(),
            form,
            view: BuilderView::Form,
            notice: None,
            pending: None,
            activity: ActivityHandle::new(),
        }
    }

    // ── Accessors ──

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        self.log.turns()
    }

    pub fn form(&self) -> &PlanParameters {
        &self.form
    }

    pub fn builder_view(&self) -> &BuilderView {
        &self.view
    }

    /// The document currently shown, if any.
    pub fn plan(&self) -> Option<&PlanDocument> {
        match &self.view {
            BuilderView::Result(doc) => Some(doc),
            BuilderView::Form => None,
        }
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn pending_transition(&self) -> Option<&PendingTransition> {
        self.pending.as_ref()
    }

    /// Cloneable view of in-flight calls.
    pub fn activity(&self) -> ActivityHandle {
        self.activity.clone()
    }

    // ── Chat ──

    /// Send a chat message. Only valid in Chat. Mode never changes here; a
    /// plan request only schedules a transition.
    pub async fn send_message(&mut self, text: &str) -> Result<ChatOutcome, CoachError> {
        if self.mode != Mode::Chat {
            return Err(CoachError::WrongMode {
                expected: Mode::Chat,
                actual: self.mode,
            });
        }
        if text.trim().is_empty() {
            return Err(CoachError::EmptyMessage);
        }
        let _permit = self.activity.try_begin(CallKind::Converse)?;

        // Context is the window before this message.
        let history = self.log.history_window(self.settings.history_window);
        self.log.push(Role::User, text);

        tracing::info!(
            history = history.len(),
            preview = truncate_utf8(text, 80),
            "sending chat message"
        );

        let response = match self.service.converse(text, &history, &self.tools).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, kind = e.kind(), "chat turn failed");
                self.log.push(Role::Model, APOLOGY);
                return Ok(ChatOutcome::Degraded(e));
            }
        };

        if !response.text.trim().is_empty() {
            self.log.push(Role::Model, response.text.clone());
        }

        let Some(request) = extract(&response) else {
            return Ok(ChatOutcome::Replied);
        };

        self.log.push(Role::Model, BUILDER_NOTICE);

        let ticket = TransitionTicket {
            id: Uuid::new_v4(),
            delay: self.settings.transition_delay,
        };
        if let Some(previous) = self.pending.replace(PendingTransition { ticket, request }) {
            tracing::info!(ticket = %previous.ticket.id, "superseding pending transition");
        }
        tracing::info!(
            ticket = %ticket.id,
            delay_ms = ticket.delay.as_millis() as u64,
            "plan requested, transition scheduled"
        );

        Ok(ChatOutcome::PlanRequested(ticket))
    }

    /// Fire a scheduled transition. Stale or already-fired tickets do nothing.
    pub async fn fire_transition(
        &mut self,
        ticket: TransitionTicket,
    ) -> Result<Option<SynthesisOutcome>, CoachError> {
        let pending = match self.pending.take() {
            Some(p) if p.ticket.id == ticket.id => p,
            other => {
                self.pending = other;
                tracing::debug!(ticket = %ticket.id, "ignoring stale transition ticket");
                return Ok(None);
            }
        };

        self.enter_builder();
        self.form = reconcile(&self.form, &pending.request);

        tracing::info!(
            ticket = %ticket.id,
            goal = %self.form.goal,
            days = self.form.days_per_week.get(),
            "transitioned to builder, auto-submitting"
        );

        self.submit_form().await.map(Some)
    }

    /// Send a message and, if it requests a plan, wait out the delay and fire.
    pub async fn handle_message(&mut self, text: &str) -> Result<HandledMessage, CoachError> {
        let chat = self.send_message(text).await?;
        let synthesis = match &chat {
            ChatOutcome::PlanRequested(ticket) => {
                tokio::time::sleep(ticket.delay).await;
                self.fire_transition(*ticket).await?
            }
            _ => None,
        };
        Ok(HandledMessage { chat, synthesis })
    }

    // ── Navigation ──

    /// Switch modes manually. Any pending transition is cancelled.
    pub fn navigate(&mut self, mode: Mode) {
        if let Some(cancelled) = self.pending.take() {
            tracing::info!(ticket = %cancelled.ticket.id, "pending transition cancelled");
        }
        if mode == self.mode {
            return;
        }
        match mode {
            Mode::Builder => self.enter_builder(),
            Mode::Chat => self.mode = Mode::Chat,
        }
        tracing::info!(mode = ?mode, "navigated");
    }

    /// Builder starts fresh on entry. Form values carry over.
    fn enter_builder(&mut self) {
        self.mode = Mode::Builder;
        self.view = BuilderView::Form;
        self.notice = None;
    }

    // ── Builder ──

    pub fn update_form(&mut self, params: PlanParameters) {
        self.form = params;
    }

    /// Synthesize a plan from the current form.
    pub async fn submit_form(&mut self) -> Result<SynthesisOutcome, CoachError> {
        if self.mode != Mode::Builder {
            return Err(CoachError::WrongMode {
                expected: Mode::Builder,
                actual: self.mode,
            });
        }
        let _permit = self.activity.try_begin(CallKind::Synthesis)?;
        self.notice = None;

        match self.synthesizer.synthesize(&self.form).await {
            Ok(doc) => {
                self.view = BuilderView::Result(doc.clone());
                Ok(SynthesisOutcome::Ready(doc))
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = e.kind(), "plan synthesis failed");
                self.view = BuilderView::Form;
                self.notice = Some(SYNTHESIS_FAILED_NOTICE.to_string());
                Ok(SynthesisOutcome::Failed(e))
            }
        }
    }

    /// Back to the form for another plan.
    pub fn start_new_plan(&mut self) {
        self.view = BuilderView::Form;
        self.notice = None;
    }

    /// Render the current document as schedule and analysis artifacts.
    pub fn export_plan(&self, renderer: &dyn PlanRenderer) -> Result<Vec<RenderedArtifact>, CoachError> {
        let doc = self.plan().ok_or(CoachError::NoPlan)?;
        Ok(vec![
            renderer.render_schedule(doc),
            renderer.render_analysis(doc),
        ])
    }
}
