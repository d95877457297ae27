//! Turn controller use case
//!
//! Owns the single active [`ConversationState`] and runs one exchange at a
//! time: append the user turn, ask the gateway, append the reply (or an
//! apology), return to idle.
//!
//! ```text
//!           submit(text)                 reply / failure / drop
//!   Idle ──────────────────▶ AwaitingReply ──────────────────────▶ Idle
//!     ▲  switch_persona / reset / save / resume are only accepted here
//! ```

use crate::config::BehaviorConfig;
use crate::ports::completion_gateway::{CompletionGateway, GatewayError, GatewayErrorKind, Reply};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::progress::{ExchangeProgressNotifier, NoProgress};
use persona_chat_domain::{
    CodecError, ContextEntry, ConversationState, DomainError, PersonaId, PersonaRegistry, Role,
    SavedSession, Segment, SessionCodec, Turn, preview,
};
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors returned to the caller of the turn controller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    /// An exchange is in flight; the operation was not attempted
    #[error("An exchange is already in progress")]
    Busy,

    #[error("Input is empty")]
    EmptyInput,

    #[error("Unknown persona: {0}")]
    UnknownPersona(String),

    #[error("Cannot restore session: {0}")]
    Codec(#[from] CodecError),

    /// The gateway can no longer be used; the session must halt
    #[error("Fatal gateway error: {0}")]
    Fatal(GatewayError),

    #[error(transparent)]
    Rejected(DomainError),
}

impl From<DomainError> for TurnError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::EmptyInput => TurnError::EmptyInput,
            DomainError::UnknownPersona(id) => TurnError::UnknownPersona(id),
            other => TurnError::Rejected(other),
        }
    }
}

/// Exchange lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangePhase {
    Idle,
    AwaitingReply,
}

/// How an exchange ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// The provider replied; holds the appended assistant turn
    Replied(Turn),
    /// The provider failed and an apology turn was appended instead
    Recovered { kind: GatewayErrorKind, apology: Turn },
}

impl ExchangeOutcome {
    /// The assistant turn appended by this exchange
    pub fn turn(&self) -> &Turn {
        match self {
            ExchangeOutcome::Replied(turn) => turn,
            ExchangeOutcome::Recovered { apology, .. } => apology,
        }
    }

    pub fn is_replied(&self) -> bool {
        matches!(self, ExchangeOutcome::Replied(_))
    }
}

/// Use case driving one conversation session
pub struct TurnController<G: CompletionGateway + 'static> {
    gateway: Arc<G>,
    registry: Arc<PersonaRegistry>,
    state: Mutex<ConversationState>,
    phase: Mutex<ExchangePhase>,
    behavior: BehaviorConfig,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl<G: CompletionGateway + 'static> TurnController<G> {
    /// Start a session with `persona` selected.
    pub fn new(
        gateway: Arc<G>,
        registry: Arc<PersonaRegistry>,
        persona: &str,
    ) -> Result<Self, TurnError> {
        let state = ConversationState::new(registry.get(persona)?);
        info!(persona = %persona, "Conversation initialized");
        Ok(Self {
            gateway,
            registry,
            state: Mutex::new(state),
            phase: Mutex::new(ExchangePhase::Idle),
            behavior: BehaviorConfig::default(),
            conversation_logger: Arc::new(NoConversationLogger),
        })
    }

    pub fn with_behavior(mut self, behavior: BehaviorConfig) -> Self {
        self.behavior = behavior;
        self
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn registry(&self) -> &PersonaRegistry {
        &self.registry
    }

    pub fn phase(&self) -> ExchangePhase {
        *self.lock_phase()
    }

    pub fn active_persona(&self) -> PersonaId {
        self.lock_state().active_persona().clone()
    }

    /// Owned copy of the displayed turns, oldest first
    pub fn rendered_history(&self) -> Vec<Turn> {
        self.lock_state().rendered_history().cloned().collect()
    }

    /// Owned copy of the whole conversation
    pub fn snapshot(&self) -> ConversationState {
        self.lock_state().clone()
    }

    /// Run one exchange without progress reporting.
    pub async fn submit(&self, text: &str) -> Result<ExchangeOutcome, TurnError> {
        self.submit_with_progress(text, &NoProgress).await
    }

    /// Run one exchange.
    ///
    /// Gateway failures other than `Auth` are recovered with an apology turn
    /// and reported as [`ExchangeOutcome::Recovered`]. An `Auth` failure also
    /// appends the apology, then returns [`TurnError::Fatal`].
    pub async fn submit_with_progress(
        &self,
        text: &str,
        progress: &dyn ExchangeProgressNotifier,
    ) -> Result<ExchangeOutcome, TurnError> {
        let (persona, context) = {
            let mut phase = self.lock_phase();
            if *phase == ExchangePhase::AwaitingReply {
                return Err(TurnError::Busy);
            }
            let mut state = self.lock_state();
            state.append_user_turn(text)?;
            *phase = ExchangePhase::AwaitingReply;

            let mut context = state.export_context();
            // The new input travels separately from the prior turns
            context.pop();
            (state.active_persona().clone(), context)
        };

        let mut guard = ExchangeGuard::new(self, &persona, text);

        debug!(
            persona = %persona,
            context_turns = context.len(),
            "Sending: {}",
            preview(text, 80)
        );
        progress.on_awaiting_reply(&persona);

        let result = self.request(&context, text).await;

        let (outcome, fatal) = match result {
            Ok(reply) => {
                let turn = guard.settle_reply(reply);
                info!(persona = %persona, "Exchange completed");
                self.conversation_logger.log(ConversationEvent::new(
                    "exchange_completed",
                    json!({
                        "persona": persona.as_str(),
                        "input": text,
                        "reply": turn.text_content(),
                    }),
                ));
                (ExchangeOutcome::Replied(turn), None)
            }
            Err(error) => {
                let kind = error.kind();
                let apology = guard.settle_failure(&error);
                warn!(persona = %persona, kind = %kind, "Exchange failed: {}", error);
                self.conversation_logger.log(ConversationEvent::new(
                    "exchange_failed",
                    json!({
                        "persona": persona.as_str(),
                        "input": text,
                        "kind": kind.as_str(),
                        "error": error.to_string(),
                    }),
                ));
                let fatal = error.is_fatal().then_some(error);
                (ExchangeOutcome::Recovered { kind, apology }, fatal)
            }
        };
        drop(guard);

        progress.on_reply_finished(match &outcome {
            ExchangeOutcome::Replied(_) => None,
            ExchangeOutcome::Recovered { kind, .. } => Some(*kind),
        });

        match fatal {
            Some(error) => Err(TurnError::Fatal(error)),
            None => Ok(outcome),
        }
    }

    /// Select `persona`, discarding the conversation when it changes.
    ///
    /// Returns `true` when the history was reset.
    pub fn switch_persona(&self, persona: &str) -> Result<bool, TurnError> {
        let phase = self.lock_phase();
        if *phase == ExchangePhase::AwaitingReply {
            return Err(TurnError::Busy);
        }
        let target = self.registry.get(persona)?;
        let reset = self.lock_state().switch_persona(target);
        drop(phase);

        if reset {
            info!(persona = %persona, "Persona switched, conversation reset");
            self.conversation_logger.log(ConversationEvent::new(
                "persona_selected",
                json!({ "persona": persona }),
            ));
        }
        Ok(reset)
    }

    /// Re-initialize the active persona's conversation.
    pub fn reset(&self) -> Result<(), TurnError> {
        let phase = self.lock_phase();
        if *phase == ExchangePhase::AwaitingReply {
            return Err(TurnError::Busy);
        }
        let mut state = self.lock_state();
        let persona = self.registry.get(state.active_persona().as_str())?;
        state.initialize(persona);
        info!(persona = %persona.id(), "Conversation reset");
        Ok(())
    }

    /// Encode the conversation into a portable token.
    pub fn save(&self) -> Result<SavedSession, TurnError> {
        let phase = self.lock_phase();
        if *phase == ExchangePhase::AwaitingReply {
            return Err(TurnError::Busy);
        }
        let state = self.lock_state();
        let saved = SessionCodec::encode(&state)?;
        if !saved.is_lossless() {
            warn!(
                omitted = saved.omitted_attachments,
                "Attachment data is not carried by session tokens"
            );
        }
        self.conversation_logger.log(ConversationEvent::new(
            "session_saved",
            json!({
                "persona": state.active_persona().as_str(),
                "turns": state.turns().len(),
                "omitted_attachments": saved.omitted_attachments,
            }),
        ));
        Ok(saved)
    }

    /// Replace the conversation with the one encoded in `token`.
    ///
    /// The current conversation is left untouched when decoding fails.
    pub fn resume(&self, token: &str) -> Result<(), TurnError> {
        let phase = self.lock_phase();
        if *phase == ExchangePhase::AwaitingReply {
            return Err(TurnError::Busy);
        }
        let restored = SessionCodec::decode(token, &self.registry)?;
        let persona = restored.active_persona().clone();
        let turns = restored.turns().len();
        *self.lock_state() = restored;
        drop(phase);

        info!(persona = %persona, turns, "Conversation resumed");
        self.conversation_logger.log(ConversationEvent::new(
            "session_resumed",
            json!({ "persona": persona.as_str(), "turns": turns }),
        ));
        Ok(())
    }

    async fn request(&self, context: &[ContextEntry], text: &str) -> Result<Reply, GatewayError> {
        let call = self.gateway.complete(context, text);
        let result = match self.behavior.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
                Err(GatewayError::TransientFailure(format!(
                    "no reply within {}s",
                    limit.as_secs()
                )))
            }),
            None => call.await,
        };

        match result {
            Ok(reply) if reply.is_empty() => Err(GatewayError::TransientFailure(
                "provider returned an empty reply".to_string(),
            )),
            other => other,
        }
    }

    fn apology_turn(&self, error: &GatewayError) -> Turn {
        Turn::text(
            Role::Assistant,
            format!("{} [{}]: {}", self.behavior.apology, error.kind(), error),
        )
    }

    fn lock_state(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_phase(&self) -> MutexGuard<'_, ExchangePhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the controller to `Idle` when the exchange ends, however it ends.
///
/// If the exchange future is dropped before settling, the dangling user turn
/// is paired with an apology so the log keeps one assistant turn per user
/// turn.
struct ExchangeGuard<'a, G: CompletionGateway + 'static> {
    controller: &'a TurnController<G>,
    persona: &'a PersonaId,
    input: &'a str,
    settled: bool,
}

impl<'a, G: CompletionGateway + 'static> ExchangeGuard<'a, G> {
    fn new(controller: &'a TurnController<G>, persona: &'a PersonaId, input: &'a str) -> Self {
        Self {
            controller,
            persona,
            input,
            settled: false,
        }
    }

    fn settle_reply(&mut self, reply: Reply) -> Turn {
        let mut state = self.controller.lock_state();
        let turn = match Turn::new(Role::Assistant, reply.segments) {
            Some(turn) => turn,
            None => self.controller.apology_turn(&GatewayError::TransientFailure(
                "provider returned an empty reply".to_string(),
            )),
        };
        Self::push(&mut state, turn.clone());
        self.settled = true;
        turn
    }

    fn settle_failure(&mut self, error: &GatewayError) -> Turn {
        let turn = self.controller.apology_turn(error);
        Self::push(&mut self.controller.lock_state(), turn.clone());
        self.settled = true;
        turn
    }

    fn push(state: &mut ConversationState, turn: Turn) {
        let segments: Vec<Segment> = turn.segments().to_vec();
        // A Turn is never empty, so this append cannot be rejected
        let _ = state.append_assistant_turn(segments);
    }
}

impl<G: CompletionGateway + 'static> Drop for ExchangeGuard<'_, G> {
    fn drop(&mut self) {
        if !self.settled {
            let error = GatewayError::TransientFailure("exchange was cancelled".to_string());
            warn!(persona = %self.persona, "Exchange dropped before a reply arrived");
            let turn = self.controller.apology_turn(&error);
            Self::push(&mut self.controller.lock_state(), turn);
            self.controller.conversation_logger.log(ConversationEvent::new(
                "exchange_failed",
                json!({
                    "persona": self.persona.as_str(),
                    "input": self.input,
                    "kind": error.kind().as_str(),
                    "error": error.to_string(),
                }),
            ));
        }
        *self.controller.lock_phase() = ExchangePhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use persona_chat_domain::Persona;
    use std::collections::VecDeque;
    use tokio::sync::Notify;

    /// Mock gateway that returns scripted results in order and records calls
    struct ScriptedGateway {
        results: Mutex<VecDeque<Result<Reply, GatewayError>>>,
        calls: Mutex<Vec<(Vec<ContextEntry>, String)>>,
    }

    impl ScriptedGateway {
        fn new(results: Vec<Result<Reply, GatewayError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn replying(texts: &[&str]) -> Self {
            Self::new(texts.iter().map(|t| Ok(Reply::from_text(*t))).collect())
        }

        fn calls(&self) -> Vec<(Vec<ContextEntry>, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionGateway for ScriptedGateway {
        async fn complete(
            &self,
            context: &[ContextEntry],
            new_input: &str,
        ) -> Result<Reply, GatewayError> {
            self.calls
                .lock()
                .unwrap()
                .push((context.to_vec(), new_input.to_string()));
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Reply::from_text("(no more responses)")))
        }
    }

    /// Mock gateway that parks every call until released
    struct BlockingGateway {
        started: Notify,
        release: Notify,
    }

    impl BlockingGateway {
        fn new() -> Self {
            Self {
                started: Notify::new(),
                release: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl CompletionGateway for BlockingGateway {
        async fn complete(
            &self,
            _context: &[ContextEntry],
            _new_input: &str,
        ) -> Result<Reply, GatewayError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(Reply::from_text("released"))
        }
    }

    /// Mock gateway that never answers
    struct SilentGateway;

    #[async_trait]
    impl CompletionGateway for SilentGateway {
        async fn complete(
            &self,
            _context: &[ContextEntry],
            _new_input: &str,
        ) -> Result<Reply, GatewayError> {
            std::future::pending().await
        }
    }

    /// Progress notifier that records callbacks
    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl ExchangeProgressNotifier for RecordingProgress {
        fn on_awaiting_reply(&self, persona: &PersonaId) {
            self.events
                .lock()
                .unwrap()
                .push(format!("awaiting:{}", persona));
        }

        fn on_reply_finished(&self, failure: Option<GatewayErrorKind>) {
            let label = failure.map(|k| k.to_string()).unwrap_or("ok".to_string());
            self.events
                .lock()
                .unwrap()
                .push(format!("finished:{}", label));
        }
    }

    /// Logger that keeps event types in memory
    #[derive(Default)]
    struct RecordingLogger {
        events: Mutex<Vec<&'static str>>,
    }

    impl ConversationLogger for RecordingLogger {
        fn log(&self, event: ConversationEvent) {
            self.events.lock().unwrap().push(event.event_type);
        }
    }

    fn registry() -> Arc<PersonaRegistry> {
        Arc::new(
            PersonaRegistry::new(vec![
                Persona::new("A", "X", "Hello"),
                Persona::new("B", "Y", "Yo"),
            ])
            .unwrap(),
        )
    }

    fn controller<G: CompletionGateway + 'static>(gateway: G) -> TurnController<G> {
        TurnController::new(Arc::new(gateway), registry(), "A").unwrap()
    }

    fn rendered(controller: &TurnController<impl CompletionGateway + 'static>) -> Vec<(Role, String)> {
        controller
            .rendered_history()
            .iter()
            .map(|t| (t.role(), t.text_content()))
            .collect()
    }

    #[tokio::test]
    async fn test_single_exchange_scenario() {
        let controller = controller(ScriptedGateway::replying(&["there"]));

        let outcome = controller.submit("hi").await.unwrap();
        assert!(outcome.is_replied());
        assert_eq!(outcome.turn().text_content(), "there");

        assert_eq!(
            rendered(&controller),
            vec![
                (Role::Assistant, "Hello".to_string()),
                (Role::User, "hi".to_string()),
                (Role::Assistant, "there".to_string()),
            ]
        );
        assert_eq!(controller.phase(), ExchangePhase::Idle);
    }

    #[tokio::test]
    async fn test_context_excludes_new_input_and_includes_seed() {
        let gateway = Arc::new(ScriptedGateway::replying(&["there", "again"]));
        let controller = TurnController::new(gateway.clone(), registry(), "A").unwrap();

        controller.submit("hi").await.unwrap();
        controller.submit("more").await.unwrap();

        let calls = gateway.calls();
        assert_eq!(calls.len(), 2);

        let (context, input) = &calls[0];
        assert_eq!(input, "hi");
        assert_eq!(
            context,
            &vec![
                ContextEntry {
                    role: Role::Instruction,
                    text: "X".to_string()
                },
                ContextEntry {
                    role: Role::Assistant,
                    text: "Hello".to_string()
                },
            ]
        );

        let (context, input) = &calls[1];
        assert_eq!(input, "more");
        assert_eq!(context.len(), 4);
        assert_eq!(context[2].text, "hi");
        assert_eq!(context[3].text, "there");
    }

    #[tokio::test]
    async fn test_empty_submit_rejected_without_change() {
        let gateway = Arc::new(ScriptedGateway::replying(&[]));
        let controller = TurnController::new(gateway.clone(), registry(), "A").unwrap();
        let before = controller.snapshot();

        for input in ["", "   ", "\t\n"] {
            assert_eq!(controller.submit(input).await, Err(TurnError::EmptyInput));
        }
        assert_eq!(controller.snapshot(), before);
        assert_eq!(controller.phase(), ExchangePhase::Idle);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_history_grows_by_two_per_exchange() {
        let controller = controller(ScriptedGateway::replying(&["1", "2", "3"]));
        for n in 1..=3 {
            controller.submit(&format!("q{}", n)).await.unwrap();
            assert_eq!(controller.rendered_history().len(), 1 + 2 * n);
        }
    }

    #[tokio::test]
    async fn test_failures_append_apology_turn() {
        let failures = vec![
            GatewayError::RateLimited { retry_after: None },
            GatewayError::ContentBlocked("SAFETY".to_string()),
            GatewayError::TransientFailure("connection reset".to_string()),
        ];
        for error in failures {
            let controller = controller(ScriptedGateway::new(vec![Err(error.clone())]));

            let outcome = controller.submit("hi").await.unwrap();
            match &outcome {
                ExchangeOutcome::Recovered { kind, apology } => {
                    assert_eq!(*kind, error.kind());
                    assert_eq!(apology.role(), Role::Assistant);
                    assert!(apology.text_content().contains(error.kind().as_str()));
                }
                other => panic!("expected recovery, got {:?}", other),
            }

            let history = controller.rendered_history();
            assert_eq!(history.len(), 3);
            assert_eq!(history[1].text_content(), "hi");
            assert_eq!(controller.phase(), ExchangePhase::Idle);
        }
    }

    #[tokio::test]
    async fn test_empty_reply_treated_as_transient_failure() {
        let controller = controller(ScriptedGateway::new(vec![Ok(Reply::from_text("  "))]));
        let outcome = controller.submit("hi").await.unwrap();
        assert!(matches!(
            outcome,
            ExchangeOutcome::Recovered {
                kind: GatewayErrorKind::TransientFailure,
                ..
            }
        ));
        assert_eq!(controller.rendered_history().len(), 3);
    }

    #[tokio::test]
    async fn test_auth_failure_is_fatal_but_logged() {
        let controller = controller(ScriptedGateway::new(vec![Err(GatewayError::Auth(
            "API key not valid".to_string(),
        ))]));

        let result = controller.submit("hi").await;
        assert!(matches!(result, Err(TurnError::Fatal(GatewayError::Auth(_)))));
        assert_eq!(controller.rendered_history().len(), 3);
        assert_eq!(controller.phase(), ExchangePhase::Idle);
    }

    #[tokio::test]
    async fn test_custom_apology_text() {
        let controller = controller(ScriptedGateway::new(vec![Err(
            GatewayError::TransientFailure("boom".to_string()),
        )]))
        .with_behavior(BehaviorConfig::default().with_apology("ごめんなさい"));

        let outcome = controller.submit("hi").await.unwrap();
        assert!(outcome.turn().text_content().starts_with("ごめんなさい [transient_failure]"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_maps_to_transient_failure() {
        let controller = controller(SilentGateway)
            .with_behavior(BehaviorConfig::from_timeout_seconds(Some(5)));

        let outcome = controller.submit("hi").await.unwrap();
        assert!(matches!(
            outcome,
            ExchangeOutcome::Recovered {
                kind: GatewayErrorKind::TransientFailure,
                ..
            }
        ));
        assert_eq!(controller.rendered_history().len(), 3);
    }

    #[tokio::test]
    async fn test_busy_while_awaiting_reply() {
        let gateway = Arc::new(BlockingGateway::new());
        let controller = Arc::new(TurnController::new(gateway.clone(), registry(), "A").unwrap());

        let in_flight = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.submit("first").await })
        };
        gateway.started.notified().await;

        assert_eq!(controller.phase(), ExchangePhase::AwaitingReply);
        assert_eq!(controller.submit("second").await, Err(TurnError::Busy));
        assert_eq!(controller.switch_persona("B"), Err(TurnError::Busy));
        assert_eq!(controller.reset(), Err(TurnError::Busy));
        assert_eq!(controller.save(), Err(TurnError::Busy));
        assert_eq!(controller.resume("00"), Err(TurnError::Busy));

        gateway.release.notify_one();
        let outcome = in_flight.await.unwrap().unwrap();
        assert_eq!(outcome.turn().text_content(), "released");
        assert_eq!(controller.phase(), ExchangePhase::Idle);
        assert_eq!(controller.rendered_history().len(), 3);
        assert_eq!(controller.active_persona(), PersonaId::new("A"));
    }

    #[tokio::test]
    async fn test_dropped_exchange_still_pairs_user_turn() {
        let gateway = Arc::new(BlockingGateway::new());
        let logger = Arc::new(RecordingLogger::default());
        let controller = Arc::new(
            TurnController::new(gateway.clone(), registry(), "A")
                .unwrap()
                .with_conversation_logger(logger.clone()),
        );

        let in_flight = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.submit("first").await })
        };
        gateway.started.notified().await;
        in_flight.abort();
        assert!(in_flight.await.unwrap_err().is_cancelled());

        assert_eq!(controller.phase(), ExchangePhase::Idle);
        let history = controller.rendered_history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].role(), Role::Assistant);
        assert!(history[2].text_content().contains("cancelled"));
        assert_eq!(*logger.events.lock().unwrap(), vec!["exchange_failed"]);
    }

    #[tokio::test]
    async fn test_switch_persona_resets_only_on_change() {
        let controller = controller(ScriptedGateway::replying(&["there"]));
        controller.submit("hi").await.unwrap();

        assert_eq!(controller.switch_persona("A"), Ok(false));
        assert_eq!(controller.rendered_history().len(), 3);

        assert_eq!(controller.switch_persona("B"), Ok(true));
        assert_eq!(rendered(&controller), vec![(Role::Assistant, "Yo".to_string())]);
        assert_eq!(controller.snapshot().instruction().as_deref(), Some("Y"));
    }

    #[tokio::test]
    async fn test_switch_to_unknown_persona_keeps_state() {
        let controller = controller(ScriptedGateway::replying(&["there"]));
        controller.submit("hi").await.unwrap();
        let before = controller.snapshot();

        assert_eq!(
            controller.switch_persona("ghost"),
            Err(TurnError::UnknownPersona("ghost".to_string()))
        );
        assert_eq!(controller.snapshot(), before);
    }

    #[tokio::test]
    async fn test_reset_reinitializes_active_persona() {
        let controller = controller(ScriptedGateway::replying(&["there"]));
        controller.submit("hi").await.unwrap();
        controller.reset().unwrap();
        assert_eq!(rendered(&controller), vec![(Role::Assistant, "Hello".to_string())]);
    }

    #[tokio::test]
    async fn test_save_and_resume_round_trip() {
        let first = controller(ScriptedGateway::replying(&["there"]));
        first.submit("hi").await.unwrap();
        let saved = first.save().unwrap();

        let second = controller(ScriptedGateway::replying(&[]));
        second.switch_persona("B").unwrap();
        second.resume(&saved.token).unwrap();

        assert_eq!(second.snapshot(), first.snapshot());
        assert_eq!(second.active_persona(), PersonaId::new("A"));
    }

    #[tokio::test]
    async fn test_failed_resume_keeps_state() {
        let controller = controller(ScriptedGateway::replying(&["there"]));
        controller.submit("hi").await.unwrap();
        let before = controller.snapshot();

        let result = controller.resume("definitely not a token");
        assert!(matches!(result, Err(TurnError::Codec(CodecError::Malformed(_)))));
        assert_eq!(controller.snapshot(), before);
    }

    #[tokio::test]
    async fn test_progress_callbacks() {
        let controller = controller(ScriptedGateway::new(vec![
            Ok(Reply::from_text("there")),
            Err(GatewayError::ContentBlocked("SAFETY".to_string())),
        ]));
        let progress = RecordingProgress::default();

        controller.submit_with_progress("hi", &progress).await.unwrap();
        controller.submit_with_progress("hm", &progress).await.unwrap();

        assert_eq!(
            *progress.events.lock().unwrap(),
            vec![
                "awaiting:A".to_string(),
                "finished:ok".to_string(),
                "awaiting:A".to_string(),
                "finished:content_blocked".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_conversation_events_logged() {
        let logger = Arc::new(RecordingLogger::default());
        let controller = controller(ScriptedGateway::new(vec![
            Ok(Reply::from_text("there")),
            Err(GatewayError::TransientFailure("x".to_string())),
        ]))
        .with_conversation_logger(logger.clone());

        controller.submit("hi").await.unwrap();
        controller.submit("again").await.unwrap();
        controller.switch_persona("B").unwrap();
        let saved = controller.save().unwrap();
        controller.resume(&saved.token).unwrap();

        assert_eq!(
            *logger.events.lock().unwrap(),
            vec![
                "exchange_completed",
                "exchange_failed",
                "persona_selected",
                "session_saved",
                "session_resumed",
            ]
        );
    }

    #[test]
    fn test_new_with_unknown_persona() {
        let result = TurnController::new(Arc::new(SilentGateway), registry(), "nobody");
        assert!(matches!(result, Err(TurnError::UnknownPersona(_))));
    }
}
