//! The `/ia` conversation state machine.
//!
//! Every event is handled to completion, including model and ledger calls.
//! Failures of those calls are rendered into the chat; only failures to
//! deliver chat messages are returned to the caller.

use anyhow::Result;
use tracing::{debug, error, info, warn};

use cafetal_core::ChatSurface;
use cafetal_ledger::RecordAggregator;
use cafetal_llm::{ModelGateway, UseCase};
use cafetal_logging::EventLogger;

use crate::menu::MenuChoice;
use crate::prices::parse_price_block;
use crate::render;
use crate::session_state::{AssistantMode, DialogueState, Session, SessionStore};

/// Inbound chat events the controller understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueEvent {
    /// The `/ia` command.
    Start,
    /// The `/cancelar` command.
    Cancel,
    /// An inline button press, with its callback payload.
    Callback(String),
    /// A plain text message.
    Text(String),
}

impl DialogueEvent {
    fn trigger(&self) -> &'static str {
        match self {
            DialogueEvent::Start => "start",
            DialogueEvent::Cancel => "cancel",
            DialogueEvent::Callback(_) => "callback",
            DialogueEvent::Text(_) => "text",
        }
    }
}

pub struct DialogueController {
    gateway: ModelGateway,
    aggregator: RecordAggregator,
    sessions: SessionStore,
}

impl DialogueController {
    pub fn new(gateway: ModelGateway, aggregator: RecordAggregator, sessions: SessionStore) -> Self {
        Self {
            gateway,
            aggregator,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Whether the chat has an open conversation with the assistant.
    pub fn is_active(&self, session_id: &str) -> bool {
        self.sessions.get(session_id).is_some()
    }

    /// Handle one event for one chat and return the state the chat is left in.
    ///
    /// The next session is stored even when a reply fails to go out, so a
    /// finished turn is never replayed; the delivery error is returned after.
    pub async fn handle(
        &self,
        session_id: &str,
        event: DialogueEvent,
        surface: &dyn ChatSurface,
    ) -> Result<DialogueState> {
        let current = self.sessions.get(session_id);
        let from = current.as_ref().map(|s| s.state);
        let trigger = event.trigger();

        let (next, delivered) = match event {
            DialogueEvent::Start => self.start(session_id, surface).await,
            DialogueEvent::Cancel => self.cancel(session_id, surface).await,
            DialogueEvent::Callback(data) => self.on_callback(session_id, current, &data, surface).await,
            DialogueEvent::Text(text) => self.on_text(session_id, current, &text, surface).await,
        };

        let state = next.state;
        self.sessions.save(next);

        if from != Some(state) {
            EventLogger::transition(
                session_id,
                trigger,
                from.map(|s| s.as_str()),
                state.as_str(),
            );
        }
        if let Err(e) = &delivered {
            EventLogger::error(session_id, format!("reply not delivered: {e:#}"));
        }
        delivered.map(|()| state)
    }

    async fn start(&self, session_id: &str, surface: &dyn ChatSurface) -> (Session, Result<()>) {
        if !self.gateway.is_configured() {
            warn!(session_id, "AI backend not configured, declining /ia");
            EventLogger::error(session_id, "configuration missing: OPENAI_API_KEY");
            let delivered = surface.send_text(render::NOT_CONFIGURED, false).await;
            return (ended(session_id), delivered);
        }

        let session = Session::new(session_id);
        debug!(session_id, state = %session.state, "Showing assistant menu");
        let delivered = surface
            .send_text_with_buttons(render::MENU, &MenuChoice::main_menu(), true)
            .await;
        (session.transition(DialogueState::AwaitQuestion), delivered)
    }

    async fn cancel(&self, session_id: &str, surface: &dyn ChatSurface) -> (Session, Result<()>) {
        info!(session_id, "Assistant conversation cancelled");
        (ended(session_id), surface.send_text(render::CANCELLED, false).await)
    }

    async fn on_callback(
        &self,
        session_id: &str,
        current: Option<Session>,
        data: &str,
        surface: &dyn ChatSurface,
    ) -> (Session, Result<()>) {
        let choice = match data.parse::<MenuChoice>() {
            Ok(choice) => choice,
            Err(e) => {
                warn!(session_id, error = %e, "Ignoring callback");
                return (current.unwrap_or_else(|| ended(session_id)), Ok(()));
            }
        };

        match (choice, current) {
            (MenuChoice::Cancelar, _) => (
                ended(session_id),
                surface.edit_message(render::CANCELLED, false).await,
            ),
            (_, None) => {
                debug!(session_id, ?choice, "Menu pressed with no open conversation");
                (ended(session_id), Ok(()))
            }
            (_, Some(session)) if session.state != DialogueState::AwaitQuestion => {
                debug!(session_id, ?choice, state = %session.state, "Menu pressed outside the menu state");
                (session, Ok(()))
            }
            (MenuChoice::Consulta, Some(session)) => (
                session
                    .with_mode(AssistantMode::Consulta)
                    .transition(DialogueState::AwaitQuestion),
                surface.edit_message(render::QUESTION_PROMPT, true).await,
            ),
            (MenuChoice::Analisis, Some(session)) => (
                session.transition(DialogueState::End),
                self.run_analysis(session_id, surface).await,
            ),
            (MenuChoice::Recomendacion, Some(session)) => (
                session
                    .with_mode(AssistantMode::Recomendacion)
                    .transition(DialogueState::AwaitPreferences),
                surface.edit_message(render::PREFERENCES_PROMPT, true).await,
            ),
            (MenuChoice::Precios, Some(session)) => (
                session
                    .with_mode(AssistantMode::Precios)
                    .transition(DialogueState::AwaitOptimizationData),
                surface.edit_message(render::PRICING_PROMPT, true).await,
            ),
        }
    }

    async fn on_text(
        &self,
        session_id: &str,
        current: Option<Session>,
        text: &str,
        surface: &dyn ChatSurface,
    ) -> (Session, Result<()>) {
        let Some(session) = current else {
            debug!(session_id, "Text outside an assistant conversation");
            return (ended(session_id), Ok(()));
        };

        match session.state {
            DialogueState::AwaitQuestion => {
                let delivered = self.answer_question(session_id, text, surface).await;
                (session, delivered)
            }
            DialogueState::AwaitPreferences => (
                session.transition(DialogueState::End),
                self.recommend(session_id, text, surface).await,
            ),
            DialogueState::AwaitOptimizationData => (
                session.transition(DialogueState::End),
                self.optimize_prices(session_id, text, surface).await,
            ),
            DialogueState::Menu | DialogueState::End => (session, Ok(())),
        }
    }

    async fn answer_question(&self, session_id: &str, question: &str, surface: &dyn ChatSurface) -> Result<()> {
        surface.send_text(render::QUESTION_PROCESSING, false).await?;

        EventLogger::model_call(session_id, UseCase::Question.label());
        let answer = self.gateway.answer_question(question).await;
        surface.send_text(&render::answer(&answer), true).await?;

        surface
            .send_text_with_buttons(render::FOLLOW_UP, &render::follow_up_buttons(), false)
            .await
    }

    async fn run_analysis(&self, session_id: &str, surface: &dyn ChatSurface) -> Result<()> {
        surface.edit_message(render::ANALYSIS_IN_PROGRESS, true).await?;

        match self.aggregator.build_analysis_payload().await {
            Ok(payload) => {
                EventLogger::model_call(session_id, UseCase::Analysis.label());
                let analysis = self.gateway.analyze_operations(&payload).await;
                surface.edit_message(&render::analysis(&analysis), true).await
            }
            Err(e) => {
                error!(session_id, error = %e, "Analysis failed");
                EventLogger::error(session_id, e.to_string());
                surface.edit_message(&render::analysis_error(&e), false).await
            }
        }
    }

    async fn recommend(&self, session_id: &str, preferences: &str, surface: &dyn ChatSurface) -> Result<()> {
        surface.send_text(render::PREFERENCES_PROCESSING, false).await?;

        EventLogger::model_call(session_id, UseCase::Recommendation.label());
        let recommendations = self.gateway.recommend_coffee(preferences).await;
        surface
            .send_text(&render::recommendations(&recommendations), true)
            .await
    }

    async fn optimize_prices(&self, session_id: &str, text: &str, surface: &dyn ChatSurface) -> Result<()> {
        surface.send_text(render::PRICING_PROCESSING, false).await?;

        let result = match parse_price_block(text) {
            Ok(products) => {
                info!(session_id, products = products.len(), "Parsed price block");
                EventLogger::model_call(session_id, UseCase::Pricing.label());
                self.gateway.optimize_pricing(&products).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(recommendations) => surface.send_text(&render::pricing(&recommendations), true).await,
            Err(e) => {
                error!(session_id, error = %e, "Price optimization failed");
                if let Some(raw) = e.raw_output() {
                    debug!(session_id, raw, "Unparseable pricing output");
                }
                EventLogger::error(session_id, e.to_string());
                surface.send_text(&render::pricing_error(&e), false).await
            }
        }
    }
}

fn ended(session_id: &str) -> Session {
    Session::new(session_id).transition(DialogueState::End)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use cafetal_core::{Button, Dataset, Record};
    use cafetal_ledger::MemoryRecordStore;
    use cafetal_llm::providers::MockProvider;

    #[derive(Debug, Clone, PartialEq)]
    enum Sent {
        Text(String),
        Buttons(String, Vec<String>),
        Edit(String),
    }

    #[derive(Default)]
    struct RecordingSurface {
        sent: Mutex<Vec<Sent>>,
        /// Messages containing this text are recorded, then refused.
        reject: Option<&'static str>,
    }

    impl RecordingSurface {
        fn rejecting(marker: &'static str) -> Self {
            Self {
                reject: Some(marker),
                ..Self::default()
            }
        }

        fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        fn last_text(&self) -> String {
            match self.sent().last().cloned() {
                Some(Sent::Text(t)) | Some(Sent::Edit(t)) | Some(Sent::Buttons(t, _)) => t,
                None => String::new(),
            }
        }

        fn record(&self, text: &str, sent: Sent) -> Result<()> {
            self.sent.lock().unwrap().push(sent);
            match self.reject {
                Some(marker) if text.contains(marker) => {
                    anyhow::bail!("Bad Request: message is too long")
                }
                _ => Ok(()),
            }
        }
    }

    #[async_trait]
    impl ChatSurface for RecordingSurface {
        async fn send_text(&self, text: &str, _formatted: bool) -> Result<()> {
            self.record(text, Sent::Text(text.to_string()))
        }

        async fn send_text_with_buttons(&self, text: &str, buttons: &[Button], _formatted: bool) -> Result<()> {
            let data = buttons.iter().map(|b| b.data.clone()).collect();
            self.record(text, Sent::Buttons(text.to_string(), data))
        }

        async fn edit_message(&self, text: &str, _formatted: bool) -> Result<()> {
            self.record(text, Sent::Edit(text.to_string()))
        }
    }

    const CHAT: &str = "tg-100-7";

    fn controller_with(gateway: ModelGateway, store: MemoryRecordStore) -> DialogueController {
        DialogueController::new(
            gateway,
            RecordAggregator::new(Arc::new(store)),
            SessionStore::new(Duration::from_secs(60)),
        )
    }

    fn controller(response: &str) -> (DialogueController, Arc<MockProvider>) {
        let mock = Arc::new(MockProvider::new("mock").with_response(response));
        let gateway = ModelGateway::new(mock.clone(), "gpt-test");
        (controller_with(gateway, MemoryRecordStore::new()), mock)
    }

    fn callback(choice: MenuChoice) -> DialogueEvent {
        DialogueEvent::Callback(choice.callback_data().to_string())
    }

    #[tokio::test]
    async fn not_configured_declines_once_and_ends() {
        let ctl = controller_with(ModelGateway::unconfigured(), MemoryRecordStore::new());
        let surface = RecordingSurface::default();

        let state = ctl.handle(CHAT, DialogueEvent::Start, &surface).await.unwrap();

        assert_eq!(state, DialogueState::End);
        assert_eq!(surface.sent(), vec![Sent::Text(render::NOT_CONFIGURED.to_string())]);
        assert!(!ctl.is_active(CHAT));
    }

    #[tokio::test]
    async fn start_shows_menu_and_awaits_question() {
        let (ctl, _) = controller("hola");
        let surface = RecordingSurface::default();

        let state = ctl.handle(CHAT, DialogueEvent::Start, &surface).await.unwrap();

        assert_eq!(state, DialogueState::AwaitQuestion);
        match &surface.sent()[0] {
            Sent::Buttons(text, data) => {
                assert_eq!(text, render::MENU);
                assert_eq!(data.len(), 5);
            }
            other => panic!("expected menu, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn consulta_loops_until_cancelled() {
        let (ctl, mock) = controller("Usa un molino de muelas.");
        let surface = RecordingSurface::default();

        ctl.handle(CHAT, DialogueEvent::Start, &surface).await.unwrap();
        ctl.handle(CHAT, callback(MenuChoice::Consulta), &surface).await.unwrap();
        assert_eq!(ctl.sessions().get(CHAT).unwrap().mode, Some(AssistantMode::Consulta));

        for _ in 0..2 {
            let state = ctl
                .handle(CHAT, DialogueEvent::Text("¿Qué molino compro?".into()), &surface)
                .await
                .unwrap();
            assert_eq!(state, DialogueState::AwaitQuestion);
        }
        assert_eq!(mock.requests().len(), 2);
        assert!(surface
            .sent()
            .contains(&Sent::Text(render::answer("Usa un molino de muelas."))));
        assert_eq!(
            surface.sent().last(),
            Some(&Sent::Buttons(
                render::FOLLOW_UP.to_string(),
                vec!["ia_consulta".into(), "ia_cancelar".into()]
            ))
        );

        let state = ctl.handle(CHAT, callback(MenuChoice::Cancelar), &surface).await.unwrap();
        assert_eq!(state, DialogueState::End);
        assert_eq!(surface.last_text(), render::CANCELLED);
        assert!(!ctl.is_active(CHAT));
    }

    #[tokio::test]
    async fn question_failure_stays_in_question_loop() {
        let mock = Arc::new(MockProvider::new("mock").failing("connection reset"));
        let ctl = controller_with(ModelGateway::new(mock, "gpt-test"), MemoryRecordStore::new());
        let surface = RecordingSurface::default();

        ctl.handle(CHAT, DialogueEvent::Start, &surface).await.unwrap();
        let state = ctl
            .handle(CHAT, DialogueEvent::Text("¿Hola?".into()), &surface)
            .await
            .unwrap();

        assert_eq!(state, DialogueState::AwaitQuestion);
        let answer = surface
            .sent()
            .into_iter()
            .find_map(|s| match s {
                Sent::Text(t) if t.starts_with("☕ *Respuesta:*") => Some(t),
                _ => None,
            })
            .unwrap();
        assert!(answer.contains("connection reset"));
    }

    #[tokio::test]
    async fn analysis_is_single_shot() {
        let mut row = Record::new();
        row.insert("kg".into(), serde_json::json!(40));
        let store = MemoryRecordStore::new().with_records(Dataset::Compras, vec![row]);
        let mock = Arc::new(MockProvider::new("mock").with_response("Las compras suben."));
        let ctl = controller_with(ModelGateway::new(mock.clone(), "gpt-test"), store);
        let surface = RecordingSurface::default();

        ctl.handle(CHAT, DialogueEvent::Start, &surface).await.unwrap();
        let state = ctl.handle(CHAT, callback(MenuChoice::Analisis), &surface).await.unwrap();

        assert_eq!(state, DialogueState::End);
        assert_eq!(surface.last_text(), render::analysis("Las compras suben."));
        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, 0.3);
        assert!(requests[0].user_prompt.contains("\"kg\": 40"));
    }

    #[tokio::test]
    async fn analysis_store_failure_renders_one_error_and_ends() {
        let store = MemoryRecordStore::new().failing_on(Dataset::Gastos);
        let mock = Arc::new(MockProvider::new("mock").with_response("unused"));
        let ctl = controller_with(ModelGateway::new(mock.clone(), "gpt-test"), store);
        let surface = RecordingSurface::default();

        ctl.handle(CHAT, DialogueEvent::Start, &surface).await.unwrap();
        let before = surface.sent().len();
        let state = ctl.handle(CHAT, callback(MenuChoice::Analisis), &surface).await.unwrap();

        assert_eq!(state, DialogueState::End);
        let sent = surface.sent();
        let errors: Vec<_> = sent[before..]
            .iter()
            .filter(|s| matches!(s, Sent::Edit(t) if t.starts_with("Lo siento")))
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(surface.last_text().contains("gastos"));
        assert!(mock.requests().is_empty());
        assert!(!ctl.is_active(CHAT));
    }

    #[tokio::test]
    async fn recommendation_wraps_preferences_and_ends() {
        let (ctl, mock) = controller("Prueba un Etiopía lavado.");
        let surface = RecordingSurface::default();

        ctl.handle(CHAT, DialogueEvent::Start, &surface).await.unwrap();
        let state = ctl
            .handle(CHAT, callback(MenuChoice::Recomendacion), &surface)
            .await
            .unwrap();
        assert_eq!(state, DialogueState::AwaitPreferences);

        let state = ctl
            .handle(CHAT, DialogueEvent::Text("acidez alta, V60".into()), &surface)
            .await
            .unwrap();

        assert_eq!(state, DialogueState::End);
        assert_eq!(
            surface.last_text(),
            render::recommendations("Prueba un Etiopía lavado.")
        );
        let request = &mock.requests()[0];
        assert_eq!(request.temperature, 0.6);
        assert!(request.user_prompt.contains("acidez alta, V60"));
        assert!(request.user_prompt.contains("Negocio de café"));
    }

    #[tokio::test]
    async fn pricing_success_renders_each_product() {
        let (ctl, _) = controller(
            r#"```json
[{"producto": "Arábica", "precio_actual": 120, "precio_recomendado": 132, "justificacion": "margen 30%"},
 {"producto": "Robusta", "precio_actual": 90, "precio_recomendado": 95, "justificacion": "competencia"}]
```"#,
        );
        let surface = RecordingSurface::default();

        ctl.handle(CHAT, DialogueEvent::Start, &surface).await.unwrap();
        let state = ctl.handle(CHAT, callback(MenuChoice::Precios), &surface).await.unwrap();
        assert_eq!(state, DialogueState::AwaitOptimizationData);

        let text = "Producto: Arábica\nPrecio actual: 120\nCosto: 80\nMargen deseado: 30%\n\nProducto: Robusta\nPrecio actual: 90";
        let state = ctl
            .handle(CHAT, DialogueEvent::Text(text.into()), &surface)
            .await
            .unwrap();

        assert_eq!(state, DialogueState::End);
        let reply = surface.last_text();
        assert!(reply.contains("*Arábica*"));
        assert!(reply.contains("Precio recomendado: $132"));
        assert!(reply.contains("*Robusta*"));
    }

    #[tokio::test]
    async fn pricing_without_products_skips_model() {
        let (ctl, mock) = controller("unused");
        let surface = RecordingSurface::default();

        ctl.handle(CHAT, DialogueEvent::Start, &surface).await.unwrap();
        ctl.handle(CHAT, callback(MenuChoice::Precios), &surface).await.unwrap();
        let state = ctl
            .handle(CHAT, DialogueEvent::Text("Arábica a 120".into()), &surface)
            .await
            .unwrap();

        assert_eq!(state, DialogueState::End);
        assert!(mock.requests().is_empty());
        assert!(surface.last_text().contains("No se pudieron extraer datos de productos"));
    }

    #[tokio::test]
    async fn pricing_malformed_output_ends_with_error() {
        let (ctl, _) = controller("Sube todo un 10%.");
        let surface = RecordingSurface::default();

        ctl.handle(CHAT, DialogueEvent::Start, &surface).await.unwrap();
        ctl.handle(CHAT, callback(MenuChoice::Precios), &surface).await.unwrap();
        let state = ctl
            .handle(CHAT, DialogueEvent::Text("Producto: Geisha\nPrecio actual: 300".into()), &surface)
            .await
            .unwrap();

        assert_eq!(state, DialogueState::End);
        assert!(surface.last_text().starts_with("Lo siento, ocurrió un error al procesar los datos de precios"));
    }

    #[tokio::test]
    async fn cancel_command_ends_from_any_state() {
        let (ctl, _) = controller("ok");
        let surface = RecordingSurface::default();

        ctl.handle(CHAT, DialogueEvent::Start, &surface).await.unwrap();
        ctl.handle(CHAT, callback(MenuChoice::Recomendacion), &surface).await.unwrap();
        let state = ctl.handle(CHAT, DialogueEvent::Cancel, &surface).await.unwrap();

        assert_eq!(state, DialogueState::End);
        assert_eq!(surface.last_text(), render::CANCELLED);
        assert!(!ctl.is_active(CHAT));

        // Acknowledged even with nothing open.
        let state = ctl.handle(CHAT, DialogueEvent::Cancel, &surface).await.unwrap();
        assert_eq!(state, DialogueState::End);
    }

    #[tokio::test]
    async fn menu_buttons_ignored_while_awaiting_other_input() {
        let (ctl, mock) = controller("ok");
        let surface = RecordingSurface::default();

        ctl.handle(CHAT, DialogueEvent::Start, &surface).await.unwrap();
        ctl.handle(CHAT, callback(MenuChoice::Precios), &surface).await.unwrap();
        let sent_before = surface.sent().len();

        let state = ctl.handle(CHAT, callback(MenuChoice::Analisis), &surface).await.unwrap();

        assert_eq!(state, DialogueState::AwaitOptimizationData);
        assert_eq!(surface.sent().len(), sent_before);
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn text_without_session_is_ignored() {
        let (ctl, mock) = controller("ok");
        let surface = RecordingSurface::default();

        let state = ctl
            .handle(CHAT, DialogueEvent::Text("hola".into()), &surface)
            .await
            .unwrap();

        assert_eq!(state, DialogueState::End);
        assert!(surface.sent().is_empty());
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn unknown_callback_keeps_session() {
        let (ctl, _) = controller("ok");
        let surface = RecordingSurface::default();

        ctl.handle(CHAT, DialogueEvent::Start, &surface).await.unwrap();
        let state = ctl
            .handle(CHAT, DialogueEvent::Callback("otro_boton".into()), &surface)
            .await
            .unwrap();
        assert_eq!(state, DialogueState::AwaitQuestion);
    }

    #[tokio::test]
    async fn sessions_do_not_leak_between_chats() {
        let (ctl, _) = controller("ok");
        let surface = RecordingSurface::default();

        ctl.handle("tg-1-1", DialogueEvent::Start, &surface).await.unwrap();
        ctl.handle("tg-1-1", callback(MenuChoice::Recomendacion), &surface)
            .await
            .unwrap();
        ctl.handle("tg-2-2", DialogueEvent::Start, &surface).await.unwrap();

        assert_eq!(
            ctl.sessions().get("tg-1-1").unwrap().state,
            DialogueState::AwaitPreferences
        );
        assert_eq!(
            ctl.sessions().get("tg-2-2").unwrap().state,
            DialogueState::AwaitQuestion
        );
    }

    fn failing_controller(message: &str) -> (DialogueController, Arc<MockProvider>) {
        let mock = Arc::new(MockProvider::new("mock").failing(message));
        let gateway = ModelGateway::new(mock.clone(), "gpt-test");
        (controller_with(gateway, MemoryRecordStore::new()), mock)
    }

    #[tokio::test]
    async fn undelivered_reply_still_ends_the_turn() {
        let (ctl, mock) = controller("Prueba un Etiopía lavado.");
        let surface = RecordingSurface::rejecting("Recomendaciones personalizadas");

        ctl.handle(CHAT, DialogueEvent::Start, &surface).await.unwrap();
        ctl.handle(CHAT, callback(MenuChoice::Recomendacion), &surface)
            .await
            .unwrap();
        let result = ctl
            .handle(CHAT, DialogueEvent::Text("acidez alta".into()), &surface)
            .await;

        assert!(result.is_err());
        assert!(ctl.sessions().get(CHAT).is_none());

        // Retyping after the failure does not call the model again.
        let state = ctl
            .handle(CHAT, DialogueEvent::Text("acidez alta".into()), &surface)
            .await
            .unwrap();
        assert_eq!(state, DialogueState::End);
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn undelivered_prompt_keeps_the_new_state() {
        let (ctl, _) = controller("ok");
        let surface = RecordingSurface::rejecting("Optimización de precios*");

        ctl.handle(CHAT, DialogueEvent::Start, &surface).await.unwrap();
        let result = ctl.handle(CHAT, callback(MenuChoice::Precios), &surface).await;

        assert!(result.is_err());
        assert_eq!(
            ctl.sessions().get(CHAT).unwrap().state,
            DialogueState::AwaitOptimizationData
        );
    }

    #[tokio::test]
    async fn analysis_model_failure_renders_apology_and_ends() {
        let mut row = Record::new();
        row.insert("monto".into(), serde_json::json!(1500));
        let store = MemoryRecordStore::new().with_records(Dataset::Ventas, vec![row]);
        let mock = Arc::new(MockProvider::new("mock").failing("503 service unavailable"));
        let ctl = controller_with(ModelGateway::new(mock, "gpt-test"), store);
        let surface = RecordingSurface::default();

        ctl.handle(CHAT, DialogueEvent::Start, &surface).await.unwrap();
        let state = ctl.handle(CHAT, callback(MenuChoice::Analisis), &surface).await.unwrap();

        assert_eq!(state, DialogueState::End);
        let reply = surface.last_text();
        assert!(reply.starts_with("📊 *Análisis de datos*\n\nLo siento, no pude generar una respuesta"));
        assert!(reply.contains("503 service unavailable"));
        assert!(!ctl.is_active(CHAT));
    }

    #[tokio::test]
    async fn recommendation_model_failure_renders_apology_and_ends() {
        let (ctl, _) = failing_controller("invalid api key");
        let surface = RecordingSurface::default();

        ctl.handle(CHAT, DialogueEvent::Start, &surface).await.unwrap();
        ctl.handle(CHAT, callback(MenuChoice::Recomendacion), &surface)
            .await
            .unwrap();
        let state = ctl
            .handle(CHAT, DialogueEvent::Text("suave, prensa francesa".into()), &surface)
            .await
            .unwrap();

        assert_eq!(state, DialogueState::End);
        let reply = surface.last_text();
        assert!(reply.starts_with("☕ *Recomendaciones personalizadas:*\n\nLo siento"));
        assert!(reply.contains("invalid api key"));
        assert!(!ctl.is_active(CHAT));
    }

    #[tokio::test]
    async fn pricing_model_failure_renders_pricing_error_and_ends() {
        let (ctl, mock) = failing_controller("429 rate limited");
        let surface = RecordingSurface::default();

        ctl.handle(CHAT, DialogueEvent::Start, &surface).await.unwrap();
        ctl.handle(CHAT, callback(MenuChoice::Precios), &surface).await.unwrap();
        let state = ctl
            .handle(CHAT, DialogueEvent::Text("Producto: Arábica\nPrecio actual: 120".into()), &surface)
            .await
            .unwrap();

        assert_eq!(state, DialogueState::End);
        assert_eq!(mock.requests().len(), 1);
        let reply = surface.last_text();
        assert!(reply.starts_with("Lo siento, ocurrió un error al procesar los datos de precios"));
        assert!(reply.contains("429 rate limited"));
        assert!(reply.ends_with("formato especificado."));
        assert!(!ctl.is_active(CHAT));
    }
}
