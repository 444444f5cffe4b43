use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::floorplan::ViewMode;
use crate::gemini::{ConsultResponse, GeminiClient};
use crate::session::{Consultation, Session, EXAMPLE_PROMPTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Chat,
    Workspace,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,
    pub session: Session,

    // Chrome
    pub sidebar_open: bool,
    pub view_mode: ViewMode,
    pub status: Option<String>,

    // Prompt input
    pub input: String,
    pub input_cursor: usize, // cursor position in chars
    pub selected_example: usize,

    // Transcript scrolling
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of the transcript, set during render
    pub chat_total_lines: u16,
    pub follow_transcript: bool,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // In-flight consultation
    pub consult_task: Option<JoinHandle<ConsultResponse>>,
    pub gemini: GeminiClient,

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub workspace_area: Option<Rect>,

    // Click targets (updated during render)
    pub example_areas: Vec<Rect>,
    pub new_draft_area: Option<Rect>,
    pub sidebar_toggle_area: Option<Rect>,
}

impl App {
    pub fn new(gemini: GeminiClient) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Chat,
            session: Session::new(),

            sidebar_open: true,
            view_mode: ViewMode::default(),
            status: None,

            input: String::new(),
            input_cursor: 0,
            selected_example: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_total_lines: 0,
            follow_transcript: true,

            animation_frame: 0,

            consult_task: None,
            gemini,

            chat_area: None,
            workspace_area: None,

            example_areas: Vec::new(),
            new_draft_area: None,
            sidebar_toggle_area: None,
        }
    }

    /// Sends the typed prompt. Input is kept when the session refuses it.
    pub fn submit_input(&mut self) -> bool {
        match self.session.submit(&self.input) {
            Some(consultation) => {
                self.input.clear();
                self.input_cursor = 0;
                self.dispatch(consultation);
                true
            }
            None => false,
        }
    }

    pub fn submit_example(&mut self, index: usize) -> bool {
        match self.session.submit_example(index) {
            Some(consultation) => {
                self.dispatch(consultation);
                true
            }
            None => false,
        }
    }

    fn dispatch(&mut self, consultation: Consultation) {
        info!(
            prompt_chars = consultation.prompt.chars().count(),
            history = consultation.history.len(),
            "dispatching consultation"
        );
        self.status = None;
        self.follow_transcript = true;

        let gemini = self.gemini.clone();
        self.consult_task = Some(tokio::spawn(async move {
            gemini
                .consult(&consultation.prompt, &consultation.history)
                .await
        }));
    }

    /// Folds a finished request back into the session. Called on every tick.
    pub async fn poll_consultation(&mut self) {
        let finished = self
            .consult_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.consult_task.take() {
            let response = match task.await {
                Ok(response) => response,
                Err(err) => {
                    error!(error = %err, "consultation task failed");
                    ConsultResponse::fallback()
                }
            };
            self.session.resolve(response);
            self.follow_transcript = true;
        }
    }

    pub fn is_busy(&self) -> bool {
        self.session.is_loading()
    }

    pub fn new_draft(&mut self) {
        if self.session.new_draft() {
            self.input.clear();
            self.input_cursor = 0;
            self.selected_example = 0;
            self.chat_scroll = 0;
            self.follow_transcript = true;
            self.status = None;
            info!("started a new draft");
        } else {
            self.status = Some("Wait for the architect to finish before starting a new draft".to_string());
        }
    }

    pub fn toggle_view_mode(&mut self) {
        self.view_mode = self.view_mode.toggle();
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::Chat => FocusPane::Workspace,
            FocusPane::Workspace => FocusPane::Chat,
        };
    }

    // Example prompt picker (empty transcript only)
    pub fn example_down(&mut self) {
        self.selected_example = (self.selected_example + 1).min(EXAMPLE_PROMPTS.len() - 1);
    }

    pub fn example_up(&mut self) {
        self.selected_example = self.selected_example.saturating_sub(1);
    }

    // Transcript scrolling
    fn max_scroll(&self) -> u16 {
        self.chat_total_lines.saturating_sub(self.chat_height)
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_scroll());
        self.follow_transcript = self.chat_scroll >= self.max_scroll();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_transcript = self.chat_scroll >= self.max_scroll();
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
        self.follow_transcript = self.max_scroll() == 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
        self.follow_transcript = true;
    }

    /// Records the transcript size measured during render and keeps the
    /// view pinned to the bottom while following.
    pub fn update_transcript_metrics(&mut self, total_lines: u16, height: u16) {
        self.chat_total_lines = total_lines;
        self.chat_height = height;
        if self.follow_transcript {
            self.chat_scroll = self.max_scroll();
        } else {
            self.chat_scroll = self.chat_scroll.min(self.max_scroll());
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::FAILURE_MESSAGE;
    use crate::model::Role;

    fn offline_app() -> App {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        // Nothing listens on port 1, so every consultation falls back.
        App::new(GeminiClient::with_http_client(
            http,
            "http://127.0.0.1:1",
            "test-model",
            Some("test-key".to_string()),
        ))
    }

    async fn settle(app: &mut App) {
        for _ in 0..200 {
            app.poll_consultation().await;
            if !app.is_busy() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("consultation never finished");
    }

    #[tokio::test]
    async fn test_blank_input_is_not_submitted() {
        let mut app = offline_app();
        app.input = "   ".to_string();
        app.input_cursor = 3;

        assert!(!app.submit_input());
        assert!(app.session.is_empty());
        assert!(app.consult_task.is_none());
        assert_eq!(app.input, "   ");
    }

    #[tokio::test]
    async fn test_failed_consultation_lands_in_transcript() {
        let mut app = offline_app();
        app.input = "Design a cabin".to_string();
        assert!(app.submit_input());
        assert!(app.input.is_empty());
        assert!(app.is_busy());

        settle(&mut app).await;

        let messages = app.session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::Model);
        assert_eq!(messages[1].text, FAILURE_MESSAGE);
        assert!(app.consult_task.is_none());
    }

    #[tokio::test]
    async fn test_second_submit_while_busy_keeps_input() {
        let mut app = offline_app();
        app.input = "first".to_string();
        assert!(app.submit_input());

        app.input = "second".to_string();
        assert!(!app.submit_input());
        assert_eq!(app.input, "second");
        assert_eq!(app.session.messages().len(), 1);

        settle(&mut app).await;
        assert!(app.submit_input());
        settle(&mut app).await;
        assert_eq!(app.session.messages().len(), 4);
    }

    #[tokio::test]
    async fn test_example_prompt_is_submitted() {
        let mut app = offline_app();
        assert!(app.submit_example(1));
        assert_eq!(app.session.messages()[0].text, EXAMPLE_PROMPTS[1]);
        settle(&mut app).await;
    }

    #[tokio::test]
    async fn test_new_draft_refused_while_busy() {
        let mut app = offline_app();
        app.input = "plan".to_string();
        app.submit_input();

        app.new_draft();
        assert!(app.status.is_some());
        assert_eq!(app.session.messages().len(), 1);

        settle(&mut app).await;
        app.new_draft();
        assert!(app.status.is_none());
        assert!(app.session.is_empty());
    }

    #[test]
    fn test_view_mode_toggle_round_trips() {
        let mut app = offline_app();
        let original = app.view_mode;
        app.toggle_view_mode();
        assert_ne!(app.view_mode, original);
        app.toggle_view_mode();
        assert_eq!(app.view_mode, original);
    }

    #[test]
    fn test_scroll_follows_bottom() {
        let mut app = offline_app();

        app.update_transcript_metrics(50, 10);
        assert_eq!(app.chat_scroll, 40);

        app.scroll_up(5);
        assert!(!app.follow_transcript);
        app.update_transcript_metrics(60, 10);
        assert_eq!(app.chat_scroll, 35);

        app.scroll_down(100);
        assert!(app.follow_transcript);
        assert_eq!(app.chat_scroll, 50);
    }

    #[test]
    fn test_example_selection_is_clamped() {
        let mut app = offline_app();
        app.example_up();
        assert_eq!(app.selected_example, 0);
        for _ in 0..10 {
            app.example_down();
        }
        assert_eq!(app.selected_example, EXAMPLE_PROMPTS.len() - 1);
    }
}
