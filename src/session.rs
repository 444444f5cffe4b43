//! UI-agnostic session state.
//!
//! All mutations go through [`Session::submit`], [`Session::resolve`] and
//! [`Session::new_draft`], so the conversation can be driven in tests
//! without a terminal.

use tracing::debug;

use crate::gemini::ConsultResponse;
use crate::model::{ChatMessage, LayoutData};

pub const UNTITLED_PROJECT: &str = "Untitled Project";
pub const NEW_PROJECT: &str = "New Project";

/// Shown on an empty transcript; picking one behaves like typing it.
pub const EXAMPLE_PROMPTS: [&str; 4] = [
    "Minimalist studio loft layout",
    "Sustainable house materials",
    "Open concept kitchen ideas",
    "Small garden landscape plan",
];

/// A request ready to hand to the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct Consultation {
    pub prompt: String,
    /// Turns that preceded `prompt`.
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone)]
pub struct Session {
    messages: Vec<ChatMessage>,
    current_layout: Option<LayoutData>,
    loading: bool,
    project_name: String,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            current_layout: None,
            loading: false,
            project_name: UNTITLED_PROJECT.to_string(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn current_layout(&self) -> Option<&LayoutData> {
        self.current_layout.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Records the user turn and returns the request to dispatch.
    ///
    /// Returns `None` and leaves the session untouched for blank input or
    /// while another request is in flight.
    pub fn submit(&mut self, text: &str) -> Option<Consultation> {
        if text.trim().is_empty() {
            return None;
        }
        if self.loading {
            debug!("submission ignored while a consultation is in flight");
            return None;
        }

        let history = self.messages.clone();
        self.messages.push(ChatMessage::user(text));
        self.loading = true;

        Some(Consultation {
            prompt: text.to_string(),
            history,
        })
    }

    /// Submits the `index`th example prompt, if the transcript is still empty.
    pub fn submit_example(&mut self, index: usize) -> Option<Consultation> {
        if !self.is_empty() {
            return None;
        }
        let prompt = EXAMPLE_PROMPTS.get(index)?;
        self.submit(prompt)
    }

    /// Appends the model turn and promotes its layout, if any.
    pub fn resolve(&mut self, response: ConsultResponse) {
        let ConsultResponse {
            message,
            layout,
            sources,
        } = response;

        if let Some(layout) = &layout {
            if let Some(description) = &layout.description {
                self.project_name = description.clone();
            }
            self.current_layout = Some(layout.clone());
        }

        self.messages.push(ChatMessage::model(message, layout, sources));
        self.loading = false;
    }

    /// Starts over with an empty transcript and canvas. Refused while a
    /// request is in flight, since its reply would land in the new draft.
    pub fn new_draft(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.messages.clear();
        self.current_layout = None;
        self.project_name = NEW_PROJECT.to_string();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, Room, RoomType, Source};

    fn layout(description: Option<&str>) -> LayoutData {
        LayoutData {
            rooms: vec![Room {
                id: "r1".to_string(),
                name: "Loft".to_string(),
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 100.0,
                kind: RoomType::Living,
            }],
            total_width: 100.0,
            total_height: 100.0,
            description: description.map(str::to_string),
        }
    }

    fn reply(message: &str, layout: Option<LayoutData>) -> ConsultResponse {
        ConsultResponse {
            message: message.to_string(),
            layout,
            sources: Vec::new(),
        }
    }

    #[test]
    fn test_new_session_defaults() {
        let session = Session::new();
        assert!(session.is_empty());
        assert!(!session.is_loading());
        assert!(session.current_layout().is_none());
        assert_eq!(session.project_name(), UNTITLED_PROJECT);
    }

    #[test]
    fn test_blank_submission_is_noop() {
        let mut session = Session::new();
        assert_eq!(session.submit(""), None);
        assert_eq!(session.submit("   \t\n"), None);
        assert!(session.is_empty());
        assert!(!session.is_loading());
    }

    #[test]
    fn test_submit_appends_user_turn_and_sets_loading() {
        let mut session = Session::new();
        let consultation = session.submit("  Design a loft ").unwrap();

        assert_eq!(consultation.prompt, "  Design a loft ");
        assert!(consultation.history.is_empty());
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role, Role::User);
        assert!(session.is_loading());
    }

    #[test]
    fn test_submit_while_loading_is_noop_until_resolved() {
        let mut session = Session::new();
        session.submit("first").unwrap();

        assert_eq!(session.submit("second"), None);
        assert_eq!(session.messages().len(), 1);

        session.resolve(reply("answer", None));
        assert!(!session.is_loading());
        assert!(session.submit("second").is_some());
        assert_eq!(session.messages().len(), 3);
    }

    #[test]
    fn test_history_excludes_new_prompt() {
        let mut session = Session::new();
        session.submit("first").unwrap();
        session.resolve(reply("answer", None));

        let consultation = session.submit("second").unwrap();
        let texts: Vec<&str> = consultation.history.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "answer"]);
    }

    #[test]
    fn test_resolve_promotes_layout_and_title() {
        let mut session = Session::new();
        session.submit("plan").unwrap();
        session.resolve(reply("here", Some(layout(Some("Loft Plan")))));

        assert_eq!(session.project_name(), "Loft Plan");
        assert!(session.current_layout().is_some());
        let last = session.messages().last().unwrap();
        assert_eq!(last.role, Role::Model);
        assert!(last.layout.is_some());
    }

    #[test]
    fn test_layout_without_description_keeps_title() {
        let mut session = Session::new();
        session.submit("plan").unwrap();
        session.resolve(reply("here", Some(layout(None))));

        assert_eq!(session.project_name(), UNTITLED_PROJECT);
        assert!(session.current_layout().is_some());
    }

    #[test]
    fn test_reply_without_layout_keeps_current_layout() {
        let mut session = Session::new();
        session.submit("plan").unwrap();
        session.resolve(reply("here", Some(layout(Some("First")))));
        session.submit("materials?").unwrap();
        session.resolve(reply("use timber", None));

        assert_eq!(
            session.current_layout().and_then(|l| l.description.as_deref()),
            Some("First")
        );
    }

    #[test]
    fn test_new_layout_replaces_previous() {
        let mut session = Session::new();
        session.submit("plan").unwrap();
        session.resolve(reply("one", Some(layout(Some("First")))));
        session.submit("again").unwrap();
        session.resolve(reply("two", Some(layout(Some("Second")))));

        assert_eq!(
            session.current_layout().and_then(|l| l.description.as_deref()),
            Some("Second")
        );
        assert_eq!(session.project_name(), "Second");
    }

    #[test]
    fn test_resolve_keeps_sources_on_model_turn() {
        let mut session = Session::new();
        session.submit("codes?").unwrap();
        session.resolve(ConsultResponse {
            message: "see below".to_string(),
            layout: None,
            sources: vec![Source {
                title: "Code".to_string(),
                url: "https://codes.example".to_string(),
            }],
        });
        assert_eq!(session.messages()[1].sources.len(), 1);
    }

    #[test]
    fn test_fallback_reply_clears_loading() {
        let mut session = Session::new();
        session.submit("plan").unwrap();
        session.resolve(ConsultResponse::fallback());

        assert!(!session.is_loading());
        assert!(session.current_layout().is_none());
        assert_eq!(session.messages()[1].text, crate::gemini::FAILURE_MESSAGE);
    }

    #[test]
    fn test_example_prompt_submits_like_typed_text() {
        let mut typed = Session::new();
        let mut clicked = Session::new();

        let a = typed.submit(EXAMPLE_PROMPTS[2]).unwrap();
        let b = clicked.submit_example(2).unwrap();
        assert_eq!(a, b);
        assert_eq!(typed.messages(), clicked.messages());
    }

    #[test]
    fn test_example_prompts_only_on_empty_transcript() {
        let mut session = Session::new();
        assert_eq!(session.submit_example(9), None);
        session.submit("hello").unwrap();
        session.resolve(reply("hi", None));
        assert_eq!(session.submit_example(0), None);
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn test_new_draft_resets_session() {
        let mut session = Session::new();
        session.submit("plan").unwrap();
        session.resolve(reply("here", Some(layout(Some("Loft")))));

        assert!(session.new_draft());
        assert!(session.is_empty());
        assert!(session.current_layout().is_none());
        assert_eq!(session.project_name(), NEW_PROJECT);
    }

    #[test]
    fn test_new_draft_refused_while_loading() {
        let mut session = Session::new();
        session.submit("plan").unwrap();
        assert!(!session.new_draft());
        assert_eq!(session.messages().len(), 1);
    }
}
