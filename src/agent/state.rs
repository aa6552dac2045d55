//! Conversation state carried across loop iterations.

use crate::llm::{Message, ToolCall};

/// Ordered, append-only message history.
///
/// There is no way to remove or reorder messages; pushing is the only
/// mutation.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// A conversation holding a single user message with the start URL.
    pub fn seeded(start_url: &str) -> Self {
        let mut conversation = Self::new();
        conversation.push(Message::user(start_url));
        conversation
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Tool calls requested by the latest message, if it is an assistant reply.
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        self.last()
            .and_then(Message::as_assistant)
            .map(|reply| reply.tool_calls.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{AssistantMessage, Role};

    #[test]
    fn test_seeded_conversation() {
        let conversation = Conversation::seeded("http://site/quiz/1");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.last(), Some(&Message::user("http://site/quiz/1")));
        assert_eq!(conversation.last().unwrap().role(), Role::User);
    }

    #[test]
    fn test_push_appends_in_order() {
        let mut conversation = Conversation::seeded("http://site/quiz/1");
        conversation.push(Message::Assistant(AssistantMessage::text("thinking")));
        conversation.push(Message::tool_result("c1", "run_code", "42", false));

        let roles: Vec<Role> = conversation.messages().iter().map(Message::role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool]);
    }

    #[test]
    fn test_pending_tool_calls() {
        let mut conversation = Conversation::seeded("http://site/quiz/1");
        assert!(conversation.pending_tool_calls().is_empty());

        conversation.push(Message::Assistant(AssistantMessage::with_tool_calls(vec![ToolCall::new(
            "c1",
            "get_rendered_html",
            serde_json::json!({"url": "http://site/quiz/1"}),
        )])));
        assert_eq!(conversation.pending_tool_calls().len(), 1);

        conversation.push(Message::tool_result("c1", "get_rendered_html", "<html/>", false));
        assert!(conversation.pending_tool_calls().is_empty());
    }

    #[test]
    fn test_empty_conversation() {
        let conversation = Conversation::new();
        assert!(conversation.is_empty());
        assert!(conversation.last().is_none());
    }
}
