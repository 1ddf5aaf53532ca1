use learn_core::Message;

/// Ordered history of one chat session.
///
/// The system prompt is not stored here; it is prepended when a request is
/// built so that `clear` never drops it.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
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

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Drop everything after the first `len` messages.
    pub fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }

    /// System prompt followed by the full history.
    pub fn request_messages(&self, system_prompt: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.push(Message::system(system_prompt));
        messages.extend(self.messages.iter().cloned());
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learn_core::MessageRole;

    #[test]
    fn test_request_messages_prepend_system() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("hi"));
        conversation.push(Message::assistant("hello"));

        let request = conversation.request_messages("be brief");
        assert_eq!(request.len(), 3);
        assert_eq!(request[0].role(), MessageRole::System);
        assert_eq!(request[0].content(), "be brief");
        assert_eq!(conversation.len(), 2);
    }

    #[test]
    fn test_truncate_and_clear() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("one"));
        conversation.push(Message::user("two"));
        conversation.push(Message::user("three"));

        conversation.truncate(1);
        assert_eq!(conversation.messages(), &[Message::user("one")]);

        conversation.clear();
        assert!(conversation.is_empty());
    }
}
