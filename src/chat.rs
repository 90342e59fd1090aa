pub const WELCOME: &str = "Hello! I'm your typing assistant. Ask me anything about typing skills, techniques, or how to improve your speed and accuracy.";

pub const PENDING_TEXT: &str = "Typing...";

pub const FALLBACK_REPLY: &str =
    "Sorry, I encountered an error processing your request. Please try again.";

pub const SUGGESTED_QUESTIONS: [&str; 10] = [
    "How can I improve my typing speed?",
    "What is a good typing speed?",
    "How to measure typing accuracy?",
    "What is touch typing?",
    "How should I position my hands on the keyboard?",
    "What typing exercises do you recommend?",
    "What are common keyboard shortcuts?",
    "How do I type without looking at the keyboard?",
    "What is the proper typing posture?",
    "How can I reduce typing fatigue?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    pub pending: bool,
}

/// Ordered conversation, starting with the welcome message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage {
                sender: Sender::Bot,
                text: WELCOME.to_string(),
                pending: false,
            }],
        }
    }

    pub fn push_user(&mut self, text: &str) {
        self.messages.push(ChatMessage {
            sender: Sender::User,
            text: text.to_string(),
            pending: false,
        });
    }

    /// Add a "Typing..." placeholder; returns its slot
    pub fn push_pending(&mut self) -> usize {
        self.messages.push(ChatMessage {
            sender: Sender::Bot,
            text: PENDING_TEXT.to_string(),
            pending: true,
        });
        self.messages.len() - 1
    }

    /// Replace a placeholder with the bot's reply. Unknown or already
    /// resolved slots are left alone.
    pub fn resolve(&mut self, slot: usize, text: &str) -> bool {
        match self.messages.get_mut(slot) {
            Some(msg) if msg.pending => {
                msg.text = text.to_string();
                msg.pending = false;
                true
            }
            _ => false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn has_pending(&self) -> bool {
        self.messages.iter().any(|m| m.pending)
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a reply into display lines. Numbered steps such as `1)` start a
/// new bulleted line, even when the backend sends them inline.
pub fn format_reply(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for line in text.lines() {
        let mut segments: Vec<Vec<&str>> = vec![Vec::new()];
        for word in line.split_whitespace() {
            if is_step_marker(word) && segments.last().is_some_and(|s| !s.is_empty()) {
                segments.push(Vec::new());
            }
            if let Some(segment) = segments.last_mut() {
                segment.push(word);
            }
        }
        for segment in segments {
            let joined = segment.join(" ");
            match segment.first() {
                Some(first) if is_step_marker(first) => lines.push(format!("• {joined}")),
                _ => lines.push(joined),
            }
        }
    }
    lines
}

fn is_step_marker(word: &str) -> bool {
    let digits = word.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && &word[digits..] == ")"
}
