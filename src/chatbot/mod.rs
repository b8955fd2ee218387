//! Scripted museum chatbot.
//! Button ids (`btn_*`) go straight to a fixed reply; free text is matched
//! against an ordered rule list where the first match wins. Each call is a
//! pure function of (input, login flag) apart from random greeting choice.

pub mod replies;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Prefix that marks an input as a button click rather than typed text.
pub const BUTTON_PREFIX: &str = "btn_";

/// Suggested next action shown as a button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatButton {
    pub id: String,
    pub label: String,
}

/// Navigation the client should perform after showing the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavAction {
    RedirectLogin,
    RedirectRegister,
    RedirectBooking,
    RedirectMyTickets,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
    pub buttons: Vec<ChatButton>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<NavAction>,
}

impl ChatReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
            action: None,
        }
    }

    pub fn button(mut self, id: &str, label: &str) -> Self {
        self.buttons.push(ChatButton {
            id: id.to_string(),
            label: label.to_string(),
        });
        self
    }

    pub fn navigate(mut self, action: NavAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn button_ids(&self) -> Vec<&str> {
        self.buttons.iter().map(|b| b.id.as_str()).collect()
    }
}

/// What a handler may branch on.
#[derive(Debug, Clone, Copy, Default)]
pub struct DialogueContext {
    pub logged_in: bool,
}

pub type Handler = fn(&DialogueContext) -> ChatReply;

struct DialogueRule {
    name: &'static str,
    pattern: Regex,
    handler: Handler,
}

/// Rule table in priority order. Reordering changes which reply wins.
const RULES: [(&str, &str, Handler); 13] = [
    ("greeting", r"\b(hello|hi|hey|good morning|good evening|start)\b", replies::greeting),
    ("help", r"\b(help|support|assist|what can you do)\b", replies::help),
    ("booking", r"(book.*ticket|reserve.*ticket|buy.*ticket|want.*book|booking)", replies::booking),
    ("login", r"(login|log in|sign in|already registered|have account)", replies::login),
    ("register", r"(register|sign up|create account|new user|new account)", replies::register),
    (
        "view_tickets",
        r"(view.*ticket|my.*ticket|see.*ticket|check.*booking)",
        replies::view_tickets,
    ),
    ("cancel", r"(cancel.*ticket|refund|delete.*ticket)", replies::cancel),
    ("pricing", r"(price|cost|pricing|fee|rates|charges)", replies::pricing),
    ("timings", r"(timing|time|hours|open|closing|schedule)", replies::timings),
    ("contact", r"(location|address|where|contact|phone)", replies::contact),
    ("services", r"(services|facilities|amenities|features)", replies::services),
    ("policies", r"(policy|policies|rules|guidelines|terms)", replies::policies),
    ("goodbye", r"\b(bye|goodbye|see you|thanks|thank you|exit)\b", replies::goodbye),
];

pub struct Chatbot {
    rules: Vec<DialogueRule>,
}

impl Chatbot {
    /// Compile the rule table.
    pub fn new() -> Result<Self, regex::Error> {
        let rules = RULES
            .iter()
            .map(|&(name, pattern, handler)| {
                Ok(DialogueRule {
                    name,
                    pattern: Regex::new(pattern)?,
                    handler,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// Reply to one chat message.
    pub fn respond(&self, input: &str, logged_in: bool) -> ChatReply {
        let message = input.trim().to_lowercase();
        let ctx = DialogueContext { logged_in };

        if message.starts_with(BUTTON_PREFIX) {
            return replies::button(&message).unwrap_or_else(replies::fallback);
        }

        match self.rules.iter().find(|r| r.pattern.is_match(&message)) {
            Some(rule) => {
                debug!(rule = rule.name, logged_in, "chat rule matched");
                (rule.handler)(&ctx)
            }
            None => replies::fallback(),
        }
    }

    /// Name of the rule that free text would dispatch to.
    pub fn matched_rule(&self, input: &str) -> Option<&'static str> {
        let message = input.trim().to_lowercase();
        self.rules
            .iter()
            .find(|r| r.pattern.is_match(&message))
            .map(|r| r.name)
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }
}
