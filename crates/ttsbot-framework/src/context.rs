//! Per-message invocation context.

use std::sync::Arc;

use ttsbot_core::{Author, Message, Venue};

use crate::instance::Instance;

/// Where a command was invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// A shared venue (guild).
    Guild(Venue),
    /// A private conversation with the bot.
    Direct,
}

/// Everything a check or command needs to know about one invocation.
///
/// Built by the dispatcher once the prefix has been resolved and the message
/// content starts with it. `trigger` is the content with the prefix removed.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    instance: Arc<Instance>,
    message: Message,
    prefix: String,
    scope: Scope,
}

impl InvocationContext {
    /// Creates a context for a message that starts with `prefix`.
    pub fn new(instance: Arc<Instance>, message: Message, prefix: impl Into<String>) -> Self {
        let scope = match &message.venue {
            Some(venue) => Scope::Guild(venue.clone()),
            None => Scope::Direct,
        };
        Self {
            instance,
            message,
            prefix: prefix.into(),
            scope,
        }
    }

    /// The process-wide instance.
    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }

    /// The triggering message.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// The message author.
    pub fn author(&self) -> &Author {
        &self.message.author
    }

    /// The prefix that matched.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Message content after the prefix.
    pub fn trigger(&self) -> &str {
        self.message
            .content
            .strip_prefix(self.prefix.as_str())
            .unwrap_or(&self.message.content)
    }

    /// First word of the trigger.
    pub fn command_name(&self) -> &str {
        self.trigger().split_whitespace().next().unwrap_or_default()
    }

    /// Remaining words of the trigger.
    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.trigger().split_whitespace().skip(1)
    }

    /// Invocation scope.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// The venue, if invoked in one.
    pub fn venue(&self) -> Option<&Venue> {
        match &self.scope {
            Scope::Guild(venue) => Some(venue),
            Scope::Direct => None,
        }
    }

    /// Returns `true` if invoked in a shared venue.
    pub fn is_guild(&self) -> bool {
        matches!(self.scope, Scope::Guild(_))
    }
}
