//! Message model consumed by the dispatch pipeline.
//!
//! The chat backend translates whatever its wire format is into a [`Message`]
//! before handing it to a [`MessageDispatcher`](crate::MessageDispatcher).

use serde::{Deserialize, Serialize};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the raw numeric identifier.
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake!(
    /// Identifier of a user or bot account.
    UserId
);
snowflake!(
    /// Identifier of a shared, multi-party venue (a guild).
    VenueId
);
snowflake!(
    /// Identifier of a single message.
    MessageId
);

/// The account that authored a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    /// Account identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Whether the account is an automated, non-human participant.
    pub bot: bool,
}

impl Author {
    /// Creates a human author.
    pub fn user(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bot: false,
        }
    }

    /// Creates an automated author.
    pub fn bot(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            bot: true,
            ..Self::user(id, name)
        }
    }
}

/// A shared venue a message originated in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Venue {
    /// Venue identifier.
    pub id: VenueId,
    /// Set while the chat service reports the venue as unavailable (outage).
    pub unavailable: bool,
}

impl Venue {
    /// Creates an available venue.
    pub fn new(id: impl Into<VenueId>) -> Self {
        Self {
            id: id.into(),
            unavailable: false,
        }
    }

    /// Marks the venue unavailable.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }
}

/// An incoming chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message identifier.
    pub id: MessageId,
    /// Who wrote it.
    pub author: Author,
    /// The venue, or `None` for a private conversation.
    pub venue: Option<Venue>,
    /// Raw text content.
    pub content: String,
}

impl Message {
    /// Creates a private (direct) message.
    pub fn direct(id: impl Into<MessageId>, author: Author, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            author,
            venue: None,
            content: content.into(),
        }
    }

    /// Creates a message sent in a shared venue.
    pub fn in_venue(
        id: impl Into<MessageId>,
        author: Author,
        venue: Venue,
        content: impl Into<String>,
    ) -> Self {
        Self {
            venue: Some(venue),
            ..Self::direct(id, author, content)
        }
    }

    /// Returns `true` if the message was sent in a shared venue.
    pub fn is_in_venue(&self) -> bool {
        self.venue.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_scope() {
        let author = Author::user(1, "alice");
        let direct = Message::direct(10, author.clone(), "hi");
        assert!(!direct.is_in_venue());

        let shared = Message::in_venue(11, author, Venue::new(99).unavailable(), "hi");
        assert!(shared.is_in_venue());
        assert!(shared.venue.as_ref().is_some_and(|v| v.unavailable));
    }

    #[test]
    fn test_snowflake_serde_is_transparent() {
        let ids: Vec<UserId> = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(ids, vec![UserId(1), UserId(2)]);
        assert_eq!(UserId(7).to_string(), "7");
    }
}
