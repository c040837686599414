//! A chat backend that reads messages from stdin.
//!
//! Every line becomes a message from the operator in the configured main
//! server. Lines starting with `dm ` are delivered as direct messages instead.
//! End of input ends the serve loop.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Notify;
use tracing::info;

use ttsbot::core::{MessageId, UserId, VenueId};
use ttsbot::prelude::*;

const OPERATOR: (u64, &str) = (1, "operator");

pub struct ConsoleBackend {
    user: CurrentUser,
    venue: VenueId,
    closed: Notify,
}

impl ConsoleBackend {
    pub fn new(venue: VenueId) -> Self {
        Self {
            user: CurrentUser {
                id: UserId(513423712582762502),
                name: "TTS Bot#0001".into(),
            },
            venue,
            closed: Notify::new(),
        }
    }

    fn parse(&self, id: u64, line: String) -> Message {
        let (id, author) = (MessageId(id), Author::user(OPERATOR.0, OPERATOR.1));
        match line.strip_prefix("dm ") {
            Some(content) => Message::direct(id, author, content),
            None => Message::in_venue(id, author, Venue::new(self.venue), line),
        }
    }
}

#[async_trait]
impl ChatBackend for ConsoleBackend {
    async fn start(&self, session: ChatSession) -> BackendResult<()> {
        if session.token.is_empty() {
            return Err(BackendError::rejected(
                BackendKind::Chat,
                "improper token has been passed",
            ));
        }

        info!(
            activity = %session.presence.name,
            kind = ?session.presence.kind,
            "Console session opened"
        );
        session.ready.notify(self.user.clone());

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut next_id = 1;
        loop {
            tokio::select! {
                () = self.closed.notified() => return Ok(()),
                line = lines.next_line() => match line {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => {
                        session.dispatcher.dispatch(self.parse(next_id, line)).await;
                        next_id += 1;
                    }
                    Ok(None) => {
                        info!("Console input closed");
                        return Ok(());
                    }
                    Err(e) => {
                        return Err(BackendError::unavailable(BackendKind::Chat, e.to_string()));
                    }
                },
            }
        }
    }

    async fn close(&self) -> BackendResult<()> {
        self.closed.notify_one();
        Ok(())
    }
}
