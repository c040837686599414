//! The per-message dispatch pipeline.
//!
//! [`CommandDispatcher`] is what the chat backend hands every incoming
//! message to. For each message it:
//!
//! 1. drops messages written by automated accounts,
//! 2. resolves the command prefix through the [`PrefixResolver`],
//! 3. drops messages that do not start with that prefix,
//! 4. builds an [`InvocationContext`],
//! 5. runs every registered check in order, silently suppressing the
//!    command on the first one that returns `false`,
//! 6. calls the [`CommandInvoker`].
//!
//! Checks are enforced here once, so individual commands never repeat them.
//! [`only_available`] is always installed first.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{Instrument, debug, debug_span, error};

use ttsbot_core::{Message, MessageDispatcher};

use crate::context::InvocationContext;
use crate::instance::Instance;
use crate::prefix::PrefixResolver;

/// A dispatch precondition. Returning `false` suppresses the command.
pub type CheckFn = Arc<dyn Fn(&InvocationContext) -> bool + Send + Sync>;

/// Rejects invocations from a venue the chat service reports as unavailable.
pub fn only_available(ctx: &InvocationContext) -> bool {
    ctx.venue().is_none_or(|venue| !venue.unavailable)
}

/// Executes a command once every check has passed.
#[async_trait]
pub trait CommandInvoker: Send + Sync {
    /// Runs the command described by `ctx`.
    async fn invoke(&self, ctx: InvocationContext) -> anyhow::Result<()>;
}

/// What happened to a dispatched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Written by a bot or other automated account.
    IgnoredAutomatedAuthor,
    /// Did not start with the resolved prefix.
    NotACommand,
    /// A check returned `false`.
    Suppressed {
        /// Name of the check.
        check: &'static str,
    },
    /// The invoker ran and succeeded.
    Invoked,
    /// The invoker ran and returned an error.
    Failed,
}

#[derive(Clone)]
struct NamedCheck {
    name: &'static str,
    check: CheckFn,
}

#[derive(Clone)]
struct DispatcherInner {
    instance: Arc<Instance>,
    resolver: PrefixResolver,
    checks: Vec<NamedCheck>,
    invoker: Arc<dyn CommandInvoker>,
}

/// Routes chat messages to a [`CommandInvoker`].
#[derive(Clone)]
pub struct CommandDispatcher {
    inner: Arc<DispatcherInner>,
}

impl CommandDispatcher {
    /// Creates a dispatcher with the default prefix and [`only_available`].
    pub fn new(instance: Arc<Instance>, invoker: Arc<dyn CommandInvoker>) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                instance,
                resolver: PrefixResolver::default(),
                checks: vec![NamedCheck {
                    name: "only_available",
                    check: Arc::new(only_available),
                }],
                invoker,
            }),
        }
    }

    /// Replaces the prefix resolver.
    pub fn with_resolver(mut self, resolver: PrefixResolver) -> Self {
        Arc::make_mut(&mut self.inner).resolver = resolver;
        self
    }

    /// Appends a check, run after the ones already registered.
    pub fn with_check(mut self, name: &'static str, check: CheckFn) -> Self {
        Arc::make_mut(&mut self.inner)
            .checks
            .push(NamedCheck { name, check });
        self
    }

    /// Names of the registered checks, in evaluation order.
    pub fn check_names(&self) -> Vec<&'static str> {
        self.inner.checks.iter().map(|c| c.name).collect()
    }

    /// Runs the full pipeline for one message and waits for the invoker.
    pub async fn process(&self, message: Message) -> DispatchOutcome {
        let span = debug_span!("dispatch", message = %message.id);
        self.run_pipeline(message).instrument(span).await
    }

    async fn run_pipeline(&self, message: Message) -> DispatchOutcome {
        if message.author.bot {
            return DispatchOutcome::IgnoredAutomatedAuthor;
        }

        let inner = &self.inner;
        let store = inner.instance.settings().map(|store| &**store);
        let prefix = inner.resolver.resolve(&message, store).await;
        if !message.content.starts_with(prefix.as_str()) {
            return DispatchOutcome::NotACommand;
        }

        let ctx = InvocationContext::new(Arc::clone(&inner.instance), message, prefix);
        if let Some(failed) = inner.checks.iter().find(|c| !(c.check)(&ctx)) {
            debug!(
                check = failed.name,
                command = ctx.command_name(),
                "Check failed, suppressing command"
            );
            return DispatchOutcome::Suppressed { check: failed.name };
        }

        let command = ctx.command_name().to_owned();
        match inner.invoker.invoke(ctx).await {
            Ok(()) => DispatchOutcome::Invoked,
            Err(e) => {
                error!(command = %command, error = ?e, "Command failed");
                DispatchOutcome::Failed
            }
        }
    }
}

#[async_trait]
impl MessageDispatcher for CommandDispatcher {
    async fn dispatch(&self, message: Message) {
        let this = self.clone();
        self.inner.instance.spawn(async move {
            this.process(message).await;
        });
    }
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("resolver", &self.inner.resolver)
            .field("checks", &self.check_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use parking_lot::Mutex;
    use ttsbot_core::{Author, Venue, VenueId};

    use super::*;
    use crate::testing::{MapSettings, test_instance};

    #[derive(Default)]
    struct RecordingInvoker {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CommandInvoker for RecordingInvoker {
        async fn invoke(&self, ctx: InvocationContext) -> anyhow::Result<()> {
            self.calls.lock().push(ctx.trigger().to_owned());
            if ctx.command_name() == "explode" {
                anyhow::bail!("boom");
            }
            Ok(())
        }
    }

    fn setup() -> (Arc<Instance>, Arc<RecordingInvoker>, CommandDispatcher) {
        let instance = test_instance();
        let invoker = Arc::new(RecordingInvoker::default());
        let dispatcher = CommandDispatcher::new(Arc::clone(&instance), invoker.clone());
        (instance, invoker, dispatcher)
    }

    fn alice() -> Author {
        Author::user(7, "alice")
    }

    #[tokio::test]
    async fn test_automated_author_never_invokes() {
        let (_instance, invoker, dispatcher) = setup();
        let message = Message::in_venue(1, Author::bot(8, "other-bot"), Venue::new(3), "-help");

        assert_eq!(
            dispatcher.process(message).await,
            DispatchOutcome::IgnoredAutomatedAuthor
        );
        assert!(invoker.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_venue_never_invokes() {
        let (_instance, invoker, dispatcher) = setup();
        let message = Message::in_venue(1, alice(), Venue::new(3).unavailable(), "-help");

        assert_eq!(
            dispatcher.process(message).await,
            DispatchOutcome::Suppressed {
                check: "only_available"
            }
        );
        assert!(invoker.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_prefix_mismatch_is_not_a_command() {
        let (_instance, invoker, dispatcher) = setup();
        let message = Message::direct(1, alice(), "hello there");

        assert_eq!(dispatcher.process(message).await, DispatchOutcome::NotACommand);
        assert!(invoker.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_invokes_with_venue_prefix() {
        let (instance, invoker, dispatcher) = setup();
        let store = MapSettings {
            prefixes: HashMap::from([(VenueId::from(3), "tts!".to_owned())]),
            ..Default::default()
        };
        instance.install_settings(Arc::new(store)).unwrap();

        let ignored = Message::in_venue(1, alice(), Venue::new(3), "-join");
        let accepted = Message::in_venue(2, alice(), Venue::new(3), "tts!join");
        let direct = Message::direct(3, alice(), "-settings");

        assert_eq!(dispatcher.process(ignored).await, DispatchOutcome::NotACommand);
        assert_eq!(dispatcher.process(accepted).await, DispatchOutcome::Invoked);
        assert_eq!(dispatcher.process(direct).await, DispatchOutcome::Invoked);
        assert_eq!(*invoker.calls.lock(), ["join", "settings"]);
    }

    #[tokio::test]
    async fn test_custom_check_runs_after_builtin() {
        let (_instance, invoker, dispatcher) = setup();
        let dispatcher = dispatcher.with_check(
            "trusted_only",
            Arc::new(|ctx: &InvocationContext| ctx.instance().is_trusted(ctx.author().id)),
        );
        assert_eq!(dispatcher.check_names(), ["only_available", "trusted_only"]);

        let message = Message::direct(1, alice(), "-shutdown");
        assert_eq!(
            dispatcher.process(message).await,
            DispatchOutcome::Suppressed {
                check: "trusted_only"
            }
        );
        assert!(invoker.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_invoker_error_is_contained() {
        let (_instance, _invoker, dispatcher) = setup();
        let message = Message::direct(1, alice(), "-explode now");

        assert_eq!(dispatcher.process(message).await, DispatchOutcome::Failed);
    }

    #[tokio::test]
    async fn test_dispatch_runs_on_instance_tasks() {
        let (instance, invoker, dispatcher) = setup();
        dispatcher
            .dispatch(Message::direct(1, alice(), "-ping"))
            .await;

        tokio::time::timeout(Duration::from_secs(1), async {
            while invoker.calls.lock().is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        assert_eq!(*invoker.calls.lock(), ["ping"]);
        instance.stop_tasks().await;
        assert_eq!(instance.task_count(), 0);
    }
}
