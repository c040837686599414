//! Top-level lifecycle orchestration.
//!
//! [`TtsRuntime`] drives the whole process:
//!
//! 1. validate the configuration,
//! 2. build notification channels and acquire backends
//!    ([`ResourceInitializer`]),
//! 3. create the [`Instance`] and run the early [startup hooks](StartupHook),
//! 4. load extensions,
//! 5. send "Starting TTS Bot!" to `logs` and run the normal startup hooks,
//! 6. run the [readiness race](crate::readiness),
//! 7. serve until the serve loop ends or shutdown is requested,
//! 8. hand over to the [`ShutdownCoordinator`].
//!
//! A failure in steps 3 to 5 rolls the instance back through the coordinator.
//! The shutdown future is watched from step 2 onwards, so a request during a
//! slow acquisition or a stuck notice is honoured straight away.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ttsbot_runtime::TtsRuntime;
//!
//! let runtime = TtsRuntime::builder(factory, chat)
//!     .config_file("config.toml")
//!     .extensions(&[SETTINGS, ANALYTICS])
//!     .commands(Arc::new(MyCommands))
//!     .build()?;
//!
//! let summary = runtime.run().await?;
//! ```

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::signal;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use ttsbot_core::{BackendError, BackendFactory, ChatBackend, ChatSession, CurrentUser, ready_pair};
use ttsbot_framework::{
    CheckFn, CommandDispatcher, CommandInvoker, ExtensionDescriptor, ExtensionLoader, Instance,
    InvocationContext, PrefixResolver, StartupHook, StartupPhase, run_startup_hooks,
};

use crate::config::{ConfigLoader, TtsBotConfig, validate_config};
use crate::error::{RuntimeResult, StartupError};
use crate::logging::{self, LoggingGuard};
use crate::readiness::{LifecycleState, ReadinessOutcome, race, serve_error, spawn_serve};
use crate::resources::ResourceInitializer;
use crate::shutdown::{ShutdownCoordinator, ShutdownReport, ShutdownTrigger};

/// How a run ended.
#[derive(Debug)]
pub struct RunSummary {
    /// The readiness outcome, or `None` if shutdown was requested first.
    pub readiness: Option<ReadinessOutcome>,
    /// What started shutdown.
    pub trigger: ShutdownTrigger,
    /// The error that ended the serve loop after readiness, if any.
    pub serve_error: Option<BackendError>,
    /// What the shutdown coordinator did.
    pub shutdown: ShutdownReport,
}

impl RunSummary {
    /// Returns `true` if the bot became ready.
    pub fn was_ready(&self) -> bool {
        self.readiness
            .as_ref()
            .is_some_and(ReadinessOutcome::is_ready)
    }
}

/// The TTS Bot process lifecycle.
pub struct TtsRuntime {
    config: TtsBotConfig,
    factory: Arc<dyn BackendFactory>,
    chat: Arc<dyn ChatBackend>,
    extensions: ExtensionLoader,
    hooks: Vec<StartupHook>,
    invoker: Arc<dyn CommandInvoker>,
    checks: Vec<(&'static str, CheckFn)>,
    started_at: Instant,
    state: watch::Sender<LifecycleState>,
    _logging: LoggingGuard,
}

impl TtsRuntime {
    /// Creates a runtime builder around the two backend seams.
    pub fn builder(factory: Arc<dyn BackendFactory>, chat: Arc<dyn ChatBackend>) -> RuntimeBuilder {
        RuntimeBuilder::new(factory, chat)
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &TtsBotConfig {
        &self.config
    }

    /// Watches lifecycle state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Runs until Ctrl+C or SIGTERM.
    pub async fn run(self) -> RuntimeResult<RunSummary> {
        self.run_until(shutdown_signal()).await
    }

    /// Runs until `shutdown` completes, the serve loop ends, or startup fails.
    ///
    /// Errors are returned only for startup failures, in which case no
    /// backend handle is left held. Everything after startup is reported in
    /// the [`RunSummary`].
    pub async fn run_until<F>(mut self, shutdown: F) -> RuntimeResult<RunSummary>
    where
        F: Future<Output = ()> + Send,
    {
        let mut shutdown = std::pin::pin!(shutdown);
        let instance = match self.start(shutdown.as_mut()).await {
            Ok(instance) => instance,
            Err(e) => {
                if e.is_interrupted() {
                    warn!("Shutdown requested during startup");
                } else {
                    error!(error = %e, "Startup failed");
                }
                self.state.send_replace(LifecycleState::Stopped);
                return Err(e.into());
            }
        };
        let coordinator = self.coordinator(&instance);

        let (signal, waiter) = ready_pair();
        let session = ChatSession {
            token: self.config.main.token.clone(),
            presence: self.config.activity.clone(),
            ready: signal,
            dispatcher: Arc::new(self.dispatcher(&instance)),
        };

        info!("Logging into the chat service");
        let mut serve = spawn_serve(Arc::clone(&self.chat), session);

        let readiness = tokio::select! {
            outcome = race(&mut serve, waiter) => Some(outcome),
            () = &mut shutdown => None,
        };

        let (trigger, serve_failure) = match &readiness {
            Some(ReadinessOutcome::Ready(user)) => {
                let took = self.mark_ready(&instance, user);
                let announced = tokio::select! {
                    () = send_ready_notice(&instance, took) => true,
                    () = &mut shutdown => false,
                };
                if announced {
                    tokio::select! {
                        result = &mut serve => {
                            let failure = serve_error(result);
                            match &failure {
                                Some(e) => error!(error = %e, "Serve loop failed"),
                                None => info!("Serve loop ended"),
                            }
                            (ShutdownTrigger::ServeEnded, failure)
                        }
                        () = &mut shutdown => (ShutdownTrigger::Requested, None),
                    }
                } else {
                    warn!("Shutdown requested while sending the ready notice");
                    (ShutdownTrigger::Requested, None)
                }
            }
            Some(ReadinessOutcome::FailedBeforeReady(cause)) => {
                self.state.send_replace(LifecycleState::FailedBeforeReady);
                match cause {
                    Some(e) => error!(error = %e, "Bot shutdown before ready!"),
                    None => error!("Bot shutdown before ready!"),
                }
                (ShutdownTrigger::FailedBeforeReady, None)
            }
            None => {
                warn!("Shutdown requested before ready");
                (ShutdownTrigger::Requested, None)
            }
        };

        let report = coordinator.shutdown(trigger).await;
        if !serve.is_finished() {
            debug!("Aborting serve task");
            serve.abort();
        }
        self.state.send_replace(LifecycleState::Stopped);

        Ok(RunSummary {
            readiness,
            trigger,
            serve_error: serve_failure,
            shutdown: report,
        })
    }

    /// Everything before the readiness race.
    ///
    /// Gives up with [`StartupError::Interrupted`] once `shutdown` completes.
    async fn start<F>(
        &mut self,
        mut shutdown: Pin<&mut F>,
    ) -> Result<Arc<Instance>, StartupError>
    where
        F: Future<Output = ()>,
    {
        validate_config(&self.config)?;

        let initializer = ResourceInitializer::new(
            Arc::clone(&self.factory),
            self.config.lifecycle.shutdown_timeout(),
        );
        let channels = initializer.build_channels(&self.config.webhooks)?;
        let resources = initializer
            .acquire_until(&self.config, channels, shutdown.as_mut())
            .await?;

        let instance = Arc::new(Instance::new(
            resources,
            self.config.main.trusted_ids.iter().copied(),
            self.config.main.main_server,
        ));

        let prepared = tokio::select! {
            result = self.prepare(&instance) => result,
            () = shutdown.as_mut() => Err(StartupError::Interrupted),
        };
        if let Err(e) = prepared {
            let trigger = if e.is_interrupted() {
                ShutdownTrigger::Requested
            } else {
                ShutdownTrigger::StartupFailed
            };
            self.coordinator(&instance).shutdown(trigger).await;
            return Err(e);
        }
        Ok(instance)
    }

    /// Startup hooks, extensions and the startup notice.
    async fn prepare(&mut self, instance: &Arc<Instance>) -> Result<(), StartupError> {
        run_startup_hooks(&self.hooks, StartupPhase::Early, instance).await?;
        self.extensions.load_all(instance).await?;

        if let Err(e) = instance.logs().send("Starting TTS Bot!").await {
            warn!(error = %e, "Failed to send startup notice");
        }

        run_startup_hooks(&self.hooks, StartupPhase::Normal, instance).await?;
        Ok(())
    }

    fn coordinator(&self, instance: &Arc<Instance>) -> ShutdownCoordinator {
        ShutdownCoordinator::new(
            Arc::clone(instance),
            Arc::clone(&self.chat),
            self.config.lifecycle.shutdown_timeout(),
        )
    }

    fn dispatcher(&mut self, instance: &Arc<Instance>) -> CommandDispatcher {
        let mut dispatcher = CommandDispatcher::new(Arc::clone(instance), Arc::clone(&self.invoker))
            .with_resolver(PrefixResolver::new(
                self.config.lifecycle.default_prefix.as_str(),
            ));
        for (name, check) in self.checks.drain(..) {
            dispatcher = dispatcher.with_check(name, check);
        }
        dispatcher
    }

    /// Records the identity and returns the time taken to get here.
    fn mark_ready(&self, instance: &Instance, user: &CurrentUser) -> Duration {
        instance.set_current_user(user.clone());
        self.state.send_replace(LifecycleState::Ready);

        let took = self.started_at.elapsed();
        info!(elapsed = ?took, "Logged in as {user} and ready!");
        took
    }
}

async fn send_ready_notice(instance: &Instance, took: Duration) {
    let notice = format!("Started and ready! Took `{:.2} seconds`", took.as_secs_f64());
    if let Err(e) = instance.logs().send(&notice).await {
        warn!(error = %e, "Failed to send ready notice");
    }
}

impl std::fmt::Debug for TtsRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtsRuntime")
            .field("state", &*self.state.borrow())
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

/// Waits for Ctrl+C or SIGTERM.
///
/// If a handler cannot be registered the failure is logged and that branch
/// never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

/// Used when no command invoker is registered.
struct NoCommands;

#[async_trait]
impl CommandInvoker for NoCommands {
    async fn invoke(&self, ctx: InvocationContext) -> anyhow::Result<()> {
        debug!(command = ctx.command_name(), "No command invoker registered");
        Ok(())
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for [`TtsRuntime`].
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    config: Option<TtsBotConfig>,
    factory: Arc<dyn BackendFactory>,
    chat: Arc<dyn ChatBackend>,
    extensions: ExtensionLoader,
    hooks: Vec<StartupHook>,
    invoker: Option<Arc<dyn CommandInvoker>>,
    checks: Vec<(&'static str, CheckFn)>,
    started_at: Option<Instant>,
    init_logging: bool,
}

impl RuntimeBuilder {
    /// Creates a builder that searches the current directory for configuration.
    pub fn new(factory: Arc<dyn BackendFactory>, chat: Arc<dyn ChatBackend>) -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            config: None,
            factory,
            chat,
            extensions: ExtensionLoader::new(),
            hooks: Vec::new(),
            invoker: None,
            checks: Vec::new(),
            started_at: None,
            init_logging: true,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Uses `config` as-is instead of loading one.
    pub fn config(mut self, config: TtsBotConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Appends one extension.
    pub fn extension(mut self, descriptor: ExtensionDescriptor) -> Self {
        self.extensions.register(descriptor);
        self
    }

    /// Appends several extensions, preserving order.
    pub fn extensions(mut self, descriptors: &[ExtensionDescriptor]) -> Self {
        self.extensions.register_all(descriptors);
        self
    }

    /// Appends a startup hook; hooks of one phase run in the order added.
    pub fn startup_hook(mut self, hook: StartupHook) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Appends several startup hooks, preserving order.
    pub fn startup_hooks(mut self, hooks: &[StartupHook]) -> Self {
        self.hooks.extend_from_slice(hooks);
        self
    }

    /// Sets the command invoker.
    pub fn commands(mut self, invoker: Arc<dyn CommandInvoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    /// Adds a dispatch check, run after the built-in ones.
    pub fn check(mut self, name: &'static str, check: CheckFn) -> Self {
        self.checks.push((name, check));
        self
    }

    /// Sets the process start instant used for the ready notice.
    pub fn started_at(mut self, instant: Instant) -> Self {
        self.started_at = Some(instant);
        self
    }

    /// Leaves the global tracing subscriber alone.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    /// Loads the configuration and builds the runtime.
    pub fn build(self) -> Result<TtsRuntime, StartupError> {
        let config = match self.config {
            Some(config) => config,
            None => self.config_loader.load()?,
        };

        let logging = if self.init_logging {
            logging::init_from_config(&config.logging)
        } else {
            LoggingGuard::default()
        };
        info!(
            log_level = %config.logging.level,
            extensions = self.extensions.len(),
            startup_hooks = self.hooks.len(),
            "Runtime initialized from configuration"
        );

        let (state, _) = watch::channel(LifecycleState::Starting);
        Ok(TtsRuntime {
            config,
            factory: self.factory,
            chat: self.chat,
            extensions: self.extensions,
            hooks: self.hooks,
            invoker: self.invoker.unwrap_or_else(|| Arc::new(NoCommands)),
            checks: self.checks,
            started_at: self.started_at.unwrap_or_else(Instant::now),
            state,
            _logging: logging,
        })
    }
}
