//! Scripted [`ToolRunner`] for exercising the core without a `bw` binary.
//!
//! Responses are keyed by argument prefix; the most recently registered
//! matching script wins. Unmatched invocations succeed with empty output.
//! The runner can also be held closed so tests observe calls while they are
//! in flight.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::VaultResult;
use crate::process::{ToolInvocation, ToolOutput, ToolRunner};

type Responder = Arc<dyn Fn(&ToolInvocation) -> VaultResult<ToolOutput> + Send + Sync>;

struct Script {
    prefix: Vec<String>,
    responder: Responder,
}

impl Script {
    fn matches(&self, invocation: &ToolInvocation) -> bool {
        invocation.args.len() >= self.prefix.len()
            && self
                .prefix
                .iter()
                .zip(&invocation.args)
                .all(|(expected, actual)| expected == actual)
    }
}

/// Records invocations and answers them from scripts
pub struct ScriptedRunner {
    scripts: Mutex<Vec<Script>>,
    invocations: Mutex<Vec<ToolInvocation>>,
    open: watch::Sender<bool>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl Default for ScriptedRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptedRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedRunner")
            .field("calls", &self.call_count())
            .field("in_flight", &self.in_flight())
            .field("peak", &self.peak_concurrency())
            .finish_non_exhaustive()
    }
}

impl ScriptedRunner {
    /// Creates an open runner with no scripts
    #[must_use]
    pub fn new() -> Self {
        let (open, _) = watch::channel(true);
        Self {
            scripts: Mutex::new(Vec::new()),
            invocations: Mutex::new(Vec::new()),
            open,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Answers invocations starting with `prefix` with a fixed output
    pub fn respond<'a>(&self, prefix: impl IntoIterator<Item = &'a str>, output: ToolOutput) {
        self.respond_with(prefix, move |_| Ok(output.clone()));
    }

    /// Answers invocations starting with `prefix` by calling `responder`
    pub fn respond_with<'a, F>(&self, prefix: impl IntoIterator<Item = &'a str>, responder: F)
    where
        F: Fn(&ToolInvocation) -> VaultResult<ToolOutput> + Send + Sync + 'static,
    {
        let script = Script {
            prefix: prefix.into_iter().map(str::to_string).collect(),
            responder: Arc::new(responder),
        };
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(script);
    }

    /// Makes subsequent calls wait until [`Self::release`]
    pub fn hold(&self) {
        self.open.send_replace(false);
    }

    /// Lets waiting and future calls proceed
    pub fn release(&self) {
        self.open.send_replace(true);
    }

    /// Every invocation received so far, in arrival order
    #[must_use]
    pub fn invocations(&self) -> Vec<ToolInvocation> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Invocations whose arguments start with `prefix`
    #[must_use]
    pub fn invocations_of(&self, prefix: &[&str]) -> Vec<ToolInvocation> {
        self.invocations()
            .into_iter()
            .filter(|inv| {
                inv.args.len() >= prefix.len() && prefix.iter().zip(&inv.args).all(|(p, a)| p == a)
            })
            .collect()
    }

    /// Number of invocations received
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Calls currently executing
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous calls observed
    #[must_use]
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn answer(&self, invocation: &ToolInvocation) -> VaultResult<ToolOutput> {
        let responder = self
            .scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|s| s.matches(invocation))
            .map(|s| Arc::clone(&s.responder));
        responder.map_or_else(|| Ok(ToolOutput::ok("")), |r| r(invocation))
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn execute(&self, invocation: ToolInvocation) -> VaultResult<ToolOutput> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(invocation.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.peak.fetch_max(current, Ordering::SeqCst);

        let mut open = self.open.subscribe();
        // The sender lives as long as `self`, so this only ends when opened
        let _ = open.wait_for(|is_open| *is_open).await;

        self.answer(&invocation)
    }
}
