//! Cooperative run loop: step on every tick until stopped or quiescent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::simulation::{Simulation, Snapshot};

/// The one simulation every mutation goes through, one lock at a time.
pub type SharedSimulation = Arc<Mutex<Simulation>>;

/// Called after every automatic step.
pub type StepObserver = Arc<dyn Fn(&Snapshot) + Send + Sync>;

pub fn shared(simulation: Simulation) -> SharedSimulation {
    Arc::new(Mutex::new(simulation))
}

/// Lock the simulation, recovering the state from a poisoned mutex.
pub fn lock(simulation: &SharedSimulation) -> MutexGuard<'_, Simulation> {
    simulation.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct TokenState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cloneable stop signal handed to a run loop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    state: Arc<TokenState>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.state.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        loop {
            // Registered before the flag check so a concurrent cancel is not missed.
            let notified = self.state.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Why a run loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    Cancelled,
    /// A step reported no active change.
    Quiescent,
    /// A step failed; the state is left as it was before that step.
    Failed,
}

/// Step `simulation` once per configured tick until `token` is cancelled or a
/// step reports no change.
///
/// The token is checked again under the lock right before each step, so no
/// step starts after `cancel` returns.
pub async fn run_loop<F>(simulation: SharedSimulation, token: CancelToken, mut on_step: F) -> RunExit
where
    F: FnMut(&Snapshot),
{
    loop {
        let tick = lock(&simulation).config().tick_interval();
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("run loop cancelled while waiting");
                return RunExit::Cancelled;
            }
            _ = tokio::time::sleep(tick) => {}
        }

        let result = {
            let mut guard = lock(&simulation);
            if token.is_cancelled() {
                debug!("run loop cancelled before step");
                return RunExit::Cancelled;
            }
            guard.step()
        };

        match result {
            Ok(snapshot) => {
                on_step(&snapshot);
                if !snapshot.changed {
                    info!("quiescent at generation {}, stopping", snapshot.generation);
                    return RunExit::Quiescent;
                }
            }
            Err(err) => {
                warn!("run loop step failed: {err}");
                return RunExit::Failed;
            }
        }
    }
}

/// Start/stop control over at most one run loop at a time.
pub struct Runner {
    simulation: SharedSimulation,
    runtime: Handle,
    observer: Option<StepObserver>,
    active: Option<(CancelToken, JoinHandle<RunExit>)>,
}

impl Runner {
    pub fn new(simulation: SharedSimulation, runtime: Handle) -> Self {
        Self {
            simulation,
            runtime,
            observer: None,
            active: None,
        }
    }

    pub fn with_observer(mut self, observer: StepObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn simulation(&self) -> &SharedSimulation {
        &self.simulation
    }

    /// Spawn the run loop. Returns `false` without doing anything if one is
    /// already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }

        let token = CancelToken::new();
        let observer = self.observer.clone();
        let task = run_loop(self.simulation.clone(), token.clone(), move |snapshot| {
            if let Some(observer) = &observer {
                observer(snapshot);
            }
        });
        let handle = self.runtime.spawn(task);
        self.active = Some((token, handle));
        info!("run loop started");
        true
    }

    /// Cancel the active run loop, if any. No step begins after this returns.
    pub fn stop(&mut self) {
        if let Some((token, _)) = self.active.take() {
            token.cancel();
            info!("run loop stopped");
        }
    }

    /// Whether a run loop is still stepping; `false` once it stopped itself.
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|(token, handle)| !token.is_cancelled() && !handle.is_finished())
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.stop();
    }
}
