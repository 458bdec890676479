//! Repeated sequential passes over an address list, streamed to a sink.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::endpoint::EndpointAddress;
use crate::probe::{Prober, ResultRecord, RoundTrip};

/// Receives every record as soon as its probe completes.
pub type Sink = Arc<dyn Fn(ResultRecord) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

enum State {
    /// `draining` is the loop of the last run, still finishing its pass.
    Idle { draining: Option<JoinHandle<()>> },
    Running {
        stop: watch::Sender<bool>,
        task: JoinHandle<()>,
    },
}

/// Drives probe passes with a random pause in `[0, max_jitter]` between them.
///
/// Within a pass addresses are probed one at a time, in list order. Stopping
/// cancels a pending pause; a pass that has already begun runs to completion
/// and its records still reach the sink, but no further pass starts. A restart
/// while that pass is still running waits for it, so passes never overlap.
pub struct PeriodicScheduler<H, W> {
    prober: Arc<Prober<H, W>>,
    addresses: Arc<[EndpointAddress]>,
    max_jitter: Duration,
    sink: Sink,
    state: Mutex<State>,
}

impl<H, W> PeriodicScheduler<H, W>
where
    H: RoundTrip + 'static,
    W: RoundTrip + 'static,
{
    pub fn new(
        prober: Arc<Prober<H, W>>,
        addresses: Vec<EndpointAddress>,
        max_jitter: Duration,
        sink: impl Fn(ResultRecord) + Send + Sync + 'static,
    ) -> Self {
        Self {
            prober,
            addresses: addresses.into(),
            max_jitter,
            sink: Arc::new(sink),
            state: Mutex::new(State::Idle { draining: None }),
        }
    }

    pub fn state(&self) -> SchedulerState {
        match *self.lock_state() {
            State::Idle { .. } => SchedulerState::Idle,
            State::Running { .. } => SchedulerState::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    /// Idle -> Running: kicks off the first pass immediately, or as soon as a
    /// pass left over from the previous run has finished. Returns `false` and
    /// does nothing if already running. Must be called from within a Tokio
    /// runtime.
    pub fn start(&self) -> bool {
        let mut state = self.lock_state();
        let previous = match &mut *state {
            State::Running { .. } => return false,
            State::Idle { draining } => draining.take(),
        };

        let (stop, stopped) = watch::channel(false);
        let passes = run_passes(
            self.prober.clone(),
            self.addresses.clone(),
            self.max_jitter,
            self.sink.clone(),
            stopped,
        );
        let task = tokio::spawn(async move {
            if let Some(previous) = previous {
                await_loop(previous).await;
            }
            passes.await;
        });
        *state = State::Running { stop, task };
        log::info!("Periodic probing started for {} endpoints", self.addresses.len());
        true
    }

    /// Running -> Idle. Returns `false` if already idle.
    pub fn stop(&self) -> bool {
        let mut state = self.lock_state();
        let previous = std::mem::replace(&mut *state, State::Idle { draining: None });
        match previous {
            State::Idle { draining } => {
                *state = State::Idle { draining };
                false
            }
            State::Running { stop, task } => {
                // The receiver is gone if the loop already ended.
                let _ = stop.send(true);
                log::info!("Periodic probing stopped");
                *state = State::Idle { draining: Some(task) };
                true
            }
        }
    }

    /// Stops and waits until a pass in progress has delivered its last record.
    pub async fn stop_and_wait(&self) {
        self.stop();
        if let Some(task) = self.take_draining() {
            await_loop(task).await;
        }
    }

    fn take_draining(&self) -> Option<JoinHandle<()>> {
        match &mut *self.lock_state() {
            State::Idle { draining } => draining.take(),
            State::Running { .. } => None,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        // The state is replaced wholesale, so a poisoned value is still consistent.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn await_loop(task: JoinHandle<()>) {
    if let Err(e) = task.await {
        log::error!("Periodic probing task failed: {e}");
    }
}

async fn run_passes<H, W>(
    prober: Arc<Prober<H, W>>,
    addresses: Arc<[EndpointAddress]>,
    max_jitter: Duration,
    sink: Sink,
    mut stopped: watch::Receiver<bool>,
) where
    H: RoundTrip + 'static,
    W: RoundTrip + 'static,
{
    let mut pass = 0u64;
    loop {
        if *stopped.borrow() {
            break;
        }

        pass += 1;
        log::debug!("Starting probe pass {pass}");
        for address in addresses.iter() {
            let record = prober.probe(address).await;
            sink(record);
        }

        let delay = jitter(max_jitter);
        log::debug!("Next probe pass in {} ms", delay.as_millis());
        tokio::select! {
            biased;
            // Also fires when the scheduler and its sender have been dropped.
            _ = stopped.wait_for(|stop| *stop) => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }
    log::debug!("Periodic probing loop exited after {pass} passes");
}

/// Uniform random delay in `[0, max]`, drawn fresh for every pass.
pub fn jitter(max: Duration) -> Duration {
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}
