//! Trailing-edge debouncer
//!
//! Coalesces bursts of calls into one invocation of an async target, carrying
//! the arguments of the last call in the burst. A dedicated tokio task owns
//! the timer and drives an explicit `Idle -> Waiting -> InFlight` state
//! machine; the handle just sends it commands over a channel.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::trace;

/// Where the debouncer currently is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// Nothing scheduled
    Idle,
    /// A call is scheduled and will fire when the quiet window elapses
    Waiting,
    /// The target is running; new calls are queued behind it
    InFlight,
}

/// Messages from the handle to the worker task
enum Command<A> {
    /// Replace the pending invocation and restart the quiet window
    Call(A),
    /// Drop the pending invocation without firing it
    Cancel,
}

/// Handle to a running debouncer
///
/// Must be created inside a tokio runtime. The target runs on the worker
/// task, so a call made while it is in flight is picked up only once it
/// finishes; that call's quiet window starts then, not when it was made.
///
/// Dropping the handle does not discard a pending invocation: it still fires
/// at its deadline, after which the worker task exits.
pub struct Debouncer<A> {
    tx: mpsc::UnboundedSender<Command<A>>,
    state: Arc<Mutex<DebounceState>>,
    wait: Duration,
}

impl<A: Send + 'static> Debouncer<A> {
    /// Spawns the worker task and returns its handle.
    ///
    /// # Arguments
    /// * `wait` - Quiet period that must elapse after the last call
    /// * `target` - Async function invoked with the last arguments of a burst
    pub fn spawn<F, Fut>(wait: Duration, target: F) -> Self
    where
        F: Fn(A) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(DebounceState::Idle));

        tokio::spawn(run_worker(rx, wait, target, Arc::clone(&state)));

        Self { tx, state, wait }
    }

    /// Schedules an invocation with `args`, replacing any pending one.
    ///
    /// Fire-and-forget: whatever the target produces is not returned here.
    pub fn call(&self, args: A) {
        // The worker only stops once every handle is gone
        let _ = self.tx.send(Command::Call(args));
    }

    /// Drops the pending invocation, if any, without firing it.
    ///
    /// An invocation that is already running is not interrupted.
    pub fn cancel(&self) {
        let _ = self.tx.send(Command::Cancel);
    }

    /// State as last recorded by the worker task.
    pub fn state(&self) -> DebounceState {
        *self.state.lock()
    }

    /// The configured quiet period.
    pub fn wait(&self) -> Duration {
        self.wait
    }
}

/// Worker loop owning the timer and the pending arguments
async fn run_worker<A, F, Fut>(
    mut rx: mpsc::UnboundedReceiver<Command<A>>,
    wait: Duration,
    target: F,
    state: Arc<Mutex<DebounceState>>,
) where
    F: Fn(A) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut pending: Option<A> = None;
    let mut open = true;
    let timer = tokio::time::sleep(wait);
    tokio::pin!(timer);

    loop {
        if !open && pending.is_none() {
            break;
        }

        tokio::select! {
            command = rx.recv(), if open => match command {
                Some(Command::Call(args)) => {
                    pending = Some(args);
                    timer.as_mut().reset(Instant::now() + wait);
                    *state.lock() = DebounceState::Waiting;
                }
                Some(Command::Cancel) => {
                    if pending.take().is_some() {
                        trace!("Pending debounced call cancelled");
                    }
                    *state.lock() = DebounceState::Idle;
                }
                None => open = false,
            },
            _ = &mut timer, if pending.is_some() => {
                if let Some(args) = pending.take() {
                    *state.lock() = DebounceState::InFlight;
                    let invocation = target(args);
                    invocation.await;
                    *state.lock() = DebounceState::Idle;
                }
            }
        }
    }
}
