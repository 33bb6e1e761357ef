//! Schedulers backed by OS worker threads.
//!
//! A [`PoolScheduler`] runs actions on a `futures` thread pool. With one worker
//! (`PoolScheduler::serial`) actions run one at a time in submission order;
//! with several (`PoolScheduler::concurrent`) they may run in parallel and in
//! any order.
//!
//! Delayed actions are parked on a timer thread owned by the scheduler
//! instance. The timer keeps a deadline heap and blocks on its command
//! channel until the earliest deadline, then hands due actions to the pool.
//! Disposing a delayed action tells the timer to drop it right away, so what
//! it captured is released before its deadline. Nothing else in the engine
//! blocks while waiting for time to pass.

use std::{
  cmp::Reverse,
  collections::{BinaryHeap, HashMap},
  fmt::{Debug, Formatter},
  sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
  },
  thread,
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use futures::{executor::ThreadPool, future};

use super::{wall_clock, Action, Duration, Instant, Scheduler};
use crate::{
  diagnostics::Tracked,
  error::SchedulerError,
  subscription::{BooleanDisposable, Disposable, DisposableRef},
};

type Job = Box<dyn FnOnce() + Send>;

enum TimerCommand {
  Schedule { id: u64, due: Instant, job: Job },
  Cancel(u64),
}

struct PoolCore {
  pool: ThreadPool,
  timer: Sender<TimerCommand>,
  next_timer_id: AtomicU64,
  serial: bool,
  name: String,
  _tracked: Tracked,
}

/// Scheduler running actions on OS worker threads. Cloning is cheap and
/// shares the workers.
#[derive(Clone)]
pub struct PoolScheduler {
  core: Arc<PoolCore>,
}

impl Debug for PoolScheduler {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PoolScheduler")
      .field("name", &self.core.name)
      .field("serial", &self.core.serial)
      .finish()
  }
}

// ==================== Builder ====================

#[derive(Clone, Debug)]
pub struct PoolSchedulerBuilder {
  pool_size: usize,
  name_prefix: String,
}

impl Default for PoolSchedulerBuilder {
  fn default() -> Self {
    let pool_size = thread::available_parallelism().map_or(4, |n| n.get());
    Self { pool_size, name_prefix: "rxcore-pool-".to_owned() }
  }
}

impl PoolSchedulerBuilder {
  /// Number of worker threads; `1` gives a serial scheduler.
  pub fn pool_size(mut self, size: usize) -> Self {
    self.pool_size = size.max(1);
    self
  }

  pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.name_prefix = prefix.into();
    self
  }

  pub fn build(self) -> Result<PoolScheduler, SchedulerError> {
    let Self { pool_size, name_prefix } = self;
    let pool = ThreadPool::builder()
      .pool_size(pool_size)
      .name_prefix(name_prefix.clone())
      .create()
      .map_err(|source| SchedulerError::WorkerPool { name: name_prefix.clone(), source })?;

    let (timer, commands) = crossbeam_channel::unbounded();
    let timer_name = format!("{name_prefix}timer");
    let timer_pool = pool.clone();
    thread::Builder::new()
      .name(timer_name.clone())
      .spawn(move || run_timer(commands, timer_pool))
      .map_err(|source| SchedulerError::TimerThread { name: timer_name, source })?;

    tracing::debug!(name = %name_prefix, workers = pool_size, "pool scheduler started");
    Ok(PoolScheduler {
      core: Arc::new(PoolCore {
        pool,
        timer,
        next_timer_id: AtomicU64::new(0),
        serial: pool_size == 1,
        name: name_prefix,
        _tracked: Tracked::new(),
      }),
    })
  }
}

// ==================== PoolScheduler ====================

impl PoolScheduler {
  pub fn builder() -> PoolSchedulerBuilder { PoolSchedulerBuilder::default() }

  /// One worker; actions run in submission order.
  pub fn serial() -> Result<Self, SchedulerError> {
    Self::builder()
      .pool_size(1)
      .name_prefix("rxcore-serial-")
      .build()
  }

  /// One worker per available core; no ordering between actions.
  pub fn concurrent() -> Result<Self, SchedulerError> { Self::builder().build() }

  pub fn is_serial(&self) -> bool { self.core.serial }

  fn spawn(&self, job: Job) { self.core.pool.spawn_ok(future::lazy(move |_| job())); }
}

impl Scheduler for PoolScheduler {
  fn now(&self) -> Duration { wall_clock() }

  fn schedule_relative(&self, delay: Duration, action: Action) -> DisposableRef {
    let cancel = Arc::new(BooleanDisposable::new());
    let c_cancel = cancel.clone();
    let scheduler = self.clone();
    let job: Job = Box::new(move || {
      if !c_cancel.is_disposed() {
        action(&scheduler);
      }
    });

    if delay.is_zero() {
      self.spawn(job);
      return cancel;
    }
    let id = self.core.next_timer_id.fetch_add(1, Ordering::Relaxed);
    let command = TimerCommand::Schedule { id, due: Instant::now() + delay, job };
    // The timer thread only exits once every sender is gone, and we hold
    // one, so a send error would mean it panicked. The job is dropped.
    if self.core.timer.send(command).is_err() {
      tracing::warn!(name = %self.core.name, "timer thread is gone; delayed action dropped");
    }
    Arc::new(DelayedHandle { cancel, id, timer: self.core.timer.clone() })
  }
}

/// Handle of a delayed action parked on the timer thread.
struct DelayedHandle {
  cancel: Arc<BooleanDisposable>,
  id: u64,
  timer: Sender<TimerCommand>,
}

impl Disposable for DelayedHandle {
  fn dispose(&self) {
    if self.cancel.is_disposed() {
      return;
    }
    self.cancel.dispose();
    // Fails only if the timer thread is gone, and the job with it.
    let _ = self.timer.send(TimerCommand::Cancel(self.id));
  }

  fn is_disposed(&self) -> bool { self.cancel.is_disposed() }
}

// ==================== Timer thread ====================

fn run_timer(commands: Receiver<TimerCommand>, pool: ThreadPool) {
  // (due, id) keeps ties FIFO; a cancelled id stays in the heap without a job.
  let mut heap: BinaryHeap<Reverse<(Instant, u64)>> = BinaryHeap::new();
  let mut jobs: HashMap<u64, Job> = HashMap::new();

  loop {
    let now = Instant::now();
    while let Some(Reverse((due, seq))) = heap.peek().copied() {
      if due > now {
        break;
      }
      heap.pop();
      if let Some(job) = jobs.remove(&seq) {
        pool.spawn_ok(future::lazy(move |_| job()));
      }
    }

    let received = match heap.peek() {
      Some(Reverse((due, _))) => commands.recv_timeout(due.saturating_duration_since(now)),
      None => commands
        .recv()
        .map_err(|_| RecvTimeoutError::Disconnected),
    };

    match received {
      Ok(TimerCommand::Schedule { id, due, job }) => {
        heap.push(Reverse((due, id)));
        jobs.insert(id, job);
      }
      Ok(TimerCommand::Cancel(id)) => drop(jobs.remove(&id)),
      Err(RecvTimeoutError::Timeout) => {}
      Err(RecvTimeoutError::Disconnected) => break,
    }
  }
  tracing::debug!(dropped = jobs.len(), "pool timer thread exiting");
}
