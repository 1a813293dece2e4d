use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use clap::ValueEnum;
use log::{debug, info};

use crate::error::DemoError;

pub const DEFAULT_WORKERS: usize = 2;
pub const DEFAULT_INCREMENTS: u64 = 1_000_000;

/// How the workers share the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CounterMode {
    /// One mutex acquisition per increment.
    #[default]
    Guarded,
    /// Split load/store with no lock; loses updates under contention.
    Unguarded,
    /// Workers count locally and send partial sums to a collector.
    Channel,
}

#[derive(Debug, Clone)]
pub struct CounterConfig {
    pub workers: usize,
    pub increments: u64,
    pub mode: CounterMode,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            increments: DEFAULT_INCREMENTS,
            mode: CounterMode::Guarded,
        }
    }
}

impl CounterConfig {
    pub fn expected_total(&self) -> u64 {
        self.workers as u64 * self.increments
    }
}

/// Counter handle shared between workers. Clones refer to the same value.
#[derive(Debug, Clone, Default)]
pub struct SharedCounter {
    inner: Arc<Mutex<u64>>,
}

impl SharedCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) -> Result<(), DemoError> {
        let mut count = self.inner.lock().map_err(|_| DemoError::LockPoisoned)?;
        *count += 1;
        Ok(())
    }

    pub fn value(&self) -> Result<u64, DemoError> {
        let count = self.inner.lock().map_err(|_| DemoError::LockPoisoned)?;
        Ok(*count)
    }
}

type Worker = JoinHandle<Result<(), DemoError>>;

fn worker_builder(index: usize) -> thread::Builder {
    thread::Builder::new().name(format!("counter-{}", index))
}

fn join_all(handles: Vec<Worker>) -> Result<(), DemoError> {
    for (index, handle) in handles.into_iter().enumerate() {
        handle.join().map_err(|_| DemoError::WorkerPanicked(index))??;
    }
    Ok(())
}

/// Spawns `workers` tasks and joins all of them. If the OS refuses a
/// thread, the ones already running are joined before the error returns.
fn spawn_workers<F>(
    workers: usize,
    builder: impl Fn(usize) -> thread::Builder,
    mut make_task: impl FnMut() -> F,
) -> Result<(), DemoError>
where
    F: FnOnce() -> Result<(), DemoError> + Send + 'static,
{
    let mut handles = Vec::new();
    for index in 0..workers {
        match builder(index).spawn(make_task()) {
            Ok(handle) => handles.push(handle),
            Err(err) => {
                join_all(handles)?;
                return Err(err.into());
            }
        }
    }
    join_all(handles)
}

fn run_guarded(
    workers: usize,
    increments: u64,
    builder: impl Fn(usize) -> thread::Builder,
) -> Result<u64, DemoError> {
    let counter = SharedCounter::new();

    spawn_workers(workers, builder, || {
        let counter = counter.clone();
        move || -> Result<(), DemoError> {
            for _ in 0..increments {
                counter.increment()?;
            }
            Ok(())
        }
    })?;
    counter.value()
}

fn run_unguarded(workers: usize, increments: u64) -> Result<u64, DemoError> {
    let counter = Arc::new(AtomicU64::new(0));

    spawn_workers(workers, worker_builder, || {
        let counter = Arc::clone(&counter);
        move || -> Result<(), DemoError> {
            for _ in 0..increments {
                // Read-modify-write in two steps: another worker can
                // store in between and its update is overwritten.
                let current = counter.load(Ordering::Relaxed);
                counter.store(current + 1, Ordering::Relaxed);
            }
            Ok(())
        }
    })?;
    Ok(counter.load(Ordering::SeqCst))
}

fn report_partial(tx: &Sender<u64>, partial: u64) -> Result<(), DemoError> {
    tx.send(partial).map_err(|_| DemoError::CollectorClosed)
}

fn run_channel(workers: usize, increments: u64) -> Result<u64, DemoError> {
    let (tx, rx) = mpsc::channel::<u64>();

    let spawned = spawn_workers(workers, worker_builder, || {
        let tx = tx.clone();
        move || -> Result<(), DemoError> {
            let mut partial = 0u64;
            for _ in 0..increments {
                partial += 1;
            }
            report_partial(&tx, partial)
        }
    });
    drop(tx);
    spawned?;

    Ok(rx.iter().sum())
}

/// Runs all workers to completion and returns the final counter value.
pub fn run_counter(config: &CounterConfig) -> Result<u64, DemoError> {
    debug!(
        "starting {} workers x {} increments ({:?})",
        config.workers, config.increments, config.mode
    );

    let total = match config.mode {
        CounterMode::Guarded => run_guarded(config.workers, config.increments, worker_builder)?,
        CounterMode::Unguarded => run_unguarded(config.workers, config.increments)?,
        CounterMode::Channel => run_channel(config.workers, config.increments)?,
    };

    let expected = config.expected_total();
    if total != expected {
        info!("lost {} updates ({} of {})", expected - total, total, expected);
    }
    Ok(total)
}

pub fn run_guarded_counter<W: Write>(
    config: &CounterConfig,
    writer: &mut W,
) -> Result<(), DemoError> {
    let total = run_counter(config)?;
    writeln!(writer, "Counter: {}", total)?;
    Ok(())
}
