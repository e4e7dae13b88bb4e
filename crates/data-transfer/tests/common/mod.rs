//! Recording mock consumers and producers shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use data_transfer::{
    DataPipe, IntegrityPolicy, ProgressMonitor, Result, RuntimeParameters, TransferConsumer,
    TransferError, TransferParameters, TransferProducer, TransferTask,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Install a test subscriber once; honours RUST_LOG.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One observed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    InitConsumer(usize),
    InitProducer(usize),
    RuntimeParameters(usize),
    Start(usize),
    SetIntegrity { pipe: usize, enable: bool },
    TransferBegin(usize),
    TransferEnd(usize),
    Finish { pipe: usize, last: bool, error: Option<String> },
    PipeFinished { pipe: usize, error: Option<String> },
}

/// Shared, ordered call log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }

    pub fn position(&self, pred: impl Fn(&Event) -> bool) -> Option<usize> {
        self.events().iter().position(|e| pred(e))
    }

    pub fn starts(&self) -> Vec<usize> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                Event::Start(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn transfers(&self) -> Vec<usize> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                Event::TransferEnd(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    /// Pipes that got `enable_referential_integrity(enable)`, in call order.
    pub fn integrity_calls(&self, enable: bool) -> Vec<usize> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                Event::SetIntegrity { pipe, enable: en } if *en == enable => Some(*pipe),
                _ => None,
            })
            .collect()
    }

    /// `(pipe, error)` of every `finish_transfer(last = true)`.
    pub fn last_finishes(&self) -> Vec<(usize, Option<String>)> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                Event::Finish {
                    pipe,
                    last: true,
                    error,
                } => Some((*pipe, error.clone())),
                _ => None,
            })
            .collect()
    }

    /// Pipes that got `pipe_finished`, in call order.
    pub fn pipe_finishes(&self) -> Vec<usize> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                Event::PipeFinished { pipe, .. } => Some(*pipe),
                _ => None,
            })
            .collect()
    }

    /// Error passed to `pipe_finished` for `pipe`, if it was called.
    pub fn pipe_finish_error(&self, pipe: usize) -> Option<Option<String>> {
        self.events().into_iter().find_map(|e| match e {
            Event::PipeFinished { pipe: p, error } if p == pipe => Some(error),
            _ => None,
        })
    }

    /// Number of `finish_transfer` calls each of `pipes` pipes received.
    pub fn finish_counts(&self, pipes: usize) -> Vec<usize> {
        let mut counts = vec![0; pipes];
        for event in self.events() {
            if let Event::Finish { pipe, .. } = event {
                counts[pipe] += 1;
            }
        }
        counts
    }
}

/// Consumer whose behaviour is configured per test.
pub struct MockConsumer {
    pub id: usize,
    pub recorder: Recorder,
    pub policy: IntegrityPolicy,
    pub supports_integrity: bool,
    pub fail_start: bool,
    /// Cancel the monitor from inside `start_transfer`, then succeed.
    pub cancel_on_start: bool,
    /// Report cancellation from `start_transfer`.
    pub start_cancelled: bool,
    pub fail_disable: bool,
    pub fail_restore: bool,
    pub runtime: Mutex<Option<Arc<RuntimeParameters>>>,
}

impl MockConsumer {
    pub fn new(id: usize, recorder: &Recorder) -> Self {
        Self {
            id,
            recorder: recorder.clone(),
            policy: IntegrityPolicy::Keep,
            supports_integrity: false,
            fail_start: false,
            cancel_on_start: false,
            start_cancelled: false,
            fail_disable: false,
            fail_restore: false,
            runtime: Mutex::new(None),
        }
    }

    /// Supports integrity changes and asks for them to be disabled.
    pub fn disabling(mut self) -> Self {
        self.policy = IntegrityPolicy::DisableDuringTransfer;
        self.supports_integrity = true;
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn cancelling_on_start(mut self) -> Self {
        self.cancel_on_start = true;
        self
    }

    pub fn cancelled_on_start(mut self) -> Self {
        self.start_cancelled = true;
        self
    }

    pub fn failing_disable(mut self) -> Self {
        self.fail_disable = true;
        self
    }

    pub fn failing_restore(mut self) -> Self {
        self.fail_restore = true;
        self
    }
}

#[async_trait]
impl TransferConsumer for MockConsumer {
    fn name(&self) -> String {
        format!("target_{}", self.id)
    }

    fn init_transfer(&self, params: TransferParameters) -> Result<()> {
        assert_eq!(params.index, self.id, "pipe initialized with wrong index");
        self.recorder.push(Event::InitConsumer(self.id));
        Ok(())
    }

    fn set_runtime_parameters(&self, params: Arc<RuntimeParameters>) {
        self.recorder.push(Event::RuntimeParameters(self.id));
        *self.runtime.lock().unwrap() = Some(params);
    }

    async fn start_transfer(&self, monitor: &ProgressMonitor) -> Result<()> {
        self.recorder.push(Event::Start(self.id));
        if self.cancel_on_start {
            monitor.cancel();
        }
        if self.start_cancelled {
            return Err(TransferError::Cancelled);
        }
        if self.fail_start {
            return Err(TransferError::consumer(format!(
                "cannot create table target_{}",
                self.id
            )));
        }
        Ok(())
    }

    async fn finish_transfer(
        &self,
        _monitor: &ProgressMonitor,
        error: Option<&TransferError>,
        _task: &TransferTask,
        last: bool,
    ) {
        self.recorder.push(Event::Finish {
            pipe: self.id,
            last,
            error: error.map(ToString::to_string),
        });
    }

    async fn pipe_finished(&self, _monitor: &ProgressMonitor, error: Option<&TransferError>) {
        self.recorder.push(Event::PipeFinished {
            pipe: self.id,
            error: error.map(ToString::to_string),
        });
    }

    async fn supports_changing_referential_integrity(
        &self,
        _monitor: &ProgressMonitor,
    ) -> Result<bool> {
        Ok(self.supports_integrity)
    }

    async fn enable_referential_integrity(
        &self,
        _monitor: &ProgressMonitor,
        enable: bool,
    ) -> Result<()> {
        self.recorder.push(Event::SetIntegrity {
            pipe: self.id,
            enable,
        });
        if enable && self.fail_restore {
            return Err(TransferError::consumer(format!(
                "cannot enable constraints on target_{}",
                self.id
            )));
        }
        if !enable && self.fail_disable {
            return Err(TransferError::consumer(format!(
                "cannot disable constraints on target_{}",
                self.id
            )));
        }
        Ok(())
    }

    fn integrity_policy(&self) -> IntegrityPolicy {
        self.policy
    }
}

/// What a mock producer does when asked to transfer.
#[derive(Debug, Clone, Copy)]
pub enum Behaviour {
    /// Sleep, then report `rows`.
    Rows { rows: u64, delay: Duration },
    /// Sleep, then fail.
    Fail { delay: Duration },
    /// Block until the monitor is canceled, then report cancellation.
    WaitForCancel,
    /// Ignore cancellation entirely and sleep for a long time.
    Stuck,
    Panic,
}

pub struct MockProducer {
    pub id: usize,
    pub recorder: Recorder,
    pub behaviour: Behaviour,
    pub fail_init: bool,
    /// Report cancellation from `init_transfer`.
    pub init_cancelled: bool,
}

impl MockProducer {
    pub fn new(id: usize, recorder: &Recorder, behaviour: Behaviour) -> Self {
        Self {
            id,
            recorder: recorder.clone(),
            behaviour,
            fail_init: false,
            init_cancelled: false,
        }
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn cancelled_on_init(mut self) -> Self {
        self.init_cancelled = true;
        self
    }
}

#[async_trait]
impl TransferProducer for MockProducer {
    fn name(&self) -> String {
        format!("source_{}", self.id)
    }

    fn init_transfer(&self, params: TransferParameters) -> Result<()> {
        self.recorder.push(Event::InitProducer(params.index));
        if self.init_cancelled {
            return Err(TransferError::Cancelled);
        }
        if self.fail_init {
            return Err(TransferError::producer("unknown source table"));
        }
        Ok(())
    }

    async fn transfer_data(&self, monitor: &ProgressMonitor, _task: &TransferTask) -> Result<u64> {
        self.recorder.push(Event::TransferBegin(self.id));
        let outcome = match self.behaviour {
            Behaviour::Rows { rows, delay } => {
                tokio::time::sleep(delay).await;
                Ok(rows)
            }
            Behaviour::Fail { delay } => {
                tokio::time::sleep(delay).await;
                Err(TransferError::producer(format!("read failed on source_{}", self.id)))
            }
            Behaviour::WaitForCancel => {
                tokio::select! {
                    _ = monitor.cancelled() => Err(TransferError::Cancelled),
                    _ = tokio::time::sleep(Duration::from_secs(3600)) => Ok(0),
                }
            }
            Behaviour::Stuck => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(0)
            }
            Behaviour::Panic => panic!("producer {} exploded", self.id),
        };
        self.recorder.push(Event::TransferEnd(self.id));
        outcome
    }
}

/// Rows/delay shorthand.
pub fn rows(rows: u64, millis: u64) -> Behaviour {
    Behaviour::Rows {
        rows,
        delay: Duration::from_millis(millis),
    }
}

pub fn pipe(consumer: MockConsumer, producer: MockProducer) -> Arc<DataPipe> {
    Arc::new(DataPipe::new(Arc::new(producer), Arc::new(consumer)))
}

/// `n` plain pipes, each moving `rows_each` rows in `millis`.
pub fn simple_pipes(recorder: &Recorder, n: usize, rows_each: u64, millis: u64) -> Vec<Arc<DataPipe>> {
    (0..n)
        .map(|i| {
            pipe(
                MockConsumer::new(i, recorder),
                MockProducer::new(i, recorder, rows(rows_each, millis)),
            )
        })
        .collect()
}
