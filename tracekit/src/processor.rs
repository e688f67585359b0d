//! Export processors.
//!
//! Processors sit between the tracer and a [`SpanExporter`] and decide
//! where export work runs. [`SimpleExportProcessor`] exports inline on the
//! calling thread, which is right for tests and short-lived CLI runs.
//! [`BatchExportProcessor`] hands batches to a dedicated background thread
//! over a bounded queue, so the request path never waits on network I/O.
//!
//! Whatever goes wrong below a processor is logged and swallowed; the
//! fallible surface (`force_flush`, `shutdown`) exists for hosts that
//! explicitly want to block on delivery at process exit.

use crate::error::TraceError;
use crate::export::SpanExporter;
use crate::span::SpanData;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const DEFAULT_MAX_QUEUE_SIZE: usize = 2_048;
const DEFAULT_MAX_EXPORT_BATCH_SIZE: usize = 512;
const DEFAULT_SCHEDULED_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_CONTROL_TIMEOUT: Duration = Duration::from_secs(5);

/// Interface between the tracer and the export machinery.
pub trait ExportProcessor: Send + Sync + Debug {
    /// Accept a batch of completed spans. Fire-and-forget: implementations
    /// must not block the caller on network I/O and must not fail.
    fn on_flush(&self, batch: Vec<SpanData>);

    /// Push everything buffered out to the exporter.
    fn force_flush(&self) -> Result<(), TraceError>;

    /// Flush and release the exporter. Safe to call more than once; later
    /// calls report [`TraceError::AlreadyShutdown`].
    fn shutdown(&self) -> Result<(), TraceError>;
}

/// Exports every batch inline on the calling thread.
#[derive(Debug)]
pub struct SimpleExportProcessor {
    exporter: Mutex<Box<dyn SpanExporter>>,
}

impl SimpleExportProcessor {
    /// Create a processor exporting inline through `exporter`.
    pub fn new(exporter: Box<dyn SpanExporter>) -> Self {
        SimpleExportProcessor {
            exporter: Mutex::new(exporter),
        }
    }
}

impl ExportProcessor for SimpleExportProcessor {
    fn on_flush(&self, batch: Vec<SpanData>) {
        if batch.is_empty() {
            return;
        }
        let result = self
            .exporter
            .lock()
            .map_err(|_| TraceError::Internal("exporter lock poisoned".to_owned()))
            .and_then(|mut exporter| exporter.export(batch));
        if let Err(err) = result {
            tracing::debug!(error = %err, "inline span export failed");
        }
    }

    fn force_flush(&self) -> Result<(), TraceError> {
        // Nothing is ever buffered.
        Ok(())
    }

    fn shutdown(&self) -> Result<(), TraceError> {
        self.exporter
            .lock()
            .map(|mut exporter| exporter.shutdown())
            .map_err(|_| TraceError::Internal("exporter lock poisoned at shutdown".to_owned()))
    }
}

/// Messages exchanged between producers and the background thread.
#[derive(Debug)]
enum BatchMessage {
    ExportBatch(Vec<SpanData>),
    ForceFlush(SyncSender<Result<(), TraceError>>),
    Shutdown(SyncSender<Result<(), TraceError>>),
}

/// Queue bounds and scheduling for [`BatchExportProcessor`].
#[derive(Clone, Debug)]
pub struct BatchConfig {
    max_queue_size: usize,
    max_export_batch_size: usize,
    scheduled_delay: Duration,
    control_timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            max_export_batch_size: DEFAULT_MAX_EXPORT_BATCH_SIZE,
            scheduled_delay: DEFAULT_SCHEDULED_DELAY,
            control_timeout: DEFAULT_CONTROL_TIMEOUT,
        }
    }
}

impl BatchConfig {
    /// Start building a batch configuration.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder::default()
    }
}

/// Builder for [`BatchConfig`].
#[derive(Clone, Debug, Default)]
pub struct BatchConfigBuilder {
    max_queue_size: Option<usize>,
    max_export_batch_size: Option<usize>,
    scheduled_delay: Option<Duration>,
    control_timeout: Option<Duration>,
}

impl BatchConfigBuilder {
    /// Bound on queued batches; producers drop batches beyond it.
    pub fn with_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = Some(max_queue_size.max(1));
        self
    }

    /// Number of buffered spans that triggers an early export.
    pub fn with_max_export_batch_size(mut self, max_export_batch_size: usize) -> Self {
        self.max_export_batch_size = Some(max_export_batch_size.max(1));
        self
    }

    /// Delay between two scheduled exports.
    pub fn with_scheduled_delay(mut self, scheduled_delay: Duration) -> Self {
        self.scheduled_delay = Some(scheduled_delay);
        self
    }

    /// Wait for force-flush and shutdown acknowledgements.
    pub fn with_control_timeout(mut self, control_timeout: Duration) -> Self {
        self.control_timeout = Some(control_timeout);
        self
    }

    /// Finish the configuration.
    pub fn build(self) -> BatchConfig {
        BatchConfig {
            max_queue_size: self.max_queue_size.unwrap_or(DEFAULT_MAX_QUEUE_SIZE),
            max_export_batch_size: self
                .max_export_batch_size
                .unwrap_or(DEFAULT_MAX_EXPORT_BATCH_SIZE),
            scheduled_delay: self.scheduled_delay.unwrap_or(DEFAULT_SCHEDULED_DELAY),
            control_timeout: self.control_timeout.unwrap_or(DEFAULT_CONTROL_TIMEOUT),
        }
    }
}

/// A processor with a dedicated background thread draining a bounded queue.
///
/// `on_flush` enqueues with `try_send` and drops the batch when the queue
/// is full, counting the drop instead of blocking the producer.
#[derive(Debug)]
pub struct BatchExportProcessor {
    sender: SyncSender<BatchMessage>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
    control_timeout: Duration,
    is_shutdown: AtomicBool,
    dropped_batches: Arc<AtomicUsize>,
}

impl BatchExportProcessor {
    /// Spawn the background thread and return the processor driving it.
    pub fn new<E>(exporter: E, config: BatchConfig) -> Self
    where
        E: SpanExporter + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel(config.max_queue_size);
        let scheduled_delay = config.scheduled_delay;
        let max_export_batch_size = config.max_export_batch_size;

        let handle = thread::Builder::new()
            .name("tracekit-batch-exporter".to_owned())
            .spawn(move || {
                let mut exporter = exporter;
                let mut pending: Vec<SpanData> = Vec::new();
                let mut last_export = Instant::now();

                loop {
                    let timeout = scheduled_delay.saturating_sub(last_export.elapsed());
                    match receiver.recv_timeout(timeout) {
                        Ok(BatchMessage::ExportBatch(mut batch)) => {
                            pending.append(&mut batch);
                            if pending.len() >= max_export_batch_size
                                || last_export.elapsed() >= scheduled_delay
                            {
                                let _ = export_pending(&mut exporter, &mut pending);
                                last_export = Instant::now();
                            }
                        }
                        Ok(BatchMessage::ForceFlush(ack)) => {
                            let result = export_pending(&mut exporter, &mut pending);
                            let _ = ack.send(result);
                            last_export = Instant::now();
                        }
                        Ok(BatchMessage::Shutdown(ack)) => {
                            let result = export_pending(&mut exporter, &mut pending);
                            exporter.shutdown();
                            let _ = ack.send(result);
                            break;
                        }
                        Err(RecvTimeoutError::Timeout) => {
                            let _ = export_pending(&mut exporter, &mut pending);
                            last_export = Instant::now();
                        }
                        Err(RecvTimeoutError::Disconnected) => {
                            let _ = export_pending(&mut exporter, &mut pending);
                            break;
                        }
                    }
                }
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(err) => {
                tracing::warn!(error = %err, "failed to spawn batch export thread, spans will be dropped");
                None
            }
        };

        BatchExportProcessor {
            sender,
            handle: Mutex::new(handle),
            control_timeout: config.control_timeout,
            is_shutdown: AtomicBool::new(false),
            dropped_batches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of batches dropped because the queue was full.
    pub fn dropped_batches(&self) -> usize {
        self.dropped_batches.load(Ordering::Relaxed)
    }
}

fn export_pending<E>(exporter: &mut E, pending: &mut Vec<SpanData>) -> Result<(), TraceError>
where
    E: SpanExporter,
{
    if pending.is_empty() {
        return Ok(());
    }
    let result = exporter.export(std::mem::take(pending));
    if let Err(ref err) = result {
        tracing::warn!(error = %err, "batch span export failed");
    }
    result
}

impl ExportProcessor for BatchExportProcessor {
    fn on_flush(&self, batch: Vec<SpanData>) {
        if batch.is_empty() || self.is_shutdown.load(Ordering::Relaxed) {
            return;
        }
        match self.sender.try_send(BatchMessage::ExportBatch(batch)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped_batches.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(dropped, "export queue full, dropping span batch");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!("export thread gone, dropping span batch");
            }
        }
    }

    fn force_flush(&self) -> Result<(), TraceError> {
        if self.is_shutdown.load(Ordering::Relaxed) {
            return Err(TraceError::AlreadyShutdown);
        }
        let (ack, done) = mpsc::sync_channel(1);
        self.sender
            .try_send(BatchMessage::ForceFlush(ack))
            .map_err(|_| TraceError::Internal("export queue unavailable".to_owned()))?;
        done.recv_timeout(self.control_timeout)
            .map_err(|_| TraceError::Timeout(self.control_timeout))?
    }

    fn shutdown(&self) -> Result<(), TraceError> {
        if self.is_shutdown.swap(true, Ordering::Relaxed) {
            return Err(TraceError::AlreadyShutdown);
        }
        let (ack, done) = mpsc::sync_channel(1);
        self.sender
            .try_send(BatchMessage::Shutdown(ack))
            .map_err(|_| TraceError::Internal("export queue unavailable".to_owned()))?;
        let result = done
            .recv_timeout(self.control_timeout)
            .map_err(|_| TraceError::Timeout(self.control_timeout))?;
        if let Ok(mut guard) = self.handle.lock() {
            if let Some(handle) = guard.take() {
                let _ = handle.join();
            }
        }
        result
    }
}
