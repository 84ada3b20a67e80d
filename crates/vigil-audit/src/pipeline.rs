// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded record queue and the background fan-out worker.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::config::QueueOverflowPolicy;
use crate::error::{TelemetryError, TelemetryResult};
use crate::event::LogLevel;
use crate::record::LogRecord;
use crate::sink::LogSink;

/// Last-resort failure channel.
///
/// Writes straight to standard error so a failing sink can never recurse
/// back into the engine.
pub(crate) fn fallback_report(context: &str, error: &dyn std::fmt::Display) {
	eprintln!("vigil-audit: {context}: {error}");
}

struct QueueState {
	records: VecDeque<LogRecord>,
	closed: bool,
	dropped: u64,
}

/// Bounded FIFO queue between callers and the fan-out worker.
///
/// Pushes never block. On overflow the default policy evicts the oldest
/// queued non-critical record; a critical newcomer is admitted even when
/// everything queued is critical.
pub struct RecordQueue {
	state: Mutex<QueueState>,
	capacity: usize,
	policy: QueueOverflowPolicy,
	notify: Notify,
}

impl RecordQueue {
	pub fn new(capacity: usize, policy: QueueOverflowPolicy) -> Self {
		Self {
			state: Mutex::new(QueueState {
				records: VecDeque::with_capacity(capacity.min(1024)),
				closed: false,
				dropped: 0,
			}),
			capacity,
			policy,
			notify: Notify::new(),
		}
	}

	/// Enqueues a record. The error says why it was dropped.
	pub fn push(&self, record: LogRecord) -> TelemetryResult<()> {
		{
			let mut state = self.state.lock();

			if state.closed {
				return Err(TelemetryError::Shutdown);
			}

			if state.records.len() >= self.capacity {
				match self.policy {
					QueueOverflowPolicy::DropNewest => {
						state.dropped += 1;
						return Err(TelemetryError::QueueFull);
					}
					QueueOverflowPolicy::DropOldest => {
						let victim = state
							.records
							.iter()
							.position(|r| r.level < LogLevel::Critical);
						match victim {
							Some(index) => {
								state.records.remove(index);
								state.dropped += 1;
							}
							None if record.level < LogLevel::Critical => {
								state.dropped += 1;
								return Err(TelemetryError::QueueFull);
							}
							// Everything queued is critical and so is the
							// newcomer: admit it past capacity rather than
							// lose it.
							None => {}
						}
					}
				}
			}

			state.records.push_back(record);
		}

		self.notify.notify_one();
		Ok(())
	}

	fn pop(&self) -> (Option<LogRecord>, bool) {
		let mut state = self.state.lock();
		(state.records.pop_front(), state.closed)
	}

	/// Closes the queue. Queued records are still drained by the worker.
	pub fn close(&self) {
		self.state.lock().closed = true;
		self.notify.notify_one();
	}

	/// Records dropped by the overflow policy so far.
	pub fn dropped(&self) -> u64 {
		self.state.lock().dropped
	}

	pub fn len(&self) -> usize {
		self.state.lock().records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.state.lock().records.is_empty()
	}
}

/// Owns the queue, the sink registry, and the fan-out worker.
pub struct Pipeline {
	queue: Arc<RecordQueue>,
	worker: Mutex<Option<JoinHandle<()>>>,
}

impl Pipeline {
	pub fn new(
		sinks: Vec<Arc<dyn LogSink>>,
		queue_capacity: usize,
		policy: QueueOverflowPolicy,
	) -> Self {
		let queue = Arc::new(RecordQueue::new(queue_capacity, policy));
		let worker = tokio::spawn(Self::worker_loop(Arc::clone(&queue), sinks));

		Self {
			queue,
			worker: Mutex::new(Some(worker)),
		}
	}

	async fn worker_loop(queue: Arc<RecordQueue>, sinks: Vec<Arc<dyn LogSink>>) {
		loop {
			let (record, closed) = queue.pop();

			match record {
				Some(record) => {
					let record = Arc::new(record);
					for sink in &sinks {
						if !sink.filter().allows(&record) {
							continue;
						}
						// One failing sink must not stop delivery to the
						// rest.
						if let Err(e) = sink.publish(Arc::clone(&record)).await {
							let error = TelemetryError::Sink {
								sink: sink.name().to_string(),
								source: e,
							};
							fallback_report("record delivery failed", &error);
						}
					}
				}
				None if closed => break,
				None => queue.notify.notified().await,
			}
		}
	}

	/// Enqueues a record for delivery. The error says why it was dropped.
	pub fn publish(&self, record: LogRecord) -> TelemetryResult<()> {
		self.queue.push(record)
	}

	/// Records dropped by the overflow policy so far.
	pub fn dropped(&self) -> u64 {
		self.queue.dropped()
	}

	/// Closes the queue and waits for the worker to drain it.
	pub async fn shutdown(&self) {
		self.queue.close();
		let worker = self.worker.lock().take();
		if let Some(worker) = worker {
			if let Err(e) = worker.await {
				fallback_report("pipeline worker join failed", &e);
			}
		}
	}
}
