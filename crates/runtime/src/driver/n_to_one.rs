// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Strand Contributors

//! Worker-pool scheduler with capacity-based admission.
//!
//! Each worker is one OS thread with a private mailbox, hosting up to N
//! objects. Workers advertise free slots on a shared offer queue; creating an
//! object consumes an offer, or starts a new worker when none is available.
//!
//! Objects on the same worker share its execution order. A callable that
//! blocks stalls every object hosted on that worker.

use std::sync::{
	Arc,
	atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
};

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::{Driver, require_positive, spawn_thread};
use crate::{
	callable::Letter,
	error::Result,
	object::{Object, Submitter},
};

/// Configuration for [`NToOneDriver`].
#[derive(Debug, Clone)]
pub struct NToOneConfig {
	/// Maximum objects hosted by one worker thread.
	///
	/// Default: 32
	pub actors_per_worker: usize,

	/// Pending deliveries per worker before submitters block.
	///
	/// Default: 128
	pub mailbox_capacity: usize,

	/// Prefix for worker thread names; the worker index is appended.
	///
	/// Default: "strand-worker"
	pub thread_name: String,
}

impl Default for NToOneConfig {
	fn default() -> Self {
		Self {
			actors_per_worker: 32,
			mailbox_capacity: 128,
			thread_name: "strand-worker".to_string(),
		}
	}
}

impl NToOneConfig {
	pub fn new(actors_per_worker: usize) -> Self {
		Self::default().actors_per_worker(actors_per_worker)
	}

	pub fn actors_per_worker(mut self, n: usize) -> Self {
		self.actors_per_worker = n;
		self
	}

	pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
		self.mailbox_capacity = capacity;
		self
	}

	pub fn thread_name(mut self, name: impl Into<String>) -> Self {
		self.thread_name = name.into();
		self
	}
}

/// Point-in-time view of an [`NToOneDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NToOneStats {
	/// Workers started so far.
	pub workers: usize,
	/// Objects hosted per worker, as last published by each worker thread.
	pub hosted: Vec<usize>,
}

/// One hosted object, shared between its handles and its worker.
struct Slot {
	id: u64,
	/// Written by the worker thread only.
	dead: AtomicBool,
}

impl Slot {
	fn is_dead(&self) -> bool {
		self.dead.load(Ordering::Acquire)
	}
}

enum Delivery {
	/// A new object was placed on this worker.
	Admit,
	Letter(Arc<Slot>, Letter),
}

/// A free slot on a worker.
struct Offer {
	worker: usize,
}

/// The driver's reference to a worker. The driver never touches the worker
/// itself, only its mailbox and its published gauge.
struct WorkerLink {
	tx: Sender<Delivery>,
	hosted: Arc<AtomicUsize>,
}

struct Inner {
	config: NToOneConfig,
	workers: Mutex<Vec<WorkerLink>>,
	offers_tx: Sender<Offer>,
	offers_rx: Receiver<Offer>,
	next_actor: AtomicU64,
}

/// Packs up to N objects onto each worker thread.
#[derive(Clone)]
pub struct NToOneDriver {
	inner: Arc<Inner>,
}

impl NToOneDriver {
	pub fn new(actors_per_worker: usize) -> Result<Self> {
		Self::with_config(NToOneConfig::new(actors_per_worker))
	}

	pub fn with_config(config: NToOneConfig) -> Result<Self> {
		require_positive(config.actors_per_worker, "actors_per_worker")?;
		require_positive(config.mailbox_capacity, "mailbox_capacity")?;

		let (offers_tx, offers_rx) = unbounded();
		Ok(Self {
			inner: Arc::new(Inner {
				config,
				workers: Mutex::new(Vec::new()),
				offers_tx,
				offers_rx,
				next_actor: AtomicU64::new(0),
			}),
		})
	}

	pub fn stats(&self) -> NToOneStats {
		let workers = self.inner.workers.lock();
		NToOneStats {
			workers: workers.len(),
			hosted: workers.iter().map(|link| link.hosted.load(Ordering::Acquire)).collect(),
		}
	}

	/// Starts a worker that already hosts one object and advertises the rest
	/// of its capacity. Called with the worker list locked.
	fn start_worker(&self, index: usize) -> Result<WorkerLink> {
		let config = &self.inner.config;
		let (tx, rx) = bounded(config.mailbox_capacity);
		let hosted = Arc::new(AtomicUsize::new(1));

		let worker = Worker {
			index,
			capacity: config.actors_per_worker,
			rx,
			offers: self.inner.offers_tx.clone(),
			gauge: hosted.clone(),
			hosted: 1,
		};

		let thread_name = format!("{}-{}", config.thread_name, index);
		spawn_thread(thread_name, move || worker.run())?;

		// Registered before the caller sees the object, so the next spawn
		// can already be admitted here.
		for _ in 1..config.actors_per_worker {
			let _ = self.inner.offers_tx.send(Offer {
				worker: index,
			});
		}

		debug!(worker = index, capacity = config.actors_per_worker, "worker started");
		Ok(WorkerLink {
			tx,
			hosted,
		})
	}
}

impl Driver for NToOneDriver {
	fn spawn(&self) -> Result<Object> {
		let slot = Arc::new(Slot {
			id: self.inner.next_actor.fetch_add(1, Ordering::Relaxed),
			dead: AtomicBool::new(false),
		});

		let (tx, admit) = {
			let mut workers = self.inner.workers.lock();
			match self.inner.offers_rx.try_recv() {
				Ok(offer) => {
					trace!(actor = slot.id, worker = offer.worker, "admitted on advertised slot");
					(workers[offer.worker].tx.clone(), true)
				}
				Err(_) => {
					let index = workers.len();
					let link = self.start_worker(index)?;
					let tx = link.tx.clone();
					workers.push(link);
					trace!(actor = slot.id, worker = index, "admitted on new worker");
					(tx, false)
				}
			}
		};

		// Sent outside the lock: the worker mailbox may be full.
		if admit && tx.send(Delivery::Admit).is_err() {
			trace!(actor = slot.id, "worker gone, admission dropped");
		}

		Ok(Object::new(Arc::new(Hosted {
			slot,
			tx,
		})))
	}
}

/// Submission side of an object hosted on a worker.
struct Hosted {
	slot: Arc<Slot>,
	tx: Sender<Delivery>,
}

impl Submitter for Hosted {
	fn submit(&self, letter: Letter) {
		if self.slot.is_dead() {
			trace!(actor = self.slot.id, kind = letter.kind(), "object terminated, discarding letter");
			return;
		}
		if self.tx.send(Delivery::Letter(self.slot.clone(), letter)).is_err() {
			trace!(actor = self.slot.id, "worker gone, discarding letter");
		}
	}
}

/// State owned by a worker thread.
struct Worker {
	index: usize,
	capacity: usize,
	rx: Receiver<Delivery>,
	offers: Sender<Offer>,
	gauge: Arc<AtomicUsize>,
	hosted: usize,
}

impl Worker {
	fn run(mut self) {
		debug!(worker = self.index, "worker thread starting");
		while let Ok(delivery) = self.rx.recv() {
			match delivery {
				Delivery::Admit => {
					self.hosted += 1;
					debug_assert!(self.hosted <= self.capacity);
					self.publish();
				}
				Delivery::Letter(slot, Letter::Call(callable)) => {
					if slot.is_dead() {
						trace!(actor = slot.id, kind = callable.kind(), "discarding letter for dead object");
						continue;
					}
					callable.execute();
				}
				Delivery::Letter(slot, Letter::Stop(done)) => {
					if !slot.dead.swap(true, Ordering::AcqRel) {
						self.hosted -= 1;
						self.publish();
						let _ = self.offers.send(Offer {
							worker: self.index,
						});
						trace!(actor = slot.id, worker = self.index, hosted = self.hosted, "object terminated");
					}
					done.release(Ok(()));
				}
			}
		}
		debug!(worker = self.index, "worker thread stopped");
	}

	fn publish(&self) {
		self.gauge.store(self.hosted, Ordering::Release);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::Error;

	#[test]
	fn test_zero_actors_per_worker_rejected() {
		assert!(matches!(NToOneDriver::new(0), Err(Error::Config(_))));
	}

	#[test]
	fn test_first_object_starts_worker() {
		let driver = NToOneDriver::new(4).unwrap();
		assert_eq!(driver.stats().workers, 0);

		let object = driver.spawn().unwrap();
		object.synced_submit(|| {}).unwrap();
		assert_eq!(
			driver.stats(),
			NToOneStats {
				workers: 1,
				hosted: vec![1]
			}
		);
	}

	#[test]
	fn test_freed_slot_is_readvertised() {
		let driver = NToOneDriver::new(2).unwrap();
		let first = driver.spawn().unwrap();
		let second = driver.spawn().unwrap();
		second.synced_submit(|| {}).unwrap();
		assert_eq!(driver.stats().hosted, vec![2]);

		first.terminate().wait();
		assert_eq!(driver.stats().hosted, vec![1]);

		let third = driver.spawn().unwrap();
		third.synced_submit(|| {}).unwrap();
		assert_eq!(
			driver.stats(),
			NToOneStats {
				workers: 1,
				hosted: vec![2]
			}
		);
	}

	#[test]
	fn test_double_terminate_frees_one_slot() {
		let driver = NToOneDriver::new(3).unwrap();
		let object = driver.spawn().unwrap();
		let other = driver.spawn().unwrap();
		other.synced_submit(|| {}).unwrap();

		let first = object.terminate();
		let second = object.terminate();
		first.wait();
		second.wait();

		other.synced_submit(|| {}).unwrap();
		assert_eq!(driver.stats().hosted, vec![1]);
	}

	#[test]
	fn test_dead_object_does_not_stall_neighbour() {
		let driver = NToOneDriver::new(2).unwrap();
		let dead = driver.spawn().unwrap();
		let alive = driver.spawn().unwrap();

		dead.terminate().wait();
		assert_eq!(dead.synced_submit(|| {}), Err(Error::Terminated));
		assert_eq!(alive.future_submit(|| 9).get(), Ok(9));
	}
}
