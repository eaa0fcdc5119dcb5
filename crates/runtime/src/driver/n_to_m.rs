// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Strand Contributors

//! Shared-queue scheduler.
//!
//! A fixed pool of M threads drains one shared dispatch queue of runnable
//! objects. Each object owns a runnable record: a lock, a bounded FIFO of
//! pending letters and a sleep/ready flag. Submitting to a sleeping object wakes it
//! by pushing it onto the dispatch queue; submitting to a ready object only
//! appends. A pool thread that picks up a runnable drains it until the FIFO
//! is empty and then puts it back to sleep.
//!
//! The flag keeps each runnable on the queue at most once per wake-up, so one
//! object never runs on two pool threads at once, and an idle object costs no
//! thread time at all. It also bounds the dispatch queue by the number of live
//! objects, so waking an object never blocks: a callable may wake any number
//! of other objects without stalling the pool thread running it.
//!
//! Backpressure lives in the per-object FIFO instead. Submitting to an object
//! whose FIFO is full blocks until a pool thread pops from it.

use std::{
	collections::VecDeque,
	mem,
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
};

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, trace};

use super::{Driver, require_positive, spawn_thread};
use crate::{
	callable::Letter,
	error::Result,
	object::{Object, Submitter},
};

/// Configuration for [`NToMDriver`].
#[derive(Debug, Clone)]
pub struct NToMConfig {
	/// Number of pool threads.
	///
	/// Default: number of logical CPUs
	pub threads: usize,

	/// Pending letters per object before submitters block. A callable that
	/// submits to its own object with the FIFO full blocks forever.
	///
	/// Default: 128
	pub mailbox_capacity: usize,

	/// Prefix for pool thread names; the thread index is appended.
	///
	/// Default: "strand-pool"
	pub thread_name: String,
}

impl Default for NToMConfig {
	fn default() -> Self {
		Self {
			threads: num_cpus::get(),
			mailbox_capacity: 128,
			thread_name: "strand-pool".to_string(),
		}
	}
}

impl NToMConfig {
	pub fn new(threads: usize) -> Self {
		Self::default().threads(threads)
	}

	pub fn threads(mut self, threads: usize) -> Self {
		self.threads = threads;
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

/// Point-in-time counters for an [`NToMDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NToMStats {
	/// Pool threads started.
	pub threads: usize,
	/// Runnables pushed onto the dispatch queue so far.
	pub dispatched: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
	/// Nothing pending; not on the dispatch queue.
	Asleep,
	/// On the dispatch queue or being drained by a pool thread.
	Ready,
	/// The sentinel was drained. Terminal.
	Dead,
}

struct Pending {
	fifo: VecDeque<Letter>,
	state: State,
}

/// Per-object scheduling record.
struct Runnable {
	id: u64,
	capacity: usize,
	pending: Mutex<Pending>,
	/// Signalled whenever the FIFO shrinks or the object dies.
	space: Condvar,
}

impl Runnable {
	fn new(id: u64, capacity: usize) -> Self {
		Self {
			id,
			capacity,
			pending: Mutex::new(Pending {
				fifo: VecDeque::with_capacity(capacity.min(16)),
				state: State::Asleep,
			}),
			space: Condvar::new(),
		}
	}

	/// Appends a letter, blocking while the FIFO is full. Returns `true` when
	/// the caller must push this runnable onto the dispatch queue, or the
	/// letter back when the object is dead.
	fn push(&self, letter: Letter) -> std::result::Result<bool, Letter> {
		let mut pending = self.pending.lock();
		loop {
			match pending.state {
				State::Dead => return Err(letter),
				_ if pending.fifo.len() >= self.capacity => self.space.wait(&mut pending),
				State::Ready => {
					pending.fifo.push_back(letter);
					return Ok(false);
				}
				State::Asleep => {
					pending.fifo.push_back(letter);
					pending.state = State::Ready;
					return Ok(true);
				}
			}
		}
	}

	/// Executes pending letters until the FIFO is empty or the sentinel is
	/// reached. The lock is held only to pop, never while a callable runs.
	fn drain(&self) {
		loop {
			let mut pending = self.pending.lock();
			match pending.fifo.pop_front() {
				Some(Letter::Call(callable)) => {
					drop(pending);
					self.space.notify_one();
					callable.execute();
				}
				Some(Letter::Stop(done)) => {
					// Dead under the same lock as the pop, so no submitter can
					// slip a letter in behind the sentinel.
					pending.state = State::Dead;
					let discarded = mem::take(&mut pending.fifo);
					drop(pending);
					self.space.notify_all();
					if !discarded.is_empty() {
						trace!(actor = self.id, discarded = discarded.len(), "dropped letters queued behind the sentinel");
					}
					drop(discarded);
					trace!(actor = self.id, "object terminated");
					done.release(Ok(()));
					return;
				}
				None => {
					pending.state = State::Asleep;
					return;
				}
			}
		}
	}
}

struct Inner {
	config: NToMConfig,
	dispatch: Sender<Arc<Runnable>>,
	dispatched: Arc<AtomicU64>,
	next_actor: AtomicU64,
}

/// Multiplexes any number of objects onto a fixed thread pool.
#[derive(Clone)]
pub struct NToMDriver {
	inner: Arc<Inner>,
}

impl NToMDriver {
	pub fn new(threads: usize) -> Result<Self> {
		Self::with_config(NToMConfig::new(threads))
	}

	/// Validates the config and starts the pool threads.
	pub fn with_config(config: NToMConfig) -> Result<Self> {
		require_positive(config.threads, "threads")?;
		require_positive(config.mailbox_capacity, "mailbox_capacity")?;

		let (dispatch, rx) = unbounded();
		for index in 0..config.threads {
			let rx = rx.clone();
			spawn_thread(format!("{}-{}", config.thread_name, index), move || run_pool(index, rx))?;
		}
		debug!(threads = config.threads, mailbox_capacity = config.mailbox_capacity, "pool started");

		Ok(Self {
			inner: Arc::new(Inner {
				config,
				dispatch,
				dispatched: Arc::new(AtomicU64::new(0)),
				next_actor: AtomicU64::new(0),
			}),
		})
	}

	pub fn stats(&self) -> NToMStats {
		NToMStats {
			threads: self.inner.config.threads,
			dispatched: self.inner.dispatched.load(Ordering::Acquire),
		}
	}
}

impl Driver for NToMDriver {
	fn spawn(&self) -> Result<Object> {
		let id = self.inner.next_actor.fetch_add(1, Ordering::Relaxed);
		let runnable = Arc::new(Runnable::new(id, self.inner.config.mailbox_capacity));

		Ok(Object::new(Arc::new(Scheduled {
			runnable,
			dispatch: self.inner.dispatch.clone(),
			dispatched: self.inner.dispatched.clone(),
		})))
	}
}

/// Submission side of an object on the shared pool.
struct Scheduled {
	runnable: Arc<Runnable>,
	dispatch: Sender<Arc<Runnable>>,
	dispatched: Arc<AtomicU64>,
}

impl Submitter for Scheduled {
	fn submit(&self, letter: Letter) {
		match self.runnable.push(letter) {
			Ok(false) => {}
			Ok(true) => {
				self.dispatched.fetch_add(1, Ordering::AcqRel);
				if self.dispatch.send(self.runnable.clone()).is_err() {
					error!(actor = self.runnable.id, "dispatch queue closed with work pending");
				}
			}
			Err(letter) => {
				trace!(actor = self.runnable.id, kind = letter.kind(), "object terminated, discarding letter");
			}
		}
	}
}

fn run_pool(index: usize, rx: Receiver<Arc<Runnable>>) {
	debug!(thread = index, "pool thread starting");
	while let Ok(runnable) = rx.recv() {
		runnable.drain();
	}
	debug!(thread = index, "pool thread stopped");
}
