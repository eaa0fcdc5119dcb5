// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Strand Contributors

//! Dedicated-thread scheduler.
//!
//! Each object runs on its own OS thread behind a private bounded mailbox.
//! Thread count equals object count, so this suits small populations or
//! objects whose callables block.

use std::sync::{
	Arc,
	atomic::{AtomicU64, AtomicUsize, Ordering},
};

use crossbeam_channel::{Receiver, SendError, Sender, bounded};
use tracing::{debug, trace};

use super::{Driver, require_positive, spawn_thread};
use crate::{
	callable::Letter,
	error::Result,
	object::{Object, Submitter},
};

/// Configuration for [`OneToOneDriver`].
#[derive(Debug, Clone)]
pub struct OneToOneConfig {
	/// Pending letters per object before submitters block.
	///
	/// Default: 128
	pub mailbox_capacity: usize,

	/// Prefix for thread names; the object id is appended.
	///
	/// Default: "strand-actor"
	pub thread_name: String,
}

impl Default for OneToOneConfig {
	fn default() -> Self {
		Self {
			mailbox_capacity: 128,
			thread_name: "strand-actor".to_string(),
		}
	}
}

impl OneToOneConfig {
	pub fn new() -> Self {
		Self::default()
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

/// Point-in-time counters for a [`OneToOneDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneToOneStats {
	/// Objects created so far.
	pub spawned: u64,
	/// Executor threads that have not exited yet.
	pub running: usize,
}

struct Inner {
	config: OneToOneConfig,
	spawned: AtomicU64,
	running: Arc<AtomicUsize>,
}

/// Gives every object its own thread.
#[derive(Clone)]
pub struct OneToOneDriver {
	inner: Arc<Inner>,
}

impl OneToOneDriver {
	pub fn new() -> Self {
		Self::build(OneToOneConfig::default())
	}

	pub fn with_config(config: OneToOneConfig) -> Result<Self> {
		require_positive(config.mailbox_capacity, "mailbox_capacity")?;
		Ok(Self::build(config))
	}

	fn build(config: OneToOneConfig) -> Self {
		Self {
			inner: Arc::new(Inner {
				config,
				spawned: AtomicU64::new(0),
				running: Arc::new(AtomicUsize::new(0)),
			}),
		}
	}

	pub fn stats(&self) -> OneToOneStats {
		OneToOneStats {
			spawned: self.inner.spawned.load(Ordering::Relaxed),
			running: self.inner.running.load(Ordering::Acquire),
		}
	}
}

impl Default for OneToOneDriver {
	fn default() -> Self {
		Self::new()
	}
}

impl Driver for OneToOneDriver {
	fn spawn(&self) -> Result<Object> {
		let id = self.inner.spawned.fetch_add(1, Ordering::Relaxed);
		let (tx, rx) = bounded(self.inner.config.mailbox_capacity);

		let thread_name = format!("{}-{}", self.inner.config.thread_name, id);
		let running = self.inner.running.clone();
		running.fetch_add(1, Ordering::AcqRel);

		let exiting = running.clone();
		let started = spawn_thread(thread_name.clone(), move || {
			debug!(actor = %thread_name, "dedicated thread starting");
			run_mailbox(rx);
			exiting.fetch_sub(1, Ordering::AcqRel);
			debug!(actor = %thread_name, "dedicated thread stopped");
		});

		if let Err(err) = started {
			running.fetch_sub(1, Ordering::AcqRel);
			return Err(err);
		}

		Ok(Object::new(Arc::new(Mailbox {
			tx,
		})))
	}
}

/// Submission side of a dedicated mailbox.
struct Mailbox {
	tx: Sender<Letter>,
}

impl Submitter for Mailbox {
	fn submit(&self, letter: Letter) {
		if let Err(SendError(letter)) = self.tx.send(letter) {
			trace!(kind = letter.kind(), "object terminated, discarding letter");
		}
	}
}

/// Drains the mailbox until the sentinel arrives or every handle is gone.
fn run_mailbox(rx: Receiver<Letter>) {
	loop {
		match rx.recv() {
			Ok(Letter::Call(callable)) => callable.execute(),
			Ok(Letter::Stop(done)) => {
				// Close the mailbox before releasing the terminator so that
				// anything submitted after `wait` returns fails fast.
				let discarded = rx.try_iter().count();
				drop(rx);
				if discarded > 0 {
					trace!(discarded, "dropped letters queued behind the sentinel");
				}
				done.release(Ok(()));
				return;
			}
			Err(_) => {
				debug!("all handles dropped, stopping");
				return;
			}
		}
	}
}
