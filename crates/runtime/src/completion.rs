// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Strand Contributors

//! Single-use release signals.
//!
//! A [`Release`] travels with a callable to the executor; the matching
//! [`Completion`] stays with the submitting thread. Dropping the release
//! without firing it wakes the waiter with [`Error::Terminated`], which is
//! how discarded work is reported back to blocked submitters.

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::error::{Error, Result};

/// Creates a connected release/completion pair.
pub(crate) fn pair() -> (Release, Completion) {
	let (tx, rx) = bounded(1);
	(
		Release {
			tx,
		},
		Completion {
			rx,
		},
	)
}

/// Executor side of a single-use signal.
pub(crate) struct Release {
	tx: Sender<Result<()>>,
}

impl Release {
	/// Fires the signal with the outcome of the associated work.
	pub(crate) fn release(self, outcome: Result<()>) {
		// The waiter may have gone away; nothing to report then.
		let _ = self.tx.send(outcome);
	}
}

/// Submitter side of a single-use signal.
pub(crate) struct Completion {
	rx: Receiver<Result<()>>,
}

impl Completion {
	/// Blocks until the release fires or is dropped.
	pub(crate) fn wait(self) -> Result<()> {
		self.rx.recv().unwrap_or(Err(Error::Terminated))
	}
}

/// Handle returned by [`Object::terminate`](crate::Object::terminate).
///
/// Waiting is optional. Dropping the handle does not cancel termination.
#[must_use = "dropping a Termination does not wait for the object to die"]
pub struct Termination {
	completion: Completion,
}

impl Termination {
	pub(crate) fn new(completion: Completion) -> Self {
		Self {
			completion,
		}
	}

	/// Blocks until the executor has observed the termination sentinel.
	///
	/// Also returns when the sentinel was discarded because the object was
	/// already dead. Either way the object accepts no further work.
	pub fn wait(self) {
		let _ = self.completion.wait();
	}
}

impl std::fmt::Debug for Termination {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Termination").finish_non_exhaustive()
	}
}
