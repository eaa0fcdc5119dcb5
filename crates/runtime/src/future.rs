// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Strand Contributors

//! Deferred, cacheable results for [`Object::future_submit`](crate::Object::future_submit).
//!
//! The executor fills a shared cell exactly once through a [`Promise`]. Any
//! number of [`Future`] clones may read it, from any thread, any number of
//! times. The first read blocks on the cell's condition variable; later reads
//! return the cached value.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};

struct Cell<T> {
	value: Mutex<Option<Result<T>>>,
	ready: Condvar,
}

impl<T> Cell<T> {
	fn set(&self, outcome: Result<T>) {
		let mut value = self.value.lock();
		debug_assert!(value.is_none(), "future cell written twice");
		*value = Some(outcome);
		drop(value);
		self.ready.notify_all();
	}
}

/// Creates a connected promise/future pair over an empty cell.
pub(crate) fn pair<T>() -> (Promise<T>, Future<T>) {
	let cell = Arc::new(Cell {
		value: Mutex::new(None),
		ready: Condvar::new(),
	});
	(
		Promise {
			cell: Some(cell.clone()),
		},
		Future {
			cell,
		},
	)
}

/// Write side of a future cell, owned by the submitted callable.
///
/// A promise dropped before fulfilment resolves the cell to
/// [`Error::Terminated`] so readers never block on work that will not run.
pub(crate) struct Promise<T> {
	cell: Option<Arc<Cell<T>>>,
}

impl<T> Promise<T> {
	pub(crate) fn fulfill(mut self, outcome: Result<T>) {
		if let Some(cell) = self.cell.take() {
			cell.set(outcome);
		}
	}
}

impl<T> Drop for Promise<T> {
	fn drop(&mut self) {
		if let Some(cell) = self.cell.take() {
			cell.set(Err(Error::Terminated));
		}
	}
}

/// Read side of a deferred result.
pub struct Future<T> {
	cell: Arc<Cell<T>>,
}

impl<T: Clone> Future<T> {
	/// Blocks until the result is available, then returns a copy of it.
	///
	/// Fails with [`Error::Panicked`] if the callable panicked and with
	/// [`Error::Terminated`] if it was discarded by a dead object.
	pub fn get(&self) -> Result<T> {
		let mut value = self.cell.value.lock();
		loop {
			if let Some(outcome) = value.as_ref() {
				return outcome.clone();
			}
			self.cell.ready.wait(&mut value);
		}
	}

	/// Returns the result if it is already available.
	pub fn try_get(&self) -> Option<Result<T>> {
		self.cell.value.lock().clone()
	}
}

impl<T> Future<T> {
	/// Whether the executor has resolved this future.
	pub fn is_ready(&self) -> bool {
		self.cell.value.lock().is_some()
	}
}

impl<T> Clone for Future<T> {
	fn clone(&self) -> Self {
		Self {
			cell: self.cell.clone(),
		}
	}
}

impl<T> std::fmt::Debug for Future<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Future").field("ready", &self.is_ready()).finish()
	}
}
