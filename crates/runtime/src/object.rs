// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Strand Contributors

//! The public actor handle.

use std::sync::Arc;

use crate::{
	callable::{Callable, Letter, guarded},
	completion::{self, Termination},
	error::Result,
	future::{self, Future},
};

/// Where an object's letters go. Each driver supplies its own.
pub(crate) trait Submitter: Send + Sync {
	/// Hands a letter to the executor, blocking while the target is full.
	///
	/// Letters that cannot be delivered are dropped, which resolves any
	/// waiter attached to them with `Error::Terminated`.
	fn submit(&self, letter: Letter);
}

/// A handle to a serialized execution stream.
///
/// Everything submitted through one object (or any of its clones) runs one
/// at a time, in submission order per submitting thread. State guarded by an
/// object lives in the embedding type:
///
/// ```ignore
/// struct Counter {
///     object: Object,
///     hits: Arc<AtomicU64>,
/// }
///
/// impl Counter {
///     fn hit(&self) {
///         let hits = self.hits.clone();
///         self.object.submit(move || {
///             hits.fetch_add(1, Ordering::Relaxed);
///         });
///     }
/// }
/// ```
///
/// Blocking on an object from inside one of its own callables
/// (`synced_submit`, `Future::get`) deadlocks; so does blocking on a
/// co-hosted object under the n-to-one driver.
#[derive(Clone)]
pub struct Object {
	submitter: Arc<dyn Submitter>,
}

impl Object {
	pub(crate) fn new(submitter: Arc<dyn Submitter>) -> Self {
		Self {
			submitter,
		}
	}

	/// Queues `f` and returns immediately.
	pub fn submit<F>(&self, f: F)
	where
		F: FnOnce() + Send + 'static,
	{
		self.submitter.submit(Letter::Call(Callable::FireAndForget(Box::new(f))));
	}

	/// Queues `f` and blocks until it has run.
	///
	/// Effects of `f` are visible to the caller once this returns `Ok`.
	pub fn synced_submit<F>(&self, f: F) -> Result<()>
	where
		F: FnOnce() + Send + 'static,
	{
		let (release, completion) = completion::pair();
		self.submitter.submit(Letter::Call(Callable::Synced(Box::new(f), release)));
		completion.wait()
	}

	/// Queues `f` and returns a handle to its eventual result.
	pub fn future_submit<T, F>(&self, f: F) -> Future<T>
	where
		T: Send + 'static,
		F: FnOnce() -> T + Send + 'static,
	{
		let (promise, future) = future::pair();
		let body = move || promise.fulfill(guarded(f));
		self.submitter.submit(Letter::Call(Callable::Future(Box::new(body))));
		future
	}

	/// Schedules death after everything submitted before it has run.
	///
	/// Submitting after termination is not supported: such work is either
	/// discarded or, if it races the sentinel, may still run.
	pub fn terminate(&self) -> Termination {
		let (release, completion) = completion::pair();
		self.submitter.submit(Letter::Stop(release));
		Termination::new(completion)
	}
}

impl std::fmt::Debug for Object {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Object").finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use parking_lot::Mutex;

	use super::*;
	use crate::error::Error;

	/// Runs letters inline on the submitting thread.
	struct Inline {
		dead: Mutex<bool>,
	}

	impl Submitter for Inline {
		fn submit(&self, letter: Letter) {
			let mut dead = self.dead.lock();
			if *dead {
				return;
			}
			match letter {
				Letter::Call(callable) => callable.execute(),
				Letter::Stop(release) => {
					*dead = true;
					release.release(Ok(()));
				}
			}
		}
	}

	fn inline() -> Object {
		Object::new(Arc::new(Inline {
			dead: Mutex::new(false),
		}))
	}

	#[test]
	fn test_submission_modes() {
		let object = inline();
		let log = Arc::new(Mutex::new(Vec::new()));

		let l = log.clone();
		object.submit(move || l.lock().push("submit"));
		let l = log.clone();
		object.synced_submit(move || l.lock().push("synced")).unwrap();
		let future = object.future_submit(|| 5);

		assert_eq!(*log.lock(), vec!["submit", "synced"]);
		assert_eq!(future.get(), Ok(5));
	}

	#[test]
	fn test_future_panic_is_reported() {
		let object = inline();
		let future = object.future_submit(|| -> u32 { panic!("no value") });
		assert_eq!(future.get(), Err(Error::Panicked("no value".to_string())));
	}

	#[test]
	fn test_work_after_terminate_is_discarded() {
		let object = inline();
		object.terminate().wait();
		assert_eq!(object.synced_submit(|| {}), Err(Error::Terminated));
		assert_eq!(object.future_submit(|| 1).get(), Err(Error::Terminated));
	}
}
