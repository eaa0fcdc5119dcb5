// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Strand Contributors

//! Units of deferred work and the letters that carry them.
//!
//! Payload shapes are resolved once, at submission time, into the closed
//! [`Callable`] enum. Executors only ever see a [`Letter`]: either a callable
//! or the termination sentinel.

use std::{
	any::Any,
	panic::{AssertUnwindSafe, catch_unwind},
};

use tracing::error;

use crate::{
	completion::Release,
	error::{Error, Result},
};

pub(crate) type Body = Box<dyn FnOnce() + Send + 'static>;

/// A unit of deferred work.
pub(crate) enum Callable {
	/// Executed with no caller synchronization.
	FireAndForget(Body),
	/// Executed, then releases the submitter blocked on the matching completion.
	Synced(Body, Release),
	/// Executed; the body writes its own result into a future cell.
	Future(Body),
}

impl Callable {
	/// Runs the body on the calling (executor) thread.
	///
	/// Panics are contained here so the executor keeps serving its actors.
	pub(crate) fn execute(self) {
		match self {
			Callable::FireAndForget(body) => {
				if let Err(err) = guarded(body) {
					error!(kind = "fire_and_forget", %err, "callable failed");
				}
			}
			Callable::Synced(body, release) => {
				let outcome = guarded(body);
				if let Err(err) = &outcome {
					error!(kind = "synced", %err, "callable failed");
				}
				release.release(outcome);
			}
			Callable::Future(body) => {
				if let Err(err) = guarded(body) {
					error!(kind = "future", %err, "callable failed");
				}
			}
		}
	}

	pub(crate) fn kind(&self) -> &'static str {
		match self {
			Callable::FireAndForget(_) => "fire_and_forget",
			Callable::Synced(..) => "synced",
			Callable::Future(_) => "future",
		}
	}
}

/// What travels through a mailbox.
pub(crate) enum Letter {
	Call(Callable),
	/// The termination sentinel. The release fires once the executor has
	/// observed it.
	Stop(Release),
}

impl Letter {
	pub(crate) fn kind(&self) -> &'static str {
		match self {
			Letter::Call(callable) => callable.kind(),
			Letter::Stop(_) => "stop",
		}
	}
}

/// Runs `f`, turning a panic into [`Error::Panicked`].
pub(crate) fn guarded<T>(f: impl FnOnce() -> T) -> Result<T> {
	catch_unwind(AssertUnwindSafe(f)).map_err(|payload| Error::Panicked(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		msg.to_string()
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		msg.clone()
	} else {
		"unknown panic payload".to_string()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	};

	use super::*;
	use crate::completion;

	#[test]
	fn test_guarded_passes_value_through() {
		assert_eq!(guarded(|| 7), Ok(7));
	}

	#[test]
	fn test_guarded_captures_str_and_string_panics() {
		assert_eq!(guarded(|| panic!("static")), Err::<(), _>(Error::Panicked("static".to_string())));

		let n = 3;
		assert_eq!(guarded(|| panic!("formatted {n}")), Err::<(), _>(Error::Panicked("formatted 3".to_string())));
	}

	#[test]
	fn test_fire_and_forget_runs_body() {
		let hits = Arc::new(AtomicUsize::new(0));
		let counter = hits.clone();
		Callable::FireAndForget(Box::new(move || {
			counter.fetch_add(1, Ordering::SeqCst);
		}))
		.execute();
		assert_eq!(hits.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn test_synced_releases_with_outcome() {
		let (release, completion) = completion::pair();
		Callable::Synced(Box::new(|| {}), release).execute();
		assert_eq!(completion.wait(), Ok(()));

		let (release, completion) = completion::pair();
		Callable::Synced(Box::new(|| panic!("bad state")), release).execute();
		assert_eq!(completion.wait(), Err(Error::Panicked("bad state".to_string())));
	}

	#[test]
	fn test_dropped_synced_reports_terminated() {
		let (release, completion) = completion::pair();
		drop(Letter::Call(Callable::Synced(Box::new(|| {}), release)));
		assert_eq!(completion.wait(), Err(Error::Terminated));
	}

	#[test]
	fn test_letter_kinds() {
		let (release, _completion) = completion::pair();
		assert_eq!(Letter::Stop(release).kind(), "stop");
		assert_eq!(Letter::Call(Callable::Future(Box::new(|| {}))).kind(), "future");
	}
}
