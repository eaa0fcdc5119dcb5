// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Strand Contributors

//! Scheduling strategies.
//!
//! A [`Driver`] decides which execution threads back which objects:
//! - [`OneToOneDriver`]: one dedicated thread and mailbox per object
//! - [`NToOneDriver`]: worker threads each hosting up to N objects
//! - [`NToMDriver`]: M pool threads draining a shared queue of runnable objects
//!
//! Drivers are constructed explicitly and passed to whoever creates objects.
//! Every strategy preserves per-object FIFO order and never runs one object
//! on two threads at once.

pub mod n_to_m;
pub mod n_to_one;
pub mod one_to_one;

use std::{sync::Arc, thread};

pub use n_to_m::{NToMConfig, NToMDriver, NToMStats};
pub use n_to_one::{NToOneConfig, NToOneDriver, NToOneStats};
pub use one_to_one::{OneToOneConfig, OneToOneDriver, OneToOneStats};

use crate::{
	error::{Error, Result},
	object::Object,
};

/// Creates objects bound to one scheduling strategy.
pub trait Driver: Send + Sync {
	/// Creates a new object, starting execution capacity if needed.
	fn spawn(&self) -> Result<Object>;
}

impl<D: Driver + ?Sized> Driver for Arc<D> {
	fn spawn(&self) -> Result<Object> {
		(**self).spawn()
	}
}

impl<D: Driver + ?Sized> Driver for &D {
	fn spawn(&self) -> Result<Object> {
		(**self).spawn()
	}
}

/// Starts a named OS thread, mapping failure to [`Error::Spawn`].
pub(crate) fn spawn_thread<F>(name: String, f: F) -> Result<()>
where
	F: FnOnce() + Send + 'static,
{
	thread::Builder::new().name(name.clone()).spawn(f).map(|_| ()).map_err(|e| Error::Spawn {
		name,
		reason: e.to_string(),
	})
}

pub(crate) fn require_positive(value: usize, what: &str) -> Result<()> {
	if value == 0 {
		return Err(Error::Config(format!("{what} must be greater than zero")));
	}
	Ok(())
}
