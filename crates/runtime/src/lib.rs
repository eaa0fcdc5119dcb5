// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Strand Contributors

//! Serialized objects over pluggable thread schedulers.
//!
//! An [`Object`] funnels every callable submitted to it through one logical
//! execution stream, so state touched only from inside those callables needs
//! no further locking. A [`Driver`] decides which OS threads run which
//! objects:
//!
//! - [`OneToOneDriver`]: a dedicated thread per object
//! - [`NToOneDriver`]: worker threads hosting up to N objects each
//! - [`NToMDriver`]: a fixed pool draining a shared queue of runnable objects
//!
//! # Example
//!
//! ```
//! use std::sync::{
//! 	Arc,
//! 	atomic::{AtomicU64, Ordering},
//! };
//!
//! use strand_runtime::{Driver, NToMDriver};
//!
//! let driver = NToMDriver::new(2).unwrap();
//! let object = driver.spawn().unwrap();
//! let hits = Arc::new(AtomicU64::new(0));
//!
//! for _ in 0..10 {
//! 	let hits = hits.clone();
//! 	object.submit(move || {
//! 		hits.fetch_add(1, Ordering::Relaxed);
//! 	});
//! }
//!
//! let seen = object.future_submit({
//! 	let hits = hits.clone();
//! 	move || hits.load(Ordering::Relaxed)
//! });
//! assert_eq!(seen.get().unwrap(), 10);
//!
//! object.terminate().wait();
//! ```

mod callable;
mod completion;
pub mod driver;
mod error;
mod future;
mod object;

pub use completion::Termination;
pub use driver::{
	Driver, NToMConfig, NToMDriver, NToMStats, NToOneConfig, NToOneDriver, NToOneStats, OneToOneConfig,
	OneToOneDriver, OneToOneStats,
};
pub use error::{Error, Result};
pub use future::Future;
pub use object::Object;
