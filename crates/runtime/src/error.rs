// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Strand Contributors

/// Errors surfaced by objects and drivers.
///
/// `Clone` so a failed future can hand the same error to every reader.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	/// The object died before the submitted callable could run.
	#[error("object terminated before the callable was executed")]
	Terminated,

	/// The callable body panicked on the executor.
	#[error("callable panicked: {0}")]
	Panicked(String),

	/// An execution thread could not be started.
	#[error("failed to spawn thread {name}: {reason}")]
	Spawn {
		name: String,
		reason: String,
	},

	/// A driver was constructed with an unusable configuration.
	#[error("invalid driver configuration: {0}")]
	Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
