// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Strand Contributors

pub mod util;

pub use util::{
	log::init_tracing,
	wait::{wait_for, wait_for_condition},
};
