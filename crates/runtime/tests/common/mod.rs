// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Strand Contributors

#![allow(dead_code)]

use strand_runtime::{Driver, NToMDriver, NToOneDriver, OneToOneDriver};

/// One driver of every strategy, labelled for assertion messages.
pub fn drivers() -> Vec<(&'static str, Box<dyn Driver>)> {
	strand_testing::init_tracing();
	vec![
		("one_to_one", Box::new(OneToOneDriver::new())),
		("n_to_one", Box::new(NToOneDriver::new(32).unwrap())),
		("n_to_m", Box::new(NToMDriver::new(4).unwrap())),
	]
}
