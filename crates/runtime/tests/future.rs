// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Strand Contributors

//! Future results are computed once and read by anyone.

mod common;

use std::{
	sync::{
		Arc, Barrier,
		atomic::{AtomicUsize, Ordering},
	},
	thread,
	time::Duration,
};

use strand_runtime::Error;

const READERS: usize = 1_000;

#[test]
fn test_concurrent_readers_share_one_result() {
	for (name, driver) in common::drivers() {
		let object = driver.spawn().unwrap();
		let runs = Arc::new(AtomicUsize::new(0));
		let gate = Arc::new(Barrier::new(2));

		// Hold the executor so every reader arrives before the value exists.
		object.submit({
			let gate = gate.clone();
			move || {
				gate.wait();
			}
		});
		let future = object.future_submit({
			let runs = runs.clone();
			move || {
				runs.fetch_add(1, Ordering::SeqCst);
				format!("value from {}", thread::current().name().unwrap_or("unnamed"))
			}
		});

		let readers: Vec<_> = (0..READERS)
			.map(|_| {
				let future = future.clone();
				thread::spawn(move || future.get().unwrap())
			})
			.collect();

		thread::sleep(Duration::from_millis(20));
		assert!(!future.is_ready(), "{name}");
		gate.wait();

		let values: Vec<String> = readers.into_iter().map(|reader| reader.join().unwrap()).collect();
		assert!(values.windows(2).all(|pair| pair[0] == pair[1]), "{name}");
		assert_eq!(future.get().unwrap(), values[0], "{name}");
		assert_eq!(runs.load(Ordering::SeqCst), 1, "{name}");

		object.terminate().wait();
	}
}

#[test]
fn test_result_reflects_prior_work() {
	for (name, driver) in common::drivers() {
		let object = driver.spawn().unwrap();
		let total = Arc::new(AtomicUsize::new(0));

		for i in 1..=10 {
			let total = total.clone();
			object.submit(move || {
				total.fetch_add(i, Ordering::Relaxed);
			});
		}
		let sum = object.future_submit({
			let total = total.clone();
			move || total.load(Ordering::Relaxed)
		});

		assert_eq!(sum.get(), Ok(55), "{name}");
		object.terminate().wait();
	}
}

#[test]
fn test_panicking_body_fails_every_reader() {
	for (name, driver) in common::drivers() {
		let object = driver.spawn().unwrap();
		let future = object.future_submit(|| -> u64 { panic!("cannot compute") });

		let expected = Err(Error::Panicked("cannot compute".to_string()));
		assert_eq!(future.get(), expected, "{name}");
		assert_eq!(future.clone().get(), expected, "{name}");

		// The executor survives and keeps serving the object.
		assert_eq!(object.future_submit(|| 3u64).get(), Ok(3), "{name}");
		object.terminate().wait();
	}
}
