use super::{Convergence, iterate_bounded};

#[test]
fn settles_when_step_stops_changing() {
	let mut n = 0u32;
	let outcome = iterate_bounded(&mut n, 10, |n| {
		if *n < 3 {
			*n += 1;
			true
		} else {
			false
		}
	});
	assert_eq!(n, 3);
	assert_eq!(outcome, Convergence::Settled { rounds: 4 });
	assert!(outcome.is_settled());
}

#[test]
fn exhausts_on_endless_step() {
	let mut n = 0u32;
	let outcome = iterate_bounded(&mut n, 5, |n| {
		*n += 1;
		true
	});
	assert_eq!(n, 5);
	assert_eq!(outcome, Convergence::Exhausted { cap: 5 });
	assert_eq!(outcome.rounds(), 5);
}

#[test]
fn zero_cap_runs_nothing() {
	let mut touched = false;
	let outcome = iterate_bounded(&mut touched, 0, |t| {
		*t = true;
		true
	});
	assert!(!touched);
	assert!(!outcome.is_settled());
}
