#![cfg(test)]

// Property tests for EntryStore kept inside the crate so they can reach
// tombstone and cursor diagnostics.

use crate::entry_store::EntryStore;
use crate::same_value::SameValueZero;
use core::hash::{BuildHasher, Hasher};
use proptest::prelude::*;
use std::collections::hash_map::RandomState;

// Keys are drawn from a small pool so that collisions under SameValueZero
// (signed zeros, NaN payloads) happen often.
const POOL: [f64; 8] = [0.0, -0.0, f64::NAN, 1.0, -1.0, 2.5, f64::INFINITY, 1e300];

#[derive(Clone, Debug)]
enum Op {
    Set(usize, i32),
    Delete(usize),
    Get(usize),
    Clear,
    Iterate,
}

fn arb_op() -> impl Strategy<Value = Op> {
    let idx = 0..POOL.len();
    prop_oneof![
        4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Set(i, v)),
        2 => idx.clone().prop_map(Op::Delete),
        2 => idx.prop_map(Op::Get),
        1 => Just(Op::Clear),
        1 => Just(Op::Iterate),
    ]
}

/// Reference model: a plain vector in insertion order, searched linearly.
#[derive(Default)]
struct Model {
    entries: Vec<(f64, i32)>,
}

impl Model {
    fn position(&self, k: f64) -> Option<usize> {
        self.entries.iter().position(|(kk, _)| kk.same_value_zero(&k))
    }

    fn set(&mut self, k: f64, v: i32) {
        match self.position(k) {
            Some(p) => self.entries[p].1 = v,
            None => self.entries.push((k, v)),
        }
    }

    fn delete(&mut self, k: f64) -> bool {
        match self.position(k) {
            Some(p) => {
                self.entries.remove(p);
                true
            }
            None => false,
        }
    }

    fn get(&self, k: f64) -> Option<i32> {
        self.position(k).map(|p| self.entries[p].1)
    }
}

fn same_order(sut: &EntryStore<f64, i32, impl BuildHasher>, model: &Model) -> bool {
    let seen: Vec<(f64, i32)> = sut.iter().map(|(k, v)| (*k, *v)).collect();
    seen.len() == model.entries.len()
        && seen
            .iter()
            .zip(&model.entries)
            .all(|(a, b)| a.0.same_value_zero(&b.0) && a.1 == b.1)
}

fn run<S: BuildHasher>(mut sut: EntryStore<f64, i32, S>, ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut model = Model::default();
    for op in ops {
        match op {
            Op::Set(i, v) => {
                let k = POOL[i];
                let seq_before = sut.sequence_of(&k);
                sut.set(k, v);
                model.set(k, v);
                if let Some(seq) = seq_before {
                    prop_assert_eq!(sut.sequence_of(&k), Some(seq), "overwrite keeps sequence");
                }
            }
            Op::Delete(i) => {
                let k = POOL[i];
                prop_assert_eq!(sut.delete(&k), model.delete(k));
            }
            Op::Get(i) => {
                let k = POOL[i];
                prop_assert_eq!(sut.get(&k).copied(), model.get(k));
                prop_assert_eq!(sut.contains_key(&k), model.get(k).is_some());
            }
            Op::Clear => {
                sut.clear();
                model.entries.clear();
            }
            Op::Iterate => {
                prop_assert!(same_order(&sut, &model));
            }
        }
        prop_assert_eq!(sut.len(), model.entries.len());
        prop_assert_eq!(sut.iter().count(), sut.len());
        prop_assert_eq!(sut.open_cursors(), 0);
    }
    prop_assert!(same_order(&sut, &model));
    Ok(())
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: state-machine equivalence against an insertion-ordered vector.
// - set overwrites in place under SameValueZero, otherwise appends;
// - delete/get/contains parity with the model;
// - iteration order equals model order after every kind of mutation;
// - len equals the number of traversed entries.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in proptest::collection::vec(arb_op(), 1..80)) {
        run(EntryStore::with_hasher(RandomState::new()), ops)?;
    }

    #[test]
    fn prop_state_machine_with_collisions(ops in proptest::collection::vec(arb_op(), 1..80)) {
        run(EntryStore::with_hasher(ConstBuildHasher), ops)?;
    }

    // Property: a cursor opened before a batch of mutations visits exactly the
    // live entries that sit at or after its position, in order.
    #[test]
    fn prop_cursor_sees_tail_after_mutation(
        initial in 1usize..20,
        skip in 0usize..20,
        deletes in proptest::collection::vec(0usize..40, 0..20),
        appends in 0usize..10,
    ) {
        let mut sut: EntryStore<f64, i32> = EntryStore::new();
        for i in 0..initial {
            sut.set(i as f64, i as i32);
        }
        let mut c = sut.open_cursor();
        let mut consumed = Vec::new();
        for _ in 0..skip.min(initial) {
            if let Some((k, _)) = sut.advance(&mut c) {
                consumed.push(*k);
            }
        }
        for d in &deletes {
            sut.delete(&(*d as f64));
        }
        for a in 0..appends {
            sut.set((100 + a) as f64, 0);
        }
        let mut rest = Vec::new();
        while let Some((k, _)) = sut.advance(&mut c) {
            rest.push(*k);
        }
        sut.close_cursor(c);

        let expected: Vec<f64> = sut
            .keys()
            .copied()
            .filter(|k| !consumed.contains(k))
            .collect();
        prop_assert_eq!(rest, expected);
    }
}
