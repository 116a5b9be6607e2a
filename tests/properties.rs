// async_fifo/tests/properties.rs
//
// Random single-threaded interleavings of write-domain and read-domain
// ticks, checked against a plain VecDeque.

use async_fifo::fifo::gray::{from_gray, to_gray};
use async_fifo::fifo::sync::resolve_skewed;
use async_fifo::{AsyncFifo, ClockDomain, Reject, Sampling};
use proptest::prelude::*;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
enum Op {
   /// Write-domain tick, optionally attempting a write.
   WTick(Option<u16>),
   /// Read-domain tick, optionally attempting a read.
   RTick(bool),
}

fn op_strategy() -> impl Strategy<Value = Op> {
   prop_oneof![
      proptest::option::of(any::<u16>()).prop_map(Op::WTick),
      any::<bool>().prop_map(Op::RTick),
   ]
}

fn sampling_strategy() -> impl Strategy<Value = Sampling> {
   prop_oneof![Just(Sampling::Exact), Just(Sampling::Skewed)]
}

proptest! {
   /// FIFO order and the occupancy bound under any tick interleaving.
   #[test]
   fn fifo_order_and_occupancy(
      cap_log in 0u32..5,
      sampling in sampling_strategy(),
      seed in any::<u64>(),
      ops in proptest::collection::vec(op_strategy(), 0..400),
   ) {
      let cap = 1usize << cap_log;
      let (mut w, mut r) = AsyncFifo::<u16>::new(cap).unwrap().with_sampling(sampling, seed).split();
      let mut model: VecDeque<u16> = VecDeque::new();

      for op in &ops {
         match *op {
            Op::WTick(None) => { w.tick(); }
            Op::WTick(Some(v)) => match w.tick().write(v) {
               Ok(()) => {
                  prop_assert!(model.len() < cap, "write accepted at occupancy {}", model.len());
                  model.push_back(v);
               }
               Err(e) => {
                  prop_assert_eq!(e.reason, Reject::Full);
                  prop_assert_eq!(e.value, v);
               }
            },
            Op::RTick(false) => { r.tick(); }
            Op::RTick(true) => match r.tick().read() {
               Ok(v) => {
                  let exp = model.pop_front();
                  prop_assert_eq!(Some(v), exp, "FIFO ordering violated");
               }
               Err(e) => { prop_assert_eq!(e.reason, Reject::Empty); }
            },
         }
         // each domain's view is conservative in its own direction
         prop_assert!(w.level() >= model.len() && w.level() <= cap);
         prop_assert!(r.level() <= model.len());
         if model.len() == cap {
            prop_assert!(w.is_full());
         }
         if model.is_empty() {
            prop_assert!(r.is_empty());
         }
      }
   }

   /// k ≤ N writes then k reads round-trip regardless of tick ratio.
   #[test]
   fn round_trip_any_rate(
      cap_log in 0u32..6,
      k_raw in 0usize..=32,
      read_ratio in 1usize..5,
      data in proptest::collection::vec(any::<u32>(), 32),
   ) {
      let cap = 1usize << cap_log;
      let k = k_raw.min(cap);
      let (mut w, mut r) = AsyncFifo::<u32>::new(cap).unwrap().split();

      for &v in &data[..k] {
         prop_assert!(w.tick().write(v).is_ok());
      }

      let mut got = Vec::with_capacity(k);
      let mut ticks = 0;
      while got.len() < k {
         // the reader idles read_ratio − 1 ticks between attempts
         let c = r.tick();
         ticks += 1;
         if ticks % read_ratio == 0 {
            if let Ok(v) = c.read() {
               got.push(v);
            }
         }
         prop_assert!(ticks < 16 * (k + 2) * read_ratio);
      }
      prop_assert_eq!(&got[..], &data[..k]);
   }

   /// Reset at any occupancy leaves an empty, non-full fifo once both
   /// domains have ticked twice.
   #[test]
   fn reset_clears_state(
      cap_log in 0u32..5,
      ops in proptest::collection::vec(op_strategy(), 0..100),
      w_first in any::<bool>(),
   ) {
      let cap = 1usize << cap_log;
      let fifo = AsyncFifo::<u16>::new(cap).unwrap();
      let handle = fifo.reset_handle();
      let (mut w, mut r) = fifo.split();

      for op in &ops {
         match *op {
            Op::WTick(v) => { let c = w.tick(); if let Some(v) = v { let _ = c.write(v); } }
            Op::RTick(true) => { let _ = r.tick().read(); }
            Op::RTick(false) => { r.tick(); }
         }
      }

      handle.reset();
      for _ in 0..2 {
         if w_first {
            w.tick();
            r.tick();
         } else {
            r.tick();
            w.tick();
         }
      }
      prop_assert!(handle.is_settled());
      prop_assert!(r.is_empty());
      prop_assert!(!w.is_full());
      prop_assert_eq!(r.tick().read().unwrap_err().reason, Reject::Empty);
   }

   /// Successive pointer values differ in exactly one gray bit, so a capture
   /// mid-transition resolves to one of the two.
   #[test]
   fn gray_transition_never_tears(n in any::<usize>(), take_new in any::<usize>()) {
      let (old, new) = (to_gray(n), to_gray(n.wrapping_add(1)));
      prop_assert_eq!((old ^ new).count_ones(), 1);
      let got = resolve_skewed(old, new, take_new);
      prop_assert!(got == old || got == new);
      prop_assert_eq!(from_gray(old), n);
   }
}
