// Cross-domain synchronizer.
//
// The source domain publishes its gray pointer on a `GrayBus`; the
// destination domain runs a two-stage register chain (`Synchronizer`) that
// samples the bus once per destination tick.  What the destination sees at
// tick t is what was on the bus at its tick t−2.
//
//    source tick ──push──▶ [ GrayBus ] ──sample──▶ stage1 ──▶ stage2 ──▶ read()
//                                        (dest tick)   (dest tick)
//
// The bus remembers the last transition (previous and current value) so a
// skewed sampler can model a capture that lands mid-transition: every bit
// that differs is taken from either side at random.  Consecutive gray codes
// differ in one bit, so the capture still resolves to one of the two values.
// A skewed capture settles to the new value by the time it reaches stage2,
// the way a metastable first flop resolves before the second one samples it,
// so the two-tick visibility bound holds in both sampling modes.

use clap::ValueEnum;
use crossbeam::atomic::AtomicCell;
use crossbeam::utils::CachePadded;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Last transition published on a bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transition {
   pub prev: usize,
   pub cur : usize,
   pub seq : u64,    // bumped on every push
}

/// One-writer, one-reader register carrying a gray pointer between domains.
pub struct GrayBus {
   cell: CachePadded<AtomicCell<Transition>>,
}

impl GrayBus {
   pub fn new() -> Self {
      Self { cell: CachePadded::new(AtomicCell::new(Transition::default())) }
   }

   /// Source side.  Only the owning domain calls this, so the
   /// load-then-store pair does not race with another writer.
   pub fn push(&self, gray: usize) {
      let last = self.cell.load();
      self.cell.store(Transition { prev: last.cur, cur: gray, seq: last.seq.wrapping_add(1) });
   }

   /// Destination side.
   #[inline]
   pub fn sample(&self) -> Transition {
      self.cell.load()
   }

   /// Back to the reset value (gray 0, no transition in flight).
   pub fn clear(&self) {
      self.cell.store(Transition::default());
   }
}

impl Default for GrayBus {
   fn default() -> Self {
      Self::new()
   }
}

impl std::fmt::Debug for GrayBus {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_tuple("GrayBus").field(&self.cell.load()).finish()
   }
}

/// Value captured when a sample lands on a transition from `prev` to `cur`:
/// bits set in `take_new` come from `cur`, the rest from `prev`.
#[inline]
pub const fn resolve_skewed(prev: usize, cur: usize, take_new: usize) -> usize {
   prev ^ ((prev ^ cur) & take_new)
}

/// How the first stage captures the bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Sampling {
   /// Always the current value.
   #[default]
   Exact,
   /// First capture of each transition mixes old and new bits at random.
   Skewed,
}

#[derive(Debug)]
enum Sampler {
   Exact,
   Skewed(StdRng),
}

/// Two-stage resynchronizer owned by the destination domain.
#[derive(Debug)]
pub struct Synchronizer {
   stages    : [usize; 2],
   last_seq  : u64,
   settles_to: Option<usize>,  // set while stage1 holds a skewed capture
   sampler   : Sampler,
}

impl Synchronizer {
   pub fn new(sampling: Sampling, seed: u64) -> Self {
      let sampler = match sampling {
         Sampling::Exact  => Sampler::Exact,
         Sampling::Skewed => Sampler::Skewed(StdRng::seed_from_u64(seed)),
      };
      Self { stages: [0; 2], last_seq: 0, settles_to: None, sampler }
   }

   /// One destination tick: stage2 ← stage1, stage1 ← bus.
   pub fn clock(&mut self, t: Transition) {
      let fresh = t.seq != self.last_seq;
      self.last_seq = t.seq;

      let (captured, settles_to) = match &mut self.sampler {
         Sampler::Skewed(rng) if fresh => (resolve_skewed(t.prev, t.cur, rng.gen()), Some(t.cur)),
         _ => (t.cur, None),
      };

      self.stages[1] = self.settles_to.take().unwrap_or(self.stages[0]);
      self.stages[0] = captured;
      self.settles_to = settles_to;
   }

   /// Synchronized value: the bus as of two destination ticks ago.
   #[inline]
   pub fn read(&self) -> usize {
      self.stages[1]
   }

   /// Flush both stages to the reset gray value.
   pub fn reset(&mut self) {
      self.stages = [0; 2];
      self.last_seq = 0;
      self.settles_to = None;
   }
}
