// Drivers that clock both domains of a FIFO and check what comes out.
//
// `event` runs both clocks on one thread against a simulated timeline and is
// fully deterministic for a given seed.  `threaded` gives each domain its own
// OS thread ticking as fast as it can.

mod config;
mod event;
mod threaded;

pub use config::HarnessConfig;
pub use event::{run_event, TwoClockScheduler};
pub use threaded::run_threaded;

use crate::error::HarnessError;
use crate::ClockDomain;
use rand::Rng;

/// Outcome of one harness run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
   pub seed: u64,
   pub written: Vec<u32>,
   pub read: Vec<u32>,
   pub write_cycles: u64,
   pub read_cycles: u64,
   pub write_rejects: u64,
   pub read_rejects: u64,
   /// Largest occupancy the write domain ever reported.
   pub peak_level: usize,
   /// Simulated end time; `None` for threaded runs.
   pub end_ns: Option<u64>,
}

impl RunReport {
   /// Read sequence must equal the written one, item for item.
   pub fn check(&self) -> Result<(), HarnessError> {
      if let Some((index, (&expected, &got))) = self
         .written
         .iter()
         .zip(self.read.iter())
         .enumerate()
         .find(|(_, (w, r))| w != r)
      {
         return Err(HarnessError::Mismatch { index, expected, got });
      }
      if self.written.len() != self.read.len() {
         return Err(HarnessError::CountMismatch {
            written: self.written.len(),
            read: self.read.len(),
         });
      }
      Ok(())
   }
}

pub(crate) fn gen_data(rng: &mut impl Rng, items: usize, data_max: u32) -> Vec<u32> {
   (0..items).map(|_| rng.gen_range(0..=data_max)).collect()
}

/// Clock a port with no operation, e.g. while reset is held.
pub fn idle<D: ClockDomain>(port: &mut D) {
   let _ = port.tick();
}
