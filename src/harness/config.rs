// Harness configuration.  Defaults reproduce the reference testbench:
// 7 ns write clock, 13 ns read clock, 8 random bytes, 5-20 ns idle gaps.

use crate::error::HarnessError;
use crate::fifo::sync::Sampling;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
   /// FIFO depth, power of two.
   pub capacity: usize,
   pub write_period_ns: u64,
   pub read_period_ns: u64,
   /// Reset is held this long before either task starts.
   pub reset_ns: u64,
   /// Number of data words pushed through.
   pub items: usize,
   /// Data words are drawn from `0..=data_max`.
   pub data_max: u32,
   /// Inclusive idle range after each accepted operation.
   pub gap_ns: [u64; 2],
   pub reader_start_delay_ns: u64,
   /// Fixed seed for data, gaps and skewed sampling; random when absent.
   pub seed: Option<u64>,
   pub sampling: Sampling,
   /// Event mode: simulated time budget.
   pub max_ns: u64,
   /// Threaded mode: consecutive rejected attempts before giving up.
   pub max_spins: u64,
}

impl Default for HarnessConfig {
   fn default() -> Self {
      Self {
         capacity: 16,
         write_period_ns: 7,
         read_period_ns: 13,
         reset_ns: 50,
         items: 8,
         data_max: 255,
         gap_ns: [5, 20],
         reader_start_delay_ns: 100,
         seed: None,
         sampling: Sampling::Exact,
         max_ns: 1_000_000,
         max_spins: 10_000_000,
      }
   }
}

impl HarnessConfig {
   pub fn from_toml_str(s: &str) -> Result<Self, HarnessError> {
      let cfg: Self = toml::from_str(s)?;
      cfg.validate()?;
      Ok(cfg)
   }

   pub fn load(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
      let text = std::fs::read_to_string(path)?;
      Self::from_toml_str(&text)
   }

   pub fn validate(&self) -> Result<(), HarnessError> {
      if self.write_period_ns == 0 || self.read_period_ns == 0 {
         return Err(HarnessError::Invalid("clock periods must be non-zero".into()));
      }
      if self.gap_ns[0] > self.gap_ns[1] {
         return Err(HarnessError::Invalid(format!(
            "gap_ns range is reversed: {:?}",
            self.gap_ns
         )));
      }
      // capacity itself is checked by the FIFO constructor
      Ok(())
   }

   /// The configured seed, or a fresh random one.
   pub fn resolve_seed(&self) -> u64 {
      self.seed.unwrap_or_else(rand::random)
   }
}
