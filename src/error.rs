// Error and rejection types.
//
// Rejections (`PushError`, `PopError`) are ordinary back-pressure, the
// software face of a full/empty handshake.  Callers retry on a later tick.

use crate::fifo::Domain;
use thiserror::Error;

/// Construction-time misconfiguration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CapacityError {
   #[error("capacity must be non-zero")]
   Zero,
   #[error("capacity {0} is not a power of two")]
   NotPowerOfTwo(usize),
   #[error("capacity {0} leaves no room for the pointer wrap bit")]
   TooLarge(usize),
}

/// Why a write or read was not performed this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reject {
   /// Write domain sees `occupancy == N`.
   Full,
   /// Read domain sees `occupancy == 0`.
   Empty,
   /// A reset has not yet been acknowledged by both domains.
   Resetting,
}

impl std::fmt::Display for Reject {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.write_str(match self {
         Reject::Full      => "fifo full",
         Reject::Empty     => "fifo empty",
         Reject::Resetting => "reset in progress",
      })
   }
}

/// A rejected write; the value is handed back so the caller can retry.
#[derive(Debug, PartialEq, Eq, Error)]
#[error("write rejected: {reason}")]
pub struct PushError<T> {
   pub reason: Reject,
   pub value: T,
}

impl<T> PushError<T> {
   pub fn into_inner(self) -> T {
      self.value
   }
}

/// A rejected read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("read rejected: {reason}")]
pub struct PopError {
   pub reason: Reject,
}

/// Failures of the test harness driving a FIFO.
#[derive(Debug, Error)]
pub enum HarnessError {
   #[error("config parse error: {0}")]
   Config(#[from] toml::de::Error),
   #[error("invalid config: {0}")]
   Invalid(String),
   #[error("reading config: {0}")]
   Io(#[from] std::io::Error),
   #[error(transparent)]
   Capacity(#[from] CapacityError),
   #[error("{domain} domain gave up after {ticks} ticks")]
   Timeout { domain: Domain, ticks: u64 },
   #[error("item {index}: expected {expected}, got {got}")]
   Mismatch { index: usize, expected: u32, got: u32 },
   #[error("wrote {written} items but read {read}")]
   CountMismatch { written: usize, read: usize },
   #[error("{0} domain worker panicked")]
   WorkerPanicked(Domain),
   /// A worker thread panicked without being joined, so its domain is unknown.
   #[error("worker thread scope panicked")]
   ScopePanicked,
}
