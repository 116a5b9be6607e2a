//! Software model of an asynchronous (dual-clock) FIFO.
//!
//! A producer and a consumer each advance on their own clock.  They share a
//! ring of N slots and nothing else except two gray-coded pointer buses,
//! each read through a two-stage synchronizer on the far side.
//!
//! ```
//! use async_fifo::{AsyncFifo, ClockDomain};
//!
//! let (mut w, mut r) = AsyncFifo::<u8>::new(4).unwrap().split();
//! w.tick().write(7).unwrap();
//! r.tick();
//! r.tick();                       // two read-domain ticks to see the write
//! assert_eq!(r.tick().read(), Ok(7));
//! ```

pub mod error;
pub mod fifo;
pub mod harness;

pub use error::{CapacityError, HarnessError, PopError, PushError, Reject};
pub use fifo::AsyncFifo;
pub use fifo::Domain;
pub use fifo::ResetHandle;
pub use fifo::{WritePort, WriteCycle};
pub use fifo::{ReadPort, ReadCycle};
pub use fifo::sync::Sampling;

/// Common interface for both clock-domain endpoints.
pub trait ClockDomain {
   /// Handle for the single operation allowed in one cycle.
   type Cycle<'a> where Self: 'a;

   /// Advance this domain's clock by one edge.
   fn tick(&mut self) -> Self::Cycle<'_>;
   /// Edges seen so far.
   fn cycles(&self) -> u64;
   /// True while a reset waits for the other domain's acknowledgement.
   fn is_resetting(&self) -> bool;
   fn domain(&self) -> Domain;
}
