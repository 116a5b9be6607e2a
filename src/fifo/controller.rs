// Dual-clock FIFO controller.
//
// `AsyncFifo::split` hands out one endpoint per clock domain.  Each endpoint
// owns its binary pointer and the synchronizer that watches the other
// domain's gray pointer; the only state the two endpoints share is the
// storage ring, the two gray buses and the reset line.
//
// Reset handshake: `reset()` bumps an epoch.  A domain that sees a new epoch
// on its tick zeroes its pointer, synchronizer and bus, then acknowledges.
// Until the other domain has acknowledged the same epoch it stays in reset
// (synchronizer held at zero, operations rejected).  The second domain to
// acknowledge drops whatever was left in the ring; the first one is idle at
// that point.

use crate::error::{CapacityError, PopError, PushError, Reject};
use crate::fifo::flags;
use crate::fifo::gray::{self, DomainPointer};
use crate::fifo::ring::StorageRing;
use crate::fifo::sync::{GrayBus, Sampling, Synchronizer};
use crate::ClockDomain;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/*──────────────────────────────────────────────────────────────────────────*/
/*  Shared state                                                            */
/*──────────────────────────────────────────────────────────────────────────*/

/// Which clock domain an endpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
   Write,
   Read,
}

impl Domain {
   #[inline]
   pub const fn other(self) -> Domain {
      match self {
         Domain::Write => Domain::Read,
         Domain::Read  => Domain::Write,
      }
   }

   #[inline]
   const fn slot(self) -> usize {
      match self {
         Domain::Write => 0,
         Domain::Read  => 1,
      }
   }
}

impl std::fmt::Display for Domain {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.write_str(match self {
         Domain::Write => "write",
         Domain::Read  => "read",
      })
   }
}

#[derive(Debug, Default)]
struct ResetLine {
   epoch   : AtomicU64,
   acks    : [AtomicU64; 2],  // last epoch acknowledged, per domain
   arrivals: AtomicU64,       // epoch << 2 | domains that reached it
}

impl ResetLine {
   #[inline]
   fn ack(&self, d: Domain) -> &AtomicU64 {
      &self.acks[d.slot()]
   }

   /// Record that one domain has flushed its own state for `epoch`.
   /// Returns true for exactly one caller per epoch: the second to arrive.
   /// A domain arriving with an epoch older than the recorded one gets false.
   fn arrive(&self, epoch: u64) -> bool {
      let mut cur = self.arrivals.load(Ordering::SeqCst);
      loop {
         let (seen, count) = (cur >> 2, cur & 0b11);
         let next = match seen.cmp(&epoch) {
            std::cmp::Ordering::Greater => return false,
            std::cmp::Ordering::Equal   => (epoch << 2) | (count + 1),
            std::cmp::Ordering::Less    => (epoch << 2) | 1,
         };
         match self.arrivals.compare_exchange(cur, next, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return next & 0b11 == 2,
            Err(actual) => cur = actual,
         }
      }
   }
}

#[derive(Debug)]
struct Shared<T> {
   ring : StorageRing<T>,
   wbus : GrayBus,          // write pointer → read domain
   rbus : GrayBus,          // read pointer  → write domain
   reset: Arc<ResetLine>,
}

impl<T> Shared<T> {
   #[inline]
   fn own_bus(&self, d: Domain) -> &GrayBus {
      match d {
         Domain::Write => &self.wbus,
         Domain::Read  => &self.rbus,
      }
   }

   #[inline]
   fn foreign_bus(&self, d: Domain) -> &GrayBus {
      self.own_bus(d.other())
   }
}

/// Requests a reset of both domains.  Cheap to clone, usable from any thread.
#[derive(Debug, Clone)]
pub struct ResetHandle {
   line: Arc<ResetLine>,
}

impl ResetHandle {
   /// Never blocks.  Each domain picks the request up on its next tick.
   pub fn reset(&self) {
      let epoch = self.line.epoch.fetch_add(1, Ordering::SeqCst) + 1;
      debug!(epoch, "reset requested");
   }

   /// Both domains have acknowledged the latest reset request.
   pub fn is_settled(&self) -> bool {
      let epoch = self.line.epoch.load(Ordering::SeqCst);
      self.line.ack(Domain::Write).load(Ordering::SeqCst) == epoch
         && self.line.ack(Domain::Read).load(Ordering::SeqCst) == epoch
   }
}

/*──────────────────────────────────────────────────────────────────────────*/
/*  Constructor                                                             */
/*──────────────────────────────────────────────────────────────────────────*/

/// An asynchronous FIFO before it is split into its two domain endpoints.
#[derive(Debug)]
pub struct AsyncFifo<T> {
   shared  : Arc<Shared<T>>,
   sampling: Sampling,
   seed    : u64,
}

impl<T: Send> AsyncFifo<T> {
   /// Build a FIFO of `cap` slots.  `cap` must be a non-zero power of two.
   pub fn with_capacity(cap: usize) -> Result<Self, CapacityError> {
      if cap == 0 {
         return Err(CapacityError::Zero);
      }
      if !cap.is_power_of_two() {
         return Err(CapacityError::NotPowerOfTwo(cap));
      }
      if cap > usize::MAX / 2 {
         return Err(CapacityError::TooLarge(cap));
      }

      Ok(Self {
         shared: Arc::new(Shared {
            ring : StorageRing::with_capacity(cap),
            wbus : GrayBus::new(),
            rbus : GrayBus::new(),
            reset: Arc::new(ResetLine::default()),
         }),
         sampling: Sampling::Exact,
         seed    : 0,
      })
   }

   pub fn new(cap: usize) -> Result<Self, CapacityError> {
      Self::with_capacity(cap)
   }

   /// Choose how the synchronizers capture the foreign bus.  `seed` drives
   /// the skewed sampler (the read domain uses `seed + 1`).
   pub fn with_sampling(mut self, sampling: Sampling, seed: u64) -> Self {
      self.sampling = sampling;
      self.seed = seed;
      self
   }

   #[inline]
   pub fn capacity(&self) -> usize {
      self.shared.ring.capacity()
   }

   /// Pointer width in bits, wrap bit included.
   #[inline]
   pub fn pointer_width(&self) -> u32 {
      gray::width(self.capacity())
   }

   pub fn reset(&self) {
      self.reset_handle().reset();
   }

   pub fn reset_handle(&self) -> ResetHandle {
      ResetHandle { line: Arc::clone(&self.shared.reset) }
   }

   /// Hand out the write-domain and read-domain endpoints.
   pub fn split(self) -> (WritePort<T>, ReadPort<T>) {
      let cap = self.capacity();
      let w = WritePort {
         shared: Arc::clone(&self.shared),
         core  : DomainCore::new(Domain::Write, cap, self.sampling, self.seed),
      };
      let r = ReadPort {
         shared: self.shared,
         core  : DomainCore::new(Domain::Read, cap, self.sampling, self.seed.wrapping_add(1)),
      };
      (w, r)
   }
}

/*──────────────────────────────────────────────────────────────────────────*/
/*  Per-domain state                                                        */
/*──────────────────────────────────────────────────────────────────────────*/

#[derive(Debug)]
struct DomainCore {
   domain   : Domain,
   ptr      : DomainPointer,
   sync     : Synchronizer,   // foreign gray pointer, two ticks late
   epoch    : u64,            // last reset epoch this domain acted on
   resetting: bool,
   cycles   : u64,
}

impl DomainCore {
   fn new(domain: Domain, cap: usize, sampling: Sampling, seed: u64) -> Self {
      Self {
         domain,
         ptr      : DomainPointer::new(cap),
         sync     : Synchronizer::new(sampling, seed),
         epoch    : 0,
         resetting: false,
         cycles   : 0,
      }
   }

   /// One clock edge of this domain: pick up resets, then shift the
   /// synchronizer.
   fn tick<T>(&mut self, shared: &Shared<T>) {
      self.cycles += 1;
      let d = self.domain;
      let line = &shared.reset;

      let epoch = line.epoch.load(Ordering::SeqCst);
      if epoch != self.epoch {
         self.ptr.reset();
         self.sync.reset();
         shared.own_bus(d).clear();
         self.epoch = epoch;

         // the other side has flushed for this epoch and waits on our ack,
         // so nothing touches the ring until we store it
         if line.arrive(epoch) {
            shared.ring.clear();
         }
         line.ack(d).store(epoch, Ordering::SeqCst);
         debug!(domain = %d, epoch, cycle = self.cycles, "reset observed");
      }

      if line.ack(d.other()).load(Ordering::SeqCst) != self.epoch {
         self.sync.reset();
         self.resetting = true;
         return;
      }
      if self.resetting {
         self.resetting = false;
         debug!(domain = %d, epoch = self.epoch, cycle = self.cycles, "reset handshake complete");
      }

      self.sync.clock(shared.foreign_bus(d).sample());
   }

   /// Occupancy as seen from this domain.
   fn level(&self, cap: usize) -> usize {
      let foreign = gray::from_gray(self.sync.read());
      match self.domain {
         Domain::Write => gray::occupancy(self.ptr.value(), foreign, cap),
         Domain::Read  => gray::occupancy(foreign, self.ptr.value(), cap),
      }
   }
}

/*──────────────────────────────────────────────────────────────────────────*/
/*  Write domain                                                            */
/*──────────────────────────────────────────────────────────────────────────*/

/// Producer endpoint.  Owns the write pointer.
pub struct WritePort<T> {
   shared: Arc<Shared<T>>,
   core  : DomainCore,
}

impl<T: Send> WritePort<T> {
   #[inline]
   pub fn capacity(&self) -> usize {
      self.shared.ring.capacity()
   }

   /// Full flag from the write pointer and the synchronized read pointer.
   /// Reads its reset value (false) while a reset is pending.
   pub fn is_full(&self) -> bool {
      !self.core.resetting
         && flags::is_full(self.core.ptr.value(), self.core.sync.read(), self.capacity())
   }

   /// Conservative occupancy: the read pointer may be up to two ticks stale,
   /// so this never under-reports.
   pub fn level(&self) -> usize {
      self.core.level(self.capacity())
   }

   /// Binary write pointer (log2(N)+1 bits).
   pub fn pointer(&self) -> usize {
      self.core.ptr.value()
   }

   pub fn reset_handle(&self) -> ResetHandle {
      ResetHandle { line: Arc::clone(&self.shared.reset) }
   }
}

/// One write-domain clock cycle.  At most one write per cycle: `write`
/// consumes it.
pub struct WriteCycle<'a, T: Send> {
   port: &'a mut WritePort<T>,
}

impl<T: Send> WriteCycle<'_, T> {
   #[inline]
   pub fn is_full(&self) -> bool {
      self.port.is_full()
   }

   /// Store `value` at `wptr mod N` and publish the advanced pointer, or
   /// hand the value back untouched.
   pub fn write(self, value: T) -> Result<(), PushError<T>> {
      let port = self.port;
      let reason = if port.core.resetting {
         Some(Reject::Resetting)
      } else if port.is_full() {
         Some(Reject::Full)
      } else {
         None
      };
      if let Some(reason) = reason {
         trace!(cycle = port.core.cycles, %reason, "write rejected");
         return Err(PushError { reason, value });
      }

      let shared = &*port.shared;
      shared.ring.set_slot(port.core.ptr.index(), value);
      port.core.ptr.advance();
      shared.wbus.push(port.core.ptr.to_gray());
      Ok(())
   }
}

impl<T: Send> ClockDomain for WritePort<T> {
   type Cycle<'a> = WriteCycle<'a, T> where Self: 'a;

   fn tick(&mut self) -> WriteCycle<'_, T> {
      self.core.tick(&self.shared);
      WriteCycle { port: self }
   }

   fn cycles(&self) -> u64 {
      self.core.cycles
   }

   fn is_resetting(&self) -> bool {
      self.core.resetting
   }

   fn domain(&self) -> Domain {
      Domain::Write
   }
}

impl<T> std::fmt::Debug for WritePort<T> {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("WritePort")
       .field("wptr", &self.core.ptr.value())
       .field("rptr_sync", &self.core.sync.read())
       .field("cycles", &self.core.cycles)
       .field("resetting", &self.core.resetting)
       .finish()
   }
}

/*──────────────────────────────────────────────────────────────────────────*/
/*  Read domain                                                             */
/*──────────────────────────────────────────────────────────────────────────*/

/// Consumer endpoint.  Owns the read pointer.
pub struct ReadPort<T> {
   shared: Arc<Shared<T>>,
   core  : DomainCore,
}

impl<T: Send> ReadPort<T> {
   #[inline]
   pub fn capacity(&self) -> usize {
      self.shared.ring.capacity()
   }

   /// Empty flag from the read pointer and the synchronized write pointer.
   /// Reads its reset value (true) while a reset is pending.
   pub fn is_empty(&self) -> bool {
      self.core.resetting
         || flags::is_empty(self.core.ptr.value(), self.core.sync.read(), self.capacity())
   }

   /// Conservative occupancy: never over-reports.
   pub fn level(&self) -> usize {
      self.core.level(self.capacity())
   }

   /// Binary read pointer (log2(N)+1 bits).
   pub fn pointer(&self) -> usize {
      self.core.ptr.value()
   }

   pub fn reset_handle(&self) -> ResetHandle {
      ResetHandle { line: Arc::clone(&self.shared.reset) }
   }
}

/// One read-domain clock cycle.  At most one read per cycle.
pub struct ReadCycle<'a, T: Send> {
   port: &'a mut ReadPort<T>,
}

impl<T: Send> ReadCycle<'_, T> {
   #[inline]
   pub fn is_empty(&self) -> bool {
      self.port.is_empty()
   }

   /// Take the word at `rptr mod N` and publish the advanced pointer.
   pub fn read(self) -> Result<T, PopError> {
      let port = self.port;
      let reason = if port.core.resetting {
         Some(Reject::Resetting)
      } else if port.is_empty() {
         Some(Reject::Empty)
      } else {
         None
      };
      if let Some(reason) = reason {
         trace!(cycle = port.core.cycles, %reason, "read rejected");
         return Err(PopError { reason });
      }

      let shared = &*port.shared;
      let value = shared.ring.slot(port.core.ptr.index());
      port.core.ptr.advance();
      shared.rbus.push(port.core.ptr.to_gray());
      Ok(value)
   }
}

impl<T: Send> ClockDomain for ReadPort<T> {
   type Cycle<'a> = ReadCycle<'a, T> where Self: 'a;

   fn tick(&mut self) -> ReadCycle<'_, T> {
      self.core.tick(&self.shared);
      ReadCycle { port: self }
   }

   fn cycles(&self) -> u64 {
      self.core.cycles
   }

   fn is_resetting(&self) -> bool {
      self.core.resetting
   }

   fn domain(&self) -> Domain {
      Domain::Read
   }
}

impl<T> std::fmt::Debug for ReadPort<T> {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("ReadPort")
       .field("rptr", &self.core.ptr.value())
       .field("wptr_sync", &self.core.sync.read())
       .field("cycles", &self.core.cycles)
       .field("resetting", &self.core.resetting)
       .finish()
   }
}
