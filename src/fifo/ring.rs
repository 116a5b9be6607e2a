// Storage ring – fixed-capacity circular buffer of data words.
//
// No concurrency logic lives here.  Each slot is a `crossbeam` `AtomicCell`
// so the ring is `Sync` without `unsafe`; the pointer protocol above it
// guarantees a slot is never written and read in the same instant.

use crossbeam::atomic::AtomicCell;

pub struct StorageRing<T> {
   mask : usize,                       // N − 1
   slots: Box<[AtomicCell<Option<T>>]>,
}

impl<T> StorageRing<T> {
   /// `cap` must be a power of two; the controller validates it first.
   pub fn with_capacity(cap: usize) -> Self {
      debug_assert!(cap.is_power_of_two());

      let slots = (0..cap)
         .map(|_| AtomicCell::new(None))
         .collect::<Vec<_>>()
         .into_boxed_slice();

      Self { mask: cap - 1, slots }
   }

   #[inline]
   pub fn capacity(&self) -> usize {
      self.slots.len()
   }

   /// Slot index for a pointer value (`pointer mod N`).
   #[inline]
   pub fn idx(&self, pointer: usize) -> usize {
      pointer & self.mask
   }

   /// Move the word out of `index`, leaving it unwritten.
   ///
   /// # Panics
   /// If the slot was never written.  An accepted read only ever lands on a
   /// slot whose write is complete, so this is a harness bug, not a runtime
   /// condition.
   #[inline]
   pub fn slot(&self, index: usize) -> T {
      match self.slots[index].swap(None) {
         Some(v) => v,
         None => panic!("unresolvable value: slot {index} read before its write completed"),
      }
   }

   #[inline]
   pub fn set_slot(&self, index: usize, data: T) {
      // any stale word left behind by a reset is dropped here
      drop(self.slots[index].swap(Some(data)));
   }

   /// Drop every stored word.  Only called while the foreign domain is held
   /// in reset.
   pub fn clear(&self) {
      for s in self.slots.iter() {
         drop(s.take());
      }
   }
}

impl<T> std::fmt::Debug for StorageRing<T> {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("StorageRing")
       .field("capacity", &self.capacity())
       .finish()
   }
}
