// Domain pointers and the reflected-binary (gray) code used to carry them
// across the clock-domain boundary.
//
// A pointer for a ring of N slots is log2(N)+1 bits wide.  The extra top bit
// (the wrap bit) flips every time the pointer laps the ring, which is what
// tells "equal and empty" apart from "equal mod N and full".

/// `gray = binary XOR (binary >> 1)`.
#[inline]
pub const fn to_gray(binary: usize) -> usize {
   binary ^ (binary >> 1)
}

/// Inverse of [`to_gray`]: prefix-XOR of all higher bits.
#[inline]
pub const fn from_gray(gray: usize) -> usize {
   let mut b = gray;
   let mut shift = 1;
   while shift < usize::BITS {
      b ^= b >> shift;
      shift <<= 1;
   }
   b
}

/// Pointer width in bits for a ring of `cap` slots (`cap` a power of two).
#[inline]
pub const fn width(cap: usize) -> u32 {
   cap.trailing_zeros() + 1
}

/// `(wptr − rptr) mod 2N`.
#[inline]
pub const fn occupancy(wptr: usize, rptr: usize, cap: usize) -> usize {
   wptr.wrapping_sub(rptr) & (2 * cap - 1)
}

/// Binary counter owned by exactly one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainPointer {
   value: usize,
   cap  : usize,
}

impl DomainPointer {
   pub const fn new(cap: usize) -> Self {
      Self { value: 0, cap }
   }

   /// `(current + 1) mod 2N`.
   #[inline]
   pub fn advance(&mut self) -> usize {
      self.value = (self.value + 1) & (2 * self.cap - 1);
      self.value
   }

   #[inline]
   pub const fn value(&self) -> usize {
      self.value
   }

   #[inline]
   pub const fn to_gray(&self) -> usize {
      to_gray(self.value)
   }

   /// Slot index: the low log2(N) bits.
   #[inline]
   pub const fn index(&self) -> usize {
      self.value & (self.cap - 1)
   }

   #[inline]
   pub const fn wrap_bit(&self) -> bool {
      self.value & self.cap != 0
   }

   pub fn reset(&mut self) {
      self.value = 0;
   }
}
