// Flag derivation.  Pure functions of a domain's own binary pointer and the
// synchronized gray pointer of the other domain.

use super::gray::from_gray;

/// Write-domain side: wrap bits differ, every index bit equal.
///
/// `cap` is N; the wrap bit is the bit with value N.
#[inline]
pub fn is_full(wptr: usize, rptr_synced_gray: usize, cap: usize) -> bool {
   let rptr = from_gray(rptr_synced_gray);
   (wptr ^ rptr) & (2 * cap - 1) == cap
}

/// Read-domain side: all bits equal, wrap bit included.
#[inline]
pub fn is_empty(rptr: usize, wptr_synced_gray: usize, cap: usize) -> bool {
   let wptr = from_gray(wptr_synced_gray);
   (wptr ^ rptr) & (2 * cap - 1) == 0
}
