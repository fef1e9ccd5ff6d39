//! Growth-sizing oracle.
//!
//! A pure function of the current allocation size that returns a target
//! next size, used by every tier's growth path to keep reallocation
//! amortized. Kept separate from [`crate::malloc`] because it has no
//! allocator dependency at all: given a byte count, it always returns the
//! same byte count.

/// Smallest size class the oracle will ever propose.
const MIN_GROWTH_BYTES: usize = 16;

/// Returns a target next allocation size for a buffer currently
/// `current_bytes` long.
///
/// Follows a Fibonacci-like progression seeded at [`MIN_GROWTH_BYTES`]:
/// each step is the sum of the previous two step sizes, which grows more
/// gently than doubling while still being geometric (and therefore still
/// amortized O(1) per element across repeated growth).
///
/// Monotone non-decreasing: `next_size(a) >= a` for all `a`, and
/// `a <= b ==> next_size(a) <= next_size(b)`.
#[inline]
pub const fn next_size(current_bytes: usize) -> usize {
    if current_bytes == 0 {
        return MIN_GROWTH_BYTES;
    }

    let mut prev = MIN_GROWTH_BYTES;
    let mut curr = MIN_GROWTH_BYTES * 2;
    // Walk the Fibonacci-like sequence until we find a step strictly
    // larger than what the caller already has.
    while curr <= current_bytes {
        let next = match curr.checked_add(prev) {
            Some(n) => n,
            None => return usize::MAX,
        };
        prev = curr;
        curr = next;
    }
    curr
}

/// Rounds `bytes` up to an allocator-friendly size class.
///
/// Below 4 KiB, rounds up to the next power of two (mirroring typical
/// small-object allocator size classes); at or above 4 KiB, rounds up to
/// the next whole page. Monotone non-decreasing and idempotent.
#[inline]
pub const fn round_to_allocator_class(bytes: usize) -> usize {
    const PAGE: usize = 4096;

    if bytes == 0 {
        return 0;
    }
    if bytes >= PAGE {
        return (bytes + PAGE - 1) & !(PAGE - 1);
    }
    bytes.next_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_size_zero() {
        assert_eq!(next_size(0), MIN_GROWTH_BYTES);
    }

    #[test]
    fn test_next_size_monotone_non_decreasing() {
        let mut last = 0;
        let mut prev_result = next_size(0);
        for b in (0..100_000).step_by(37) {
            let r = next_size(b);
            assert!(r >= b, "next_size({b}) = {r} must be >= {b}");
            if b >= last {
                assert!(r >= prev_result);
            }
            last = b;
            prev_result = r;
        }
    }

    #[test]
    fn test_next_size_strictly_grows_past_input() {
        for b in [1usize, 16, 17, 1000, 1_000_000] {
            assert!(next_size(b) > b);
        }
    }

    #[test]
    fn test_round_to_allocator_class_zero() {
        assert_eq!(round_to_allocator_class(0), 0);
    }

    #[test]
    fn test_round_to_allocator_class_small_powers_of_two() {
        assert_eq!(round_to_allocator_class(1), 1);
        assert_eq!(round_to_allocator_class(3), 4);
        assert_eq!(round_to_allocator_class(17), 32);
        assert_eq!(round_to_allocator_class(4095), 4096);
    }

    #[test]
    fn test_round_to_allocator_class_pages() {
        assert_eq!(round_to_allocator_class(4096), 4096);
        assert_eq!(round_to_allocator_class(4097), 8192);
        assert_eq!(round_to_allocator_class(9000), 12288);
    }

    #[test]
    fn test_round_to_allocator_class_idempotent() {
        for b in [1usize, 4096, 100_000] {
            let r = round_to_allocator_class(b);
            assert_eq!(round_to_allocator_class(r), r);
        }
    }

    #[test]
    fn test_round_to_allocator_class_monotone() {
        let mut prev = 0;
        for b in (0..50_000).step_by(113) {
            let r = round_to_allocator_class(b);
            assert!(r >= prev);
            prev = r;
        }
    }
}
