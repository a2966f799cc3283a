//! Uniform sampling without replacement.

use rand::Rng;

/// Move `k` uniformly chosen elements of `items` to its front and return them.
///
/// Partial Fisher–Yates: at step `i` a position is drawn uniformly from the
/// not-yet-chosen tail `i..len` and swapped into place `i`. Every subset of
/// size `k` is equally likely, and the selection order is itself uniform.
///
/// # Panics
/// Panics if `k > items.len()`. Callers validate this up front.
pub fn choose_random_unique<'a, T, R: Rng + ?Sized>(
    items: &'a mut [T],
    k: usize,
    rng: &mut R,
) -> &'a [T] {
    assert!(
        k <= items.len(),
        "cannot choose {} of {} items",
        k,
        items.len()
    );

    let len = items.len();
    for i in 0..k {
        let j = rng.gen_range(i..len);
        items.swap(i, j);
    }

    &items[..k]
}
