//! Unordered entity pools.
//!
//! Pools are plain `Vec`s. Removal swaps the last element into the removed
//! slot and shrinks, so iteration runs by descending index: the element
//! swapped in has already been visited.

/// Outcome of updating one pooled entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keep {
    Alive,
    Remove,
}

impl Keep {
    #[inline]
    pub fn from_alive(alive: bool) -> Self {
        if alive { Keep::Alive } else { Keep::Remove }
    }
}

/// Visit every element once, removing those for which `f` returns
/// [`Keep::Remove`]. Returns the number removed.
pub fn sweep<T>(pool: &mut Vec<T>, mut f: impl FnMut(usize, &mut T) -> Keep) -> usize {
    let mut removed = 0;
    let mut i = pool.len();
    while i > 0 {
        i -= 1;
        if f(i, &mut pool[i]) == Keep::Remove {
            pool.swap_remove(i);
            removed += 1;
        }
    }
    removed
}

/// Like [`sweep`], but the removed elements are handed back for follow-up
/// work (detonations, restores) that needs the whole frame context.
pub fn drain_expired<T>(pool: &mut Vec<T>, mut f: impl FnMut(&mut T) -> Keep) -> Vec<T> {
    let mut expired = Vec::new();
    let mut i = pool.len();
    while i > 0 {
        i -= 1;
        if f(&mut pool[i]) == Keep::Remove {
            expired.push(pool.swap_remove(i));
        }
    }
    expired
}
