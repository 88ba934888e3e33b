//! Element types that observe their own lifecycle.
//!
//! - [`Tracked`] records every drop and clone in a shared [`DropLog`].
//! - [`PanicOnClone`] panics deterministically once a clone budget runs out.

use std::cell::Cell;
use std::rc::Rc;

/// Shared counters of element drops and clones.
#[derive(Clone, Debug, Default)]
pub struct DropLog {
    drops: Rc<Cell<usize>>,
    clones: Rc<Cell<usize>>,
}

impl DropLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tracked element carrying `id`.
    pub fn track(&self, id: u32) -> Tracked {
        Tracked {
            id,
            log: self.clone(),
        }
    }

    pub fn drops(&self) -> usize {
        self.drops.get()
    }

    pub fn clones(&self) -> usize {
        self.clones.get()
    }

    /// Elements created through this log and not yet dropped.
    ///
    /// `None` if more drops were recorded than `originals` plus clones,
    /// which means the caller undercounted its originals.
    pub fn live(&self, originals: usize) -> Option<usize> {
        (originals + self.clones()).checked_sub(self.drops())
    }
}

/// An element that reports drops and clones to its [`DropLog`].
#[derive(Debug)]
pub struct Tracked {
    pub id: u32,
    log: DropLog,
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        self.log.clones.set(self.log.clones.get() + 1);
        Self {
            id: self.id,
            log: self.log.clone(),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.log.drops.set(self.log.drops.get() + 1);
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A value whose clone panics after `budget` successful clones.
///
/// The budget is shared by the value and all its clones, so the Nth clone
/// across a whole container fill is the one that fails.
#[derive(Debug)]
pub struct PanicOnClone {
    pub value: u32,
    budget: Rc<Cell<usize>>,
}

impl PanicOnClone {
    pub fn new(value: u32, budget: usize) -> Self {
        Self {
            value,
            budget: Rc::new(Cell::new(budget)),
        }
    }

    /// Clones still allowed before the next one panics.
    pub fn remaining(&self) -> usize {
        self.budget.get()
    }
}

impl Clone for PanicOnClone {
    fn clone(&self) -> Self {
        let left = self.budget.get();
        if left == 0 {
            panic!("PanicOnClone: clone budget exhausted");
        }
        self.budget.set(left - 1);
        Self {
            value: self.value,
            budget: Rc::clone(&self.budget),
        }
    }
}
