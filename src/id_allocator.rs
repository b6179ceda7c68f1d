/// Issues track identifiers for one tracker instance.
///
/// Identifiers are strictly increasing and start at 1. An identifier is never
/// reissued, even after the track it was assigned to has been removed. The
/// allocator is owned by its tracker so independent tracker instances never
/// share a counter.
#[derive(Debug)]
pub struct IdAllocator {
    next: usize,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    /// Returns a new IdAllocator
    pub fn new() -> IdAllocator {
        IdAllocator { next: 1 }
    }

    /// Returns the next unused track identifier.
    pub fn next_id(&mut self) -> usize {
        let id = self.next;
        self.next += 1;
        id
    }
}
