//! Receive ID filter table

use canlink_core::Error;

use crate::config::DEFAULT_FILTER_CAPACITY;

/// Sorted, bounded set of accepted CAN identifiers
///
/// The logical content is `slots[..len]`, kept ascending and duplicate-free. All `N` slots are
/// programmed into the controller filter entries, so the trailing slots are padded: every insert
/// overwrites `slots[len..]` with the inserted identifier. Unused hardware entries then repeat an
/// accepted identifier instead of accepting identifier 0. A full table has no trailing slots, so
/// an insert into it leaves every slot untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilterTable<const N: usize = DEFAULT_FILTER_CAPACITY> {
    slots: [u32; N],
    len: usize,
}

impl<const N: usize> FilterTable<N> {
    pub const fn new() -> Self {
        Self {
            slots: [0; N],
            len: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn is_full(&self) -> bool {
        self.len == N
    }

    /// Accepted identifiers in ascending order
    pub fn ids(&self) -> &[u32] {
        &self.slots[..self.len]
    }

    /// All slots including the padding, as programmed into the controller
    pub fn slots(&self) -> &[u32; N] {
        &self.slots
    }

    /// Inserts `id` and returns its position.
    ///
    /// Inserting an identifier that is already present returns its position unchanged.
    pub fn insert(&mut self, id: u32) -> Result<usize, Error> {
        let position = match self.lookup(id) {
            Some(position) => Ok(position),
            None if self.len < N => {
                self.slots[self.len] = id;
                self.len += 1;
                self.slots[..self.len].sort_unstable();
                Ok(unwrap!(self.lookup(id)))
            }
            None => Err(Error::CapacityExceeded),
        };

        self.slots[self.len..].fill(id);
        position
    }

    /// Position of `id`, by binary search over the accepted identifiers
    pub fn lookup(&self, id: u32) -> Option<usize> {
        let ids = self.ids();
        let mut front = 0;
        let mut rear = ids.len();

        // Half-open [front, rear); a miss discards the last midpoint.
        while front < rear {
            let mid = front + (rear - front) / 2;
            match ids[mid].cmp(&id) {
                core::cmp::Ordering::Equal => return Some(mid),
                core::cmp::Ordering::Less => front = mid + 1,
                core::cmp::Ordering::Greater => rear = mid,
            }
        }
        None
    }

    pub fn contains(&self, id: u32) -> bool {
        self.lookup(id).is_some()
    }

    /// Removes every identifier and wipes all slots to zero.
    pub fn clear(&mut self) {
        self.slots.fill(0);
        self.len = 0;
    }
}

impl<const N: usize> Default for FilterTable<N> {
    fn default() -> Self {
        Self::new()
    }
}
