use thiserror::Error;
use crate::settings::HeadPolicy;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum TapeError {
    #[error("head moved left of cell 0")]
    Underflow,
    #[error("head moved right of cell {last}")]
    Overflow { last: usize },
}

/// Zero-initialised byte tape of fixed length.
///
/// The head always indexes a valid cell: moving off an end either wraps
/// around or fails, depending on the [`HeadPolicy`]. Cell arithmetic wraps
/// modulo 256.
#[derive(Debug, Clone)]
pub struct Tape {
    cells: Box<[u8]>,
    head: usize,
    policy: HeadPolicy,
}

impl Tape {
    pub fn new(length: usize, policy: HeadPolicy) -> Self {
        Tape {
            cells: vec![0u8; length.max(1)].into_boxed_slice(),
            head: 0,
            policy,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn get(&self) -> u8 {
        self.cells[self.head]
    }

    pub fn set(&mut self, value: u8) {
        self.cells[self.head] = value;
    }

    pub fn increment(&mut self) {
        self.set(self.get().wrapping_add(1));
    }

    pub fn decrement(&mut self) {
        self.set(self.get().wrapping_sub(1));
    }

    pub fn left(&mut self) -> Result<(), TapeError> {
        self.head = match (self.head.checked_sub(1), self.policy) {
            (Some(head), _) => head,
            (None, HeadPolicy::Wrap) => self.len() - 1,
            (None, HeadPolicy::Reject) => return Err(TapeError::Underflow),
        };
        Ok(())
    }

    pub fn right(&mut self) -> Result<(), TapeError> {
        let next = self.head + 1;
        self.head = match (next < self.len(), self.policy) {
            (true, _) => next,
            (false, HeadPolicy::Wrap) => 0,
            (false, HeadPolicy::Reject) => return Err(TapeError::Overflow { last: self.len() - 1 }),
        };
        Ok(())
    }
}
