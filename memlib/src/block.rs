use std::fmt;
use serde::Serialize;

/// One contiguous extent of physical memory managed by the contiguous allocator
///
/// `owner_id` is `Some` exactly when the block is in use
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct Block {
    pub start: u64,
    pub size: u64,
    pub free: bool,
    pub owner_id: Option<u64>,
}

impl Block {
    /// A free block covering `[start, start + size)`
    pub fn free(start: u64, size: u64) -> Self {
        Self {
            start,
            size,
            free: true,
            owner_id: None,
        }
    }

    /// A used block owned by `owner_id`
    pub fn used(start: u64, size: u64, owner_id: u64) -> Self {
        Self {
            start,
            size,
            free: false,
            owner_id: Some(owner_id),
        }
    }

    /// Exclusive upper bound of the block
    pub fn end(&self) -> u64 {
        self.start + self.size
    }
}

/// Renders as `[start-last] FREE` or `[start-last] USED id=n`, where `last` is inclusive
///
/// # Examples
///
/// ```
/// use memlib::block::Block;
/// assert_eq!(Block::used(0, 100, 1).to_string(), "[0-99] USED id=1");
/// assert_eq!(Block::free(100, 924).to_string(), "[100-1023] FREE");
/// ```
impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}-{}] ", self.start, self.end() - 1)?;
        match self.owner_id {
            Some(id) if !self.free => write!(f, "USED id={id}"),
            _ => write!(f, "FREE"),
        }
    }
}
