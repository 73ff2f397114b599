use std::collections::{HashMap, VecDeque};
use log::{debug, trace};
use serde::Serialize;
use crate::config::{PageReplacementConfig, VirtualMemoryConfig};
use crate::error::{require_non_zero, ConfigError};

/// A page table entry. Entries are created lazily, invalid, the first time a page is touched
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize)]
pub struct PageTableEntry {
    pub valid: bool,
    pub frame: Option<usize>,
}

/// The outcome of a single virtual memory access
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub struct PageAccess {
    pub page: u64,
    pub offset: u64,
    pub frame: usize,
    pub fault: bool,
}

/// A paging virtual memory manager with a fixed pool of physical frames
///
/// Victims are chosen in the order pages were faulted in. Hits never reorder the replacement
/// queue, unlike the LRU policy of the cache levels
#[derive(Debug, Clone)]
pub struct VirtualMemoryManager {
    page_size: u64,
    policy: PageReplacementConfig,
    page_table: HashMap<u64, PageTableEntry>,
    frames: Vec<Option<u64>>,
    free_frames: VecDeque<usize>,
    replacement_queue: VecDeque<u64>,
    page_faults: u64,
}

impl VirtualMemoryManager {
    pub fn new(num_frames: u64, page_size: u64, policy: PageReplacementConfig) -> Result<Self, ConfigError> {
        require_non_zero("frame count", num_frames)?;
        require_non_zero("page size", page_size)?;
        // Physical addresses are frame * page_size + offset
        if num_frames.checked_mul(page_size).is_none() {
            return Err(ConfigError::Overflow { what: "physical memory", count: num_frames, size: page_size });
        }
        Ok(Self {
            page_size,
            policy,
            page_table: HashMap::new(),
            frames: vec![None; num_frames as usize],
            free_frames: (0..num_frames as usize).collect(),
            replacement_queue: VecDeque::new(),
            page_faults: 0,
        })
    }

    pub fn from_config(config: &VirtualMemoryConfig) -> Result<Self, ConfigError> {
        Self::new(config.frames, config.page_size, config.replacement_policy)
    }

    /// Translates `virtual_address`, faulting the page in if it isn't resident
    pub fn access(&mut self, virtual_address: u64) -> PageAccess {
        let page = virtual_address / self.page_size;
        let offset = virtual_address % self.page_size;
        let entry = self.page_table.entry(page).or_default();

        if let (true, Some(frame)) = (entry.valid, entry.frame) {
            trace!("page {page} resident in frame {frame}");
            return PageAccess { page, offset, frame, fault: false };
        }

        self.page_faults += 1;
        let frame = self.claim_frame();
        self.page_table.insert(page, PageTableEntry { valid: true, frame: Some(frame) });
        self.frames[frame] = Some(page);
        self.replacement_queue.push_back(page);
        PageAccess { page, offset, frame, fault: true }
    }

    /// Takes a free frame if there is one, otherwise evicts the page at the head of the queue
    fn claim_frame(&mut self) -> usize {
        if let Some(frame) = self.free_frames.pop_front() {
            return frame;
        }
        match self.policy {
            PageReplacementConfig::FirstInFirstOut => {
                // Every occupied frame has its page queued, and there is at least one frame
                let victim = self.replacement_queue.pop_front()
                    .expect("no free frames but nothing queued for replacement");
                let entry = self.page_table.entry(victim).or_default();
                let frame = entry.frame.take().expect("queued page has no frame");
                entry.valid = false;
                self.frames[frame] = None;
                debug!("page {victim} evicted from frame {frame}");
                frame
            }
        }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn page_faults(&self) -> u64 {
        self.page_faults
    }

    /// The page resident in each frame
    pub fn frames(&self) -> &[Option<u64>] {
        &self.frames
    }

    pub fn page_table(&self) -> &HashMap<u64, PageTableEntry> {
        &self.page_table
    }

    pub fn free_frames(&self) -> &VecDeque<usize> {
        &self.free_frames
    }

    /// Resident pages, next victim first
    pub fn replacement_queue(&self) -> &VecDeque<u64> {
        &self.replacement_queue
    }
}
