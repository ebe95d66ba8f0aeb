//! An in-memory flash controller
//!
//! Behaves like the NVMCTRL of the SAMD parts as far as a [crate::FlashRegion]
//! can tell: the page buffer is cleared to 0xFF, committing it can only clear
//! bits, and a row erase sets a whole row back to 0xFF.
//! Every protocol violation (a command issued while the previous one is still
//! running, a page write outside of a write sequence, an unaligned erase)
//! panics, so tests catch driver mistakes instead of silently corrupting data.

use core::cell::Cell;

use crate::controller::{Command, Geometry, NvmController, PageSize};

/// The largest page size the PSZ field can describe
pub const MAX_PAGE_SIZE: usize = 1024;

/// The amount of erased row addresses that are remembered
pub const ERASE_LOG_LEN: usize = 64;

/// A flash of `SIZE` bytes starting at address 0
pub struct SimulatedNvm<const SIZE: usize> {
    memory: [u8; SIZE],
    geometry: Geometry,
    page_buffer: [u8; MAX_PAGE_SIZE],
    /// The page the buffer is destined for, known after the first fill
    buffer_page: Option<usize>,
    writing: bool,
    busy: Cell<bool>,
    erased_rows: heapless::Vec<usize, ERASE_LOG_LEN>,
    erase_count: usize,
    page_write_count: usize,
    cache_invalidations: usize,
}

impl<const SIZE: usize> SimulatedNvm<SIZE> {
    /// Creates an erased flash with the given page size and `pages_per_row` pages in a row
    pub fn new(page_size: PageSize, pages_per_row: u32) -> Self {
        let page_size = page_size.bytes();
        assert!(SIZE % (page_size * pages_per_row) as usize == 0);

        Self {
            memory: [0xFF; SIZE],
            geometry: Geometry {
                page_size,
                row_size: page_size * pages_per_row,
                flash_size: SIZE as u32,
            },
            page_buffer: [0xFF; MAX_PAGE_SIZE],
            buffer_page: None,
            writing: false,
            busy: Cell::new(false),
            erased_rows: heapless::Vec::new(),
            erase_count: 0,
            page_write_count: 0,
            cache_invalidations: 0,
        }
    }

    /// The contents of the whole flash
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Direct access to the flash, bypassing the controller
    pub fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    /// The amount of row erases executed
    pub fn erase_count(&self) -> usize {
        self.erase_count
    }

    /// The start addresses of the erased rows, in the order they were erased
    ///
    /// At most [ERASE_LOG_LEN] rows are remembered; erasing more without a
    /// [Self::reset_counters] in between panics.
    pub fn erased_rows(&self) -> &[usize] {
        &self.erased_rows
    }

    /// The amount of page writes executed
    pub fn page_write_count(&self) -> usize {
        self.page_write_count
    }

    /// The amount of cache invalidations requested
    pub fn cache_invalidations(&self) -> usize {
        self.cache_invalidations
    }

    /// Forgets all executed commands
    pub fn reset_counters(&mut self) {
        self.erased_rows.clear();
        self.erase_count = 0;
        self.page_write_count = 0;
        self.cache_invalidations = 0;
    }

    fn page_size(&self) -> usize {
        self.geometry.page_size as usize
    }

    fn row_size(&self) -> usize {
        self.geometry.row_size as usize
    }
}

impl<const SIZE: usize> NvmController for SimulatedNvm<SIZE> {
    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn begin_write(&mut self) {
        assert!(!self.writing, "Write sequences can't be nested");
        self.writing = true;
    }

    fn end_write(&mut self) {
        assert!(self.writing, "No write sequence was started");
        self.writing = false;
    }

    fn issue_command(&mut self, command: Command, address: usize) {
        assert!(!self.busy.get(), "A command was issued before the previous one completed");
        self.busy.set(true);

        match command {
            Command::PageBufferClear => {
                self.page_buffer = [0xFF; MAX_PAGE_SIZE];
                self.buffer_page = None;
            }
            Command::WritePage => {
                assert!(self.writing, "Page writes must be part of a write sequence");
                let page_size = self.page_size();
                if let Some(page) = self.buffer_page.take() {
                    // Programming can only clear bits
                    for (cell, byte) in self.memory[page..page + page_size]
                        .iter_mut()
                        .zip(&self.page_buffer[..page_size])
                    {
                        *cell &= *byte;
                    }
                }
                self.page_write_count += 1;
            }
            Command::EraseRow => {
                let row_size = self.row_size();
                assert!(address % row_size == 0, "Row erases must be row aligned");
                assert!(address < SIZE, "Row erases must stay in the flash");
                self.memory[address..address + row_size].fill(0xFF);
                self.erase_count += 1;
                assert!(
                    self.erased_rows.push(address).is_ok(),
                    "The erase log holds {} rows, reset the counters first",
                    ERASE_LOG_LEN
                );
            }
        }
    }

    fn wait_ready(&self) {
        self.busy.set(false);
    }

    fn fill_page_buffer(&mut self, address: usize, word: u32) {
        assert!(self.writing, "The page buffer is filled outside of a write sequence");
        assert!(!self.busy.get(), "The page buffer is filled while a command is running");
        assert!(address % 4 == 0, "Page buffer fills must be word aligned");
        assert!(address + 4 <= SIZE, "Page buffer fills must stay in the flash");

        let page_size = self.page_size();
        let page = address - address % page_size;
        match self.buffer_page {
            Some(buffer_page) => assert_eq!(
                buffer_page, page,
                "The page buffer can only hold one page at a time"
            ),
            None => self.buffer_page = Some(page),
        }

        let offset = address - page;
        self.page_buffer[offset..offset + 4].copy_from_slice(&word.to_ne_bytes());
    }

    fn read(&self, address: usize, buffer: &mut [u8]) {
        assert!(!self.busy.get(), "Flash is read while a command is running");
        buffer.copy_from_slice(&self.memory[address..address + buffer.len()]);
    }

    fn invalidate_cache(&mut self) {
        self.cache_invalidations += 1;
    }
}
