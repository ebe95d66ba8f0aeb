//! Bounds checked access to a span of flash

use crate::{
    controller::{Command, Geometry, NvmController},
    FlashError,
};

/// A contiguous span of flash.
///
/// The region doesn't own the controller. Every operation borrows it, so two
/// regions can share the single memory controller while the borrow checker
/// keeps them from using it at the same time.
///
/// A region with a length of 0 is unbounded: every range is accepted and only
/// the checks done by the operations themselves apply.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashRegion {
    address: usize,
    len: usize,
    geometry: Geometry,
}

impl FlashRegion {
    /// Creates a region of `len` bytes at `address`, reading the geometry from the controller
    pub fn new(controller: &impl NvmController, address: usize, len: usize) -> Self {
        Self::with_geometry(controller.geometry(), address, len)
    }

    /// Creates a region with an already known geometry
    pub const fn with_geometry(geometry: Geometry, address: usize, len: usize) -> Self {
        Self {
            address,
            len,
            geometry,
        }
    }

    /// The first address of the region
    pub fn address(&self) -> usize {
        self.address
    }

    /// The length of the region in bytes. 0 means unbounded.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the region doesn't enforce any bounds
    pub fn is_unbounded(&self) -> bool {
        self.len == 0
    }

    /// The geometry that was read when the region was created
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// The size of a page in bytes
    pub fn page_size(&self) -> usize {
        self.geometry.page_size as usize
    }

    /// The size of a row in bytes
    pub fn row_size(&self) -> usize {
        self.geometry.row_size as usize
    }

    /// Returns `true` if `size` bytes starting at `address` lie in the region.
    ///
    /// An unbounded region contains every range. For any other region, a range
    /// whose end doesn't fit in the address space is never contained.
    pub fn contains(&self, address: usize, size: usize) -> bool {
        if self.is_unbounded() {
            return true;
        }

        if address.checked_add(size).is_none() {
            return false;
        }

        // Compared as offsets so `self.address + self.len` is never computed
        match address.checked_sub(self.address) {
            Some(offset) => size <= self.len && offset <= self.len - size,
            None => false,
        }
    }

    fn check_bounds(&self, address: usize, size: usize) -> Result<(), FlashError> {
        if self.contains(address, size) {
            Ok(())
        } else {
            debug!("Rejecting {:#x}+{} outside of the region", address, size);
            Err(FlashError::OutOfBounds)
        }
    }

    /// Copies `buffer.len()` bytes starting at `address` into the buffer.
    ///
    /// The buffer is untouched when the range is rejected.
    pub fn read(
        &self,
        controller: &impl NvmController,
        address: usize,
        buffer: &mut [u8],
    ) -> Result<(), FlashError> {
        self.check_bounds(address, buffer.len())?;

        controller.read_barrier();
        controller.read(address, buffer);
        controller.read_barrier();

        Ok(())
    }

    /// Programs `data` starting at `address`.
    ///
    /// The flash isn't erased first. Programming can only clear bits, so the
    /// target must already be erased for the result to equal `data`.
    ///
    /// `address` must be word aligned. The data is programmed page by page and
    /// a chunk never crosses a page boundary. When the length isn't a multiple
    /// of four, the last word is padded with 0xFF which leaves those bytes untouched.
    ///
    /// On an unbounded region the addresses wrap around to 0 past the top of
    /// the address space.
    pub fn write(
        &self,
        controller: &mut impl NvmController,
        address: usize,
        data: &[u8],
    ) -> Result<(), FlashError> {
        self.check_bounds(address, data.len())?;

        if address % 4 != 0 {
            debug!("Rejecting write to unaligned address {:#x}", address);
            return Err(FlashError::Misaligned);
        }

        if data.is_empty() {
            return Ok(());
        }

        let page_size = self.page_size();

        controller.begin_write();

        let mut page_address = address;
        let mut remaining = data;
        while !remaining.is_empty() {
            // The room is a multiple of four because the address and the page size are
            let room = page_size - page_address % page_size;
            let (chunk, rest) = remaining.split_at(room.min(remaining.len()));

            controller.execute(Command::PageBufferClear, page_address);

            for (index, bytes) in chunk.chunks(4).enumerate() {
                // The source can have any alignment, so the word is assembled byte by byte
                let mut word = [0xFF; 4];
                word[..bytes.len()].copy_from_slice(bytes);
                controller.fill_page_buffer(
                    page_address.wrapping_add(index * 4),
                    u32::from_ne_bytes(word),
                );
            }

            controller.execute(Command::WritePage, page_address);
            controller.invalidate_cache();

            trace!("Programmed {} bytes at {:#x}", chunk.len(), page_address);

            page_address = page_address.wrapping_add(chunk.len());
            remaining = rest;
        }

        controller.end_write();
        controller.sync();

        Ok(())
    }

    /// Erases the rows covering `size` bytes starting at `address`.
    ///
    /// Whole rows are erased, so bytes before or after the range that share a
    /// row with it are erased as well. `address` must be row aligned and every
    /// row must lie in the physical flash. Both are verified before the first
    /// row is erased.
    pub fn erase(
        &self,
        controller: &mut impl NvmController,
        address: usize,
        size: usize,
    ) -> Result<(), FlashError> {
        self.check_bounds(address, size)?;

        if size == 0 {
            return Ok(());
        }

        let row_size = self.row_size();
        let last_row = address
            .checked_add((size - 1) / row_size * row_size)
            .ok_or(FlashError::OutOfBounds)?;
        self.check_row(address)?;
        self.check_row(last_row)?;

        let mut row = address;
        let mut remaining = size;
        while remaining > row_size {
            self.erase_row(controller, row)?;
            row += row_size;
            remaining -= row_size;
        }

        // Erase the remaining partial or full row
        self.erase_row(controller, row)
    }

    fn check_row(&self, address: usize) -> Result<(), FlashError> {
        if address % self.row_size() != 0 {
            debug!("Rejecting erase of unaligned row {:#x}", address);
            return Err(FlashError::Misaligned);
        }

        if address >= self.geometry.flash_size as usize {
            debug!("Rejecting erase of row {:#x} outside of the flash", address);
            return Err(FlashError::OutOfPhysicalRange);
        }

        Ok(())
    }

    /// Erases the row starting at `address`
    fn erase_row(&self, controller: &mut impl NvmController, address: usize) -> Result<(), FlashError> {
        self.check_row(address)?;

        controller.execute(Command::EraseRow, address);
        controller.invalidate_cache();
        controller.sync();

        trace!("Erased row {:#x}", address);

        Ok(())
    }

    /// Reads `buffer.len()` bytes from the start of the region
    pub fn read_all(&self, controller: &impl NvmController, buffer: &mut [u8]) -> Result<(), FlashError> {
        self.read(controller, self.address, buffer)
    }

    /// Programs `data` at the start of the region
    pub fn write_all(&self, controller: &mut impl NvmController, data: &[u8]) -> Result<(), FlashError> {
        self.write(controller, self.address, data)
    }

    /// Erases every row the region touches
    pub fn erase_all(&self, controller: &mut impl NvmController) -> Result<(), FlashError> {
        self.erase(controller, self.address, self.len)
    }
}
