//! The capabilities a flash region needs from the memory controller

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The portable set of controller commands used by [crate::FlashRegion].
///
/// Each controller maps these onto its own command codes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Set every byte of the page buffer to 0xFF
    PageBufferClear,
    /// Commit the page buffer to the page that was last written into it
    WritePage,
    /// Erase the row starting at the given address
    EraseRow,
}

/// Page sizes that can be reported by the PSZ field of the parameter register
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PageSize {
    /// 8 byte pages
    Bytes8 = 0,
    /// 16 byte pages
    Bytes16 = 1,
    /// 32 byte pages
    Bytes32 = 2,
    /// 64 byte pages
    Bytes64 = 3,
    /// 128 byte pages
    Bytes128 = 4,
    /// 256 byte pages
    Bytes256 = 5,
    /// 512 byte pages
    Bytes512 = 6,
    /// 1024 byte pages
    Bytes1024 = 7,
}

impl PageSize {
    /// Decodes the 3-bit PSZ field. Bits above the field are ignored.
    pub fn from_psz(psz: u32) -> Self {
        // Masked to three bits, so every value has a variant
        Self::try_from((psz & 0b111) as u8).unwrap_or(PageSize::Bytes8)
    }

    /// The page size in bytes
    pub const fn bytes(self) -> u32 {
        8 << self as u32
    }
}

/// The memory layout reported by the controller
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Geometry {
    /// The amount of bytes programmed by one page write
    pub page_size: u32,
    /// The amount of bytes cleared by one row erase. Always a multiple of the page size.
    pub row_size: u32,
    /// The size of the implemented flash, starting at address 0
    pub flash_size: u32,
}

/// A memory controller in front of the flash.
///
/// The controller is a single hardware resource. It must not be used from two
/// execution contexts at the same time and none of the methods may be called
/// while another one is still running on a different context. Every method
/// blocks until the hardware is done.
pub trait NvmController {
    /// Reads the page and row geometry from the controller
    fn geometry(&self) -> Geometry;

    /// Prepares the controller for a sequence of page writes.
    /// Automatic page commits are switched off, so only [Command::WritePage] commits data.
    fn begin_write(&mut self);

    /// Restores whatever [Self::begin_write] changed
    fn end_write(&mut self);

    /// Starts the command. The address is only used by [Command::EraseRow].
    fn issue_command(&mut self, command: Command, address: usize);

    /// Blocks until the last command has completed
    fn wait_ready(&self);

    /// Writes one word into the page buffer at the flash address it's destined for.
    /// The address is word aligned.
    fn fill_page_buffer(&mut self, address: usize, word: u32);

    /// Copies the flash contents starting at `address` into `buffer`
    fn read(&self, address: usize, buffer: &mut [u8]);

    /// Invalidates any cache that sits in front of the flash
    fn invalidate_cache(&mut self) {}

    /// Makes the result of a finished write or erase visible to subsequent reads and fetches
    fn sync(&self) {}

    /// Issues the barriers needed before and after reading the flash
    fn read_barrier(&self) {}

    /// Issues the command and waits for it to complete
    fn execute(&mut self, command: Command, address: usize) {
        self.issue_command(command, address);
        self.wait_ready();
    }
}
