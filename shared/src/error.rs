//! Errors reported by the flash region and the typed record store

use core::fmt;

/// The reason a flash operation was refused or a stored record was rejected.
///
/// Every variant is detected before the operation has any effect on the
/// flash, except for the two record variants which are only ever produced by
/// reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// The requested range is not contained in the region,
    /// or `address + size` does not fit in the address space
    OutOfBounds,
    /// The address is not aligned to the granularity of the operation
    Misaligned,
    /// The erase target lies beyond the flash reported by the controller
    OutOfPhysicalRange,
    /// The stored identity tag belongs to another variable, another layout or erased flash
    IdentityMismatch,
    /// The stored checksum doesn't match the stored payload
    ChecksumMismatch,
}

impl fmt::Display for FlashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FlashError::OutOfBounds => "range is outside of the flash region",
            FlashError::Misaligned => "address is not aligned",
            FlashError::OutOfPhysicalRange => "address is outside of the physical flash",
            FlashError::IdentityMismatch => "stored record has a different identity",
            FlashError::ChecksumMismatch => "stored record is corrupted",
        };
        f.write_str(text)
    }
}
