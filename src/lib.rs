//! Flash storage for the SAMD21 and SAMD51 microcontrollers
//!
//! [FlashRegion] gives bounds checked read, write and erase access to a span
//! of the internal flash. [TypedRecordStore] keeps one value in such a region,
//! tagged with the identity of the variable and protected by a checksum.
//!
//! The chip family is selected with the `samd21` or `samd51` feature, which
//! picks the [Nvm] controller and the [ERASE_ALIGNMENT] storage blocks need.
//!
//! None of the operations are interrupt safe. The caller has to make sure the
//! controller is only used from one execution context at a time, for example
//! by running the operations in a critical section.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

#[cfg(all(feature = "samd21", feature = "samd51"))]
compile_error!("The `samd21` and `samd51` features are mutually exclusive");

#[cfg(feature = "samd51")]
mod cmcc;
pub mod geometry;
#[cfg(feature = "samd21")]
pub mod samd21;
#[cfg(feature = "samd51")]
pub mod samd51;

pub use shared::{
    hash::{checksum, identity_tag},
    zerocopy, Command, FlashError, FlashRegion, Geometry, NvmController, PageSize,
    TypedRecordStore,
};

/// The controller of the selected chip family
#[cfg(feature = "samd21")]
pub type Nvm = samd21::Samd21Nvm;
/// The controller of the selected chip family
#[cfg(feature = "samd51")]
pub type Nvm = samd51::Samd51Nvm;

/// The alignment and size granularity of a block of flash reserved for storage
#[cfg(feature = "samd21")]
pub const ERASE_ALIGNMENT: usize = geometry::SAMD21_ERASE_ALIGNMENT;
/// The alignment and size granularity of a block of flash reserved for storage
#[cfg(feature = "samd51")]
pub const ERASE_ALIGNMENT: usize = geometry::SAMD51_ERASE_ALIGNMENT;

/// Rounds `len` up to a multiple of `alignment`
pub const fn aligned_len(len: usize, alignment: usize) -> usize {
    len.div_ceil(alignment) * alignment
}

/// The size of the flash block that has to be reserved for a [TypedRecordStore] of `T`
/// on a chip with the given erase alignment
pub const fn storage_len_for<T>(alignment: usize) -> usize {
    aligned_len(core::mem::size_of::<T>() + 4, alignment)
}

/// The size of the flash block that has to be reserved for a [TypedRecordStore] of `T`
#[cfg(any(feature = "samd21", feature = "samd51"))]
pub const fn storage_len<T>() -> usize {
    storage_len_for::<T>(ERASE_ALIGNMENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_lengths() {
        assert_eq!(aligned_len(0, 256), 0);
        assert_eq!(aligned_len(1, 256), 256);
        assert_eq!(aligned_len(256, 256), 256);
        assert_eq!(aligned_len(260, 256), 512);
        assert_eq!(aligned_len(12, 8192), 8192);
    }

    #[test]
    fn storage_len_fits_a_record() {
        use geometry::{SAMD21_ERASE_ALIGNMENT, SAMD51_ERASE_ALIGNMENT};

        assert_eq!(storage_len_for::<u32>(SAMD21_ERASE_ALIGNMENT), 256);
        assert_eq!(storage_len_for::<[u8; 252]>(SAMD21_ERASE_ALIGNMENT), 256);
        assert_eq!(storage_len_for::<[u8; 253]>(SAMD21_ERASE_ALIGNMENT), 512);
        assert_eq!(storage_len_for::<u32>(SAMD51_ERASE_ALIGNMENT), 8192);
        assert_eq!(storage_len_for::<[u8; 8189]>(SAMD51_ERASE_ALIGNMENT), 16384);
    }

    #[cfg(any(feature = "samd21", feature = "samd51"))]
    #[test]
    fn storage_len_uses_the_selected_chip() {
        assert_eq!(storage_len::<u32>(), ERASE_ALIGNMENT);
    }
}
