//! Storage of a single typed value with an identity tag and a checksum

use core::{marker::PhantomData, mem::size_of};

use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes};

use crate::{
    controller::NvmController,
    hash::{checksum, identity_tag},
    FlashError, FlashRegion,
};

/// The layout of a record in flash.
///
/// | offset            | size             | field        |
/// |-------------------|------------------|--------------|
/// | 0                 | 2                | identity tag |
/// | 2                 | `size_of::<T>()` | payload      |
/// | 2 + `size_of::<T>()` | 2             | checksum     |
///
/// The struct is packed, so no padding ever ends up in flash.
#[repr(C, packed)]
#[derive(FromBytes, IntoBytes, Immutable)]
struct Record<T> {
    identity_tag: u16,
    payload: T,
    checksum: u16,
}

impl<T: FromBytes + IntoBytes + Immutable> Record<T> {
    const PAYLOAD_START: usize = size_of::<u16>();
    const PAYLOAD_END: usize = Self::PAYLOAD_START + size_of::<T>();

    fn new(identity_tag: u16, value: &T) -> Self {
        let payload = value.as_bytes();

        let mut record = Self::new_zeroed();
        record.identity_tag = identity_tag;
        record.as_mut_bytes()[Self::PAYLOAD_START..Self::PAYLOAD_END].copy_from_slice(payload);
        record.checksum = checksum(payload);
        record
    }

    fn payload_bytes(&self) -> &[u8] {
        &self.as_bytes()[Self::PAYLOAD_START..Self::PAYLOAD_END]
    }
}

/// A value of type `T` kept in its own flash region.
///
/// The record is replaced in place with an erase followed by a write. Writing
/// a value that is already stored doesn't touch the flash at all.
///
/// Like the controller it runs on, the store must not be used from two
/// execution contexts at the same time.
pub struct TypedRecordStore<T> {
    region: FlashRegion,
    identity_tag: u16,
    _payload: PhantomData<T>,
}

impl<T: FromBytes + IntoBytes + Immutable> TypedRecordStore<T> {
    /// The amount of bytes a record of `T` takes up in flash
    pub const RECORD_LEN: usize = size_of::<Record<T>>();

    /// Creates the store of the variable called `name` with its record at `address`.
    ///
    /// The address must be row aligned, otherwise every write fails with [FlashError::Misaligned].
    pub fn new(controller: &impl NvmController, address: usize, name: &str) -> Self {
        Self::with_identity_tag(controller, address, identity_tag(name, size_of::<T>()))
    }

    /// Creates a store that uses an already computed identity tag
    pub fn with_identity_tag(controller: &impl NvmController, address: usize, identity_tag: u16) -> Self {
        Self {
            region: FlashRegion::new(controller, address, Self::RECORD_LEN),
            identity_tag,
            _payload: PhantomData,
        }
    }

    /// The region holding the record
    pub fn region(&self) -> &FlashRegion {
        &self.region
    }

    /// The tag every record of this store carries
    pub fn identity_tag(&self) -> u16 {
        self.identity_tag
    }

    /// Stores the value.
    ///
    /// When the stored record is byte for byte the record that would be
    /// written, nothing is erased or programmed.
    pub fn write(&self, controller: &mut impl NvmController, value: &T) -> Result<(), FlashError> {
        let candidate = Record::new(self.identity_tag, value);

        let mut stored = Record::<T>::new_zeroed();
        if self.region.read_all(&*controller, stored.as_mut_bytes()).is_ok()
            && stored.as_bytes() == candidate.as_bytes()
        {
            trace!("Record {:#x} is unchanged", self.identity_tag);
            return Ok(());
        }

        debug!("Replacing record {:#x}", self.identity_tag);
        self.region.erase_all(controller)?;
        self.region.write_all(controller, candidate.as_bytes())
    }

    /// Reads the stored value into `value`.
    ///
    /// `value` is only changed when a valid record of this store was found.
    pub fn read(&self, controller: &impl NvmController, value: &mut T) -> Result<(), FlashError> {
        let mut stored = Record::<T>::new_zeroed();
        self.region.read_all(controller, stored.as_mut_bytes())?;

        let stored_tag = stored.identity_tag;
        if stored_tag != self.identity_tag {
            debug!("Record has tag {:#x}, expected {:#x}", stored_tag, self.identity_tag);
            return Err(FlashError::IdentityMismatch);
        }

        let payload = stored.payload_bytes();
        let stored_checksum = stored.checksum;
        if stored_checksum != checksum(payload) {
            warn!("Record {:#x} is corrupted", self.identity_tag);
            return Err(FlashError::ChecksumMismatch);
        }

        value.as_mut_bytes().copy_from_slice(payload);
        Ok(())
    }

    /// Reads the stored value
    pub fn read_value(&self, controller: &impl NvmController) -> Result<T, FlashError> {
        let mut value = T::new_zeroed();
        self.read(controller, &mut value)?;
        Ok(value)
    }

    /// Reads the stored value, falling back to `T::default()`.
    ///
    /// The fallback is silent: an erased, foreign or corrupted record all look
    /// like a default value. Use [Self::read] when the difference matters.
    pub fn read_or_default(&self, controller: &impl NvmController) -> T
    where
        T: Default,
    {
        self.read_value(controller).unwrap_or_default()
    }
}
