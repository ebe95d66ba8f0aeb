use samd_flash_storage::{
    aligned_len, identity_tag, FlashError, FlashRegion, NvmController, PageSize, TypedRecordStore,
};
use shared::sim::SimulatedNvm;
use zerocopy::{FromBytes, Immutable, IntoBytes};

/// A SAMD21G18 sized page (64 bytes) and row (256 bytes), with 8KB of flash
type Nvm = SimulatedNvm<8192>;

fn samd21_like() -> Nvm {
    Nvm::new(PageSize::Bytes64, 4)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable)]
#[repr(C)]
struct Settings {
    brightness: u8,
    volume: u8,
    channel: u16,
    timeout_ms: u32,
    name: [u8; 8],
}

#[test]
fn stores_in_neighbouring_rows_are_independent() {
    let mut nvm = samd21_like();
    let row = nvm.geometry().row_size as usize;

    let settings = TypedRecordStore::<Settings>::new(&nvm, 0x1000, "settings");
    let boots = TypedRecordStore::<u32>::new(&nvm, 0x1000 + row, "boots");

    let value = Settings {
        brightness: 80,
        volume: 3,
        channel: 11,
        timeout_ms: 30_000,
        name: *b"kitchen\0",
    };
    settings.write(&mut nvm, &value).unwrap();

    for count in 1..=5u32 {
        boots.write(&mut nvm, &count).unwrap();
    }

    assert_eq!(settings.read_value(&nvm), Ok(value));
    assert_eq!(boots.read_value(&nvm), Ok(5));
    assert_eq!(nvm.erase_count(), 6);
}

#[test]
fn a_region_does_not_reach_into_its_neighbour() {
    let mut nvm = samd21_like();

    let first = FlashRegion::new(&nvm, 0x1000, 0x100);
    let second = FlashRegion::new(&nvm, 0x1100, 0x100);

    second.write_all(&mut nvm, &[0x42; 0x100]).unwrap();
    assert_eq!(first.write(&mut nvm, 0x10F0, &[0; 0x20]), Err(FlashError::OutOfBounds));
    assert_eq!(first.erase(&mut nvm, 0x1000, 0x101), Err(FlashError::OutOfBounds));

    let mut buffer = [0; 0x100];
    second.read_all(&nvm, &mut buffer).unwrap();
    assert_eq!(buffer, [0x42; 0x100]);
}

#[test]
fn record_survives_a_new_store_instance() {
    let mut nvm = samd21_like();

    TypedRecordStore::<u64>::new(&nvm, 0x0800, "uptime")
        .write(&mut nvm, &0x0123_4567_89AB_CDEF)
        .unwrap();

    // A "reboot" creates the store again from the same name and address
    let store = TypedRecordStore::<u64>::new(&nvm, 0x0800, "uptime");
    assert_eq!(store.identity_tag(), identity_tag("uptime", 8));
    assert_eq!(store.read_or_default(&nvm), 0x0123_4567_89AB_CDEF);
}

#[test]
fn layout_change_is_detected_after_an_update() {
    let mut nvm = samd21_like();

    #[derive(Debug, Default, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable)]
    #[repr(C)]
    struct SettingsV2 {
        settings: Settings,
        contrast: u32,
    }

    let old = TypedRecordStore::<Settings>::new(&nvm, 0x0400, "settings");
    old.write(&mut nvm, &Settings::default()).unwrap();

    let new = TypedRecordStore::<SettingsV2>::new(&nvm, 0x0400, "settings");
    assert_eq!(new.read_value(&nvm), Err(FlashError::IdentityMismatch));
    assert_eq!(new.read_or_default(&nvm), SettingsV2::default());

    let migrated = SettingsV2 {
        settings: Settings::default(),
        contrast: 7,
    };
    new.write(&mut nvm, &migrated).unwrap();
    assert_eq!(new.read_value(&nvm), Ok(migrated));
    assert_eq!(old.read_value(&nvm), Err(FlashError::IdentityMismatch));
}

#[test]
fn record_blocks_span_whole_rows() {
    let nvm = samd21_like();
    let row = nvm.geometry().row_size as usize;

    let record_len = TypedRecordStore::<Settings>::RECORD_LEN;
    assert_eq!(record_len, 20);
    assert_eq!(aligned_len(record_len, row), row);
}
