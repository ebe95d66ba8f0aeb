//! Decoding of the NVMCTRL parameter register

use shared::{Geometry, PageSize};

/// The erase alignment of a SAMD21 storage block, one row
pub const SAMD21_ERASE_ALIGNMENT: usize = 256;
/// The erase alignment of a SAMD51 storage block, one erase block
pub const SAMD51_ERASE_ALIGNMENT: usize = 8192;

/// The amount of pages in a SAMD21 row
const SAMD21_PAGES_PER_ROW: u32 = 4;

/// The geometry of a SAMD21 with `nvmp` pages of the size encoded by `psz`
pub fn samd21(nvmp: u16, psz: u8) -> Geometry {
    let page_size = PageSize::from_psz(psz as u32).bytes();

    Geometry {
        page_size,
        row_size: page_size * SAMD21_PAGES_PER_ROW,
        flash_size: nvmp as u32 * page_size,
    }
}

/// The geometry of a SAMD51 with `nvmp` pages of the size encoded by `psz`
pub fn samd51(nvmp: u16, psz: u8) -> Geometry {
    let page_size = PageSize::from_psz(psz as u32).bytes();
    let flash_size = nvmp as u32 * page_size;

    Geometry {
        page_size,
        // The flash is split in 64 erase blocks
        row_size: (flash_size / 64).max(page_size),
        flash_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samd21g18() {
        let geometry = samd21(4096, 3);
        assert_eq!(geometry.page_size, 64);
        assert_eq!(geometry.row_size, 256);
        assert_eq!(geometry.flash_size, 256 * 1024);
        assert_eq!(geometry.row_size as usize, SAMD21_ERASE_ALIGNMENT);
    }

    #[test]
    fn samd21e15() {
        let geometry = samd21(512, 3);
        assert_eq!(geometry.row_size, 256);
        assert_eq!(geometry.flash_size, 32 * 1024);
    }

    #[test]
    fn samd51j19() {
        let geometry = samd51(1024, 6);
        assert_eq!(geometry.page_size, 512);
        assert_eq!(geometry.row_size, 8192);
        assert_eq!(geometry.flash_size, 512 * 1024);
        assert_eq!(geometry.row_size as usize, SAMD51_ERASE_ALIGNMENT);
    }

    #[test]
    fn samd51_row_is_never_below_a_page() {
        let geometry = samd51(16, 6);
        assert_eq!(geometry.row_size, geometry.page_size);
    }
}
