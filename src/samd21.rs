//! NVMCTRL of the SAMD21 (and the SAMD11/SAML21 parts sharing its layout)

use atsamd21g::NVMCTRL;
use shared::{Command, Geometry, NvmController};

use crate::geometry;

/// The SAMD21 memory controller
pub struct Samd21Nvm {
    nvmctrl: NVMCTRL,
}

impl Samd21Nvm {
    /// Takes ownership of the NVMCTRL peripheral.
    ///
    /// The controller may only be used from one execution context at a time.
    /// Interrupt handlers that touch the flash must be masked while an
    /// operation is running.
    pub fn new(nvmctrl: NVMCTRL) -> Self {
        Self { nvmctrl }
    }

    /// Gives the peripheral back
    pub fn free(self) -> NVMCTRL {
        self.nvmctrl
    }
}

impl NvmController for Samd21Nvm {
    fn geometry(&self) -> Geometry {
        let param = self.nvmctrl.param.read();
        geometry::samd21(param.nvmp().bits(), param.psz().bits())
    }

    fn begin_write(&mut self) {
        // Pages are only committed by an explicit write page command.
        // Manual write mode is left on afterwards, nothing else relies on automatic commits.
        self.nvmctrl.ctrlb.modify(|_, w| w.manw().set_bit());
    }

    fn end_write(&mut self) {}

    fn issue_command(&mut self, command: Command, address: usize) {
        let nvmctrl = &self.nvmctrl;
        match command {
            Command::PageBufferClear => nvmctrl.ctrla.write(|w| w.cmdex().key().cmd().pbc()),
            Command::WritePage => nvmctrl.ctrla.write(|w| w.cmdex().key().cmd().wp()),
            Command::EraseRow => {
                // The address register holds 16-bit word addresses
                nvmctrl.addr.write(|w| unsafe { w.addr().bits((address / 2) as u32) });
                nvmctrl.ctrla.write(|w| w.cmdex().key().cmd().er());
            }
        }
    }

    fn wait_ready(&self) {
        while self.nvmctrl.intflag.read().ready().bit_is_clear() {}
    }

    fn fill_page_buffer(&mut self, address: usize, word: u32) {
        // Writes to the flash address space land in the page buffer
        unsafe { (address as *mut u32).write_volatile(word) }
    }

    fn read(&self, address: usize, buffer: &mut [u8]) {
        // The flash is memory mapped and the range was bounds checked by the region
        unsafe { core::ptr::copy_nonoverlapping(address as *const u8, buffer.as_mut_ptr(), buffer.len()) }
    }
}
