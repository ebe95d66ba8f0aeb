//! NVMCTRL of the SAMD51 (and the SAME5x parts sharing its layout)

use atsamd51j::{CMCC, NVMCTRL};
use shared::{Command, Geometry, NvmController};

use crate::{cmcc::Cmcc, geometry};

/// The SAMD51 memory controller together with the cache in front of the flash
pub struct Samd51Nvm {
    nvmctrl: NVMCTRL,
    cmcc: Cmcc,
    /// The CACHEDIS0 and CACHEDIS1 bits from before the running write sequence
    saved_cache_disable: (bool, bool),
}

impl Samd51Nvm {
    /// Takes ownership of the NVMCTRL and CMCC peripherals.
    ///
    /// The controller may only be used from one execution context at a time.
    /// Interrupt handlers that touch the flash must be masked while an
    /// operation is running.
    pub fn new(nvmctrl: NVMCTRL, cmcc: CMCC) -> Self {
        Self {
            nvmctrl,
            cmcc: Cmcc::new(cmcc),
            saved_cache_disable: (false, false),
        }
    }

    /// Gives the peripherals back
    pub fn free(self) -> (NVMCTRL, CMCC) {
        (self.nvmctrl, self.cmcc.free())
    }
}

impl NvmController for Samd51Nvm {
    fn geometry(&self) -> Geometry {
        let param = self.nvmctrl.param.read();
        geometry::samd51(param.nvmp().bits(), param.psz().bits())
    }

    fn begin_write(&mut self) {
        let nvmctrl = &self.nvmctrl;

        // Manual write mode, pages are only committed by an explicit write page command
        nvmctrl.ctrla.modify(|_, w| w.wmode().man());
        while nvmctrl.status.read().ready().bit_is_clear() {}

        // The NVMCTRL cache has to be off while writing (SAMD51 errata)
        let ctrla = nvmctrl.ctrla.read();
        self.saved_cache_disable = (ctrla.cachedis0().bit(), ctrla.cachedis1().bit());
        nvmctrl.ctrla.modify(|_, w| w.cachedis0().set_bit().cachedis1().set_bit());
    }

    fn end_write(&mut self) {
        let (cachedis0, cachedis1) = self.saved_cache_disable;
        self.nvmctrl
            .ctrla
            .modify(|_, w| w.cachedis0().bit(cachedis0).cachedis1().bit(cachedis1));
    }

    fn issue_command(&mut self, command: Command, address: usize) {
        let nvmctrl = &self.nvmctrl;

        // Clear the completion flag of the previous command
        nvmctrl.intflag.write(|w| w.done().set_bit());

        match command {
            Command::PageBufferClear => nvmctrl.ctrlb.write(|w| w.cmdex().key().cmd().pbc()),
            Command::WritePage => nvmctrl.ctrlb.write(|w| w.cmdex().key().cmd().wp()),
            Command::EraseRow => {
                nvmctrl.addr.write(|w| unsafe { w.addr().bits(address as u32) });
                nvmctrl.ctrlb.write(|w| w.cmdex().key().cmd().eb());
            }
        }
    }

    fn wait_ready(&self) {
        while self.nvmctrl.intflag.read().done().bit_is_clear() {}
    }

    fn fill_page_buffer(&mut self, address: usize, word: u32) {
        // Writes to the flash address space land in the page buffer
        unsafe { (address as *mut u32).write_volatile(word) }
    }

    fn read(&self, address: usize, buffer: &mut [u8]) {
        // The flash is memory mapped and the range was bounds checked by the region
        unsafe { core::ptr::copy_nonoverlapping(address as *const u8, buffer.as_mut_ptr(), buffer.len()) }
    }

    fn invalidate_cache(&mut self) {
        self.cmcc.invalidate_all();
    }

    fn sync(&self) {
        cortex_m::asm::dsb();
        cortex_m::asm::isb();
    }

    fn read_barrier(&self) {
        cortex_m::asm::dsb();
    }
}
