//! The Cortex-M cache controller of the SAMD51

use atsamd51j::CMCC;

/// The cache that sits in front of the flash on the SAMD51
pub(crate) struct Cmcc {
    cmcc: CMCC,
}

impl Cmcc {
    pub fn new(cmcc: CMCC) -> Self {
        Self { cmcc }
    }

    pub fn free(self) -> CMCC {
        self.cmcc
    }

    fn is_enabled(&self) -> bool {
        self.cmcc.sr.read().csts().bit_is_set()
    }

    /// Drops every cache line if the cache is enabled.
    ///
    /// The cache can only be invalidated while it's disabled, so it's turned
    /// off, invalidated and turned back on.
    pub fn invalidate_all(&self) {
        if !self.is_enabled() {
            return;
        }

        self.cmcc.ctrl.write(|w| w.cen().clear_bit());
        while self.is_enabled() {}

        self.cmcc.maint0.write(|w| w.invall().set_bit());

        self.cmcc.ctrl.write(|w| w.cen().set_bit());
        while !self.is_enabled() {}
    }
}
