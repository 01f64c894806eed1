//! Instance definitions for the I2C controller blocks.
//!
//! The MAX32665/MAX32666 carry three identical controllers. Each gets a
//! singleton ownership token that derefs to the shared [`RegisterBlock`]
//! layout and implements [`Instance`] over it.

use core::marker::PhantomData;
use core::ops::Deref;
use core::sync::atomic::{AtomicBool, Ordering};

use volatile_register::{RO, RW};

use super::{Instance, IntFlags};

/// I2C controller register block
#[repr(C)]
pub struct RegisterBlock {
    /// Control register
    pub ctrl: RW<u32>,
    /// Status register
    pub status: RO<u32>,
    /// Interrupt flag register 0
    pub int_fl0: RW<u32>,
    /// Interrupt enable register 0
    pub int_en0: RW<u32>,
    /// Interrupt flag register 1
    pub int_fl1: RW<u32>,
    /// Interrupt enable register 1
    pub int_en1: RW<u32>,
    /// FIFO level register
    pub fifo_len: RO<u32>,
    /// Receive control register 0
    pub rx_ctrl0: RW<u32>,
    /// Receive control register 1
    pub rx_ctrl1: RW<u32>,
    /// Transmit control register 0
    pub tx_ctrl0: RW<u32>,
    /// Transmit control register 1
    pub tx_ctrl1: RW<u32>,
    /// Data FIFO access register
    pub fifo: RW<u32>,
    /// Controller mode register
    pub mstr_mode: RW<u32>,
    /// SCL low phase count
    pub clk_lo: RW<u32>,
    /// SCL high phase count
    pub clk_hi: RW<u32>,
    /// High-speed mode clock control
    pub hs_clk: RW<u32>,
    /// Bus timeout
    pub timeout: RW<u32>,
    /// Target address register
    pub sladdr: RW<u32>,
    /// DMA control
    pub dma: RW<u32>,
}

const CTRL_EN: u32 = 1 << 0;
const CTRL_MST: u32 = 1 << 1;

const MSTR_MODE_START: u32 = 1 << 0;
const MSTR_MODE_RESTART: u32 = 1 << 1;
const MSTR_MODE_STOP: u32 = 1 << 2;

const RX_CTRL0_FLUSH: u32 = 1 << 7;
const RX_CTRL0_THRESH_MASK: u32 = 0xF << 8;
const RX_CTRL0_THRESH_POS: u32 = 8;
const RX_CTRL1_CNT_MASK: u32 = 0xFF;

const TX_CTRL0_FLUSH: u32 = 1 << 7;
const TX_CTRL0_THRESH_MASK: u32 = 0xF << 8;
const TX_CTRL0_THRESH_POS: u32 = 8;

/// GPIO pad drive-strength select registers. Each pad owns one bit per
/// register; the pair selects one of four drive levels.
#[repr(C)]
pub struct PadStrength {
    /// Drive-strength select, low bit
    pub ds0: RW<u32>,
    /// Drive-strength select, high bit
    pub ds1: RW<u32>,
}

macro_rules! i2c {
    ($I2CX:ident: $base:literal, $pads:literal, $scl:literal, $sda:literal) => {
        paste::item! {
            static [<$I2CX _TAKEN>]: AtomicBool = AtomicBool::new(false);

            #[doc = "Ownership token for the " $I2CX " controller instance."]
            pub struct $I2CX {
                _marker: PhantomData<*const ()>,
            }

            impl $I2CX {
                /// Register block base address.
                pub const PTR: *const RegisterBlock = $base as *const _;

                /// Drive-strength select block covering this instance's
                /// pads.
                const PAD_PTR: *const PadStrength = $pads as *const _;

                /// Select bits for the instance's SCL and SDA pads.
                const PAD_BITS: u32 = (1 << $scl) | (1 << $sda);

                #[doc = "Take the singleton " $I2CX " token."]
                ///
                /// Returns `None` if it was taken before.
                pub fn take() -> Option<Self> {
                    if [<$I2CX _TAKEN>].swap(true, Ordering::AcqRel) {
                        None
                    } else {
                        Some($I2CX { _marker: PhantomData })
                    }
                }

                #[doc = "Conjure a " $I2CX " token out of thin air."]
                ///
                /// # Safety
                ///
                /// Bypasses the single-owner guarantee; the caller must
                /// ensure no other token for this instance is in use.
                pub unsafe fn steal() -> Self {
                    $I2CX { _marker: PhantomData }
                }
            }

            impl Deref for $I2CX {
                type Target = RegisterBlock;

                fn deref(&self) -> &Self::Target {
                    unsafe { &*Self::PTR }
                }
            }

            impl crate::Sealed for $I2CX {}

            impl Instance for $I2CX {
                fn read_fifo(&mut self) -> u8 {
                    self.fifo.read() as u8
                }

                fn write_fifo(&mut self, data: u8) {
                    unsafe { self.fifo.write(u32::from(data)) }
                }

                fn flags(&self) -> IntFlags {
                    IntFlags::from_bits_truncate(self.int_fl0.read())
                }

                fn clear_flags(&mut self, flags: IntFlags) {
                    unsafe { self.int_fl0.write(flags.bits()) }
                }

                fn clear_all_flags(&mut self) {
                    // Both flag registers clear on write-back of their
                    // current contents.
                    unsafe {
                        self.int_fl0.write(self.int_fl0.read());
                        self.int_fl1.write(self.int_fl1.read());
                    }
                }

                fn request_start(&mut self) {
                    unsafe { self.mstr_mode.modify(|m| m | MSTR_MODE_START) }
                }

                fn request_restart(&mut self) {
                    unsafe { self.mstr_mode.modify(|m| m | MSTR_MODE_RESTART) }
                }

                fn restart_pending(&self) -> bool {
                    self.mstr_mode.read() & MSTR_MODE_RESTART != 0
                }

                fn request_stop(&mut self) {
                    unsafe { self.mstr_mode.modify(|m| m | MSTR_MODE_STOP) }
                }

                fn flush_tx_fifo(&mut self) {
                    unsafe { self.tx_ctrl0.modify(|t| t | TX_CTRL0_FLUSH) }
                }

                fn tx_flush_pending(&self) -> bool {
                    self.tx_ctrl0.read() & TX_CTRL0_FLUSH != 0
                }

                fn flush_rx_fifo(&mut self) {
                    unsafe { self.rx_ctrl0.modify(|r| r | RX_CTRL0_FLUSH) }
                }

                fn rx_flush_pending(&self) -> bool {
                    self.rx_ctrl0.read() & RX_CTRL0_FLUSH != 0
                }

                fn set_rx_count(&mut self, count: u8) {
                    unsafe {
                        self.rx_ctrl1.write(u32::from(count) & RX_CTRL1_CNT_MASK)
                    }
                }

                fn enable_controller(&mut self) {
                    unsafe { self.ctrl.modify(|c| c | CTRL_EN | CTRL_MST) }
                }

                fn set_clock_divisors(&mut self, hi: u32, lo: u32) {
                    unsafe {
                        self.clk_hi.write(hi);
                        self.clk_lo.write(lo);
                    }
                }

                fn set_tx_threshold(&mut self, level: u8) {
                    unsafe {
                        self.tx_ctrl0.modify(|t| {
                            (t & !TX_CTRL0_THRESH_MASK)
                                | (u32::from(level) << TX_CTRL0_THRESH_POS)
                        })
                    }
                }

                fn set_rx_threshold(&mut self, level: u8) {
                    unsafe {
                        self.rx_ctrl0.modify(|r| {
                            (r & !RX_CTRL0_THRESH_MASK)
                                | (u32::from(level) << RX_CTRL0_THRESH_POS)
                        })
                    }
                }

                fn boost_bus_pads(&mut self) {
                    let pads = unsafe { &*Self::PAD_PTR };
                    unsafe {
                        pads.ds0.modify(|d| d | Self::PAD_BITS);
                        pads.ds1.modify(|d| d | Self::PAD_BITS);
                    }
                }
            }
        }
    };
}

i2c! { I2C0: 0x4001_D000, 0x4000_80B0, 7, 6 }
i2c! { I2C1: 0x4001_E000, 0x4000_80B0, 15, 14 }
i2c! { I2C2: 0x4001_F000, 0x4000_90B0, 15, 14 }
