//! Inter Integrated Circuit (I2C)
//!
//! Polled controller-mode driver for the MAX32665/MAX32666 I2C blocks. A
//! transaction is staged as a whole through the hardware FIFO and the driver
//! busy-waits on the peripheral status flags, so every call completes (or
//! fails) before returning and the bus is never left mid-transaction.
//!
//! # Usage
//!
//! ```no_run
//! use max32666_hal::i2c::{Config, I2C0};
//! use max32666_hal::prelude::*;
//!
//! let i2c0 = I2C0::take().unwrap();
//! let mut i2c = i2c0.i2c(100.kHz(), Config::new(50.MHz())).unwrap();
//!
//! // Device addresses are framed: 7-bit address in bits 7:1, R/W bit clear.
//! i2c.register_write(0x50, 0x10, 0xAB).unwrap();
//! i2c.register_write_buf(0x50, 0x20, &[0x01, 0x02, 0x03]).unwrap();
//! let id = i2c.register_read(0x50, 0x0F).unwrap();
//! ```
//!
//! Transfers are bounded by the hardware FIFO: a buffered write carries at
//! most [`FIFO_DEPTH`]` - 2` payload bytes, since two FIFO slots are taken
//! by the address and register bytes. Callers needing longer transfers must
//! segment them.
//!
//! Every status wait is bounded by the configured poll budget, so a stuck
//! bus or absent device surfaces as [`Error::PollTimeout`] instead of
//! hanging the caller.
//!
//! The driver is strictly blocking and keeps no state besides the
//! peripheral token it owns; it must not be shared between execution
//! contexts (no internal locking).

use crate::time::Hertz;

pub mod config;
pub use config::Config;

mod hal;
mod i2c_def;

pub use i2c_def::{RegisterBlock, I2C0, I2C1, I2C2};

/// Depth of the hardware TX and RX FIFOs in bytes.
pub const FIFO_DEPTH: usize = 8;

/// Read-direction bit of a framed address byte.
const READ_BIT: u8 = 0x01;

/// Widest value the 9-bit SCL phase fields can hold.
const DIVISOR_MAX: u32 = 0x1FF;

/// Fastest SCL the block supports outside high-speed mode.
const MAX_SCL_FREQUENCY: u32 = 1_000_000;

bitflags::bitflags! {
    /// Contents of the first interrupt-flag register (`INT_FL0`).
    ///
    /// All bits are latched by hardware and cleared by writing them back.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct IntFlags: u32 {
        /// Transfer complete
        const DONE = 1 << 0;
        /// Interactive receive mode request
        const IRXM = 1 << 1;
        /// General-call address match (target operation)
        const GC_ADDR_MATCH = 1 << 2;
        /// Own-address match (target operation)
        const ADDR_MATCH = 1 << 3;
        /// RX FIFO level reached the configured threshold
        const RX_THRESHOLD = 1 << 4;
        /// TX FIFO level fell to the configured threshold
        const TX_THRESHOLD = 1 << 5;
        /// STOP condition seen on the bus
        const STOP = 1 << 6;
        /// Address byte was ACK'd
        const ADDR_ACK = 1 << 7;
        /// Lost bus arbitration to another controller
        const ARBITRATION_LOST = 1 << 8;
        /// Bus timeout
        const TIMEOUT = 1 << 9;
        /// Address byte was NACK'd
        const ADDR_NACK = 1 << 10;
        /// Data byte was NACK'd
        const DATA_NACK = 1 << 11;
        /// Addressed device did not respond
        const DO_NOT_RESPOND = 1 << 12;
        /// START condition error
        const START_ERROR = 1 << 13;
        /// STOP condition error
        const STOP_ERROR = 1 << 14;
        /// TX FIFO locked out after an error
        const TX_LOCKOUT = 1 << 15;

        /// Every flag that signals a bus fault.
        const FAULT = Self::ARBITRATION_LOST.bits()
            | Self::TIMEOUT.bits()
            | Self::ADDR_NACK.bits()
            | Self::DATA_NACK.bits()
            | Self::DO_NOT_RESPOND.bits()
            | Self::START_ERROR.bits()
            | Self::STOP_ERROR.bits();
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IntFlags {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "IntFlags({=u32:x})", self.bits());
    }
}

/// I2C error
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// One or more bus fault flags were raised during the transaction.
    ///
    /// Carries exactly the fault bits that were latched when the STOP
    /// condition was evaluated. The transaction has already ended on the
    /// wire by then; the error is diagnostic, not preventive.
    Communication(IntFlags),
    /// Write payload larger than a single FIFO transaction can carry.
    BufferTooLong,
    /// A status flag did not assert within the configured poll budget.
    PollTimeout,
    /// The requested SCL frequency cannot be derived from the peripheral
    /// clock.
    InvalidFrequency,
    /// The transaction shape is not supported by this engine
    /// (`embedded-hal` interface only).
    UnsupportedTransaction,
}

/// Register-level capability of one I2C controller instance.
///
/// The driver performs every hardware access through these named
/// operations, which cover exactly the register fields the transaction
/// engine relies on. Implemented for the real peripherals ([`I2C0`],
/// [`I2C1`], [`I2C2`]) and sealed against downstream implementations.
pub trait Instance: crate::Sealed {
    /// Pop one byte from the receive FIFO.
    fn read_fifo(&mut self) -> u8;
    /// Push one byte into the transmit FIFO.
    fn write_fifo(&mut self, data: u8);
    /// Read the first interrupt-flag register.
    fn flags(&self) -> IntFlags;
    /// Clear the given latched flags.
    fn clear_flags(&mut self, flags: IntFlags);
    /// Clear every latched flag in both interrupt-flag registers.
    fn clear_all_flags(&mut self);
    /// Request a START condition.
    fn request_start(&mut self);
    /// Request a repeated-START condition.
    fn request_restart(&mut self);
    /// Whether a requested repeated-START has not yet hit the wire. The
    /// request bit self-clears once the condition is sent.
    fn restart_pending(&self) -> bool;
    /// Request a STOP condition once the FIFO drains.
    fn request_stop(&mut self);
    /// Request a transmit-FIFO flush.
    fn flush_tx_fifo(&mut self);
    /// Whether a requested transmit-FIFO flush is still in progress.
    fn tx_flush_pending(&self) -> bool;
    /// Request a receive-FIFO flush.
    fn flush_rx_fifo(&mut self);
    /// Whether a requested receive-FIFO flush is still in progress.
    fn rx_flush_pending(&self) -> bool;
    /// Number of bytes the receiver will accept before NACKing.
    fn set_rx_count(&mut self, count: u8);

    /// Enable the block in controller mode.
    fn enable_controller(&mut self);
    /// Program the SCL high/low phase divisors.
    fn set_clock_divisors(&mut self, hi: u32, lo: u32);
    /// TX FIFO level at or below which [`IntFlags::TX_THRESHOLD`] asserts.
    fn set_tx_threshold(&mut self, level: u8);
    /// RX FIFO level at or above which [`IntFlags::RX_THRESHOLD`] asserts.
    fn set_rx_threshold(&mut self, level: u8);
    /// Raise the pad drive strength of the instance's SCL/SDA lines.
    fn boost_bus_pads(&mut self);
}

/// I2C controller driver.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2c<I2C> {
    i2c: I2C,
    poll_budget: u32,
}

/// Extension trait to construct the driver directly from a peripheral
/// token.
pub trait I2cExt: Instance + Sized {
    /// Initialize this instance for controller operation at `frequency`.
    fn i2c(self, frequency: Hertz, config: Config) -> Result<I2c<Self>, Error>;
}

impl<I2C: Instance> I2cExt for I2C {
    fn i2c(self, frequency: Hertz, config: Config) -> Result<I2c<Self>, Error> {
        I2c::new(self, frequency, config)
    }
}

/// Derive the SCL high/low phase divisors for `target_freq` from the APB
/// clock feeding the block.
///
/// Each phase lasts `divisor + 1` peripheral-clock ticks. The SCL period is
/// split evenly between the phases, with the low phase absorbing the odd
/// tick; rounding shortens the period, so the achieved frequency sits at or
/// slightly above the request.
fn calc_clock_divisors(
    ker_ck: u32,
    target_freq: u32,
) -> Result<(u32, u32), Error> {
    if target_freq == 0 || target_freq > MAX_SCL_FREQUENCY {
        return Err(Error::InvalidFrequency);
    }

    let ticks = ker_ck / target_freq;
    let hi = (ticks / 2).saturating_sub(1);
    let lo = (ticks - ticks / 2).saturating_sub(1);

    // Both phase fields are 9 bits wide. A zero high phase means the
    // clock ratio is too small for the block to honor at all.
    if hi == 0 || lo > DIVISOR_MAX {
        return Err(Error::InvalidFrequency);
    }

    Ok((hi, lo))
}

impl<I2C: Instance> I2c<I2C> {
    /// Create and initialize a new I2C controller.
    ///
    /// Derives the SCL divisors for `frequency` from the peripheral clock
    /// in `config`, enables controller mode, arms single-byte FIFO
    /// thresholds and raises the bus pad drive strength. Nothing is written
    /// to the peripheral if the divisor derivation fails.
    pub fn new(
        i2c: I2C,
        frequency: Hertz,
        config: Config,
    ) -> Result<Self, Error> {
        let ker_ck = config.peripheral_clock.raw();
        let (hi, lo) =
            calc_clock_divisors(ker_ck, frequency.raw()).inspect_err(|_err| {
                #[cfg(feature = "log")]
                log::error!(
                    "i2c init: cannot derive {} Hz SCL from {} Hz kernel clock",
                    frequency.raw(),
                    ker_ck,
                );
            })?;

        let mut i2c = i2c;
        i2c.enable_controller();
        i2c.set_clock_divisors(hi, lo);
        i2c.set_tx_threshold(1);
        i2c.set_rx_threshold(1);
        i2c.boost_bus_pads();

        Ok(I2c {
            i2c,
            poll_budget: config.poll_budget,
        })
    }

    /// Release the peripheral token.
    pub fn free(self) -> I2C {
        self.i2c
    }
}

impl<I2C: Instance> I2c<I2C> {
    /// Poll until `pending` reports false, within the poll budget.
    fn wait_while(
        &mut self,
        mut pending: impl FnMut(&I2C) -> bool,
    ) -> Result<(), Error> {
        for _ in 0..self.poll_budget {
            if !pending(&self.i2c) {
                return Ok(());
            }
        }
        Err(Error::PollTimeout)
    }

    /// Block until the STOP condition is seen, then clear its flag.
    fn wait_for_stop(&mut self) -> Result<(), Error> {
        self.wait_while(|i2c| !i2c.flags().contains(IntFlags::STOP))?;
        self.i2c.clear_flags(IntFlags::STOP);
        Ok(())
    }

    /// Evaluate the fault bits accumulated over the transaction that just
    /// ended.
    #[inline(always)]
    fn check_faults(&self) -> Result<(), Error> {
        let faults = self.i2c.flags().intersection(IntFlags::FAULT);
        if faults.is_empty() {
            Ok(())
        } else {
            Err(Error::Communication(faults))
        }
    }

    /// Drop stale state from any previous transaction: clear both
    /// interrupt-flag registers and drain both FIFOs.
    ///
    /// Runs first in every transaction so the fault evaluation at STOP time
    /// reflects only the transaction that just ran.
    fn flush(&mut self) -> Result<(), Error> {
        self.i2c.clear_all_flags();
        self.i2c.flush_tx_fifo();
        self.wait_while(|i2c| i2c.tx_flush_pending())?;
        self.i2c.flush_rx_fifo();
        self.wait_while(|i2c| i2c.rx_flush_pending())?;
        Ok(())
    }

    /// Write one byte to one device register.
    ///
    /// `addr` is the framed address byte: 7-bit device address in bits 7:1
    /// with the R/W bit clear.
    pub fn register_write(
        &mut self,
        addr: u8,
        reg: u8,
        value: u8,
    ) -> Result<(), Error> {
        self.flush()?;

        self.i2c.write_fifo(addr);
        self.i2c.request_start();
        self.i2c.write_fifo(reg);
        self.i2c.write_fifo(value);
        self.i2c.request_stop();

        self.wait_for_stop()?;
        self.check_faults()
    }

    /// Write `bytes` to the device starting at register `reg`.
    ///
    /// The whole transaction is staged in the FIFO, so the payload is
    /// limited to [`FIFO_DEPTH`]` - 2` bytes; longer payloads are rejected
    /// with [`Error::BufferTooLong`] before the bus is touched.
    pub fn register_write_buf(
        &mut self,
        addr: u8,
        reg: u8,
        bytes: &[u8],
    ) -> Result<(), Error> {
        if bytes.len() > FIFO_DEPTH - 2 {
            return Err(Error::BufferTooLong);
        }

        self.flush()?;

        self.i2c.write_fifo(addr);
        self.i2c.request_start();
        self.i2c.write_fifo(reg);
        for &byte in bytes {
            self.i2c.write_fifo(byte);
        }
        self.i2c.request_stop();

        self.wait_for_stop()?;
        self.check_faults()
    }

    /// Read one byte from one device register.
    ///
    /// Addresses the device in write direction, sends the register index,
    /// then issues a repeated START and re-addresses in read direction, so
    /// no other controller can claim the bus between the two phases. The
    /// byte is returned only when the transaction ended without faults.
    pub fn register_read(&mut self, addr: u8, reg: u8) -> Result<u8, Error> {
        self.flush()?;

        self.i2c.write_fifo(addr);
        self.i2c.request_start();
        self.i2c.write_fifo(reg);

        self.i2c.set_rx_count(1);
        self.i2c.request_restart();
        self.wait_while(|i2c| i2c.restart_pending())?;
        self.i2c.write_fifo(addr | READ_BIT);

        self.wait_while(|i2c| !i2c.flags().contains(IntFlags::RX_THRESHOLD))?;
        let value = self.i2c.read_fifo();
        self.i2c.clear_flags(IntFlags::RX_THRESHOLD);

        self.i2c.request_stop();
        self.wait_for_stop()?;
        self.check_faults()?;

        Ok(value)
    }
}
