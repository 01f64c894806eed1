use embedded_hal::i2c;

use super::*;

impl i2c::Error for Error {
    fn kind(&self) -> i2c::ErrorKind {
        match self {
            Error::Communication(faults) => {
                if faults.contains(IntFlags::ADDR_NACK) {
                    i2c::ErrorKind::NoAcknowledge(
                        i2c::NoAcknowledgeSource::Address,
                    )
                } else if faults.contains(IntFlags::DATA_NACK) {
                    i2c::ErrorKind::NoAcknowledge(
                        i2c::NoAcknowledgeSource::Data,
                    )
                } else if faults.contains(IntFlags::ARBITRATION_LOST) {
                    i2c::ErrorKind::ArbitrationLoss
                } else if faults
                    .intersects(IntFlags::START_ERROR | IntFlags::STOP_ERROR)
                {
                    i2c::ErrorKind::Bus
                } else {
                    i2c::ErrorKind::Other
                }
            }
            _ => i2c::ErrorKind::Other,
        }
    }
}

impl<I2C> i2c::ErrorType for I2c<I2C> {
    type Error = Error;
}

/// The engine stages one transaction per FIFO fill, so only two operation
/// shapes exist on the bus: a write of a register index plus payload, and
/// a one-byte register read through a repeated START. This implementation
/// exposes exactly those; any other shape returns
/// [`Error::UnsupportedTransaction`].
///
/// Addresses here are unshifted 7-bit addresses, per the `embedded-hal`
/// convention; the driver frames them itself.
impl<I2C: Instance> i2c::I2c<i2c::SevenBitAddress> for I2c<I2C> {
    fn transaction(
        &mut self,
        address: i2c::SevenBitAddress,
        operations: &mut [i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        let framed = address << 1;
        match operations {
            [i2c::Operation::Write(bytes)] if !bytes.is_empty() => {
                self.register_write_buf(framed, bytes[0], &bytes[1..])
            }
            [i2c::Operation::Write(index), i2c::Operation::Read(byte)]
                if index.len() == 1 && byte.len() == 1 =>
            {
                byte[0] = self.register_read(framed, index[0])?;
                Ok(())
            }
            _ => Err(Error::UnsupportedTransaction),
        }
    }
}
