//! Prelude

pub use crate::i2c::I2cExt as _max32666_hal_i2c_I2cExt;

pub use fugit::{ExtU32 as _, RateExtU32 as _};
