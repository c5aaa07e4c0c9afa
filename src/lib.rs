#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

macro_rules! with_context {
	(( $fmt:tt $($t:tt)* ), $e:expr) => {{
		use failure::Error;

		match (|| { $e })() {
			Ok(v) => Ok(v),
			Err(e) => {
				let e: Error = e;
				let msg = format!(concat!($fmt, ": {}") $($t)*, e);
				Err(Error::from(e.context(msg)))
			}
		}
	}};

	($msg:expr, $e:expr) => {
		with_context!(("{}", $msg), $e)
	};
}

pub type AResult<T> = Result<T, failure::Error>;

pub mod crc5;
pub mod eeprom;
pub mod header;
pub mod i2c;
pub mod workflow;

pub use self::crc5::crc5;
pub use self::eeprom::{
	Eeprom,
	EepromConfig,
	EepromError,
};
pub use self::header::{
	HeaderRecord,
	decode,
};
pub use self::i2c::I2cChannel;
