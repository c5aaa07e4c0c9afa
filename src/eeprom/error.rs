use std::io;

#[derive(Debug, Fail)]
pub enum EepromError {
	#[fail(display = "invalid I2C address 0x{:02x} (must be 7-bit)", address)]
	InvalidAddress { address: u8 },

	#[fail(display = "invalid EEPROM capacity {} (must be 1..=256 with single-byte addressing)", capacity)]
	InvalidCapacity { capacity: usize },

	#[fail(display = "range 0x{:02x}+{} exceeds EEPROM capacity of {} bytes", offset, len, capacity)]
	OutOfRange { offset: u8, len: usize, capacity: usize },

	#[fail(display = "reading {} bytes at 0x{:02x} failed: {}", len, offset, cause)]
	Read { offset: u8, len: usize, #[cause] cause: io::Error },

	#[fail(display = "short read at 0x{:02x}: expected {} bytes, got {}", offset, expected, actual)]
	ShortRead { offset: u8, expected: usize, actual: usize },

	#[fail(display = "writing at 0x{:02x} failed after {} bytes: {}", offset, written, cause)]
	Write { offset: u8, written: usize, #[cause] cause: io::Error },

	#[fail(display = "verify failed at 0x{:02x}: expected {:02x}, EEPROM has {:02x}", offset, expected, found)]
	Mismatch { offset: usize, expected: u8, found: u8 },
}

impl EepromError {
	/// Whether the error came from the bus (as opposed to bad parameters or
	/// a verify mismatch).
	pub fn is_io(&self) -> bool {
		match self {
			EepromError::Read { .. } | EepromError::ShortRead { .. } | EepromError::Write { .. } => true,
			_ => false,
		}
	}
}
