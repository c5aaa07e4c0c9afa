//! Byte-addressed access to a 24Cxx-style I2C EEPROM (up to 256 bytes,
//! single address byte).
//!
//! Reads set the address pointer with a one-byte write and then read
//! sequentially. Writes go out one byte per transaction, each followed by a
//! full write cycle; the chip ignores (or corrupts) writes issued while it
//! is still committing the previous one.

use std::path::PathBuf;
use std::time::Duration;

use crate::i2c::{
	I2cChannel,
	LinuxI2c,
};

mod error;

pub use self::error::EepromError;

pub const DEFAULT_BUS: &str = "/dev/i2c-1";
pub const DEFAULT_ADDRESS: u8 = 0x50;
/// Length of a full hashboard EEPROM image.
pub const IMAGE_LEN: usize = 256;
pub const MAX_CAPACITY: usize = 256;
pub const WRITE_CYCLE: Duration = Duration::from_millis(10);

/// Parameters for opening an EEPROM on a linux I2C bus.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EepromConfig {
	pub bus: PathBuf,
	pub address: u8,
	pub capacity: usize,
	pub write_cycle: Duration,
}

impl Default for EepromConfig {
	fn default() -> Self {
		EepromConfig {
			bus: PathBuf::from(DEFAULT_BUS),
			address: DEFAULT_ADDRESS,
			capacity: IMAGE_LEN,
			write_cycle: WRITE_CYCLE,
		}
	}
}

impl EepromConfig {
	pub fn open(&self) -> crate::AResult<Eeprom<LinuxI2c>> {
		let channel = with_context!(("couldn't open I2C bus {}", self.bus.display()), {
			Ok(LinuxI2c::open(&self.bus)?)
		})?;
		info!("Opened I2C bus {}", self.bus.display());
		Ok(Eeprom::new(channel, self.address, self.capacity, self.write_cycle)?)
	}
}

pub struct Eeprom<C: I2cChannel> {
	channel: C,
	address: u8,
	capacity: usize,
	write_cycle: Duration,
}

impl<C: I2cChannel> Eeprom<C> {
	pub fn new(channel: C, address: u8, capacity: usize, write_cycle: Duration) -> Result<Self, EepromError> {
		if address > 0x7f {
			return Err(EepromError::InvalidAddress { address });
		}
		if capacity == 0 || capacity > MAX_CAPACITY {
			return Err(EepromError::InvalidCapacity { capacity });
		}
		Ok(Eeprom {
			channel,
			address,
			capacity,
			write_cycle,
		})
	}

	/// 256 byte EEPROM with the default write cycle.
	pub fn with_defaults(channel: C, address: u8) -> Result<Self, EepromError> {
		Self::new(channel, address, IMAGE_LEN, WRITE_CYCLE)
	}

	pub fn address(&self) -> u8 {
		self.address
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub fn write_cycle(&self) -> Duration {
		self.write_cycle
	}

	pub fn channel(&self) -> &C {
		&self.channel
	}

	pub fn channel_mut(&mut self) -> &mut C {
		&mut self.channel
	}

	pub fn into_channel(self) -> C {
		self.channel
	}

	fn check_range(&self, offset: u8, len: usize) -> Result<(), EepromError> {
		if offset as usize + len > self.capacity {
			return Err(EepromError::OutOfRange {
				offset,
				len,
				capacity: self.capacity,
			});
		}
		Ok(())
	}

	/// Read `len` bytes starting at `offset`.
	///
	/// Either all requested bytes are returned or an error; never a prefix.
	pub fn read(&mut self, offset: u8, len: usize) -> Result<Vec<u8>, EepromError> {
		self.check_range(offset, len)?;
		if len == 0 {
			return Ok(Vec::new());
		}

		debug!("EEPROM 0x{:02x}: read {} bytes at 0x{:02x}", self.address, len, offset);
		let address = self.address;
		let data = self.channel.write_to(address, &[offset])
			.and_then(|()| self.channel.read_from(address, len))
			.map_err(|cause| EepromError::Read { offset, len, cause })?;

		if data.len() != len {
			return Err(EepromError::ShortRead {
				offset,
				expected: len,
				actual: data.len(),
			});
		}
		Ok(data)
	}

	/// Write `data` starting at `offset`, one byte per transaction.
	///
	/// Not atomic: on failure the bytes before the failing one are already
	/// committed (see `EepromError::Write::written`).
	pub fn write(&mut self, offset: u8, data: &[u8]) -> Result<(), EepromError> {
		self.check_range(offset, data.len())?;

		debug!("EEPROM 0x{:02x}: write {} bytes at 0x{:02x}", self.address, data.len(), offset);
		for (i, &byte) in data.iter().enumerate() {
			// fits: check_range limits offset + len to 256
			let location = (offset as usize + i) as u8;
			if let Err(cause) = self.channel.write_to(self.address, &[location, byte]) {
				return Err(EepromError::Write {
					offset,
					written: i,
					cause,
				});
			}
			self.channel.delay(self.write_cycle);
		}
		Ok(())
	}

	/// Read back `expected.len()` bytes at `offset` and compare.
	pub fn verify(&mut self, offset: u8, expected: &[u8]) -> Result<(), EepromError> {
		let found = self.read(offset, expected.len())?;
		for (i, (&e, &f)) in expected.iter().zip(found.iter()).enumerate() {
			if e != f {
				return Err(EepromError::Mismatch {
					offset: offset as usize + i,
					expected: e,
					found: f,
				});
			}
		}
		Ok(())
	}

	/// Read the full EEPROM.
	pub fn read_all(&mut self) -> Result<Vec<u8>, EepromError> {
		let capacity = self.capacity;
		self.read(0, capacity)
	}
}
