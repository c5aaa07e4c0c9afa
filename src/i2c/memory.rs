//! In-memory 24Cxx-style EEPROM on a simulated bus.
//!
//! Behaves like a single-byte-addressed serial EEPROM: a write sets the
//! internal address pointer from its first byte and stores the remaining
//! bytes; a read returns bytes from the pointer onwards. The pointer wraps
//! at the end of the memory.
//!
//! Every completed transaction and every delay is recorded, so tests can
//! check the exact bus traffic. Delays are recorded instead of slept.

use std::io;
use std::time::Duration;

use super::I2cChannel;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Transaction {
	Write { address: u8, bytes: Vec<u8> },
	Read { address: u8, len: usize },
	Delay(Duration),
}

#[derive(Clone, Debug)]
pub struct MemoryEeprom {
	address: u8,
	// `None`: no chip connected, every transaction is NACKed
	memory: Option<Vec<u8>>,
	pointer: usize,
	attempts: usize,
	fail_from: Option<usize>,
	log: Vec<Transaction>,
}

fn nack(what: &str) -> io::Error {
	io::Error::new(io::ErrorKind::Other, format!("I2C NACK: {}", what))
}

impl MemoryEeprom {
	pub fn new(address: u8, memory: Vec<u8>) -> Self {
		MemoryEeprom {
			address,
			memory: Some(memory),
			pointer: 0,
			attempts: 0,
			fail_from: None,
			log: Vec::new(),
		}
	}

	/// A blank (all `0xff`) chip of `size` bytes.
	pub fn blank(address: u8, size: usize) -> Self {
		Self::new(address, vec![0xff; size])
	}

	/// A bus without any device answering.
	pub fn absent(address: u8) -> Self {
		MemoryEeprom {
			memory: None,
			..Self::new(address, Vec::new())
		}
	}

	/// Fail every bus transaction starting with the `n`-th one (counted
	/// from zero over the lifetime of this device).
	pub fn fail_from(&mut self, n: usize) -> &mut Self {
		self.fail_from = Some(n);
		self
	}

	/// Replace the connected chip, returning the old memory.
	pub fn swap_chip(&mut self, memory: Option<Vec<u8>>) -> Option<Vec<u8>> {
		self.pointer = 0;
		std::mem::replace(&mut self.memory, memory)
	}

	pub fn memory(&self) -> Option<&[u8]> {
		self.memory.as_ref().map(|m| &m[..])
	}

	pub fn transactions(&self) -> &[Transaction] {
		&self.log
	}

	/// Bus transactions tried so far, including failed ones.
	pub fn attempts(&self) -> usize {
		self.attempts
	}

	pub fn clear_transactions(&mut self) {
		self.log.clear();
	}

	fn begin(&mut self, address: u8) -> io::Result<&mut Vec<u8>> {
		let attempt = self.attempts;
		self.attempts += 1;
		if let Some(n) = self.fail_from {
			if attempt >= n {
				return Err(io::Error::new(io::ErrorKind::TimedOut, "I2C bus timeout (injected)"));
			}
		}
		if address != self.address {
			return Err(nack("address not acknowledged"));
		}
		match self.memory.as_mut() {
			Some(m) if !m.is_empty() => Ok(m),
			_ => Err(nack("address not acknowledged")),
		}
	}
}

impl I2cChannel for MemoryEeprom {
	fn write_to(&mut self, address: u8, bytes: &[u8]) -> io::Result<()> {
		let memory = self.begin(address)?;
		let size = memory.len();
		let (&word_address, data) = match bytes.split_first() {
			Some(split) => split,
			None => return Err(nack("empty write")),
		};
		let mut pointer = word_address as usize % size;
		for &b in data {
			memory[pointer] = b;
			pointer = (pointer + 1) % size;
		}
		self.pointer = pointer;
		self.log.push(Transaction::Write { address, bytes: bytes.to_vec() });
		Ok(())
	}

	fn read_from(&mut self, address: u8, len: usize) -> io::Result<Vec<u8>> {
		let mut pointer = self.pointer;
		let memory = self.begin(address)?;
		let size = memory.len();
		let mut result = Vec::with_capacity(len);
		for _ in 0..len {
			result.push(memory[pointer]);
			pointer = (pointer + 1) % size;
		}
		self.pointer = pointer;
		self.log.push(Transaction::Read { address, len });
		Ok(result)
	}

	fn delay(&mut self, duration: Duration) {
		self.log.push(Transaction::Delay(duration));
	}
}
