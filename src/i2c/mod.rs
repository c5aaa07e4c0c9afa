//! Single-transaction access to devices on an addressed I2C bus.

use std::io;
use std::thread;
use std::time::{
	Duration,
	Instant,
};

mod linux;
pub mod memory;

pub use self::linux::LinuxI2c;
pub use self::memory::{
	MemoryEeprom,
	Transaction,
};

/// Sleep for at least `duration`, even if woken up early.
pub fn reliable_sleep(mut duration: Duration) {
	loop {
		let now = Instant::now();
		thread::sleep(duration);
		let elapsed = now.elapsed();
		if elapsed >= duration {
			return;
		}
		duration -= elapsed;
	}
}

/// A blocking I2C controller.
///
/// Each call is one complete bus transaction (START, address, data, STOP).
/// Failures (NACK, timeout, arbitration loss) are reported as `io::Error`;
/// a failed `read_from` must not return partial data.
pub trait I2cChannel {
	fn write_to(&mut self, address: u8, bytes: &[u8]) -> io::Result<()>;
	fn read_from(&mut self, address: u8, len: usize) -> io::Result<Vec<u8>>;

	// block for (at least) `duration`, e.g. an EEPROM write cycle
	fn delay(&mut self, duration: Duration) {
		reliable_sleep(duration);
	}
}

impl<'a, C: ?Sized + I2cChannel> I2cChannel for &'a mut C {
	fn write_to(&mut self, address: u8, bytes: &[u8]) -> io::Result<()> {
		C::write_to(*self, address, bytes)
	}
	fn read_from(&mut self, address: u8, len: usize) -> io::Result<Vec<u8>> {
		C::read_from(*self, address, len)
	}
	fn delay(&mut self, duration: Duration) {
		C::delay(*self, duration)
	}
}

#[cfg(test)]
mod test {
	use super::reliable_sleep;
	use std::time::{
		Duration,
		Instant,
	};

	#[test]
	fn sleeps_at_least_duration() {
		let d = Duration::from_millis(5);
		let start = Instant::now();
		reliable_sleep(d);
		assert!(start.elapsed() >= d);
	}
}
