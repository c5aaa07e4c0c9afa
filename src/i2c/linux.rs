use std::fs;
use std::io::{
	self,
	Read,
	Write,
};
use std::os::unix::io::AsRawFd;
use std::path::{
	Path,
	PathBuf,
};

use super::I2cChannel;

// from <linux/i2c-dev.h>: use this slave address for subsequent read/write
const I2C_SLAVE: u32 = 0x0703;

/// I2C bus exposed by the linux `i2c-dev` driver (`/dev/i2c-N`).
#[derive(Debug)]
pub struct LinuxI2c {
	file: fs::File,
	path: PathBuf,
	// last address passed to I2C_SLAVE
	address: Option<u8>,
}

impl LinuxI2c {
	/// Open the bus and take an exclusive lock on it.
	///
	/// Fails with `WouldBlock` if another process holds the bus; the lock
	/// is released when the file is closed.
	pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
		let path = path.as_ref().to_path_buf();
		let file = fs::OpenOptions::new()
			.read(true)
			.write(true)
			.open(&path)?;

		let res = unsafe {
			libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB)
		};
		if res < 0 {
			return Err(io::Error::last_os_error());
		}

		Ok(LinuxI2c {
			file,
			path,
			address: None,
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn select(&mut self, address: u8) -> io::Result<()> {
		if self.address == Some(address) {
			return Ok(());
		}
		let res = unsafe {
			libc::ioctl(self.file.as_raw_fd(), I2C_SLAVE as _, address as libc::c_ulong)
		};
		if res < 0 {
			self.address = None;
			return Err(io::Error::last_os_error());
		}
		self.address = Some(address);
		Ok(())
	}
}

impl I2cChannel for LinuxI2c {
	fn write_to(&mut self, address: u8, bytes: &[u8]) -> io::Result<()> {
		self.select(address)?;
		// i2c-dev turns each write() into a single bus transaction
		let l = self.file.write(bytes)?;
		if l != bytes.len() {
			Err(io::Error::new(io::ErrorKind::WriteZero, "I2C transaction wrote less than requested"))
		} else {
			Ok(())
		}
	}

	fn read_from(&mut self, address: u8, len: usize) -> io::Result<Vec<u8>> {
		self.select(address)?;
		let mut buf = vec![0u8; len];
		if len == 0 {
			return Ok(buf);
		}
		let l = self.file.read(&mut buf)?;
		if l != len {
			Err(io::Error::new(io::ErrorKind::UnexpectedEof, "I2C transaction read less than requested"))
		} else {
			Ok(buf)
		}
	}
}
