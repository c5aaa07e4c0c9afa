//! Operator workflows on top of [`Eeprom`]: dump, decode and clone.

use crate::eeprom::Eeprom;
use crate::header::{
	HeaderRecord,
	decode,
};
use crate::i2c::I2cChannel;

/// Lowercase hex without separators, as used for exported images.
pub fn to_hex(data: &[u8]) -> String {
	let mut s = String::with_capacity(data.len() * 2);
	for b in data {
		s.push_str(&format!("{:02x}", b));
	}
	s
}

/// Classic 16 bytes per line hex dump with offsets.
pub fn hex_dump(data: &[u8]) -> String {
	let mut s = String::new();
	for (i, chunk) in data.chunks(16).enumerate() {
		s.push_str(&format!("{:04x}:", i * 16));
		for (j, b) in chunk.iter().enumerate() {
			if j == 8 {
				s.push(' ');
			}
			s.push_str(&format!(" {:02x}", b));
		}
		s.push('\n');
	}
	s
}

pub fn read_image<C: I2cChannel>(eeprom: &mut Eeprom<C>) -> crate::AResult<Vec<u8>> {
	let len = eeprom.capacity();
	let address = eeprom.address();
	let image = with_context!(("reading {} bytes from EEPROM 0x{:02x}", len, address), {
		Ok(eeprom.read_all()?)
	})?;
	info!("Read {} bytes from EEPROM 0x{:02x}", image.len(), address);
	Ok(image)
}

pub fn read_header<C: I2cChannel>(eeprom: &mut Eeprom<C>) -> crate::AResult<HeaderRecord> {
	let image = read_image(eeprom)?;
	let record = decode(&image);
	if !record.is_complete() {
		warn!("EEPROM image too short ({} bytes), skipped fields: {:?}", image.len(), record.skipped);
	}
	Ok(record)
}

/// Write `image` from offset 0 and optionally read it back.
pub fn write_image<C: I2cChannel>(eeprom: &mut Eeprom<C>, image: &[u8], verify: bool) -> crate::AResult<()> {
	info!(
		"Writing {} bytes to EEPROM 0x{:02x} (~{} ms)",
		image.len(),
		eeprom.address(),
		image.len() as u128 * eeprom.write_cycle().as_millis(),
	);
	eeprom.write(0, image)?;
	if verify {
		eeprom.verify(0, image)?;
		info!("Verified {} bytes", image.len());
	}
	Ok(())
}

/// Clone one EEPROM onto another on the same bus position.
///
/// Reads the full source image, calls `swap` (where the operator replaces
/// the source chip or board with the target; it gets the bus and the cached
/// image) and writes the cached image. Returns the image that was written.
pub fn clone_image<C, F>(eeprom: &mut Eeprom<C>, verify: bool, swap: F) -> crate::AResult<Vec<u8>>
where
	C: I2cChannel,
	F: FnOnce(&mut C, &[u8]) -> crate::AResult<()>,
{
	let image = read_image(eeprom)?;
	ensure!(!image.is_empty(), "source EEPROM returned no data");

	swap(eeprom.channel_mut(), &image)?;

	with_context!("writing target EEPROM", {
		write_image(eeprom, &image, verify)
	})?;
	Ok(image)
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::eeprom::{
		EepromError,
		IMAGE_LEN,
	};
	use crate::i2c::{
		MemoryEeprom,
		Transaction,
	};

	fn source_pattern() -> Vec<u8> {
		(0..IMAGE_LEN).map(|i| (i as u8) ^ 0x5a).collect()
	}

	#[test]
	fn hex_formatting() {
		assert_eq!(to_hex(&[0x00, 0xab, 0x10]), "00ab10");
		let dump = hex_dump(&(0u8..18).collect::<Vec<_>>());
		assert_eq!(dump, "0000: 00 01 02 03 04 05 06 07  08 09 0a 0b 0c 0d 0e 0f\n0010: 10 11\n");
	}

	#[test]
	fn clone_between_two_devices() {
		let mut source = Eeprom::with_defaults(MemoryEeprom::new(0x50, source_pattern()), 0x50).unwrap();
		let mut target = Eeprom::with_defaults(MemoryEeprom::blank(0x50, IMAGE_LEN), 0x50).unwrap();

		let image = source.read(0, IMAGE_LEN).unwrap();
		target.write(0, &image).unwrap();

		assert_eq!(target.channel().memory().unwrap(), &source_pattern()[..]);
		let writes = target.channel().transactions().iter()
			.filter(|t| match t { Transaction::Write { .. } => true, _ => false })
			.count();
		assert_eq!(writes, IMAGE_LEN);
	}

	#[test]
	fn clone_with_chip_swap() {
		let mut ee = Eeprom::with_defaults(MemoryEeprom::new(0x50, source_pattern()), 0x50).unwrap();
		let image = clone_image(&mut ee, true, |bus, cached| {
			assert_eq!(cached, &source_pattern()[..]);
			// operator pulls the source board and plugs in a blank one
			let old = bus.swap_chip(Some(vec![0xff; IMAGE_LEN]));
			assert_eq!(old.unwrap(), source_pattern());
			Ok(())
		}).unwrap();

		assert_eq!(image, source_pattern());
		assert_eq!(ee.channel().memory().unwrap(), &source_pattern()[..]);
	}

	#[test]
	fn clone_fails_on_unreadable_source() {
		let mut ee = Eeprom::with_defaults(MemoryEeprom::absent(0x50), 0x50).unwrap();
		let e = clone_image(&mut ee, false, |_, _| panic!("must not swap when reading failed")).unwrap_err();
		let read_failed = e.iter_chain().any(|cause| match cause.downcast_ref::<EepromError>() {
			Some(EepromError::Read { .. }) => true,
			_ => false,
		});
		assert!(read_failed, "unexpected error: {}", e);
		assert!(ee.channel().transactions().is_empty());
	}

	#[test]
	fn clone_reports_missing_target() {
		let mut ee = Eeprom::with_defaults(MemoryEeprom::new(0x50, source_pattern()), 0x50).unwrap();
		let e = clone_image(&mut ee, false, |bus, _| {
			// source removed, nothing plugged in
			bus.swap_chip(None);
			Ok(())
		}).unwrap_err();
		let write_failed = e.iter_chain().any(|cause| match cause.downcast_ref::<EepromError>() {
			Some(EepromError::Write { offset: 0, written: 0, .. }) => true,
			_ => false,
		});
		assert!(write_failed, "unexpected error: {}", e);
		assert!(ee.channel().memory().is_none());
	}

	#[test]
	fn aborted_swap_writes_nothing() {
		let mut ee = Eeprom::with_defaults(MemoryEeprom::new(0x50, source_pattern()), 0x50).unwrap();
		let r = clone_image(&mut ee, false, |_, _| bail!("operator cancelled"));
		assert!(r.is_err());
		let writes = ee.channel().transactions().iter()
			.filter(|t| match t { Transaction::Write { bytes, .. } => bytes.len() == 2, _ => false })
			.count();
		assert_eq!(writes, 0);
	}

	#[test]
	fn header_from_device() {
		let mut image = source_pattern();
		image[25] = 0x12;
		image[26] = 0x34;
		let mut ee = Eeprom::with_defaults(MemoryEeprom::new(0x50, image), 0x50).unwrap();
		let record = read_header(&mut ee).unwrap();
		assert!(record.is_complete());
		assert_eq!(record.bom_version, Some(0x1234));
	}
}
