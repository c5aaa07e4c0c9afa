//! Decoder for the hashboard header stored in the first 128 EEPROM bytes.
//!
//! Best effort and for diagnostics: nothing is validated. Fields that don't
//! fit into the given image are skipped and listed in
//! [`HeaderRecord::skipped`]. The CRC5 values are only computed, not
//! compared against anything stored in the image.

use std::fmt;
use std::ops::Range;

use crate::crc5::crc5;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Field {
	SerialNumberRaw,
	SerialNumberAscii,
	ProductIdRaw,
	ProductIdAscii,
	BomVersion,
	PcbVersion,
	FixtureVersion,
	Crc5FixtureHeader,
	Crc5CgminerHeader,
	Crc5ClassInfo,
}

impl Field {
	/// All fields in layout order.
	pub const ALL: [Field; 10] = [
		Field::SerialNumberRaw,
		Field::SerialNumberAscii,
		Field::ProductIdRaw,
		Field::ProductIdAscii,
		Field::BomVersion,
		Field::PcbVersion,
		Field::FixtureVersion,
		Field::Crc5FixtureHeader,
		Field::Crc5CgminerHeader,
		Field::Crc5ClassInfo,
	];

	pub fn name(self) -> &'static str {
		match self {
			Field::SerialNumberRaw => "serial_number_raw",
			Field::SerialNumberAscii => "serial_number_ascii",
			Field::ProductIdRaw => "product_id_raw",
			Field::ProductIdAscii => "product_id_ascii",
			Field::BomVersion => "bom_version",
			Field::PcbVersion => "pcb_version",
			Field::FixtureVersion => "fixture_version",
			Field::Crc5FixtureHeader => "crc5_fixture_header",
			Field::Crc5CgminerHeader => "crc5_cgminer_header",
			Field::Crc5ClassInfo => "crc5_class_info",
		}
	}

	/// Bytes of the image the field is derived from.
	pub fn range(self) -> Range<usize> {
		match self {
			Field::SerialNumberRaw | Field::SerialNumberAscii => 4..21,
			Field::ProductIdRaw | Field::ProductIdAscii => 21..25,
			Field::BomVersion => 25..27,
			Field::PcbVersion => 27..29,
			Field::FixtureVersion => 29..31,
			Field::Crc5FixtureHeader => 0..4,
			Field::Crc5CgminerHeader => 4..64,
			Field::Crc5ClassInfo => 64..128,
		}
	}
}

impl fmt::Display for Field {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.name())
	}
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum FieldValue<'a> {
	Bytes(&'a [u8]),
	Text(&'a str),
	Version(u16),
	Crc5(u8),
}

impl<'a> fmt::Display for FieldValue<'a> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			FieldValue::Bytes(b) => write!(f, "{:?}", b),
			FieldValue::Text(s) => f.write_str(s),
			FieldValue::Version(v) => write!(f, "0x{:04X}", v),
			FieldValue::Crc5(c) => write!(f, "{}", c),
		}
	}
}

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct HeaderRecord {
	pub serial_number_raw: Option<Vec<u8>>,
	pub serial_number_ascii: Option<String>,
	pub product_id_raw: Option<Vec<u8>>,
	pub product_id_ascii: Option<String>,
	pub bom_version: Option<u16>,
	pub pcb_version: Option<u16>,
	pub fixture_version: Option<u16>,
	pub crc5_fixture_header: Option<u8>,
	pub crc5_cgminer_header: Option<u8>,
	pub crc5_class_info: Option<u8>,
	/// Fields not decoded because the image was too short.
	pub skipped: Vec<Field>,
}

impl HeaderRecord {
	/// No field was skipped.
	pub fn is_complete(&self) -> bool {
		self.skipped.is_empty()
	}

	pub fn get(&self, field: Field) -> Option<FieldValue<'_>> {
		match field {
			Field::SerialNumberRaw => self.serial_number_raw.as_ref().map(|v| FieldValue::Bytes(v)),
			Field::SerialNumberAscii => self.serial_number_ascii.as_ref().map(|s| FieldValue::Text(s)),
			Field::ProductIdRaw => self.product_id_raw.as_ref().map(|v| FieldValue::Bytes(v)),
			Field::ProductIdAscii => self.product_id_ascii.as_ref().map(|s| FieldValue::Text(s)),
			Field::BomVersion => self.bom_version.map(FieldValue::Version),
			Field::PcbVersion => self.pcb_version.map(FieldValue::Version),
			Field::FixtureVersion => self.fixture_version.map(FieldValue::Version),
			Field::Crc5FixtureHeader => self.crc5_fixture_header.map(FieldValue::Crc5),
			Field::Crc5CgminerHeader => self.crc5_cgminer_header.map(FieldValue::Crc5),
			Field::Crc5ClassInfo => self.crc5_class_info.map(FieldValue::Crc5),
		}
	}

	/// Decoded fields in layout order.
	pub fn entries(&self) -> impl Iterator<Item = (Field, FieldValue<'_>)> + '_ {
		Field::ALL.iter().filter_map(move |&field| self.get(field).map(|v| (field, v)))
	}
}

// printable ASCII is kept, everything else becomes '?'
fn lenient_ascii(data: &[u8]) -> String {
	data.iter()
		.map(|&b| if b >= 32 && b <= 126 { b as char } else { '?' })
		.collect()
}

fn be16(data: &[u8]) -> u16 {
	(data[0] as u16) << 8 | data[1] as u16
}

pub fn decode(image: &[u8]) -> HeaderRecord {
	let mut record = HeaderRecord::default();

	for &field in Field::ALL.iter() {
		let range = field.range();
		if range.end > image.len() {
			record.skipped.push(field);
			continue;
		}
		let data = &image[range];
		match field {
			Field::SerialNumberRaw => record.serial_number_raw = Some(data.to_vec()),
			Field::SerialNumberAscii => record.serial_number_ascii = Some(lenient_ascii(data)),
			Field::ProductIdRaw => record.product_id_raw = Some(data.to_vec()),
			Field::ProductIdAscii => record.product_id_ascii = Some(lenient_ascii(data)),
			Field::BomVersion => record.bom_version = Some(be16(data)),
			Field::PcbVersion => record.pcb_version = Some(be16(data)),
			Field::FixtureVersion => record.fixture_version = Some(be16(data)),
			Field::Crc5FixtureHeader => record.crc5_fixture_header = Some(crc5(data)),
			Field::Crc5CgminerHeader => record.crc5_cgminer_header = Some(crc5(data)),
			Field::Crc5ClassInfo => record.crc5_class_info = Some(crc5(data)),
		}
	}

	record
}

#[cfg(test)]
mod test {
	use super::*;

	const SERIAL: &[u8; 17] = b"HB0123456789ABCDE";
	const PRODUCT: &[u8; 4] = b"S19J";

	fn synthetic_image() -> Vec<u8> {
		let mut image = vec![0u8; 256];
		image[0..4].copy_from_slice(&[0xa5, 0x5a, 0x01, 0x02]);
		image[4..21].copy_from_slice(SERIAL);
		image[21..25].copy_from_slice(PRODUCT);
		image[25..27].copy_from_slice(&[0x01, 0x10]);
		image[27..29].copy_from_slice(&[0x00, 0x0c]);
		image[29..31].copy_from_slice(&[0xbe, 0xef]);
		for i in 64..128 {
			image[i] = i as u8;
		}
		image
	}

	#[test]
	fn decodes_full_image() {
		let record = decode(&synthetic_image());
		assert!(record.is_complete());
		assert_eq!(record.serial_number_raw.as_ref().unwrap(), &SERIAL[..]);
		assert_eq!(record.serial_number_ascii.as_ref().unwrap(), "HB0123456789ABCDE");
		assert_eq!(record.product_id_raw.as_ref().unwrap(), &PRODUCT[..]);
		assert_eq!(record.product_id_ascii.as_ref().unwrap(), "S19J");
		assert_eq!(record.bom_version, Some(0x0110));
		assert_eq!(record.pcb_version, Some(0x000c));
		assert_eq!(record.fixture_version, Some(0xbeef));
		assert_eq!(record.crc5_fixture_header, Some(0x04));
		assert_eq!(record.crc5_cgminer_header, Some(0x14));
		assert_eq!(record.crc5_class_info, Some(0x18));
	}

	#[test]
	fn crc_fields_match_crc5() {
		let image = synthetic_image();
		let record = decode(&image);
		assert_eq!(record.crc5_fixture_header, Some(crc5(&image[0..4])));
		assert_eq!(record.crc5_cgminer_header, Some(crc5(&image[4..64])));
		assert_eq!(record.crc5_class_info, Some(crc5(&image[64..128])));
	}

	#[test]
	fn non_printable_bytes_become_question_marks() {
		let mut image = synthetic_image();
		image[4] = 0x00;
		image[10] = 0x7f;
		image[20] = 0x1f;
		image[21] = 0xff;
		image[24] = b' ';
		let record = decode(&image);

		assert_eq!(record.serial_number_ascii.as_ref().unwrap(), "?B0123?56789ABCD?");
		assert_eq!(record.product_id_ascii.as_ref().unwrap(), "?19 ");
		let raw = record.serial_number_raw.as_ref().unwrap();
		assert_eq!((raw[0], raw[6], raw[16]), (0x00, 0x7f, 0x1f));
		assert_eq!(record.product_id_raw.as_ref().unwrap()[0], 0xff);
	}

	#[test]
	fn truncated_image_skips_fields() {
		let image = synthetic_image();

		let record = decode(&image[..100]);
		assert_eq!(record.skipped, vec![Field::Crc5ClassInfo]);
		assert!(!record.is_complete());
		assert_eq!(record.serial_number_ascii.as_ref().unwrap(), "HB0123456789ABCDE");
		assert_eq!(record.fixture_version, Some(0xbeef));
		assert!(record.crc5_cgminer_header.is_some());
		assert_eq!(record.crc5_class_info, None);

		let record = decode(&image[..28]);
		assert_eq!(record.skipped, vec![
			Field::PcbVersion,
			Field::FixtureVersion,
			Field::Crc5CgminerHeader,
			Field::Crc5ClassInfo,
		]);
		assert_eq!(record.bom_version, Some(0x0110));
		assert_eq!(record.crc5_fixture_header, Some(0x04));

		let record = decode(&[]);
		assert_eq!(record.skipped.len(), Field::ALL.len());
		assert_eq!(record.entries().count(), 0);
	}

	#[test]
	fn entries_in_layout_order() {
		let record = decode(&synthetic_image());
		let rendered: Vec<String> = record.entries()
			.map(|(field, value)| format!("{}: {}", field, value))
			.collect();
		assert_eq!(rendered.len(), Field::ALL.len());
		assert_eq!(rendered[1], "serial_number_ascii: HB0123456789ABCDE");
		assert_eq!(rendered[4], "bom_version: 0x0110");
		assert_eq!(rendered[6], "fixture_version: 0xBEEF");
		assert_eq!(rendered[7], "crc5_fixture_header: 4");
		assert_eq!(rendered[2], "product_id_raw: [83, 49, 57, 74]");
	}
}
