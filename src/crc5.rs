/// CRC5 as used in the hashboard EEPROM header.
///
/// Unreflected and bit-serial: register starts at 0x1f, bits are shifted in
/// MSB first and the feedback polynomial 0x15 is applied after the shift.
/// This is not one of the common CRC5 variants; keep it bit-exact.
pub fn crc5(data: &[u8]) -> u8 {
	let mut crc = 0x1fu8;
	for &byte in data {
		let mut byte = byte;
		for _ in 0..8 {
			let bit = ((byte >> 7) & 1) ^ ((crc >> 4) & 1);
			crc = ((crc << 1) & 0x1f) | bit;
			if bit != 0 {
				crc ^= 0x15;
			}
			byte <<= 1;
		}
	}
	crc & 0x1f
}
