#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate hashboard_eeprom;
use hashboard_eeprom::*;

use std::fs;
use std::io::{
	self,
	BufRead,
	Write,
};
use std::process::exit;
use std::time::Duration;

use hashboard_eeprom::eeprom::IMAGE_LEN;
use hashboard_eeprom::i2c::LinuxI2c;
use hashboard_eeprom::workflow;

fn get_param<T>(matches: &clap::ArgMatches, name: &str) -> AResult<T>
where
	T: std::str::FromStr,
	failure::Error: From<<T as std::str::FromStr>::Err>,
{
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => bail!("missing parameter {}", name),
	};
	param.parse::<T>().map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid parameter {}: {}", name, e);
		e.context(msg).into()
	})
}

// decimal or 0x-prefixed hex
fn parse_number(s: &str) -> AResult<usize> {
	let s = s.trim();
	let r = if s.starts_with("0x") || s.starts_with("0X") {
		usize::from_str_radix(&s[2..], 16)
	} else {
		s.parse::<usize>()
	};
	r.map_err(|e| format_err!("invalid number {:?}: {}", s, e))
}

fn get_number(matches: &clap::ArgMatches, name: &str, max: usize) -> AResult<usize> {
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => bail!("missing parameter {}", name),
	};
	let value = parse_number(param)?;
	ensure!(value <= max, "invalid parameter {}: {} (maximum is {})", name, param, max);
	Ok(value)
}

fn config(matches: &clap::ArgMatches) -> AResult<EepromConfig> {
	Ok(EepromConfig {
		bus: get_param(matches, "bus")?,
		address: get_number(matches, "address", 0x7f)? as u8,
		capacity: get_number(matches, "capacity", eeprom::MAX_CAPACITY)?,
		write_cycle: Duration::from_millis(get_param(matches, "write_cycle")?),
	})
}

fn open(matches: &clap::ArgMatches) -> AResult<Eeprom<LinuxI2c>> {
	config(matches)?.open()
}

fn read(matches: &clap::ArgMatches, sub_m: &clap::ArgMatches) -> AResult<()> {
	let mut ee = open(matches)?;
	let offset = get_number(sub_m, "offset", 0xff)? as u8;
	let length = match sub_m.value_of("length") {
		Some(_) => get_number(sub_m, "length", eeprom::MAX_CAPACITY)?,
		None => ee.capacity().saturating_sub(offset as usize),
	};

	info!("Reading {} bytes starting at 0x{:02x}", length, offset);
	let data = ee.read(offset, length)?;
	print!("{}", workflow::hex_dump(&data));

	Ok(())
}

fn export(matches: &clap::ArgMatches, sub_m: &clap::ArgMatches) -> AResult<()> {
	let mut ee = open(matches)?;
	let image = workflow::read_image(&mut ee)?;

	if sub_m.is_present("binary") {
		let stdout = io::stdout();
		let mut out = stdout.lock();
		out.write_all(&image)?;
		out.flush()?;
	} else {
		println!("{}", workflow::to_hex(&image));
		eprintln!("Save the hex string above (e.g. `xxd -r -p`) to get a .bin image");
	}

	Ok(())
}

fn decode(matches: &clap::ArgMatches, sub_m: &clap::ArgMatches) -> AResult<()> {
	let record = match sub_m.value_of("file") {
		Some(path) => {
			let image = with_file_context(path, fs::read(path))?;
			if image.len() < IMAGE_LEN {
				warn!("{}: image has only {} bytes", path, image.len());
			}
			header::decode(&image)
		},
		None => {
			let mut ee = open(matches)?;
			workflow::read_header(&mut ee)?
		},
	};

	for (field, value) in record.entries() {
		println!("{}: {}", field, value);
	}
	for field in &record.skipped {
		warn!("{}: not decoded (image too short)", field);
	}

	Ok(())
}

fn with_file_context<T>(path: &str, r: io::Result<T>) -> AResult<T> {
	r.map_err(|e| {
		let msg = format!("couldn't read {}: {}", path, e);
		failure::Error::from(e).context(msg).into()
	})
}

fn wait_for_enter(prompt: &str) -> AResult<()> {
	eprint!("{}", prompt);
	io::stderr().flush()?;
	let mut line = String::new();
	let stdin = io::stdin();
	let n = stdin.lock().read_line(&mut line)?;
	ensure!(n > 0, "stdin closed, cancelled by operator");
	Ok(())
}

fn clone(matches: &clap::ArgMatches, sub_m: &clap::ArgMatches) -> AResult<()> {
	let mut ee = open(matches)?;
	let verify = sub_m.is_present("verify");
	let confirm = !sub_m.is_present("yes");

	let image = workflow::clone_image(&mut ee, verify, |_, image| {
		print!("{}", workflow::hex_dump(image));
		if confirm {
			wait_for_enter("Disconnect the source EEPROM, connect the target EEPROM and press Enter to continue...")?;
		}
		Ok(())
	})?;

	info!("Cloned {} bytes", image.len());
	Ok(())
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@setting SubcommandRequiredElseHelp)
		(global_setting: clap::AppSettings::VersionlessSubcommands)
		(@arg bus: -b --bus +takes_value default_value(eeprom::DEFAULT_BUS) "I2C bus device")
		(@arg address: -a --address +takes_value default_value("0x50") "EEPROM I2C address")
		(@arg capacity: --capacity +takes_value default_value("256") "EEPROM size in bytes")
		(@arg write_cycle: -w --cycle +takes_value default_value("10") "EEPROM write cycle in milliseconds")
		(@subcommand read =>
			(about: "read bytes and show a hex dump")
			(@arg offset: -o --offset +takes_value default_value("0") "start offset")
			(@arg length: -l --length +takes_value "number of bytes (default: up to end of EEPROM)")
		)
		(@subcommand export =>
			(about: "read the full EEPROM image and print it as hex")
			(@arg binary: --binary "write raw bytes to stdout instead")
		)
		(@subcommand decode =>
			(about: "decode the hashboard header")
			(@arg file: -f --file +takes_value "decode a raw image file instead of the EEPROM")
		)
		(@subcommand clone =>
			(about: "copy the EEPROM to another one swapped in on the same bus")
			(@arg verify: --verify "read back and compare after writing")
			(@arg yes: -y --yes "don't wait for the operator between read and write")
		)
	).get_matches();

	match matches.subcommand() {
		("read", Some(sub_m)) => {
			read(&matches, sub_m)
		},
		("export", Some(sub_m)) => {
			export(&matches, sub_m)
		},
		("decode", Some(sub_m)) => {
			decode(&matches, sub_m)
		},
		("clone", Some(sub_m)) => {
			clone(&matches, sub_m)
		},
		("", _) => bail!("no subcommand"),
		(cmd, _) => bail!("not implemented subcommand {:?}", cmd),
	}
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
