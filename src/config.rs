use std::{collections::HashMap, fs, path::{Path, PathBuf}, str::FromStr};

use log::debug;

use crate::{dataset::ShuffleMode, error::ConfigError};

const DEFAULT_SEED: u64 = 2;
const DEFAULT_IMAGE_WIDTH: usize = 16;

/// Settings for one run, read from a `KEY = VALUE` file.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
	/// Hidden layer nodes. Only read when a new network is built.
	pub nhid: usize,
	pub iterations: usize,
	pub data_path: PathBuf,
	pub test_path: PathBuf,
	pub nnet_path: PathBuf,
	pub data_lines: usize,
	pub test_lines: usize,
	pub nips: usize,
	pub nops: usize,
	pub anneal: f64,
	/// Initial learning rate.
	pub rate: f64,
	pub load_existing: bool,
	pub train_existing: bool,
	pub manual_testing: bool,
	pub seed: u64,
	pub shuffle: ShuffleMode,
	pub image_width: usize,
}

impl Config {
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		text.parse()
	}

	/// A fresh network is trained; a loaded one only when asked to.
	pub fn should_train(&self) -> bool {
		self.train_existing || !self.load_existing
	}
}

struct Entries<'a>(HashMap<&'a str, &'a str>);

impl<'a> Entries<'a> {
	fn flag(&self, key: &str) -> bool {
		self.0.get(key) == Some(&"YES")
	}

	fn optional<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
		self.0.get(key)
			.map(|value| value.parse().map_err(|_| ConfigError::InvalidValue {
				key,
				value: value.to_string(),
			}))
			.transpose()
	}

	fn required<T: FromStr>(&self, key: &'static str) -> Result<T, ConfigError> {
		self.optional(key)?.ok_or(ConfigError::MissingKey(key))
	}

	/// Required only when ``needed``; otherwise the value is informative
	/// and a missing key reads as the type's default.
	fn required_if<T: FromStr + Default>(&self, needed: bool, key: &'static str) -> Result<T, ConfigError> {
		if needed {
			self.required(key)
		} else {
			Ok(self.optional(key)?.unwrap_or_default())
		}
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(text: &str) -> Result<Self, Self::Err> {
		let mut entries = HashMap::new();
		for (i, line) in text.lines().enumerate() {
			let line = line.trim();
			if line.is_empty() || line.starts_with('#') {
				continue;
			}
			let (key, value) = line.split_once('=').ok_or(ConfigError::Malformed { line: i + 1 })?;
			entries.insert(key.trim(), value.trim());
		}
		let entries = Entries(entries);

		let load_existing = entries.flag("LOAD_EXISTING");
		let train_existing = entries.flag("TRAIN_EXISTING");
		let training = train_existing || !load_existing;

		let config = Config {
			nhid: entries.required_if(!load_existing, "HIDDEN_LAYER_NODES")?,
			iterations: entries.required_if(training, "TRAIN_ITERATIONS")?,
			data_path: entries.required_if(training, "DATA_PATH")?,
			test_path: entries.required("TEST_PATH")?,
			nnet_path: entries.required("NNET_PATH")?,
			data_lines: entries.required_if(training, "DATA_LINES")?,
			test_lines: entries.required("TEST_LINES")?,
			nips: entries.required("NUM_INPUTS")?,
			nops: entries.required("NUM_OUTPUTS")?,
			anneal: entries.required_if(training, "ANNEAL")?,
			rate: entries.required_if(training, "LEARNING_RATE")?,
			load_existing,
			train_existing,
			manual_testing: entries.flag("MANUAL_TESTING"),
			seed: entries.optional("SEED")?.unwrap_or(DEFAULT_SEED),
			shuffle: entries.optional("SHUFFLE")?.unwrap_or_default(),
			image_width: entries.optional("IMAGE_WIDTH")?.unwrap_or(DEFAULT_IMAGE_WIDTH),
		};

		const KNOWN: [&str; 17] = [
			"HIDDEN_LAYER_NODES", "DATA_LINES", "NUM_INPUTS", "NUM_OUTPUTS", "TRAIN_ITERATIONS",
			"DATA_PATH", "NNET_PATH", "TEST_PATH", "TEST_LINES", "ANNEAL", "LEARNING_RATE",
			"LOAD_EXISTING", "TRAIN_EXISTING", "MANUAL_TESTING", "SEED", "SHUFFLE", "IMAGE_WIDTH",
		];
		for key in entries.0.keys().filter(|k| !KNOWN.contains(*k)) {
			debug!("ignoring unknown config key {}", key);
		}
		Ok(config)
	}
}
