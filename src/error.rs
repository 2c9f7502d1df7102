use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("could not read config file {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("line {line}: expected `KEY = VALUE`")]
	Malformed { line: usize },
	#[error("missing required key `{0}`")]
	MissingKey(&'static str),
	#[error("invalid value `{value}` for key `{key}`")]
	InvalidValue { key: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum DatasetError {
	#[error(
		"could not open {path}: {source}\n\
		Get it from the machine learning database: \
		wget http://archive.ics.uci.edu/ml/machine-learning-databases/semeion/semeion.data\n\
		Check file path in config file"
	)]
	Open {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("read failed: {0}")]
	Read(#[from] io::Error),
	#[error("expected {expected} records but the file ends after {found}")]
	MissingRecords { expected: usize, found: usize },
	#[error("record {row}: expected {expected} digits, found {found}")]
	RecordLength { row: usize, expected: usize, found: usize },
	#[error("record {row}, column {column}: `{found}` is not a digit")]
	InvalidDigit { row: usize, column: usize, found: char },
}

#[derive(Error, Debug)]
pub enum NetworkError {
	#[error("network file {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("network file {path} is not a valid network: {source}")]
	Format {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
	#[error("{what} has {found} values, network expects {expected}")]
	Dimension { what: &'static str, expected: usize, found: usize },
}

#[derive(Error, Debug)]
pub enum TrainError {
	#[error("cannot train for {0} iterations on an empty data set")]
	EmptyDataset(usize),
	#[error(transparent)]
	Network(#[from] NetworkError),
}

#[derive(Error, Debug)]
pub enum EvalError {
	#[error(transparent)]
	Network(#[from] NetworkError),
	#[error("console i/o failed: {0}")]
	Io(#[from] io::Error),
	#[error("pixel ({x}, {y}) lies outside the {width}x{height} image")]
	Render { x: u32, y: u32, width: u32, height: u32 },
}
