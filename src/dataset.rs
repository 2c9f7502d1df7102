use std::{
	fs::File,
	io::{BufRead, BufReader},
	path::Path,
	str::FromStr,
};

use rand::{seq::SliceRandom, Rng};

use crate::{error::DatasetError, io::LineReader, utils::index_of_max};

const PREALLOC_ROWS: usize = 4096;

/// How rows are reordered between epochs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShuffleMode {
	/// For every row, swap with a row drawn from the whole range. Not a
	/// uniform permutation, but reproduces earlier runs for a given seed.
	#[default]
	Biased,
	/// Fisher-Yates.
	Uniform,
}

impl FromStr for ShuffleMode {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"BIASED" => Ok(Self::Biased),
			"UNIFORM" => Ok(Self::Uniform),
			_ => Err(()),
		}
	}
}

/// Paired input and target rows.
///
/// Rows live in two contiguous buffers and are addressed through `order`,
/// so a shuffle only moves indices and an input can never be separated
/// from its target.
#[derive(Debug, Clone)]
pub struct Dataset {
	inputs: Vec<f64>,
	targets: Vec<f64>,
	order: Vec<usize>,
	nips: usize,
	nops: usize,
}

impl Dataset {
	pub fn empty(nips: usize, nops: usize) -> Self {
		Self {
			inputs: Vec::new(),
			targets: Vec::new(),
			order: Vec::new(),
			nips,
			nops,
		}
	}

	/// Opens `path` and parses `rows` records of `nips + nops` digits.
	pub fn build(path: &Path, nips: usize, nops: usize, rows: usize) -> Result<Self, DatasetError> {
		let file = File::open(path).map_err(|source| DatasetError::Open {
			path: path.to_path_buf(),
			source,
		})?;
		Self::parse(BufReader::new(file), nips, nops, rows)
	}

	pub fn parse<R: BufRead>(reader: R, nips: usize, nops: usize, rows: usize) -> Result<Self, DatasetError> {
		let cols = nips + nops;
		// the row count comes from the config, so only trust it up to a point
		let reserve = rows.min(PREALLOC_ROWS);
		let mut inputs = Vec::with_capacity(reserve.checked_mul(nips).unwrap_or(0));
		let mut targets = Vec::with_capacity(reserve.checked_mul(nops).unwrap_or(0));

		let mut reader = LineReader::new(reader);
		for row in 0..rows {
			let mut line = reader
				.next_record()?
				.ok_or(DatasetError::MissingRecords { expected: rows, found: row })?;
			if let [rest @ .., b'\r'] = line {
				line = rest;
			}
			if line.len() != cols {
				return Err(DatasetError::RecordLength { row, expected: cols, found: line.len() });
			}
			for (column, &ch) in line.iter().enumerate() {
				if !ch.is_ascii_digit() {
					return Err(DatasetError::InvalidDigit { row, column, found: ch as char });
				}
				let val = (ch - b'0') as f64;
				if column < nips {
					inputs.push(val);
				} else {
					targets.push(val);
				}
			}
		}
		Ok(Self {
			inputs,
			targets,
			order: (0..rows).collect(),
			nips,
			nops,
		})
	}

	pub fn rows(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	pub fn input(&self, row: usize) -> &[f64] {
		let start = self.order[row] * self.nips;
		&self.inputs[start..start + self.nips]
	}

	pub fn target(&self, row: usize) -> &[f64] {
		let start = self.order[row] * self.nops;
		&self.targets[start..start + self.nops]
	}

	/// The true class of a row: the index of its largest target value.
	pub fn label(&self, row: usize) -> usize {
		index_of_max(self.target(row))
	}

	/// (input, target) pairs in the current order.
	pub fn iter(&self) -> impl Iterator<Item = (&[f64], &[f64])> + '_ {
		(0..self.rows()).map(|row| (self.input(row), self.target(row)))
	}

	/// Reorders the rows in place.
	pub fn shuffle<R: Rng>(&mut self, rng: &mut R, mode: ShuffleMode) {
		let rows = self.rows();
		if rows == 0 {
			return;
		}
		match mode {
			ShuffleMode::Biased => {
				for a in 0..rows {
					let b = rng.random_range(0..rows);
					self.order.swap(a, b);
				}
			}
			ShuffleMode::Uniform => self.order.shuffle(rng),
		}
	}

	/// The first row, in the current order, whose class is `class`.
	/// Scans at most every row once.
	pub fn find_class(&self, class: usize) -> Option<usize> {
		(0..self.rows()).find(|&row| self.label(row) == class)
	}
}

#[cfg(test)]
mod tests {
	use std::io::Cursor;

	use rand::{rngs::StdRng, SeedableRng};

	use super::*;

	const SAMPLE: &str = "\
1100\
1000000000
0011\
0100000000
1111\
0000000001
0000\
0010000000
";

	fn sample() -> Dataset {
		Dataset::parse(Cursor::new(SAMPLE), 4, 10, 4).unwrap()
	}

	fn pairs(data: &Dataset) -> Vec<(Vec<f64>, Vec<f64>)> {
		let mut v: Vec<_> = data.iter().map(|(i, t)| (i.to_vec(), t.to_vec())).collect();
		v.sort_by(|a, b| a.partial_cmp(b).unwrap());
		v
	}

	#[test]
	fn parses_declared_shape() {
		let data = sample();
		assert_eq!(data.rows(), 4);
		assert!(data.iter().all(|(i, t)| i.len() == 4 && t.len() == 10));
		assert_eq!(data.input(1), &[0.0, 0.0, 1.0, 1.0]);
		assert_eq!(data.target(1), &[0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
		assert_eq!(data.label(1), 1);
		assert_eq!(data.label(2), 9);
	}

	#[test]
	fn decodes_each_character_as_a_digit() {
		let data = Dataset::parse(Cursor::new("905\n"), 2, 1, 1).unwrap();
		assert_eq!(data.input(0), &[9.0, 0.0]);
		assert_eq!(data.target(0), &[5.0]);
	}

	#[test]
	fn reads_only_the_requested_rows() {
		let data = Dataset::parse(Cursor::new(SAMPLE), 4, 10, 2).unwrap();
		assert_eq!(data.rows(), 2);
	}

	#[test]
	fn accepts_crlf_records() {
		let data = Dataset::parse(Cursor::new("0110\r\n1001\r\n"), 3, 1, 2).unwrap();
		assert_eq!(data.target(1), &[1.0]);
	}

	#[test]
	fn short_record_is_rejected() {
		let err = Dataset::parse(Cursor::new("1100\n110\n"), 3, 1, 2).unwrap_err();
		assert!(matches!(err, DatasetError::RecordLength { row: 1, expected: 4, found: 3 }));
	}

	#[test]
	fn non_digit_is_rejected() {
		let err = Dataset::parse(Cursor::new("11x0\n"), 3, 1, 1).unwrap_err();
		assert!(matches!(err, DatasetError::InvalidDigit { row: 0, column: 2, found: 'x' }));
	}

	#[test]
	fn too_few_records_is_rejected() {
		let err = Dataset::parse(Cursor::new(SAMPLE), 4, 10, 6).unwrap_err();
		assert!(matches!(err, DatasetError::MissingRecords { expected: 6, found: 4 }));
	}

	#[test]
	fn row_count_beyond_the_file_is_reported_not_allocated() {
		let err = Dataset::parse(Cursor::new("11001000000000\n"), 4, 10, 10_000_000_000_000).unwrap_err();
		assert!(matches!(err, DatasetError::MissingRecords { expected: 10_000_000_000_000, found: 1 }));
	}

	#[test]
	fn missing_file_carries_hint() {
		let path = std::env::temp_dir().join("tinydigits-no-such-file.data");
		let err = Dataset::build(&path, 4, 10, 1).unwrap_err();
		assert!(matches!(err, DatasetError::Open { .. }));
		assert!(err.to_string().contains("Check file path in config file"));
	}

	#[test]
	fn shuffle_keeps_pairs_together() {
		let mut data = sample();
		let before = pairs(&data);
		let mut rng = StdRng::seed_from_u64(2);
		for mode in [ShuffleMode::Biased, ShuffleMode::Uniform] {
			for _ in 0..20 {
				data.shuffle(&mut rng, mode);
				assert_eq!(pairs(&data), before);
			}
		}
	}

	#[test]
	fn shuffle_is_reproducible_for_a_seed() {
		let mut a = sample();
		let mut b = sample();
		a.shuffle(&mut StdRng::seed_from_u64(7), ShuffleMode::Biased);
		b.shuffle(&mut StdRng::seed_from_u64(7), ShuffleMode::Biased);
		assert_eq!(a.order, b.order);
	}

	#[test]
	fn shuffle_of_empty_dataset_is_a_no_op() {
		let mut data = Dataset::empty(4, 10);
		data.shuffle(&mut StdRng::seed_from_u64(1), ShuffleMode::Biased);
		assert!(data.is_empty());
	}

	#[test]
	fn find_class_locates_matching_row() {
		let data = sample();
		assert_eq!(data.find_class(9), Some(2));
		assert_eq!(data.find_class(0), Some(0));
	}

	#[test]
	fn find_class_reports_absent_class() {
		let data = sample();
		assert_eq!(data.find_class(5), None);
		assert_eq!(Dataset::empty(4, 10).find_class(0), None);
	}

	#[test]
	fn shuffle_mode_from_config_value() {
		assert_eq!("UNIFORM".parse(), Ok(ShuffleMode::Uniform));
		assert_eq!("BIASED".parse(), Ok(ShuffleMode::Biased));
		assert!("random".parse::<ShuffleMode>().is_err());
	}
}
