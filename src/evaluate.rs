use std::io::{BufRead, Read, Write};

use log::debug;
use rand::Rng;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::{
	dataset::{Dataset, ShuffleMode},
	error::EvalError,
	network::Network,
	utils::{format_vector, index_of_max, render_image},
};

const PROMPT: &str = "Press any number key followed by enter or 'q' to quit: ";
const SEPARATOR: &str = "=============================================================";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
	pub target: usize,
	pub predicted: usize,
}

impl Outcome {
	pub fn is_correct(&self) -> bool {
		self.target == self.predicted
	}
}

#[derive(Debug, Clone)]
pub struct Evaluation {
	pub correct: usize,
	pub total: usize,
	pub outcomes: Vec<Outcome>,
}

impl Evaluation {
	/// ``correct / total``, or 0 for an empty test set.
	pub fn accuracy(&self) -> f64 {
		if self.total == 0 {
			0.0
		} else {
			self.correct as f64 / self.total as f64
		}
	}
}

#[cfg(feature = "rayon")]
fn predict_all<N: Network + Sync>(data: &Dataset, network: &N) -> Result<Vec<Vec<f64>>, EvalError> {
	(0..data.rows()).into_par_iter()
		.map(|row| network.predict(data.input(row)))
		.collect::<Result<_, _>>()
		.map_err(EvalError::from)
}

#[cfg(not(feature = "rayon"))]
fn predict_all<N: Network + Sync>(data: &Dataset, network: &N) -> Result<Vec<Vec<f64>>, EvalError> {
	(0..data.rows())
		.map(|row| network.predict(data.input(row)))
		.collect::<Result<_, _>>()
		.map_err(EvalError::from)
}

/// Scores every row of ``data`` against the network's prediction and
/// writes one line per example followed by the accuracy.
pub fn evaluate<N: Network + Sync, W: Write>(data: &Dataset, network: &N, out: &mut W) -> Result<Evaluation, EvalError> {
	let predictions = predict_all(data, network)?;

	let outcomes: Vec<Outcome> = predictions.iter().enumerate()
		.map(|(row, prediction)| Outcome {
			target: data.label(row),
			predicted: index_of_max(prediction),
		})
		.collect();
	for outcome in &outcomes {
		let mark = if outcome.is_correct() { "" } else { " - WRONG" };
		writeln!(out, "Test input was {}, the machine chose {}{}", outcome.target, outcome.predicted, mark)?;
	}

	let evaluation = Evaluation {
		correct: outcomes.iter().filter(|o| o.is_correct()).count(),
		total: outcomes.len(),
		outcomes,
	};
	writeln!(out, "\nThe network guessed with an accuracy of {:.3} ({}/{})\n",
		evaluation.accuracy(), evaluation.correct, evaluation.total)?;
	Ok(evaluation)
}

pub struct ManualOptions {
	pub shuffle: ShuffleMode,
	pub image_width: usize,
}

/// Interactive testing. Each digit key shows a freshly shuffled example of
/// that class next to the network's prediction; ``q`` or end of input quits
/// and every other key is ignored.
pub fn manual<N: Network, R: Rng, I: BufRead, W: Write>(
	data: &mut Dataset,
	network: &N,
	rng: &mut R,
	options: &ManualOptions,
	input: I,
	out: &mut W,
) -> Result<(), EvalError> {
	write!(out, "{}", PROMPT)?;
	out.flush()?;

	for byte in input.bytes() {
		let key = byte? as char;
		let digit = match key {
			'q' | 'Q' => break,
			'0'..='9' => key as usize - '0' as usize,
			c if c.is_whitespace() => continue,
			c => {
				debug!("ignoring key {:?}", c);
				continue;
			}
		};

		data.shuffle(rng, options.shuffle);
		match data.find_class(digit) {
			Some(row) => {
				let pixels = data.input(row);
				writeln!(out)?;
				write!(out, "{}", render_image(pixels, options.image_width)?)?;
				let prediction = network.predict(pixels)?;
				writeln!(out, "You input {} and the machine chose {}:", digit, index_of_max(&prediction))?;
				writeln!(out, "{}", format_vector(&prediction))?;
				writeln!(out, "{}\n{}\n", SEPARATOR, SEPARATOR)?;
			}
			None => writeln!(out, "\nNo example of {} in the test set\n", digit)?,
		}
		write!(out, "{}", PROMPT)?;
		out.flush()?;
	}
	Ok(())
}
