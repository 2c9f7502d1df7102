// A small feed-forward network with one hidden layer, trained one example
// at a time by plain gradient descent on the quadratic cost.  The harness
// only talks to it through the ``Network`` trait, so another model can be
// dropped in without touching training or evaluation.

use std::{
	fs::File,
	io::{BufReader, BufWriter, Write},
	path::Path,
};

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::NetworkError;

pub trait Network: Sized {
	/// A fresh, randomly initialised network.
	fn build<R: Rng>(nips: usize, nhid: usize, nops: usize, rng: &mut R) -> Self;

	fn load(path: &Path) -> Result<Self, NetworkError>;

	fn save(&self, path: &Path) -> Result<(), NetworkError>;

	/// One gradient step on a single example. Returns the error measured
	/// before the step.
	fn train(&mut self, input: &[f64], target: &[f64], rate: f64) -> Result<f64, NetworkError>;

	fn predict(&self, input: &[f64]) -> Result<Vec<f64>, NetworkError>;
}

fn sigmoid(z: f64) -> f64 {
	1.0 / (1.0 + (-z).exp())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tinn {
	/// matrix of shape (nhid, nips)
	hidden_weights: Array2<f64>,
	/// vector of shape (nhid)
	hidden_biases: Array1<f64>,
	/// matrix of shape (nops, nhid)
	output_weights: Array2<f64>,
	/// vector of shape (nops)
	output_biases: Array1<f64>,
}

impl Tinn {
	pub fn nips(&self) -> usize {
		self.hidden_weights.ncols()
	}

	pub fn nhid(&self) -> usize {
		self.hidden_weights.nrows()
	}

	pub fn nops(&self) -> usize {
		self.output_weights.nrows()
	}

	fn check(&self, what: &'static str, expected: usize, found: usize) -> Result<(), NetworkError> {
		if expected == found {
			Ok(())
		} else {
			Err(NetworkError::Dimension { what, expected, found })
		}
	}

	/// Returns the (hidden, output) activations for ``x``.
	fn feedforward(&self, x: ArrayView1<f64>) -> (Array1<f64>, Array1<f64>) {
		let h = (self.hidden_weights.dot(&x) + &self.hidden_biases).mapv(sigmoid);
		let o = (self.output_weights.dot(&h) + &self.output_biases).mapv(sigmoid);
		(h, o)
	}
}

fn random_matrix<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Array2<f64> {
	// standard normal over the square root of the fan-in
	let scale = (cols.max(1) as f64).sqrt();
	Array2::from_shape_simple_fn((rows, cols), || rng.sample::<f64, _>(StandardNormal) / scale)
}

impl Network for Tinn {
	fn build<R: Rng>(nips: usize, nhid: usize, nops: usize, rng: &mut R) -> Self {
		Self {
			hidden_weights: random_matrix(nhid, nips, rng),
			hidden_biases: Array1::zeros(nhid),
			output_weights: random_matrix(nops, nhid, rng),
			output_biases: Array1::zeros(nops),
		}
	}

	fn load(path: &Path) -> Result<Self, NetworkError> {
		let file = File::open(path).map_err(|source| NetworkError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		let tinn: Tinn = serde_json::from_reader(BufReader::new(file)).map_err(|source| NetworkError::Format {
			path: path.to_path_buf(),
			source,
		})?;
		tinn.check("hidden bias vector", tinn.nhid(), tinn.hidden_biases.len())?;
		tinn.check("output weight matrix", tinn.nhid(), tinn.output_weights.ncols())?;
		tinn.check("output bias vector", tinn.nops(), tinn.output_biases.len())?;
		Ok(tinn)
	}

	fn save(&self, path: &Path) -> Result<(), NetworkError> {
		let io_err = |source| NetworkError::Io { path: path.to_path_buf(), source };
		let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
		serde_json::to_writer(&mut out, self).map_err(|source| NetworkError::Format {
			path: path.to_path_buf(),
			source,
		})?;
		out.flush().map_err(io_err)
	}

	fn train(&mut self, input: &[f64], target: &[f64], rate: f64) -> Result<f64, NetworkError> {
		self.check("input", self.nips(), input.len())?;
		self.check("target", self.nops(), target.len())?;
		let x = ArrayView1::from(input);
		let y = ArrayView1::from(target);

		let (h, o) = self.feedforward(x);
		let error = 0.5 * (&y - &o).mapv(|d| d * d).sum();

		// backward pass, output layer first
		let delta_o = (&o - &y) * o.mapv(|a| a * (1.0 - a));
		let delta_h = self.output_weights.t().dot(&delta_o) * h.mapv(|a| a * (1.0 - a));

		let nabla_o = delta_o.view().insert_axis(Axis(1)).dot(&h.view().insert_axis(Axis(0)));
		let nabla_h = delta_h.view().insert_axis(Axis(1)).dot(&x.insert_axis(Axis(0)));
		self.output_weights.scaled_add(-rate, &nabla_o);
		self.output_biases.scaled_add(-rate, &delta_o);
		self.hidden_weights.scaled_add(-rate, &nabla_h);
		self.hidden_biases.scaled_add(-rate, &delta_h);

		Ok(error)
	}

	fn predict(&self, input: &[f64]) -> Result<Vec<f64>, NetworkError> {
		self.check("input", self.nips(), input.len())?;
		let (_, o) = self.feedforward(ArrayView1::from(input));
		Ok(o.to_vec())
	}
}
