use std::path::Path;

use chrono::{Duration, Local};
use log::{debug, info};
use rand::Rng;

use crate::{dataset::{Dataset, ShuffleMode}, error::TrainError, network::Network};

#[derive(Debug, Clone, Copy)]
pub struct TrainingOptions {
	pub iterations: usize,
	pub rate: f64,
	pub anneal: f64,
	pub shuffle: ShuffleMode,
}

#[derive(Debug, Clone)]
pub struct EpochReport {
	pub epoch: usize,
	/// mean per-example error over the epoch
	pub error: f64,
	/// learning rate used for the epoch
	pub rate: f64,
	pub elapsed: Duration,
}

/// Runs ``options.iterations`` epochs over ``data`` and saves the network
/// at ``save_path``.
///
/// Every epoch reshuffles the rows, trains on each of them once with the
/// current rate, and only then multiplies the rate by ``options.anneal``,
/// so the first epoch always uses the initial rate.
pub fn train_all<N: Network, R: Rng>(
	data: &mut Dataset,
	network: &mut N,
	options: &TrainingOptions,
	rng: &mut R,
	save_path: &Path,
) -> Result<Vec<EpochReport>, TrainError> {
	let TrainingOptions { iterations, mut rate, anneal, shuffle } = *options;
	if iterations > 0 && data.is_empty() {
		return Err(TrainError::EmptyDataset(iterations));
	}

	info!("Training neural network for {} iterations", iterations);
	println!(" Epoch |      Mean Error |  Rate    | Elapsed ");
	println!("-------|-----------------|----------|---------");

	let mut reports = Vec::with_capacity(iterations);
	for epoch in 0..iterations {
		let t = Local::now();
		data.shuffle(rng, shuffle);

		let mut sum_error = 0.0;
		for (input, target) in data.iter() {
			sum_error += network.train(input, target, rate)?;
		}

		let report = EpochReport {
			epoch,
			error: sum_error / data.rows() as f64,
			rate,
			elapsed: Local::now() - t,
		};
		println!(" {:>5} | {:>15.12} | {:>8.6} | {:>6.1}s",
			report.epoch, report.error, report.rate,
			report.elapsed.num_milliseconds() as f64 / 1000.0);
		debug!("epoch {} took {}ms", epoch, report.elapsed.num_milliseconds());
		reports.push(report);

		rate *= anneal;
	}

	info!("Saving neural network at {}", save_path.display());
	network.save(save_path)?;
	Ok(reports)
}
