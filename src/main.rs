#[cfg(feature = "blas")]
extern crate blas_src;

mod config;
mod dataset;
mod error;
mod evaluate;
mod io;
mod network;
mod train;
mod utils;

use std::{path::Path, process::ExitCode};

use anyhow::{bail, Context};
use log::{debug, info, LevelFilter};
use rand::{rngs::StdRng, SeedableRng};

use config::Config;
use dataset::Dataset;
use evaluate::ManualOptions;
use network::{Network, Tinn};
use train::TrainingOptions;

fn banner(title: &str) {
	println!("\n####################################");
	println!("{:^36}", title);
	println!("####################################\n");
}

fn main() -> ExitCode {
	pretty_env_logger::formatted_builder()
		.filter_level(LevelFilter::Info)
		.parse_env("RUST_LOG")
		.init();

	banner("THE VERY TINY NEURAL NETWORK");

	let args: Vec<String> = std::env::args().collect();
	start(&args)
}

/// Exit code 2 for a bad command line, 1 for any fatal error.
fn start(args: &[String]) -> ExitCode {
	if args.len() != 2 {
		eprintln!("ERROR: Please add path to config file: {} <path>", args.first().map_or("tinydigits", String::as_str));
		return ExitCode::from(2);
	}

	match run(Path::new(&args[1])) {
		Ok(()) => {
			println!("Quitting program...\n");
			ExitCode::SUCCESS
		}
		Err(err) => {
			eprintln!("ERROR: {:#}", err);
			ExitCode::FAILURE
		}
	}
}

fn run(config_path: &Path) -> anyhow::Result<()> {
	info!("Attempting to read config file: {}", config_path.display());
	let config = Config::load(config_path).context("bad config file")?;
	let mut rng = StdRng::seed_from_u64(config.seed);

	let mut data = if config.should_train() {
		info!("Building training set");
		Dataset::build(&config.data_path, config.nips, config.nops, config.data_lines)
			.context("building training set")?
	} else {
		Dataset::empty(config.nips, config.nops)
	};

	info!("Building testing set");
	let mut test_data = Dataset::build(&config.test_path, config.nips, config.nops, config.test_lines)
		.context("building testing set")?;

	let mut network = if config.load_existing {
		info!("Loading existing neural network at {}", config.nnet_path.display());
		let tinn = Tinn::load(&config.nnet_path).context("loading neural network")?;
		if (tinn.nips(), tinn.nops()) != (config.nips, config.nops) {
			bail!(
				"network at {} has {} inputs and {} outputs, config declares {} and {}",
				config.nnet_path.display(), tinn.nips(), tinn.nops(), config.nips, config.nops
			);
		}
		tinn
	} else {
		info!("Building new neural network");
		Tinn::build(config.nips, config.nhid, config.nops, &mut rng)
	};

	if config.should_train() {
		let options = TrainingOptions {
			iterations: config.iterations,
			rate: config.rate,
			anneal: config.anneal,
			shuffle: config.shuffle,
		};
		let reports = train::train_all(&mut data, &mut network, &options, &mut rng, &config.nnet_path)
			.context("training neural network")?;
		if let Some(last) = reports.last() {
			info!("Finished training with mean error {:.12}", last.error);
		}
	}

	if config.manual_testing {
		banner("BEGIN MANUAL TESTING");
		let options = ManualOptions {
			shuffle: config.shuffle,
			image_width: config.image_width,
		};
		evaluate::manual(&mut test_data, &network, &mut rng, &options, std::io::stdin().lock(), &mut std::io::stdout().lock())
			.context("manual testing")?;
	} else {
		banner("BEGIN AUTO TESTING");
		let evaluation = evaluate::evaluate(&test_data, &network, &mut std::io::stdout().lock())
			.context("automatic testing")?;
		let wrong = evaluation.outcomes.iter().filter(|o| !o.is_correct()).count();
		debug!("{} of {} test examples misclassified", wrong, evaluation.total);
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use std::{fs, path::PathBuf};

	use super::*;

	// four pixels and a two-way one-hot label
	const RECORDS: &str = "\
1100\
10
0011\
01
1010\
10
0101\
01
";

	struct Workspace {
		dir: PathBuf,
	}

	impl Workspace {
		fn new(name: &str) -> Self {
			let dir = std::env::temp_dir().join(format!("tinydigits-run-{}-{}", name, std::process::id()));
			fs::create_dir_all(&dir).unwrap();
			Self { dir }
		}

		fn path(&self, file: &str) -> PathBuf {
			self.dir.join(file)
		}

		fn write(&self, file: &str, text: &str) -> PathBuf {
			let path = self.path(file);
			fs::write(&path, text).unwrap();
			path
		}

		fn config(&self, file: &str, nips: usize, extra: &str) -> PathBuf {
			let text = format!(
				"HIDDEN_LAYER_NODES = 3\n\
				NUM_INPUTS = {}\n\
				NUM_OUTPUTS = 2\n\
				DATA_PATH = {}\n\
				DATA_LINES = 4\n\
				TEST_PATH = {}\n\
				TEST_LINES = 4\n\
				NNET_PATH = {}\n\
				TRAIN_ITERATIONS = 0\n\
				LEARNING_RATE = 1.0\n\
				ANNEAL = 0.99\n\
				{}",
				nips,
				self.path("train.data").display(),
				self.path("test.data").display(),
				self.path("saved.tinn").display(),
				extra,
			);
			self.write(file, &text)
		}
	}

	impl Drop for Workspace {
		fn drop(&mut self) {
			let _ = fs::remove_dir_all(&self.dir);
		}
	}

	#[test]
	fn fresh_network_is_saved_and_reloaded_without_training_data() {
		let ws = Workspace::new("reload");
		ws.write("train.data", RECORDS);
		ws.write("test.data", RECORDS);

		run(&ws.config("build.cfg", 4, "")).unwrap();
		let saved = Tinn::load(&ws.path("saved.tinn")).unwrap();
		assert_eq!((saved.nips(), saved.nhid(), saved.nops()), (4, 3, 2));

		// the training file is never opened for a loaded, untrained network
		fs::remove_file(ws.path("train.data")).unwrap();
		run(&ws.config("load.cfg", 4, "LOAD_EXISTING = YES\n")).unwrap();
		assert_eq!(Tinn::load(&ws.path("saved.tinn")).unwrap(), saved);
	}

	#[test]
	fn trained_network_is_written_to_nnet_path() {
		let ws = Workspace::new("train");
		ws.write("train.data", RECORDS);
		ws.write("test.data", RECORDS);

		let text = fs::read_to_string(ws.config("build.cfg", 4, "")).unwrap()
			.replace("TRAIN_ITERATIONS = 0", "TRAIN_ITERATIONS = 3");
		run(&ws.write("build.cfg", &text)).unwrap();
		assert!(ws.path("saved.tinn").exists());
	}

	#[test]
	fn loaded_network_must_match_declared_arity() {
		let ws = Workspace::new("arity");
		ws.write("train.data", RECORDS);
		ws.write("test.data", RECORDS);
		run(&ws.config("build.cfg", 4, "")).unwrap();

		// five inputs per record now, so only the network disagrees
		ws.write("test.data", &RECORDS.replace("\n", "").as_bytes()
			.chunks(6)
			.map(|r| format!("0{}\n", String::from_utf8_lossy(r)))
			.collect::<String>());
		let err = run(&ws.config("load.cfg", 5, "LOAD_EXISTING = YES\n")).unwrap_err();
		assert!(format!("{:#}", err).contains("has 4 inputs and 2 outputs, config declares 5 and 2"));
	}

	#[test]
	fn missing_test_file_is_fatal() {
		let ws = Workspace::new("notest");
		ws.write("train.data", RECORDS);
		let err = run(&ws.config("build.cfg", 4, "")).unwrap_err();
		assert!(format!("{:#}", err).contains("building testing set"));
	}

	#[test]
	fn exit_codes() {
		let ws = Workspace::new("exit");
		ws.write("train.data", RECORDS);
		ws.write("test.data", RECORDS);
		let config = ws.config("build.cfg", 4, "").display().to_string();
		let missing = ws.path("missing.cfg").display().to_string();
		let name = "tinydigits".to_string();

		assert_eq!(start(&[name.clone()]), ExitCode::from(2));
		assert_eq!(start(&[name.clone(), config.clone(), config.clone()]), ExitCode::from(2));
		assert_eq!(start(&[name.clone(), missing]), ExitCode::FAILURE);
		assert_eq!(start(&[name, config]), ExitCode::SUCCESS);
	}
}
