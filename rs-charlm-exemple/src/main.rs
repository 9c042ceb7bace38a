use std::path::PathBuf;

use clap::Parser;
use log::info;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use rs_charlm_core::{
    Corpus, FrequencyOracle, GenerationConfig, GenerationRequest, Generator, Oracle, StartSeed, TrainingSet,
};

#[derive(Parser, Debug)]
#[command(name = "rs-charlm-exemple", about = "Generate text from a character-window model")]
struct Args {
    /// Directory holding the training `.txt` files
    #[arg(long, default_value = "./data")]
    data: PathBuf,

    /// Optional JSON configuration (every key is optional)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed text to start generation (must be at least window_length chars)
    #[arg(long)]
    seed: Option<String>,

    /// Total number of characters, seed included
    #[arg(long)]
    num_chars: Option<usize>,

    /// Sampling temperature (> 0)
    #[arg(long)]
    temperature: Option<f64>,

    /// Fixed random seed for reproducible output
    #[arg(long)]
    rng_seed: Option<u64>,

    /// Print one sample per preview temperature instead of a single text
    #[arg(long)]
    preview: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    // Defaults, then the config file, then the command line
    let mut config = match &args.config {
        Some(path) => GenerationConfig::from_json_file(path)?,
        None => GenerationConfig::default(),
    };
    if let Some(temperature) = args.temperature {
        config.temperature = temperature;
    }
    if let Some(num_chars) = args.num_chars {
        config.num_chars = num_chars;
    }
    if args.rng_seed.is_some() {
        config.rng_seed = args.rng_seed;
    }
    config.validate()?;

    // Load all `.txt` files of the data directory
    let corpus = Corpus::from_dir(&args.data, "txt")?;
    let vocabulary = corpus.vocabulary();
    info!("Corpus: {} chars, {} distinct", corpus.len(), vocabulary.len());

    // Training windows, as a model would see them
    let training_set = TrainingSet::from_corpus(&corpus, config.window_length, config.step)?;
    info!("{} training windows of {} chars", training_set.len(), training_set.window_length());

    // Built once, then loaded from `<data>.bin`
    let oracle = FrequencyOracle::load_or_build(
        FrequencyOracle::cache_path(&args.data)?,
        &corpus,
        &vocabulary,
        config.window_length,
        config.smoothing,
    )?;

    let generator = Generator::new(&oracle, &vocabulary, config.window_length)?.with_corpus(&corpus);
    let mut rng = match config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    if args.preview {
        for (temperature, text) in generator.preview(&config.preview_temperatures, config.num_chars, &mut rng)? {
            println!("temperature: {:.2}", temperature);
            println!("{}", text);
        }
        return Ok(());
    }

    // Failures go to stderr with a non-zero exit code
    match generate_text(&generator, &config, args.seed, &mut rng) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Generation failed: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Generates a single text from the custom seed, or a random corpus window.
fn generate_text<O: Oracle, R: Rng>(
    generator: &Generator<'_, O>,
    config: &GenerationConfig,
    seed: Option<String>,
    rng: &mut R,
) -> rs_charlm_core::Result<String> {
    let request = GenerationRequest {
        temperature: config.temperature,
        start_seed: match seed {
            Some(seed) => StartSeed::Custom(seed),
            None => StartSeed::Random,
        },
        num_chars: config.num_chars,
    };
    generator.generate(&request, rng)
}
