//! genalg CLI - Fit a polynomial with the evolution engine from a JSON configuration.
//!
//! Each genome holds one coefficient (float gene) and one exponent (integer gene)
//! per term. Fitness is the negated mean absolute error against a cubic target.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use rayon::prelude::*;

use genalg::{
    compute::{Genome, GenomeRng, Population},
    schema::RunConfig,
};

/// Sampling step over `[-2, 2)`.
const SAMPLE_STEP: f32 = 0.02;

fn target(x: f32) -> f32 {
    -0.5 * x.powi(3) + 0.314 * x.powi(2) - 0.7777 * x + 0.1
}

/// Mean absolute error of the polynomial encoded by `genome`.
fn error(genome: &Genome, samples: &[(f32, f32)]) -> f32 {
    let coefficients = genome.float_genes();
    let exponents = genome.int_genes();
    let total: f32 = samples
        .iter()
        .map(|&(x, y)| {
            let approx: f32 = coefficients
                .iter()
                .zip(exponents)
                .map(|(&c, &e)| c * x.powi(e as i32))
                .sum();
            (y - approx).abs()
        })
        .sum();
    total / samples.len() as f32
}

fn describe(genome: &Genome) -> String {
    genome
        .float_genes()
        .iter()
        .zip(genome.int_genes())
        .map(|(c, e)| format!("{c:.4}*x^{e}"))
        .collect::<Vec<_>>()
        .join(" + ")
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [epochs]", args[0]);
        eprintln!();
        eprintln!("Fit -0.5*x^3 + 0.314*x^2 - 0.7777*x + 0.1 with a genetic algorithm.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to run configuration file");
        eprintln!("  epochs       Maximum number of epochs (overrides the configuration)");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });
    let mut config: RunConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });
    if let Some(epochs) = args.get(2).and_then(|s| s.parse().ok()) {
        config.max_epochs = epochs;
    }

    let mut population = Population::from_config(&config.population).unwrap_or_else(|e| {
        eprintln!("Invalid population configuration: {}", e);
        std::process::exit(1);
    });
    if population.float_gene_count() != population.int_gene_count() {
        eprintln!("The polynomial fit needs one integer exponent per float coefficient");
        std::process::exit(1);
    }
    if config.genealogy_path.is_some() {
        population.enable_genealogy();
    }

    let mut rng = match config.seed {
        Some(seed) => GenomeRng::new(seed),
        None => GenomeRng::random(),
    };
    let sample_count = (4.0 / SAMPLE_STEP).round() as usize;
    let samples: Vec<(f32, f32)> = (0..sample_count)
        .map(|i| {
            let x = -2.0 + i as f32 * SAMPLE_STEP;
            (x, target(x))
        })
        .collect();

    println!("genalg polynomial fit");
    println!("=====================");
    println!(
        "Population: {} ({} elites, size range [{}, {}])",
        population.len(),
        population.elite_count(),
        population.min_size(),
        population.max_size()
    );
    println!("Terms: {}", population.float_gene_count());
    println!("Max epochs: {}", config.max_epochs);
    println!();

    population.init(&mut rng);
    let start = Instant::now();
    let mut best_error = f32::INFINITY;

    while population.epoch() < config.max_epochs && best_error > config.target_error {
        // Score new genomes in parallel, then hand the values back in rank order
        let ranks: Vec<usize> = population.new_ranks().collect();
        let values: Vec<f32> = ranks
            .par_iter()
            .map(|&rank| -error(population.genome(rank), &samples))
            .collect();
        for (rank, value) in ranks.into_iter().zip(values) {
            population.set_value(rank, value);
        }

        let report = population.step(&mut rng);
        if report.improved
            && let Some(best) = population.best_ever()
        {
            let err = -best.value();
            if best_error - err > f32::EPSILON {
                best_error = err;
                println!(
                    "  Epoch {}: error={:.6}, size={}, diversity={:.4}, kt events={}",
                    report.epoch,
                    best_error,
                    report.size,
                    report.diversity,
                    population.kt_event_count()
                );
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("target: -0.5*x^3 + 0.314*x^2 - 0.7777*x + 0.1");
    if let Some(best) = population.best_ever() {
        println!("approx: {}", describe(best));
        println!("error: {:.6}", error(best, &samples));
    }
    println!(
        "Epochs: {}, KT events: {}, time: {:.2}s",
        population.epoch(),
        population.kt_event_count(),
        elapsed.as_secs_f32()
    );

    if let Some(path) = &config.snapshot_path {
        if let Err(e) = population.save(path) {
            eprintln!("Error saving population: {}", e);
            std::process::exit(1);
        }
        println!("Population saved to {}", path);
    }
    if let (Some(path), Some(genealogy)) = (&config.genealogy_path, population.genealogy()) {
        if let Err(e) = genealogy.save(path) {
            eprintln!("Error saving genealogy: {}", e);
            std::process::exit(1);
        }
        println!("Genealogy ({} births) saved to {}", genealogy.len(), path);
    }
}

fn print_example_config() {
    let config = RunConfig {
        seed: Some(0),
        ..Default::default()
    };

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
