//! Seeds command implementation
//!
//! Draws one bundle of variety seeds without calling the model.

use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::{Config, VarietyInjector};

/// Names printed per culture
const PREVIEW_NAMES: usize = 5;

/// Execute the seeds command
pub fn execute_seeds_command(seed: Option<u64>, config: &Config) -> Result<()> {
    let injector = VarietyInjector::from_data_dir(&config.paths.data_dir);
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let seeds = injector.get_generation_seeds(&mut rng);

    println!("=== GENERATION SEEDS ===");
    println!("{}", seeds.format_for_prompt(&mut rng));

    if !seeds.name_pools.is_empty() {
        println!("\nName pools:");
        for (culture, pool) in &seeds.name_pools {
            let names: Vec<&str> = pool
                .male
                .iter()
                .chain(&pool.female)
                .take(PREVIEW_NAMES)
                .map(String::as_str)
                .collect();
            println!("  {culture}: {}", names.join(", "));
        }
    }
    if !seeds.suggested_names.is_empty() {
        println!("\nSuggested names: {}", seeds.suggested_names.join(", "));
    }
    if injector.cultures().next().is_none() {
        println!(
            "\n⚠ No name pools found under {}",
            config.paths.data_dir.display()
        );
    }
    Ok(())
}
