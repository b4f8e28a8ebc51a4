//! Basic usage example for the counterbalance library.
//!
//! This example generates sequences for a few standard paradigms and checks
//! their transition balance. Set `RUST_LOG=counterbalance=debug` to follow the
//! search.

use counterbalance::catalogue::get_by_name;
use counterbalance::{verify_balance, CounterbalanceBuilder};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Counterbalance Library - Basic Usage Example\n");

    // 2x2 design, pairs of consecutive trials balanced
    println!("Generating a 2x2 first-order sequence...");
    let generator = CounterbalanceBuilder::new()
        .trials(32)
        .factor_levels(vec![2, 2])
        .levels(1)
        .build()
        .expect("Invalid design");
    let seq = generator.generate_seeded(2024).expect("No sequence found");

    println!("Sequence:");
    println!("  Trials: {}", seq.trials());
    println!("  Conditions: {}", generator.space().conditions());
    println!("  Cells: {}", generator.space().matrix_size());
    println!();
    println!("{}", seq);

    let result = verify_balance(&seq, 1);
    if result.is_balanced {
        println!("✓ Every pair occurs {} times", result.min_expected);
    } else {
        println!("✗ Sequence failed verification");
        for issue in &result.issues {
            println!("  Issue: {:?}", issue);
        }
    }

    println!();

    // Named paradigms
    for name in ["flanker", "prime-probe"] {
        println!("Generating the {} design...", name);
        let generator = get_by_name(name)
            .and_then(|b| b.build())
            .expect("Invalid paradigm");
        let mut rng = rand::thread_rng();
        let generation = generator
            .generate_detailed_with_rng(&mut rng)
            .expect("No sequence found");

        println!("  Design: {}", generator.params());
        println!("  Attempts: {}", generation.stats.attempts);
        if let Some(start) = generation.alternator_start {
            println!("  Alternator start: {}", start);
        }

        let result = verify_balance(&generation.sequence, generator.params().levels);
        if result.is_balanced {
            println!("✓ Balanced over windows of {}", generator.params().levels + 1);
        }
        println!();
    }
}
