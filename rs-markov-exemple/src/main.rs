use std::env;

use log::info;
use rs_markov_core::{MarkovModel, TokenMode};

mod io;

const USAGE: &str = "usage: rs-markov-exemple <corpus file> [order] [char|word] [length] [temperature]";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let path = args.first().ok_or(USAGE)?;

    // Optional positional parameters, with the same defaults as the server
    let order = args.get(1).map(|s| s.parse::<usize>()).transpose()?.unwrap_or(2);
    let mode = args.get(2).map(|s| s.parse::<TokenMode>()).transpose()?.unwrap_or_default();
    let length = args.get(3).map(|s| s.parse::<usize>()).transpose()?.unwrap_or(200);
    let temperature = args.get(4).map(|s| s.parse::<f64>()).transpose()?.unwrap_or(1.0);

    let corpus = io::read_corpus(path)?;
    let name = io::get_filename(path)?;

    // Order 0 is rejected here, not clamped
    let mut model = MarkovModel::new(order)?;
    model.train(&corpus, mode)?;

    let stats = model.stats();
    info!(
        "'{}': {} states, average branching factor {:.2}",
        name, stats.state_count, stats.average_branching_factor
    );

    // Temperature 0 always takes the most frequent continuation
    println!("--- temperature 0.0");
    println!("{}", model.generate(length, mode, 0.0)?);

    // Generate a few samples with the requested temperature
    for i in 0..3 {
        println!("--- sample {} (temperature {})", i + 1, temperature);
        println!("{}", model.generate(length, mode, temperature)?);
    }

    // Once cleared, the model refuses to generate
    model.clear();
    match model.generate(length, mode, temperature) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("After clear: {e}"),
    }

    Ok(())
}
