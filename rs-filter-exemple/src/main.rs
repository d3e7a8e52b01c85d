use std::io::{self, BufRead};
use std::path::PathBuf;

use clap::Parser;
use log::info;

use rs_filter_core::model::ngram_model::NgramModel;
use rs_filter_core::text::preprocess;

#[derive(Parser, Debug)]
#[command(name = "rs-filter-exemple")]
#[command(about = "Scores stdin lines against an n-gram model built from a corpus")]
struct Args {
    /// Corpus file, one message per line
    corpus: PathBuf,

    /// Order of the n-gram model
    #[arg(short, long, default_value_t = 2)]
    order: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    // Lines are split across worker threads, each building a partial model,
    // then merged into one
    let model = NgramModel::from_corpus(&args.corpus, args.order)?;
    info!("model ready: {:?}", model.stats());

    // Every stdin line is scored without being learned.
    // Unknown contexts score as 1.0, so the sentence boundaries and the
    // known contexts drive the result
    for line in io::stdin().lock().lines() {
        let line = line?;
        let tokens = preprocess(&line);
        let log_probability = model.log_probability(&tokens);
        println!("{:.4}\t{:.6}\t{}", log_probability, log_probability.exp(), line);
    }

    Ok(())
}
