//! verdict: LLM-as-a-judge benchmarking of speech and translation services
//!
//! Interactive numbered menu over the evaluation flows. Errors from a run
//! print and drop back to the menu; completed result files stay on disk so
//! a re-run with --use-existing resumes where the previous run stopped.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use verdict_cli::{speech, translation, RunOptions};

#[derive(Parser, Debug)]
#[command(name = "verdict", version, about = "Benchmark AI web services with an LLM judge")]
struct Args {
    /// Directory holding services.toml and models.toml
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    /// Root directory for per-task result files
    #[arg(long, default_value = "results")]
    results_dir: PathBuf,

    /// Reuse existing result files instead of re-invoking paid services
    #[arg(long)]
    use_existing: bool,

    /// Number of samples from each dataset to run through services
    #[arg(long, default_value_t = 5)]
    samples: usize,

    /// Speech dataset manifest CSV (id,text,audio,...)
    #[arg(long, default_value = "data/edacc_metadata.csv")]
    speech_manifest: PathBuf,

    /// Translation dataset manifest CSV (id,english,french)
    #[arg(long, default_value = "data/europarl_metadata.csv")]
    translation_manifest: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args = Args::parse();
    let options = RunOptions {
        config_dir: args.config_dir,
        results_dir: args.results_dir,
        use_existing: args.use_existing,
        samples: args.samples,
        speech_manifest: args.speech_manifest,
        translation_manifest: args.translation_manifest,
    };

    let stdin = std::io::stdin();
    let mut input = stdin.lock();

    loop {
        print!(
            "LLM as a Judge\n\
             1.) Speech Recognition\n\
             2.) Emotion Detection\n\
             3.) Language Translation\n\
             4.) Exit\n\
             Select: "
        );
        std::io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break; // EOF
        }

        match line.trim() {
            "1" => {
                if let Err(err) = speech::run(&options) {
                    error!("speech recognition run failed: {err:#}");
                }
            }
            "2" => println!("Emotion detection is not implemented yet."),
            "3" => {
                if let Err(err) = translation::run(&options) {
                    error!("language translation run failed: {err:#}");
                }
            }
            "4" => break,
            _ => println!("Invalid. Select an option between 1-4."),
        }
    }

    Ok(())
}
