//! CLI entry point: train the SIESTA variant classifier from a feature CSV.

use std::path::PathBuf;

use siesta::logging;
use siesta::pipeline::{self, TrainConfig};

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config = parse_args(std::env::args().skip(1).collect())?;
    let report = pipeline::run(&config).map_err(|err| err.to_string())?;
    if let Some(test) = &report.test {
        println!("test accuracy: {:.4}", test.confusion.accuracy());
    }
    println!("SIESTA trained and saved to {}", config.output_model.display());
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<TrainConfig, String> {
    let mut features_csv: Option<PathBuf> = None;
    let mut output_model: Option<PathBuf> = None;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--features_csv" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--features_csv requires a value".to_string())?;
                features_csv = Some(PathBuf::from(value));
            }
            "--output_model" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--output_model requires a value".to_string())?;
                output_model = Some(PathBuf::from(value));
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let features_csv = features_csv.ok_or_else(help_text)?;
    let output_model = output_model.ok_or_else(help_text)?;
    Ok(TrainConfig {
        features_csv,
        output_model,
    })
}

fn help_text() -> String {
    [
        "siesta-train",
        "",
        "Trains the SIESTA gradient-boosted variant classifier with a",
        "protein-aware train/test split.",
        "",
        "Usage:",
        "  siesta-train --features_csv <path> --output_model <path>",
        "",
        "Options:",
        "  --features_csv <path>   Input features in CSV format (required).",
        "  --output_model <path>   Where to save the trained model (required).",
    ]
    .join("\n")
}
