//! Score a candidate lab file against a reference and print the feedback.

use circuitlab::prelude::*;
use std::path::Path;

fn main() -> Result<(), LabError> {
    let mut args = std::env::args().skip(1);
    let (Some(reference), Some(candidate)) = (args.next(), args.next()) else {
        eprintln!("Usage: cargo run --example score_lab <reference.json> <candidate.json>");
        std::process::exit(1);
    };

    let reference = LabDocument::from_path(Path::new(&reference))?;
    let candidate = LabDocument::from_path(Path::new(&candidate))?;
    let progress = StepProgress::new(candidate.steps.len(), candidate.steps.len());

    let report = LabCore::score_documents(&reference, &candidate, progress);

    println!("Score: {}/100", report.score);
    for line in &report.feedback {
        println!("  {}", line);
    }
    for line in &report.errors {
        println!("  {}", line);
    }

    if !report.is_valid {
        std::process::exit(1);
    }
    Ok(())
}
