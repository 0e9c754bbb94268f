//! Binary entrypoint: read one JSON object from stdin, write one to stdout.

use chrono::Utc;
use risk_engine::types::ErrorOutput;
use risk_engine::{run, Input};
use std::io::{self, Read, Write};

fn main() {
  if let Err(e) = run_binary() {
    let err = ErrorOutput::new(e.to_string());
    let _ = serde_json::to_writer(io::stdout(), &err);
    let _ = writeln!(io::stdout());
    std::process::exit(1);
  }
}

fn run_binary() -> Result<(), Box<dyn std::error::Error>> {
  let mut raw = String::new();
  io::stdin().lock().read_to_string(&mut raw)?;
  let input: Input = serde_json::from_str(&raw)?;

  let assessed_at = input.assessed_at.unwrap_or_else(Utc::now);
  let report = run(&input, assessed_at)?;

  let json = serde_json::to_vec(&report)?;
  io::stdout().write_all(&json)?;
  Ok(())
}
