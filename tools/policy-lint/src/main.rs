//! policy-lint: validate a repository policy document
//!
//! Usage:
//!   policy-lint <policy.json>      # print every schema problem
//!   policy-lint <policy.json> -q   # quiet: exit code only
//!
//! Exit codes: 0 valid, 1 invalid, 2 usage or I/O error.

use std::env;
use std::fs;
use std::process;

use compliance_engine::policy::PolicyDocument;

fn load_document(path: &str) -> PolicyDocument {
    let contents = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("policy-lint: cannot read {}: {}", path, e);
        process::exit(2);
    });
    serde_json::from_str(&contents).unwrap_or_else(|e| {
        eprintln!("policy-lint: invalid JSON in {}: {}", path, e);
        process::exit(2);
    })
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let quiet = args.iter().any(|a| a == "-q" || a == "--quiet");
    let files: Vec<_> = args.iter().filter(|a| !a.starts_with('-')).skip(1).collect();

    if files.len() != 1 {
        eprintln!("Usage: policy-lint <policy.json> [-q|--quiet]");
        eprintln!("  -q  Quiet: only exit code (0=valid, 1=invalid)");
        process::exit(2);
    }

    let document = load_document(files[0]);
    let problems = document.lint();

    if quiet {
        process::exit(if problems.is_empty() { 0 } else { 1 });
    }

    if problems.is_empty() {
        println!("OK: {} templates, {} exceptions", document.templates.len(), document.exceptions.len());
        process::exit(0);
    }

    for (field, reason) in &problems {
        println!("! {}: {}", field, reason);
    }

    process::exit(1);
}
