//! CLI tool to validate and inspect Nix expression files.

use std::fs;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Initialize tracing if NIXPARSE_LOG is set
    if let Ok(filter) = EnvFilter::try_from_env("NIXPARSE_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        eprintln!("Usage: nixparse <command> [files...]");
        eprintln!();
        eprintln!("Commands:");
        eprintln!("  validate  Check if file(s) parse");
        eprintln!("  tokens    Print the token stream of file(s)");
        eprintln!("  ast       Print the syntax tree of file(s)");
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  nixparse validate default.nix");
        eprintln!("  nixparse tokens flake.nix");
        eprintln!("  NIXPARSE_LOG=trace nixparse ast shell.nix");
        return ExitCode::from(2);
    }

    let command = args[1].as_str();
    let files = &args[2..];

    if !matches!(command, "validate" | "tokens" | "ast") {
        eprintln!("Unknown command: {command}");
        return ExitCode::from(2);
    }

    if files.is_empty() {
        eprintln!("Error: no files specified");
        return ExitCode::from(2);
    }

    let mut had_error = false;

    for path in files {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{path}: {e}");
                had_error = true;
                continue;
            }
        };

        tracing::debug!(path = %path, bytes = content.len(), "read file");

        let result = match command {
            "validate" => nixparse::parse(&content).map(|_| eprintln!("{path}: valid")),
            "tokens" => nixparse::lex(&content)
                .map(|tokens| print_tokens(&tokens))
                .map_err(nixparse::Error::from),
            _ => nixparse::parse(&content).map(|root| println!("{root:#?}")),
        };

        if let Err(e) = result {
            eprintln!("{path}: {e}");
            had_error = true;
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_tokens(tokens: &[nixparse::Token]) {
    for token in tokens {
        let start = token.span.start;
        let end = token.span.end;
        println!(
            "{}:{}-{}:{}\t{}",
            start.line, start.column, end.line, end.column, token.kind
        );
    }
}
