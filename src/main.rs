use anyhow::{Context, Result};
use env_logger::Builder;
use log::{info, LevelFilter};
use solana_idl_clientgen::generator::save_client;
use solana_idl_clientgen::load_and_compile;
use solana_pubkey::Pubkey;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

fn print_usage(program: &str) {
    println!("Solana IDL Client Generator v{}", solana_idl_clientgen::VERSION);
    println!("\nUsage:");
    println!("  {} <IDL_PATH> [--output DIR] [--program-id ID] [--print]", program);
    println!("  {} --version", program);
    println!("\nOptions:");
    println!("  --output, -o DIR        Write <name>.rs and <name>.schema.json to DIR (default: .)");
    println!("  --program-id, -p ID     Program address, overrides metadata.address in the IDL");
    println!("  --print                 Print the generated source instead of writing files");
    println!("  --version, -v           Show version information");
    println!("\nSet RUST_LOG to adjust verbosity.");
}

// Simple CLI without clap
fn main() -> Result<()> {
    Builder::new()
        .format(|buf, record| {
            let secs = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            writeln!(buf, "{} [{}] - {}", secs, record.level(), record.args())
        })
        .filter(None, LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("solana-idl-clientgen");

    if args.len() > 1 && (args[1] == "--version" || args[1] == "-v") {
        println!("Solana IDL Client Generator v{}", solana_idl_clientgen::VERSION);
        return Ok(());
    }

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(program);
        return Ok(());
    }

    let idl_path = PathBuf::from(&args[1]);
    let mut output_dir = PathBuf::from(".");
    let mut program_id = None;
    let mut print = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--output" | "-o" => {
                let value = args.get(i + 1).context("Missing value for --output")?;
                output_dir = PathBuf::from(value);
                i += 2;
            }
            "--program-id" | "-p" => {
                let value = args.get(i + 1).context("Missing value for --program-id")?;
                let id = Pubkey::from_str(value)
                    .with_context(|| format!("Invalid program id: {}", value))?;
                program_id = Some(id);
                i += 2;
            }
            "--print" => {
                print = true;
                i += 1;
            }
            other => {
                println!("Unknown argument: {}", other);
                i += 1;
            }
        }
    }

    info!("Reading IDL from {}", idl_path.display());
    let schema = load_and_compile(&idl_path, program_id)
        .with_context(|| format!("Failed to compile {}", idl_path.display()))?;

    if print {
        print!("{}", schema.render());
        return Ok(());
    }

    let written = save_client(&schema, &output_dir)?;
    println!("Generated client for program: {} ({})", schema.name, schema.program_id);
    for path in written {
        println!("  {}", path.display());
    }

    Ok(())
}
