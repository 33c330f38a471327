use clap::{Parser, Subcommand};
use nfcscan_card::{NfcError, NfcScanner, PcscTransceiver, ScanOptions};
use nfcscan_common::{describe, TlvElement, TlvValue};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod formatters;
use formatters::mask_pan;

#[derive(Parser)]
#[command(name = "nfcscan")]
#[command(about = "Read a contactless payment card via a PC/SC reader")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Overall scan timeout in milliseconds
    #[arg(short, long, default_value_t = 60_000)]
    timeout_ms: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a card (the default)
    Scan,
    /// Decode a hex-encoded TLV stream and print the tree
    Decode {
        /// TLV data as hex
        hex: String,
        /// Tag dictionary kernel for descriptions
        #[arg(short, long, default_value = "Generic")]
        kernel: String,
    },
}

fn main() {
    // Set RUST_LOG=debug for per-command logs. Default: info level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    match args.command.unwrap_or(Command::Scan) {
        Command::Scan => scan(Duration::from_millis(args.timeout_ms)),
        Command::Decode { hex, kernel } => decode_tlv(&hex, &kernel),
    }
}

fn scan(timeout: Duration) {
    let transceiver = match PcscTransceiver::new() {
        Ok(t) => t,
        Err(err) => {
            eprintln!("Failed to establish PC/SC context: {}", err);
            std::process::exit(1);
        }
    };

    let scanner = NfcScanner::new(transceiver);
    println!("Hold a card to the reader...\n");

    match scanner.scan(&ScanOptions {
        timeout: Some(timeout),
    }) {
        Ok(result) => {
            println!("Scheme: {}", result.scheme);
            println!("Card:   {}", mask_pan(&result.pan));
            println!("Expiry: {}", result.expiry);
        }
        Err(err) => {
            match &err {
                NfcError::NotSupported | NfcError::NotEnabled => {
                    eprintln!("{}", err);
                    eprintln!("Please ensure a PC/SC reader is connected");
                }
                NfcError::ScanTimeout(_) => {
                    eprintln!("{}", err);
                    eprintln!("No card completed a read in time; try holding it steady");
                }
                _ => eprintln!("Scan failed: {}", err),
            }
            std::process::exit(1);
        }
    }
}

fn decode_tlv(hex_input: &str, kernel: &str) {
    match describe(hex_input, kernel) {
        Ok(elements) => print_elements(&elements, 0),
        Err(err) => {
            eprintln!("Decode failed: {}", err);
            std::process::exit(1);
        }
    }
}

fn print_elements(elements: &[TlvElement], depth: usize) {
    let indent = "  ".repeat(depth);
    for element in elements {
        let name = element.description.as_deref().unwrap_or("");
        match &element.value {
            TlvValue::Primitive(value) => {
                println!("{indent}[{}] {} {}", element.tag, name, value);
            }
            TlvValue::Constructed(children) => {
                println!("{indent}[{}] {}", element.tag, name);
                print_elements(children, depth + 1);
            }
        }
    }
}
