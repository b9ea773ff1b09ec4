#![forbid(unsafe_code)]

use clap::Parser;

fn main() {
    let cli = slidefence_cli::Cli::parse();
    let json = cli.json;
    slidefence_cli::logging::init();
    if let Err(error) = slidefence_cli::run(cli) {
        if json {
            eprintln!(
                "{}",
                serde_json::json!({
                    "status": "error",
                    "error": error.to_string(),
                    "exit_code": error.exit_code(),
                })
            );
        } else {
            eprintln!("{error}");
        }
        std::process::exit(error.exit_code());
    }
}
