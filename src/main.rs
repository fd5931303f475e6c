use clap::Parser;
use purr::{Args, cli, config, logging, tui};
use std::io::IsTerminal;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = config::load_config(args.config.as_deref())?.merge_args(&args);

    // Determine if we should run in CLI mode:
    // --cli flag, -c/-i, or piped stdin
    let is_piped = !std::io::stdin().is_terminal();
    let cli_mode = args.wants_cli(is_piped);
    logging::init(&config, !cli_mode)?;

    if cli_mode {
        if !cli::run(args, config)? {
            std::process::exit(1);
        }
    } else {
        tui::run(config)?;
    }

    Ok(())
}
