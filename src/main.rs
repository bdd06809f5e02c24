use clap::Parser;
use picker_select::cli::commands::{
    PairArgs, SelectArgs, cmd_pair, cmd_reconstruct, cmd_select, open_session, open_tracer,
};
use picker_select::cli::config::{Cli, Commands, apply_overrides, load_config};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = apply_overrides(load_config(cli.config.as_deref()), &cli);
    let tracer = open_tracer(&config);
    let mut session = open_session(cli.snapshot.as_deref(), &config)?;

    let succeeded = match cli.command {
        Commands::Reconstruct { threshold } => {
            cmd_reconstruct(session.as_mut(), &config, threshold)?;
            true
        }
        Commands::Select {
            field,
            open,
            index,
            exclude_index,
            exclude_name,
            section_exit,
            seed,
        } => {
            let args = SelectArgs {
                field,
                open,
                index,
                exclude_index,
                exclude_name,
                section_exit,
                seed,
            };
            let outcome = cmd_select(session.as_mut(), &config, args, &tracer)?;
            outcome.selection.is_selected()
        }
        Commands::Pair {
            source_field,
            source_open,
            target_field,
            target_open,
            seed,
        } => {
            let args = PairArgs {
                source_field,
                source_open,
                target_field,
                target_open,
                seed,
            };
            let outcome = cmd_pair(session.as_mut(), &config, args, &tracer)?;
            outcome.source.selection.is_selected() && outcome.target.selection.is_selected()
        }
    };

    // Close the driver session before a failing exit skips destructors.
    drop(session);
    if !succeeded {
        std::process::exit(1);
    }

    Ok(())
}
