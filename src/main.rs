mod cli;
mod columns;
mod db;
mod error;
mod fmt;
mod import;
mod matrix;
mod models;
mod normalize;
mod parser;
mod period;
mod settings;
mod store;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{ClientsCommands, Cli, Commands, FavoritesCommands, YearsCommands};

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SALESMATRIX_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init {
            data_dir,
            default_client,
        } => cli::init::run(data_dir, default_client),
        Commands::Load { path } => cli::load::run(&path),
        Commands::Status => cli::status::run(),
        Commands::Clients { command } => match command {
            ClientsCommands::Add { name } => cli::clients::add(&name),
            ClientsCommands::List => cli::clients::list(),
            ClientsCommands::Delete { name, yes } => cli::clients::delete(&name, yes),
        },
        Commands::Import {
            files,
            client,
            year,
            yes,
        } => cli::import::run(&files, client, cli::year_or_current(year), yes),
        Commands::Detect { files } => cli::detect::run(&files),
        Commands::Matrix {
            client,
            year,
            filter,
            favorites,
            csv,
        } => cli::matrix::run(
            client,
            cli::year_or_current(year),
            filter.as_deref(),
            favorites,
            csv.as_deref(),
        ),
        Commands::Analyze {
            client,
            year,
            period,
            limit,
        } => cli::analyze::run(client, cli::year_or_current(year), &period, limit),
        Commands::Years { command } => match command {
            YearsCommands::List { client } => cli::years::list(client),
            YearsCommands::Add { client, year } => cli::years::add(client, year),
        },
        Commands::DeleteMonth {
            client,
            year,
            period,
            yes,
        } => cli::years::delete_month(client, year, &period, yes),
        Commands::DeleteYear { client, year, yes } => cli::years::delete_year(client, year, yes),
        Commands::Favorites { command } => match command {
            FavoritesCommands::Add { code, client } => cli::favorites::add(client, &code),
            FavoritesCommands::Remove { code, client } => cli::favorites::remove(client, &code),
            FavoritesCommands::Toggle { code, client } => cli::favorites::toggle(client, &code),
            FavoritesCommands::List { client } => cli::favorites::list(client),
        },
        Commands::Imports { client } => cli::imports::run(client),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
