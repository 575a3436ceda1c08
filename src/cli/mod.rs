pub mod analyze;
pub mod clients;
pub mod detect;
pub mod favorites;
pub mod import;
pub mod imports;
pub mod init;
pub mod load;
pub mod matrix;
pub mod status;
pub mod years;

use chrono::Datelike;
use clap::{Parser, Subcommand};

use crate::db::db_path;
use crate::error::{Result, SalesError};
use crate::models::Client;
use crate::settings::client_or_default;
use crate::store::SqliteStore;

/// Open the configured database, refusing to create one implicitly.
pub(crate) fn open_store() -> Result<SqliteStore> {
    let path = db_path();
    if !path.exists() {
        return Err(SalesError::Settings(format!(
            "No database found at {}\nRun `salesmatrix init` to set up.",
            path.display()
        )));
    }
    SqliteStore::open(&path)
}

pub(crate) fn resolve_client(store: &SqliteStore, client: Option<String>) -> Result<Client> {
    store.find_client(&client_or_default(client)?)
}

pub(crate) fn year_or_current(year: Option<i32>) -> i32 {
    year.unwrap_or_else(|| chrono::Local::now().year())
}

#[derive(Parser)]
#[command(
    name = "salesmatrix",
    version,
    about = "Monthly sales CSV ingestion and product x month analysis."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for data (default: ~/Documents/salesmatrix)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Client used when --client is omitted
        #[arg(long = "default-client")]
        default_client: Option<String>,
    },
    /// Switch to an existing data directory.
    Load {
        /// Path to data directory containing sales.db
        path: String,
    },
    /// Show current database and summary statistics.
    Status,
    /// Manage clients.
    Clients {
        #[command(subcommand)]
        command: ClientsCommands,
    },
    /// Import monthly sales CSV files for one client and year.
    Import {
        /// CSV files; a later file replaces an earlier one for the same month
        #[arg(required = true)]
        files: Vec<String>,
        #[arg(long)]
        client: Option<String>,
        /// Defaults to the current year
        #[arg(long)]
        year: Option<i32>,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Show which month each filename resolves to, without importing.
    Detect {
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Show the product x month quantity matrix.
    Matrix {
        #[arg(long)]
        client: Option<String>,
        /// Defaults to the current year
        #[arg(long)]
        year: Option<i32>,
        /// Only products whose name or code contains this text
        #[arg(long)]
        filter: Option<String>,
        /// Only favorite products
        #[arg(long)]
        favorites: bool,
        /// Write the matrix to a CSV file instead of printing it
        #[arg(long)]
        csv: Option<String>,
    },
    /// Summary, top/bottom sellers and movers for one month.
    Analyze {
        #[arg(long)]
        client: Option<String>,
        /// Defaults to the current year
        #[arg(long)]
        year: Option<i32>,
        /// Period, e.g. "Month 03", "3" or "General"
        #[arg(long)]
        period: String,
        #[arg(long, default_value = "5")]
        limit: usize,
    },
    /// List or create years for a client.
    Years {
        #[command(subcommand)]
        command: YearsCommands,
    },
    /// Delete every sale of one month.
    DeleteMonth {
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        period: String,
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Delete a whole year of sales.
    DeleteYear {
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        year: i32,
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Manage favorite products.
    Favorites {
        #[command(subcommand)]
        command: FavoritesCommands,
    },
    /// Show the import history of a client.
    Imports {
        #[arg(long)]
        client: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ClientsCommands {
    /// Add a new client.
    Add {
        /// Client name, e.g. 'Loja Centro'
        name: String,
    },
    /// List all clients.
    List,
    /// Delete a client and all of its sales history.
    Delete {
        name: String,
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum YearsCommands {
    /// List years with data for a client.
    List {
        #[arg(long)]
        client: Option<String>,
    },
    /// Create an empty year so files can be imported into it later.
    Add {
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        year: i32,
    },
}

#[derive(Subcommand)]
pub enum FavoritesCommands {
    /// Mark a product as favorite.
    Add {
        code: String,
        #[arg(long)]
        client: Option<String>,
    },
    /// Unmark a favorite product.
    Remove {
        code: String,
        #[arg(long)]
        client: Option<String>,
    },
    /// Flip the favorite mark of a product.
    Toggle {
        code: String,
        #[arg(long)]
        client: Option<String>,
    },
    /// List favorite product codes.
    List {
        #[arg(long)]
        client: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_import_parses_files_and_flags() {
        let cli = Cli::try_parse_from([
            "salesmatrix", "import", "a.csv", "b.csv", "--client", "Loja", "--year", "2024", "-y",
        ])
        .unwrap();
        match cli.command {
            Commands::Import { files, client, year, yes } => {
                assert_eq!(files, vec!["a.csv", "b.csv"]);
                assert_eq!(client.as_deref(), Some("Loja"));
                assert_eq!(year, Some(2024));
                assert!(yes);
            }
            _ => panic!("expected import"),
        }
    }

    #[test]
    fn test_import_requires_files() {
        assert!(Cli::try_parse_from(["salesmatrix", "import", "--year", "2024"]).is_err());
    }

    #[test]
    fn test_clients_delete_parses_confirmation_flag() {
        let cli = Cli::try_parse_from(["salesmatrix", "clients", "delete", "Loja Centro", "-y"]).unwrap();
        match cli.command {
            Commands::Clients {
                command: ClientsCommands::Delete { name, yes },
            } => {
                assert_eq!(name, "Loja Centro");
                assert!(yes);
            }
            _ => panic!("expected clients delete"),
        }
    }

    #[test]
    fn test_years_add_requires_year() {
        assert!(Cli::try_parse_from(["salesmatrix", "years", "add", "--client", "Loja"]).is_err());
        let cli = Cli::try_parse_from(["salesmatrix", "years", "add", "--year", "2022"]).unwrap();
        match cli.command {
            Commands::Years {
                command: YearsCommands::Add { client, year },
            } => {
                assert_eq!(client, None);
                assert_eq!(year, 2022);
            }
            _ => panic!("expected years add"),
        }
    }

    #[test]
    fn test_year_defaults_to_current() {
        assert_eq!(year_or_current(Some(2021)), 2021);
        assert_eq!(year_or_current(None), chrono::Local::now().year());
    }
}
