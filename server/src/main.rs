use clap::ArgAction;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use log::{error, warn};
use schoolplan_server::cli;
use schoolplan_server::cli_error::CliError;

fn main() {
    let args = CliArgs::parse();
    let dotenv_result = dotenv();

    let env = env_logger::Env::new().filter_or(
        "RUST_LOG",
        match args.global_opts.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        },
    );
    env_logger::Builder::from_env(env).init();
    if let Err(e) = dotenv_result {
        warn!("Could not read .env file: {}", e);
    }

    if let Err(e) = run_command(args.command) {
        error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

fn run_command(command: Command) -> Result<(), CliError> {
    match command {
        Command::Serve => schoolplan_server::web::serve(),
        Command::MigrateDatabase => cli::database_migration::run_migrations(),
        Command::CheckMigrations => cli::database_migration::check_migration_state(),
        Command::SeedSampleData => cli::sample_data::seed_sample_data(),
        Command::PrintRoomSchedule { room_id } => {
            cli::manage_events::print_room_schedule(room_id)
        }
    }
}

/// Backend for scheduling lessons of teachers in the rooms of a school
#[derive(Debug, Parser)]
#[clap(name = "schoolplan", version)]
pub struct CliArgs {
    #[clap(flatten)]
    global_opts: GlobalOpts,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the scheduling HTTP API
    Serve,
    /// Apply all pending database schema migrations
    MigrateDatabase,
    /// Check if the database schema is up to date
    CheckMigrations,
    /// Create sample teachers, lessons, rooms and events in the database
    SeedSampleData,
    /// Print all events of a room as a table
    PrintRoomSchedule {
        /// Id of the room
        room_id: i32,
    },
}

#[derive(Debug, Args)]
struct GlobalOpts {
    /// Verbosity level (can be specified multiple times)
    #[clap(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,
}
