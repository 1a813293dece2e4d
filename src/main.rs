use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand};

use fix_demos::bounded_copy::run_bounded_copy;
use fix_demos::guarded_counter::{
    CounterConfig, CounterMode, DEFAULT_INCREMENTS, DEFAULT_WORKERS, run_guarded_counter,
};
use fix_demos::host_check::run_ping;
use fix_demos::login::{LoginMode, run_login};

#[derive(Parser)]
#[clap(author, version, about = "Defect-vs-fix demos", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a token from stdin and copy it into a 10-byte buffer
    Copy,

    /// Increment a shared counter from several threads
    Count {
        /// Number of worker threads
        #[clap(long, default_value_t = DEFAULT_WORKERS)]
        workers: usize,

        /// Increments performed by each worker
        #[clap(long, default_value_t = DEFAULT_INCREMENTS)]
        increments: u64,

        /// How the workers share the counter
        #[clap(long, value_enum, default_value = "guarded")]
        mode: CounterMode,
    },

    /// Ping a validated hostname without going through a shell
    Ping {
        /// Hostname or IP address
        host: String,
    },

    /// Log in against a seeded in-memory user table
    Login {
        #[clap(long)]
        username: String,

        #[clap(long)]
        password: String,

        /// Formatted query or bound parameters
        #[clap(long, value_enum, default_value = "secure")]
        mode: LoginMode,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Copy => {
            let mut stdin = io::stdin().lock();
            run_bounded_copy(&mut stdin, &mut stdout)?;
        }
        Commands::Count {
            workers,
            increments,
            mode,
        } => {
            let config = CounterConfig {
                workers,
                increments,
                mode,
            };
            run_guarded_counter(&config, &mut stdout)?;
        }
        Commands::Ping { host } => {
            run_ping(&host, &mut stdout)?;
        }
        Commands::Login {
            username,
            password,
            mode,
        } => {
            run_login(mode, &username, &password, &mut stdout)?;
        }
    }

    Ok(())
}
