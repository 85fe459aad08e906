mod api;
mod cli;
mod commands;
mod error;
mod structs;
mod util;

use std::{env, process};

use clap::Parser;
use cli::Args;
use log::{debug, LevelFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    let code = tokio::select! {
        res = commands::run(args) => match res {
            Ok(()) => 0,
            Err(err) if err.is_user_facing() => {
                eprintln!("{}", err);
                2
            }
            Err(err) => {
                eprintln!("error: {}", err);
                1
            }
        },
        Ok(()) = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted");
            // exiting skips TempDir cleanup of an install in progress
            debug!("unfinished work folders may be left at {}", commands::install::work_dir_pattern().display());
            130
        }
    };

    process::exit(code);
}

fn init_logging(debug: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(if debug { LevelFilter::Debug } else { LevelFilter::Warn });
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}
