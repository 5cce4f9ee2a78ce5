use anyhow::Result;
use clap::{Parser, Subcommand};
use mediasort::{
    candidate::MediaFile,
    config::{OrganizeArgs, OrganizeConfig, Settings},
    console::InquireConsole,
    organize::{RunOutcome, organize},
    tmdb::TmdbClient,
    video,
};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status when the user quits from the prompt.
const ABORT_EXIT_CODE: i32 = 3;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Match media files against TMDB and move them into a library
    Organize(OrganizeArgs),
    /// Print how file names are parsed, as JSON
    Parse {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn parse(files: &[PathBuf]) -> Result<()> {
    for path in files {
        let file = MediaFile::from_path(path).unwrap_or_else(|_| MediaFile::new(path, 0));
        println!("{}", serde_json::to_string_pretty(&video::parse(file).to_json())?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    match args.command {
        Commands::Organize(args) => {
            init_logging(args.verbose);
            let settings = Settings::from_args(args, OrganizeConfig::get_user_config()?)?;
            let client = TmdbClient::new()?;
            let mut console = InquireConsole;
            match organize(&settings, &client, &mut console).await? {
                RunOutcome::Aborted => std::process::exit(ABORT_EXIT_CODE),
                RunOutcome::Completed(_) | RunOutcome::DryRun(_) => Ok(()),
            }
        }
        Commands::Parse { files } => {
            init_logging(false);
            parse(&files)
        }
    }
}
