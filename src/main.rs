use clap::Parser;
use csv_image_dl::{Config, Event, ImageDownloader, RunOptions, run_with_shutdown};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{EnvFilter, fmt};

/// Download the images listed in a CSV product table
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV file with an id column and a comma-separated image URL column
    input: PathBuf,

    /// Output directory (default: from config, else ./downloaded_images)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Leave each product folder as is instead of zipping it
    #[arg(long)]
    no_compress: bool,

    /// Keep product folders after zipping them
    #[arg(long)]
    keep_folders: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name of the identifier column
    #[arg(long)]
    id_column: Option<String>,

    /// Name of the image URL column
    #[arg(long)]
    image_column: Option<String>,

    /// Pause after each downloaded image, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Per-request timeout, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the run summary as JSON instead of the run log
    #[arg(long)]
    json: bool,

    /// Enable debug diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn load_config(&self) -> csv_image_dl::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };
        if let Some(column) = &self.id_column {
            config.input.id_column = column.clone();
        }
        if let Some(column) = &self.image_column {
            config.input.image_column = column.clone();
        }
        if let Some(ms) = self.delay_ms {
            config.download.request_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = self.timeout_secs {
            config.download.timeout = Duration::from_secs(secs);
        }
        if let Some(output) = &self.output {
            config.download.output_dir = output.clone();
        }
        if self.no_compress {
            config.archive.compress = false;
        }
        if self.keep_folders {
            config.archive.delete_after_compress = false;
        }
        config.validate()?;
        Ok(config)
    }
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "csv_image_dl=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    let output_dir = config.download.output_dir.clone();
    let options = RunOptions::from(&config.archive);
    let downloader = match ImageDownloader::new(config) {
        Ok(downloader) => downloader,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    let mut events = downloader.subscribe();
    let print_log = !args.json;
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(Event::Log { line }) if print_log => println!("{}", line),
                Ok(Event::Log { .. }) => {}
                Ok(Event::Status { text }) => eprintln!("{}", text),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event printer fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = run_with_shutdown(&downloader, &args.input, &output_dir, options).await;

    // Dropping the last sender lets the printer drain and exit
    drop(downloader);
    printer.await.ok();

    match result {
        Ok(summary) => {
            if args.json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            }
            if summary.cancelled {
                ExitCode::from(130)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}
