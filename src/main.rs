use clap::{Args, Parser, Subcommand};
use rechat_dl::config::Config;
use rechat_dl::downloader::{DownloadProgress, download_video};
use rechat_dl::render::{RenderOptions, format_offset};
use rechat_dl::utils::{default_download_path, has_wildcards, parse_video_id};
use rechat_dl::{
    Error, ProcessOptions, Result, process_file_interruptible, process_pattern_interruptible,
    run_blocking_with_shutdown, run_with_shutdown,
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, env = "RECHAT_DL_CONFIG")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download the chat of a video into a JSON file
    Download(DownloadArgs),
    /// Convert downloaded JSON files into transcripts
    Process(ProcessArgs),
}

#[derive(Args, Debug)]
struct DownloadArgs {
    /// Video id (123456, v123456) or video URL
    video: String,

    /// Output file (default: <video id>.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replace existing files
    #[arg(short = 'y', long)]
    overwrite: bool,

    /// Also write a transcript next to the JSON file
    #[arg(short, long)]
    process: bool,

    /// Show role badges in the transcript
    #[arg(short = 'b', long)]
    show_badges: bool,
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// JSON file, or a glob pattern (*, ?, [...])
    input: String,

    /// Output file (default: input with a .txt extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replace existing files
    #[arg(short = 'y', long)]
    overwrite: bool,

    /// Show role badges
    #[arg(short = 'b', long)]
    show_badges: bool,

    /// Omit milliseconds from timestamps
    #[arg(long)]
    no_millis: bool,
}

// --- Entry ---

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version also arrive here, on stdout
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(code = e.code(), error = ?e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    match cli.command {
        Command::Download(args) => download(&config, args).await,
        Command::Process(args) => process(&config, args).await,
    }
}

// --- Commands ---

async fn download(config: &Config, args: DownloadArgs) -> Result<()> {
    let video_id = parse_video_id(&args.video)?;
    let output = args
        .output
        .unwrap_or_else(|| default_download_path(&video_id));

    let result = run_with_shutdown(download_video(
        config,
        &video_id,
        &output,
        args.overwrite,
        print_progress,
    ))
    .await;
    // Finish the progress line
    eprintln!();
    let summary = result?;

    for warning in &summary.warnings {
        eprintln!("Warning: {}", warning);
    }
    println!(
        "Saved {} ({} comments, {} pages)",
        summary.path.display(),
        summary.comments,
        summary.pages
    );

    if args.process {
        let options = ProcessOptions {
            overwrite: args.overwrite,
            render: RenderOptions {
                show_badges: args.show_badges || config.transcript.show_badges,
                ..RenderOptions::from(&config.transcript)
            },
        };
        let input = summary.path.clone();
        let transcript = run_blocking_with_shutdown(move |interrupted| {
            process_file_interruptible(&input, None, &options, interrupted)
        })
        .await?;
        println!(
            "Saved {} ({} lines)",
            transcript.output.display(),
            transcript.lines
        );
    }
    Ok(())
}

async fn process(config: &Config, args: ProcessArgs) -> Result<()> {
    let defaults = RenderOptions::from(&config.transcript);
    let options = ProcessOptions {
        overwrite: args.overwrite,
        render: RenderOptions {
            show_badges: args.show_badges || defaults.show_badges,
            include_milliseconds: defaults.include_milliseconds && !args.no_millis,
        },
    };

    let ProcessArgs { input, output, .. } = args;
    let summaries = if has_wildcards(&input) {
        if output.is_some() {
            return Err(Error::Config {
                message: "--output cannot be combined with a wildcard pattern".into(),
                key: None,
            });
        }
        run_blocking_with_shutdown(move |interrupted| {
            process_pattern_interruptible(&input, &options, interrupted)
        })
        .await?
    } else {
        let input = PathBuf::from(input);
        let summary = run_blocking_with_shutdown(move |interrupted| {
            process_file_interruptible(&input, output.as_deref(), &options, interrupted)
        })
        .await?;
        vec![summary]
    };

    for summary in summaries {
        println!(
            "Saved {} ({} lines)",
            summary.output.display(),
            summary.lines
        );
    }
    Ok(())
}

fn print_progress(progress: &DownloadProgress) {
    let mut stderr = std::io::stderr().lock();
    let _ = match progress.last_offset {
        Some(offset) => write!(
            stderr,
            "\rDownloaded page {} ({})",
            progress.pages,
            format_offset(offset, false)
        ),
        None => write!(stderr, "\rDownloaded page {}", progress.pages),
    };
    let _ = stderr.flush();
}
