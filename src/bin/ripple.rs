use clap::Parser;
use ripple::cli::{InputEvent, InputSignal, Repl};
use ripple::config::EngineConfig;
use ripple::model::MemoryStore;
use ripple::scheduler::{BroadcastSink, OutputEvent, Scheduler};
use ripple::{RippleResult, Session};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::{BroadcastStream, LinesStream};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "ripple.json")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(cli: &Cli) -> RippleResult<EngineConfig> {
    if cli.config.exists() {
        Ok(EngineConfig::from_file(&cli.config)?)
    } else {
        Ok(EngineConfig::default())
    }
}

fn init_tracing(cli: &Cli, config: &EngineConfig) {
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints solutions and messages to stdout and errors to stderr.
fn spawn_printer(sink: &BroadcastSink) -> tokio::task::JoinHandle<()> {
    let (output_rx, error_rx) = sink.receivers();
    let mut output = BroadcastStream::new(output_rx);
    let mut errors = BroadcastStream::new(error_rx);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(event) = output.next() => match event {
                    Ok(OutputEvent::Solution { index, stack, .. }) => {
                        println!("  [{}] {}", index + 1, stack.display_stack());
                    }
                    Ok(OutputEvent::Message { text, .. }) => println!("  {}", text),
                    Ok(OutputEvent::Error(_)) => {}
                    Err(e) => warn!("output dropped: {}", e),
                },
                Some(report) = errors.next() => match report {
                    Ok(report) => {
                        eprintln!("Error: {}", report.message);
                        for cause in &report.causes {
                            eprintln!("  caused by: {}", cause);
                        }
                    }
                    Err(e) => warn!("error report dropped: {}", e),
                },
                else => break,
            }
        }
    })
}

async fn run(cli: &Cli, config: EngineConfig) -> RippleResult<()> {
    debug!("config: {:?}", config);

    let session = Session::standard(MemoryStore::new().connection(), config)?;
    let sink = Arc::new(BroadcastSink::new(session.config().output_buffer_size));
    let printer = spawn_printer(&sink);
    let scheduler = Scheduler::start(sink.clone(), session.config());
    let repl = Repl::new(session, scheduler.queue().clone(), sink);
    info!("ripple started (verbose: {})", cli.verbose);

    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    loop {
        let event = tokio::select! {
            line = lines.next() => match line {
                Some(line) => InputEvent::Line(line?),
                None => InputEvent::EndOfInput,
            },
            interrupt = tokio::signal::ctrl_c() => {
                interrupt?;
                InputEvent::Interrupt
            }
        };
        match repl.handle_event(event).await {
            InputSignal::Quit => break,
            InputSignal::Escape => println!("  (stopped)"),
            InputSignal::Continue | InputSignal::Newline => {}
        }
    }

    // Failures were already reported through the sink.
    if let Err(e) = scheduler.queue().wait_until_finished().await {
        debug!("last failure: {}", e);
    }
    scheduler.shutdown().await?;

    // Dropping the last sink handles closes the channels and ends the printer.
    drop(repl);
    drop(scheduler);
    if let Err(e) = printer.await {
        warn!("printer task failed: {}", e);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&cli, &config);

    if let Err(e) = run(&cli, config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
