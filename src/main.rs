use anyhow::Context;
use clap::Parser;
use framestalker::debugger::DebuggerBuilder;
use framestalker::snapshot::SnapshotTarget;
use framestalker::ui::config::{self, OutputFormat};
use framestalker::ui::console::{self, AppBuilder};
use framestalker::ui::print;
use std::path::PathBuf;
use std::process::exit;

/// Stack frame navigator over a snapshot of a stopped process.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a snapshot (TOML) of a stopped target.
    snapshot: PathBuf,

    /// Configuration file, `~/.config/fstk/config.toml` by default.
    #[arg(long, env = "FSTK_CONFIG")]
    config: Option<PathBuf>,

    /// Output format: text or json.
    #[arg(long)]
    output: Option<OutputFormat>,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,

    /// Stop unwinding after this number of frames.
    #[arg(long)]
    max_unwind_depth: Option<u32>,

    /// Number of frames examined when a frame is selected by address.
    #[arg(long)]
    address_search_limit: Option<u32>,

    /// Disable logging.
    #[arg(short, long)]
    quiet: bool,

    /// Log level (overrides RUST_LOG).
    #[arg(long)]
    log_level: Option<log::LevelFilter>,

    /// Execute commands in batch mode and exit, may be repeated.
    #[arg(short = 'x', long = "command")]
    commands: Vec<String>,
}

fn main() {
    let args = Args::parse();
    match run(args) {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            exit(1);
        }
    }
}

fn run(args: Args) -> anyhow::Result<i32> {
    console::init_logger(args.log_level);
    if args.quiet {
        framestalker::log::disable();
    }

    let mut ui_config = config::load(args.config.as_deref())?;
    if let Some(output) = args.output {
        ui_config.output = output;
    }
    if args.no_color {
        ui_config.color = false;
    }
    if let Some(depth) = args.max_unwind_depth {
        ui_config.max_unwind_depth = depth;
    }
    if let Some(limit) = args.address_search_limit {
        ui_config.address_search_limit = limit;
    }
    // colors make no sense in a json output
    print::set_colored(ui_config.color && ui_config.output == OutputFormat::Text);
    config::set(ui_config);
    let ui_config = config::current();

    let target = SnapshotTarget::from_file(&args.snapshot)
        .with_context(|| format!("load snapshot {}", args.snapshot.display()))?;
    let mut debugger = DebuggerBuilder::new()
        .with_max_unwind_depth(ui_config.max_unwind_depth)
        .with_address_search_limit(ui_config.address_search_limit)
        .build(target);

    if !args.commands.is_empty() {
        return Ok(console::run_batch(
            &mut debugger,
            &args.commands,
            ui_config.output,
        ));
    }

    let app = AppBuilder::new(ui_config.clone()).build(debugger)?;
    app.run()?;
    Ok(0)
}
