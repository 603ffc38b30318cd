//! Slideshow maker - command line front end.
//!
//! Needed external software: ImageMagick, ffmpeg and mkvmerge.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use directories::ProjectDirs;

use slideshow_core::config::{ConfigManager, Settings};
use slideshow_core::logging::{init_tracing, LogConfig, LogLevel, RunLogger};
use slideshow_core::models::{AudioOrder, Timecode, UnitKind};
use slideshow_core::orchestrator::{Orchestrator, SlideshowOptions};
use slideshow_core::pipeline::{LoggingObserver, ProgressObserver, StageReport};
use slideshow_core::sources::{collect_audio, collect_images, read_text_arg};
use slideshow_core::tools::{
    list_fonts, list_programs, Executables, ProcessRunner, Tool, DEFAULT_FONT,
};

#[derive(Parser, Debug)]
#[command(
    name = "slideshow",
    version,
    about = "Create slideshows with transitions, title slide and music from any number of images as MKV file.",
    after_help = "Needed external software: ImageMagick, ffmpeg, mkvmerge"
)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a slideshow with the given parameters
    #[command(
        visible_alias = "sl",
        after_help = "You can prefix the values for title and epilog with an @ to indicate that the value is a file."
    )]
    Slideshow(SlideshowArgs),

    /// Build a slideshow from a buildfile
    #[command(visible_alias = "b")]
    Build(BuildArgs),

    /// Create a default buildfile
    #[command(visible_alias = "bf")]
    Buildfile(BuildfileArgs),

    /// List fonts known by your convert program
    #[command(visible_alias = "lf")]
    ListFonts(ListFontsArgs),

    /// Try to find the needed external programs and list them
    #[command(visible_alias = "lp")]
    ListProgs(ToolArgs),
}

#[derive(Args, Debug)]
struct SlideshowArgs {
    /// Images or image folders. Prefix folders with + to search them
    /// recursively, prefix a file with @ to read entries from it (one per line)
    #[arg(required = true, num_args = 1..)]
    images: Vec<String>,

    /// Audio files or folders, with the same prefixes as images
    #[arg(short = 'a', long = "audio-files", num_args = 1..)]
    audio_files: Vec<String>,

    /// Output profile: dvd, 720p, 1080p, uhd, 4k
    #[arg(short, long, default_value = "1080p")]
    profile: String,

    /// Seconds each image is shown
    #[arg(long, default_value_t = 5)]
    image_duration: u32,

    /// Seconds of the transition between two images
    #[arg(long, default_value_t = 1)]
    transition_duration: u32,

    /// Font name or path to a .ttf file
    #[arg(short, long, default_value = DEFAULT_FONT)]
    font: String,

    /// Title shown on the first slide
    #[arg(short, long, default_value = "")]
    title: String,

    /// Author shown on the last slide
    #[arg(short = 'A', long, default_value = "")]
    author: String,

    /// Epilog shown on the last slide (use `\n` for line breaks)
    #[arg(short, long, default_value = "")]
    epilog: String,

    /// Color behind text and images
    #[arg(long, default_value = "black")]
    background: String,

    /// Color of the text
    #[arg(long, default_value = "white")]
    textcolor: String,

    /// Directory for temporary files (default: system temp dir)
    #[arg(short, long)]
    workdir: Option<PathBuf>,

    /// Keep temporary files when all work is done
    #[arg(short, long)]
    keep_tempfiles: bool,

    /// Order audio segments by generated file name instead of input order
    #[arg(long)]
    legacy_audio_order: bool,

    /// Name (and path) of the final output file
    #[arg(short, long, default_value = "slideshow.mkv")]
    output: PathBuf,

    /// Write a run log; to the per-user data folder unless --log-dir is given
    #[arg(long)]
    log: bool,

    /// Folder for the run log
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(flatten)]
    tools: ToolArgs,
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// TOML buildfile
    buildfile: PathBuf,
}

#[derive(Args, Debug)]
struct BuildfileArgs {
    /// Name of the buildfile
    #[arg(short, long, default_value = "slideshow_build.toml")]
    output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug)]
struct ListFontsArgs {
    /// Path to the convert binary
    #[arg(long)]
    convert: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
struct ToolArgs {
    /// Path to the convert binary
    #[arg(long)]
    convert: Option<PathBuf>,
    /// Path to the montage binary
    #[arg(long)]
    montage: Option<PathBuf>,
    /// Path to the mogrify binary
    #[arg(long)]
    mogrify: Option<PathBuf>,
    /// Path to the ffmpeg binary
    #[arg(long)]
    ffmpeg: Option<PathBuf>,
    /// Path to the mkvmerge binary
    #[arg(long)]
    mkvmerge: Option<PathBuf>,
}

impl ToolArgs {
    fn executables(&self) -> Executables {
        Executables::default()
            .with_opt(Tool::Convert, self.convert.clone())
            .with_opt(Tool::Montage, self.montage.clone())
            .with_opt(Tool::Mogrify, self.mogrify.clone())
            .with_opt(Tool::Ffmpeg, self.ffmpeg.clone())
            .with_opt(Tool::Mkvmerge, self.mkvmerge.clone())
    }
}

/// Prints stage reports and a spinner while builders run, and forwards
/// everything to the run log.
struct ConsoleObserver {
    log: LoggingObserver,
    tick: AtomicUsize,
}

impl ConsoleObserver {
    fn new(logger: Arc<RunLogger>) -> Self {
        Self {
            log: LoggingObserver::new(logger),
            tick: AtomicUsize::new(0),
        }
    }
}

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

impl ProgressObserver for ConsoleObserver {
    fn stage_finished(&self, unit: UnitKind, report: &StageReport) {
        self.log.stage_finished(unit, report);
        println!("{}", report);
    }

    fn unit_finished(&self, unit: UnitKind, elapsed: Duration) {
        self.log.unit_finished(unit, elapsed);
    }

    fn waiting(&self) {
        let n = self.tick.fetch_add(1, Ordering::Relaxed);
        eprint!("{}\r", SPINNER[n % SPINNER.len()]);
        let _ = std::io::stderr().flush();
    }

    fn run_finished(&self, output: &Path, elapsed: Duration) {
        self.log.run_finished(output, elapsed);
        println!("Wrote {}", output.display());
        println!(
            "Duration of the whole process: {}",
            Timecode::from(elapsed).whole_seconds()
        );
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    });
    tracing::debug!("slideshow_core {}", slideshow_core::version());

    match cli.cmd {
        Command::Slideshow(args) => cmd_slideshow(args, cli.verbose),
        Command::Build(args) => cmd_build(args),
        Command::Buildfile(args) => cmd_buildfile(args),
        Command::ListFonts(args) => cmd_list_fonts(args),
        Command::ListProgs(args) => cmd_list_progs(args),
    }
}

fn cmd_slideshow(args: SlideshowArgs, verbose: bool) -> anyhow::Result<()> {
    let images = collect_images(&args.images).context("collect images")?;
    let audio = collect_audio(&args.audio_files).context("collect audio files")?;

    let options = SlideshowOptions {
        image_duration: args.image_duration,
        transition_duration: args.transition_duration,
        font: args.font,
        title: read_text_arg(&args.title).context("read title")?,
        author: args.author,
        epilog: read_text_arg(&args.epilog)
            .context("read epilog")?
            .replace("\\n", "\n"),
        background: args.background,
        textcolor: args.textcolor,
        audio_order: if args.legacy_audio_order {
            AudioOrder::GeneratedName
        } else {
            AudioOrder::Input
        },
        output: args.output,
        workdir: args.workdir,
        remove_tempfiles: !args.keep_tempfiles,
        executables: args.tools.executables(),
        ..SlideshowOptions::default()
    }
    .with_profile(&args.profile)?;

    let log_dir = match (args.log_dir, args.log) {
        (Some(dir), _) => Some(dir),
        (None, true) => Some(default_log_dir()?),
        (None, false) => None,
    };
    let config = if verbose {
        LogConfig::debug()
    } else {
        LogConfig::default()
    };
    run(images, audio, &options, log_dir.as_deref(), config)
}

fn cmd_build(args: BuildArgs) -> anyhow::Result<()> {
    let mut manager = ConfigManager::new(&args.buildfile);
    manager
        .load()
        .with_context(|| format!("load buildfile '{}'", args.buildfile.display()))?;
    let settings: Settings = manager.into_settings();

    let images = collect_images(&settings.sources.images).context("collect images")?;
    let audio = collect_audio(&settings.sources.audio).context("collect audio files")?;
    let options = SlideshowOptions::from_settings(&settings)?;
    let log_dir = settings.paths.logs_folder();
    run(
        images,
        audio,
        &options,
        log_dir.as_deref(),
        settings.logging.to_log_config(),
    )
}

fn run(
    images: Vec<PathBuf>,
    audio: Vec<PathBuf>,
    options: &SlideshowOptions,
    log_dir: Option<&Path>,
    config: LogConfig,
) -> anyhow::Result<()> {
    let run_name = format!("slideshow-{}", Local::now().format("%Y%m%d-%H%M%S"));
    let logger = Arc::new(
        RunLogger::new(run_name, log_dir, config, None).context("create run log")?,
    );
    if let Some(path) = logger.log_path() {
        println!("Logging to {}", path.display());
    }

    let runner = Arc::new(ProcessRunner::new(logger.clone()));
    let report = Orchestrator::new(runner)
        .with_logger(logger.clone())
        .with_observer(Arc::new(ConsoleObserver::new(logger.clone())))
        .run(images, audio, options);
    logger.flush();

    let report = report?;
    for kept in &report.kept_workspaces {
        println!("Temporary files kept in {}", kept.display());
    }
    Ok(())
}

fn cmd_buildfile(args: BuildfileArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        bail!(
            "'{}' already exists, use --force to overwrite it",
            args.output.display()
        );
    }
    ConfigManager::new(&args.output)
        .save()
        .with_context(|| format!("write buildfile '{}'", args.output.display()))?;
    println!("Wrote {}", args.output.display());
    Ok(())
}

fn cmd_list_fonts(args: ListFontsArgs) -> anyhow::Result<()> {
    let exes = Executables::default().with_opt(Tool::Convert, args.convert);
    let runner = ProcessRunner::new(Arc::new(RunLogger::disabled()));
    let fonts = list_fonts(&runner, &exes).context("list fonts")?;

    for font in &fonts {
        println!("{}", font);
    }
    let found = if fonts.iter().any(|f| f == DEFAULT_FONT) {
        "available"
    } else {
        "NOT available"
    };
    println!();
    println!("Default font {} is {}", DEFAULT_FONT, found);
    Ok(())
}

fn cmd_list_progs(args: ToolArgs) -> anyhow::Result<()> {
    for (tool, path) in list_programs(&args.executables()) {
        match path {
            Some(p) => println!("{:<9} {}", tool.name(), p.display()),
            None => println!("{:<9} not found", tool.name()),
        }
    }
    Ok(())
}

fn default_log_dir() -> anyhow::Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "slideshow")
        .context("no home directory to place the run log in")?;
    Ok(dirs.data_local_dir().join("logs"))
}
