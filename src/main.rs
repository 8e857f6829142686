#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;

use dvi_core::font::NullFontManager;
use dvisvgm::config::{BboxFormat, Config, TraceMode};
use dvisvgm::driver::Driver;
use dvisvgm::hash::NullPageHasher;
use dvisvgm::special::SpecialManager;

fn main() {
    if let Err(e) = process() {
        eprintln!("Error: {}.", e);
        std::process::exit(1);
    }
}

fn process() -> Result<(), String> {
    let mut args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            println!("{}", HELP);
            return Err(e);
        }
    };

    if !args.quiet {
        if let Ok(()) = log::set_logger(&LOGGER) {
            log::set_max_level(if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Warn });
        }
    }

    let data = std::fs::read(&args.input).map_err(|e| format!("failed to read '{}': {}", args.input.display(), e))?;

    let config = Config {
        bbox_format: args.bbox_format.take().unwrap_or_default(),
        trace_mode: args.trace_mode,
        compute_progress: args.compute_progress,
        hash_algorithm_name: args.hash_algorithm_name.take(),
        ignore_specials_list: args.ignore_specials_list.clone(),
        page_range_expression: args.pages.clone(),
        transform_commands: args.transform.take(),
        quiet: args.quiet,
        verbose: args.verbose,
    };

    let specials = SpecialManager::new();
    let hasher: Box<dyn dvisvgm::hash::PageHasher> = Box::new(NullPageHasher);
    let mut driver = Driver::new(&config, specials, hasher);
    let mut fonts = NullFontManager::default();

    let pages = driver.run(data, &mut fonts).map_err(|e| e.to_string())?;

    match args.output {
        Some(dir) => {
            std::fs::create_dir_all(&dir).map_err(|e| e.to_string())?;
            for page in &pages {
                let path = dir.join(format!("page-{}.svg", page.number));
                std::fs::write(&path, &page.svg).map_err(|e| e.to_string())?;
            }
        }
        None => {
            for page in &pages {
                println!("{}", page.svg);
            }
        }
    }

    Ok(())
}

struct CliArgs {
    bbox_format: Option<String>,
    trace_mode: Option<String>,
    compute_progress: bool,
    hash_algorithm_name: Option<String>,
    ignore_specials_list: Option<String>,
    pages: Option<String>,
    transform: Option<String>,
    quiet: bool,
    verbose: bool,
    input: String,
    output: Option<String>,
}

fn collect_args() -> Result<CliArgs, pico_args::Error> {
    let mut input = pico_args::Arguments::from_env();

    if input.contains("--help") {
        print!("{}", HELP);
        std::process::exit(0);
    }
    if input.contains(["-V", "--version"]) {
        println!("{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    Ok(CliArgs {
        bbox_format: input.opt_value_from_str("--bbox-format")?,
        trace_mode: input.opt_value_from_str("--trace-mode")?,
        compute_progress: input.contains("--compute-progress"),
        hash_algorithm_name: input.opt_value_from_str("--hash-algorithm")?,
        ignore_specials_list: input.opt_value_from_str("--ignore-specials")?,
        pages: input.opt_value_from_str("--pages")?,
        transform: input.opt_value_from_str("--transform")?,
        quiet: input.contains("--quiet"),
        verbose: input.contains("--verbose"),
        input: input.free_from_str()?,
        output: input.opt_free_from_str()?,
    })
}

struct Args {
    input: PathBuf,
    output: Option<PathBuf>,
    bbox_format: Option<BboxFormat>,
    trace_mode: TraceMode,
    compute_progress: bool,
    hash_algorithm_name: Option<String>,
    ignore_specials_list: Vec<String>,
    pages: String,
    transform: Option<String>,
    quiet: bool,
    verbose: bool,
}

fn parse_args() -> Result<Args, String> {
    let args = collect_args().map_err(|e| e.to_string())?;

    let trace_mode = match args.trace_mode.as_deref() {
        None => TraceMode::Required,
        Some("a") => TraceMode::All,
        Some("m") => TraceMode::Missing,
        Some(other) => return Err(format!("unknown --trace-mode '{other}' (expected 'a' or 'm')")),
    };

    let ignore_specials_list = args
        .ignore_specials_list
        .as_deref()
        .map(|s| s.split(|c: char| c == ',' || c.is_whitespace()).filter(|p| !p.is_empty()).map(str::to_string).collect())
        .unwrap_or_default();

    Ok(Args {
        input: PathBuf::from(args.input),
        output: args.output.map(PathBuf::from),
        bbox_format: args.bbox_format.as_deref().map(BboxFormat::parse),
        trace_mode,
        compute_progress: args.compute_progress,
        hash_algorithm_name: args.hash_algorithm_name,
        ignore_specials_list,
        pages: args.pages.unwrap_or_default(),
        transform: args.transform,
        quiet: args.quiet,
        verbose: args.verbose,
    })
}

/// A simple stderr logger, mirroring the upstream crate's own CLI logger.
static LOGGER: SimpleLogger = SimpleLogger;
struct SimpleLogger;
impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::LevelFilter::Debug
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let target = if !record.target().is_empty() { record.target() } else { record.module_path().unwrap_or_default() };
            let line = record.line().unwrap_or(0);
            match record.level() {
                log::Level::Error => eprintln!("Error (in {}:{}): {}", target, line, record.args()),
                log::Level::Warn => eprintln!("Warning (in {}:{}): {}", target, line, record.args()),
                log::Level::Info => eprintln!("Info (in {}:{}): {}", target, line, record.args()),
                log::Level::Debug => eprintln!("Debug (in {}:{}): {}", target, line, record.args()),
                log::Level::Trace => eprintln!("Trace (in {}:{}): {}", target, line, record.args()),
            }
        }
    }

    fn flush(&self) {}
}

static HELP: &str = "\
dvisvgm-rs
Converts DVI (and XeTeX XDV) output into SVG documents.

USAGE:
    dvisvgm-rs [OPTIONS] <input> [output-dir]

OPTIONS:
        --bbox-format <FORMAT>      min|dvi|preview|papersize|none|<paper size>|<length list>
        --trace-mode <a|m>          retrace all glyphs (a) or only missing ones (m)
        --compute-progress          emit progress callbacks after each opcode
        --hash-algorithm <NAME>     page-content hash used for output filenames
        --ignore-specials <LIST>   comma-separated special prefixes to ignore, or '*'
        --pages <RANGE>             page-range expression, e.g. '1,3-4,9-'
        --transform <PROGRAM>       affine transform program, e.g. 'translate(10,0);scale(2,2)'
        --quiet                     suppress warnings
        --verbose                   also print info/debug messages
    -V, --version                   print version and exit
        --help                      print this help and exit
";
