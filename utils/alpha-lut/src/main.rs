// lcdglyph/utils/alpha-lut/src/main.rs
//
// Copyright © 2020 The lcdglyph Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Precomputes an alpha correction table and optionally dumps diagnostics for plotting.

#[macro_use]
extern crate log;

use clap::{App, Arg, ArgMatches};
use image::{ColorType, ImageError};
use lcdglyph_renderer::concurrent::rayon::RayonExecutor;
use lcdglyph_renderer::table::{BlendComparison, compare_blending};
use lcdglyph_renderer::{AlphaCorrectionTable, AlphaCorrectionTableBuilder, BackgroundRange};
use lcdglyph_renderer::{ErrorMap, TableError, TableOptions};
use rayon::ThreadPoolBuilder;
use std::fmt::{self, Display, Formatter};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

#[derive(Debug)]
enum ToolError {
    InvalidArgument { name: &'static str, value: String },
    Table(TableError),
    Io(io::Error),
    Image(ImageError),
}

impl Display for ToolError {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        match *self {
            ToolError::InvalidArgument { name, ref value } => {
                write!(formatter, "invalid value {:?} for {}", value, name)
            }
            ToolError::Table(ref error) => write!(formatter, "{}", error),
            ToolError::Io(ref error) => write!(formatter, "I/O error: {}", error),
            ToolError::Image(ref error) => write!(formatter, "failed to write preview: {}", error),
        }
    }
}

impl From<TableError> for ToolError {
    fn from(error: TableError) -> ToolError {
        ToolError::Table(error)
    }
}

impl From<io::Error> for ToolError {
    fn from(error: io::Error) -> ToolError {
        ToolError::Io(error)
    }
}

impl From<ImageError> for ToolError {
    fn from(error: ImageError) -> ToolError {
        ToolError::Image(error)
    }
}

const DEFAULT_OUTPUT_PATH: &str = "alpha-lut.bin";

struct Options {
    background: BackgroundRange,
    jobs: Option<usize>,
    sequential: bool,
    error_map_path: Option<PathBuf>,
    compare_alpha: Option<u8>,
    preview_path: Option<PathBuf>,
    output_path: PathBuf,
}

impl Options {
    fn from_command_line() -> Result<Options, ToolError> {
        Options::from_matches(&app().get_matches())
    }

    fn from_matches(matches: &ArgMatches) -> Result<Options, ToolError> {
        let background = BackgroundRange::new(parse_level(matches, "bg-start", 0)?,
                                              parse_level(matches, "bg-end", 255)?)?;
        let jobs = match matches.value_of("jobs") {
            None => None,
            Some(jobs) => match jobs.parse() {
                Ok(jobs) if jobs > 0 => Some(jobs),
                _ => {
                    return Err(ToolError::InvalidArgument { name: "jobs", value: jobs.to_owned() })
                }
            },
        };
        let compare_alpha = match matches.value_of("compare-alpha") {
            None => None,
            Some(_) => Some(parse_level(matches, "compare-alpha", 0)?),
        };
        let output_path = matches.value_of("OUTPUT-PATH").unwrap_or(DEFAULT_OUTPUT_PATH);

        Ok(Options {
            background,
            jobs,
            sequential: matches.is_present("sequential"),
            error_map_path: matches.value_of("error-map").map(PathBuf::from),
            compare_alpha,
            preview_path: matches.value_of("preview").map(PathBuf::from),
            output_path: PathBuf::from(output_path),
        })
    }
}

fn app() -> App<'static, 'static> {
    App::new("generate-alpha-lut")
        .version("0.1")
        .author("The lcdglyph Project Developers")
        .about("Builds an alpha correction table for subpixel text")
        .arg(Arg::with_name("bg-start")
                 .long("bg-start")
                 .value_name("LEVEL")
                 .takes_value(true)
                 .help("Darkest background to optimize for (0-255, default 0)"))
        .arg(Arg::with_name("bg-end")
                 .long("bg-end")
                 .value_name("LEVEL")
                 .takes_value(true)
                 .help("Lightest background to optimize for (0-255, default 255)"))
        .arg(Arg::with_name("jobs")
                 .short("j")
                 .long("jobs")
                 .value_name("THREADS")
                 .takes_value(true)
                 .help("Number of threads to use"))
        .arg(Arg::with_name("sequential")
                 .long("sequential")
                 .help("Build on the main thread only")
                 .conflicts_with("jobs"))
        .arg(Arg::with_name("error-map")
                 .long("error-map")
                 .value_name("PATH")
                 .takes_value(true)
                 .help("Write `fg alpha corrected rms` lines for gnuplot"))
        .arg(Arg::with_name("compare-alpha")
                 .long("compare-alpha")
                 .value_name("ALPHA")
                 .takes_value(true)
                 .help("Print `fg bg improvement` lines for the given coverage"))
        .arg(Arg::with_name("preview")
                 .long("preview")
                 .value_name("PATH")
                 .takes_value(true)
                 .help("Write the table as a 256x256 greyscale PNG"))
        .arg(Arg::with_name("OUTPUT-PATH")
                 .help("The raw 65536-byte table to produce [default: alpha-lut.bin]")
                 .index(1))
}

fn parse_level(matches: &ArgMatches, name: &'static str, default: u8) -> Result<u8, ToolError> {
    match matches.value_of(name) {
        None => Ok(default),
        Some(value) => {
            value.parse().map_err(|_| ToolError::InvalidArgument { name, value: value.to_owned() })
        }
    }
}

/// Writes one `fg alpha corrected rms` line per entry, with a blank line after each foreground.
fn write_error_map<W>(writer: &mut W, table: &AlphaCorrectionTable, error_map: &ErrorMap)
                      -> io::Result<()> where W: Write {
    for foreground in 0..=255u8 {
        for alpha in 0..=255u8 {
            writeln!(writer,
                     "{} {} {} {:.6}",
                     foreground,
                     alpha,
                     table.lookup(foreground, alpha),
                     error_map.get(foreground, alpha))?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Writes one `fg bg improvement` line per pair, with a blank line after each foreground.
fn write_comparison<W>(writer: &mut W, comparisons: &[BlendComparison]) -> io::Result<()>
                       where W: Write {
    for comparison in comparisons {
        writeln!(writer,
                 "{} {} {:.6}",
                 comparison.foreground,
                 comparison.background,
                 comparison.improvement())?;
        if comparison.background == 255 {
            writeln!(writer)?;
        }
    }
    Ok(())
}

fn run(options: &Options) -> Result<(), ToolError> {
    if let Some(jobs) = options.jobs {
        if let Err(error) = ThreadPoolBuilder::new().num_threads(jobs).build_global() {
            warn!("could not configure the thread pool: {}", error);
        }
    }

    let builder = AlphaCorrectionTableBuilder::new(TableOptions {
        background: options.background,
        compute_error_map: options.error_map_path.is_some(),
    });
    let built = if options.sequential {
        builder.build()
    } else {
        builder.build_with_executor(&RayonExecutor)
    };

    fs::write(&options.output_path, built.table.as_bytes())?;
    info!("wrote {}", options.output_path.display());

    if let (Some(path), Some(error_map)) = (&options.error_map_path, &built.error_map) {
        let mut writer = BufWriter::new(File::create(path)?);
        write_error_map(&mut writer, &built.table, error_map)?;
        writer.flush()?;
        info!("wrote error map to {} (worst RMS error {:.3})", path.display(), error_map.max());
    }

    if let Some(alpha) = options.compare_alpha {
        let comparisons = compare_blending(&built.table, alpha);
        let stdout = io::stdout();
        let mut writer = BufWriter::new(stdout.lock());
        write_comparison(&mut writer, &comparisons)?;
        writer.flush()?;
    }

    if let Some(ref path) = options.preview_path {
        image::save_buffer(path, built.table.as_bytes(), 256, 256, ColorType::L8)?;
        info!("wrote preview to {}", path.display());
    }

    Ok(())
}

pub fn main() {
    env_logger::init();

    let result = Options::from_command_line().and_then(|options| run(&options));
    if let Err(error) = result {
        error!("{}", error);
        eprintln!("error: {}", error);
        process::exit(1)
    }
}

#[cfg(test)]
mod test {
    use lcdglyph_renderer::table::compare_blending;
    use lcdglyph_renderer::{AlphaCorrectionTable, AlphaCorrectionTableBuilder, BackgroundRange};
    use lcdglyph_renderer::TableOptions;
    use std::path::Path;
    use std::str;
    use super::{DEFAULT_OUTPUT_PATH, Options, ToolError, app, write_comparison, write_error_map};

    fn options_from(args: &[&str]) -> Result<Options, ToolError> {
        let mut command_line = vec!["generate-alpha-lut"];
        command_line.extend_from_slice(args);
        Options::from_matches(&app().get_matches_from(command_line))
    }

    #[test]
    fn test_output_path_defaults() {
        let options = options_from(&[]).unwrap();
        assert_eq!(options.output_path, Path::new(DEFAULT_OUTPUT_PATH));
        assert_eq!(options.background, BackgroundRange::full());
        assert!(options.jobs.is_none() && !options.sequential);

        let options = options_from(&["--bg-start", "192", "-j", "2", "table.bin"]).unwrap();
        assert_eq!(options.output_path, Path::new("table.bin"));
        assert_eq!(options.background, BackgroundRange::new(192, 255).unwrap());
        assert_eq!(options.jobs, Some(2));
    }

    #[test]
    fn test_invalid_arguments_are_rejected() {
        match options_from(&["--bg-start", "200", "--bg-end", "100"]) {
            Err(ToolError::Table(_)) => {}
            _ => panic!("expected an empty background range to be rejected"),
        }
        match options_from(&["-j", "0"]) {
            Err(ToolError::InvalidArgument { name: "jobs", .. }) => {}
            _ => panic!("expected zero jobs to be rejected"),
        }
        match options_from(&["--compare-alpha", "256"]) {
            Err(ToolError::InvalidArgument { name: "compare-alpha", .. }) => {}
            _ => panic!("expected an out-of-range coverage to be rejected"),
        }
    }

    #[test]
    fn test_error_map_layout() {
        let built = AlphaCorrectionTableBuilder::new(TableOptions {
            background: BackgroundRange::new(250, 255).unwrap(),
            compute_error_map: true,
        }).build();
        let mut output = vec![];
        write_error_map(&mut output, &built.table, built.error_map.as_ref().unwrap()).unwrap();

        let text = str::from_utf8(&output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 256 * 257);
        assert!(lines[0].starts_with("0 0 0 "));
        assert_eq!(lines[256], "");
        assert!(lines[257].starts_with("1 0 "));
        assert!(lines[255].starts_with("0 255 255 "));
    }

    #[test]
    fn test_comparison_layout() {
        let comparisons = compare_blending(&AlphaCorrectionTable::identity(), 128);
        let mut output = vec![];
        write_comparison(&mut output, &comparisons).unwrap();

        let text = str::from_utf8(&output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 256 * 257);
        assert_eq!(lines[0], "0 0 0.000000");
        assert_eq!(lines[256], "");
        assert_eq!(lines[257], "1 0 0.000000");
    }
}
