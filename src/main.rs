extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate term_grid;

use clap::{Arg, ArgMatches, App};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use t21asm::assembler::{self, Assembly};
use t21asm::ihex;

/// Bytes per Intel HEX data record.
const IHEX_RECORD_LEN: usize = 16;

fn main() {
    let args = process_arguments();
    initialize_logging(args.occurrences_of("verbose"));

    debug!("Arguments:\n\tVerbosity: {}\n\tOutfile: {}\n\tHex outfile: {}\n\tInfile: {}",
        verbosity_level(args.occurrences_of("verbose")),
        args.value_of("output").unwrap_or("None"),
        args.value_of("ihex").unwrap_or("None"),
        args.value_of("INPUT").unwrap_or("-"),
    );

    // `-` reads the program from STDIN.
    let ifile = args.value_of("INPUT").unwrap_or("-");
    let input: Box<dyn Read> = if ifile == "-" {
        Box::new(io::stdin())
    } else {
        match File::open(Path::new(ifile)) {
            Err(err) => {
                error!("fatal: unable to open input file `{}`: {}", ifile, err);
                std::process::exit(1);
            },
            Ok(file) => Box::new(file),
        }
    };

    let asm = match assembler::assemble_reader(ifile, input) {
        Err(err) => {
            error!("fatal: unable to read input file `{}`: {}", ifile, err);
            std::process::exit(1);
        },
        Ok(asm) => asm,
    };

    for diagnostic in &asm.diagnostics {
        error!("{}", diagnostic);
    }

    for label in &asm.labels {
        println!("{}: {}", label.name, label.offset);
    }

    if args.is_present("print-debug") {
        print_listing(&asm);
    }

    println!("{}", asm.hex_dump());

    if let Some(filename) = args.value_of("output") {
        write_output(Path::new(filename), |ofile| ofile.write_all(&asm.code));
    }

    if let Some(filename) = args.value_of("ihex") {
        let records = match ihex::records_for_image(&asm.code, IHEX_RECORD_LEN) {
            Err(err) => {
                error!("fatal: unable to encode `{}` as Intel HEX: {}", filename, err);
                std::process::exit(1);
            },
            Ok(records) => records,
        };
        write_output(Path::new(filename), |ofile| {
            for record in &records {
                writeln!(ofile, "{}", record)?;
            }
            Ok(())
        });
    }

    if asm.has_errors() {
        error!("{} error(s) while assembling `{}`", asm.diagnostics.len(), ifile);
        std::process::exit(1);
    }
}

fn print_listing(asm: &Assembly) {
    let mut grid = Grid::new(GridOptions {
        filling:     Filling::Spaces(1),
        direction:   Direction::LeftToRight,
    });

    for entry in &asm.listing {
        let bytes: Vec<String> = asm.bytes_of(entry).iter().map(|b| format!("{:02X}", b)).collect();
        grid.add(Cell::from(format!("0x{:02X}:", entry.offset)));
        grid.add(Cell::from(format!("{}", entry.instruction)));
        grid.add(Cell::from("=>".to_string()));
        grid.add(Cell::from(bytes.join(" ")));
    }

    println!("{}", grid.fit_into_columns(4));
}

fn write_output<F>(opath: &Path, write: F)
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let mut ofile = match File::create(opath) {
        Err(err) => {
            error!("fatal: unable to open output file `{}`: {}", opath.display(), err);
            std::process::exit(1);
        },
        Ok(file) => file,
    };

    if let Err(err) = write(&mut ofile) {
        error!("fatal: unable to write to output file `{}`: {}", opath.display(), err);
        std::process::exit(1);
    }
    info!("wrote `{}`", opath.display());
}

fn process_arguments() -> ArgMatches<'static> {
    App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(Arg::with_name("INPUT")
            .help("Sets the input file to use, or - for STDIN")
            .required(true)
            .multiple(false)
            .index(1))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .takes_value(false)
            .help("Sets the level of verbosity"))
        .arg(Arg::with_name("output")
            .short("o")
            .takes_value(true)
            .help("write the raw image to an outfile"))
        .arg(Arg::with_name("ihex")
            .short("x")
            .long("ihex")
            .takes_value(true)
            .help("write the image as Intel HEX records to an outfile"))
        .arg(Arg::with_name("print-debug")
            .short("d")
            .alias("show")
            .alias("s")
            .takes_value(false)
            .help("prints a listing of each instruction and its bytes to STDOUT"))
        .get_matches()
}

fn initialize_logging(verbosity: u64) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(verbosity_level(verbosity))
        .chain(std::io::stderr())
        .apply().ok();
}

/// Maps the number of `-v` flags to a log level.
fn verbosity_level(verbosity: u64) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}
