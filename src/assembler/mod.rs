//! The Assembler module is in charge of taking a T21 source file and
//! producing its byte-code image.
//!
//! Each line is run through a small tokenizer and a non-lookahead
//! recursive descent parser, then encoded into an assembly `Session`.
//! Jump targets are patched in a second pass once every label is known.
//! No error stops a run; everything that went wrong is returned as
//! diagnostics next to the best-effort image.

pub mod ast;
pub mod encoder;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod session;

pub use self::error::{AsmError, Diagnostic, SyntaxError};
pub use self::session::{Assembly, Label, ListingEntry, Session, ROM_SIZE};

use std::io::{BufRead, BufReader, Read};

/// Assembles a whole program held in memory.
pub fn assemble(source: &str, text: &str) -> Assembly {
    let mut session = Session::new(source);
    for (index, line) in text.lines().enumerate() {
        session.feed_line(index + 1, line);
    }
    session.finish()
}

/// Assembles a program read line by line from `reader`.
///
/// Lines that are not valid UTF-8 are decoded lossily and fail the
/// grammar like any other bad line; only I/O failures end the run.
pub fn assemble_reader<R: Read>(source: &str, reader: R) -> std::io::Result<Assembly> {
    let mut session = Session::new(source);
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut line_no = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        let line = String::from_utf8_lossy(&buf);
        session.feed_line(line_no, line.trim_end_matches(&['\n', '\r'][..]));
    }
    Ok(session.finish())
}
