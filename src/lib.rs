//! A two-pass assembler for the T21 single-core instruction set.
//!
//! ```
//! let asm = t21asm::assembler::assemble("demo.asm", "JMP END\nEND: HLT");
//! assert!(asm.diagnostics.is_empty());
//! assert_eq!(asm.code, vec![0x0C, 0x02, 0x07]);
//! ```

#[macro_use] extern crate log;

pub mod assembler;
pub mod ihex;
