//! An assembly session owns all state of one run: the label table, the
//! pending patches, the growing code buffer and the diagnostics.
//!
//! Lines are fed in order. Jumps are emitted with a placeholder target
//! byte and a patch entry; `finish` resolves every patch once the whole
//! program has been seen, so labels may be used before they are declared.
use std::collections::{BTreeMap, HashMap};
use std::convert::TryFrom;

use super::ast::{Instruction, ParsedLine};
use super::encoder::encode;
use super::parser::parse_line;
use super::{AsmError, Diagnostic};

/// The target's ROM is 256 bytes, addressed by an 8-bit pointer.
pub const ROM_SIZE: usize = 256;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Label {
    pub name:   String,
    pub offset: usize,
    /// Source line of the definition.
    pub line:   usize,
}

/// A placeholder byte awaiting a label's offset.
#[derive(Clone, PartialEq, Eq, Debug)]
struct Patch {
    line:  usize,
    label: String,
}

/// One instruction that made it into the code buffer.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ListingEntry {
    pub line:        usize,
    pub offset:      usize,
    pub instruction: Instruction,
}

pub struct Session {
    source:      String,
    labels:      Vec<Label>,
    label_index: HashMap<String, usize>,
    patches:     BTreeMap<usize, Patch>,
    code:        Vec<u8>,
    listing:     Vec<ListingEntry>,
    diagnostics: Vec<Diagnostic>,
}

impl Session {
    /// Starts an empty session. `source` names the input in diagnostics.
    pub fn new(source: &str) -> Self {
        Session {
            source:      source.to_string(),
            labels:      Vec::new(),
            label_index: HashMap::new(),
            patches:     BTreeMap::new(),
            code:        Vec::with_capacity(ROM_SIZE),
            listing:     Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Case-folds, trims and assembles one raw source line.
    /// `line_no` is 1-based.
    pub fn feed_line(&mut self, line_no: usize, raw: &str) {
        let text = raw.trim().to_ascii_uppercase();
        match parse_line(&text) {
            Ok(parsed) => self.assemble_line(line_no, &parsed),
            Err(e) => self.report(line_no, e.into()),
        }
    }

    /// Advances the session by one parsed line.
    ///
    /// A redefined label is reported and the first definition kept; the
    /// line's instruction is still assembled. A line whose operands do
    /// not fit its mnemonic contributes no bytes.
    pub fn assemble_line(&mut self, line_no: usize, parsed: &ParsedLine) {
        if let Some(name) = &parsed.label {
            self.define_label(line_no, name);
        }

        match encode(parsed) {
            Ok(Some(ins)) => self.emit(line_no, ins),
            Ok(None) => {},
            Err(e) => self.report(line_no, e),
        }
    }

    fn define_label(&mut self, line_no: usize, name: &str) {
        if let Some(&idx) = self.label_index.get(name) {
            let first_line = self.labels[idx].line;
            self.report(line_no, AsmError::DuplicateLabel { name: name.to_string(), first_line });
            return;
        }

        debug!("{}:{}: label {} at offset {}", self.source, line_no, name, self.code.len());
        self.label_index.insert(name.to_string(), self.labels.len());
        self.labels.push(Label { name: name.to_string(), offset: self.code.len(), line: line_no });
    }

    fn emit(&mut self, line_no: usize, ins: Instruction) {
        let offset = self.code.len();
        let bytes = ins.assemble();
        trace!("{}:{}: {:04X}: {} => {:02X?}", self.source, line_no, offset, ins, bytes);

        self.code.extend_from_slice(&bytes);
        if let Some(target) = ins.target() {
            // The target byte is always the last byte of a jump.
            let at = self.code.len() - 1;
            self.patches.insert(at, Patch { line: line_no, label: target.to_string() });
        }

        if offset <= ROM_SIZE && self.code.len() > ROM_SIZE {
            self.report(line_no, AsmError::ImageTooLarge { limit: ROM_SIZE });
        }
        self.listing.push(ListingEntry { line: line_no, offset, instruction: ins });
    }

    /// Writes every label's offset into the placeholder bytes that refer
    /// to it. Patches whose label is unknown, or whose offset does not
    /// fit in a byte, are reported and keep their placeholder.
    fn resolve_patches(&mut self) {
        let patches = std::mem::take(&mut self.patches);
        for (at, patch) in patches {
            let offset = match self.label_index.get(&patch.label) {
                Some(&idx) => self.labels[idx].offset,
                None => {
                    self.report(patch.line, AsmError::UndefinedLabel(patch.label));
                    continue;
                }
            };

            match u8::try_from(offset) {
                Ok(byte) => {
                    debug!("patching {:04X} with {} = {:02X}", at, patch.label, byte);
                    self.code[at] = byte;
                },
                Err(_) => {
                    self.report(patch.line, AsmError::LabelOutOfRange { name: patch.label, offset });
                },
            }
        }
    }

    fn report(&mut self, line_no: usize, error: AsmError) {
        let diagnostic = Diagnostic::new(&self.source, line_no, error);
        debug!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// Runs the patch pass and returns the finished program.
    pub fn finish(mut self) -> Assembly {
        self.resolve_patches();
        info!(
            "{}: assembled {} byte(s), {} label(s), {} diagnostic(s)",
            self.source, self.code.len(), self.labels.len(), self.diagnostics.len()
        );
        Assembly {
            labels:      self.labels,
            code:        self.code,
            listing:     self.listing,
            diagnostics: self.diagnostics,
        }
    }
}

/// The best-effort result of a run, along with everything that went
/// wrong on the way.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Assembly {
    /// Labels in declaration order.
    pub labels:      Vec<Label>,
    pub code:        Vec<u8>,
    pub listing:     Vec<ListingEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Assembly {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// The offset a label was declared at.
    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.iter().find(|l| l.name == name).map(|l| l.offset)
    }

    /// The bytes of one listed instruction, as they stand after patching.
    pub fn bytes_of(&self, entry: &ListingEntry) -> &[u8] {
        let end = (entry.offset + entry.instruction.size()).min(self.code.len());
        &self.code[entry.offset.min(end)..end]
    }

    /// Renders the code as uppercase hex pairs, sixteen to a line.
    pub fn hex_dump(&self) -> String {
        self.code
            .chunks(16)
            .map(|row| row.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
