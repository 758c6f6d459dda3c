//! This AST describes one parsed line of T21 assembly and the
//! instructions it can assemble to.
//!
//! Every line has the shape
//!
//! ```text
//! [LABEL:] [MNEMONIC [OPERAND1] [[,] OPERAND2] [LABELREF]] [# comment]
//! ```
//!
//! Source is case-insensitive; lines are uppercased before they reach
//! the lexer. Instructions assemble to one or two bytes. The low nibble
//! of the first byte selects the operation, the high nibble carries a
//! register code where the form needs one.
//!
//! ```nasm
//! START: MOV UP, ACC   # read a value from the upper port
//!        JEZ START     # loop on zero
//!        ADD 1
//!        MOV ACC, DOWN
//!        JMP START
//! ```

use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

/// The addressable operand locations: the accumulator, the null sink and
/// eight ports. The four directional names alias the first four ports.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Register {
    ACC,
    NIL,
    PORT0,
    PORT1,
    PORT2,
    PORT3,
    PORT4,
    PORT5,
    PORT6,
    PORT7,
}

impl Register {
    /// Looks a register up by its source name, including the
    /// directional aliases. Returns `None` for anything else.
    pub fn from_name(name: &str) -> Option<Register> {
        use Register::*;
        match name {
            "ACC"             => Some(ACC),
            "NIL"             => Some(NIL),
            "PORT0" | "LEFT"  => Some(PORT0),
            "PORT1" | "UP"    => Some(PORT1),
            "PORT2" | "RIGHT" => Some(PORT2),
            "PORT3" | "DOWN"  => Some(PORT3),
            "PORT4"           => Some(PORT4),
            "PORT5"           => Some(PORT5),
            "PORT6"           => Some(PORT6),
            "PORT7"           => Some(PORT7),
            _ => None,
        }
    }

    /// The 4-bit code placed in an instruction's register nibble.
    pub fn code(&self) -> u8 {
        use Register::*;
        match self {
            ACC   => 0x1,
            NIL   => 0x2,
            PORT0 => 0x8,
            PORT1 => 0x9,
            PORT2 => 0xA,
            PORT3 => 0xB,
            PORT4 => 0xC,
            PORT5 => 0xD,
            PORT6 => 0xE,
            PORT7 => 0xF,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Mnemonic {
    NOP,
    HLT,
    MOV,
    SWP,
    SAV,
    ADD,
    SUB,
    NEG,
    JMP,
    JEZ,
    JNZ,
    JGZ,
    JLZ,
    JRO,
}

impl FromStr for Mnemonic {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Mnemonic::*;
        match s {
            "NOP" => Ok(NOP),
            "HLT" => Ok(HLT),
            "MOV" => Ok(MOV),
            "SWP" => Ok(SWP),
            "SAV" => Ok(SAV),
            "ADD" => Ok(ADD),
            "SUB" => Ok(SUB),
            "NEG" => Ok(NEG),
            "JMP" => Ok(JMP),
            "JEZ" => Ok(JEZ),
            "JNZ" => Ok(JNZ),
            "JGZ" => Ok(JGZ),
            "JLZ" => Ok(JLZ),
            "JRO" => Ok(JRO),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Mnemonic {
    /// The jump condition for the five label-carrying mnemonics.
    pub fn condition(&self) -> Option<Condition> {
        use Mnemonic::*;
        match self {
            JMP => Some(Condition::Always),
            JEZ => Some(Condition::Zero),
            JNZ => Some(Condition::NotZero),
            JGZ => Some(Condition::Greater),
            JLZ => Some(Condition::Less),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Condition {
    Always,
    Zero,
    NotZero,
    Greater,
    Less,
}

impl Condition {
    fn code(&self) -> u8 {
        use Condition::*;
        match self {
            Always  => 0x0,
            Zero    => 0x1,
            NotZero => 0x2,
            Greater => 0x3,
            Less    => 0x4,
        }
    }
}

/// An operand token as written in the source.
///
/// `Name` holds the raw word so that a register-named operand can still
/// serve as a jump target; `Literal` holds a decimal of at most three
/// digits, which may still be out of range for an immediate.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Operand {
    Name(String),
    Literal(i16),
}

impl Operand {
    /// The signed 8-bit immediate this operand denotes, if any.
    pub fn immediate(&self) -> Option<Immediate> {
        match self {
            Operand::Literal(val) => Immediate::try_from(*val).ok(),
            Operand::Name(_) => None,
        }
    }

    pub fn register(&self) -> Option<Register> {
        match self {
            Operand::Name(name) => Register::from_name(name),
            Operand::Literal(_) => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Name(name) => write!(f, "{}", name),
            Operand::Literal(val) => write!(f, "{}", val),
        }
    }
}

/// The structured form of one source line. Every part is optional; a
/// blank line parses to `ParsedLine::default()`.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ParsedLine {
    pub label:     Option<String>,
    pub mnemonic:  Option<Mnemonic>,
    pub operand1:  Option<Operand>,
    pub operand2:  Option<Operand>,
    pub label_ref: Option<String>,
    pub comment:   Option<String>,
}

/// A fully classified instruction, one variant per encoding form.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Instruction {
    NOP,
    SWP,
    SAV,
    NEG,
    HLT,
    ADDI(Immediate),
    ADD (Register),
    SUBI(Immediate),
    SUB (Register),
    JROI(Immediate),
    JRO (Register),
    MOVI(Immediate, Register),
    MOV (Register, Register),
    J   (Condition, String),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Instruction::*;
        match self {
            NOP => write!(f, "NOP"),
            SWP => write!(f, "SWP"),
            SAV => write!(f, "SAV"),
            NEG => write!(f, "NEG"),
            HLT => write!(f, "HLT"),
            ADDI(imm)      => write!(f, "ADD {}", imm),
            ADD (src)      => write!(f, "ADD {}", src),
            SUBI(imm)      => write!(f, "SUB {}", imm),
            SUB (src)      => write!(f, "SUB {}", src),
            JROI(imm)      => write!(f, "JRO {}", imm),
            JRO (src)      => write!(f, "JRO {}", src),
            MOVI(imm, dst) => write!(f, "MOV {}, {}", imm, dst),
            MOV (src, dst) => write!(f, "MOV {}, {}", src, dst),
            J   (cond, target) => {
                let mnemonic = match cond {
                    Condition::Always  => "JMP",
                    Condition::Zero    => "JEZ",
                    Condition::NotZero => "JNZ",
                    Condition::Greater => "JGZ",
                    Condition::Less    => "JLZ",
                };
                write!(f, "{} {}", mnemonic, target)
            }
        }
    }
}

impl Instruction {
    /// Assembles the instruction to its machine bytes. Jumps assemble
    /// with a zero placeholder in their target byte.
    pub fn assemble(&self) -> Vec<u8> {
        use Instruction::*;
        match self {
            NOP | SWP | SAV | NEG | HLT => vec![self.opcode()],

            ADDI(imm) |
            SUBI(imm) |
            JROI(imm)      => vec![self.opcode(), *imm as u8],

            ADD (src) |
            SUB (src) |
            JRO (src)      => vec![(src.code() << 4) | self.opcode()],

            MOVI(imm, dst) => vec![(dst.code() << 4) | self.opcode(), *imm as u8],
            MOV (src, dst) => vec![(dst.code() << 4) | self.opcode(), src.code()],
            J   (cond, _)  => vec![(cond.code() << 4) | self.opcode(), 0x00],
        }
    }

    /// The encoded length in bytes.
    pub fn size(&self) -> usize {
        use Instruction::*;
        match self {
            NOP | SWP | SAV | NEG | HLT |
            ADD(_) | SUB(_) | JRO(_) => 1,
            _ => 2,
        }
    }

    /// The label a jump refers to.
    pub fn target(&self) -> Option<&str> {
        match self {
            Instruction::J(_, target) => Some(target),
            _ => None,
        }
    }

    /// Returns the low-nibble opcode of the instruction.
    fn opcode(&self) -> u8 {
        use Instruction::*;
        match self {
            NOP        => 0x0,
            SWP        => 0x1,
            SAV        => 0x2,
            ADD(_)     => 0x3,
            SUB(_)     => 0x4,
            NEG        => 0x5,
            JRO(_)     => 0x6,
            HLT        => 0x7,
            MOV(_, _)  => 0x8,
            MOVI(_, _) => 0x9,
            ADDI(_)    => 0xA,
            SUBI(_)    => 0xB,
            J(_, _)    => 0xC,
            JROI(_)    => 0xD,
        }
    }
}

pub type Immediate = i8;
