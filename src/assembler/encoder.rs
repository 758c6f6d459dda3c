//! Classifies the operands of a parsed line and selects the encoding
//! form of its instruction.
use super::ast::*;
use super::parser::is_label_name;
use super::AsmError;

/// Turns a parsed line into an instruction. Lines without a mnemonic
/// encode to `None`.
///
/// Immediate forms win over register forms when both would apply; a
/// literal never names a register and a name never parses as a literal,
/// so in practice only one of the two classifications succeeds.
pub fn encode(line: &ParsedLine) -> Result<Option<Instruction>, AsmError> {
    let mnemonic = match line.mnemonic {
        Some(m) => m,
        None => return Ok(None),
    };

    let imm = line.operand1.as_ref().and_then(Operand::immediate);
    let src = line.operand1.as_ref().and_then(Operand::register);
    let dst = line.operand2.as_ref().and_then(Operand::register);

    let ins = match mnemonic {
        Mnemonic::NOP => Instruction::NOP,
        Mnemonic::SWP => Instruction::SWP,
        Mnemonic::SAV => Instruction::SAV,
        Mnemonic::NEG => Instruction::NEG,
        Mnemonic::HLT => Instruction::HLT,

        Mnemonic::ADD => match (imm, src) {
            (Some(v), _)    => Instruction::ADDI(v),
            (None, Some(s)) => Instruction::ADD(s),
            _ => return Err(AsmError::InvalidOperand(mnemonic)),
        },
        Mnemonic::SUB => match (imm, src) {
            (Some(v), _)    => Instruction::SUBI(v),
            (None, Some(s)) => Instruction::SUB(s),
            _ => return Err(AsmError::InvalidOperand(mnemonic)),
        },
        Mnemonic::JRO => match (imm, src) {
            (Some(v), _)    => Instruction::JROI(v),
            (None, Some(s)) => Instruction::JRO(s),
            _ => return Err(AsmError::InvalidOperand(mnemonic)),
        },
        Mnemonic::MOV => {
            if imm.is_none() && src.is_none() {
                return Err(AsmError::InvalidOperand(mnemonic));
            }
            let dst = dst.ok_or(AsmError::MissingDestination(mnemonic))?;
            match (imm, src) {
                (Some(v), _)    => Instruction::MOVI(v, dst),
                (None, Some(s)) => Instruction::MOV(s, dst),
                _ => return Err(AsmError::InvalidOperand(mnemonic)),
            }
        },

        Mnemonic::JMP | Mnemonic::JEZ | Mnemonic::JNZ |
        Mnemonic::JGZ | Mnemonic::JLZ => match mnemonic.condition() {
            Some(cond) => Instruction::J(cond, jump_target(mnemonic, line)?),
            None => return Err(AsmError::InvalidOperand(mnemonic)),
        },
    };

    for operand in ignored_operands(&ins, line) {
        warn!("ignoring surplus operand `{}` to {}", operand, mnemonic);
    }

    Ok(Some(ins))
}

/// The trailing label reference wins; otherwise a name in the first
/// operand position is taken as the label.
fn jump_target(mnemonic: Mnemonic, line: &ParsedLine) -> Result<String, AsmError> {
    if let Some(target) = &line.label_ref {
        return Ok(target.clone());
    }
    match &line.operand1 {
        Some(Operand::Name(name)) if is_label_name(name) => Ok(name.clone()),
        Some(Operand::Name(_)) => Err(AsmError::InvalidOperand(mnemonic)),
        Some(Operand::Literal(value)) => Err(AsmError::LiteralTarget { mnemonic, value: *value }),
        None => Err(AsmError::MissingTarget(mnemonic)),
    }
}

/// Parts of the line the chosen encoding form does not read.
fn ignored_operands(ins: &Instruction, line: &ParsedLine) -> Vec<String> {
    use Instruction::*;
    let (op1, op2, label_ref) = match ins {
        NOP | SWP | SAV | NEG | HLT => (false, false, false),
        ADDI(_) | ADD(_) | SUBI(_) | SUB(_) | JROI(_) | JRO(_) => (true, false, false),
        MOVI(_, _) | MOV(_, _) => (true, true, false),
        J(_, _) => (line.label_ref.is_none(), false, true),
    };

    let mut ignored = Vec::new();
    if !op1 {
        ignored.extend(line.operand1.iter().map(|o| o.to_string()));
    }
    if !op2 {
        ignored.extend(line.operand2.iter().map(|o| o.to_string()));
    }
    if !label_ref {
        ignored.extend(line.label_ref.iter().cloned());
    }
    ignored
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::parser::parse_line;

    fn encode_str(line: &str) -> Result<Option<Instruction>, AsmError> {
        encode(&parse_line(line).unwrap())
    }

    fn bytes(line: &str) -> Vec<u8> {
        encode_str(line).unwrap().unwrap().assemble()
    }

    #[test]
    fn test_no_mnemonic() {
        assert_eq!(encode_str(""), Ok(None));
        assert_eq!(encode_str("LOOP:"), Ok(None));
        assert_eq!(encode_str("# COMMENT"), Ok(None));
    }

    #[test]
    fn test_opcode_table() {
        assert_eq!(bytes("NOP"), vec![0x00]);
        assert_eq!(bytes("SWP"), vec![0x01]);
        assert_eq!(bytes("SAV"), vec![0x02]);
        assert_eq!(bytes("NEG"), vec![0x05]);
        assert_eq!(bytes("HLT"), vec![0x07]);
        assert_eq!(bytes("ADD 5"), vec![0x0A, 0x05]);
        assert_eq!(bytes("ADD UP"), vec![0x93]);
        assert_eq!(bytes("SUB -1"), vec![0x0B, 0xFF]);
        assert_eq!(bytes("SUB NIL"), vec![0x24]);
        assert_eq!(bytes("JRO -3"), vec![0x0D, 0xFD]);
        assert_eq!(bytes("JRO ACC"), vec![0x16]);
        assert_eq!(bytes("MOV 10, DOWN"), vec![0xB9, 0x0A]);
        assert_eq!(bytes("MOV ACC, LEFT"), vec![0x88, 0x01]);
        assert_eq!(bytes("MOV PORT6 ACC"), vec![0x18, 0x0E]);
        assert_eq!(bytes("JMP L"), vec![0x0C, 0x00]);
        assert_eq!(bytes("JEZ L"), vec![0x1C, 0x00]);
        assert_eq!(bytes("JNZ L"), vec![0x2C, 0x00]);
        assert_eq!(bytes("JGZ L"), vec![0x3C, 0x00]);
        assert_eq!(bytes("JLZ L"), vec![0x4C, 0x00]);
    }

    #[test]
    fn test_immediate_boundaries() {
        assert_eq!(bytes("ADD 127"), vec![0x0A, 0x7F]);
        assert_eq!(bytes("ADD -128"), vec![0x0A, 0x80]);
        assert_eq!(encode_str("ADD 128"), Err(AsmError::InvalidOperand(Mnemonic::ADD)));
        assert_eq!(encode_str("SUB -129"), Err(AsmError::InvalidOperand(Mnemonic::SUB)));
        assert_eq!(encode_str("MOV 999, ACC"), Err(AsmError::InvalidOperand(Mnemonic::MOV)));
    }

    #[test]
    fn test_operand_errors() {
        assert_eq!(encode_str("ADD"), Err(AsmError::InvalidOperand(Mnemonic::ADD)));
        assert_eq!(encode_str("JRO LOOP"), Err(AsmError::InvalidOperand(Mnemonic::JRO)));
        assert_eq!(encode_str("MOV"), Err(AsmError::InvalidOperand(Mnemonic::MOV)));
        assert_eq!(encode_str("MOV 5"), Err(AsmError::MissingDestination(Mnemonic::MOV)));
        assert_eq!(encode_str("MOV ACC"), Err(AsmError::MissingDestination(Mnemonic::MOV)));
        assert_eq!(encode_str("JMP"), Err(AsmError::MissingTarget(Mnemonic::JMP)));
        assert_eq!(
            encode_str("JGZ 12"),
            Err(AsmError::LiteralTarget { mnemonic: Mnemonic::JGZ, value: 12 })
        );
        assert_eq!(encode_str("JLZ PORT2"), Err(AsmError::InvalidOperand(Mnemonic::JLZ)));
    }

    #[test]
    fn test_jump_targets() {
        let target = |line: &str| encode_str(line).unwrap().unwrap().target().map(str::to_string);

        assert_eq!(target("JMP END"), Some("END".to_string()));
        // A register-named operand is a valid label name.
        assert_eq!(target("JEZ LEFT"), Some("LEFT".to_string()));
        // The trailing reference wins over the first operand.
        assert_eq!(target("JNZ ACC LOOP"), Some("LOOP".to_string()));
        assert_eq!(target("JMP 5 LOOP"), Some("LOOP".to_string()));
    }

    #[test]
    fn test_surplus_operands() {
        let line = parse_line("NOP ACC LEFT END").unwrap();
        let ins = encode(&line).unwrap().unwrap();
        assert_eq!(ins, Instruction::NOP);
        assert_eq!(ignored_operands(&ins, &line), vec!["ACC", "LEFT", "END"]);

        let line = parse_line("ADD 1 NIL").unwrap();
        let ins = encode(&line).unwrap().unwrap();
        assert_eq!(ignored_operands(&ins, &line), vec!["NIL"]);

        let line = parse_line("JMP ACC LOOP").unwrap();
        let ins = encode(&line).unwrap().unwrap();
        assert_eq!(ignored_operands(&ins, &line), vec!["ACC"]);

        let line = parse_line("JMP LOOP").unwrap();
        let ins = encode(&line).unwrap().unwrap();
        assert!(ignored_operands(&ins, &line).is_empty());
    }
}
