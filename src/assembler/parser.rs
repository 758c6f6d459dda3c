//! The Parser module takes the token stream of one line from the lexer
//! and recognizes the line's shape.
//!
//! A line either matches as a whole or fails as a whole; there is no
//! partial parse.
use std::collections::VecDeque;

use super::ast::*;
use super::lexer::Token;
use super::SyntaxError;

pub struct Parser {
    tokens: VecDeque<Token>,
    line:   ParsedLine,
}

impl Parser {
    pub fn new(tokens: VecDeque<Token>) -> Self {
        Parser { tokens, line: ParsedLine::default() }
    }

    /// Run the parser, consuming itself and returning the parsed line.
    pub fn run(mut self) -> Result<ParsedLine, SyntaxError> {
        self.label()?;
        self.instruction()?;
        self.comment();

        match self.consume() {
            None => Ok(self.line),
            Some(Token::Label(name)) => Err(SyntaxError::SecondLabel(name)),
            Some(Token::Num(val)) => Err(SyntaxError::MisplacedLiteral(val)),
            Some(tok) => Err(SyntaxError::UnexpectedToken(tok.to_string())),
        }
    }

    fn label(&mut self) -> Result<(), SyntaxError> {
        if let Some(Token::Label(_)) = self.peek() {
            if let Some(Token::Label(name)) = self.consume() {
                if !is_label_name(&name) {
                    return Err(SyntaxError::InvalidLabel(name));
                }
                self.line.label = Some(name);
            }
        }
        Ok(())
    }

    /// MNEMONIC [OPERAND1] [[,] OPERAND2] [LABELREF]
    fn instruction(&mut self) -> Result<(), SyntaxError> {
        let word = match self.peek() {
            Some(Token::Word(word)) => word.clone(),
            // Anything else is either the end of the line or an error
            // reported by `run`.
            _ => return Ok(()),
        };
        self.consume();

        let mnemonic = word.parse::<Mnemonic>()
            .map_err(|_| SyntaxError::UnknownMnemonic(word))?;
        self.line.mnemonic = Some(mnemonic);

        self.line.operand1 = self.operand1();
        if self.line.operand1.is_some() {
            let comma = self.peek() == Some(&Token::Comma);
            if comma {
                self.consume();
            }
            self.line.operand2 = self.register();
            if comma && self.line.operand2.is_none() {
                return match self.consume() {
                    Some(Token::Num(val)) => Err(SyntaxError::MisplacedLiteral(val)),
                    Some(tok) => Err(SyntaxError::UnexpectedToken(format!("{} after `,`", tok))),
                    None => Err(SyntaxError::UnexpectedToken("end of line after `,`".to_string())),
                };
            }
        }

        self.line.label_ref = self.label_ref();
        Ok(())
    }

    /// A register name or a literal.
    fn operand1(&mut self) -> Option<Operand> {
        if let Some(Token::Num(val)) = self.peek() {
            let val = *val;
            self.consume();
            return Some(Operand::Literal(val));
        }
        self.register()
    }

    /// A register name, never a literal.
    fn register(&mut self) -> Option<Operand> {
        match self.peek() {
            Some(Token::Word(word)) if Register::from_name(word).is_some() => {
                let word = word.clone();
                self.consume();
                Some(Operand::Name(word))
            }
            _ => None,
        }
    }

    fn label_ref(&mut self) -> Option<String> {
        match self.peek() {
            Some(Token::Word(word)) if is_label_name(word) => {
                let word = word.clone();
                self.consume();
                Some(word)
            }
            _ => None,
        }
    }

    fn comment(&mut self) {
        if let Some(Token::Comment(_)) = self.peek() {
            if let Some(Token::Comment(text)) = self.consume() {
                self.line.comment = Some(text);
            }
        }
    }

    #[inline]
    fn peek(&self) -> Option<&Token> {
        self.tokens.front()
    }

    /// Pops a token off the input stream and returns it.
    /// Returns None if no tokens are left.
    #[inline]
    fn consume(&mut self) -> Option<Token> {
        self.tokens.pop_front()
    }
}

/// Labels are one or more letters A-Z.
pub fn is_label_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_uppercase())
}

/// Tokenizes and parses one uppercased, trimmed line.
pub fn parse_line(line: &str) -> Result<ParsedLine, SyntaxError> {
    let tokens = super::lexer::tokenize_line(line)?;
    Parser::new(tokens).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Option<Operand> {
        Some(Operand::Name(s.to_string()))
    }

    #[test]
    fn test_blank_and_comment_lines() {
        assert_eq!(parse_line(""), Ok(ParsedLine::default()));

        let parsed = parse_line("# NOTHING TO SEE").unwrap();
        assert_eq!(parsed.mnemonic, None);
        assert_eq!(parsed.comment, Some(" NOTHING TO SEE".to_string()));
    }

    #[test]
    fn test_label_only() {
        let parsed = parse_line("LOOP:").unwrap();
        assert_eq!(parsed.label, Some("LOOP".to_string()));
        assert_eq!(parsed.mnemonic, None);

        let parsed = parse_line("LOOP: # TOP").unwrap();
        assert_eq!(parsed.label, Some("LOOP".to_string()));
        assert_eq!(parsed.comment, Some(" TOP".to_string()));
    }

    #[test]
    fn test_full_line() {
        let parsed = parse_line("START: MOV ACC, LEFT # COPY").unwrap();
        assert_eq!(parsed, ParsedLine {
            label:     Some("START".to_string()),
            mnemonic:  Some(Mnemonic::MOV),
            operand1:  name("ACC"),
            operand2:  name("LEFT"),
            label_ref: None,
            comment:   Some(" COPY".to_string()),
        });

        // The comma between operands is optional.
        let parsed = parse_line("MOV -12 PORT5").unwrap();
        assert_eq!(parsed.operand1, Some(Operand::Literal(-12)));
        assert_eq!(parsed.operand2, name("PORT5"));
    }

    #[test]
    fn test_label_refs() {
        let parsed = parse_line("JMP END").unwrap();
        assert_eq!(parsed.mnemonic, Some(Mnemonic::JMP));
        assert_eq!(parsed.operand1, None);
        assert_eq!(parsed.label_ref, Some("END".to_string()));

        // Register names are taken as operands first.
        let parsed = parse_line("JNZ LEFT").unwrap();
        assert_eq!(parsed.operand1, name("LEFT"));
        assert_eq!(parsed.label_ref, None);

        let parsed = parse_line("JEZ ACC LOOP").unwrap();
        assert_eq!(parsed.operand1, name("ACC"));
        assert_eq!(parsed.label_ref, Some("LOOP".to_string()));

        // A mnemonic is a perfectly good label name.
        let parsed = parse_line("JMP NOP").unwrap();
        assert_eq!(parsed.label_ref, Some("NOP".to_string()));
    }

    #[test]
    fn test_invalid_lines() {
        assert_eq!(parse_line("FOO 5"), Err(SyntaxError::UnknownMnemonic("FOO".to_string())));
        assert_eq!(parse_line("ADD5"), Err(SyntaxError::UnknownMnemonic("ADD5".to_string())));
        assert_eq!(parse_line("MOV 5 6"), Err(SyntaxError::MisplacedLiteral(6)));
        assert_eq!(parse_line("MOV 5, 6"), Err(SyntaxError::MisplacedLiteral(6)));
        assert_eq!(parse_line("ADD 1234"), Err(SyntaxError::UnexpectedToken("`1234`".to_string())));
        assert_eq!(parse_line("L1: NOP"), Err(SyntaxError::InvalidLabel("L1".to_string())));
        assert_eq!(parse_line("A: B: NOP"), Err(SyntaxError::SecondLabel("B".to_string())));
        assert_eq!(parse_line("NOP A B"), Err(SyntaxError::UnexpectedToken("`B`".to_string())));
        assert_eq!(parse_line("L: 5"), Err(SyntaxError::MisplacedLiteral(5)));
        assert_eq!(parse_line(", NOP"), Err(SyntaxError::UnexpectedToken("`,`".to_string())));
        assert_eq!(parse_line("JMP PORT9"), Err(SyntaxError::UnexpectedToken("`PORT9`".to_string())));
        assert!(parse_line("MOV ACC,").is_err());
        assert!(parse_line("MOV ACC, END").is_err());
        assert!(parse_line(": NOP").is_err());
    }

    #[test]
    fn test_is_label_name() {
        assert!(is_label_name("A"));
        assert!(is_label_name("LOOPSTART"));
        assert!(!is_label_name(""));
        assert!(!is_label_name("PORT1"));
        assert!(!is_label_name("L_1"));
        assert!(!is_label_name("loop"));
    }
}
