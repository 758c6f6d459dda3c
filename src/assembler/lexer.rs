//! This lexer tokenizes a single line of T21 assembly.
use std::collections::VecDeque;
use std::fmt;

use super::SyntaxError;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Token {
    /// A word written directly before a colon, `LOOP:`.
    Label(String),
    /// Any other whitespace-bounded word. The parser decides whether it
    /// is a mnemonic, a register or a label reference.
    Word(String),
    /// A decimal literal of at most three digits with an optional minus.
    Num(i16),
    Comma,
    /// The text following `#`.
    Comment(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Label(name) => write!(f, "label `{}:`", name),
            Token::Word(word) => write!(f, "`{}`", word),
            Token::Num(val) => write!(f, "literal `{}`", val),
            Token::Comma => write!(f, "`,`"),
            Token::Comment(_) => write!(f, "comment"),
        }
    }
}

/// Splits one uppercased, trimmed source line into tokens.
///
/// Tokens are bounded by whitespace and commas. A `#` ends the line; a
/// `:` closes the word before it into a label.
pub fn tokenize_line(line: &str) -> Result<VecDeque<Token>, SyntaxError> {
    let mut out: VecDeque<Token> = VecDeque::with_capacity(6);

    let mut sb = String::new();
    for (idx, c) in line.char_indices() {
        match c {
            '#' => {
                push_word(&mut sb, &mut out);
                out.push_back(Token::Comment(line[idx + 1..].to_string()));
                return Ok(out);
            }
            ':' => {
                if sb.is_empty() {
                    return Err(SyntaxError::StrayColon);
                }
                out.push_back(Token::Label(sb.clone()));
                sb.clear();
            }
            ',' => {
                push_word(&mut sb, &mut out);
                out.push_back(Token::Comma);
            }
            c if c.is_whitespace() => push_word(&mut sb, &mut out),

            // All other characters can be added to the word
            _ => sb.push(c),
        };
    }
    push_word(&mut sb, &mut out);

    Ok(out)
}

/// Moves a finished word, if there is one, into the token stream.
fn push_word(sb: &mut String, out: &mut VecDeque<Token>) {
    if sb.is_empty() {
        return;
    }
    match tokenize_num(sb) {
        Some(val) => out.push_back(Token::Num(val)),
        None => out.push_back(Token::Word(sb.clone())),
    }
    sb.clear();
}

fn tokenize_num(sb: &str) -> Option<i16> {
    let digits = sb.strip_prefix('-').unwrap_or(sb);
    if digits.is_empty() || digits.len() > 3 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    sb.parse::<i16>().ok()
}
