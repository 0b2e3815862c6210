//! Tokenizer for the S-expression surface (SPEC_FULL.md §4.9).
//!
//! Three token kinds only: parens and bare atoms. `;` starts a
//! line comment, matching the convention of every other S-expression
//! reader in the corpus even though the original's comment/macro
//! system is out of scope.

use crate::error::{Error, Result};

const COMPONENT: &str = "text::lexer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    LParen,
    RParen,
    Atom(String),
}

pub fn tokenize(src: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();
    let mut atom_start: Option<usize> = None;

    let flush = |atom_start: &mut Option<usize>, end: usize, tokens: &mut Vec<Token>| {
        if let Some(start) = atom_start.take() {
            tokens.push(Token::Atom(src[start..end].to_string()));
        }
    };

    while let Some(&(i, c)) = chars.peek() {
        match c {
            '(' => {
                flush(&mut atom_start, i, &mut tokens);
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                flush(&mut atom_start, i, &mut tokens);
                tokens.push(Token::RParen);
                chars.next();
            }
            c if c.is_whitespace() => {
                flush(&mut atom_start, i, &mut tokens);
                chars.next();
            }
            ';' => {
                flush(&mut atom_start, i, &mut tokens);
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            _ => {
                if atom_start.is_none() {
                    atom_start = Some(i);
                }
                chars.next();
            }
        }
    }
    flush(&mut atom_start, src.len(), &mut tokens);

    let mut depth: i64 = 0;
    for tok in &tokens {
        match tok {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth -= 1;
                if depth < 0 {
                    return Err(Error::bad_format(COMPONENT, "unmatched ')'"));
                }
            }
            Token::Atom(_) => {}
        }
    }
    if depth != 0 {
        return Err(Error::bad_format(COMPONENT, "unmatched '('"));
    }

    Ok(tokens)
}
