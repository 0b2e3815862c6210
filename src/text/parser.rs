//! Recursive-descent parser from the tokenized S-expression surface to
//! the filter AST (SPEC_FULL.md §4.9).
//!
//! `(kind arg...)` forms map to [`NodeKind`] variants by name. This is a
//! contract parser: it produces the node shapes `crate::interp`
//! requires, not a reconstruction of the original grammar's macro
//! system, comments, or pretty-printer.

use crate::ast::algorithm::Algorithm;
use crate::ast::node::NodeKind;
use crate::ast::{NodeId, ScopeId, SymbolTable};
use crate::error::{Error, Result};
use crate::intstream::IntTypeFormat;
use crate::text::lexer::{tokenize, Token};

const COMPONENT: &str = "text::parser";

/// Parses `src` into a `File` node, interning symbols and algorithms
/// into `table`. Top-level forms must each be `(algorithm ...)`, or the
/// whole source may be wrapped in a single `(file ...)`.
pub fn parse(src: &str, table: &mut SymbolTable) -> Result<NodeId> {
    let tokens = tokenize(src)?;
    let scope = table.global_scope();
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        table,
        current_scope: scope,
    };
    parser.parse_file()
}

struct Parser<'t, 'a> {
    tokens: &'t [Token],
    pos: usize,
    table: &'a mut SymbolTable,
    current_scope: ScopeId,
}

impl<'t, 'a> Parser<'t, 'a> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&'t Token> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect_lparen(&mut self) -> Result<()> {
        match self.bump() {
            Some(Token::LParen) => Ok(()),
            other => Err(Error::bad_format(
                COMPONENT,
                format!("expected '(', found {other:?}"),
            )),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Parses the list of top-level forms. A lone `(file ...)` wrapper
    /// is unwrapped; otherwise every top-level form must be an
    /// `(algorithm ...)` and is collected directly as a child of a
    /// synthesized `File` node.
    fn parse_file(&mut self) -> Result<NodeId> {
        let mut top_forms = Vec::new();
        while !self.at_end() {
            top_forms.push(self.parse_form()?);
        }

        if top_forms.len() == 1 {
            if let NodeKind::File = self.table.node(top_forms[0]).kind {
                return Ok(top_forms[0]);
            }
        }
        for &id in &top_forms {
            if !matches!(self.table.node(id).kind, NodeKind::Algorithm(_)) {
                return Err(Error::bad_format(
                    COMPONENT,
                    "top-level forms must be (algorithm ...) or a single (file ...)",
                ));
            }
        }
        Ok(self.table.alloc_node_with_children(NodeKind::File, top_forms))
    }

    /// Parses one parenthesized form or bare atom at the current
    /// position, dispatching on the head symbol.
    fn parse_form(&mut self) -> Result<NodeId> {
        match self.peek() {
            Some(Token::LParen) => self.parse_list(),
            Some(Token::Atom(_)) => self.parse_atom(),
            other => Err(Error::bad_format(COMPONENT, format!("unexpected {other:?}"))),
        }
    }

    fn parse_atom(&mut self) -> Result<NodeId> {
        let text = match self.bump() {
            Some(Token::Atom(s)) => s.clone(),
            _ => unreachable!("caller checked peek"),
        };
        if let Some(v) = parse_integer_literal(&text) {
            return Ok(self.table.alloc_node(NodeKind::Integer(v)));
        }
        let sym = self.table.intern(&text);
        Ok(self.table.alloc_node(NodeKind::Symbol(sym)))
    }

    fn parse_list(&mut self) -> Result<NodeId> {
        self.expect_lparen()?;
        let head = match self.peek() {
            Some(Token::Atom(s)) => s.clone(),
            other => return Err(Error::bad_format(COMPONENT, format!("expected form head, found {other:?}"))),
        };
        self.bump();

        let node = match head.as_str() {
            "file" => {
                let children = self.parse_remaining_forms()?;
                for &id in &children {
                    if !matches!(self.table.node(id).kind, NodeKind::Algorithm(_)) {
                        return Err(Error::bad_format(COMPONENT, "(file ...) children must be algorithms"));
                    }
                }
                self.table.alloc_node_with_children(NodeKind::File, children)
            }
            "algorithm" => return self.parse_algorithm(),
            "seq" => {
                let children = self.parse_remaining_forms()?;
                self.table.alloc_node_with_children(NodeKind::Sequence, children)
            }
            "block" => {
                let children = self.parse_remaining_forms()?;
                self.table.alloc_node_with_children(NodeKind::Block, children)
            }
            "if" => {
                let children = self.parse_remaining_forms()?;
                if children.len() == 2 {
                    self.table.alloc_node_with_children(NodeKind::If, children)
                } else if children.len() == 3 {
                    self.table.alloc_node_with_children(NodeKind::IfElse, children)
                } else {
                    return Err(Error::bad_format(COMPONENT, "(if pred then [else]) takes 2 or 3 forms"));
                }
            }
            "loop" => {
                let children = self.parse_remaining_forms()?;
                if children.len() < 2 {
                    return Err(Error::bad_format(COMPONENT, "(loop count body...) needs a count and a body"));
                }
                let count = children[0];
                let body = if children.len() == 2 {
                    children[1]
                } else {
                    self.table.alloc_node_with_children(NodeKind::Sequence, children[1..].to_vec())
                };
                self.table.alloc_node_with_children(NodeKind::Loop, vec![count, body])
            }
            "loop.unbounded" => {
                let children = self.parse_remaining_forms()?;
                if children.is_empty() {
                    return Err(Error::bad_format(COMPONENT, "(loop.unbounded body...) needs a body"));
                }
                let body = if children.len() == 1 {
                    children[0]
                } else {
                    self.table.alloc_node_with_children(NodeKind::Sequence, children)
                };
                self.table.alloc_node_with_children(NodeKind::LoopUnbounded, vec![body])
            }
            "switch" | "map" => {
                let kind = if head == "switch" { NodeKind::Switch } else { NodeKind::Map };
                let selector = self.parse_form()?;
                let mut children = vec![selector];
                children.extend(self.parse_remaining_forms()?);
                self.table.alloc_node_with_children(kind, children)
            }
            "case" => {
                let tag = self.parse_form()?;
                let mut children = vec![tag];
                children.extend(self.parse_remaining_forms()?);
                self.table.alloc_node_with_children(NodeKind::Case, children)
            }
            "eval" => {
                let name = self.expect_atom()?;
                self.expect_rparen()?;
                let sym = self.table.intern(&name);
                return Ok(self.table.alloc_node(NodeKind::Eval(sym)));
            }
            "eval.default" => {
                let children = self.parse_remaining_forms()?;
                self.table.alloc_node_with_children(NodeKind::EvalDefault, children)
            }
            "peek" => {
                let children = self.parse_remaining_forms()?;
                if children.len() != 1 {
                    return Err(Error::bad_format(COMPONENT, "(peek body) takes exactly one form"));
                }
                self.table.alloc_node_with_children(NodeKind::Peek, children)
            }
            "read" => {
                let name = self.expect_atom()?;
                self.expect_rparen()?;
                let fmt = IntTypeFormat::from_name(&name)
                    .ok_or_else(|| Error::bad_format(COMPONENT, format!("unknown int format {name:?}")))?;
                return Ok(self.table.alloc_node(NodeKind::Read(fmt)));
            }
            "write" => {
                let name = self.expect_atom()?;
                self.expect_rparen()?;
                let fmt = IntTypeFormat::from_name(&name)
                    .ok_or_else(|| Error::bad_format(COMPONENT, format!("unknown int format {name:?}")))?;
                return Ok(self.table.alloc_node(NodeKind::Write(fmt)));
            }
            "callback" => {
                let name = self.expect_atom()?;
                self.expect_rparen()?;
                let sym = self.table.intern(&name);
                return Ok(self.table.alloc_node(NodeKind::Callback(sym)));
            }
            "define" => {
                let name = self.expect_atom()?;
                let children = self.parse_remaining_forms()?;
                if children.len() != 1 {
                    return Err(Error::bad_format(COMPONENT, "(define name body) takes exactly one body form"));
                }
                let sym = self.table.intern(&name);
                let scope = self.current_scope;
                self.table.define(scope, sym, children[0]);
                return Ok(self.table.alloc_node(NodeKind::Define(sym)));
            }
            other => return Err(Error::bad_format(COMPONENT, format!("unknown form {other:?}"))),
        };
        Ok(node)
    }

    fn expect_atom(&mut self) -> Result<String> {
        match self.bump() {
            Some(Token::Atom(s)) => Ok(s.clone()),
            other => Err(Error::bad_format(COMPONENT, format!("expected an atom, found {other:?}"))),
        }
    }

    fn expect_rparen(&mut self) -> Result<()> {
        match self.bump() {
            Some(Token::RParen) => Ok(()),
            other => Err(Error::bad_format(COMPONENT, format!("expected ')', found {other:?}"))),
        }
    }

    /// Parses forms up to the closing `)` of the list already opened by
    /// the caller, consuming that `)`.
    fn parse_remaining_forms(&mut self) -> Result<Vec<NodeId>> {
        let mut forms = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RParen) => {
                    self.bump();
                    return Ok(forms);
                }
                Some(_) => forms.push(self.parse_form()?),
                None => return Err(Error::bad_format(COMPONENT, "unexpected end of input inside a list")),
            }
        }
    }

    /// `(algorithm name (source h...) (read h...) (write h...) body...)`.
    /// Header forms are each a list of byte-valued integer literals.
    fn parse_algorithm(&mut self) -> Result<NodeId> {
        let name = self.expect_atom()?;
        let enclosing = self.table.global_scope();
        let scope = self.table.new_scope(Some(enclosing));
        let outer_scope = self.current_scope;
        self.current_scope = scope;

        let mut algorithm = Algorithm::new(scope);
        algorithm.name = Some(name);
        let mut body_forms: Vec<NodeId> = Vec::new();

        loop {
            match self.peek() {
                Some(Token::RParen) => {
                    self.bump();
                    break;
                }
                Some(Token::LParen) => {
                    let save = self.pos;
                    self.bump();
                    let head = match self.peek() {
                        Some(Token::Atom(s)) => Some(s.clone()),
                        _ => None,
                    };
                    match head.as_deref() {
                        Some("source") => {
                            self.bump();
                            algorithm.source_header = self.parse_byte_header()?;
                        }
                        Some("read") if self.looks_like_header() => {
                            self.bump();
                            algorithm.read_header = self.parse_byte_header()?;
                        }
                        Some("write") if self.looks_like_header() => {
                            self.bump();
                            algorithm.write_header = self.parse_byte_header()?;
                        }
                        _ => {
                            self.pos = save;
                            body_forms.push(self.parse_form()?);
                        }
                    }
                }
                other => return Err(Error::bad_format(COMPONENT, format!("unexpected {other:?} in algorithm body"))),
            }
        }

        self.current_scope = outer_scope;

        let body = match body_forms.len() {
            0 => None,
            1 => Some(body_forms[0]),
            _ => Some(self.table.alloc_node_with_children(NodeKind::Sequence, body_forms)),
        };
        algorithm.body = body;

        let alg_id = self.table.alloc_algorithm(algorithm);
        Ok(self.table.alloc_node(NodeKind::Algorithm(alg_id)))
    }

    /// Disambiguates `(read uint8)` (a format-read node, used as an
    /// ordinary body form) from an algorithm's `(read <header bytes>)`
    /// header: the header form only appears as one of the three fixed
    /// leading forms of `(algorithm ...)`, so the caller only takes this
    /// branch there. Header values are bare integers, never format
    /// names, so a single integer-or-empty peek tells them apart.
    fn looks_like_header(&self) -> bool {
        match self.tokens.get(self.pos + 1) {
            Some(Token::Atom(s)) => parse_integer_literal(s).is_some(),
            Some(Token::RParen) => true,
            _ => false,
        }
    }

    fn parse_byte_header(&mut self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        loop {
            match self.bump() {
                Some(Token::RParen) => return Ok(bytes),
                Some(Token::Atom(s)) => {
                    let v = parse_integer_literal(s)
                        .ok_or_else(|| Error::bad_format(COMPONENT, format!("expected an integer in header, found {s:?}")))?;
                    if v > u8::MAX as u64 {
                        return Err(Error::bad_format(COMPONENT, format!("header byte {v} out of range")));
                    }
                    bytes.push(v as u8);
                }
                other => return Err(Error::bad_format(COMPONENT, format!("unexpected {other:?} in header"))),
            }
        }
    }
}

fn parse_integer_literal(text: &str) -> Option<u64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok();
    }
    text.parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_copy_algorithm() {
        let mut table = SymbolTable::new();
        let src = "(algorithm copy (source) (read) (write) (seq (read uint8) (write uint8)))";
        let file = parse(src, &mut table).unwrap();
        assert_eq!(table.node(file).kind, NodeKind::File);
        assert_eq!(table.node(file).children.len(), 1);
        let alg_node = table.node(file).children[0];
        let alg_id = match table.node(alg_node).kind {
            NodeKind::Algorithm(id) => id,
            _ => panic!("expected an algorithm node"),
        };
        let algorithm = table.algorithm(alg_id);
        assert_eq!(algorithm.name.as_deref(), Some("copy"));
        assert!(algorithm.is_algorithm_file());
        let body = algorithm.body.expect("algorithm has a body");
        assert_eq!(table.node(body).kind, NodeKind::Sequence);
        assert_eq!(table.node(body).children.len(), 2);
    }

    #[test]
    fn parses_control_flow_forms() {
        let mut table = SymbolTable::new();
        let src = "(algorithm a (source 1) (read 1) (write 1) \
                    (if (read uint8) (write uint8)) \
                    (loop (read uint8) (write uint8)) \
                    (loop.unbounded (write uint8)) \
                    (switch (read uint8) (case 0 (write uint8)) (case 1 (write uint8))))";
        let file = parse(src, &mut table).unwrap();
        let alg_node = table.node(file).children[0];
        let alg_id = match table.node(alg_node).kind {
            NodeKind::Algorithm(id) => id,
            _ => unreachable!(),
        };
        let body = table.algorithm(alg_id).body.unwrap();
        let steps = &table.node(body).children;
        assert_eq!(steps.len(), 4);
        assert_eq!(table.node(steps[0]).kind, NodeKind::If);
        assert_eq!(table.node(steps[1]).kind, NodeKind::Loop);
        assert_eq!(table.node(steps[2]).kind, NodeKind::LoopUnbounded);
        assert_eq!(table.node(steps[3]).kind, NodeKind::Switch);
    }

    #[test]
    fn hex_and_decimal_integer_literals() {
        let mut table = SymbolTable::new();
        let src = "(algorithm a (source) (read) (write) (seq 0x1F 31))";
        let file = parse(src, &mut table).unwrap();
        let alg_node = table.node(file).children[0];
        let alg_id = match table.node(alg_node).kind {
            NodeKind::Algorithm(id) => id,
            _ => unreachable!(),
        };
        let body = table.algorithm(alg_id).body.unwrap();
        let children = &table.node(body).children;
        assert_eq!(table.node(children[0]).kind, NodeKind::Integer(31));
        assert_eq!(table.node(children[1]).kind, NodeKind::Integer(31));
    }

    #[test]
    fn rejects_non_algorithm_top_level_forms() {
        let mut table = SymbolTable::new();
        assert!(parse("(seq (read uint8))", &mut table).is_err());
    }

    #[test]
    fn unknown_format_name_is_an_error() {
        let mut table = SymbolTable::new();
        assert!(parse("(algorithm a (source) (read) (write) (read nibble))", &mut table).is_err());
    }
}
