//! The stackless single-threaded evaluator (spec.md §4.4, §9 "stackless
//! interpreter"): an explicit `Vec<Frame>` instead of the recursive,
//! reified call stack the design note warns against.
//!
//! Grounded on `original_source/src/interp/Interpreter-defs.h` for the
//! method/state vocabulary, and spec.md §4.4 for per-kind semantics.

use crate::ast::{NodeId, NodeKind, ScopeId, SymbolTable};
use crate::error::{Error, Result};
use crate::interp::reader::Reader;
use crate::interp::state::{Frame, Method, Modifier, State};
use crate::interp::writer::Writer;
use crate::intstream::IntValue;

const COMPONENT: &str = "Interpreter";

/// Bytes of guaranteed headroom the reader must have before the
/// interpreter will process another step (spec.md §5).
pub const RESUME_HEADROOM: u64 = 100;

enum Step {
    /// The frame is fully evaluated; drop it.
    Done,
    /// Evaluate `child` next, then come back to this frame.
    Push(NodeId),
}

pub struct Interpreter<'a> {
    ast: &'a SymbolTable,
    reader: &'a mut dyn Reader,
    writer: &'a mut dyn Writer,
    frames: Vec<Frame>,
    /// Values produced by `Read`/`Integer` nodes and consumed by their
    /// parent (predicate, selector, or `Write` node) — the interpreter's
    /// only notion of a data channel between sibling nodes.
    values: Vec<IntValue>,
    scope: ScopeId,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        ast: &'a SymbolTable,
        reader: &'a mut dyn Reader,
        writer: &'a mut dyn Writer,
        scope: ScopeId,
    ) -> Self {
        Interpreter {
            ast,
            reader,
            writer,
            frames: Vec::new(),
            values: Vec::new(),
            scope,
        }
    }

    pub fn start(&mut self, node: NodeId, modifier: Modifier) {
        self.frames.push(Frame::new(Method::Eval, node, modifier));
    }

    pub fn is_finished(&self) -> bool {
        self.frames.is_empty()
    }

    /// Runs until either the frame stack empties (`Ok(true)`) or the
    /// reader reports insufficient headroom to keep going (`Ok(false)`).
    pub fn resume(&mut self) -> Result<bool> {
        while let Some(frame) = self.frames.pop() {
            if frame.modifier.includes_read()
                && !self.reader.can_process_more_input_now(RESUME_HEADROOM)
            {
                self.frames.push(frame);
                return Ok(false);
            }
            self.step(frame)?;
        }
        Ok(true)
    }

    /// Repeatedly resumes, assuming the caller has already topped up the
    /// reader's backing input (spec.md §4.4's `read_backfilled`). In
    /// this in-memory crate the reader never actually runs dry mid-call,
    /// so this simply loops `resume` to completion.
    pub fn read_backfilled(&mut self) -> Result<()> {
        while !self.resume()? {}
        Ok(())
    }

    fn step(&mut self, mut frame: Frame) -> Result<()> {
        let kind_is_unimplemented = matches!(
            self.ast.node(frame.node).kind,
            NodeKind::NotImplemented(_) | NodeKind::Symbol(_)
        );
        if kind_is_unimplemented {
            return Err(Error::internal(COMPONENT, "node kind is not implemented"));
        }

        let modifier = frame.modifier;
        match self.eval_step(&mut frame)? {
            Step::Push(child) => {
                frame.step += 1;
                self.frames.push(frame);
                self.frames.push(Frame::new(Method::Eval, child, modifier));
            }
            Step::Done => {}
        }
        Ok(())
    }

    /// Evaluates one step of `frame`'s node, dispatched by kind and
    /// `frame.step` (the index of the next child / loop iteration).
    fn eval_step(&mut self, frame: &mut Frame) -> Result<Step> {
        let node = frame.node;
        let modifier = frame.modifier;
        let children = self.ast.node(node).children.clone();
        let kind_clone = self.ast.node(node).kind.clone();

        match kind_clone {
            NodeKind::File | NodeKind::Algorithm(_) => Err(Error::internal(
                COMPONENT,
                "File/Algorithm nodes are not directly interpreted",
            )),

            NodeKind::Sequence | NodeKind::Locals | NodeKind::ParamArgs => {
                self.eval_sequence(frame, &children)
            }

            NodeKind::Block => self.eval_block(frame, &children, modifier),

            NodeKind::If => self.eval_if(frame, &children, false),
            NodeKind::IfElse => self.eval_if(frame, &children, true),

            NodeKind::Loop => self.eval_loop(frame, &children, false),
            NodeKind::LoopUnbounded => self.eval_loop(frame, &children, true),

            NodeKind::Switch | NodeKind::Map => self.eval_switch(frame, &children),
            // children[0] is the match tag, children[1..] the body;
            // evaluated as a sequence over the body once `eval_switch`
            // selects this case.
            NodeKind::Case => {
                let body = &children[1..];
                let i = frame.step as usize;
                if i < body.len() {
                    Ok(Step::Push(body[i]))
                } else {
                    Ok(Step::Done)
                }
            }

            NodeKind::Eval(sym) => {
                if frame.step == 0 {
                    let target = self.ast.resolve(self.scope, sym)?;
                    Ok(Step::Push(target))
                } else {
                    Ok(Step::Done)
                }
            }
            NodeKind::EvalDefault => {
                if frame.step == 0 && !children.is_empty() {
                    Ok(Step::Push(children[0]))
                } else {
                    Ok(Step::Done)
                }
            }

            NodeKind::Peek => self.eval_peek(&children, modifier),

            NodeKind::Read(format) => {
                if modifier.includes_read() {
                    let v = self.reader.read_value(format)?;
                    self.values.push(v);
                }
                Ok(Step::Done)
            }
            NodeKind::Write(format) => {
                if modifier.includes_write() {
                    let v = self
                        .values
                        .pop()
                        .ok_or_else(|| Error::internal(COMPONENT, "write with no pending value"))?;
                    self.writer.write_value(v, format)?;
                }
                Ok(Step::Done)
            }
            NodeKind::IntFormat(_) => Ok(Step::Done),

            NodeKind::Callback(sym) => {
                if modifier.includes_read() {
                    self.reader.read_action(sym)?;
                }
                if modifier.includes_write() {
                    self.writer.write_action(sym)?;
                }
                Ok(Step::Done)
            }

            NodeKind::AlgorithmFlag
            | NodeKind::Define(_)
            | NodeKind::LiteralDef(_)
            | NodeKind::LiteralUse(_)
            | NodeKind::Undefine(_) => Ok(Step::Done),

            NodeKind::Integer(v) => {
                self.values.push(v);
                Ok(Step::Done)
            }
            NodeKind::Symbol(_) => unreachable!("filtered above"),
            NodeKind::NotImplemented(_) => unreachable!("filtered above"),
        }
    }

    fn eval_sequence(&mut self, frame: &mut Frame, children: &[NodeId]) -> Result<Step> {
        let i = frame.step as usize;
        if i < children.len() {
            Ok(Step::Push(children[i]))
        } else {
            Ok(Step::Done)
        }
    }

    fn eval_block(&mut self, frame: &mut Frame, children: &[NodeId], modifier: Modifier) -> Result<Step> {
        let step = frame.step;
        if step == 0 {
            if modifier.includes_read() {
                self.reader.open_block()?;
            }
            if modifier.includes_write() {
                self.writer.open_block()?;
            }
            frame.state = State::Loop;
        }
        let body_index = step as usize;
        if body_index < children.len() {
            return Ok(Step::Push(children[body_index]));
        }
        if modifier.includes_read() {
            self.reader.close_block()?;
        }
        if modifier.includes_write() {
            self.writer.close_block()?;
        }
        frame.state = State::Exit;
        Ok(Step::Done)
    }

    fn eval_if(&mut self, frame: &mut Frame, children: &[NodeId], has_else: bool) -> Result<Step> {
        match frame.step {
            0 => Ok(Step::Push(children[0])),
            1 => {
                let predicate = self.values.pop().unwrap_or(0);
                if predicate != 0 {
                    Ok(Step::Push(children[1]))
                } else if has_else && children.len() > 2 {
                    Ok(Step::Push(children[2]))
                } else {
                    Ok(Step::Done)
                }
            }
            _ => Ok(Step::Done),
        }
    }

    fn eval_loop(&mut self, frame: &mut Frame, children: &[NodeId], unbounded: bool) -> Result<Step> {
        if unbounded {
            if self.reader.at_input_eob() {
                return Ok(Step::Done);
            }
            return Ok(Step::Push(children[0]));
        }

        // children[0] is the trip-count expression, children[1] the body.
        // The remaining-iteration count lives in `frame.aux`, never on
        // the shared value stack, so the body's own reads/writes can't
        // clobber the loop's own bookkeeping.
        if frame.step == 0 {
            return Ok(Step::Push(children[0]));
        }
        if frame.step == 1 {
            let count = self.values.pop().unwrap_or(0);
            if count == 0 {
                return Ok(Step::Done);
            }
            frame.aux = count - 1;
            return Ok(Step::Push(children[1]));
        }
        if frame.aux == 0 {
            return Ok(Step::Done);
        }
        frame.aux -= 1;
        Ok(Step::Push(children[1]))
    }

    fn eval_switch(&mut self, frame: &mut Frame, children: &[NodeId]) -> Result<Step> {
        if frame.step == 0 {
            return Ok(Step::Push(children[0]));
        }
        if frame.step == 1 {
            let selector = self.values.pop().unwrap_or(0);
            let cases = &children[1..];
            for &case in cases {
                let case_children = self.ast.node(case).children.clone();
                if let Some(&tag_node) = case_children.first() {
                    if let NodeKind::Integer(tag) = self.ast.node(tag_node).kind {
                        if tag == selector {
                            return Ok(Step::Push(case));
                        }
                    }
                }
            }
            if let Some(&default) = cases.last() {
                return Ok(Step::Push(default));
            }
        }
        Ok(Step::Done)
    }

    fn eval_peek(&mut self, children: &[NodeId], modifier: Modifier) -> Result<Step> {
        if modifier.includes_read() {
            let ast = self.ast;
            let scope = self.scope;
            let mut child_values: Vec<IntValue> = Vec::new();
            let body = *children
                .first()
                .ok_or_else(|| Error::internal(COMPONENT, "peek with no body"))?;
            let mut err: Option<Error> = None;
            self.reader.peek(&mut |r| {
                let mut noop_writer = NoopWriter;
                let mut sub = Interpreter::new(ast, r, &mut noop_writer, scope);
                sub.start(body, Modifier::ReadOnly);
                match sub.read_backfilled() {
                    Ok(()) => {
                        child_values = sub.values;
                        Ok(())
                    }
                    Err(e) => {
                        err = Some(e);
                        Ok(())
                    }
                }
            })?;
            if let Some(e) = err {
                return Err(e);
            }
            self.values.extend(child_values);
        }
        Ok(Step::Done)
    }
}

/// A writer that discards everything; used to drive a read-only peek
/// sub-interpreter without needing a real output sink.
struct NoopWriter;

impl Writer for NoopWriter {
    fn write_uint8(&mut self, _v: IntValue) -> Result<()> {
        Ok(())
    }
    fn write_uint32(&mut self, _v: IntValue) -> Result<()> {
        Ok(())
    }
    fn write_uint64(&mut self, _v: IntValue) -> Result<()> {
        Ok(())
    }
    fn write_varint32(&mut self, _v: IntValue) -> Result<()> {
        Ok(())
    }
    fn write_varint64(&mut self, _v: IntValue) -> Result<()> {
        Ok(())
    }
    fn write_varuint32(&mut self, _v: IntValue) -> Result<()> {
        Ok(())
    }
    fn write_varuint64(&mut self, _v: IntValue) -> Result<()> {
        Ok(())
    }
    fn write_action(&mut self, _sym: crate::ast::SymbolId) -> Result<()> {
        Ok(())
    }
    fn open_block(&mut self) -> Result<()> {
        Ok(())
    }
    fn close_block(&mut self) -> Result<()> {
        Ok(())
    }
    fn set_minimize_block_size(&mut self, _minimize: bool) {}
    fn freeze_eof(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{NodeKind, SymbolTable};
    use crate::interp::byte_io::{ByteReader, ByteWriter};
    use crate::intstream::IntTypeFormat;
    use crate::stream::byte_cursor::{ReadCursor as ByteReadCursor, WriteCursor as ByteWriteCursor};
    use crate::stream::queue::Queue;
    use std::rc::Rc;

    fn source_queue(bytes: &[u8]) -> Rc<Queue> {
        let q = Rc::new(Queue::new());
        let mut w = ByteWriteCursor::new(q.clone());
        w.write_block(bytes).unwrap();
        w.freeze_eof();
        q
    }

    #[test]
    fn sequence_transcodes_a_read_into_a_write() {
        let mut ast = SymbolTable::new();
        let read_node = ast.alloc_node(NodeKind::Read(IntTypeFormat::Uint8));
        let write_node = ast.alloc_node(NodeKind::Write(IntTypeFormat::Varuint32));
        let seq = ast.alloc_node_with_children(NodeKind::Sequence, vec![read_node, write_node]);

        let src = source_queue(&[200]);
        let mut rc = ByteReadCursor::new(src);
        let mut reader = ByteReader::new(&mut rc, ast.predefined);

        let dst = Rc::new(Queue::new());
        let mut wc = ByteWriteCursor::new(dst.clone());
        {
            let mut writer = ByteWriter::new(&mut wc, ast.predefined);
            let mut interp = Interpreter::new(&ast, &mut reader, &mut writer, ast.global_scope());
            interp.start(seq, Modifier::ReadAndWrite);
            interp.read_backfilled().unwrap();
            writer.freeze_eof().unwrap();
        }

        let mut out = ByteReadCursor::new(dst);
        let mut check = ByteReader::new(&mut out, ast.predefined);
        assert_eq!(check.read_varuint32().unwrap(), 200);
    }

    #[test]
    fn if_node_takes_the_true_branch() {
        let mut ast = SymbolTable::new();
        let predicate = ast.alloc_node(NodeKind::Integer(1));
        let push_value = ast.alloc_node(NodeKind::Integer(5));
        let write_node = ast.alloc_node(NodeKind::Write(IntTypeFormat::Uint8));
        let then_branch = ast.alloc_node_with_children(NodeKind::Sequence, vec![push_value, write_node]);
        let if_node = ast.alloc_node_with_children(NodeKind::If, vec![predicate, then_branch]);

        let src = source_queue(&[]);
        let mut rc = ByteReadCursor::new(src);
        let mut reader = ByteReader::new(&mut rc, ast.predefined);

        let dst = Rc::new(Queue::new());
        let mut wc = ByteWriteCursor::new(dst.clone());
        {
            let mut writer = ByteWriter::new(&mut wc, ast.predefined);
            let mut interp = Interpreter::new(&ast, &mut reader, &mut writer, ast.global_scope());
            interp.start(if_node, Modifier::WriteOnly);
            interp.read_backfilled().unwrap();
            writer.freeze_eof().unwrap();
        }

        let mut out = ByteReadCursor::new(dst);
        let mut check = ByteReader::new(&mut out, ast.predefined);
        assert_eq!(check.read_uint8().unwrap(), 5);
    }

    #[test]
    fn if_node_skips_false_branch_with_no_else() {
        let mut ast = SymbolTable::new();
        let predicate = ast.alloc_node(NodeKind::Integer(0));
        let push_value = ast.alloc_node(NodeKind::Integer(5));
        let write_node = ast.alloc_node(NodeKind::Write(IntTypeFormat::Uint8));
        let then_branch = ast.alloc_node_with_children(NodeKind::Sequence, vec![push_value, write_node]);
        let if_node = ast.alloc_node_with_children(NodeKind::If, vec![predicate, then_branch]);

        let src = source_queue(&[]);
        let mut rc = ByteReadCursor::new(src);
        let mut reader = ByteReader::new(&mut rc, ast.predefined);
        let dst = Rc::new(Queue::new());
        let mut wc = ByteWriteCursor::new(dst);
        let mut writer = ByteWriter::new(&mut wc, ast.predefined);
        let mut interp = Interpreter::new(&ast, &mut reader, &mut writer, ast.global_scope());
        interp.start(if_node, Modifier::WriteOnly);
        interp.read_backfilled().unwrap();
        assert!(interp.values.is_empty());
    }

    #[test]
    fn bounded_loop_writes_the_body_n_times() {
        let mut ast = SymbolTable::new();
        let count = ast.alloc_node(NodeKind::Integer(3));
        let push_value = ast.alloc_node(NodeKind::Integer(9));
        let write_node = ast.alloc_node(NodeKind::Write(IntTypeFormat::Uint8));
        let body = ast.alloc_node_with_children(NodeKind::Sequence, vec![push_value, write_node]);
        let loop_node = ast.alloc_node_with_children(NodeKind::Loop, vec![count, body]);

        let src = source_queue(&[]);
        let mut rc = ByteReadCursor::new(src);
        let mut reader = ByteReader::new(&mut rc, ast.predefined);

        let dst = Rc::new(Queue::new());
        let mut wc = ByteWriteCursor::new(dst.clone());
        {
            let mut writer = ByteWriter::new(&mut wc, ast.predefined);
            let mut interp = Interpreter::new(&ast, &mut reader, &mut writer, ast.global_scope());
            interp.start(loop_node, Modifier::WriteOnly);
            interp.read_backfilled().unwrap();
            writer.freeze_eof().unwrap();
        }

        let mut out = ByteReadCursor::new(dst);
        let mut check = ByteReader::new(&mut out, ast.predefined);
        for _ in 0..3 {
            assert_eq!(check.read_uint8().unwrap(), 9);
        }
        assert!(check.read_uint8().is_err());
    }

    #[test]
    fn block_node_frames_its_body_with_a_length_prefix() {
        let mut ast = SymbolTable::new();
        let push_value = ast.alloc_node(NodeKind::Integer(42));
        let write_node = ast.alloc_node(NodeKind::Write(IntTypeFormat::Uint8));
        let body = ast.alloc_node_with_children(NodeKind::Sequence, vec![push_value, write_node]);
        let block = ast.alloc_node_with_children(NodeKind::Block, vec![body]);

        let src = source_queue(&[]);
        let mut rc = ByteReadCursor::new(src);
        let mut reader = ByteReader::new(&mut rc, ast.predefined);

        let dst = Rc::new(Queue::new());
        let mut wc = ByteWriteCursor::new(dst.clone());
        {
            let mut writer = ByteWriter::new(&mut wc, ast.predefined);
            let mut interp = Interpreter::new(&ast, &mut reader, &mut writer, ast.global_scope());
            interp.start(block, Modifier::WriteOnly);
            interp.read_backfilled().unwrap();
            writer.freeze_eof().unwrap();
        }

        let mut out = ByteReadCursor::new(dst);
        let mut check = ByteReader::new(&mut out, ast.predefined);
        check.open_block().unwrap();
        assert_eq!(check.read_uint8().unwrap(), 42);
        check.close_block().unwrap();
    }
}
