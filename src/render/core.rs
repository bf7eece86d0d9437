use std::sync::Arc;

use crate::fmt::{escape_html, to_text};
use crate::lambda::LambdaHelper;
use crate::render::stack::{BlockFrame, BlockRef, Stack};
use crate::render::value::{callable, into_frames};
use crate::types::program::{Escape, Instr, Program, Section};
use crate::value::ValueCow;
use crate::{Engine, Error, Result, Value};

/// Interprets the instructions of a program against a context stack.
#[cfg_attr(internal_debug, derive(Debug))]
pub struct Renderer<'render> {
    engine: &'render Engine,
    stack: Stack<'render>,
    /// The number of partials and parents currently being rendered.
    depth: usize,
    /// Whether the output is at the start of a template line, where the
    /// indent of the enclosing partial is due.
    line_start: bool,
}

impl<'render> Renderer<'render> {
    pub fn new(engine: &'render Engine, stack: Stack<'render>, depth: usize) -> Self {
        Self {
            engine,
            stack,
            depth,
            line_start: true,
        }
    }

    /// Runs the instructions, which belong to the given program, appending
    /// the output to the buffer.
    ///
    /// Every frame pushed onto the stack is popped again before returning,
    /// even on error.
    pub fn run(
        &mut self,
        program: &Arc<Program>,
        instrs: &[Instr],
        indent: &str,
        buf: &mut String,
    ) -> Result<()> {
        let source = program.source();

        // An expression that we are building
        let mut expr: Option<ValueCow<'render>> = None;
        let mut pc = 0;

        while let Some(instr) = instrs.get(pc) {
            match instr {
                Instr::EmitRaw(span) => {
                    let text = &source[*span];
                    if self.line_start {
                        buf.push_str(indent);
                    }
                    buf.push_str(text);
                    self.line_start = text.ends_with('\n');
                }

                Instr::Lookup(var) => {
                    let prev = expr.replace(self.stack.lookup(var));
                    debug_assert!(prev.is_none());
                }

                Instr::Resolve(span) => {
                    let value = expr.take().unwrap();
                    let value = match callable(&value, program.strict_callables).cloned() {
                        Some(lambda) => {
                            let result = lambda
                                .call_interp()
                                .map_err(|e| e.enrich(source, *span))?;
                            let text = to_text(&result)
                                .map_err(|msg| Error::render(msg, source, *span))?;
                            let lambda = self.engine.load_lambda(&text, None)?;
                            let mut s = String::new();
                            let line_start = self.line_start;
                            self.enter()?;
                            let result = self.run(&lambda, &lambda.instrs, "", &mut s);
                            self.depth -= 1;
                            self.line_start = line_start;
                            result?;
                            ValueCow::Owned(Value::String(s))
                        }
                        None => value,
                    };
                    expr = Some(value);
                }

                Instr::Apply(var) => {
                    let value = expr.take().unwrap();
                    let filter = self.stack.lookup(var);
                    let lambda = match callable(&filter, program.strict_callables) {
                        Some(lambda) => lambda,
                        None => return Err(Error::unknown_filter(&var.name, source, var.span)),
                    };
                    let result = lambda
                        .call_filter(value.into_owned())
                        .map_err(|e| e.enrich(source, var.span))?;
                    expr = Some(ValueCow::Owned(result));
                }

                Instr::Emit { escape, span } => {
                    let value = expr.take().unwrap();
                    let text =
                        to_text(&value).map_err(|msg| Error::render(msg, source, *span))?;
                    if self.line_start {
                        buf.push_str(indent);
                        self.line_start = false;
                    }
                    if *escape {
                        self.escape(program, &text, buf);
                    } else {
                        buf.push_str(&text);
                    }
                }

                Instr::Section(key) => {
                    let value = expr.take().unwrap();
                    let section = &program.sections[key];
                    self.render_section(program, section, value, indent, buf)?;
                }

                Instr::JumpIfNotEmpty(j) => {
                    if !expr.take().unwrap().is_empty() {
                        pc = *j;
                        continue;
                    }
                }

                Instr::Partial {
                    name,
                    indent: captured,
                } => {
                    if let Some(partial) = self.engine.load_partial(name)? {
                        let indent = format!("{indent}{captured}");
                        self.enter()?;
                        let result = self.run(&partial, &partial.instrs, &indent, buf);
                        self.depth -= 1;
                        result?;
                    }
                }

                Instr::Parent {
                    name,
                    indent: captured,
                    args,
                } => {
                    if let Some(parent) = self.engine.load_partial(name)? {
                        let frame: BlockFrame = args
                            .iter()
                            .map(|(name, key)| {
                                let block = BlockRef {
                                    program: Arc::clone(program),
                                    key: *key,
                                };
                                (name.clone(), block)
                            })
                            .collect();
                        let indent = format!("{indent}{captured}");
                        self.enter()?;
                        self.stack.push_block_context(frame);
                        let result = self.run(&parent, &parent.instrs, &indent, buf);
                        self.stack.pop_block_context();
                        self.depth -= 1;
                        result?;
                    }
                }

                Instr::BlockVar { name, jump } => {
                    if let Some(BlockRef { program, key }) = self.stack.find_in_block(name).cloned()
                    {
                        let block = &program.blocks[&key];
                        self.enter()?;
                        let result = self.run(&program, &block.instrs, "", buf);
                        self.depth -= 1;
                        result?;
                        pc = *jump;
                        continue;
                    }
                }
            }
            pc += 1;
        }

        debug_assert!(expr.is_none());

        Ok(())
    }

    fn render_section(
        &mut self,
        program: &Arc<Program>,
        section: &Section,
        value: ValueCow<'render>,
        indent: &str,
        buf: &mut String,
    ) -> Result<()> {
        let source = program.source();

        if let Some(lambda) = callable(&value, program.strict_callables).cloned() {
            let text = &source[section.body];
            let helper = LambdaHelper {
                engine: self.engine,
                stack: &self.stack,
                delims: section.delims.as_deref(),
                depth: self.depth,
            };
            let result = lambda
                .call_section(text, &helper)
                .map_err(|e| e.enrich(source, section.body))?;
            let result = to_text(&result).map_err(|msg| Error::render(msg, source, section.body))?;
            if result.contains(section.open.as_str()) {
                let lambda = self.engine.load_lambda(&result, section.delims.as_deref())?;
                self.enter()?;
                let result = self.run(&lambda, &lambda.instrs, indent, buf);
                self.depth -= 1;
                result?;
            } else if !result.is_empty() {
                if self.line_start {
                    buf.push_str(indent);
                }
                buf.push_str(&result);
                self.line_start = result.ends_with('\n');
            }
            return Ok(());
        }

        if value.is_empty() {
            return Ok(());
        }

        for frame in into_frames(value) {
            self.stack.push(frame);
            let result = self.run(program, &section.instrs, indent, buf);
            self.stack.pop();
            result?;
        }
        Ok(())
    }

    fn escape(&self, program: &Program, text: &str, buf: &mut String) {
        match (program.escape, &self.engine.escape) {
            (Escape::Custom, Some(escape)) => buf.push_str(&escape(text)),
            (Escape::Html(flags), _) => buf.push_str(&escape_html(text, flags)),
            (Escape::Custom, None) => buf.push_str(&escape_html(text, self.engine.entity_flags)),
        }
    }

    /// Enters a partial, parent, block override or lambda template, failing
    /// if they are nested too deeply.
    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.engine.max_partial_depth {
            return Err(Error::max_partial_depth(self.engine.max_partial_depth));
        }
        self.depth += 1;
        Ok(())
    }
}
