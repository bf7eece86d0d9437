//! Compile the template into a program that can be executed by the renderer.
//!
//! This process has three stages:
//! - The lexer chunks the template source into tokens.
//! - The parser constructs a parse tree from the tokens.
//! - The compiler takes the parse tree and constructs the program.

mod lex;
mod parse;

use std::collections::BTreeSet;
use std::mem;
use std::slice;

use indexmap::IndexMap;

use crate::types::ast;
use crate::types::program::{Block, Escape, Instr, Key, Lookup, Program, Section, Var, FIXME};
use crate::types::span::Span;
use crate::types::syntax::{Delimiters, Pragma};
use crate::{Engine, Result};

/// Compile a template into a program.
pub(crate) fn template(engine: &Engine, source: String, key: Key) -> Result<Program> {
    let Compiled {
        instrs,
        sections,
        blocks,
    } = {
        let tokens = lex::Lexer::new(&source, &engine.pragmas).tokenize()?;
        let tree = parse::Parser::new(&source, tokens, engine.pragmas.clone()).parse_template()?;
        Compiler::new(&source, engine.pragmas.clone()).compile_template(tree)
    };

    let escape = match engine.escape {
        Some(_) => Escape::Custom,
        None => Escape::Html(engine.entity_flags),
    };

    Ok(Program {
        key,
        source,
        escape,
        strict_callables: engine.strict_callables,
        instrs,
        sections,
        blocks,
    })
}

struct Compiled {
    instrs: Vec<Instr>,
    sections: IndexMap<Key, Section>,
    blocks: IndexMap<Key, Block>,
}

/// A compiler that constructs a program from a parse tree.
struct Compiler<'source> {
    source: &'source str,

    /// The pragmas enabled so far, they only affect the nodes after them.
    pragmas: BTreeSet<Pragma>,

    instrs: Vec<Instr>,
    sections: IndexMap<Key, Section>,
    blocks: IndexMap<Key, Block>,
}

impl<'source> Compiler<'source> {
    fn new(source: &'source str, pragmas: BTreeSet<Pragma>) -> Self {
        Self {
            source,
            pragmas,
            instrs: Vec::new(),
            sections: IndexMap::new(),
            blocks: IndexMap::new(),
        }
    }

    fn compile_template(mut self, template: ast::Template<'source>) -> Compiled {
        self.compile_nodes(template.nodes);
        Compiled {
            instrs: self.instrs,
            sections: self.sections,
            blocks: self.blocks,
        }
    }

    fn compile_nodes(&mut self, nodes: Vec<ast::Node<'source>>) {
        for node in nodes {
            self.compile_node(node);
        }
    }

    fn compile_node(&mut self, node: ast::Node<'source>) {
        match node {
            ast::Node::Pragma(pragma) => {
                self.pragmas.insert(pragma);
            }

            ast::Node::Text(span) => {
                self.push(Instr::EmitRaw(span));
            }

            ast::Node::Var(ast::Var { name, escape }) => {
                let span = name.span;
                self.compile_name(name);
                self.push(Instr::Emit { escape, span });
            }

            ast::Node::Section(ast::Section {
                name,
                inverted: false,
                body,
                delims,
                standalone,
                nodes,
            }) => {
                let key = self.section_key(body, delims, standalone);
                if !self.sections.contains_key(&key) {
                    let instrs = self.compile_body(nodes);
                    self.sections.insert(
                        key,
                        Section {
                            body,
                            delims: delims.change_tag(),
                            open: delims.open.to_owned(),
                            instrs,
                        },
                    );
                }
                self.compile_filtered(name);
                self.push(Instr::Section(key));
            }

            ast::Node::Section(ast::Section {
                name,
                inverted: true,
                nodes,
                ..
            }) => {
                self.compile_filtered(name);
                let j = self.push(Instr::JumpIfNotEmpty(FIXME));
                self.compile_nodes(nodes);
                self.update_jump(j);
            }

            ast::Node::Partial(ast::Partial { name, indent }) => {
                self.push(Instr::Partial {
                    name: name.to_owned(),
                    indent: indent.to_owned(),
                });
            }

            ast::Node::Parent(ast::Parent {
                name,
                indent,
                nodes,
            }) => {
                // Only the block arguments of a parent tag are compiled,
                // anything else between the open and close tags is ignored.
                let mut args = Vec::new();
                for node in nodes {
                    match node {
                        ast::Node::BlockArg(block) => {
                            args.push((block.name.to_owned(), self.compile_block(block)));
                        }
                        node => self.skip_nodes(slice::from_ref(&node)),
                    }
                }
                self.push(Instr::Parent {
                    name: name.to_owned(),
                    indent: indent.to_owned(),
                    args,
                });
            }

            ast::Node::BlockArg(block) => {
                // The parser only produces block arguments inside parents.
                unreachable!("block argument `{}` outside of a parent", block.name)
            }

            ast::Node::BlockVar(ast::Block { name, nodes, .. }) => {
                let j = self.push(Instr::BlockVar {
                    name: name.to_owned(),
                    jump: FIXME,
                });
                self.compile_nodes(nodes);
                self.update_jump(j);
            }
        }
    }

    /// Compiles a block override and returns its key.
    fn compile_block(&mut self, block: ast::Block<'source>) -> Key {
        let key = self.section_key(block.body, block.delims, block.standalone);
        if !self.blocks.contains_key(&key) {
            let instrs = self.compile_body(block.nodes);
            self.blocks.insert(key, Block { instrs });
        }
        key
    }

    /// Applies the pragmas found in nodes that are not compiled, so that they
    /// still affect the nodes after them.
    fn skip_nodes(&mut self, nodes: &[ast::Node<'source>]) {
        for node in nodes {
            match node {
                ast::Node::Pragma(pragma) => {
                    self.pragmas.insert(*pragma);
                }
                ast::Node::Section(ast::Section { nodes, .. })
                | ast::Node::Parent(ast::Parent { nodes, .. })
                | ast::Node::BlockArg(ast::Block { nodes, .. })
                | ast::Node::BlockVar(ast::Block { nodes, .. }) => self.skip_nodes(nodes),
                _ => {}
            }
        }
    }

    /// The de-duplication key of a section or block body.
    ///
    /// Bodies with the same text compiled with the same delimiters and
    /// pragmas always compile to the same instructions, as long as the
    /// whitespace at their edges was removed in the same way.
    fn section_key(&self, body: Span, delims: Delimiters<'_>, standalone: (bool, bool)) -> Key {
        let tag = delims.change_tag().unwrap_or_default();
        let edges = match standalone {
            (false, false) => "00",
            (false, true) => "01",
            (true, false) => "10",
            (true, true) => "11",
        };
        let mut pragmas: Vec<_> = self.pragmas.iter().map(Pragma::as_str).collect();
        pragmas.sort_unstable();
        let pragmas = pragmas.join(" ");
        Key::digest([
            tag.as_str(),
            "\n",
            edges,
            "\n",
            pragmas.as_str(),
            "\n",
            &self.source[body],
        ])
    }

    /// Compiles nodes into their own instruction list.
    fn compile_body(&mut self, nodes: Vec<ast::Node<'source>>) -> Vec<Instr> {
        let outer = mem::take(&mut self.instrs);
        self.compile_nodes(nodes);
        mem::replace(&mut self.instrs, outer)
    }

    /// Looks up a name, resolves lambdas and then applies any filters.
    fn compile_name(&mut self, name: ast::Name<'source>) {
        let span = name.span;
        self.push(Instr::Lookup(self.var(name.path, span)));
        self.push(Instr::Resolve(span));
        for filter in name.filters {
            self.push(Instr::Apply(self.var(filter, span)));
        }
    }

    /// Looks up a name and applies any filters, without resolving lambdas so
    /// that sections can call them with their raw text.
    fn compile_filtered(&mut self, name: ast::Name<'source>) {
        let span = name.span;
        self.push(Instr::Lookup(self.var(name.path, span)));
        for filter in name.filters {
            self.push(Instr::Apply(self.var(filter, span)));
        }
    }

    fn var(&self, name: &str, span: Span) -> Var {
        Var {
            lookup: self.lookup(name),
            name: name.to_owned(),
            span,
        }
    }

    /// Selects how a name is looked up in the context stack.
    fn lookup(&self, name: &str) -> Lookup {
        if name == "." {
            Lookup::Last
        } else if self.pragmas.contains(&Pragma::AnchoredDot) && name.starts_with('.') {
            Lookup::AnchoredDot
        } else if !name.contains('.') {
            Lookup::Find
        } else {
            Lookup::Dot
        }
    }

    fn update_jump(&mut self, i: usize) {
        let n = self.instrs.len();
        let j = match &mut self.instrs[i] {
            Instr::JumpIfNotEmpty(j) | Instr::BlockVar { jump: j, .. } => j,
            _ => panic!("not a jump instr"),
        };
        *j = n;
    }

    fn push(&mut self, instr: Instr) -> usize {
        let i = self.instrs.len();
        self.instrs.push(instr);
        i
    }
}
