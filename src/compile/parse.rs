use std::collections::BTreeSet;

use crate::compile::lex::{Kind, Token};
use crate::types::ast;
use crate::types::span::Span;
use crate::types::syntax::{Delimiters, Pragma};
use crate::{Error, Result};

/// A parser that constructs a parse tree from the lexer's tokens.
///
/// The parser is implemented as a simple hand written parser with no
/// recursion. Open tags are kept on a stack until their close tag is found.
pub struct Parser<'source> {
    /// The original template source.
    source: &'source str,

    /// The tokens produced by the lexer.
    tokens: std::vec::IntoIter<Token<'source>>,

    /// The pragmas enabled so far.
    pragmas: BTreeSet<Pragma>,
}

/// An open tag waiting for its close tag.
struct Open<'source> {
    kind: Block,
    name: ast::Name<'source>,
    span: Span,
    delims: Delimiters<'source>,
    indent: &'source str,
    standalone: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Block {
    Section,
    Inverted,
    Parent,
    Block,
}

impl<'source> Parser<'source> {
    /// Construct a new parser.
    pub fn new(
        source: &'source str,
        tokens: Vec<Token<'source>>,
        pragmas: BTreeSet<Pragma>,
    ) -> Self {
        Self {
            source,
            tokens: tokens.into_iter(),
            pragmas,
        }
    }

    /// Parses a template.
    ///
    /// This function works using two stacks:
    /// - A stack of open tags e.g. `{{# section }}`.
    /// - A stack of scopes which collect each parsed node.
    pub fn parse_template(mut self) -> Result<ast::Template<'source>> {
        let mut blocks: Vec<Open<'source>> = vec![];
        let mut scopes: Vec<Vec<ast::Node<'source>>> = vec![vec![]];

        while let Some(token) = self.tokens.next() {
            let node = match token.kind {
                Kind::Text => ast::Node::Text(token.span),

                Kind::Comment | Kind::Delimiters => continue,

                Kind::Pragma => {
                    // Unknown pragmas are not an error in templates, only in
                    // the engine configuration.
                    let name = token.content.split_whitespace().next().unwrap_or_default();
                    match name.parse::<Pragma>() {
                        Ok(pragma) => {
                            self.pragmas.insert(pragma);
                            ast::Node::Pragma(pragma)
                        }
                        Err(_) => {
                            tracing::debug!(pragma = name, "ignoring unknown pragma");
                            continue;
                        }
                    }
                }

                Kind::Escaped | Kind::Unescaped => ast::Node::Var(ast::Var {
                    name: self.name(&token),
                    escape: token.kind == Kind::Escaped,
                }),

                Kind::Partial => ast::Node::Partial(ast::Partial {
                    name: token.content,
                    indent: token.indent,
                }),

                Kind::Section | Kind::Inverted | Kind::Parent | Kind::Block => {
                    let kind = match token.kind {
                        Kind::Section => Block::Section,
                        Kind::Inverted => Block::Inverted,
                        Kind::Parent => Block::Parent,
                        _ => Block::Block,
                    };
                    let name = self.name(&token);
                    blocks.push(Open {
                        kind,
                        name,
                        span: token.span,
                        delims: token.delims,
                        indent: token.indent,
                        standalone: token.standalone,
                    });
                    scopes.push(vec![]);
                    continue;
                }

                Kind::Close => {
                    let open = match blocks.pop() {
                        Some(open) => open,
                        None => {
                            return Err(Error::syntax(
                                format!("unexpected closing tag `{}`", token.content),
                                self.source,
                                token.span,
                            ));
                        }
                    };
                    let close = self.name(&token);
                    if open.name.path != close.path {
                        return Err(Error::syntax(
                            format!(
                                "mismatched closing tag, expected `{}` found `{}`",
                                open.name.path, close.path
                            ),
                            self.source,
                            token.span,
                        ));
                    }

                    let nodes = scopes.pop().unwrap();
                    let body = Span::from(open.span.n..token.span.m);
                    let standalone = (open.standalone, token.standalone);
                    let in_parent = blocks.last().map_or(false, |b| b.kind == Block::Parent);
                    match open.kind {
                        Block::Section | Block::Inverted => ast::Node::Section(ast::Section {
                            name: open.name,
                            inverted: open.kind == Block::Inverted,
                            body,
                            delims: open.delims,
                            standalone,
                            nodes,
                        }),
                        Block::Parent => ast::Node::Parent(ast::Parent {
                            name: open.name.path,
                            indent: open.indent,
                            nodes,
                        }),
                        Block::Block => {
                            let block = ast::Block {
                                name: open.name.path,
                                body,
                                delims: open.delims,
                                standalone,
                                nodes,
                            };
                            if in_parent {
                                ast::Node::BlockArg(block)
                            } else {
                                ast::Node::BlockVar(block)
                            }
                        }
                    }
                }
            };
            scopes.last_mut().unwrap().push(node);
        }

        if let Some(open) = blocks.pop() {
            return Err(Error::syntax(
                format!("unclosed tag `{}`", open.name.path),
                self.source,
                open.span,
            ));
        }

        let nodes = scopes.pop().unwrap();
        assert!(scopes.is_empty(), "parser bug");
        Ok(ast::Template { nodes })
    }

    /// Returns the name of a tag, splitting off filters only when the
    /// `FILTERS` pragma is enabled.
    fn name(&self, token: &Token<'source>) -> ast::Name<'source> {
        if self.pragmas.contains(&Pragma::Filters) {
            ast::Name {
                path: token.name,
                filters: token.filters.clone(),
                span: token.span,
            }
        } else {
            ast::Name {
                path: token.content,
                filters: Vec::new(),
                span: token.span,
            }
        }
    }
}
