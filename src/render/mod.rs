mod core;
mod stack;
mod value;

use std::sync::Arc;

use crate::render::core::Renderer;
pub use crate::render::stack::Stack;
use crate::types::program::Program;
use crate::value::ValueCow;
use crate::{Engine, Result, Value};

/// Renders a template with the given context.
///
/// The helpers are the bottom frame of the context stack and the context is
/// pushed on top of them, each only if it is not empty.
pub(crate) fn template(engine: &Engine, program: &Arc<Program>, context: &Value) -> Result<String> {
    let mut stack = Stack::new();
    let helpers = engine.helpers_value();
    if !helpers.is_empty() {
        stack.push(ValueCow::Borrowed(helpers));
    }
    if !context.is_empty() {
        stack.push(ValueCow::Borrowed(context));
    }
    let mut buf = String::with_capacity(program.source().len());
    Renderer::new(engine, stack, 0).run(program, &program.instrs, "", &mut buf)?;
    Ok(buf)
}

/// Renders a lambda generated template with the context of the lambda's call
/// site.
pub(crate) fn lambda(
    engine: &Engine,
    program: &Arc<Program>,
    stack: &Stack<'_>,
    depth: usize,
) -> Result<String> {
    let mut buf = String::new();
    Renderer::new(engine, stack.borrowed(), depth).run(program, &program.instrs, "", &mut buf)?;
    Ok(buf)
}
