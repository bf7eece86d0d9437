use std::sync::Arc;

use indexmap::IndexMap;

use crate::render::value::lookup_path;
use crate::types::program::{Key, Lookup, Program, Var};
use crate::value::ValueCow;
use crate::Value;

/// The value of a lookup that found nothing.
static NONE: Value = Value::None;

/// The context stack.
///
/// Frames are searched from the top, the most recently pushed frame, down.
/// Inheritance block overrides live on a separate overlay stack.
#[cfg_attr(internal_debug, derive(Debug))]
pub struct Stack<'render> {
    frames: Vec<ValueCow<'render>>,
    blocks: Vec<BlockFrame>,
}

/// The block overrides supplied where a parent template is invoked.
pub(crate) type BlockFrame = IndexMap<String, BlockRef>;

/// A reference to a block override in the program that defines it.
#[derive(Clone)]
#[cfg_attr(internal_debug, derive(Debug))]
pub(crate) struct BlockRef {
    pub program: Arc<Program>,
    pub key: Key,
}

impl<'render> Stack<'render> {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Returns a stack with the same frames, borrowing from this one.
    pub fn borrowed(&self) -> Stack<'_> {
        Stack {
            frames: self.frames.iter().map(|f| ValueCow::Borrowed(&**f)).collect(),
            blocks: self.blocks.clone(),
        }
    }

    pub fn push(&mut self, frame: ValueCow<'render>) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> ValueCow<'render> {
        self.frames.pop().expect("unbalanced context stack")
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Looks up a variable using the method chosen at compile time.
    pub fn lookup(&self, var: &Var) -> ValueCow<'render> {
        match var.lookup {
            Lookup::Last => self.last(),
            Lookup::Find => self.find(&var.name),
            Lookup::Dot => self.find_dot(&var.name),
            Lookup::AnchoredDot => self.find_anchored_dot(&var.name),
        }
    }

    /// Returns the top frame itself.
    pub fn last(&self) -> ValueCow<'render> {
        match self.frames.last() {
            Some(frame) => lookup_path(frame, &[]).unwrap_or(ValueCow::Borrowed(&NONE)),
            None => ValueCow::Borrowed(&NONE),
        }
    }

    /// Finds a name in the first frame that has it.
    pub fn find(&self, name: &str) -> ValueCow<'render> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| lookup_path(frame, &[name]))
            .unwrap_or(ValueCow::Borrowed(&NONE))
    }

    /// Finds the first segment of a dotted path in the first frame that has
    /// it and resolves the rest of the path within that value only.
    pub fn find_dot(&self, path: &str) -> ValueCow<'render> {
        let segments: Vec<_> = path.split('.').collect();
        self.frames
            .iter()
            .rev()
            .find(|frame| lookup_path(frame, &segments[..1]).is_some())
            .and_then(|frame| lookup_path(frame, &segments))
            .unwrap_or(ValueCow::Borrowed(&NONE))
    }

    /// Resolves a path starting with `.` within the top frame only.
    pub fn find_anchored_dot(&self, path: &str) -> ValueCow<'render> {
        let segments: Vec<_> = path
            .strip_prefix('.')
            .unwrap_or(path)
            .split('.')
            .collect();
        self.frames
            .last()
            .and_then(|frame| lookup_path(frame, &segments))
            .unwrap_or(ValueCow::Borrowed(&NONE))
    }

    /// Finds the override for a block, the most derived template wins.
    pub fn find_in_block(&self, name: &str) -> Option<&BlockRef> {
        self.blocks.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Pushes the block overrides of a parent invocation.
    ///
    /// Parents are invoked from the most derived template outwards, so a block
    /// that already has an override keeps it.
    pub fn push_block_context(&mut self, mut frame: BlockFrame) {
        frame.retain(|name, _| self.find_in_block(name).is_none());
        self.blocks.push(frame);
    }

    pub fn pop_block_context(&mut self) {
        self.blocks.pop().expect("unbalanced block context stack");
    }
}
