use tracing::trace;

use crate::error::{Error, Result};
use crate::scheme::Scheme;

/// Index of a frame in the arena. Frames are never freed individually, so an
/// id stays valid for the life of the arena that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, gc::Finalize)]
pub struct FrameId(usize);

unsafe impl gc::Trace for FrameId {
    gc::unsafe_empty_trace!();
}

/// Index of a value-cell in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellId(usize);

/// One `(symbol, cell)` entry of a binding table.
#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    pub name: String,
    pub cell: CellId,
}

#[derive(Debug)]
struct Frame {
    parent: Option<FrameId>,
    // Later entries shadow earlier ones.
    bindings: Vec<Binding>,
}

/// Pool backing every frame and value-cell of one interpreter. Everything is
/// released together when the arena is dropped.
#[derive(Debug, Default)]
pub struct Arena {
    frames: Vec<Frame>,
    cells: Vec<Scheme>,
}

impl Arena {
    pub fn new() -> Arena {
        Arena::default()
    }

    pub fn alloc_frame(&mut self, parent: Option<FrameId>) -> FrameId {
        let id = FrameId(self.frames.len());
        self.frames.push(Frame {
            parent,
            bindings: Vec::new(),
        });
        trace!(frame = id.0, parent = ?parent.map(|p| p.0), "allocated frame");
        id
    }

    pub fn alloc_cell(&mut self, value: Scheme) -> CellId {
        let id = CellId(self.cells.len());
        self.cells.push(value);
        id
    }

    pub fn get(&self, cell: CellId) -> &Scheme {
        &self.cells[cell.0]
    }

    pub fn set(&mut self, cell: CellId, value: Scheme) {
        self.cells[cell.0] = value;
    }

    /// Add a binding to `frame` in a fresh cell, shadowing any earlier one of
    /// the same name.
    pub fn bind(&mut self, frame: FrameId, name: &str, value: Scheme) -> CellId {
        let cell = self.alloc_cell(value);
        self.frames[frame.0].bindings.push(Binding {
            name: name.to_string(),
            cell,
        });
        cell
    }

    pub fn bindings(&self, frame: FrameId) -> &[Binding] {
        &self.frames[frame.0].bindings
    }

    /// Swap in a whole new binding table, returning the old one.
    pub fn replace_bindings(&mut self, frame: FrameId, bindings: Vec<Binding>) -> Vec<Binding> {
        std::mem::replace(&mut self.frames[frame.0].bindings, bindings)
    }

    /// Resolve `name` starting at `frame`, yielding the cell that holds it.
    ///
    /// A binding whose value is itself a symbol is an alias: resolution
    /// continues with that symbol from the parent of the frame holding the
    /// alias, so an alias cell is never returned. Running off the top of the
    /// chain is an unbound-identifier error.
    fn resolve(&self, name: &str, frame: FrameId) -> Result<CellId> {
        let data = &self.frames[frame.0];
        if let Some(binding) = data.bindings.iter().rev().find(|b| b.name == name) {
            if let Some(alias) = self.get(binding.cell).as_symbol() {
                return match data.parent {
                    Some(parent) => self.resolve(alias, parent),
                    None => Err(Error::unbound(alias)),
                };
            }
            return Ok(binding.cell);
        }
        match data.parent {
            Some(parent) => self.resolve(name, parent),
            None => Err(Error::unbound(name)),
        }
    }

    /// Read path: the value `name` currently resolves to.
    pub fn lookup_value(&self, name: &str, frame: FrameId) -> Result<Scheme> {
        self.resolve(name, frame).map(|cell| self.get(cell).clone())
    }

    /// Mutation path used by `set!`. Aliases are followed, so the cell
    /// returned is the one holding the aliased value.
    pub fn lookup_cell(&self, name: &str, frame: FrameId) -> Result<CellId> {
        self.resolve(name, frame)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
