use std::io::Write;

use tracing::debug;

use crate::arena::{Arena, FrameId};
use crate::builtin;
use crate::error::Result;
use crate::read;
use crate::scheme::Scheme;

/// One interpreter instance: the arena holding every frame and cell, plus the
/// global frame with the primitives bound in it.
#[derive(Debug)]
pub struct Interpreter {
    pub(crate) arena: Arena,
    pub(crate) global: FrameId,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

/// Text printed for the result of the top-level `form`, if any. `Void` and
/// `()` print nothing. A primitive reached through a bare symbol is tagged
/// with that symbol.
pub fn render(form: &Scheme, value: &Scheme) -> Option<String> {
    if value.is_void() || value.is_null() {
        return None;
    }
    let primitive = value.as_procedure().map_or(false, |procc| !procc.is_lambda());
    match form.as_symbol() {
        Some(name) if primitive => Some(format!("{}:{}", value, name)),
        _ => Some(value.to_string()),
    }
}

impl Interpreter {
    pub fn new() -> Interpreter {
        let mut arena = Arena::new();
        let global = builtin::initial_environment(&mut arena);
        Interpreter { arena, global }
    }

    /// Evaluate one top-level form in a fresh frame whose parent is the
    /// global frame.
    pub fn eval_top_level(&mut self, form: &Scheme) -> Result<Scheme> {
        debug!(form = %form, "evaluating top-level form");
        let frame = self.arena.alloc_frame(Some(self.global));
        self.eval(form, frame)
    }

    /// Read and evaluate a whole program, returning the value of every form.
    pub fn eval_str(&mut self, src: &str) -> Result<Vec<Scheme>> {
        let forms = read::read_program(src)?;
        forms.iter().map(|form| self.eval_top_level(form)).collect()
    }

    /// Read and evaluate a whole program, writing each printable result to
    /// `out` as soon as it is produced. Stops at the first error.
    pub fn run<W: Write>(&mut self, src: &str, out: &mut W) -> Result<()> {
        let forms = read::read_program(src)?;
        for form in &forms {
            let value = self.eval_top_level(form)?;
            if let Some(text) = render(form, &value) {
                writeln!(out, "{}", text)?;
            }
        }
        Ok(())
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        debug!(
            frames = self.arena.frame_count(),
            cells = self.arena.cell_count(),
            "releasing arena"
        );
    }
}
