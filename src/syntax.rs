use std::collections::HashMap;

use lazy_static::lazy_static;
use maplit::hashmap;
use tracing::debug;

use crate::arena::{Binding, FrameId};
use crate::error::{Error, Result};
use crate::interpreter::Interpreter;
use crate::runtime::Procedure;
use crate::scheme::Scheme;

/// Special-form keywords. These are recognised by name at the head of a form
/// before any variable lookup happens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Keyword {
    If,
    And,
    Or,
    Cond,
    Quote,
    Set,
    Begin,
    Define,
    Lambda,
    Let,
    LetStar,
    Letrec,
}

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, Keyword> = hashmap! {
        "if" => Keyword::If,
        "and" => Keyword::And,
        "or" => Keyword::Or,
        "cond" => Keyword::Cond,
        "quote" => Keyword::Quote,
        "set!" => Keyword::Set,
        "begin" => Keyword::Begin,
        "define" => Keyword::Define,
        "lambda" => Keyword::Lambda,
        "let" => Keyword::Let,
        "let*" => Keyword::LetStar,
        "letrec" => Keyword::Letrec,
    };
}

const ELSE: &str = "else";

impl Keyword {
    pub fn from_symbol(name: &str) -> Option<Keyword> {
        KEYWORDS.get(name).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Keyword::If => "if",
            Keyword::And => "and",
            Keyword::Or => "or",
            Keyword::Cond => "cond",
            Keyword::Quote => "quote",
            Keyword::Set => "set!",
            Keyword::Begin => "begin",
            Keyword::Define => "define",
            Keyword::Lambda => "lambda",
            Keyword::Let => "let",
            Keyword::LetStar => "let*",
            Keyword::Letrec => "letrec",
        }
    }
}

/// Forms that still run when they are not the last form of a body.
pub fn is_effect_form(form: &Scheme) -> bool {
    matches!(
        form.head_symbol().and_then(Keyword::from_symbol),
        Some(Keyword::Set) | Some(Keyword::Begin)
    )
}

fn render_operands(args: &[Scheme]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn expect_boolean(value: &Scheme, msg: &str) -> Result<bool> {
    value.as_boolean().ok_or_else(|| Error::Type(msg.to_string()))
}

impl Interpreter {
    pub(crate) fn eval_special(&mut self, keyword: Keyword, operands: &Scheme, frame: FrameId) -> Result<Scheme> {
        let args = operands
            .to_vec()
            .ok_or_else(|| Error::syntax(format!("{}: bad syntax", keyword.name())))?;

        match keyword {
            Keyword::If => self.eval_if(&args, frame),
            Keyword::And => self.eval_and(&args, frame),
            Keyword::Or => self.eval_or(&args, frame),
            Keyword::Cond => self.eval_cond(&args, frame),
            Keyword::Quote => eval_quote(&args),
            Keyword::Set => self.eval_set(&args, frame),
            Keyword::Begin => self.eval_sequence(&args, frame),
            Keyword::Define => self.eval_define(&args, frame),
            Keyword::Lambda => eval_lambda(&args, frame),
            Keyword::Let => self.eval_let(&args, frame),
            Keyword::LetStar => self.eval_let_star(&args, frame),
            Keyword::Letrec => self.eval_letrec(&args, frame),
        }
    }

    fn eval_if(&mut self, args: &[Scheme], frame: FrameId) -> Result<Scheme> {
        if args.len() != 3 {
            return Err(Error::syntax("if: doesn't have exactly 3 arguments"));
        }
        let test = self.eval(&args[0], frame)?;
        if expect_boolean(&test, "if: test arg is not a boolean")? {
            self.eval(&args[1], frame)
        } else {
            self.eval(&args[2], frame)
        }
    }

    fn eval_and(&mut self, args: &[Scheme], frame: FrameId) -> Result<Scheme> {
        for arg in args {
            let value = self.eval(arg, frame)?;
            if !expect_boolean(&value, "and: bool? expected for arguments")? {
                return Ok(Scheme::boolean(false));
            }
        }
        Ok(Scheme::boolean(true))
    }

    fn eval_or(&mut self, args: &[Scheme], frame: FrameId) -> Result<Scheme> {
        for arg in args {
            let value = self.eval(arg, frame)?;
            if expect_boolean(&value, "or: bool? expected for arguments")? {
                return Ok(Scheme::boolean(true));
            }
        }
        Ok(Scheme::boolean(false))
    }

    fn eval_cond(&mut self, clauses: &[Scheme], frame: FrameId) -> Result<Scheme> {
        for clause in clauses {
            let parts = clause
                .to_vec()
                .filter(|parts| !parts.is_empty())
                .ok_or_else(|| Error::syntax("cond: arguments formatted incorrectly"))?;
            if parts[0].as_symbol() == Some(ELSE) {
                return self.eval_sequence(&parts[1..], frame);
            }
            let test = self.eval(&parts[0], frame)?;
            if expect_boolean(&test, "cond: bool? expected for conditional arg")? {
                if parts.len() == 1 {
                    return Ok(test);
                }
                return self.eval_sequence(&parts[1..], frame);
            }
        }
        Ok(Scheme::null())
    }

    fn eval_set(&mut self, args: &[Scheme], frame: FrameId) -> Result<Scheme> {
        if args.len() != 2 {
            return Err(Error::syntax("set!: doesn't have exactly two arguments"));
        }
        let name = args[0]
            .as_symbol()
            .ok_or_else(|| Error::syntax(format!("set!: not an identifier in: {}", args[0])))?;
        let value = self.eval(&args[1], frame)?;
        let cell = self.arena.lookup_cell(name, frame)?;
        // A symbol is stored as an alias, so its target must already exist.
        if let Some(target) = value.as_symbol() {
            self.arena.lookup_value(target, frame)?;
        }
        self.arena.set(cell, value);
        Ok(Scheme::null())
    }

    /// `begin` semantics: evaluate everything, keep the last value.
    fn eval_sequence(&mut self, forms: &[Scheme], frame: FrameId) -> Result<Scheme> {
        let mut last = Scheme::null();
        for form in forms {
            last = self.eval(form, frame)?;
        }
        Ok(last)
    }

    // `define` always binds in the global frame, whatever the current scope.
    fn eval_define(&mut self, args: &[Scheme], frame: FrameId) -> Result<Scheme> {
        let name = match args.first() {
            Some(first) => first
                .as_symbol()
                .ok_or_else(|| Error::syntax(format!("bad syntax in: {}", first)))?,
            None => return Err(Error::syntax("define: bad syntax in: (define)")),
        };
        if args.len() < 2 {
            return Err(Error::syntax(format!(
                "define: bad syntax\n(missing expression after identifier): (define {})",
                render_operands(args)
            )));
        } else if args.len() > 2 {
            return Err(Error::syntax(format!(
                "define: bad syntax\n(multiple expressions after identifier): (define {})",
                render_operands(args)
            )));
        }
        let value = self.eval(&args[1], frame)?;
        debug!(name, value = %value, "define");
        self.arena.bind(self.global, name, value);
        Ok(Scheme::void())
    }

    fn eval_let(&mut self, args: &[Scheme], frame: FrameId) -> Result<Scheme> {
        let (bindings, body) = self.check_let(Keyword::Let, args, frame)?;
        let mut values = Vec::with_capacity(bindings.len());
        for (name, expr) in &bindings {
            values.push((name, self.eval(expr, frame)?));
        }
        let child = self.arena.alloc_frame(Some(frame));
        for (name, value) in values {
            self.arena.bind(child, name, value);
        }
        self.execute_body(body, child)
    }

    // Each binding is made visible to the next by temporarily extending the
    // outer frame. The outer frame gets its old table back afterwards and the
    // body sees the accumulated bindings through a fresh child frame.
    fn eval_let_star(&mut self, args: &[Scheme], frame: FrameId) -> Result<Scheme> {
        let (bindings, body) = self.check_let(Keyword::LetStar, args, frame)?;
        let saved = self.arena.bindings(frame).to_vec();
        let added = self.bind_sequentially(&bindings, frame);
        self.arena.replace_bindings(frame, saved);
        let added = added?;

        let child = self.arena.alloc_frame(Some(frame));
        self.arena.replace_bindings(child, added);
        self.execute_body(body, child)
    }

    fn bind_sequentially(&mut self, bindings: &[(String, Scheme)], frame: FrameId) -> Result<Vec<Binding>> {
        let mut added = Vec::with_capacity(bindings.len());
        for (name, expr) in bindings {
            let value = self.eval(expr, frame)?;
            let cell = self.arena.bind(frame, name, value);
            added.push(Binding {
                name: name.clone(),
                cell,
            });
        }
        Ok(added)
    }

    // Names exist, unusable, before any initializer runs; initializers run in
    // the new frame so closures they build capture it.
    fn eval_letrec(&mut self, args: &[Scheme], frame: FrameId) -> Result<Scheme> {
        let (bindings, body) = self.check_let(Keyword::Letrec, args, frame)?;
        let child = self.arena.alloc_frame(Some(frame));
        for (name, _) in &bindings {
            self.arena.bind(child, name, Scheme::undefined());
        }

        let mut values = Vec::with_capacity(bindings.len());
        for (_, expr) in &bindings {
            values.push(self.eval(expr, child)?);
        }
        let mut initialized = Vec::with_capacity(bindings.len());
        for ((name, _), value) in bindings.iter().zip(values) {
            initialized.push(Binding {
                name: name.clone(),
                cell: self.arena.alloc_cell(value),
            });
        }
        self.arena.replace_bindings(child, initialized);
        self.execute_body(body, child)
    }

    /// Validate the shape of a `let`-family form before anything in it is
    /// evaluated. Yields the `(name, expression)` pairs and the body.
    fn check_let<'a>(
        &self,
        keyword: Keyword,
        args: &'a [Scheme],
        frame: FrameId,
    ) -> Result<(Vec<(String, Scheme)>, &'a [Scheme])> {
        let form = keyword.name();
        let binding_list = match args.first() {
            Some(first) => first.to_vec().ok_or_else(|| {
                Error::syntax(format!("{}: first arg should be list of bindings", form))
            })?,
            None => Vec::new(),
        };
        if args.len() < 2 {
            return Err(Error::syntax(format!(
                "{}: needs two arguments (1) a list of bindings (2) body",
                form
            )));
        }

        let mut bindings = Vec::with_capacity(binding_list.len());
        for binding in &binding_list {
            let parts = binding
                .to_vec()
                .ok_or_else(|| Error::syntax(format!("{}: bindings formatted incorrectly", form)))?;
            let name = match parts.first() {
                Some(first) => first.as_symbol().ok_or_else(|| {
                    Error::syntax(format!("{}: {} not an identifier", form, first))
                })?,
                None => {
                    return Err(Error::syntax(format!("{}: bindings formatted incorrectly", form)))
                }
            };
            if parts.len() != 2 {
                return Err(Error::syntax(format!("{}: bindings formatted incorrectly", form)));
            }
            // Only plain `let` rejects a forward reference up front.
            if keyword == Keyword::Let {
                if let Some(target) = parts[1].as_symbol() {
                    self.arena.lookup_value(target, frame)?;
                }
            }
            bindings.push((name.to_string(), parts[1].clone()));
        }
        Ok((bindings, &args[1..]))
    }
}

fn eval_quote(args: &[Scheme]) -> Result<Scheme> {
    match args {
        [quoted] => Ok(quoted.clone()),
        _ => Err(Error::syntax(format!(
            "quote: wrong number of parts in: (quote {})",
            render_operands(args)
        ))),
    }
}

fn eval_lambda(args: &[Scheme], frame: FrameId) -> Result<Scheme> {
    if args.len() < 2 {
        return Err(Error::syntax(format!(
            "lambda: bad syntax in (lambda {})",
            render_operands(args)
        )));
    }
    let formals = args[0]
        .to_vec()
        .ok_or_else(|| Error::syntax("lambda: argument is not an identifier"))?;
    let mut parameters = Vec::with_capacity(formals.len());
    for formal in &formals {
        let name = formal
            .as_symbol()
            .ok_or_else(|| Error::syntax("lambda: argument is not an identifier"))?;
        parameters.push(name.to_string());
    }
    let body = args[1..].to_vec();
    Ok(Scheme::procedure(Procedure::lambda(parameters, body, frame)))
}
