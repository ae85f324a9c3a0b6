use std::fmt;

use gc::{Finalize, Trace};
use tracing::trace;

use crate::arena::FrameId;
use crate::builtin::Primitive;
use crate::error::{Error, Result};
use crate::interpreter::Interpreter;
use crate::scheme::Scheme;
use crate::syntax::{self, Keyword};

#[derive(Clone, Debug, Finalize, PartialEq, Trace)]
pub struct Procedure(ProcEnum);

#[derive(Clone, Debug, Finalize, PartialEq, Trace)]
enum ProcEnum {
    Primitive(Primitive),
    Lambda(Lambda),
}

/// A closure: parameters and body paired with the frame that was active when
/// the `lambda` was evaluated.
#[derive(Clone, Debug, Finalize, PartialEq, Trace)]
pub struct Lambda {
    parameters: Vec<String>,
    body: Vec<Scheme>,
    environment: FrameId,
}

impl Procedure {
    pub fn primitive(primitive: Primitive) -> Procedure {
        Procedure(ProcEnum::Primitive(primitive))
    }

    pub(crate) fn lambda(parameters: Vec<String>, body: Vec<Scheme>, environment: FrameId) -> Procedure {
        Procedure(ProcEnum::Lambda(Lambda {
            parameters,
            body,
            environment,
        }))
    }

    pub fn is_lambda(&self) -> bool {
        matches!(self.0, ProcEnum::Lambda(_))
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#<procedure>")
    }
}

// Keep at least this much stack free before recursing; grow by
// `STACK_GROWTH` when below it.
const RED_ZONE: usize = 100 * 1024;
const STACK_GROWTH: usize = 1024 * 1024;

impl Interpreter {
    /// Evaluate `expr` in `frame`.
    pub fn eval(&mut self, expr: &Scheme, frame: FrameId) -> Result<Scheme> {
        stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || self.eval_form(expr, frame))
    }

    fn eval_form(&mut self, expr: &Scheme, frame: FrameId) -> Result<Scheme> {
        if let Some(name) = expr.as_symbol() {
            return self.eval_symbol(name, frame);
        }
        let (operator, operands) = match expr.as_pair() {
            Some(form) => form,
            // Literals, `()` and already-built values evaluate to themselves.
            None => return Ok(expr.clone()),
        };

        if let Some(name) = operator.as_symbol() {
            if let Some(keyword) = Keyword::from_symbol(name) {
                return self.eval_special(keyword, operands, frame);
            }
            let procedure = self.eval(operator, frame)?;
            let args = self.eval_each(operands, frame)?;
            self.apply(&procedure, args)
        } else if operator.as_pair().is_some() {
            let procedure = self.eval(operator, frame)?;
            if !procedure.as_procedure().map_or(false, Procedure::is_lambda) {
                return Err(Error::Application {
                    given: procedure.to_string(),
                });
            }
            let args = self.eval_each(operands, frame)?;
            self.apply(&procedure, args)
        } else if operator.is_literal() {
            Err(Error::Application {
                given: operator.to_string(),
            })
        } else {
            Err(Error::Evaluation(format!("cannot apply {}", operator)))
        }
    }

    fn eval_symbol(&self, name: &str, frame: FrameId) -> Result<Scheme> {
        let value = self.arena.lookup_value(name, frame)?;
        if value.is_undefined() {
            return Err(Error::Uninitialized {
                name: name.to_string(),
            });
        }
        // A binding holding a quote form reads back as the quoted tail.
        if let Some((head, tail)) = value.as_pair() {
            if head.as_symbol() == Some(Keyword::Quote.name()) {
                return Ok(tail.clone());
            }
        }
        Ok(value)
    }

    /// Evaluate every operand, strictly left to right.
    fn eval_each(&mut self, operands: &Scheme, frame: FrameId) -> Result<Vec<Scheme>> {
        let operands = operands
            .to_vec()
            .ok_or_else(|| Error::Evaluation(format!("bad argument list {}", operands)))?;
        operands.iter().map(|arg| self.eval(arg, frame)).collect()
    }

    /// Apply an evaluated procedure to evaluated arguments.
    pub fn apply(&mut self, procedure: &Scheme, args: Vec<Scheme>) -> Result<Scheme> {
        let procc = procedure.as_procedure().ok_or_else(|| Error::Application {
            given: procedure.to_string(),
        })?;
        match procc.0 {
            ProcEnum::Primitive(primitive) => primitive.apply(args),
            ProcEnum::Lambda(ref lambda) => {
                let frame = self.bind_arguments(lambda, args)?;
                trace!(
                    parameters = ?lambda.parameters,
                    frame = ?frame,
                    "applying closure"
                );
                self.execute_body(&lambda.body, frame)
            }
        }
    }

    // Parameters are bound in a child of the captured frame, never the
    // caller's.
    fn bind_arguments(&mut self, lambda: &Lambda, args: Vec<Scheme>) -> Result<FrameId> {
        if args.len() != lambda.parameters.len() {
            return Err(Error::arity(
                "#<procedure>",
                lambda.parameters.len(),
                args.len(),
            ));
        }
        let frame = self.arena.alloc_frame(Some(lambda.environment));
        for (name, value) in lambda.parameters.iter().zip(args) {
            self.arena.bind(frame, name, value);
        }
        Ok(frame)
    }

    /// Run a closure or `let` body. Only the last form is always evaluated;
    /// an earlier form runs only when it is a `set!` or `begin`.
    pub(crate) fn execute_body(&mut self, body: &[Scheme], frame: FrameId) -> Result<Scheme> {
        let (last, init) = body
            .split_last()
            .ok_or_else(|| Error::syntax("body: no expression in body"))?;
        for form in init.iter().filter(|form| syntax::is_effect_form(form)) {
            self.eval(form, frame)?;
        }
        self.eval(last, frame)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::error::Error;
    use crate::interpreter::Interpreter;
    use crate::scheme::Scheme;

    fn comparison(input: &str, output: Scheme) {
        let mut interpreter = Interpreter::new();
        let values = interpreter.eval_str(input).unwrap();
        assert_eq!(values.last(), Some(&output));
    }

    fn failure(input: &str) -> Error {
        Interpreter::new().eval_str(input).unwrap_err()
    }

    #[test]
    fn test_literals() {
        comparison("5", Scheme::int(5));
        comparison("2.5", Scheme::double(2.5));
        comparison("\"str\"", Scheme::string("str"));
        comparison("#f", Scheme::boolean(false));
    }

    #[test]
    fn test_lambda_0() {
        comparison("((lambda (x) x) 3)", Scheme::int(3));
    }

    #[test]
    fn test_lambda_1() {
        comparison("(((lambda (x) (lambda (y) x)) 1) 2)", Scheme::int(1));
    }

    #[test]
    fn test_lambda_2() {
        comparison(
            "(((lambda (y) ((lambda (x) (lambda (y) x)) y)) 1) 2)",
            Scheme::int(1),
        );
    }

    #[test]
    fn test_lexical_not_dynamic_scope() {
        comparison(
            "(define x 1) (define f (lambda () x)) (let ((x 2)) (f))",
            Scheme::int(1),
        );
    }

    #[test]
    fn test_escaping_closure() {
        comparison(
            "(define make (lambda (n) (let ((k n)) (lambda (m) (+ k m))))) \
             (define add5 (make 5)) \
             (let ((k 100)) (add5 1))",
            Scheme::int(6),
        );
    }

    #[test]
    fn test_counter_shares_captured_frame() {
        comparison(
            "(define make-counter (lambda () (let ((n 0)) (lambda () (set! n (+ n 1)) n)))) \
             (define c (make-counter)) (c) (c) (c)",
            Scheme::int(3),
        );
    }

    #[test]
    fn test_only_last_body_form_runs() {
        comparison(
            "(define x 0) \
             (define f (lambda () (define x 99) x)) \
             (f)",
            Scheme::int(0),
        );
    }

    #[test]
    fn test_set_and_begin_run_before_tail() {
        comparison(
            "(define x 0) \
             (define f (lambda () (set! x 10) (begin (set! x (+ x 1))) x)) \
             (f)",
            Scheme::int(11),
        );
    }

    #[test]
    fn test_quoted_binding_unwraps() {
        comparison("(define q (quote (quote a))) q", Scheme::list(vec![Scheme::symbol("a")]));
    }

    #[test]
    fn test_closure_arity() {
        assert_eq!(
            failure("((lambda (x y) x) 1)"),
            Error::arity("#<procedure>", 2, 1)
        );
        assert_eq!(
            failure("((lambda (x) x) 1 2)"),
            Error::arity("#<procedure>", 1, 2)
        );
    }

    #[test]
    fn test_literal_head_is_application_error() {
        assert_eq!(
            failure("(5 6 7)"),
            Error::Application {
                given: "5".to_string()
            }
        );
    }

    #[test]
    fn test_compound_head_must_be_closure() {
        assert_eq!(
            failure("((+ 1 2) 3)"),
            Error::Application {
                given: "3".to_string()
            }
        );
    }

    #[test]
    fn test_non_procedure_variable_head() {
        assert_eq!(
            failure("(define x 3) (x 1)"),
            Error::Application {
                given: "3".to_string()
            }
        );
    }

    #[test]
    fn test_unbound_operator() {
        assert_eq!(failure("(frob 1)"), Error::unbound("frob"));
    }

    #[test]
    fn test_arguments_evaluated_before_application() {
        assert_eq!(failure("(+ 1 nope)"), Error::unbound("nope"));
    }
}
