use num::{One, Zero};

use crate::arena::{Arena, FrameId};
use crate::error::{Error, Result};
use crate::number::Number;
use crate::runtime::Procedure;
use crate::scheme::Scheme;

type Builtin = fn(Vec<Scheme>) -> Result<Scheme>;

/// The fixed set of native procedures installed in the global frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, gc::Finalize)]
pub enum Primitive {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    IsNull,
    Car,
    Cdr,
    Cons,
    NumEq,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

unsafe impl gc::Trace for Primitive {
    gc::unsafe_empty_trace!();
}

impl Primitive {
    pub const ALL: [Primitive; 14] = [
        Primitive::Add,
        Primitive::Subtract,
        Primitive::Multiply,
        Primitive::Divide,
        Primitive::Modulo,
        Primitive::IsNull,
        Primitive::Car,
        Primitive::Cdr,
        Primitive::Cons,
        Primitive::NumEq,
        Primitive::Less,
        Primitive::LessEqual,
        Primitive::Greater,
        Primitive::GreaterEqual,
    ];

    /// The name the procedure is bound to in the global frame.
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Add => "+",
            Primitive::Subtract => "-",
            Primitive::Multiply => "*",
            Primitive::Divide => "/",
            Primitive::Modulo => "modulo",
            Primitive::IsNull => "null?",
            Primitive::Car => "car",
            Primitive::Cdr => "cdr",
            Primitive::Cons => "cons",
            Primitive::NumEq => "=",
            Primitive::Less => "<",
            Primitive::LessEqual => "<=",
            Primitive::Greater => ">",
            Primitive::GreaterEqual => ">=",
        }
    }

    fn function(self) -> Builtin {
        match self {
            Primitive::Add => sum,
            Primitive::Subtract => minus,
            Primitive::Multiply => times,
            Primitive::Divide => divide,
            Primitive::Modulo => modulo,
            Primitive::IsNull => is_null,
            Primitive::Car => car,
            Primitive::Cdr => cdr,
            Primitive::Cons => cons,
            Primitive::NumEq => num_eq,
            Primitive::Less => less,
            Primitive::LessEqual => less_equal,
            Primitive::Greater => greater,
            Primitive::GreaterEqual => greater_equal,
        }
    }

    pub fn apply(self, args: Vec<Scheme>) -> Result<Scheme> {
        (self.function())(args)
    }
}

fn contract(procedure: &str, expected: &'static str, given: &Scheme, position: Option<usize>) -> Error {
    Error::Contract {
        procedure: procedure.to_string(),
        expected,
        given: given.to_string(),
        position,
    }
}

fn check_arity(procedure: &str, args: &[Scheme], expected: usize) -> Result<()> {
    if args.len() != expected {
        Err(Error::arity(procedure, expected, args.len()))
    } else {
        Ok(())
    }
}

// Every argument as a number, or a contract violation naming the first
// offender by its 1-based position.
fn numbers(procedure: &str, args: &[Scheme]) -> Result<Vec<Number>> {
    args.iter()
        .enumerate()
        .map(|(i, arg)| {
            Number::from_scheme(arg).ok_or_else(|| contract(procedure, "number?", arg, Some(i + 1)))
        })
        .collect()
}

// Arithmetic

fn sum(args: Vec<Scheme>) -> Result<Scheme> {
    let total = numbers("+", &args)?
        .into_iter()
        .fold(Number::zero(), |acc, n| acc + n);
    Ok(total.to_scheme())
}

fn times(args: Vec<Scheme>) -> Result<Scheme> {
    let total = numbers("*", &args)?
        .into_iter()
        .fold(Number::one(), |acc, n| acc * n);
    Ok(total.to_scheme())
}

fn minus(args: Vec<Scheme>) -> Result<Scheme> {
    let nums = numbers("-", &args)?;
    match nums.split_first() {
        None => Err(Error::arity("-", "at least 1", 0)),
        Some((&first, [])) => Ok((-first).to_scheme()),
        Some((&first, rest)) => Ok(rest.iter().fold(first, |acc, &n| acc - n).to_scheme()),
    }
}

fn divide(args: Vec<Scheme>) -> Result<Scheme> {
    let nums = numbers("/", &args)?;
    let (first, rest) = match nums.split_first() {
        None => return Err(Error::arity("/", "at least 1", 0)),
        Some((&first, [])) => (Number::one(), vec![first]),
        Some((&first, rest)) => (first, rest.to_vec()),
    };
    let mut quotient = first;
    for divisor in rest {
        if divisor.is_zero() {
            return Err(Error::DivideByZero { procedure: "/" });
        }
        quotient = quotient / divisor;
    }
    Ok(quotient.to_scheme())
}

fn modulo(args: Vec<Scheme>) -> Result<Scheme> {
    check_arity("modulo", &args, 2)?;
    let divisor = args[1]
        .as_int()
        .ok_or_else(|| contract("modulo", "integer?", &args[1], None))?;
    if divisor == 0 {
        return Err(Error::DivideByZero { procedure: "modulo" });
    }
    let dividend = args[0]
        .as_int()
        .ok_or_else(|| contract("modulo", "integer?", &args[0], None))?;
    Number::modulo(dividend, divisor)
        .map(Scheme::int)
        .ok_or(Error::DivideByZero { procedure: "modulo" })
}

// Comparison. Always binary, always on doubles.

fn comparison<F>(procedure: &str, args: Vec<Scheme>, cmp: F) -> Result<Scheme>
where
    F: Fn(f64, f64) -> bool,
{
    check_arity(procedure, &args, 2)?;
    let operand = |arg: &Scheme| {
        Number::from_scheme(arg)
            .map(Number::to_f64)
            .ok_or_else(|| contract(procedure, "number?", arg, None))
    };
    Ok(Scheme::boolean(cmp(operand(&args[0])?, operand(&args[1])?)))
}

fn num_eq(args: Vec<Scheme>) -> Result<Scheme> {
    comparison("=", args, |a, b| a == b)
}

fn less(args: Vec<Scheme>) -> Result<Scheme> {
    comparison("<", args, |a, b| a < b)
}

fn less_equal(args: Vec<Scheme>) -> Result<Scheme> {
    comparison("<=", args, |a, b| a <= b)
}

fn greater(args: Vec<Scheme>) -> Result<Scheme> {
    comparison(">", args, |a, b| a > b)
}

fn greater_equal(args: Vec<Scheme>) -> Result<Scheme> {
    comparison(">=", args, |a, b| a >= b)
}

// Pairs and lists

fn is_null(args: Vec<Scheme>) -> Result<Scheme> {
    check_arity("null?", &args, 1)?;
    Ok(Scheme::boolean(args[0].is_null()))
}

fn cons(args: Vec<Scheme>) -> Result<Scheme> {
    check_arity("cons", &args, 2)?;
    let (fst, snd) = (args[0].clone(), args[1].clone());
    if snd.as_pair().is_some() || snd.is_null() {
        Ok(Scheme::cons(fst, snd))
    } else {
        Ok(Scheme::list(vec![fst, Scheme::symbol(crate::scheme::DOT), snd]))
    }
}

fn car(args: Vec<Scheme>) -> Result<Scheme> {
    check_arity("car", &args, 1)?;
    match args[0].as_pair() {
        Some((a, _)) => Ok(a.clone()),
        None => Err(contract("car", "pair?", &args[0], None)),
    }
}

fn cdr(args: Vec<Scheme>) -> Result<Scheme> {
    check_arity("cdr", &args, 1)?;
    let (_, tail) = args[0]
        .as_pair()
        .ok_or_else(|| contract("cdr", "pair?", &args[0], None))?;
    // `cons` onto a non-list stores the dot marker ahead of the tail.
    if let Some((marker, rest)) = tail.as_pair() {
        if marker.is_dot() {
            if let Some((value, _)) = rest.as_pair() {
                return Ok(value.clone());
            }
        }
    }
    Ok(tail.clone())
}

/// Allocate the global frame with every primitive bound under its name.
pub fn initial_environment(arena: &mut Arena) -> FrameId {
    let global = arena.alloc_frame(None);
    for primitive in Primitive::ALL.iter().copied() {
        arena.bind(
            global,
            primitive.name(),
            Scheme::procedure(Procedure::primitive(primitive)),
        );
    }
    global
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use num::Integer;
    use proptest::prelude::*;

    use super::Primitive;
    use crate::arena::Arena;
    use crate::error::Error;
    use crate::scheme::Scheme;

    fn call(primitive: Primitive, args: Vec<Scheme>) -> Result<Scheme, Error> {
        primitive.apply(args)
    }

    fn ints(ns: &[i64]) -> Vec<Scheme> {
        ns.iter().map(|&n| Scheme::int(n)).collect()
    }

    #[test]
    fn test_sum_identity_and_promotion() {
        assert_eq!(call(Primitive::Add, vec![]), Ok(Scheme::int(0)));
        assert_eq!(call(Primitive::Multiply, vec![]), Ok(Scheme::int(1)));
        assert_eq!(
            call(Primitive::Add, vec![Scheme::int(1), Scheme::double(2.0)]),
            Ok(Scheme::double(3.0))
        );
        assert_eq!(call(Primitive::Multiply, ints(&[2, 3, 4])), Ok(Scheme::int(24)));
    }

    #[test]
    fn test_contract_position() {
        assert_eq!(
            call(Primitive::Add, vec![Scheme::int(1), Scheme::string("a")]),
            Err(Error::Contract {
                procedure: "+".to_string(),
                expected: "number?",
                given: "\"a\"".to_string(),
                position: Some(2),
            })
        );
    }

    #[test]
    fn test_minus() {
        assert_eq!(call(Primitive::Subtract, ints(&[5])), Ok(Scheme::int(-5)));
        assert_eq!(call(Primitive::Subtract, ints(&[10, 3, 2])), Ok(Scheme::int(5)));
        assert_eq!(
            call(Primitive::Subtract, vec![]),
            Err(Error::arity("-", "at least 1", 0))
        );
    }

    #[test]
    fn test_divide() {
        assert_eq!(call(Primitive::Divide, ints(&[4])), Ok(Scheme::double(0.25)));
        assert_eq!(call(Primitive::Divide, ints(&[7, 2])), Ok(Scheme::double(3.5)));
        assert_eq!(call(Primitive::Divide, ints(&[6, 2])), Ok(Scheme::int(3)));
        assert_eq!(call(Primitive::Divide, ints(&[12, 2, 3])), Ok(Scheme::int(2)));
        assert_eq!(
            call(Primitive::Divide, vec![]),
            Err(Error::arity("/", "at least 1", 0))
        );
    }

    #[test]
    fn test_divide_by_zero() {
        let err = Error::DivideByZero { procedure: "/" };
        assert_eq!(call(Primitive::Divide, ints(&[1, 0])), Err(err.clone()));
        assert_eq!(call(Primitive::Divide, ints(&[0])), Err(err.clone()));
        assert_eq!(
            call(Primitive::Divide, vec![Scheme::int(1), Scheme::double(0.0)]),
            Err(err)
        );
    }

    #[test]
    fn test_modulo_errors() {
        assert_eq!(
            call(Primitive::Modulo, ints(&[5, 0])),
            Err(Error::DivideByZero { procedure: "modulo" })
        );
        assert_eq!(call(Primitive::Modulo, ints(&[5])), Err(Error::arity("modulo", 2, 1)));
        assert!(call(Primitive::Modulo, vec![Scheme::double(5.0), Scheme::int(2)]).is_err());
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(call(Primitive::Less, ints(&[1, 2])), Ok(Scheme::boolean(true)));
        assert_eq!(
            call(Primitive::NumEq, vec![Scheme::int(2), Scheme::double(2.0)]),
            Ok(Scheme::boolean(true))
        );
        assert_eq!(call(Primitive::GreaterEqual, ints(&[1, 2])), Ok(Scheme::boolean(false)));
        assert_eq!(call(Primitive::Less, ints(&[1, 2, 3])), Err(Error::arity("<", 2, 3)));
        assert!(call(Primitive::Greater, vec![Scheme::int(1), Scheme::boolean(true)]).is_err());
    }

    #[test]
    fn test_pairs() {
        let pair = call(Primitive::Cons, ints(&[1, 2])).unwrap();
        assert_eq!(pair.to_string(), "(1 . 2)");
        assert_eq!(call(Primitive::Car, vec![pair.clone()]), Ok(Scheme::int(1)));
        assert_eq!(call(Primitive::Cdr, vec![pair]), Ok(Scheme::int(2)));

        let list = call(Primitive::Cons, vec![Scheme::int(1), Scheme::null()]).unwrap();
        assert_eq!(call(Primitive::Cdr, vec![list]), Ok(Scheme::null()));
        assert_eq!(
            call(Primitive::Car, vec![Scheme::null()]),
            Err(Error::Contract {
                procedure: "car".to_string(),
                expected: "pair?",
                given: "()".to_string(),
                position: None,
            })
        );
        assert_eq!(call(Primitive::Car, ints(&[1, 2])), Err(Error::arity("car", 1, 2)));
    }

    #[test]
    fn test_null() {
        assert_eq!(call(Primitive::IsNull, vec![Scheme::null()]), Ok(Scheme::boolean(true)));
        assert_eq!(call(Primitive::IsNull, ints(&[0])), Ok(Scheme::boolean(false)));
        assert_eq!(call(Primitive::IsNull, vec![]), Err(Error::arity("null?", 1, 0)));
    }

    #[test]
    fn test_initial_environment() {
        let mut arena = Arena::new();
        let global = super::initial_environment(&mut arena);
        for primitive in Primitive::ALL.iter() {
            let value = arena.lookup_value(primitive.name(), global).unwrap();
            assert_eq!(value.to_string(), "#<procedure>");
        }
    }

    fn arb_atom() -> impl Strategy<Value = Scheme> {
        prop_oneof![
            any::<i64>().prop_map(Scheme::int),
            any::<bool>().prop_map(Scheme::boolean),
            "[a-z]{1,8}".prop_map(Scheme::string),
            Just(Scheme::null()),
        ]
    }

    proptest! {
        #[test]
        fn modulo_follows_divisor(a in any::<i64>(), b in any::<i64>().prop_filter("nonzero", |b| *b != 0)) {
            let m = call(Primitive::Modulo, ints(&[a, b])).unwrap().as_int().unwrap();
            prop_assert!(m == 0 || (m < 0) == (b < 0));
            prop_assert!(m.unsigned_abs() < b.unsigned_abs());
            let floor = (a as i128).div_floor(&(b as i128));
            prop_assert_eq!(m as i128, a as i128 - b as i128 * floor);
        }

        #[test]
        fn car_cdr_of_cons(x in arb_atom(), y in arb_atom()) {
            let pair = call(Primitive::Cons, vec![x.clone(), y.clone()]).unwrap();
            prop_assert_eq!(call(Primitive::Car, vec![pair.clone()]).unwrap(), x);
            prop_assert_eq!(call(Primitive::Cdr, vec![pair]).unwrap(), y);
        }
    }
}
