use std::borrow;
use std::fmt;

use gc::{Finalize, Gc, Trace};

use crate::runtime::Procedure;

/// Marker spliced in front of the tail of a pair built by `cons` onto a
/// non-list value.
pub const DOT: &str = ".";

#[derive(Clone, Debug, Finalize, PartialEq, Trace)]
enum SchemeData {
    Int(i64),
    Double(f64),
    Str(String),
    Boolean(bool),
    Symbol(String),
    Null,
    Void,
    // Placeholder held by `letrec` names until their values are computed.
    Undefined,
    Cons(Scheme, Scheme),
    Procedure(Procedure),
}

/// Runtime datum and expression node. Cloning shares the underlying value.
#[derive(Clone, Debug, Finalize, PartialEq, Trace)]
pub struct Scheme(Gc<SchemeData>);

impl Scheme {
    fn from_data(data: SchemeData) -> Scheme {
        Scheme(Gc::new(data))
    }

    pub fn int(n: i64) -> Scheme {
        Scheme::from_data(SchemeData::Int(n))
    }

    pub fn as_int(&self) -> Option<i64> {
        if let SchemeData::Int(n) = *self.0 {
            Some(n)
        } else {
            None
        }
    }

    pub fn double(d: f64) -> Scheme {
        Scheme::from_data(SchemeData::Double(d))
    }

    pub fn as_double(&self) -> Option<f64> {
        if let SchemeData::Double(d) = *self.0 {
            Some(d)
        } else {
            None
        }
    }

    pub fn string<S: ToString>(s: S) -> Scheme {
        Scheme::from_data(SchemeData::Str(s.to_string()))
    }

    pub fn boolean(b: bool) -> Scheme {
        Scheme::from_data(SchemeData::Boolean(b))
    }

    pub fn as_boolean(&self) -> Option<bool> {
        if let SchemeData::Boolean(b) = *self.0 {
            Some(b)
        } else {
            None
        }
    }

    pub fn symbol<S: ToString>(s: S) -> Scheme {
        Scheme::from_data(SchemeData::Symbol(s.to_string()))
    }

    pub fn as_symbol(&self) -> Option<&str> {
        if let SchemeData::Symbol(ref s) = *self.0 {
            Some(s)
        } else {
            None
        }
    }

    pub fn null() -> Scheme {
        Scheme::from_data(SchemeData::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(*self.0, SchemeData::Null)
    }

    pub fn void() -> Scheme {
        Scheme::from_data(SchemeData::Void)
    }

    pub fn is_void(&self) -> bool {
        matches!(*self.0, SchemeData::Void)
    }

    pub fn undefined() -> Scheme {
        Scheme::from_data(SchemeData::Undefined)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(*self.0, SchemeData::Undefined)
    }

    pub fn cons(fst: Scheme, snd: Scheme) -> Scheme {
        Scheme::from_data(SchemeData::Cons(fst, snd))
    }

    pub fn as_pair(&self) -> Option<(&Scheme, &Scheme)> {
        if let SchemeData::Cons(ref x, ref y) = *self.0 {
            Some((x, y))
        } else {
            None
        }
    }

    pub(crate) fn procedure(procc: Procedure) -> Scheme {
        Scheme::from_data(SchemeData::Procedure(procc))
    }

    pub(crate) fn as_procedure(&self) -> Option<&Procedure> {
        if let SchemeData::Procedure(ref procc) = *self.0 {
            Some(procc)
        } else {
            None
        }
    }

    /// Self-evaluating atoms that can never head an application.
    pub fn is_literal(&self) -> bool {
        matches!(
            *self.0,
            SchemeData::Int(_)
                | SchemeData::Double(_)
                | SchemeData::Str(_)
                | SchemeData::Boolean(_)
        )
    }

    /// Is this the `.` marker that precedes a dotted tail?
    pub fn is_dot(&self) -> bool {
        self.as_symbol() == Some(DOT)
    }

    /// Head symbol of a form, if it has one.
    pub fn head_symbol(&self) -> Option<&str> {
        self.as_pair().and_then(|(head, _)| head.as_symbol())
    }

    /// Elements of a proper list, or `None` for anything else.
    // May get into infinite loops on circular structure, which cannot be built
    // by any primitive here.
    pub fn to_vec(&self) -> Option<Vec<Scheme>> {
        let mut elems = Vec::new();
        let mut head = self;

        loop {
            if let Some((car, cdr)) = head.as_pair() {
                elems.push(car.clone());
                head = cdr;
            } else if head.is_null() {
                return Some(elems);
            } else {
                return None;
            }
        }
    }

    pub fn list<E: borrow::Borrow<Scheme>, I: IntoIterator<Item = E>>(iter: I) -> Scheme
    where
        I::IntoIter: DoubleEndedIterator,
    {
        let mut res = Scheme::null();
        for elem in iter.into_iter().rev() {
            res = Scheme::cons(elem.borrow().clone(), res);
        }
        res
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            SchemeData::Int(n) => write!(f, "{}", n),
            SchemeData::Double(d) => write!(f, "{:.6}", d),
            // Escapes are kept exactly as they were read.
            SchemeData::Str(ref s) => write!(f, "\"{}\"", s),
            SchemeData::Boolean(b) => write!(f, "#{}", if b { 't' } else { 'f' }),
            SchemeData::Symbol(ref s) => write!(f, "{}", s),
            SchemeData::Null => write!(f, "()"),
            SchemeData::Void => Ok(()),
            SchemeData::Undefined => write!(f, "#<undefined>"),
            SchemeData::Procedure(ref procc) => write!(f, "{}", procc),
            SchemeData::Cons(ref a, ref b) => {
                write!(f, "({}", a)?;
                let mut head = b;
                while let Some((a, b)) = head.as_pair() {
                    write!(f, " {}", a)?;
                    head = b;
                }
                if head.is_null() {
                    write!(f, ")")
                } else {
                    write!(f, " . {})", head)
                }
            }
        }
    }
}
