use std::fmt;

use nom::branch::alt;
use nom::bytes::complete::{is_not, take_while};
use nom::character::complete::{anychar, char, digit0, digit1, multispace1, not_line_ending, one_of, satisfy};
use nom::combinator::{opt, recognize, value};
use nom::multi::many0_count;
use nom::sequence::{delimited, pair, preceded, tuple};
use nom::IResult;

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    LeftParen,
    RightParen,
    Quote,
    Dot,
    Identifier(String),
    Integer(i64),
    Double(f64),
    // Contents between the quotes, escapes untouched.
    Str(String),
    Boolean(bool),
}

impl Token {
    /// Category name shown by `--tokens`.
    pub fn kind(&self) -> &'static str {
        match self {
            Token::LeftParen => "open",
            Token::RightParen => "close",
            Token::Quote => "quote",
            Token::Dot => "dot",
            Token::Identifier(_) => "symbol",
            Token::Integer(_) => "integer",
            Token::Double(_) => "double",
            Token::Str(_) => "string",
            Token::Boolean(_) => "boolean",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Quote => write!(f, "'"),
            Token::Dot => write!(f, "."),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Integer(n) => write!(f, "{}", n),
            Token::Double(d) => write!(f, "{}", d),
            Token::Str(s) => write!(f, "\"{}\"", s),
            Token::Boolean(b) => write!(f, "#{}", if *b { 't' } else { 'f' }),
        }
    }
}

#[derive(Debug)]
pub struct Lexer<'a>(&'a str);

fn is_initial(c: char) -> bool {
    c.is_ascii_alphabetic() || "!$%&*/:<=>?~_^".contains(c)
}

fn is_subsequent(c: char) -> bool {
    is_initial(c) || c.is_ascii_digit() || ".+-".contains(c)
}

fn is_delimiter(input: &str) -> bool {
    input
        .chars()
        .next()
        .map_or(true, |c| c.is_whitespace() || "();".contains(c))
}

// Whitespace and `;` comments.
fn atmosphere(input: &str) -> IResult<&str, usize> {
    many0_count(alt((multispace1, preceded(char(';'), not_line_ending))))(input)
}

fn number(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
    )))(input)
}

// A lone `+` or `-` is an identifier too.
fn identifier(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(pair(satisfy(is_initial), take_while(is_subsequent))),
        recognize(one_of("+-")),
    ))(input)
}

fn string_literal(input: &str) -> IResult<&str, &str> {
    delimited(
        char('"'),
        recognize(many0_count(alt((
            is_not("\"\\"),
            recognize(pair(char('\\'), anychar)),
        )))),
        char('"'),
    )(input)
}

fn boolean(input: &str) -> IResult<&str, bool> {
    preceded(
        char('#'),
        alt((value(true, one_of("tT")), value(false, one_of("fF")))),
    )(input)
}

// The offending word, for error messages.
fn word(input: &str) -> &str {
    let end = input
        .char_indices()
        .find(|&(i, _)| i > 0 && is_delimiter(&input[i..]))
        .map_or(input.len(), |(i, _)| i);
    &input[..end]
}

fn numeric_token(text: &str) -> Result<Token> {
    let parsed = if text.contains('.') {
        text.parse::<f64>().ok().map(Token::Double)
    } else {
        text.parse::<i64>().ok().map(Token::Integer)
    };
    parsed.ok_or_else(|| Error::Read(format!("Cannot tokenize a number: {}", text)))
}

fn read_token(input: &str) -> Result<Option<(Token, &str)>> {
    let input = match atmosphere(input) {
        Ok((rest, _)) => rest,
        Err(_) => input,
    };
    let first = match input.chars().next() {
        Some(c) => c,
        None => return Ok(None),
    };
    let after_first = &input[first.len_utf8()..];

    match first {
        '(' => return Ok(Some((Token::LeftParen, after_first))),
        ')' => return Ok(Some((Token::RightParen, after_first))),
        '\'' => return Ok(Some((Token::Quote, after_first))),
        '"' => {
            return match string_literal(input) {
                Ok((rest, body)) => Ok(Some((Token::Str(body.to_string()), rest))),
                Err(_) => Err(Error::Read("String cannot be tokenized".to_string())),
            };
        }
        '#' => {
            return match boolean(input) {
                Ok((rest, b)) if is_delimiter(rest) => Ok(Some((Token::Boolean(b), rest))),
                _ => Err(Error::Read(format!(
                    "A bool type cannot be tokenized: {}",
                    word(input)
                ))),
            };
        }
        '.' if is_delimiter(after_first) => return Ok(Some((Token::Dot, after_first))),
        _ => {}
    }

    if let Ok((rest, text)) = number(input) {
        if !is_delimiter(rest) {
            return Err(Error::Read(format!("Cannot tokenize a number: {}", word(input))));
        }
        return numeric_token(text).map(|token| Some((token, rest)));
    }
    match identifier(input) {
        Ok((rest, name)) if is_delimiter(rest) => Ok(Some((Token::Identifier(name.to_string()), rest))),
        _ => Err(Error::Read(format!("Symbol cannot be tokenized: {}", word(input)))),
    }
}

impl<'a> Lexer<'a> {
    pub fn new(input: &str) -> Lexer {
        Lexer(input)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        match read_token(self.0) {
            Ok(Some((token, rest))) => {
                self.0 = rest;
                Some(Ok(token))
            }
            Ok(None) => {
                self.0 = "";
                None
            }
            Err(err) => {
                // Stop after the first error.
                self.0 = "";
                Some(Err(err))
            }
        }
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Lexer::new(input).collect()
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{read_token, tokenize, Token};
    use crate::error::Error;

    fn ident(name: &str) -> Token {
        Token::Identifier(name.to_string())
    }

    #[test]
    fn test_token_0() {
        assert_eq!(read_token("("), Ok(Some((Token::LeftParen, ""))));
    }

    #[test]
    fn test_token_1() {
        assert_eq!(read_token("  )"), Ok(Some((Token::RightParen, ""))));
    }

    #[test]
    fn test_token_2() {
        assert_eq!(read_token("blah blub"), Ok(Some((ident("blah"), " blub"))));
    }

    #[test]
    fn test_only_atmosphere() {
        assert_eq!(read_token("  ; nothing here\n\t"), Ok(None));
    }

    #[test]
    fn test_lexer() {
        assert_eq!(
            tokenize("(x y)"),
            Ok(vec![Token::LeftParen, ident("x"), ident("y"), Token::RightParen])
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokenize("5 -12 +3 2.5 -.5 7."),
            Ok(vec![
                Token::Integer(5),
                Token::Integer(-12),
                Token::Integer(3),
                Token::Double(2.5),
                Token::Double(-0.5),
                Token::Double(7.0),
            ])
        );
    }

    #[test]
    fn test_sign_alone_is_identifier() {
        assert_eq!(
            tokenize("(+ - x)"),
            Ok(vec![Token::LeftParen, ident("+"), ident("-"), ident("x"), Token::RightParen])
        );
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(
            tokenize("set! let* null? a.b->c <="),
            Ok(vec![ident("set!"), ident("let*"), ident("null?"), ident("a.b->c"), ident("<=")])
        );
    }

    #[test]
    fn test_strings_keep_escapes() {
        assert_eq!(
            tokenize(r#""a \"b\" c""#),
            Ok(vec![Token::Str(r#"a \"b\" c"#.to_string())])
        );
        assert_eq!(
            tokenize("\"open"),
            Err(Error::Read("String cannot be tokenized".to_string()))
        );
    }

    #[test]
    fn test_booleans() {
        assert_eq!(
            tokenize("#t #F)"),
            Ok(vec![Token::Boolean(true), Token::Boolean(false), Token::RightParen])
        );
        assert!(tokenize("#true").is_err());
    }

    #[test]
    fn test_quote_and_dot() {
        assert_eq!(
            tokenize("'(a . b)"),
            Ok(vec![
                Token::Quote,
                Token::LeftParen,
                ident("a"),
                Token::Dot,
                ident("b"),
                Token::RightParen,
            ])
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            tokenize("1 ; one\n2;two"),
            Ok(vec![Token::Integer(1), Token::Integer(2)])
        );
    }

    #[test]
    fn test_bad_tokens() {
        assert_eq!(
            tokenize("12abc"),
            Err(Error::Read("Cannot tokenize a number: 12abc".to_string()))
        );
        assert_eq!(
            tokenize("+x"),
            Err(Error::Read("Symbol cannot be tokenized: +x".to_string()))
        );
        assert_eq!(
            tokenize("[a]"),
            Err(Error::Read("Symbol cannot be tokenized: [a]".to_string()))
        );
    }

    #[test]
    fn test_display() {
        let shown: Vec<String> = tokenize("( x 5 \"s\" #t . ' )")
            .unwrap()
            .iter()
            .map(|t| format!("{} : {}", t, t.kind()))
            .collect();
        assert_eq!(
            shown,
            vec![
                "( : open",
                "x : symbol",
                "5 : integer",
                "\"s\" : string",
                "#t : boolean",
                ". : dot",
                "' : quote",
                ") : close",
            ]
        );
    }
}
