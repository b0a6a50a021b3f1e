//! `key=value` command arguments.
//!
//! Values are JSON text supplied by the caller and spliced into the request
//! verbatim, so `name="disk0"` yields a string and `name=disk0` yields
//! whatever the peer makes of a bare word. The one exception is a value
//! starting with `0x`, which is read as base-16 and sent as a decimal number.

use std::{borrow::Cow, fmt, slice, str::FromStr};

use serde::de::IgnoredAny;

use crate::error::ArgumentError;

const HEX_PREFIX: &str = "0x";

/// The value half of a `key=value` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentValue {
    /// JSON text, passed through as given.
    Literal(String),
    /// A `0x` literal, sent in decimal.
    Integer(u64),
}

impl ArgumentValue {
    fn parse(key: &str, value: &str) -> Result<Self, ArgumentError> {
        match value.strip_prefix(HEX_PREFIX) {
            Some(digits) => u64::from_str_radix(digits, 16)
                .map(ArgumentValue::Integer)
                .map_err(|_| ArgumentError::InvalidHex {
                    key: key.into(),
                    value: value.into(),
                }),
            None => Ok(ArgumentValue::Literal(value.into())),
        }
    }

    /// The text that goes into the request document.
    pub fn as_json(&self) -> Cow<'_, str> {
        match self {
            ArgumentValue::Literal(text) => Cow::Borrowed(text),
            ArgumentValue::Integer(n) => Cow::Owned(n.to_string()),
        }
    }

    /// Whether this value would survive a JSON parser.
    pub fn is_valid_json(&self) -> bool {
        match self {
            ArgumentValue::Literal(text) => serde_json::from_str::<IgnoredAny>(text).is_ok(),
            ArgumentValue::Integer(..) => true,
        }
    }
}

impl fmt::Display for ArgumentValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.as_json())
    }
}

/// A single parsed `key=value` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub key: String,
    pub value: ArgumentValue,
}

impl FromStr for Argument {
    type Err = ArgumentError;

    /// Splits at the first `=`; everything after it is the value.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (key, value) = token.split_once('=')
            .ok_or_else(|| ArgumentError::MissingSeparator { token: token.into() })?;

        if key.is_empty() {
            return Err(ArgumentError::EmptyKey { token: token.into() })
        }

        Ok(Argument {
            key: key.into(),
            value: ArgumentValue::parse(key, value)?,
        })
    }
}

/// An ordered set of arguments with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    entries: Vec<Argument>,
}

impl Arguments {
    pub fn new() -> Self {
        Default::default()
    }

    /// Parses every token, in order, without checking that literals are JSON.
    pub fn parse<I, T>(tokens: I) -> Result<Self, ArgumentError> where
        I: IntoIterator<Item=T>,
        T: AsRef<str>,
    {
        let mut arguments = Self::new();
        for token in tokens {
            arguments.push(token.as_ref().parse()?)?;
        }
        Ok(arguments)
    }

    /// Like [`parse`](Self::parse), but rejects literals that are not JSON.
    pub fn parse_strict<I, T>(tokens: I) -> Result<Self, ArgumentError> where
        I: IntoIterator<Item=T>,
        T: AsRef<str>,
    {
        let arguments = Self::parse(tokens)?;
        match arguments.iter().find(|arg| !arg.value.is_valid_json()) {
            Some(arg) => Err(ArgumentError::InvalidLiteral {
                key: arg.key.clone(),
                value: arg.value.to_string(),
            }),
            None => Ok(arguments),
        }
    }

    pub fn push(&mut self, argument: Argument) -> Result<(), ArgumentError> {
        if self.get(&argument.key).is_some() {
            return Err(ArgumentError::DuplicateKey { key: argument.key })
        }

        self.entries.push(argument);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ArgumentValue> {
        self.entries.iter()
            .find(|arg| arg.key == key)
            .map(|arg| &arg.value)
    }

    pub fn iter(&self) -> slice::Iter<Argument> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Arguments {
    type Item = &'a Argument;
    type IntoIter = slice::Iter<'a, Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("addr=0x1F", "31")]
    #[case("addr=0x+1F", "31")]
    #[case("addr=0x0", "0")]
    #[case("addr=0xffffffffffffffff", "18446744073709551615")]
    #[case("id=\"disk0\"", "\"disk0\"")]
    #[case("enable=true", "true")]
    #[case("count=12", "12")]
    #[case("upper=0X10", "0X10")]
    #[case("expr=a=b", "a=b")]
    #[case("empty=", "")]
    fn value_encoding(#[case] token: &str, #[case] expected: &str) {
        let arg: Argument = token.parse().unwrap();
        assert_eq!(arg.value.as_json(), expected);
    }

    #[rstest]
    #[case::no_separator("addr", ArgumentError::MissingSeparator { token: "addr".into() })]
    #[case::empty_key("=1", ArgumentError::EmptyKey { token: "=1".into() })]
    #[case::bad_digit("addr=0xZZ", ArgumentError::InvalidHex { key: "addr".into(), value: "0xZZ".into() })]
    #[case::negative("addr=0x-1", ArgumentError::InvalidHex { key: "addr".into(), value: "0x-1".into() })]
    #[case::no_digits("addr=0x", ArgumentError::InvalidHex { key: "addr".into(), value: "0x".into() })]
    #[case::overflow("addr=0x10000000000000000", ArgumentError::InvalidHex { key: "addr".into(), value: "0x10000000000000000".into() })]
    fn malformed_tokens(#[case] token: &str, #[case] expected: ArgumentError) {
        assert_eq!(token.parse::<Argument>().unwrap_err(), expected);
    }

    #[test]
    fn keeps_order_and_keys() {
        let args = Arguments::parse(&["driver=\"e1000\"", "addr=0x10", "id=\"nic0\""]).unwrap();
        let keys: Vec<_> = args.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, ["driver", "addr", "id"]);
        assert_eq!(args.get("addr"), Some(&ArgumentValue::Integer(16)));
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn rejects_duplicate_keys() {
        let err = Arguments::parse(&["a=1", "a=2"]).unwrap_err();
        assert_eq!(err, ArgumentError::DuplicateKey { key: "a".into() });
    }

    #[test]
    fn permissive_parse_keeps_bad_literals() {
        let args = Arguments::parse(&["id=disk0"]).unwrap();
        assert_eq!(args.get("id"), Some(&ArgumentValue::Literal("disk0".into())));
    }

    #[test]
    fn strict_parse_rejects_bad_literals() {
        let err = Arguments::parse_strict(&["ok=1", "id=disk0"]).unwrap_err();
        assert_eq!(err, ArgumentError::InvalidLiteral { key: "id".into(), value: "disk0".into() });
        assert!(Arguments::parse_strict(&["id=\"disk0\"", "addr=0x1f"]).is_ok());
    }
}
