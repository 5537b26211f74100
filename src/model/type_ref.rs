use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A reference to a type as it is written at a use site.
///
/// Keeps the generic arguments and the array dimensions of the reference, so
/// `Map<String, List<Order>>[]` round-trips through [`TypeRef::parse`] and
/// [`fmt::Display`]. Qualified names keep only their last segment
/// (`com.acme.Order` and `crate::model::Order` both become `Order`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeRef {
    /// Simple type name, without generic arguments or array suffix
    pub name: String,
    /// Generic arguments in declaration order
    pub args: Vec<TypeRef>,
    /// Number of `[]` suffixes
    pub array_dims: usize,
}

impl TypeRef {
    /// Create a reference to a non-generic type
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name: simple_name(&name).to_string(),
            args: Vec::new(),
            array_dims: 0,
        }
    }

    /// Create a reference to a generic type with the given arguments
    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        let mut ty = Self::new(name);
        ty.args = args;
        ty
    }

    /// Wrap a reference into a one-dimension-deeper array
    pub fn array_of(element: TypeRef) -> Self {
        let mut ty = element;
        ty.array_dims += 1;
        ty
    }

    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = Parser { input, pos: 0 };
        let ty = parser
            .parse_type()
            .map_err(|reason| Error::TypeSyntax {
                input: input.to_string(),
                reason,
            })?;
        parser.skip_ws();
        if parser.pos < input.len() {
            return Err(Error::TypeSyntax {
                input: input.to_string(),
                reason: format!("unexpected trailing input at offset {}", parser.pos),
            });
        }
        Ok(ty)
    }

    pub fn is_array(&self) -> bool {
        self.array_dims > 0
    }

    /// A single upper-case letter without arguments is a type variable (`T`, `K`, `V`).
    pub fn is_type_variable(&self) -> bool {
        self.array_dims == 0
            && self.args.is_empty()
            && self.name.len() == 1
            && self.name.chars().all(|c| c.is_ascii_uppercase())
    }

    /// Element type of an array or of a single-parameter container.
    ///
    /// Arrays strip one dimension; anything else yields its first generic argument.
    pub fn element(&self) -> Option<TypeRef> {
        if self.is_array() {
            let mut element = self.clone();
            element.array_dims -= 1;
            return Some(element);
        }
        self.args.first().cloned()
    }

    /// Whether `name` (possibly qualified) refers to this type, ignoring generic arguments
    pub fn is_named(&self, name: &str) -> bool {
        self.array_dims == 0 && self.name == simple_name(name)
    }
}

/// Last segment of a `.` or `::` qualified name
pub fn simple_name(name: &str) -> &str {
    let name = name.trim();
    name.rsplit(|c| c == '.' || c == ':').next().unwrap_or(name)
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", arg)?;
            }
            f.write_str(">")?;
        }
        for _ in 0..self.array_dims {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

impl FromStr for TypeRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TypeRef::parse(s)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        TypeRef::parse(&value)
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: &str) -> bool {
        if self.input[self.pos..].starts_with(expected) {
            self.pos += expected.len();
            true
        } else {
            false
        }
    }

    fn parse_type(&mut self) -> std::result::Result<TypeRef, String> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '.' | ':' | '$' | '?') {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        let raw = &self.input[start..self.pos];
        if raw.is_empty() {
            return Err(format!("expected a type name at offset {}", start));
        }
        let mut ty = TypeRef::new(raw);
        if ty.name.is_empty() {
            return Err(format!("`{}` has an empty last segment", raw));
        }

        self.skip_ws();
        if self.eat("<") {
            loop {
                ty.args.push(self.parse_type()?);
                self.skip_ws();
                if self.eat(",") {
                    continue;
                }
                if self.eat(">") {
                    break;
                }
                return Err(format!("expected `,` or `>` at offset {}", self.pos));
            }
        }

        loop {
            self.skip_ws();
            if self.eat("[") {
                self.skip_ws();
                if !self.eat("]") {
                    return Err(format!("expected `]` at offset {}", self.pos));
                }
                ty.array_dims += 1;
            } else {
                break;
            }
        }
        Ok(ty)
    }
}
