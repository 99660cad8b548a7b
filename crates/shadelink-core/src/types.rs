use serde::{Deserialize, Serialize};

/// Element type of a builtin numeric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    Bool,
    Int,
    UInt,
    Float,
    Double,
}

impl ScalarKind {
    fn scalar_name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::UInt => "uint",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
        }
    }

    fn vector_prefix(self) -> &'static str {
        match self {
            ScalarKind::Bool => "b",
            ScalarKind::Int => "i",
            ScalarKind::UInt => "u",
            ScalarKind::Float => "",
            ScalarKind::Double => "d",
        }
    }

    /// The zero-equivalent literal of this element type.
    pub fn zero(self) -> Literal {
        match self {
            ScalarKind::Bool => Literal::Bool(false),
            ScalarKind::Int => Literal::Int(0),
            ScalarKind::UInt => Literal::UInt(0),
            ScalarKind::Float => Literal::Float(0.0),
            ScalarKind::Double => Literal::Double(0.0),
        }
    }
}

/// Scalar, vector or matrix layout of a builtin numeric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Scalar,
    Vector(u8),
    Matrix { columns: u8, rows: u8 },
}

/// A builtin numeric type such as `float`, `ivec3` or `mat4x3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NumericType {
    pub kind: ScalarKind,
    pub shape: Shape,
}

impl NumericType {
    pub const fn scalar(kind: ScalarKind) -> Self {
        Self {
            kind,
            shape: Shape::Scalar,
        }
    }

    pub const fn vector(kind: ScalarKind, size: u8) -> Self {
        Self {
            kind,
            shape: Shape::Vector(size),
        }
    }

    pub const fn matrix(kind: ScalarKind, columns: u8, rows: u8) -> Self {
        Self {
            kind,
            shape: Shape::Matrix { columns, rows },
        }
    }

    /// Parse a GLSL builtin numeric type name.
    pub fn from_name(name: &str) -> Option<Self> {
        let scalar = match name {
            "bool" => Some(ScalarKind::Bool),
            "int" => Some(ScalarKind::Int),
            "uint" => Some(ScalarKind::UInt),
            "float" => Some(ScalarKind::Float),
            "double" => Some(ScalarKind::Double),
            _ => None,
        };
        if let Some(kind) = scalar {
            return Some(Self::scalar(kind));
        }

        let (kind, rest) = match name.as_bytes().first()? {
            b'b' => (ScalarKind::Bool, &name[1..]),
            b'i' => (ScalarKind::Int, &name[1..]),
            b'u' => (ScalarKind::UInt, &name[1..]),
            b'd' => (ScalarKind::Double, &name[1..]),
            _ => (ScalarKind::Float, name),
        };

        if let Some(size) = rest.strip_prefix("vec") {
            let size = parse_size(size)?;
            return Some(Self::vector(kind, size));
        }

        if let Some(dims) = rest.strip_prefix("mat") {
            if !matches!(kind, ScalarKind::Float | ScalarKind::Double) {
                return None;
            }
            return match dims.split_once('x') {
                Some((columns, rows)) => {
                    Some(Self::matrix(kind, parse_size(columns)?, parse_size(rows)?))
                }
                None => {
                    let size = parse_size(dims)?;
                    Some(Self::matrix(kind, size, size))
                }
            };
        }

        None
    }

    /// Scalar = 0, vector = 1, matrix = 2.
    pub fn dimensionality(&self) -> u8 {
        match self.shape {
            Shape::Scalar => 0,
            Shape::Vector(_) => 1,
            Shape::Matrix { .. } => 2,
        }
    }

    /// Component count of a vector, column count of a matrix, 1 for a scalar.
    pub fn width(&self) -> u8 {
        match self.shape {
            Shape::Scalar => 1,
            Shape::Vector(size) => size,
            Shape::Matrix { columns, .. } => columns,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.shape, Shape::Scalar)
    }

    pub fn is_vector(&self) -> bool {
        matches!(self.shape, Shape::Vector(_))
    }

    /// The shortest GLSL spelling of this type (`mat3` rather than `mat3x3`).
    pub fn compact_name(&self) -> String {
        match self.shape {
            Shape::Scalar => self.kind.scalar_name().to_string(),
            Shape::Vector(size) => format!("{}vec{}", self.kind.vector_prefix(), size),
            Shape::Matrix { columns, rows } if columns == rows => {
                format!("{}mat{}", self.kind.vector_prefix(), columns)
            }
            Shape::Matrix { columns, rows } => {
                format!("{}mat{}x{}", self.kind.vector_prefix(), columns, rows)
            }
        }
    }

    pub fn zero(&self) -> Literal {
        self.kind.zero()
    }
}

impl std::fmt::Display for NumericType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.compact_name())
    }
}

fn parse_size(text: &str) -> Option<u8> {
    match text {
        "2" => Some(2),
        "3" => Some(3),
        "4" => Some(4),
        _ => None,
    }
}

/// A literal constant value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Bool(bool),
    Int(i64),
    #[serde(rename = "uint")]
    UInt(u64),
    Float(f64),
    Double(f64),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Bool(value) => write!(f, "{}", value),
            Literal::Int(value) => write!(f, "{}", value),
            Literal::UInt(value) => write!(f, "{}u", value),
            Literal::Float(value) => {
                let s = format!("{}", value);
                if s.contains('.') || s.contains('e') || s.contains("inf") || s.contains("NaN") {
                    write!(f, "{}", s)
                } else {
                    write!(f, "{}.0", s)
                }
            }
            Literal::Double(value) => {
                let s = format!("{}", value);
                if s.contains('.') {
                    write!(f, "{}lf", s)
                } else {
                    write!(f, "{}.0lf", s)
                }
            }
        }
    }
}
