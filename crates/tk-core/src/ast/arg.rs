use std::fmt;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Element type of an ndarray argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[display("f16")]
    F16,
    #[display("f32")]
    F32,
    #[display("f64")]
    F64,
    #[display("i8")]
    I8,
    #[display("i16")]
    I16,
    #[display("i32")]
    I32,
    #[display("i64")]
    I64,
    #[display("u8")]
    U8,
    #[display("u16")]
    U16,
    #[display("u32")]
    U32,
    #[display("u64")]
    U64,
}

/// Scalar kinds a value can be cast to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    #[display("i32")]
    I32,
    #[display("f32")]
    F32,
}

/// Shape and element description of an externally supplied ndarray.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NdArray {
    pub elem_type: DataType,
    pub shape: Vec<u32>,
    #[serde(default)]
    pub elem_shape: Vec<u32>,
}

impl NdArray {
    pub fn new(elem_type: DataType, shape: impl Into<Vec<u32>>) -> Self {
        Self {
            elem_type,
            shape: shape.into(),
            elem_shape: Vec::new(),
        }
    }

    pub fn with_elem_shape(mut self, elem_shape: impl Into<Vec<u32>>) -> Self {
        self.elem_shape = elem_shape.into();
        self
    }

    /// Number of dimensions (`field_dim` on the Taichi side).
    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgKind {
    I32,
    F32,
    NdArray,
}

impl ArgKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgKind::I32 => "i32 scalar",
            ArgKind::F32 => "f32 scalar",
            ArgKind::NdArray => "ndarray",
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime value supplied for one kernel parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, From)]
pub enum Argument {
    I32(i32),
    F32(f32),
    NdArray(NdArray),
}

impl Argument {
    pub fn kind(&self) -> ArgKind {
        match self {
            Argument::I32(_) => ArgKind::I32,
            Argument::F32(_) => ArgKind::F32,
            Argument::NdArray(_) => ArgKind::NdArray,
        }
    }
}

/// An argument together with its synthesized name (`_0`, `_1`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedArgument {
    pub name: String,
    pub argument: Argument,
}

impl NamedArgument {
    pub fn new(name: impl Into<String>, argument: Argument) -> Self {
        Self {
            name: name.into(),
            argument,
        }
    }

    pub fn kind(&self) -> ArgKind {
        self.argument.kind()
    }
}
