//! Cache Value Module
//!
//! Defines the values a store can hold and the capability used to size
//! caller-defined types.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

// == Byte Length Capability ==
/// A caller-defined value that reports its own accounted size.
///
/// The store trusts the reported length. Returning zero or a negative number
/// for a non-empty value lets entries escape the byte budget; keeping the
/// length honest is the implementor's responsibility.
pub trait ByteLen: Send + Sync {
    fn byte_len(&self) -> i64;
}

// == Value ==
/// A value held by a cache store.
///
/// Scalars and strings are sized by the [`SizePolicy`](super::SizePolicy).
/// `Custom` values size themselves through [`ByteLen`]. `Opaque` values can
/// be carried around but are rejected by every store with
/// [`CacheError::UnsupportedType`](crate::error::CacheError::UnsupportedType).
#[derive(Clone)]
pub enum Value {
    Str(String),
    Bytes(Vec<u8>),
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    F32(f32),
    I64(i64),
    U64(u64),
    F64(f64),
    /// Default-width signed integer (`isize`)
    Int(i64),
    /// Default-width unsigned integer (`usize`)
    UInt(u64),
    Complex64(f32, f32),
    Complex128(f64, f64),
    Custom(Arc<dyn ByteLen>),
    Opaque {
        type_name: &'static str,
        value: Arc<dyn Any + Send + Sync>,
    },
}

impl Value {
    /// Wraps a caller-defined sized value.
    pub fn custom<T: ByteLen + 'static>(value: T) -> Self {
        Value::Custom(Arc::new(value))
    }

    /// Wraps a value whose size cannot be accounted for.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque {
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
        }
    }

    /// Returns the string contents for `Str` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the byte contents for `Str` and `Bytes` values.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Str(s) => Some(s.as_bytes()),
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Widens any signed or unsigned integer variant that fits into an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I8(v) => Some(v.into()),
            Value::U8(v) => Some(v.into()),
            Value::I16(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::I64(v) | Value::Int(v) => Some(v),
            Value::U64(v) | Value::UInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Downcasts an `Opaque` value back to its concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque { value, .. } => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Short name of the variant, used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::U8(_) => "u8",
            Value::I16(_) => "i16",
            Value::U16(_) => "u16",
            Value::I32(_) => "i32",
            Value::U32(_) => "u32",
            Value::F32(_) => "f32",
            Value::I64(_) => "i64",
            Value::U64(_) => "u64",
            Value::F64(_) => "f64",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Complex64(..) => "complex64",
            Value::Complex128(..) => "complex128",
            Value::Custom(_) => "custom",
            Value::Opaque { type_name, .. } => *type_name,
        }
    }
}

// == Debug ==
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(v) => f.debug_tuple("Str").field(v).finish(),
            Value::Bytes(v) => f.debug_tuple("Bytes").field(v).finish(),
            Value::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Value::I8(v) => f.debug_tuple("I8").field(v).finish(),
            Value::U8(v) => f.debug_tuple("U8").field(v).finish(),
            Value::I16(v) => f.debug_tuple("I16").field(v).finish(),
            Value::U16(v) => f.debug_tuple("U16").field(v).finish(),
            Value::I32(v) => f.debug_tuple("I32").field(v).finish(),
            Value::U32(v) => f.debug_tuple("U32").field(v).finish(),
            Value::F32(v) => f.debug_tuple("F32").field(v).finish(),
            Value::I64(v) => f.debug_tuple("I64").field(v).finish(),
            Value::U64(v) => f.debug_tuple("U64").field(v).finish(),
            Value::F64(v) => f.debug_tuple("F64").field(v).finish(),
            Value::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Value::UInt(v) => f.debug_tuple("UInt").field(v).finish(),
            Value::Complex64(re, im) => f.debug_tuple("Complex64").field(re).field(im).finish(),
            Value::Complex128(re, im) => f.debug_tuple("Complex128").field(re).field(im).finish(),
            Value::Custom(v) => f
                .debug_struct("Custom")
                .field("byte_len", &v.byte_len())
                .finish(),
            Value::Opaque { type_name, .. } => f
                .debug_struct("Opaque")
                .field("type_name", type_name)
                .finish_non_exhaustive(),
        }
    }
}

// == Equality ==
/// `Custom` and `Opaque` values compare by pointer identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Str(a), Str(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Bool(a), Bool(b)) => a == b,
            (I8(a), I8(b)) => a == b,
            (U8(a), U8(b)) => a == b,
            (I16(a), I16(b)) => a == b,
            (U16(a), U16(b)) => a == b,
            (I32(a), I32(b)) => a == b,
            (U32(a), U32(b)) => a == b,
            (F32(a), F32(b)) => a == b,
            (I64(a), I64(b)) => a == b,
            (U64(a), U64(b)) => a == b,
            (F64(a), F64(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (UInt(a), UInt(b)) => a == b,
            (Complex64(ar, ai), Complex64(br, bi)) => ar == br && ai == bi,
            (Complex128(ar, ai), Complex128(br, bi)) => ar == br && ai == bi,
            (Custom(a), Custom(b)) => Arc::ptr_eq(a, b),
            (Opaque { value: a, .. }, Opaque { value: b, .. }) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// == Conversions ==
macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar! {
    String => Str,
    Vec<u8> => Bytes,
    bool => Bool,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    f32 => F32,
    i64 => I64,
    u64 => U64,
    f64 => F64,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<isize> for Value {
    fn from(v: isize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::UInt(v as u64)
    }
}
