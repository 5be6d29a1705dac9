//! Size Model Module
//!
//! Maps stored values to their accounted byte size.

use serde::{Deserialize, Serialize};

use crate::cache::Value;
use crate::error::{CacheError, Result};

// == Word Width ==
/// Machine word width assumed when sizing strings and default-width integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WordWidth {
    Bits32,
    #[default]
    Bits64,
}

impl WordWidth {
    /// Width of the build target, fixed at compile time.
    pub const fn native() -> Self {
        if cfg!(target_pointer_width = "64") {
            WordWidth::Bits64
        } else {
            WordWidth::Bits32
        }
    }

    /// Bytes in one machine word.
    pub const fn word_bytes(self) -> i64 {
        match self {
            WordWidth::Bits32 => 4,
            WordWidth::Bits64 => 8,
        }
    }
}

impl TryFrom<u8> for WordWidth {
    type Error = CacheError;

    fn try_from(bits: u8) -> Result<Self> {
        match bits {
            32 => Ok(WordWidth::Bits32),
            64 => Ok(WordWidth::Bits64),
            other => Err(CacheError::InvalidConfig(format!(
                "word width must be 32 or 64, got {}",
                other
            ))),
        }
    }
}

impl From<WordWidth> for u8 {
    fn from(width: WordWidth) -> Self {
        match width {
            WordWidth::Bits32 => 32,
            WordWidth::Bits64 => 64,
        }
    }
}

// == Size Policy ==
/// Accounts the byte size of a [`Value`].
///
/// Strings and byte strings cost a two-word header plus their length;
/// default-width integers cost one word; fixed-width scalars cost their
/// natural width. The default policy uses 64-bit words regardless of the
/// build target so budgets behave identically everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizePolicy {
    word_width: WordWidth,
}

impl SizePolicy {
    pub const fn new(word_width: WordWidth) -> Self {
        Self { word_width }
    }

    /// Policy matching the build target's pointer width.
    pub const fn native() -> Self {
        Self::new(WordWidth::native())
    }

    pub const fn word_width(&self) -> WordWidth {
        self.word_width
    }

    /// Fixed overhead charged for every string or byte string.
    pub const fn string_header(&self) -> i64 {
        2 * self.word_width.word_bytes()
    }

    // == Size Of ==
    /// Returns the accounted size of `value`.
    ///
    /// Fails with [`CacheError::UnsupportedType`] for opaque values.
    pub fn size_of(&self, value: &Value) -> Result<i64> {
        let size = match value {
            Value::Str(s) => self.string_header() + s.len() as i64,
            Value::Bytes(b) => self.string_header() + b.len() as i64,
            Value::Bool(_) | Value::I8(_) | Value::U8(_) => 1,
            Value::I16(_) | Value::U16(_) => 2,
            Value::I32(_) | Value::U32(_) | Value::F32(_) => 4,
            Value::I64(_) | Value::U64(_) | Value::F64(_) | Value::Complex64(..) => 8,
            Value::Int(_) | Value::UInt(_) => self.word_width.word_bytes(),
            Value::Complex128(..) => 16,
            Value::Custom(v) => v.byte_len(),
            Value::Opaque { type_name, .. } => {
                return Err(CacheError::UnsupportedType(type_name.to_string()))
            }
        };
        Ok(size)
    }
}
