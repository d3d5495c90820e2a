use crate::{Error, Result, Value};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use std::{any, borrow::Cow};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Conversion of native Rust values into a [`Value`] bound to a command.
///
/// ```rust
/// use conduit_core::{AsValue, Value};
/// assert_eq!(42i32.as_value(), Value::Int32(Some(42)));
/// assert_eq!(None::<i64>.as_value(), Value::Int64(None));
/// ```
pub trait AsValue {
    /// The typed NULL of this type, used when an `Option` is empty.
    fn as_empty_value() -> Value
    where
        Self: Sized;
    fn as_value(self) -> Value;
}

/// Conversion of a decoded [`Value`] back into a native Rust type.
///
/// Integers accept any integer variant (and integral decimals) as long as the
/// value fits, because vendors disagree on the type of aggregates like `COUNT`.
pub trait FromValue: Sized {
    fn try_from_value(value: Value) -> Result<Self>;
}

fn mismatch<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert `{:?}` into `{}`",
        value,
        any::type_name::<T>()
    ))
}

impl AsValue for Value {
    fn as_empty_value() -> Value {
        Value::Null
    }
    fn as_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

macro_rules! impl_integer {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl AsValue for $ty {
                fn as_empty_value() -> Value {
                    Value::$variant(None)
                }
                fn as_value(self) -> Value {
                    Value::$variant(Some(self))
                }
            }
            impl FromValue for $ty {
                fn try_from_value(value: Value) -> Result<Self> {
                    let converted = match &value {
                        Value::Int8(Some(v)) => <$ty>::try_from(*v).ok(),
                        Value::Int16(Some(v)) => <$ty>::try_from(*v).ok(),
                        Value::Int32(Some(v)) => <$ty>::try_from(*v).ok(),
                        Value::Int64(Some(v)) => <$ty>::try_from(*v).ok(),
                        Value::UInt8(Some(v)) => <$ty>::try_from(*v).ok(),
                        Value::UInt16(Some(v)) => <$ty>::try_from(*v).ok(),
                        Value::UInt32(Some(v)) => <$ty>::try_from(*v).ok(),
                        Value::UInt64(Some(v)) => <$ty>::try_from(*v).ok(),
                        Value::Decimal(Some(v)) if v.fract().is_zero() => {
                            v.to_i128().and_then(|v| <$ty>::try_from(v).ok())
                        }
                        _ => None,
                    };
                    converted.ok_or_else(|| mismatch::<$ty>(&value))
                }
            }
        )+
    };
}

impl_integer!(
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
);

macro_rules! impl_float {
    ($($ty:ty => $variant:ident, $to:ident),+ $(,)?) => {
        $(
            impl AsValue for $ty {
                fn as_empty_value() -> Value {
                    Value::$variant(None)
                }
                fn as_value(self) -> Value {
                    Value::$variant(Some(self))
                }
            }
            impl FromValue for $ty {
                fn try_from_value(value: Value) -> Result<Self> {
                    let converted = match &value {
                        Value::Float32(Some(v)) => Some(*v as $ty),
                        Value::Float64(Some(v)) => Some(*v as $ty),
                        Value::Int32(Some(v)) => Some(*v as $ty),
                        Value::Int64(Some(v)) => Some(*v as $ty),
                        Value::Decimal(Some(v)) => v.$to(),
                        _ => None,
                    };
                    converted.ok_or_else(|| mismatch::<$ty>(&value))
                }
            }
        )+
    };
}

impl_float!(f32 => Float32, to_f32, f64 => Float64, to_f64);

macro_rules! impl_direct {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl AsValue for $ty {
                fn as_empty_value() -> Value {
                    Value::$variant(None)
                }
                fn as_value(self) -> Value {
                    Value::$variant(Some(self.into()))
                }
            }
            impl FromValue for $ty {
                fn try_from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::$variant(Some(v)) => Ok(v.into()),
                        value => Err(mismatch::<$ty>(&value)),
                    }
                }
            }
        )+
    };
}

impl_direct!(
    bool => Boolean,
    Date => Date,
    Time => Time,
    PrimitiveDateTime => Timestamp,
    OffsetDateTime => TimestampWithTimezone,
    Uuid => Uuid,
    Vec<u8> => Blob,
);

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
}

impl FromValue for Decimal {
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Int32(Some(v)) => Ok(v.into()),
            Value::Int64(Some(v)) => Ok(v.into()),
            Value::UInt64(Some(v)) => Ok(v.into()),
            value => Err(mismatch::<Decimal>(&value)),
        }
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
}

impl FromValue for String {
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) | Value::Unknown(Some(v)) => Ok(v),
            value => Err(mismatch::<String>(&value)),
        }
    }
}

impl AsValue for &str {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.to_owned()))
    }
}

impl AsValue for Cow<'_, str> {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.into_owned()))
    }
}

impl AsValue for &[u8] {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into()))
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::try_from_value(value).map(Some)
        }
    }
}

/// Collects named values, used by the `Parameters` implementation of maps.
pub(crate) fn named_values<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Vec<(String, Value)>
where
    K: Into<String>,
    V: AsValue,
{
    values
        .into_iter()
        .map(|(k, v)| (k.into(), v.as_value()))
        .collect()
}
