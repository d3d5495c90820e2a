use bytes::BytesMut;
use conduit_core::Value;
use postgres_types::{FromSql, IsNull, ToSql, Type, to_sql_checked};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::error::Error;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

type BoxError = Box<dyn Error + Sync + Send>;

/// Bridge between [`Value`] and the Postgres wire types.
///
/// Numbers are converted to the type the server inferred for the parameter.
#[derive(Debug)]
pub struct ValueHolder(pub(crate) Value);

impl ValueHolder {
    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl From<Value> for ValueHolder {
    fn from(value: Value) -> Self {
        ValueHolder(value)
    }
}

impl<'a> FromSql<'a> for ValueHolder {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        Self::from_sql_nullable(ty, Some(raw))
    }
    fn from_sql_null(ty: &Type) -> Result<Self, BoxError> {
        Self::from_sql_nullable(ty, None)
    }
    fn from_sql_nullable(ty: &Type, raw: Option<&'a [u8]>) -> Result<Self, BoxError> {
        macro_rules! to_value {
            ($ty_var:ident, $raw:ident, $($($ty:path)|+ => ($value:path, $source:ty),)+) => {
                match *$ty_var {
                    $($($ty)|+ => $value(if let Some($raw) = $raw { Some(<$source>::from_sql($ty_var, $raw)?.into()) } else { None }),)+
                    _ => Value::Unknown($raw.map(|v| String::from_utf8_lossy(v).into_owned())),
                }
            };
        }
        let value = to_value!(ty, raw,
            Type::BOOL => (Value::Boolean, bool),
            Type::CHAR => (Value::Int8, i8),
            Type::INT2 => (Value::Int16, i16),
            Type::INT4 => (Value::Int32, i32),
            Type::INT8 => (Value::Int64, i64),
            Type::FLOAT4 => (Value::Float32, f32),
            Type::FLOAT8 => (Value::Float64, f64),
            Type::NUMERIC => (Value::Decimal, Decimal),
            Type::OID => (Value::UInt32, u32),
            Type::VARCHAR
            | Type::TEXT
            | Type::NAME
            | Type::BPCHAR
            | Type::JSON
            | Type::XML => (Value::Varchar, String),
            Type::BYTEA => (Value::Blob, Vec<u8>),
            Type::DATE => (Value::Date, Date),
            Type::TIME => (Value::Time, Time),
            Type::TIMESTAMP => (Value::Timestamp, PrimitiveDateTime),
            Type::TIMESTAMPTZ => (Value::TimestampWithTimezone, OffsetDateTime),
            Type::UUID => (Value::Uuid, Uuid),
        );
        Ok(value.into())
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn integer_to_sql(v: i128, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::CHAR => i8::try_from(v)?.to_sql(ty, out),
        Type::INT2 => i16::try_from(v)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(v)?.to_sql(ty, out),
        Type::OID => u32::try_from(v)?.to_sql(ty, out),
        Type::FLOAT4 => (v as f32).to_sql(ty, out),
        Type::FLOAT8 => (v as f64).to_sql(ty, out),
        Type::NUMERIC => Decimal::from_i128(v)
            .ok_or("integer out of the NUMERIC range")?
            .to_sql(ty, out),
        Type::VARCHAR | Type::TEXT | Type::BPCHAR => v.to_string().to_sql(ty, out),
        _ => i64::try_from(v)?.to_sql(ty, out),
    }
}

fn float_to_sql(v: f64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::FLOAT4 => (v as f32).to_sql(ty, out),
        Type::NUMERIC => Decimal::from_f64(v)
            .ok_or("float cannot be represented as NUMERIC")?
            .to_sql(ty, out),
        _ => v.to_sql(ty, out),
    }
}

fn decimal_to_sql(v: &Decimal, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::FLOAT4 | Type::FLOAT8 => v
            .to_f64()
            .ok_or("decimal cannot be represented as a float")
            .map_err(BoxError::from)
            .and_then(|v| float_to_sql(v, ty, out)),
        Type::INT2 | Type::INT4 | Type::INT8 if v.fract().is_zero() => v
            .to_i128()
            .ok_or("decimal out of the integer range")
            .map_err(BoxError::from)
            .and_then(|v| integer_to_sql(v, ty, out)),
        _ => v.to_sql(ty, out),
    }
}

impl ToSql for ValueHolder {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError>
    where
        Self: Sized,
    {
        match &self.0 {
            Value::Boolean(Some(v)) => v.to_sql(ty, out),
            Value::Int8(Some(v)) => integer_to_sql(*v as i128, ty, out),
            Value::Int16(Some(v)) => integer_to_sql(*v as i128, ty, out),
            Value::Int32(Some(v)) => integer_to_sql(*v as i128, ty, out),
            Value::Int64(Some(v)) => integer_to_sql(*v as i128, ty, out),
            Value::UInt8(Some(v)) => integer_to_sql(*v as i128, ty, out),
            Value::UInt16(Some(v)) => integer_to_sql(*v as i128, ty, out),
            Value::UInt32(Some(v)) => integer_to_sql(*v as i128, ty, out),
            Value::UInt64(Some(v)) => integer_to_sql(*v as i128, ty, out),
            Value::Float32(Some(v)) => float_to_sql(*v as f64, ty, out),
            Value::Float64(Some(v)) => float_to_sql(*v, ty, out),
            Value::Decimal(Some(v)) => decimal_to_sql(v, ty, out),
            Value::Varchar(Some(v)) | Value::Unknown(Some(v)) => v.to_sql(ty, out),
            Value::Blob(Some(v)) => (&**v).to_sql(ty, out),
            Value::Date(Some(v)) => v.to_sql(ty, out),
            Value::Time(Some(v)) => v.to_sql(ty, out),
            Value::Timestamp(Some(v)) => v.to_sql(ty, out),
            Value::TimestampWithTimezone(Some(v)) => v.to_sql(ty, out),
            Value::Uuid(Some(v)) => v.to_sql(ty, out),
            _ => Ok(IsNull::Yes),
        }
    }

    fn accepts(_ty: &Type) -> bool
    where
        Self: Sized,
    {
        true
    }

    to_sql_checked!();
}
