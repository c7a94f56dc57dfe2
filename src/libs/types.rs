// types.rs
//! SQL type descriptors.
//!
//! Every column wraps one [`SqlType`]. A descriptor renders exactly one SQL type
//! fragment, compares structurally, and round-trips through a JSON form tagged
//! with its `kind`.

use crate::error::{Error, Result};
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;

/// Every type kind known to the schema layer, by its serialized tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Binary,
    Boolean,
    Date,
    DateTime,
    Real,
    Float,
    Integer,
    Serial,
    Interval,
    Numeric,
    String,
    Time,
    Json,
    ForeignKey,
    Array,
}

impl TypeKind {
    pub const ALL: [TypeKind; 15] = [
        TypeKind::Binary,
        TypeKind::Boolean,
        TypeKind::Date,
        TypeKind::DateTime,
        TypeKind::Real,
        TypeKind::Float,
        TypeKind::Integer,
        TypeKind::Serial,
        TypeKind::Interval,
        TypeKind::Numeric,
        TypeKind::String,
        TypeKind::Time,
        TypeKind::Json,
        TypeKind::ForeignKey,
        TypeKind::Array,
    ];

    pub const fn tag(self) -> &'static str {
        match self {
            TypeKind::Binary => "binary",
            TypeKind::Boolean => "boolean",
            TypeKind::Date => "date",
            TypeKind::DateTime => "datetime",
            TypeKind::Real => "real",
            TypeKind::Float => "float",
            TypeKind::Integer => "integer",
            TypeKind::Serial => "serial",
            TypeKind::Interval => "interval",
            TypeKind::Numeric => "numeric",
            TypeKind::String => "string",
            TypeKind::Time => "time",
            TypeKind::Json => "json",
            TypeKind::ForeignKey => "foreign_key",
            TypeKind::Array => "array",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

impl TryFrom<TypeKind> for SqlType {
    type Error = Error;

    /// Instantiates a kind with its default parameters. Foreign keys and arrays
    /// need arguments and cannot be built this way.
    fn try_from(kind: TypeKind) -> Result<Self> {
        Ok(match kind {
            TypeKind::Binary => SqlType::Binary,
            TypeKind::Boolean => SqlType::Boolean,
            TypeKind::Date => SqlType::Date,
            TypeKind::DateTime => SqlType::DateTime(DateTime::default()),
            TypeKind::Real => SqlType::Real,
            TypeKind::Float => SqlType::Float,
            TypeKind::Integer => SqlType::Integer(Integer::default()),
            TypeKind::Serial => SqlType::Serial(Serial::default()),
            TypeKind::Interval => SqlType::Interval(Interval::default()),
            TypeKind::Numeric => SqlType::Numeric(Numeric::default()),
            TypeKind::String => SqlType::Text(Text::default()),
            TypeKind::Time => SqlType::Time(Time::default()),
            TypeKind::Json => SqlType::Json,
            TypeKind::ForeignKey | TypeKind::Array => {
                return Err(Error::schema(format!(
                    "type kind '{}' requires arguments",
                    kind.tag()
                )));
            }
        })
    }
}

/// The value class a column of a given type stores natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Native {
    Bytes,
    Bool,
    Date,
    DateTime,
    Float,
    Int,
    Interval,
    Decimal,
    Text,
    Time,
    Json,
    List,
}

/// A SQL-level data type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SqlType {
    Binary,
    Boolean,
    Date,
    #[serde(rename = "datetime")]
    DateTime(DateTime),
    Real,
    Float,
    Integer(Integer),
    Serial(Serial),
    Interval(Interval),
    Numeric(Numeric),
    #[serde(rename = "string")]
    Text(Text),
    Time(Time),
    Json,
    ForeignKey(ForeignKey),
    Array(Array),
}

impl SqlType {
    pub fn kind(&self) -> TypeKind {
        match self {
            SqlType::Binary => TypeKind::Binary,
            SqlType::Boolean => TypeKind::Boolean,
            SqlType::Date => TypeKind::Date,
            SqlType::DateTime(_) => TypeKind::DateTime,
            SqlType::Real => TypeKind::Real,
            SqlType::Float => TypeKind::Float,
            SqlType::Integer(_) => TypeKind::Integer,
            SqlType::Serial(_) => TypeKind::Serial,
            SqlType::Interval(_) => TypeKind::Interval,
            SqlType::Numeric(_) => TypeKind::Numeric,
            SqlType::Text(_) => TypeKind::String,
            SqlType::Time(_) => TypeKind::Time,
            SqlType::Json => TypeKind::Json,
            SqlType::ForeignKey(_) => TypeKind::ForeignKey,
            SqlType::Array(_) => TypeKind::Array,
        }
    }

    /// Renders the type as it appears in a column definition.
    pub fn to_sql(&self) -> String {
        match self {
            SqlType::Binary => "BYTEA".to_string(),
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::DateTime(t) => t.to_sql(),
            SqlType::Real => "REAL".to_string(),
            SqlType::Float => "FLOAT".to_string(),
            SqlType::Integer(t) => t.to_sql(),
            SqlType::Serial(t) => t.to_sql(),
            SqlType::Interval(t) => t.to_sql(),
            SqlType::Numeric(t) => t.to_sql(),
            SqlType::Text(t) => t.to_sql(),
            SqlType::Time(t) => t.to_sql(),
            SqlType::Json => "JSON".to_string(),
            SqlType::ForeignKey(t) => t.to_sql(),
            SqlType::Array(t) => t.to_sql(),
        }
    }

    /// Serial, array and foreign-key types are pseudo types: they cannot be
    /// nested in an array or used as a foreign key's underlying type.
    pub fn is_real_type(&self) -> bool {
        !matches!(
            self,
            SqlType::Serial(_) | SqlType::Array(_) | SqlType::ForeignKey(_)
        )
    }

    /// Serial columns are filled in by the database.
    pub fn is_auto_generated(&self) -> bool {
        matches!(self, SqlType::Serial(_))
    }

    pub fn native(&self) -> Native {
        match self {
            SqlType::Binary => Native::Bytes,
            SqlType::Boolean => Native::Bool,
            SqlType::Date => Native::Date,
            SqlType::DateTime(_) => Native::DateTime,
            SqlType::Real | SqlType::Float => Native::Float,
            SqlType::Integer(_) | SqlType::Serial(_) => Native::Int,
            SqlType::Interval(_) => Native::Interval,
            SqlType::Numeric(_) => Native::Decimal,
            SqlType::Text(_) => Native::Text,
            SqlType::Time(_) => Native::Time,
            SqlType::Json => Native::Json,
            SqlType::ForeignKey(fk) => fk.sql_type.native(),
            SqlType::Array(_) => Native::List,
        }
    }

    /// Converts `value` into this type's native representation.
    pub fn coerce(&self, value: Value) -> Result<Value> {
        let found = value.to_string();
        let coerced = match self {
            SqlType::Integer(t) => coerce_int(value, t.bounds()),
            SqlType::Serial(t) => coerce_int(value, t.bounds()),
            SqlType::ForeignKey(fk) => return fk.sql_type.coerce(value),
            SqlType::Array(array) => match value {
                Value::Array(items) => {
                    let items = items
                        .into_iter()
                        .map(|item| array.element.coerce(item))
                        .collect::<Result<Vec<_>>>()?;
                    Some(Value::Array(items))
                }
                _ => None,
            },
            other => other.native().coerce(value),
        };

        coerced.ok_or_else(|| Error::TypeMismatch {
            column: None,
            expected: self.to_sql(),
            found,
        })
    }

    /// Serializes the descriptor into its tagged JSON form.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Restores a descriptor from [`SqlType::to_value`] output. Unknown kind
    /// tags fail with [`Error::UnknownType`].
    pub fn from_value(value: Value) -> Result<Self> {
        let tag = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::UnknownType(String::new()))?;

        if TypeKind::from_tag(tag).is_none() {
            return Err(Error::UnknownType(tag.to_string()));
        }

        let ty: SqlType = serde_json::from_value(value)?;
        ty.validate()?;
        Ok(ty)
    }

    /// Re-checks the construction rules, for descriptors that did not go
    /// through a constructor.
    pub fn validate(&self) -> Result<()> {
        match self {
            SqlType::Integer(t) => Integer::new(t.big, t.small).map(drop),
            SqlType::Serial(t) => Serial::new(t.big, t.small).map(drop),
            SqlType::Numeric(t) => Numeric::new(t.precision, t.scale).map(drop),
            SqlType::Text(t) => Text::new(t.length, t.fixed).map(drop),
            SqlType::ForeignKey(fk) => {
                ForeignKey::new(fk.table.clone(), fk.column.clone())?;
                require_real(&fk.sql_type)?;
                fk.sql_type.validate()
            }
            SqlType::Array(array) => {
                require_real(&array.element)?;
                array.element.validate()
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

impl Native {
    pub const fn name(self) -> &'static str {
        match self {
            Native::Bytes => "bytes",
            Native::Bool => "bool",
            Native::Date => "date",
            Native::DateTime => "datetime",
            Native::Float => "float",
            Native::Int => "int",
            Native::Interval => "interval",
            Native::Decimal => "decimal",
            Native::Text => "text",
            Native::Time => "time",
            Native::Json => "json",
            Native::List => "list",
        }
    }

    fn coerce(self, value: Value) -> Option<Value> {
        match (self, value) {
            (Native::Int, value) => coerce_int(value, (i64::MIN, i64::MAX)),
            (Native::Float, Value::Number(n)) => Some(Value::Number(n)),
            (Native::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            (Native::Float, Value::Bool(b)) => Some(Value::from(u8::from(b))),
            (Native::Decimal, Value::Number(n)) => coerce_decimal(&n.to_string()),
            (Native::Decimal, Value::String(s)) => coerce_decimal(&s),
            (Native::Decimal, Value::Bool(b)) => Some(Value::from(u8::from(b).to_string())),
            (Native::Text, Value::String(s)) => Some(Value::String(s)),
            (Native::Text, Value::Number(n)) => Some(Value::String(n.to_string())),
            (Native::Text, Value::Bool(b)) => Some(Value::String(b.to_string())),
            (Native::Bool, Value::Bool(b)) => Some(Value::Bool(b)),
            (Native::Bool, Value::Number(n)) => match n.as_i64() {
                Some(0) => Some(Value::Bool(false)),
                Some(1) => Some(Value::Bool(true)),
                _ => None,
            },
            (Native::Bool, Value::String(s)) => match s.to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            (Native::Date, Value::String(s)) => {
                NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok().map(|_| Value::String(s))
            }
            (Native::DateTime, Value::String(s)) => is_datetime(s.trim()).then_some(Value::String(s)),
            (Native::Time, Value::String(s)) => is_time(s.trim()).then_some(Value::String(s)),
            (Native::Interval, Value::String(s)) => {
                is_interval(s.trim()).then_some(Value::String(s))
            }
            (Native::Bytes, Value::String(s)) => is_bytea(&s).then_some(Value::String(s)),
            (Native::Bytes, Value::Array(items)) => {
                let mut hex = String::from("\\x");
                for item in items {
                    let byte = item.as_u64().and_then(|b| u8::try_from(b).ok())?;
                    hex.push_str(&format!("{:02x}", byte));
                }
                Some(Value::String(hex))
            }
            (Native::Json, Value::Object(map)) => Some(Value::Object(map)),
            (Native::List, Value::Array(items)) => Some(Value::Array(items)),
            _ => None,
        }
    }
}

fn coerce_int(value: Value, (min, max): (i64, i64)) -> Option<Value> {
    let n = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => {
                let f = n.as_f64().filter(|f| f.is_finite())?.trunc();
                if f < i64::MIN as f64 || f > i64::MAX as f64 {
                    return None;
                }
                f as i64
            }
        },
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        Value::Bool(b) => i64::from(b),
        _ => return None,
    };

    (min..=max).contains(&n).then(|| Value::from(n))
}

pub(crate) fn is_decimal(s: &str) -> bool {
    coerce_decimal(s).is_some()
}

/// NUMERIC defaults keep their exact decimal text, scale included.
fn coerce_decimal(s: &str) -> Option<Value> {
    let s = s.trim();
    Decimal::from_str_exact(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
        .map(|d| Value::String(d.to_string()))
}

fn is_datetime(s: &str) -> bool {
    chrono::DateTime::<FixedOffset>::parse_from_rfc3339(s).is_ok()
        || ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"]
            .iter()
            .any(|fmt| chrono::DateTime::<FixedOffset>::parse_from_str(s, fmt).is_ok())
        || [
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M",
        ]
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(s, fmt).is_ok())
}

fn is_time(s: &str) -> bool {
    ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
        .iter()
        .any(|fmt| NaiveTime::parse_from_str(s, fmt).is_ok())
        || chrono::DateTime::<FixedOffset>::parse_from_str(
            &format!("1970-01-01 {}", s),
            "%Y-%m-%d %H:%M:%S%.f%#z",
        )
        .is_ok()
}

const INTERVAL_UNITS: &[&str] = &[
    "microsecond", "microseconds", "us", "usec", "usecs",
    "millisecond", "milliseconds", "ms", "msec", "msecs",
    "second", "seconds", "s", "sec", "secs",
    "minute", "minutes", "m", "min", "mins",
    "hour", "hours", "h", "hr", "hrs",
    "day", "days", "d",
    "week", "weeks", "w",
    "month", "months", "mon", "mons",
    "year", "years", "y", "yr", "yrs",
    "decade", "decades", "century", "centuries", "millennium", "millennia",
];

/// PostgreSQL interval input: `[@] <n> <unit> ... [hh:mm[:ss]] [ago]`, or
/// ISO 8601 `P...`.
fn is_interval(s: &str) -> bool {
    if let Some(rest) = s.strip_prefix('P') {
        return is_iso_duration(rest);
    }

    let mut tokens = s.split_whitespace().peekable();
    if tokens.peek() == Some(&"@") {
        tokens.next();
    }
    let mut seen = false;
    while let Some(token) = tokens.next() {
        if token.eq_ignore_ascii_case("ago") {
            return seen && tokens.next().is_none();
        }
        if is_clock(token) {
            seen = true;
            continue;
        }
        if token.parse::<f64>().is_err() {
            return false;
        }
        let unit = tokens.peek().map(|u| u.to_ascii_lowercase());
        if unit.is_some_and(|u| INTERVAL_UNITS.contains(&u.as_str())) {
            tokens.next();
        }
        seen = true;
    }
    seen
}

fn is_clock(token: &str) -> bool {
    let token = token.trim_start_matches(['+', '-']);
    let parts: Vec<&str> = token.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return false;
    }
    let Some((last, init)) = parts.split_last() else {
        return false;
    };
    init.iter()
        .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
        && !last.is_empty()
        && last.parse::<f64>().is_ok_and(|f| f >= 0.0)
}

/// Hex input must be `\x` followed by whole bytes; anything else is escape
/// format text.
fn is_bytea(s: &str) -> bool {
    match s.strip_prefix("\\x") {
        Some(hex) => hex.len() % 2 == 0 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => true,
    }
}

fn is_iso_duration(rest: &str) -> bool {
    let mut number = false;
    let mut any = false;
    let mut in_time = false;
    for c in rest.chars() {
        match c {
            '0'..='9' | '.' => number = true,
            'T' if !number && !in_time => in_time = true,
            'Y' | 'W' | 'D' if number && !in_time => {
                number = false;
                any = true;
            }
            'H' | 'S' if number && in_time => {
                number = false;
                any = true;
            }
            'M' if number => {
                number = false;
                any = true;
            }
            _ => return false,
        }
    }
    any && !number
}

fn require_real(ty: &SqlType) -> Result<()> {
    if ty.is_real_type() {
        Ok(())
    } else {
        Err(Error::schema(r#"sql_type must be a "real" type"#))
    }
}

macro_rules! unit_types {
    ($($name:ident => $variant:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            pub struct $name;

            impl From<$name> for SqlType {
                fn from(_: $name) -> Self {
                    SqlType::$variant
                }
            }
        )*
    };
}

unit_types! {
    Binary => Binary,
    Boolean => Boolean,
    Date => Date,
    Real => Real,
    Float => Float,
    Json => Json,
}

macro_rules! into_sql_type {
    ($($name:ident),* $(,)?) => {
        $(
            impl From<$name> for SqlType {
                fn from(t: $name) -> Self {
                    SqlType::$name(t)
                }
            }
        )*
    };
}

into_sql_type!(DateTime, Integer, Serial, Interval, Numeric, Time, ForeignKey, Array);

impl From<Text> for SqlType {
    fn from(t: Text) -> Self {
        SqlType::Text(t)
    }
}

/// `TIMESTAMP WITH[OUT] TIME ZONE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTime {
    timezone: bool,
}

impl DateTime {
    pub const fn new(timezone: bool) -> Self {
        Self { timezone }
    }

    pub const fn timezone(&self) -> bool {
        self.timezone
    }

    fn to_sql(self) -> String {
        if self.timezone {
            "TIMESTAMP WITH TIME ZONE".to_string()
        } else {
            "TIMESTAMP WITHOUT TIME ZONE".to_string()
        }
    }
}

/// `TIME WITH[OUT] TIME ZONE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Time {
    timezone: bool,
}

impl Time {
    pub const fn new(timezone: bool) -> Self {
        Self { timezone }
    }

    pub const fn timezone(&self) -> bool {
        self.timezone
    }

    fn to_sql(self) -> String {
        if self.timezone {
            "TIME WITH TIME ZONE".to_string()
        } else {
            "TIME WITHOUT TIME ZONE".to_string()
        }
    }
}

/// `INTEGER`, `BIGINT` or `SMALLINT`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integer {
    big: bool,
    small: bool,
}

impl Integer {
    pub fn new(big: bool, small: bool) -> Result<Self> {
        if big && small {
            return Err(Error::schema(
                "Integer column type cannot be both big and small",
            ));
        }
        Ok(Self { big, small })
    }

    pub const fn big() -> Self {
        Self {
            big: true,
            small: false,
        }
    }

    pub const fn small() -> Self {
        Self {
            big: false,
            small: true,
        }
    }

    fn bounds(&self) -> (i64, i64) {
        width_bounds(self.big, self.small)
    }

    fn to_sql(self) -> String {
        if self.big || self.small {
            format!("{}INT", width_prefix(self.big, self.small))
        } else {
            "INTEGER".to_string()
        }
    }
}

/// `SERIAL`, `BIGSERIAL` or `SMALLSERIAL`; auto-generated by the database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Serial {
    big: bool,
    small: bool,
}

impl Serial {
    pub fn new(big: bool, small: bool) -> Result<Self> {
        if big && small {
            return Err(Error::schema(
                "Integer column type cannot be both big and small",
            ));
        }
        Ok(Self { big, small })
    }

    pub const fn big() -> Self {
        Self {
            big: true,
            small: false,
        }
    }

    pub const fn small() -> Self {
        Self {
            big: false,
            small: true,
        }
    }

    fn bounds(&self) -> (i64, i64) {
        width_bounds(self.big, self.small)
    }

    fn to_sql(self) -> String {
        format!("{}SERIAL", width_prefix(self.big, self.small))
    }
}

const fn width_prefix(big: bool, small: bool) -> &'static str {
    if big {
        "BIG"
    } else if small {
        "SMALL"
    } else {
        ""
    }
}

fn width_bounds(big: bool, small: bool) -> (i64, i64) {
    if big {
        (i64::MIN, i64::MAX)
    } else if small {
        (i16::MIN.into(), i16::MAX.into())
    } else {
        (i32::MIN.into(), i32::MAX.into())
    }
}

/// Field restriction of an `INTERVAL` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntervalField {
    #[serde(rename = "YEAR")]
    Year,
    #[serde(rename = "MONTH")]
    Month,
    #[serde(rename = "DAY")]
    Day,
    #[serde(rename = "HOUR")]
    Hour,
    #[serde(rename = "MINUTE")]
    Minute,
    #[serde(rename = "SECOND")]
    Second,
    #[serde(rename = "YEAR TO MONTH")]
    YearToMonth,
    #[serde(rename = "DAY TO HOUR")]
    DayToHour,
    #[serde(rename = "DAY TO MINUTE")]
    DayToMinute,
    #[serde(rename = "DAY TO SECOND")]
    DayToSecond,
    #[serde(rename = "HOUR TO MINUTE")]
    HourToMinute,
    #[serde(rename = "HOUR TO SECOND")]
    HourToSecond,
    #[serde(rename = "MINUTE TO SECOND")]
    MinuteToSecond,
}

impl IntervalField {
    pub const ALL: [IntervalField; 13] = [
        IntervalField::Year,
        IntervalField::Month,
        IntervalField::Day,
        IntervalField::Hour,
        IntervalField::Minute,
        IntervalField::Second,
        IntervalField::YearToMonth,
        IntervalField::DayToHour,
        IntervalField::DayToMinute,
        IntervalField::DayToSecond,
        IntervalField::HourToMinute,
        IntervalField::HourToSecond,
        IntervalField::MinuteToSecond,
    ];

    pub const fn as_sql(self) -> &'static str {
        match self {
            IntervalField::Year => "YEAR",
            IntervalField::Month => "MONTH",
            IntervalField::Day => "DAY",
            IntervalField::Hour => "HOUR",
            IntervalField::Minute => "MINUTE",
            IntervalField::Second => "SECOND",
            IntervalField::YearToMonth => "YEAR TO MONTH",
            IntervalField::DayToHour => "DAY TO HOUR",
            IntervalField::DayToMinute => "DAY TO MINUTE",
            IntervalField::DayToSecond => "DAY TO SECOND",
            IntervalField::HourToMinute => "HOUR TO MINUTE",
            IntervalField::HourToSecond => "HOUR TO SECOND",
            IntervalField::MinuteToSecond => "MINUTE TO SECOND",
        }
    }
}

impl FromStr for IntervalField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.to_uppercase();
        Self::ALL
            .into_iter()
            .find(|f| f.as_sql() == upper)
            .ok_or_else(|| Error::schema("invalid interval specified"))
    }
}

/// `INTERVAL [field]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    field: Option<IntervalField>,
}

impl Interval {
    pub fn new(field: Option<&str>) -> Result<Self> {
        let field: Option<IntervalField> = field
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::parse)
            .transpose()?;
        Ok(Self { field })
    }

    pub const fn with_field(field: IntervalField) -> Self {
        Self { field: Some(field) }
    }

    pub const fn field(&self) -> Option<IntervalField> {
        self.field
    }

    fn to_sql(self) -> String {
        match self.field {
            Some(field) => format!("INTERVAL {}", field.as_sql()),
            None => "INTERVAL".to_string(),
        }
    }
}

/// `NUMERIC[(precision, scale)]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Numeric {
    precision: Option<u32>,
    scale: Option<u32>,
}

impl Numeric {
    pub const MAX_PRECISION: u32 = 1000;

    pub fn new(precision: Option<u32>, scale: Option<u32>) -> Result<Self> {
        let mut scale = scale;
        if let Some(p) = precision {
            if p > Self::MAX_PRECISION {
                return Err(Error::schema(
                    "precision must be greater than 0 and below 1000",
                ));
            }
            scale = Some(scale.unwrap_or(0));
        }
        Ok(Self { precision, scale })
    }

    pub const fn precision(&self) -> Option<u32> {
        self.precision
    }

    pub const fn scale(&self) -> Option<u32> {
        self.scale
    }

    fn to_sql(self) -> String {
        match self.precision {
            Some(p) => format!("NUMERIC({}, {})", p, self.scale.unwrap_or(0)),
            None => "NUMERIC".to_string(),
        }
    }
}

/// `TEXT`, `VARCHAR(n)` or `CHAR(n)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    length: Option<u32>,
    fixed: bool,
}

impl Text {
    pub fn new(length: Option<u32>, fixed: bool) -> Result<Self> {
        if fixed && length.is_none() {
            return Err(Error::schema("Cannot have fixed string with no length"));
        }
        Ok(Self { length, fixed })
    }

    pub const fn varchar(length: u32) -> Self {
        Self {
            length: Some(length),
            fixed: false,
        }
    }

    pub const fn fixed(length: u32) -> Self {
        Self {
            length: Some(length),
            fixed: true,
        }
    }

    pub const fn length(&self) -> Option<u32> {
        self.length
    }

    fn to_sql(self) -> String {
        match (self.length, self.fixed) {
            (None, _) => "TEXT".to_string(),
            (Some(n), true) => format!("CHAR({})", n),
            (Some(n), false) => format!("VARCHAR({})", n),
        }
    }
}

/// Action taken on referencing rows when the referenced row changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferentialAction {
    #[serde(rename = "NO ACTION")]
    NoAction,
    #[serde(rename = "RESTRICT")]
    Restrict,
    #[serde(rename = "CASCADE")]
    Cascade,
    #[serde(rename = "SET NULL")]
    SetNull,
    #[serde(rename = "SET DEFAULT")]
    SetDefault,
}

impl ReferentialAction {
    pub const ALL: [ReferentialAction; 5] = [
        ReferentialAction::NoAction,
        ReferentialAction::Restrict,
        ReferentialAction::Cascade,
        ReferentialAction::SetNull,
        ReferentialAction::SetDefault,
    ];

    pub const fn as_sql(self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }
}

impl FromStr for ReferentialAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.to_uppercase();
        Self::ALL
            .into_iter()
            .find(|a| a.as_sql() == upper)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|a| a.as_sql()).collect();
                Error::schema(format!(
                    "referential action must be one of {}, got '{}'",
                    valid.join(", "),
                    s
                ))
            })
    }
}

/// `<type> REFERENCES <table>(<column>) ON DELETE <action> ON UPDATE <action>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    table: String,
    column: String,
    sql_type: Box<SqlType>,
    on_delete: ReferentialAction,
    on_update: ReferentialAction,
}

impl ForeignKey {
    /// References `table(column)` as an `INTEGER`, cascading deletes.
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Result<Self> {
        let table = table.into();
        let column = column.into();
        if table.is_empty() {
            return Err(Error::schema("missing table to reference"));
        }
        if column.is_empty() {
            return Err(Error::schema("missing column to reference"));
        }
        Ok(Self {
            table,
            column,
            sql_type: Box::new(SqlType::Integer(Integer::default())),
            on_delete: ReferentialAction::Cascade,
            on_update: ReferentialAction::NoAction,
        })
    }

    pub fn on_delete(mut self, action: &str) -> Result<Self> {
        self.on_delete = action.parse()?;
        Ok(self)
    }

    pub fn on_update(mut self, action: &str) -> Result<Self> {
        self.on_update = action.parse()?;
        Ok(self)
    }

    /// Overrides the underlying column type, which must be a real type.
    pub fn sql_type(mut self, ty: impl Into<SqlType>) -> Result<Self> {
        let ty = ty.into();
        require_real(&ty)?;
        self.sql_type = Box::new(ty);
        Ok(self)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub const fn actions(&self) -> (ReferentialAction, ReferentialAction) {
        (self.on_delete, self.on_update)
    }

    fn to_sql(&self) -> String {
        format!(
            "{} REFERENCES {}({}) ON DELETE {} ON UPDATE {}",
            self.sql_type.to_sql(),
            self.table,
            self.column,
            self.on_delete.as_sql(),
            self.on_update.as_sql()
        )
    }
}

/// `<element type> ARRAY`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Array {
    element: Box<SqlType>,
}

impl Array {
    pub fn new(element: impl Into<SqlType>) -> Result<Self> {
        let element = element.into();
        require_real(&element)?;
        Ok(Self {
            element: Box::new(element),
        })
    }

    pub fn element(&self) -> &SqlType {
        &self.element
    }

    fn to_sql(&self) -> String {
        format!("{} ARRAY", self.element.to_sql())
    }
}
