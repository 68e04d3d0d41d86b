//! Typed access to attribute values by ID.
//!
//! Every accessor comes in two forms: `get_*_key` fails with
//! [`ErrorKind::KeyNotFound`](crate::ErrorKind::KeyNotFound) when the key is
//! absent, while `get_*_key_or` returns the default instead. Both fail with
//! [`ErrorKind::WrongValue`](crate::ErrorKind::WrongValue) when the value is
//! present but does not convert, an empty value included.

use std::borrow::Cow;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};

use crate::document::Document;
use crate::{Error, Result};

pub trait Lookup {
    /// Absolute attribute ID for `key` as seen from this scope.
    fn resolve_key<'k>(&self, key: &'k str) -> Cow<'k, str>;

    /// Raw value stored under `key`, if any.
    fn lookup(&self, key: &str) -> Option<&str>;

    fn get_key(&self, key: &str) -> Result<&str> {
        self.lookup(key)
            .ok_or_else(|| Error::key_not_found(&self.resolve_key(key)))
    }

    fn get_key_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.lookup(key).unwrap_or(default)
    }

    fn get_int_key(&self, key: &str) -> Result<i64> {
        let value = self.get_key(key)?;
        parse_int(&self.resolve_key(key), value)
    }

    fn get_int_key_or(&self, key: &str, default: i64) -> Result<i64> {
        match self.lookup(key) {
            Some(value) => parse_int(&self.resolve_key(key), value),
            None => Ok(default),
        }
    }

    fn get_decimal_key(&self, key: &str) -> Result<BigDecimal> {
        let value = self.get_key(key)?;
        parse_decimal(&self.resolve_key(key), value)
    }

    fn get_decimal_key_or(&self, key: &str, default: BigDecimal) -> Result<BigDecimal> {
        match self.lookup(key) {
            Some(value) => parse_decimal(&self.resolve_key(key), value),
            None => Ok(default),
        }
    }

    /// Date parsed with a `strftime`-style `format`, e.g. `%d.%m.%Y`.
    fn get_date_key(&self, key: &str, format: &str) -> Result<NaiveDate> {
        let value = self.get_key(key)?;
        parse_date(&self.resolve_key(key), value, format)
    }

    fn get_date_key_or(&self, key: &str, format: &str, default: NaiveDate) -> Result<NaiveDate> {
        match self.lookup(key) {
            Some(value) => parse_date(&self.resolve_key(key), value, format),
            None => Ok(default),
        }
    }

    fn get_datetime_key(&self, key: &str, format: &str) -> Result<NaiveDateTime> {
        let value = self.get_key(key)?;
        parse_datetime(&self.resolve_key(key), value, format)
    }

    fn get_datetime_key_or(
        &self,
        key: &str,
        format: &str,
        default: NaiveDateTime,
    ) -> Result<NaiveDateTime> {
        match self.lookup(key) {
            Some(value) => parse_datetime(&self.resolve_key(key), value, format),
            None => Ok(default),
        }
    }
}

impl Lookup for Document {
    fn resolve_key<'k>(&self, key: &'k str) -> Cow<'k, str> {
        Cow::Borrowed(key)
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        self.attr_value_by_key(key)
    }
}

pub(crate) fn parse_int(key: &str, value: &str) -> Result<i64> {
    i64::from_str(value).map_err(|_| Error::wrong_value(key, "an integer", value))
}

pub(crate) fn parse_decimal(key: &str, value: &str) -> Result<BigDecimal> {
    if value.is_empty() {
        return Err(Error::wrong_value(key, "a decimal", value));
    }
    BigDecimal::from_str(value).map_err(|_| Error::wrong_value(key, "a decimal", value))
}

pub(crate) fn parse_date(key: &str, value: &str, format: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, format).map_err(|_| Error::wrong_value(key, "a date", value))
}

pub(crate) fn parse_datetime(key: &str, value: &str, format: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, format)
        .map_err(|_| Error::wrong_value(key, "a date and time", value))
}
