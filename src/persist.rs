//! Custom scalar types.
//!
//! A type implementing [`Persist`] is stored as a single node value using its
//! own text form, instead of being mapped field by field. There are two ways to
//! use it in a mapped type:
//!
//! - wrap the field in [`Persisted<T>`]
//! - annotate the field with `#[serde(with = "serde_tabtree::persist")]`
//!
//! Implementations are provided for `chrono::DateTime<Utc>` (RFC 3339),
//! `chrono::NaiveDate` (`%Y-%m-%d`) and `num_bigint::BigInt` (decimal).
//!
//! ## Examples
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use serde::{Deserialize, Serialize};
//! use serde_tabtree::{from_str, to_string};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Event {
//!     #[serde(with = "serde_tabtree::persist")]
//!     at: chrono::DateTime<Utc>,
//! }
//!
//! let event = Event { at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() };
//! let text = to_string(&event).unwrap();
//! assert_eq!(text, "=\n\tat = 2024-05-01T12:00:00+00:00\n");
//! assert_eq!(from_str::<Event>(&text).unwrap(), event);
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use num_bigint::BigInt;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Deref, DerefMut};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A type with its own text representation.
pub trait Persist: Sized {
    /// Error returned when the text cannot be restored.
    type Err: fmt::Display;

    /// Formats the value as text. The text should not contain line breaks.
    fn persist(&self) -> String;

    /// Parses a value from text produced by [`Persist::persist`].
    fn restore(text: &str) -> Result<Self, Self::Err>;
}

/// Serializes a [`Persist`] value as a string, for `#[serde(with)]`.
pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Persist,
    S: Serializer,
{
    serializer.serialize_str(&value.persist())
}

/// Deserializes a [`Persist`] value from a string, for `#[serde(with)]`.
pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Persist,
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    T::restore(&text).map_err(D::Error::custom)
}

/// Wrapper mapping a [`Persist`] value as a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Persisted<T>(pub T);

impl<T> Persisted<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Persisted<T> {
    fn from(value: T) -> Self {
        Persisted(value)
    }
}

impl<T> Deref for Persisted<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Persisted<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: Persist> Serialize for Persisted<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize(&self.0, serializer)
    }
}

impl<'de, T: Persist> Deserialize<'de> for Persisted<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize(deserializer).map(Persisted)
    }
}

impl Persist for DateTime<Utc> {
    type Err = chrono::ParseError;

    fn persist(&self) -> String {
        self.to_rfc3339()
    }

    fn restore(text: &str) -> Result<Self, Self::Err> {
        DateTime::parse_from_rfc3339(text).map(|dt| dt.with_timezone(&Utc))
    }
}

impl Persist for NaiveDate {
    type Err = chrono::ParseError;

    fn persist(&self) -> String {
        self.format(DATE_FORMAT).to_string()
    }

    fn restore(text: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(text, DATE_FORMAT)
    }
}

impl Persist for BigInt {
    type Err = num_bigint::ParseBigIntError;

    fn persist(&self) -> String {
        self.to_string()
    }

    fn restore(text: &str) -> Result<Self, Self::Err> {
        text.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{de, ser, Error, Tree};
    use chrono::TimeZone;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Account {
        opened: Persisted<NaiveDate>,
        #[serde(with = "crate::persist")]
        balance: BigInt,
    }

    /// Identifier stored as `prefix-number`.
    #[derive(Debug, PartialEq)]
    struct Ticket {
        project: String,
        number: u32,
    }

    impl Persist for Ticket {
        type Err = String;

        fn persist(&self) -> String {
            format!("{}-{}", self.project, self.number)
        }

        fn restore(text: &str) -> Result<Self, String> {
            let (project, number) = text
                .rsplit_once('-')
                .ok_or_else(|| format!("missing dash in {text:?}"))?;
            let number = number.parse().map_err(|e| format!("{e}"))?;
            Ok(Ticket {
                project: project.to_string(),
                number,
            })
        }
    }

    #[test]
    fn test_builtin_scalars() {
        let at = Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(DateTime::<Utc>::restore(&at.persist()).unwrap(), at);

        let date = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
        assert_eq!(date.persist(), "2020-02-29");
        assert_eq!(NaiveDate::restore("2020-02-29").unwrap(), date);

        let big: BigInt = "123456789012345678901234567890".parse().unwrap();
        assert_eq!(big.persist(), "123456789012345678901234567890");
    }

    #[test]
    fn test_persisted_fields_are_scalars() {
        let account = Account {
            opened: NaiveDate::from_ymd_opt(2021, 7, 4).unwrap().into(),
            balance: "-98765432109876543210".parse().unwrap(),
        };

        let mut tree = Tree::new();
        let root = tree.root();
        ser::marshal(&mut tree, root, &account).unwrap();
        assert_eq!(
            tree.to_string(),
            "=\n\topened = 2021-07-04\n\tbalance = -98765432109876543210\n"
        );

        let back: Account = de::from_node(&tree, root).unwrap();
        assert_eq!(back, account);
    }

    #[test]
    fn test_custom_persist_type() {
        let mut tree = Tree::new();
        let root = tree.root();
        let ticket = Persisted(Ticket {
            project: "core-io".to_string(),
            number: 42,
        });
        ser::marshal(&mut tree, root, &ticket).unwrap();
        assert_eq!(tree.value(root), "core-io-42");

        let back: Persisted<Ticket> = de::from_node(&tree, root).unwrap();
        assert_eq!(back.project, "core-io");
        assert_eq!(back.number, 42);
    }

    #[test]
    fn test_restore_error_keeps_message() {
        let tree = Tree::with_root("", "nodash");
        let err = de::from_node::<Persisted<Ticket>>(&tree, tree.root()).unwrap_err();
        match err {
            Error::Custom(msg) => assert_eq!(msg, "missing dash in \"nodash\""),
            other => panic!("unexpected error: {other}"),
        }
    }
}
