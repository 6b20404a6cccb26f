//! Domain types, converters and providers of the bookshelf service.

use routecraft::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

/// A calendar date written `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IsoDate {
    year: i32,
    month: u32,
    day: u32,
}

const DAYS_BEFORE_MONTH: [u32; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

fn is_leap(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

impl IsoDate {
    #[must_use]
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
            return None;
        }
        Some(Self { year, month, day })
    }

    /// 1-based ordinal day within the year.
    #[must_use]
    pub fn day_of_year(&self) -> u32 {
        let leap_day = u32::from(self.month > 2 && is_leap(self.year));
        DAYS_BEFORE_MONTH[(self.month - 1) as usize] + leap_day + self.day
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDate(String);

impl fmt::Display for InvalidDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` is not a YYYY-MM-DD date", self.0)
    }
}

impl std::error::Error for InvalidDate {}

impl FromStr for IsoDate {
    type Err = InvalidDate;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidDate(raw.to_string());
        let mut parts = raw.split('-');
        let (Some(year), Some(month), Some(day), None) = (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        if year.len() != 4 || month.len() != 2 || day.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        let day = day.parse().map_err(|_| invalid())?;
        Self::new(year, month, day).ok_or_else(invalid)
    }
}

impl fmt::Display for IsoDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl TryFrom<String> for IsoDate {
    type Error = InvalidDate;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<IsoDate> for String {
    fn from(date: IsoDate) -> Self {
        date.to_string()
    }
}

/// Explicit converter for dates; also accepts `YYYYMMDD`.
pub struct IsoDateConverter;

impl Converter<IsoDate> for IsoDateConverter {
    fn from_string(&self, raw: &str) -> Option<IsoDate> {
        if let Ok(date) = raw.parse() {
            return Some(date);
        }
        if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
            return format!("{}-{}-{}", &raw[..4], &raw[4..6], &raw[6..]).parse().ok();
        }
        None
    }

    fn to_string(&self, value: &IsoDate) -> String {
        value.to_string()
    }
}

/// A free-form label. No converter is registered for it, so routes taking a
/// `Tag` need an explicit `#[convert]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag(pub String);

pub struct TagConverter;

impl Converter<Tag> for TagConverter {
    fn from_string(&self, raw: &str) -> Option<Tag> {
        (!raw.is_empty()).then(|| Tag(raw.to_string()))
    }

    fn to_string(&self, value: &Tag) -> String {
        value.0.clone()
    }
}

/// Supplied by a registered provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answer(pub i32);

/// Requested by a route but never registered.
#[derive(Debug, Clone)]
pub struct Unprovided;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub shelf: String,
    pub added: IsoDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub shelf: String,
    pub added: IsoDate,
}

#[derive(Debug, Default)]
struct Shelves {
    next_id: u64,
    books: BTreeMap<u64, Book>,
}

/// Shared in-memory book store handed to handlers by a provider.
#[derive(Debug, Clone, Default)]
pub struct Store {
    inner: Arc<Mutex<Shelves>>,
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Shelves) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn add(&self, book: NewBook) -> Book {
        self.with(|shelves| {
            shelves.next_id += 1;
            let book = Book {
                id: shelves.next_id,
                title: book.title,
                author: book.author,
                shelf: book.shelf,
                added: book.added,
            };
            shelves.books.insert(book.id, book.clone());
            book
        })
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<Book> {
        self.with(|shelves| shelves.books.get(&id).cloned())
    }

    pub fn remove(&self, id: u64) -> bool {
        self.with(|shelves| shelves.books.remove(&id).is_some())
    }

    /// Books in id order, optionally by one author.
    #[must_use]
    pub fn list(&self, author: Option<&str>, limit: Option<usize>) -> Vec<Book> {
        self.with(|shelves| {
            shelves
                .books
                .values()
                .filter(|book| author.map_or(true, |a| book.author == a))
                .take(limit.unwrap_or(usize::MAX))
                .cloned()
                .collect()
        })
    }

    /// Books on `shelf`, added on or after `since` when given.
    #[must_use]
    pub fn on_shelf(&self, shelf: &str, since: Option<IsoDate>) -> Vec<Book> {
        self.with(|shelves| {
            shelves
                .books
                .values()
                .filter(|book| book.shelf == shelf && since.map_or(true, |s| book.added >= s))
                .cloned()
                .collect()
        })
    }
}
