//! Typed Reddit record with lenient decoding, and the per-line parse result.
//!
//! Dumps are inconsistent across years: `created_utc` is a string in older
//! months, `title` can be `null`, floats show up where ints are expected.
//! Every field therefore has a default and numbers decode from ints, floats
//! or numeric strings.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One submission or comment as read from a dump line.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, deserialize_with = "de::string")]
    pub id: String,
    #[serde(default, deserialize_with = "de::string")]
    pub title: String,
    #[serde(default, deserialize_with = "de::int")]
    pub score: i64,
    #[serde(default, deserialize_with = "de::string")]
    pub subreddit: String,
    #[serde(default, deserialize_with = "de::string")]
    pub url: String,
    #[serde(default, deserialize_with = "de::string")]
    pub selftext: String,
    #[serde(default, deserialize_with = "de::string")]
    pub author: String,
    #[serde(default, deserialize_with = "de::int")]
    pub created_utc: i64,
    #[serde(default, deserialize_with = "de::int")]
    pub num_comments: i64,
    #[serde(default, deserialize_with = "de::flag")]
    pub over_18: bool,
    #[serde(default, deserialize_with = "de::string")]
    pub permalink: String,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub link_flair_text: Option<String>,

    // comments only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

const PSEUDO_TEXT: [&str; 3] = ["[deleted]", "[removed]", "[deleted by user]"];

impl Record {
    /// Comments carry a `body`; submissions do not.
    pub fn is_comment(&self) -> bool {
        self.body.is_some()
    }

    pub fn has_selftext(&self) -> bool {
        !self.selftext.trim().is_empty()
    }

    /// The text that identifies the record: title for submissions, body for comments.
    pub fn headline(&self) -> &str {
        match &self.body {
            Some(b) => b,
            None => &self.title,
        }
    }

    /// False when the headline is empty or a deletion placeholder.
    pub fn has_live_headline(&self) -> bool {
        let h = self.headline().trim();
        !h.is_empty() && !PSEUDO_TEXT.iter().any(|p| h.eq_ignore_ascii_case(p))
    }

    /// Reddit "fullname" of the record (`t3_` submissions, `t1_` comments).
    pub fn fullname(&self) -> String {
        let prefix = if self.is_comment() { "t1_" } else { "t3_" };
        format!("{prefix}{}", self.id)
    }
}

/// Outcome of parsing one input line.
#[derive(Debug)]
pub enum ParsedLine {
    Record(Box<Record>),
    Blank,
    Malformed(String),
}

impl ParsedLine {
    pub fn into_record(self) -> Option<Record> {
        match self {
            ParsedLine::Record(r) => Some(*r),
            _ => None,
        }
    }
}

/// Parse a JSON line into a `Record`. Never fails: bad input is reported as `Malformed`.
pub fn parse_record_line(line: &str) -> ParsedLine {
    if line.trim().is_empty() {
        return ParsedLine::Blank;
    }
    match serde_json::from_str::<Record>(line) {
        Ok(r) => ParsedLine::Record(Box::new(r)),
        Err(e) => ParsedLine::Malformed(e.to_string()),
    }
}

mod de {
    use super::*;

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    /// Like `string`, but `null` stays `None`.
    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    pub fn int<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(match v {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(0),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                    .unwrap_or(0)
            }
            _ => 0,
        })
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_i64().unwrap_or(0) != 0,
            Value::String(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        })
    }
}
