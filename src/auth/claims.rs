use std::fmt;
use std::time::Duration;

use chrono::Utc;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::AuthError;

/// Claims carried by every access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Subject,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
    pub role: String,
}

impl Claims {
    /// Claims for `user_id` valid from now until `ttl` elapses.
    pub fn new(user_id: i64, role: impl Into<String>, issuer: &str, ttl: Duration) -> Self {
        let now = Utc::now().timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            sub: Subject(user_id),
            iss: issuer.to_string(),
            aud: issuer.to_string(),
            exp: now.saturating_add(ttl_secs),
            iat: now,
            nbf: now,
            role: role.into(),
        }
    }

    /// The principal identifier named by the token.
    pub fn user_id(&self) -> Result<i64, AuthError> {
        if self.sub.0 <= 0 {
            return Err(AuthError::InvalidSubject(self.sub.0.to_string()));
        }
        Ok(self.sub.0)
    }
}

/// Token subject as an exact integer.
///
/// Issuers that round-trip claims through a loosely typed map may deliver the
/// subject as `42`, `42.0` or `"42"`. All of those decode to the same id;
/// anything with a fractional part, or outside the range where a float is
/// exact, is rejected instead of being rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject(pub i64);

// 2^53: beyond this an f64 no longer identifies a unique integer
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

impl Serialize for Subject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for Subject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SubjectVisitor)
    }
}

struct SubjectVisitor;

impl<'de> Visitor<'de> for SubjectVisitor {
    type Value = Subject;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an integer subject, optionally float- or string-formatted")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Subject, E> {
        Ok(Subject(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Subject, E> {
        i64::try_from(v)
            .map(Subject)
            .map_err(|_| E::custom(format!("subject {} out of range", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Subject, E> {
        if !v.is_finite() || v.fract() != 0.0 || v.abs() > MAX_EXACT_FLOAT {
            return Err(E::custom(format!("subject {} is not an exact integer", v)));
        }
        // exact: integral and within the 53-bit mantissa
        Ok(Subject(v as i64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Subject, E> {
        parse_subject(v).map(Subject).map_err(E::custom)
    }
}

/// Parses `"42"`, `"42."` or `"42.000"` as 42 without going through a float.
pub fn parse_subject(raw: &str) -> Result<i64, String> {
    let raw = raw.trim();
    let integral = match raw.split_once('.') {
        Some((int_part, frac)) if frac.chars().all(|c| c == '0') => int_part,
        Some(_) => return Err(format!("subject {:?} has a fractional part", raw)),
        None => raw,
    };
    integral
        .parse::<i64>()
        .map_err(|_| format!("subject {:?} is not an integer", raw))
}
