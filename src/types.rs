//! Identifier and timestamp types shared by the stores and the engine
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};

use crate::error::ValidationError;
use crate::utils::{check_bech32_uuid, new_uuid_to_bech32};

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

// `Utc` is not `Ord`; order by the instant.
impl PartialOrd for TimeStamp<Utc> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeStamp<Utc> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

// Newtype over a bech32m encoded uuid7. The prefix tells the id kinds apart.
macro_rules! bech32_id {
    ($(#[$meta:meta])* $name:ident, $hrp:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            pub const HRP: &'static str = $hrp;

            /// Mint a fresh, time ordered identifier.
            pub fn new() -> anyhow::Result<Self> {
                Ok(Self(new_uuid_to_bech32(Self::HRP)?))
            }
            pub fn parse(value: &str) -> Result<Self, ValidationError> {
                check_bech32_uuid(Self::HRP, value)?;
                Ok(Self(value.to_string()))
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl<C> minicbor::Encode<C> for $name {
            fn encode<W: minicbor::encode::Write>(
                &self,
                e: &mut minicbor::Encoder<W>,
                _: &mut C,
            ) -> Result<(), minicbor::encode::Error<W::Error>> {
                e.str(&self.0)?.ok()
            }
        }

        impl<'b, C> minicbor::Decode<'b, C> for $name {
            fn decode(
                d: &mut minicbor::Decoder<'b>,
                _: &mut C,
            ) -> Result<Self, minicbor::decode::Error> {
                Self::parse(d.str()?)
                    .map_err(|_| minicbor::decode::Error::message(concat!("malformed ", $hrp, " id")))
            }
        }
    };
}

bech32_id!(
    /// A registered user, either tutor or student depending on the record.
    UserId,
    "user_"
);
bech32_id!(ListingId, "listing_");
bech32_id!(
    /// Key of a [`crate::record::SubscriptionRecord`].
    SubscriptionId,
    "sub_"
);

/// Opaque session credential. Only its digest is ever persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self(new_uuid_to_bech32("session_")?))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
    pub fn digest(&self) -> String {
        sha256::digest(self.0.as_str())
    }
}

impl From<&str> for SessionToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// keep tokens out of logs
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_encoding() {
        let original = TimeStamp::new();

        let encoding = minicbor::to_vec(original.clone()).unwrap();
        let decode: TimeStamp<Utc> = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }

    #[test]
    fn timestamps_order_by_instant() {
        let earlier = TimeStamp::from(DateTime::from_timestamp_nanos(1_000));
        let later = TimeStamp::from(DateTime::from_timestamp_nanos(2_000));

        assert!(earlier < later);
        assert_eq!(later.cmp(&earlier), std::cmp::Ordering::Greater);

        let mut stamps = vec![later.clone(), earlier.clone()];
        stamps.sort();
        assert_eq!(stamps, vec![earlier, later]);
    }

    #[test]
    fn ids_are_typed_by_prefix() {
        let user = UserId::new().unwrap();

        assert!(user.as_str().starts_with("user_1"));
        assert!(ListingId::parse(user.as_str()).is_err());
        assert_eq!(UserId::parse(user.as_str()).unwrap(), user);
    }

    #[test]
    fn corrupt_id_fails_to_decode() {
        let encoding = minicbor::to_vec("user_garbage").unwrap();
        let decoded: Result<UserId, _> = minicbor::decode(&encoding);

        assert!(decoded.is_err());
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = SessionToken::from("secret");
        assert!(!format!("{token:?}").contains("secret"));
    }
}
