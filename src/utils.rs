//! Utility functions for minting and parsing identifiers

use bech32::Bech32m;
use uuid7::uuid7;

use crate::error::ValidationError;

// construct a unique id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

/// Checks that `value` is a bech32 string carrying `hrp` and a 16 byte uuid payload.
pub fn check_bech32_uuid(hrp: &str, value: &str) -> Result<(), ValidationError> {
    let malformed = || ValidationError::MalformedIdentifier {
        expected: hrp.to_string(),
        got: value.to_string(),
    };

    let (parsed_hrp, payload) = bech32::decode(value).map_err(|_| malformed())?;

    if parsed_hrp.as_str() != hrp || payload.len() != 16 {
        return Err(malformed());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_ids_parse_back() {
        let id = new_uuid_to_bech32("sub_").unwrap();
        assert!(check_bech32_uuid("sub_", &id).is_ok());
    }

    #[test]
    fn wrong_prefix_is_rejected() {
        let id = new_uuid_to_bech32("user_").unwrap();
        assert!(matches!(
            check_bech32_uuid("listing_", &id),
            Err(ValidationError::MalformedIdentifier { .. })
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(check_bech32_uuid("user_", "not-an-id").is_err());
        assert!(check_bech32_uuid("user_", "").is_err());
    }
}
