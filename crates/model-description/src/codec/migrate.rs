//! Semantic migrations applied while decoding legacy versions.
//!
//! Structural changes (added, removed or defaulted fields) are handled by the
//! schema diffs in each kind's version history. The functions here cover
//! changes of meaning, where a current value has to be computed from legacy
//! data. Each fails closed: data that cannot be upgraded unambiguously is an
//! error, never a guess.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::MigrationError;
use crate::model::credential::classify_auth_type;
use crate::model::{
    unit_ordinal_overflows, AttachmentHost, Platform, DEFAULT_ARCHITECTURE,
    LEGACY_CERTIFICATE_AUTH_TYPE,
};

/// Derives a structured platform from a legacy series name.
///
/// The architecture is taken from the caller when known (for machines, the
/// cloud instance's architecture) and defaults to `amd64` otherwise.
pub fn platform_from_series(
    series: &str,
    architecture: Option<&str>,
) -> Result<Platform, MigrationError> {
    let architecture = architecture
        .filter(|a| !a.is_empty())
        .unwrap_or(DEFAULT_ARCHITECTURE);
    let platform = Platform::from_series(series, architecture).map_err(|_| {
        MigrationError::UnknownSeries {
            series: series.to_string(),
        }
    })?;
    debug!(series, platform = %platform, "derived platform from series");
    Ok(platform)
}

/// Converts a legacy list of offered endpoint names into the alias map,
/// mapping each name to itself.
pub fn offer_endpoints_from_list(names: Vec<String>) -> BTreeMap<String, String> {
    debug!(count = names.len(), "converted offer endpoints list to map");
    names.into_iter().map(|name| (name.clone(), name)).collect()
}

/// Reclassifies a legacy credential by its attributes.
///
/// Only the legacy `certificate` auth type is rewritten. The first
/// recognised attribute bundle wins and the attributes are narrowed to
/// exactly that bundle. Other auth types pass through unchanged.
pub fn reclassify_credential(
    auth_type: String,
    attributes: BTreeMap<String, String>,
) -> Result<(String, BTreeMap<String, String>), MigrationError> {
    if auth_type != LEGACY_CERTIFICATE_AUTH_TYPE {
        return Ok((auth_type, attributes));
    }
    let Some((new_type, keys)) = classify_auth_type(&attributes) else {
        return Err(MigrationError::UnrecognisedCredential {
            auth_type,
            attributes: attributes.into_keys().collect(),
        });
    };
    let narrowed: BTreeMap<String, String> = attributes
        .into_iter()
        .filter(|(key, _)| keys.iter().any(|k| *k == key.as_str()))
        .collect();
    debug!(from = %auth_type, to = new_type, "reclassified credential auth type");
    Ok((new_type.to_string(), narrowed))
}

/// Classifies a legacy flat attachment host identifier.
pub fn classify_host(host_id: &str) -> Result<AttachmentHost, MigrationError> {
    if host_id.is_empty() {
        return Err(MigrationError::EmptyHost);
    }
    if unit_ordinal_overflows(host_id) {
        return Err(MigrationError::UnitOrdinalOutOfRange {
            host: host_id.to_string(),
        });
    }
    let host = AttachmentHost::classify(host_id);
    debug!(
        host_id,
        unit = host.unit().is_some(),
        "disambiguated attachment host"
    );
    Ok(host)
}

/// Converts a single availability zone into a zone list.
pub fn zones_from_single(zone: String) -> Vec<String> {
    if zone.is_empty() { Vec::new() } else { vec![zone] }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MachineId, UnitName};

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_platform_from_series() {
        assert_eq!(
            platform_from_series("bionic", None).unwrap(),
            Platform::parse("amd64/ubuntu/18.04/stable").unwrap()
        );
        assert_eq!(
            platform_from_series("focal", Some("arm64")).unwrap(),
            Platform::parse("arm64/ubuntu/20.04/stable").unwrap()
        );
        assert_eq!(
            platform_from_series("focal", Some("")).unwrap().architecture,
            "amd64"
        );
        assert_eq!(
            platform_from_series("not-a-series", None),
            Err(MigrationError::UnknownSeries {
                series: "not-a-series".to_string()
            })
        );
    }

    #[test]
    fn test_offer_endpoints_from_list() {
        let map = offer_endpoints_from_list(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(map, attrs(&[("a", "a"), ("b", "b")]));
    }

    #[test]
    fn test_reclassify_token() {
        let (auth_type, attributes) =
            reclassify_credential("certificate".to_string(), attrs(&[("Token", "t0k3n")]))
                .unwrap();
        assert_eq!(auth_type, "oauth2");
        assert_eq!(attributes, attrs(&[("Token", "t0k3n")]));
    }

    #[test]
    fn test_reclassify_narrows_to_winning_bundle() {
        let (auth_type, attributes) = reclassify_credential(
            "certificate".to_string(),
            attrs(&[
                ("ClientCertificateData", "cert"),
                ("ClientKeyData", "key"),
                ("Token", "t0k3n"),
                ("Extra", "x"),
            ]),
        )
        .unwrap();
        assert_eq!(auth_type, "clientcertificate");
        assert_eq!(
            attributes,
            attrs(&[("ClientCertificateData", "cert"), ("ClientKeyData", "key")])
        );
    }

    #[test]
    fn test_reclassify_without_bundle_fails() {
        let err = reclassify_credential(
            "certificate".to_string(),
            attrs(&[("username", "u"), ("ClientKeyData", "key")]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            MigrationError::UnrecognisedCredential {
                auth_type: "certificate".to_string(),
                attributes: vec!["ClientKeyData".to_string(), "username".to_string()],
            }
        );
    }

    #[test]
    fn test_other_auth_types_pass_through() {
        let input = attrs(&[("username", "u"), ("password", "p")]);
        let (auth_type, attributes) =
            reclassify_credential("userpass".to_string(), input.clone()).unwrap();
        assert_eq!(auth_type, "userpass");
        assert_eq!(attributes, input);
    }

    #[test]
    fn test_classify_host() {
        assert_eq!(
            classify_host("wordpress/0").unwrap(),
            AttachmentHost::Unit(UnitName::new("wordpress/0"))
        );
        assert_eq!(
            classify_host("1/lxd/0").unwrap(),
            AttachmentHost::Machine(MachineId::new("1/lxd/0"))
        );
        assert_eq!(classify_host(""), Err(MigrationError::EmptyHost));
        assert_eq!(
            classify_host("wordpress/4294967296"),
            Err(MigrationError::UnitOrdinalOutOfRange {
                host: "wordpress/4294967296".to_string()
            })
        );
    }

    #[test]
    fn test_zones_from_single() {
        assert_eq!(zones_from_single(String::new()), Vec::<String>::new());
        assert_eq!(zones_from_single("us-east-1a".to_string()), vec!["us-east-1a"]);
    }
}
