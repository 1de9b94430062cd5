//! What each supported cloud expects from a credential, and where controllers may be placed.

use jujusys_model::Cloud;

/// The fields of a Google service account key file.
const GOOGLE_FIELDS: &[&str] = &[
    "type",
    "project_id",
    "private_key_id",
    "private_key",
    "client_email",
    "client_id",
    "auth_uri",
    "token_uri",
    "auth_provider_x509_cert_url",
    "client_x509_cert_url",
];

const GCE_FIELDS: &[&str] = &["access_key", "secret_key"];

const GCE_REGIONS: &[&str] = &[
    "us-east1",
    "us-central1",
    "us-west1",
    "europe-west1",
    "asia-east1",
    "asia-northeast1",
    "asia-southeast1",
];

/// The exact set of payload fields a credential for `cloud` must have.
pub fn required_fields(cloud: Cloud) -> &'static [&'static str] {
    match cloud {
        Cloud::Google => GOOGLE_FIELDS,
        Cloud::Gce => GCE_FIELDS,
    }
}

pub fn supported_regions(cloud: Cloud) -> &'static [&'static str] {
    match cloud {
        Cloud::Google | Cloud::Gce => GCE_REGIONS,
    }
}

pub fn is_supported_region(cloud: Cloud, region: &str) -> bool {
    supported_regions(cloud).contains(&region)
}

#[test]
fn google_requires_service_account_fields() {
    assert_eq!(required_fields(Cloud::Google).len(), 10);
    assert!(is_supported_region(Cloud::Google, "us-east1"));
    assert!(!is_supported_region(Cloud::Google, "mars-north1"));
}
