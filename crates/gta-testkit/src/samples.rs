//! Sample policy documents shaped like Cloud Resource Manager responses.
//!
//! Each sample records how many (temporary binding, member) pairs it holds,
//! so tests can check listing and cleanup against known answers.

use gta_core::Policy;

/// A sample policy document.
#[derive(Debug, Clone)]
pub struct SamplePolicy {
    /// Human-readable name for the sample.
    pub name: &'static str,
    /// The document exactly as the API would return it.
    pub json: &'static str,
    /// Number of temporary (binding, member) pairs.
    pub temporary_pairs: usize,
}

impl SamplePolicy {
    /// Parse the document.
    pub fn policy(&self) -> Policy {
        serde_json::from_str(self.json).expect("sample policies are valid JSON")
    }
}

/// Get all sample policies.
pub fn all_samples() -> Vec<SamplePolicy> {
    vec![
        SamplePolicy {
            name: "empty policy",
            json: r#"{"version": 1, "etag": "BwXhqDCnBiM="}"#,
            temporary_pairs: 0,
        },
        SamplePolicy {
            name: "plain bindings with audit config",
            json: r#"{
                "version": 1,
                "etag": "BwYB1c8S2vA=",
                "bindings": [
                    {"role": "roles/owner", "members": ["user:owner@example.com"]},
                    {"role": "roles/viewer", "members": ["group:eng@example.com", "domain:example.com"]}
                ],
                "auditConfigs": [
                    {"service": "allServices", "auditLogConfigs": [{"logType": "DATA_READ"}]}
                ]
            }"#,
            temporary_pairs: 0,
        },
        SamplePolicy {
            name: "temporary, foreign conditional and plain bindings",
            json: r#"{
                "version": 3,
                "etag": "BwYC3lq9Zx0=",
                "bindings": [
                    {"role": "roles/owner", "members": ["user:owner@example.com"]},
                    {
                        "role": "roles/viewer",
                        "members": ["user:alice@example.com"],
                        "condition": {
                            "title": "gta_temporary_access_1760616000000000000",
                            "description": "Temporary access granted by gta at 2025-10-16T12:00:00Z",
                            "expression": "request.time < timestamp('2025-10-16T13:00:00Z')"
                        }
                    },
                    {
                        "role": "roles/storage.objectViewer",
                        "members": ["user:alice@example.com"],
                        "condition": {
                            "title": "business_hours",
                            "expression": "request.time.getHours('Europe/Berlin') < 18"
                        }
                    }
                ]
            }"#,
            temporary_pairs: 1,
        },
        SamplePolicy {
            name: "shared temporary binding and unparsable expiry",
            json: r#"{
                "version": 3,
                "etag": "BwYD9k0Lr4c=",
                "bindings": [
                    {
                        "role": "roles/editor",
                        "members": [
                            "user:bob@example.com",
                            "serviceAccount:ci@proj.iam.gserviceaccount.com"
                        ],
                        "condition": {
                            "title": "gta_temporary_access_1760616000000000001",
                            "expression": "request.time < timestamp('2025-10-16T14:00:00Z')"
                        }
                    },
                    {
                        "role": "projects/proj/roles/deployer",
                        "members": ["user:bob@example.com"],
                        "condition": {
                            "title": "gta_temporary_access_legacy",
                            "expression": "request.time < timestamp('tomorrow')"
                        }
                    }
                ]
            }"#,
            temporary_pairs: 3,
        },
    ]
}
