#![allow(dead_code)]

use catalog_core::model::note::{RelatedUrl, VulnerabilityDetail, VulnerabilityType};
use catalog_core::model::occurrence::{PackageIssue, VulnerabilityDetails};
use catalog_core::model::{NoteKind, Severity};
use catalog_core::{ListRequest, Note, Occurrence, Operation, Page, StoreResult};

pub const NOTE_PROJECT: &str = "vulnerability-scanner-a";
pub const NOTE_ID: &str = "CVE-1999-0710";
pub const OCCURRENCE_PROJECT: &str = "occurrence-project";
pub const OCCURRENCE_ID: &str = "134";
pub const OPERATION_ID: &str = "foo";

/// Vulnerability note with every optional section populated.
pub fn test_note(project_id: &str) -> Note {
    Note {
        short_description: "CVE-2014-9911".to_string(),
        long_description: "NIST vectors: AV:N/AC:L/Au:N/C:P/I:P".to_string(),
        kind: NoteKind::PackageVulnerability,
        vulnerability_type: Some(VulnerabilityType {
            cvss_score: 7.5,
            severity: Severity::High,
            details: vec![VulnerabilityDetail {
                cpe_uri: "cpe:/o:debian:debian_linux:7".to_string(),
                package: "icu".to_string(),
                severity_name: "HIGH".to_string(),
                description: "Stack-based buffer overflow in the ures_getByKeyWithFallback function"
                    .to_string(),
                min_affected_version: None,
                fixed_version: Some("52.1-8+deb8u4".to_string()),
            }],
        }),
        related_url: vec![RelatedUrl {
            url: "https://security-tracker.debian.org/tracker/CVE-2014-9911".to_string(),
            label: "More Info".to_string(),
        }],
        ..Note::new(project_id, NOTE_ID)
    }
}

/// Occurrence of `note_name` attached to a container image.
pub fn test_occurrence(project_id: &str, note_name: &str) -> Occurrence {
    Occurrence {
        resource_url: "gcr.io/foo/bar".to_string(),
        kind: NoteKind::PackageVulnerability,
        vulnerability_details: Some(VulnerabilityDetails {
            cvss_score: 7.5,
            severity: Severity::High,
            package_issues: vec![PackageIssue {
                affected_location: "cpe:/o:debian:debian_linux:8 icu 52.1-8".to_string(),
                fixed_location: Some("cpe:/o:debian:debian_linux:8 icu 52.1-8+deb8u4".to_string()),
                severity_name: "HIGH".to_string(),
            }],
        }),
        remediation: "upgrade icu".to_string(),
        ..Occurrence::new(project_id, OCCURRENCE_ID, note_name)
    }
}

pub fn test_operation(project_id: &str) -> Operation {
    Operation {
        metadata: Some(serde_json::json!({ "scanner": "a", "attempt": 1 })),
        ..Operation::new(project_id, OPERATION_ID)
    }
}

/// Follows page tokens with `page_size` until the listing is exhausted.
pub fn collect_pages<T>(
    page_size: u32,
    mut fetch: impl FnMut(&ListRequest) -> StoreResult<Page<T>>,
) -> Vec<T> {
    let mut request = ListRequest::first_page(page_size);
    let mut items = Vec::new();
    for _ in 0..1_000 {
        let page = fetch(&request).unwrap();
        assert!(page.items.len() <= page_size as usize);
        let next = request.next_page(&page);
        let is_last = page.is_last();
        items.extend(page.items);
        if is_last {
            return items;
        }
        request = next;
    }
    panic!("pagination did not terminate");
}

pub fn names<T: catalog_core::Resource>(items: &[T]) -> Vec<String> {
    items.iter().map(|item| item.name().to_string()).collect()
}
