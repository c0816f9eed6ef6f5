#![no_main]

//! Fuzz target for organization-id extraction.
//!
//! Notification bodies arrive unauthenticated from the network, so the
//! extractor must handle arbitrary bytes without panicking: invalid
//! UTF-8, truncated tags, nested or duplicated elements.

use blackhole_api::extract_org_id;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Some(org_id) = extract_org_id(data) {
        // Whatever comes back is trimmed element content, never markup.
        assert!(!org_id.is_empty());
        assert!(!org_id.contains('<'));
        assert_eq!(org_id, org_id.trim());
    }
});
