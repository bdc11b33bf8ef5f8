#![no_main]

use gavagai_panel::{is_selection_valid, CacheKey, PanelProps};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(props) = serde_json::from_slice::<PanelProps>(data) else {
        return;
    };
    let valid = is_selection_valid(&props.filters);
    if props.filters.is_empty() {
        assert!(!valid);
    }
    let key = CacheKey::derive(&props.insights_payload);
    assert_eq!(key, CacheKey::derive(&props.insights_payload.clone()));
});
