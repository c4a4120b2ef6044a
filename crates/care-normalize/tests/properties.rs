//! Property tests for the normalization primitives.

use care_model::ContactRole;
use care_normalize::{
    extract_contact, merge_caregivers, name_key, normalize_spacing, split_caregivers,
};
use proptest::prelude::*;

fn caregiver_list() -> impl Strategy<Value = String> {
    let token = prop::sample::select(vec![
        "父亲", "母亲", "姑姑", "奶奶", "爷爷", "Aunt", "aunt", " 舅舅 ", "",
    ]);
    let delimiter = prop::sample::select(vec!["、", ",", "，", ";", "/", " | "]);
    prop::collection::vec((token, delimiter), 0..6).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(token, delimiter)| format!("{token}{delimiter}"))
            .collect()
    })
}

proptest! {
    #[test]
    fn caregiver_merge_is_idempotent(a in caregiver_list(), b in caregiver_list()) {
        let once = merge_caregivers(&a, &b);
        prop_assert_eq!(merge_caregivers(&once, &b), once);
    }

    #[test]
    fn caregiver_merge_keeps_base_order(a in caregiver_list(), b in caregiver_list()) {
        let base = split_caregivers(&a);
        let merged = split_caregivers(&merge_caregivers(&a, &b));
        prop_assert!(merged.len() >= base.len());
        prop_assert_eq!(&merged[..base.len()], &base[..]);
    }

    #[test]
    fn spacing_normalization_is_stable(text in "[a-z张三 \u{3000}\t]{0,20}") {
        let once = normalize_spacing(&text);
        prop_assert_eq!(normalize_spacing(&once), once.clone());
        prop_assert!(!once.contains("  "));
    }

    #[test]
    fn name_key_ignores_inserted_whitespace(name in "[a-zA-Z张李王]{1,6}", pad in " {0,3}") {
        let spaced: String = name.chars().map(|c| format!("{c}{pad}")).collect();
        prop_assert_eq!(name_key(&spaced), name_key(&name));
    }

    #[test]
    fn contact_extraction_finds_embedded_phone(name in "[张李王赵][伟芳娜敏静丽强磊军洋]{1,2}", tail in 0u32..1_000_000_000) {
        let phone = format!("13{tail:09}");
        let contact = extract_contact(ContactRole::Father, &format!("{name} {phone}")).unwrap();
        prop_assert_eq!(contact.phone.as_deref(), Some(phone.as_str()));
        prop_assert_eq!(contact.name, name);
    }
}
