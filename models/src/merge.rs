//! Additive merge primitives shared by the augmentation pipeline.
//!
//! The descriptor's nested structures are all optional, and every step of the
//! pipeline appends to lists and maps that may not exist yet. These helpers
//! keep the lazy initialization in one place: lists are concatenated, and map
//! entries already present win over incoming defaults.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Container, PodSpec};

/// Appends `item` to an optional list, creating the list when absent.
pub fn push<T>(list: &mut Option<Vec<T>>, item: T) {
    list.get_or_insert_with(Vec::new).push(item)
}

/// Merges `defaults` into an optional map. Keys already present keep their
/// existing values; missing keys are filled in from the defaults.
pub fn merge_map_defaults(
    map: &mut Option<BTreeMap<String, String>>,
    defaults: BTreeMap<String, String>,
) {
    let map = map.get_or_insert_with(BTreeMap::new);
    for (key, value) in defaults {
        map.entry(key).or_insert(value);
    }
}

/// The container the configuration gets wired into, creating a default one
/// when the pod spec has none yet.
pub fn first_container(pod: &mut PodSpec) -> &mut Container {
    if pod.containers.is_empty() {
        pod.containers.push(Container::default());
    }
    &mut pod.containers[0]
}

#[cfg(test)]
mod test {
    use super::*;
    use maplit::btreemap;

    #[test]
    fn push_initializes_an_absent_list() {
        let mut list: Option<Vec<u32>> = None;
        push(&mut list, 7);
        assert_eq!(list, Some(vec![7]));
    }

    #[test]
    fn push_appends_to_an_existing_list() {
        let mut list = Some(vec![1, 2]);
        push(&mut list, 3);
        assert_eq!(list, Some(vec![1, 2, 3]));
    }

    #[test]
    fn existing_map_entries_win_over_defaults() {
        let mut map = Some(btreemap! {
            "a".to_string() => "kept".to_string(),
        });
        merge_map_defaults(
            &mut map,
            btreemap! {
                "a".to_string() => "default".to_string(),
                "b".to_string() => "added".to_string(),
            },
        );
        let map = map.unwrap();
        assert_eq!(map["a"], "kept");
        assert_eq!(map["b"], "added");
    }

    #[test]
    fn merge_initializes_an_absent_map() {
        let mut map = None;
        merge_map_defaults(
            &mut map,
            btreemap! { "a".to_string() => "added".to_string() },
        );
        assert_eq!(map.unwrap()["a"], "added");
    }

    #[test]
    fn first_container_creates_one_when_the_pod_has_none() {
        let mut pod = PodSpec::default();
        first_container(&mut pod).name = "sdm".to_string();
        assert_eq!(pod.containers.len(), 1);
        assert_eq!(pod.containers[0].name, "sdm");
    }

    #[test]
    fn first_container_reuses_the_existing_one() {
        let mut pod = PodSpec {
            containers: vec![Container {
                name: "existing".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let container = first_container(&mut pod);
        assert_eq!(container.name, "existing");
        assert_eq!(pod.containers.len(), 1);
    }
}
