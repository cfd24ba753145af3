use super::*;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};

/// Walks the whole forest and checks the structural invariants that must
/// hold between inserts. Returns the per-bucket `num` and `v` totals.
fn validate_tree(t: &KeyTree<StdRng>, inserted: &HashSet<String>) -> HashMap<String, (u64, i64)> {
    let config = t.config();
    let mut totals = HashMap::new();
    let mut live = 0usize;

    for (bucket, root) in t.roots() {
        assert!(root.parent().is_none(), "root must not have a parent");
        assert_eq!(bucket, format!("{}:{}", root.kind(), root.name()));

        let mut num = 0u64;
        let mut v = 0i64;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            live += 1;
            assert!(
                node.child_count() < config.merge_len,
                "fan-out {} reached merge_len {}",
                node.child_count(),
                config.merge_len
            );
            assert!(node.keys().len() <= config.keys_len);
            assert_eq!(
                node.keys().len() as u64,
                node.num().min(config.keys_len as u64),
                "sample size must track num until full"
            );
            for key in node.keys() {
                assert!(inserted.contains(key), "sampled key {key:?} was never inserted");
            }
            assert_eq!(node.kind(), root.kind(), "kind is inherited from the root");

            num += node.num();
            v += metric(node.data(), "v");
            for child in node.children() {
                assert_eq!(child.parent().map(|p| p.id()), Some(node.id()));
                assert_eq!(node.child(child.name()).map(|c| c.id()), Some(child.id()));
                stack.push(child);
            }
        }
        totals.insert(bucket.to_string(), (num, v));
    }

    assert_eq!(live, t.node_count(), "every live node is reachable from a root");
    totals
}

fn segment_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-d]",
        3 => "[0-9]{1,3}",
        1 => Just(String::new()),
    ]
}

fn key_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(segment_strategy(), 1..=5).prop_map(|segments| segments.join(":"))
}

fn insert_strategy() -> impl Strategy<Value = Vec<(String, &'static str, i64)>> {
    let kind = prop_oneof![Just("string"), Just("hash"), Just("zset")];
    prop::collection::vec((key_strategy(), kind, 0i64..1000), 0..=400)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_counts_samples_and_metrics(
        inserts in insert_strategy(),
        keys_len in 1usize..6,
        merge_len in 1usize..8,
        seed in any::<u64>(),
    ) {
        let config = TreeConfig::new(":", keys_len, merge_len);
        let mut t = KeyTree::with_rng(config, StdRng::seed_from_u64(seed))
            .expect("valid config")
            .with_fold(|data: &mut Metrics, m: &Metrics| add_metric(data, "v", metric(m, "v")));

        let segmenter = Segmenter::new(":");
        let mut inserted = HashSet::new();
        let mut expected: HashMap<String, (u64, i64)> = HashMap::new();

        for (key, kind, v) in &inserts {
            let m: Metrics = [("v".to_string(), *v)].into_iter().collect();
            t.insert(key, kind, Some(&m));
            inserted.insert(key.clone());

            let first = segmenter.split(key)[0];
            let entry = expected.entry(format!("{kind}:{first}")).or_default();
            entry.0 += 1;
            entry.1 += *v;

            prop_assert_eq!(validate_tree(&t, &inserted), expected.clone());
        }

        prop_assert_eq!(t.len(), inserts.len() as u64);
        let leaf_total: u64 = t.leaves().map(|l| l.num).sum();
        prop_assert_eq!(leaf_total, inserts.len() as u64);
        let metric_total: i64 = t.leaves().map(|l| l.metric("v")).sum();
        prop_assert_eq!(metric_total, inserts.iter().map(|(_, _, v)| *v).sum::<i64>());
    }

    #[test]
    fn prop_segments_are_a_stable_partition(segments in prop::collection::vec(segment_strategy(), 1..=8)) {
        let key = segments.join("/");
        let split = Segmenter::new("/").split(&key);

        let names: Vec<&str> = segments.iter().map(String::as_str).filter(|s| !is_numeric(s)).collect();
        let ids: Vec<&str> = segments.iter().map(String::as_str).filter(|s| is_numeric(s)).collect();
        let expected: Vec<&str> = names.into_iter().chain(ids).collect();
        prop_assert_eq!(split.into_vec(), expected);
    }
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = ["a:1", "a:2", "a:3", "a:b:1", "a:b:2", "a", "c:1"];

    fn for_each_permutation(items: &[&'static str], f: &mut impl FnMut(&[&'static str])) {
        fn rec(
            items: &[&'static str],
            used: &mut [bool],
            out: &mut Vec<&'static str>,
            f: &mut impl FnMut(&[&'static str]),
        ) {
            if out.len() == items.len() {
                f(out);
                return;
            }
            for i in 0..items.len() {
                if used[i] {
                    continue;
                }
                used[i] = true;
                out.push(items[i]);
                rec(items, used, out, f);
                out.pop();
                used[i] = false;
            }
        }

        let mut used = vec![false; items.len()];
        let mut out = Vec::with_capacity(items.len());
        rec(items, &mut used, &mut out, f);
    }

    let inserted: HashSet<String> = keys.iter().map(|k| k.to_string()).collect();
    for_each_permutation(&keys, &mut |perm| {
        let mut t = KeyTree::with_rng(TreeConfig::new(":", 2, 3), StdRng::seed_from_u64(9))
            .expect("valid config");
        for key in perm {
            t.insert(key, "string", None);
        }

        let totals = validate_tree(&t, &inserted);
        assert_eq!(totals["string:a"].0, 6);
        assert_eq!(totals["string:c"].0, 1);
        let leaf_total: u64 = t.leaves().map(|l| l.num).sum();
        assert_eq!(leaf_total, keys.len() as u64);
    });
}
