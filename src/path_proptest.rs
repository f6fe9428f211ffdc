//! Property-based tests for project path ordering and common root inference.
//!
//! These tests use proptest to generate random paths and verify that the
//! ordering is a total order and that inference finds the shared directory.

#[cfg(test)]
mod proptest_tests {
    use crate::config::FilesetKind;
    use crate::path::ProjectPath;
    use crate::reconcile::infer_common_root;
    use proptest::prelude::*;
    use std::cmp::Ordering;

    fn segment() -> impl Strategy<Value = String> {
        "[a-z*][a-z0-9_]{0,5}(\\.[a-z]{1,2}){0,2}"
    }

    fn project_path() -> impl Strategy<Value = ProjectPath> {
        prop::collection::vec(segment(), 1..5)
            .prop_map(|segments| ProjectPath::from_segments(segments.iter().map(String::as_str)))
    }

    // ============================================================================
    // ProjectPath ordering property tests
    // ============================================================================

    proptest! {
        /// Property: comparing in both directions gives opposite results
        #[test]
        fn ordering_is_antisymmetric(a in project_path(), b in project_path()) {
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        }

        /// Property: a <= b and b <= c implies a <= c
        #[test]
        fn ordering_is_transitive(
            a in project_path(),
            b in project_path(),
            c in project_path(),
        ) {
            let mut sorted = [a, b, c];
            sorted.sort();
            prop_assert!(sorted[0] <= sorted[1]);
            prop_assert!(sorted[1] <= sorted[2]);
            prop_assert!(sorted[0] <= sorted[2]);
        }

        /// Property: two paths compare equal exactly when they are equal
        #[test]
        fn ordering_is_consistent_with_eq(a in project_path(), b in project_path()) {
            prop_assert_eq!(a.cmp(&b) == Ordering::Equal, a == b);
        }

        /// Property: sorting does not depend on the input order
        #[test]
        fn sorting_is_permutation_independent(
            (paths, shuffled) in prop::collection::vec(project_path(), 0..12)
                .prop_flat_map(|paths| (Just(paths.clone()), Just(paths).prop_shuffle()))
        ) {
            let mut expected = paths;
            let mut actual = shuffled;
            expected.sort();
            actual.sort();
            prop_assert_eq!(expected, actual);
        }

        /// Property: files of a directory sort before anything in its subdirectories
        #[test]
        fn files_sort_before_subdirectories(
            dir in segment(),
            file in segment(),
            sub in segment(),
            nested in segment(),
        ) {
            let shallow = ProjectPath::from_segments([dir.as_str(), file.as_str()]);
            let deep = ProjectPath::from_segments([dir.as_str(), sub.as_str(), nested.as_str()]);
            prop_assert_eq!(shallow.cmp(&deep), Ordering::Less);
        }
    }

    // ============================================================================
    // infer_common_root property tests
    // ============================================================================

    proptest! {
        /// Property: the inferred root is the prefix shared before the paths diverge
        #[test]
        fn common_root_is_shared_prefix(
            prefix in prop::collection::vec(segment(), 1..4),
            children in prop::collection::btree_set(segment(), 2..5),
            leaf in segment(),
        ) {
            let paths: Vec<ProjectPath> = children
                .iter()
                .map(|child| {
                    ProjectPath::from_segments(
                        prefix
                            .iter()
                            .chain(std::iter::once(child))
                            .chain(std::iter::once(&leaf))
                            .map(String::as_str),
                    )
                })
                .collect();

            let expected = ProjectPath::from_segments(prefix.iter().map(String::as_str));
            let root = infer_common_root(FilesetKind::Design, &paths).unwrap();
            prop_assert_eq!(&root, &expected);
            for path in &paths {
                let below = format!("{}/", root.as_str());
                prop_assert!(path.as_str().starts_with(&below));
            }
        }

        /// Property: inference does not depend on the order of the paths
        #[test]
        fn common_root_is_order_independent(
            (paths, shuffled) in prop::collection::vec(project_path(), 1..8)
                .prop_flat_map(|paths| (Just(paths.clone()), Just(paths).prop_shuffle()))
        ) {
            let forward = infer_common_root(FilesetKind::Simulation, &paths);
            let backward = infer_common_root(FilesetKind::Simulation, &shuffled);
            match (forward, backward) {
                (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
                (Err(_), Err(_)) => {}
                (a, b) => prop_assert!(false, "results differ: {:?} vs {:?}", a, b),
            }
        }

        /// Property: a single path never identifies a common root
        #[test]
        fn common_root_of_single_path_is_ambiguous(path in project_path()) {
            prop_assert!(infer_common_root(FilesetKind::Design, [&path]).is_err());
        }
    }
}
