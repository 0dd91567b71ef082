use linemunge::{Order, Pipeline};
use proptest::prelude::*;

fn lines(values: &[String]) -> Pipeline<String> {
    Pipeline::from_values(values.to_vec())
}

proptest! {
    #[test]
    fn map_identity(values in prop::collection::vec("[a-z]{0,8}", 0..20)) {
        let mapped = lines(&values).map(|line| line);
        prop_assert!(mapped.equals(lines(&values)).unwrap());
    }

    #[test]
    fn filter_idempotent(values in prop::collection::vec("[a-c]{1,4}", 0..20)) {
        let once = lines(&values).keep_if_contains("ab");
        let twice = lines(&values).keep_if_contains("ab").keep_if_contains("ab");
        prop_assert!(once.equals(twice).unwrap());
    }

    #[test]
    fn split_join_round_trip(fields in prop::collection::vec("[a-z0-9]{0,6}", 1..6)) {
        let line = format!("{}\n", fields.join("|"));
        let out = lines(&[line.clone()]).split("|").join("|").collect_vec().unwrap();
        prop_assert_eq!(out, vec![line]);
    }

    #[test]
    fn sort_orders_a_permutation(values in prop::collection::vec("[a-z]{0,6}\n", 0..30)) {
        let ascending = lines(&values)
            .sort_ascending(Order::natural())
            .unwrap()
            .collect_vec()
            .unwrap();
        prop_assert!(ascending.windows(2).all(|w| w[0] <= w[1]));

        let mut expected = values.clone();
        expected.sort();
        prop_assert_eq!(&ascending, &expected);

        let mut descending = lines(&values)
            .sort_descending(Order::natural())
            .unwrap()
            .collect_vec()
            .unwrap();
        descending.reverse();
        prop_assert_eq!(descending, ascending);
    }

    #[test]
    fn merge_of_sorted_inputs_is_sorted(
        mut a in prop::collection::vec(0i64..50, 0..15),
        mut b in prop::collection::vec(0i64..50, 0..15),
    ) {
        a.sort();
        b.sort();
        let merged = Pipeline::merge(
            vec![Pipeline::from_values(a.clone()), Pipeline::from_values(b.clone())],
            Order::natural(),
        )
        .collect_vec()
        .unwrap();

        let mut expected = [a, b].concat();
        expected.sort();
        prop_assert_eq!(merged, expected);
    }
}
