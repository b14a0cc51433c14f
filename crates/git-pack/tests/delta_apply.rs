use git_pack::delta::apply::apply_delta;
use git_pack::delta::{encode_copy, encode_insert, encode_size};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Copy { start: usize, len: usize },
    Insert(Vec<u8>),
}

fn op(base_len: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..base_len, 1..=base_len).prop_map(move |(start, len)| Op::Copy {
            start,
            len: len.min(base_len - start).max(1),
        }),
        proptest::collection::vec(any::<u8>(), 1..=127).prop_map(Op::Insert),
    ]
}

fn base_and_ops() -> impl Strategy<Value = (Vec<u8>, Vec<Op>)> {
    proptest::collection::vec(any::<u8>(), 1..512).prop_flat_map(|base| {
        let ops = proptest::collection::vec(op(base.len()), 0..16);
        (Just(base), ops)
    })
}

proptest! {
    #[test]
    fn instructions_build_expected_target((base, ops) in base_and_ops()) {
        let mut expected = Vec::new();
        let mut body = Vec::new();
        for op in &ops {
            match op {
                Op::Copy { start, len } => {
                    let len = (*len).min(base.len() - start);
                    if len == 0 {
                        continue;
                    }
                    expected.extend_from_slice(&base[*start..start + len]);
                    body.extend_from_slice(&encode_copy(*start as u32, len as u32));
                }
                Op::Insert(bytes) => {
                    expected.extend_from_slice(bytes);
                    body.extend_from_slice(&encode_insert(bytes));
                }
            }
        }
        let mut delta = encode_size(base.len() as u64);
        delta.extend_from_slice(&encode_size(expected.len() as u64));
        delta.extend_from_slice(&body);

        prop_assert_eq!(apply_delta(&base, &delta).unwrap(), expected);
    }

    #[test]
    fn arbitrary_bytes_never_panic(
        base in proptest::collection::vec(any::<u8>(), 0..64),
        delta in proptest::collection::vec(any::<u8>(), 0..128),
    ) {
        let _ = apply_delta(&base, &delta);
    }
}
