//! Property tests over random edit sequences.

use packet_template::{Document, FeParameterMeta, FieldMetadata, FieldType, FieldValue, ProtocolMetadata};
use proptest::prelude::*;

const PROTOCOLS: [&str; 4] = ["Ether", "IP", "TCP", "Raw"];

fn meta(id: &str) -> ProtocolMetadata {
    ProtocolMetadata::new(
        id,
        vec![
            FieldMetadata::new("a", FieldType::Number).with_default(1),
            FieldMetadata::new("b", FieldType::String).with_default("x"),
        ],
    )
}

#[derive(Debug, Clone)]
enum StackOp {
    Push(usize),
    Pop,
}

fn arb_stack_op() -> impl Strategy<Value = StackOp> {
    prop_oneof![
        3 => (0..PROTOCOLS.len()).prop_map(StackOp::Push),
        1 => Just(StackOp::Pop),
    ]
}

fn path_of_depth(doc: &Document, depth: usize) -> Vec<String> {
    doc.protocols()[..depth].iter().map(|p| p.id().to_string()).collect()
}

proptest! {
    #[test]
    fn paths_match_stack_at_push_time(ops in prop::collection::vec(arb_stack_op(), 0..40)) {
        let mut doc = Document::new();
        let mut expected: Vec<Vec<String>> = Vec::new();
        for op in ops {
            match op {
                StackOp::Push(i) => {
                    let mut path = expected.last().cloned().unwrap_or_default();
                    path.push(PROTOCOLS[i].to_string());
                    doc.add_protocol(&meta(PROTOCOLS[i]));
                    expected.push(path);
                }
                StackOp::Pop => {
                    doc.pop();
                    expected.pop();
                }
            }
        }
        prop_assert_eq!(doc.len(), expected.len());
        for (k, path) in expected.iter().enumerate() {
            prop_assert_eq!(doc.path_of(k + 1).unwrap(), path.as_slice());
        }
    }

    #[test]
    fn revert_restores_prior_value_once(
        depth in 1usize..5,
        layer in 0usize..5,
        field in prop::sample::select(vec!["a", "b", "c"]),
        first in "[a-z0-9]{0,8}",
        second in "[a-z0-9]{0,8}",
    ) {
        let mut doc = Document::new();
        for id in PROTOCOLS.iter().cycle().take(depth) {
            doc.add_protocol(&meta(id));
        }
        let layer = layer % depth;
        let path = path_of_depth(&doc, layer + 1);
        doc.set_field_value(&path, field, first.as_str()).unwrap();
        let before = doc.protocol_by_path(&path).unwrap().field(field).and_then(|f| f.value()).cloned();

        doc.set_field_value(&path, field, second.as_str()).unwrap();
        prop_assert!(doc.revert_last_change());
        let after = doc.protocol_by_path(&path).unwrap().field(field).and_then(|f| f.value()).cloned();
        prop_assert_eq!(&after, &before);
        prop_assert_eq!(after, Some(FieldValue::from(first.as_str())));

        prop_assert!(!doc.revert_last_change());
    }

    #[test]
    fn program_is_sparse_and_parameters_non_empty(
        instrumented in prop::collection::vec(any::<bool>(), 1..6),
        values in prop::collection::vec("[a-z]{0,3}", 0..6),
    ) {
        let mut doc = Document::new();
        for (i, &with_instruction) in instrumented.iter().enumerate() {
            doc.add_protocol(&meta(PROTOCOLS[i % PROTOCOLS.len()]));
            if with_instruction {
                let path = path_of_depth(&doc, i + 1);
                doc.create_instruction(&path, "a", &[]).unwrap();
            }
        }
        let metas: Vec<FeParameterMeta> = (0..values.len())
            .map(|i| FeParameterMeta::new(format!("p{}", i), ""))
            .collect();
        doc.init_parameters(&metas);
        for (i, v) in values.iter().enumerate() {
            doc.set_parameter_value(&format!("p{}", i), v.as_str()).unwrap();
        }

        let program = doc.compile_field_engine_program().field_engine;
        prop_assert_eq!(program.instructions.len(), instrumented.iter().filter(|&&b| b).count());
        prop_assert!(program.instructions.iter().all(|p| !p.fields.is_empty()));
        for (i, v) in values.iter().enumerate() {
            let id = format!("p{}", i);
            prop_assert_eq!(program.global_parameters.get(&id).is_some(), !v.is_empty());
        }
    }

    #[test]
    fn reconstruction_has_one_entry_per_layer(
        ids in prop::collection::vec(0..PROTOCOLS.len(), 0..10),
        edits in prop::collection::vec((0usize..10, "[0-9]{1,3}"), 0..10),
    ) {
        let mut doc = Document::new();
        for &i in &ids {
            doc.add_protocol(&meta(PROTOCOLS[i]));
        }
        for (layer, value) in edits {
            if doc.is_empty() {
                break;
            }
            let path = path_of_depth(&doc, layer % doc.len() + 1);
            doc.set_field_value(&path, "a", value.as_str()).unwrap();
        }
        let out = doc.compile_reconstruction();
        let got: Vec<&str> = out.iter().map(|p| p.id.as_str()).collect();
        let want: Vec<&str> = ids.iter().map(|&i| PROTOCOLS[i]).collect();
        prop_assert_eq!(got, want);
    }
}
