//! Edit-sequence fuzz target: interpret arbitrary bytes as document operations.
//! No operation may panic; out-of-range paths and unknown parameters must come back as errors.
//! Build with: cargo fuzz run edit_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
use packet_template::{Document, FeParameterMeta, FieldMetadata, FieldType, FieldValue, ProtocolMetadata};

#[cfg(fuzzing)]
const IDS: [&str; 4] = ["Ether", "IP", "TCP", "Raw"];
#[cfg(fuzzing)]
const FIELDS: [&str; 3] = ["a", "b", "c"];

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let mut doc = Document::new();
    doc.init_parameters(&[FeParameterMeta::new("split_by_var", ""), FeParameterMeta::new("rate", "")]);
    for chunk in data.chunks(3) {
        let (op, a, b) = match chunk {
            [op, a, b] => (*op, *a as usize, *b as usize),
            _ => break,
        };
        let path: Vec<String> = IDS.iter().cycle().take(a % 6).map(|s| s.to_string()).collect();
        let field = FIELDS[b % FIELDS.len()];
        match op % 10 {
            0 => {
                let meta = ProtocolMetadata::new(IDS[a % IDS.len()], vec![FieldMetadata::new("a", FieldType::Number).with_default(0)]);
                doc.add_protocol(&meta);
            }
            1 => {
                doc.pop();
            }
            2 => {
                let _ = doc.set_field_value(&path, field, b.to_string());
            }
            3 => {
                let _ = doc.set_field_value(&path, field, FieldValue::Bytes(vec![b as u8; a % 8]));
            }
            4 => {
                doc.revert_last_change();
            }
            5 => {
                let _ = doc.delete_field(&path, field);
            }
            6 => {
                let _ = doc.create_instruction(&path, field, &[]);
            }
            7 => {
                let _ = doc.delete_instruction(&path, field);
            }
            8 => {
                let id = if b % 2 == 0 { "split_by_var" } else { "missing" };
                let _ = doc.set_parameter_value(id, IDS[a % IDS.len()]);
            }
            _ => {
                doc.clear_dependent_parameters(IDS[a % IDS.len()]);
            }
        }
    }
    let _ = doc.compile_reconstruction();
    let _ = doc.compile_field_engine_program().to_json();
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run edit_fuzz");
}
