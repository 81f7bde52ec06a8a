#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use voltage_crosscheck::{
    matches, Decoder, DecodedValue, EmptyCoilPolicy, NodeValue, RegisterKind, WordOrder,
};

#[derive(Debug, Arbitrary)]
struct Input {
    kind: u8,
    count: u16,
    words: Vec<u16>,
    bits: Vec<bool>,
    word_swap: bool,
    reject_empty: bool,
    opc: f64,
}

fuzz_target!(|input: Input| {
    let kind = match input.kind % 5 {
        0 => RegisterKind::Coil,
        1 => RegisterKind::DiscreteInput,
        2 => RegisterKind::HoldingRegister,
        3 => RegisterKind::InputRegister,
        _ => RegisterKind::Other("StringRegister".to_string()),
    };
    let decoder = Decoder::new()
        .with_word_order(if input.word_swap { WordOrder::WordSwap } else { WordOrder::BigEndian })
        .with_empty_coil_policy(if input.reject_empty {
            EmptyCoilPolicy::Reject
        } else {
            EmptyCoilPolicy::ReadAsFalse
        });

    // Decoding and comparing must never panic, only return Result
    if let Ok(value) = decoder.decode(&kind, &input.words, &input.bits, input.count) {
        if let DecodedValue::AmbiguousWide(wide) = &value {
            assert_eq!(wide.as_i32 as u32, wide.as_f32.to_bits());
        }
        let _ = matches(&NodeValue::Double(input.opc), &value, &kind);
        let _ = value.to_string();
    }
});
