//! # Address Translator
//!
//! Derives the OPC UA view of a tag from its Modbus descriptor.
//!
//! Node identifiers use the standard string form
//! `ns=<namespace index>;s=<prefix><tag name>`, e.g.
//! `ns=4;s=|var|NEXTO PLC.Z.O83.Temperature`.

use crate::tag::{NodeDescriptor, TagDescriptor, ValueKind};

/// Build the OPC UA node identifier for a tag name.
///
/// # Example
///
/// ```rust
/// use voltage_crosscheck::translate::node_id;
///
/// assert_eq!(node_id(4, "|var|PLC.", "Flow"), "ns=4;s=|var|PLC.Flow");
/// ```
pub fn node_id(namespace_index: u16, prefix: &str, name: &str) -> String {
    format!("ns={};s={}{}", namespace_index, prefix, name)
}

/// Translate one Modbus tag into its OPC UA descriptor.
///
/// Pure and infallible; unrecognized kind/count combinations fall back to
/// [`ValueKind::Integer16`].
pub fn translate(tag: &TagDescriptor, namespace_index: u16, prefix: &str) -> NodeDescriptor {
    NodeDescriptor {
        name: tag.name.clone(),
        node_id: node_id(namespace_index, prefix, &tag.name),
        value_kind: ValueKind::for_register(&tag.register_kind, tag.register_count),
    }
}

/// Translate a whole population.
///
/// The output has the same length and order as the input: `nodes[i]` is
/// always the translation of `tags[i]`, which the sampling loop relies on.
pub fn translate_all(tags: &[TagDescriptor], namespace_index: u16, prefix: &str) -> Vec<NodeDescriptor> {
    tags.iter()
        .map(|tag| translate(tag, namespace_index, prefix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::RegisterKind;

    #[test]
    fn test_node_id_format() {
        let tag = TagDescriptor::new("Temperature", RegisterKind::HoldingRegister, 1, 2);
        let node = translate(&tag, 4, "|var|NEXTO PLC.Z.O83.");
        assert_eq!(node.node_id, "ns=4;s=|var|NEXTO PLC.Z.O83.Temperature");
        assert_eq!(node.name, "Temperature");
        assert_eq!(node.value_kind, ValueKind::Float32);
    }

    #[test]
    fn test_empty_prefix() {
        let tag = TagDescriptor::new("Pump", RegisterKind::Coil, 5, 1);
        let node = translate(&tag, 0, "");
        assert_eq!(node.node_id, "ns=0;s=Pump");
        assert_eq!(node.value_kind, ValueKind::Boolean);
    }

    #[test]
    fn test_value_kind_selection() {
        let cases = [
            (RegisterKind::Coil, 1, ValueKind::Boolean),
            (RegisterKind::DiscreteInput, 3, ValueKind::Boolean),
            (RegisterKind::HoldingRegister, 1, ValueKind::Integer16),
            (RegisterKind::InputRegister, 1, ValueKind::Integer16),
            (RegisterKind::HoldingRegister, 2, ValueKind::Float32),
            (RegisterKind::InputRegister, 2, ValueKind::Float32),
            (RegisterKind::HoldingRegister, 10, ValueKind::Integer16),
            (RegisterKind::Other("Mystery".into()), 1, ValueKind::Integer16),
        ];
        for (kind, count, expected) in cases {
            let tag = TagDescriptor::new("T", kind.clone(), 1, count);
            assert_eq!(
                translate(&tag, 4, "").value_kind,
                expected,
                "{} x{}",
                kind,
                count
            );
        }
    }

    #[test]
    fn test_translate_all_preserves_order() {
        let tags: Vec<TagDescriptor> = (0..50u16)
            .map(|i| TagDescriptor::new(format!("Tag{}", i), RegisterKind::HoldingRegister, i + 1, 1 + i % 3))
            .collect();
        let nodes = translate_all(&tags, 2, "Plc.");

        assert_eq!(nodes.len(), tags.len());
        for (tag, node) in tags.iter().zip(&nodes) {
            assert_eq!(node.name, tag.name);
            assert_eq!(*node, translate(tag, 2, "Plc."));
        }
    }

    #[test]
    fn test_translate_all_empty() {
        assert!(translate_all(&[], 4, "x").is_empty());
    }
}
