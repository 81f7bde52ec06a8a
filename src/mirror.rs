//! # Mirror Device
//!
//! In-process stand-in for a PLC that exposes the same process image over
//! both Modbus and OPC UA. Each point holds one value; the Modbus side
//! encodes it into words or bits according to the requesting tag, the OPC
//! UA side returns it as-is.
//!
//! Clones share state, so one clone can be handed to the checker as the
//! [`RegisterReader`] and another as the [`NodeReader`] while the test
//! keeps a third for fault injection.
//!
//! ## Fault injection
//!
//! | Method | Effect |
//! |--------|--------|
//! | [`MirrorDevice::diverge`] | OPC UA reads of one tag are offset (booleans flip) |
//! | [`MirrorDevice::fail_reads`] | reads of one tag fail on one protocol |
//! | [`MirrorDevice::truncate_replies`] | Modbus replies for one tag lose their last unit |
//! | [`MirrorDevice::drop_session`] | every later read on one protocol reports session loss |

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::bytes::{f32_to_regs, i32_to_regs, WordOrder};
use crate::codec::RawRead;
use crate::config::CrossCheckConfig;
use crate::constants::{MAX_READ_COILS, MAX_READ_REGISTERS};
use crate::driver::{NodeReader, RegisterReader};
use crate::error::{CrossCheckError, CrossCheckResult, Protocol};
use crate::tag::{NodeDescriptor, TagDescriptor};
use crate::translate::node_id;
use crate::value::NodeValue;

#[derive(Debug, Default)]
struct MirrorState {
    points: HashMap<String, NodeValue>,
    offsets: HashMap<String, f64>,
    failing: HashSet<(Protocol, String)>,
    truncated: HashSet<String>,
    lost: HashSet<Protocol>,
    modbus_reads: usize,
    opc_reads: usize,
}

/// Shared-state dual-protocol test device.
#[derive(Debug, Clone)]
pub struct MirrorDevice {
    namespace_index: u16,
    node_prefix: String,
    word_order: WordOrder,
    state: Arc<Mutex<MirrorState>>,
}

impl MirrorDevice {
    /// Empty device answering node ids built from `config`.
    pub fn new(config: &CrossCheckConfig) -> Self {
        Self {
            namespace_index: config.namespace_index,
            node_prefix: config.node_prefix.clone(),
            word_order: config.word_order,
            state: Arc::new(Mutex::new(MirrorState::default())),
        }
    }

    /// Device seeded with a deterministic value for every tag.
    ///
    /// Single coils alternate, single registers get small signed integers,
    /// register pairs alternate between a fractional REAL and a DINT
    /// counter, and unmodelled kinds get a text label.
    pub fn from_tags(tags: &[TagDescriptor], config: &CrossCheckConfig) -> Self {
        let device = Self::new(config);
        for (i, tag) in tags.iter().enumerate() {
            device.insert(&tag.name, seed_value(i, tag));
        }
        device
    }

    /// Set the value behind a tag.
    pub fn insert(&self, name: impl Into<String>, value: impl Into<NodeValue>) {
        self.lock().points.insert(name.into(), value.into());
    }

    /// Current value behind a tag.
    pub fn value(&self, name: &str) -> Option<NodeValue> {
        self.lock().points.get(name).cloned()
    }

    /// Offset the OPC UA view of a tag.
    pub fn diverge(&self, name: impl Into<String>, offset: f64) {
        self.lock().offsets.insert(name.into(), offset);
    }

    /// Make reads of a tag fail on one protocol.
    pub fn fail_reads(&self, protocol: Protocol, name: impl Into<String>) {
        self.lock().failing.insert((protocol, name.into()));
    }

    /// Shorten Modbus replies for a tag by one unit.
    pub fn truncate_replies(&self, name: impl Into<String>) {
        self.lock().truncated.insert(name.into());
    }

    /// Lose the session on one protocol.
    pub fn drop_session(&self, protocol: Protocol) {
        self.lock().lost.insert(protocol);
    }

    /// Modbus requests served so far.
    pub fn modbus_reads(&self) -> usize {
        self.lock().modbus_reads
    }

    /// OPC UA requests served so far.
    pub fn opc_reads(&self) -> usize {
        self.lock().opc_reads
    }

    fn lock(&self) -> MutexGuard<'_, MirrorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn modbus_reply(&self, tag: &TagDescriptor) -> CrossCheckResult<RawRead> {
        let mut state = self.lock();
        state.modbus_reads += 1;

        if state.lost.contains(&Protocol::Modbus) {
            return Err(CrossCheckError::session_lost(Protocol::Modbus, "connection reset by peer"));
        }
        if state.failing.contains(&(Protocol::Modbus, tag.name.clone())) {
            return Err(CrossCheckError::read(Protocol::Modbus, "exception 0x04: server device failure"));
        }
        let function_code = match (tag.wire_address(), tag.register_kind.read_function_code()) {
            (Some(_), Some(fc)) => fc,
            _ => {
                return Err(CrossCheckError::read(Protocol::Modbus, "exception 0x02: illegal data address"))
            }
        };
        let count = usize::from(tag.register_count);
        let limit = if tag.register_kind.is_bit() {
            MAX_READ_COILS
        } else {
            MAX_READ_REGISTERS
        };
        if count == 0 || count > limit {
            return Err(CrossCheckError::read(Protocol::Modbus, "exception 0x03: illegal data value"));
        }
        let value = state
            .points
            .get(&tag.name)
            .ok_or_else(|| CrossCheckError::read(Protocol::Modbus, "exception 0x02: illegal data address"))?;

        let mut raw = if tag.register_kind.is_bit() {
            RawRead::from_bits(encode_bits(value, count))
        } else {
            RawRead::from_words(encode_words(value, count, self.word_order)?)
        };

        if state.truncated.contains(&tag.name) {
            raw.words.pop();
            raw.bits.pop();
        }

        debug!(
            "Mirror FC{:02X} {} @{}: {} words, {} bits",
            function_code,
            tag.name,
            tag.address,
            raw.words.len(),
            raw.bits.len()
        );
        Ok(raw)
    }

    fn opc_reply(&self, node: &NodeDescriptor) -> CrossCheckResult<NodeValue> {
        let mut state = self.lock();
        state.opc_reads += 1;

        if state.lost.contains(&Protocol::OpcUa) {
            return Err(CrossCheckError::session_lost(Protocol::OpcUa, "BadSessionClosed"));
        }
        if state.failing.contains(&(Protocol::OpcUa, node.name.clone())) {
            return Err(CrossCheckError::read(Protocol::OpcUa, "BadCommunicationError"));
        }
        if node.node_id != node_id(self.namespace_index, &self.node_prefix, &node.name) {
            return Err(CrossCheckError::read(Protocol::OpcUa, "BadNodeIdUnknown"));
        }
        let value = state
            .points
            .get(&node.name)
            .cloned()
            .ok_or_else(|| CrossCheckError::read(Protocol::OpcUa, "BadNodeIdUnknown"))?;

        Ok(match state.offsets.get(&node.name) {
            Some(&offset) => apply_offset(value, offset),
            None => value,
        })
    }
}

impl RegisterReader for MirrorDevice {
    fn read_tag(
        &mut self,
        tag: &TagDescriptor,
    ) -> impl Future<Output = CrossCheckResult<RawRead>> + Send {
        let reply = self.modbus_reply(tag);
        async move { reply }
    }
}

impl NodeReader for MirrorDevice {
    fn read_node(
        &mut self,
        node: &NodeDescriptor,
    ) -> impl Future<Output = CrossCheckResult<NodeValue>> + Send {
        let reply = self.opc_reply(node);
        async move { reply }
    }
}

fn seed_value(index: usize, tag: &TagDescriptor) -> NodeValue {
    let n = index as i32;
    if tag.register_kind.is_bit() {
        NodeValue::Boolean(index % 2 == 0)
    } else if !tag.register_kind.is_modelled() {
        NodeValue::String(format!("label-{}", index))
    } else if tag.is_wide() {
        if index % 2 == 0 {
            NodeValue::Float(n as f32 * 1.25 + 0.5)
        } else {
            NodeValue::Int32((n % 1000) * 100)
        }
    } else {
        NodeValue::Int16((n * 7 - 50) as i16)
    }
}

fn encode_bits(value: &NodeValue, count: usize) -> Vec<bool> {
    let bit = match value {
        NodeValue::Boolean(b) => *b,
        NodeValue::String(s) => !s.is_empty(),
        other => numeric(other).is_some_and(|v| v != 0.0),
    };
    vec![bit; count]
}

fn encode_words(value: &NodeValue, count: usize, order: WordOrder) -> CrossCheckResult<Vec<u16>> {
    let mut words = match value {
        NodeValue::Float(v) if count == 2 => f32_to_regs(*v, order).to_vec(),
        NodeValue::Double(v) if count == 2 => f32_to_regs(*v as f32, order).to_vec(),
        NodeValue::Boolean(b) => vec![u16::from(*b)],
        NodeValue::String(_) => {
            return Err(CrossCheckError::read(Protocol::Modbus, "exception 0x03: illegal data value"))
        }
        other => {
            let v = numeric(other).unwrap_or_default().round() as i32;
            if count == 2 {
                i32_to_regs(v, order).to_vec()
            } else {
                vec![v as i16 as u16]
            }
        }
    };
    words.resize(count, 0);
    Ok(words)
}

fn numeric(value: &NodeValue) -> Option<f64> {
    match value {
        NodeValue::Int16(v) => Some(f64::from(*v)),
        NodeValue::Int32(v) => Some(f64::from(*v)),
        NodeValue::Int64(v) => Some(*v as f64),
        NodeValue::UInt16(v) => Some(f64::from(*v)),
        NodeValue::UInt32(v) => Some(f64::from(*v)),
        NodeValue::Float(v) => Some(f64::from(*v)),
        NodeValue::Double(v) => Some(*v),
        NodeValue::Boolean(_) | NodeValue::String(_) => None,
    }
}

fn apply_offset(value: NodeValue, offset: f64) -> NodeValue {
    match value {
        NodeValue::Boolean(b) => NodeValue::Boolean(!b),
        NodeValue::Int16(v) => NodeValue::Int16(v.wrapping_add(offset as i16)),
        NodeValue::Int32(v) => NodeValue::Int32(v.wrapping_add(offset as i32)),
        NodeValue::Int64(v) => NodeValue::Int64(v.wrapping_add(offset as i64)),
        NodeValue::UInt16(v) => NodeValue::UInt16(v.wrapping_add(offset as u16)),
        NodeValue::UInt32(v) => NodeValue::UInt32(v.wrapping_add(offset as u32)),
        NodeValue::Float(v) => NodeValue::Float(v + offset as f32),
        NodeValue::Double(v) => NodeValue::Double(v + offset),
        NodeValue::String(s) => NodeValue::String(format!("{}~", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::RegisterKind;
    use crate::translate::translate;

    fn config() -> CrossCheckConfig {
        CrossCheckConfig::new().with_node_prefix("PLC.")
    }

    #[tokio::test]
    async fn test_register_pair_encoding() {
        let config = config();
        let mut device = MirrorDevice::new(&config);
        device.insert("Flow", 60.0f32);
        device.insert("Count", 100i32);

        let flow = TagDescriptor::new("Flow", RegisterKind::HoldingRegister, 1, 2);
        let raw = device.read_tag(&flow).await.unwrap();
        assert_eq!(raw.words, vec![0x4270, 0x0000]);

        let count = TagDescriptor::new("Count", RegisterKind::HoldingRegister, 3, 2);
        let raw = device.read_tag(&count).await.unwrap();
        assert_eq!(raw.words, vec![0x0000, 0x0064]);
    }

    #[tokio::test]
    async fn test_word_swap_encoding() {
        let config = config().with_word_order(WordOrder::WordSwap);
        let mut device = MirrorDevice::new(&config);
        device.insert("Flow", 60.0f32);

        let flow = TagDescriptor::new("Flow", RegisterKind::InputRegister, 1, 2);
        let raw = device.read_tag(&flow).await.unwrap();
        assert_eq!(raw.words, vec![0x0000, 0x4270]);
    }

    #[tokio::test]
    async fn test_single_register_and_bits() {
        let config = config();
        let mut device = MirrorDevice::new(&config);
        device.insert("Level", -10i16);
        device.insert("Pump", true);

        let level = TagDescriptor::new("Level", RegisterKind::HoldingRegister, 1, 1);
        assert_eq!(device.read_tag(&level).await.unwrap().words, vec![0xFFF6]);

        let pump = TagDescriptor::new("Pump", RegisterKind::Coil, 1, 3);
        assert_eq!(device.read_tag(&pump).await.unwrap().bits, vec![true; 3]);
    }

    #[tokio::test]
    async fn test_node_id_must_match() {
        let config = config();
        let mut device = MirrorDevice::new(&config);
        device.insert("Level", 5i16);

        let tag = TagDescriptor::new("Level", RegisterKind::HoldingRegister, 1, 1);
        let node = translate(&tag, config.namespace_index, &config.node_prefix);
        assert_eq!(device.read_node(&node).await.unwrap(), NodeValue::Int16(5));

        let wrong = translate(&tag, 2, &config.node_prefix);
        let err = device.read_node(&wrong).await.unwrap_err();
        assert_eq!(err, CrossCheckError::read(Protocol::OpcUa, "BadNodeIdUnknown"));
    }

    #[tokio::test]
    async fn test_faults() {
        let config = config();
        let mut device = MirrorDevice::new(&config);
        device.insert("A", 1.5f32);
        device.insert("B", false);

        let a = TagDescriptor::new("A", RegisterKind::HoldingRegister, 1, 2);
        let b = TagDescriptor::new("B", RegisterKind::Coil, 1, 1);

        device.diverge("A", 2.0);
        device.diverge("B", 1.0);
        let node_a = translate(&a, 4, "PLC.");
        let node_b = translate(&b, 4, "PLC.");
        assert_eq!(device.read_node(&node_a).await.unwrap(), NodeValue::Float(3.5));
        assert_eq!(device.read_node(&node_b).await.unwrap(), NodeValue::Boolean(true));

        device.truncate_replies("A");
        assert_eq!(device.read_tag(&a).await.unwrap().words.len(), 1);

        device.fail_reads(Protocol::Modbus, "B");
        assert!(device.read_tag(&b).await.unwrap_err().is_recoverable());

        device.drop_session(Protocol::OpcUa);
        assert!(device.read_node(&node_a).await.unwrap_err().is_fatal());
        assert_eq!(device.opc_reads(), 3);
        assert_eq!(device.modbus_reads(), 2);
    }

    #[tokio::test]
    async fn test_address_zero_rejected() {
        let config = config();
        let mut device = MirrorDevice::new(&config);
        device.insert("Zero", 1i16);

        let tag = TagDescriptor::new("Zero", RegisterKind::HoldingRegister, 0, 1);
        assert!(device.read_tag(&tag).await.is_err());
    }

    #[tokio::test]
    async fn test_read_limits() {
        let config = config();
        let mut device = MirrorDevice::new(&config);
        device.insert("Block", 1i16);
        device.insert("Bits", true);

        let block = TagDescriptor::new("Block", RegisterKind::HoldingRegister, 1, 126);
        let err = device.read_tag(&block).await.unwrap_err();
        assert!(err.to_string().contains("illegal data value"));

        let block = TagDescriptor::new("Block", RegisterKind::HoldingRegister, 1, 125);
        assert_eq!(device.read_tag(&block).await.unwrap().words.len(), 125);

        let bits = TagDescriptor::new("Bits", RegisterKind::DiscreteInput, 1, 2000);
        assert_eq!(device.read_tag(&bits).await.unwrap().bits.len(), 2000);
    }

    #[test]
    fn test_seeded_values() {
        let tags = vec![
            TagDescriptor::new("R0", RegisterKind::HoldingRegister, 1, 2),
            TagDescriptor::new("R1", RegisterKind::HoldingRegister, 3, 2),
            TagDescriptor::new("S", RegisterKind::Other("StringRegister".into()), 5, 4),
        ];
        let device = MirrorDevice::from_tags(&tags, &config());
        assert_eq!(device.value("R0"), Some(NodeValue::Float(0.5)));
        assert_eq!(device.value("R1"), Some(NodeValue::Int32(100)));
        assert_eq!(device.value("S"), Some(NodeValue::from("label-2")));

        let shared = device.clone();
        shared.insert("R0", 7.0f32);
        assert_eq!(device.value("R0"), Some(NodeValue::Float(7.0)));
    }
}
