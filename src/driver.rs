//! # Cross-Check Driver
//!
//! Runs one bounded read-compare pass over an evenly spaced sample of tags.
//!
//! The two protocol sessions are injected as [`RegisterReader`] (Modbus) and
//! [`NodeReader`] (OPC UA). For each sampled tag the OPC UA read happens
//! first, then the Modbus read; reads never overlap and are never retried.
//!
//! # Error policy
//!
//! - Decode, coercion and ordinary read failures are recorded on the
//!   [`SampleOutcome`] and counted; the loop continues with the next tag.
//! - A fatal collaborator error ([`CrossCheckError::SessionLost`]) aborts the run.
//!
//! # Example
//!
//! ```rust
//! use voltage_crosscheck::{
//!     CrossCheckConfig, CrossChecker, MirrorDevice, RegisterKind, TagDescriptor,
//! };
//!
//! # tokio_test::block_on(async {
//! let tags = vec![
//!     TagDescriptor::new("Flow", RegisterKind::HoldingRegister, 1, 2),
//!     TagDescriptor::new("Pump", RegisterKind::Coil, 1, 1),
//! ];
//! let config = CrossCheckConfig::new().with_sample_count(2);
//! let device = MirrorDevice::from_tags(&tags, &config);
//!
//! let mut checker = CrossChecker::new(device.clone(), device, config).unwrap();
//! let report = checker.run(&tags).await.unwrap();
//! assert!(report.summary.passed());
//! # });
//! ```

use std::fmt;
use std::future::Future;

use tracing::{debug, error, info, warn};

use crate::codec::{Decoder, RawRead};
use crate::compare::matches;
use crate::config::CrossCheckConfig;
use crate::error::{CrossCheckError, CrossCheckResult};
use crate::sampling::{sample_indices, sample_step};
use crate::tag::{NodeDescriptor, TagDescriptor};
use crate::translate::translate_all;
use crate::value::{DecodedValue, NodeValue};

/// Modbus read path.
///
/// Implementations read `tag.register_count` units starting at the tag's
/// zero-based wire address and return them undecoded.
pub trait RegisterReader: Send {
    /// Read the raw words or bits behind a tag.
    fn read_tag(
        &mut self,
        tag: &TagDescriptor,
    ) -> impl Future<Output = CrossCheckResult<RawRead>> + Send;
}

/// OPC UA read path.
pub trait NodeReader: Send {
    /// Read the value attribute of a node.
    fn read_node(
        &mut self,
        node: &NodeDescriptor,
    ) -> impl Future<Output = CrossCheckResult<NodeValue>> + Send;
}

/// Result of comparing one sampled tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Both reads succeeded and agree
    Match,
    /// Both reads succeeded and disagree
    Mismatch,
    /// At least one read failed; nothing was compared
    Skipped,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Match => write!(f, "✓ Values match"),
            Verdict::Mismatch => write!(f, "✗ Values differ"),
            Verdict::Skipped => write!(f, "- Not compared"),
        }
    }
}

/// Everything observed for one sampled tag.
#[derive(Debug, Clone)]
pub struct SampleOutcome {
    /// 1-based position within the sample
    pub ordinal: usize,
    /// Index into the tag population
    pub index: usize,
    /// Modbus view of the tag
    pub tag: TagDescriptor,
    /// OPC UA view of the tag
    pub node: NodeDescriptor,
    /// OPC UA reading, coerced to the node's value kind
    pub node_value: CrossCheckResult<NodeValue>,
    /// Decoded Modbus reading
    pub register_value: CrossCheckResult<DecodedValue>,
    /// Comparison result
    pub verdict: Verdict,
}

impl SampleOutcome {
    /// Whether both sides agreed.
    pub fn is_match(&self) -> bool {
        self.verdict == Verdict::Match
    }
}

impl fmt::Display for SampleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Tag {} (Index: {}) ===", self.ordinal, self.index)?;
        writeln!(f, "Name: {}", self.tag.name)?;
        writeln!(
            f,
            "Type: {}, Address: {}, Size: {}",
            self.tag.register_kind, self.tag.address, self.tag.register_count
        )?;
        match &self.node_value {
            Ok(v) => writeln!(f, "OPC UA: Value: {} (type: {})", v, v.type_name())?,
            Err(e) => writeln!(f, "OPC UA: Error: {}", e)?,
        }
        match &self.register_value {
            Ok(v) => writeln!(f, "Modbus: Value: {}", v)?,
            Err(e) => writeln!(f, "Modbus: Error: {}", e)?,
        }
        write!(f, "{}", self.verdict)
    }
}

/// Pass/fail tally for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Tags available
    pub population: usize,
    /// Samples asked for
    pub requested: usize,
    /// Samples actually taken
    pub attempted: usize,
    /// Successful OPC UA reads
    pub node_reads_ok: usize,
    /// Failed OPC UA reads (including failed coercion)
    pub node_errors: usize,
    /// Failed Modbus reads or decodes
    pub register_errors: usize,
    /// Failures on either side caused by decoding or coercion rather than
    /// by the read itself (already counted in the two error fields)
    pub decode_errors: usize,
    /// Comparisons that agreed
    pub matched: usize,
    /// Comparisons that disagreed
    pub mismatched: usize,
    /// Samples not compared because a read failed
    pub skipped: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &SampleOutcome) {
        self.attempted += 1;
        match &outcome.node_value {
            Ok(_) => self.node_reads_ok += 1,
            Err(e) => {
                self.node_errors += 1;
                self.decode_errors += usize::from(e.is_core());
            }
        }
        if let Err(e) = &outcome.register_value {
            self.register_errors += 1;
            self.decode_errors += usize::from(e.is_core());
        }
        match outcome.verdict {
            Verdict::Match => self.matched += 1,
            Verdict::Mismatch => self.mismatched += 1,
            Verdict::Skipped => self.skipped += 1,
        }
    }

    /// Failed reads on either side.
    pub fn error_count(&self) -> usize {
        self.node_errors + self.register_errors
    }

    /// At least one comparison, no disagreement, no failures.
    pub fn passed(&self) -> bool {
        self.matched > 0 && self.mismatched == 0 && self.error_count() == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Summary: {} successful OPC UA reads, {} errors out of {} attempts; \
             {} matched, {} differed, {} not compared",
            self.node_reads_ok,
            self.error_count(),
            self.attempted,
            self.matched,
            self.mismatched,
            self.skipped
        )
    }
}

/// Per-sample outcomes plus the tally.
#[derive(Debug, Clone)]
pub struct CrossCheckReport {
    /// One entry per sampled tag, in sample order
    pub outcomes: Vec<SampleOutcome>,
    /// Aggregated counts
    pub summary: RunSummary,
}

impl CrossCheckReport {
    /// Outcomes whose readings disagreed.
    pub fn mismatches(&self) -> impl Iterator<Item = &SampleOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.verdict == Verdict::Mismatch)
    }
}

/// Read-compare loop over an injected pair of protocol sessions.
pub struct CrossChecker<R, N> {
    registers: R,
    nodes: N,
    config: CrossCheckConfig,
    decoder: Decoder,
}

impl<R: RegisterReader, N: NodeReader> CrossChecker<R, N> {
    /// Create a checker; the configuration is validated up front.
    pub fn new(registers: R, nodes: N, config: CrossCheckConfig) -> CrossCheckResult<Self> {
        config.validate()?;
        let decoder = config.decoder();
        Ok(Self {
            registers,
            nodes,
            config,
            decoder,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &CrossCheckConfig {
        &self.config
    }

    /// Give the collaborators back.
    pub fn into_inner(self) -> (R, N) {
        (self.registers, self.nodes)
    }

    /// Compare an evenly spaced sample of `tags`.
    ///
    /// Returns an error only when a collaborator reports a fatal failure.
    pub async fn run(&mut self, tags: &[TagDescriptor]) -> CrossCheckResult<CrossCheckReport> {
        let nodes = translate_all(tags, self.config.namespace_index, &self.config.node_prefix);
        let indices = sample_indices(tags.len(), self.config.sample_count);

        info!(
            "Cross-checking {} of {} tags (step {})",
            indices.len(),
            tags.len(),
            sample_step(tags.len(), self.config.sample_count)
        );

        let mut summary = RunSummary {
            population: tags.len(),
            requested: self.config.sample_count,
            ..RunSummary::default()
        };
        let mut outcomes = Vec::with_capacity(indices.len());

        for (position, &index) in indices.iter().enumerate() {
            let outcome = match self
                .check(position + 1, index, &tags[index], &nodes[index])
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Aborting run at tag {}: {}", tags[index].name, e);
                    return Err(e);
                }
            };
            summary.record(&outcome);
            outcomes.push(outcome);
        }

        info!("{}", summary);
        Ok(CrossCheckReport { outcomes, summary })
    }

    /// Read both sides of one tag and compare them.
    ///
    /// Recoverable failures end up in the outcome; fatal ones are returned.
    pub async fn check(
        &mut self,
        ordinal: usize,
        index: usize,
        tag: &TagDescriptor,
        node: &NodeDescriptor,
    ) -> CrossCheckResult<SampleOutcome> {
        debug!(
            "Tag {} [{}]: {} {} x{} <-> {}",
            ordinal, index, tag.register_kind, tag.address, tag.register_count, node.node_id
        );

        let node_value = self
            .nodes
            .read_node(node)
            .await
            .and_then(|value| value.coerce(node.value_kind));
        let node_value = escalate(node_value)?;

        let register_value = if tag.register_kind.is_modelled() {
            let decoder = self.decoder;
            self.registers
                .read_tag(tag)
                .await
                .and_then(|raw| decoder.decode_read(tag, &raw))
        } else {
            Err(CrossCheckError::unsupported_kind(&tag.register_kind))
        };
        let register_value = escalate(register_value)?;

        let verdict = match (&node_value, &register_value) {
            (Ok(opc), Ok(modbus)) => {
                if matches(opc, modbus, &tag.register_kind) {
                    Verdict::Match
                } else {
                    warn!("{}: OPC UA {} vs Modbus {}", tag.name, opc, modbus);
                    Verdict::Mismatch
                }
            }
            (opc, modbus) => {
                if let Err(e) = opc {
                    warn!("{}: {}", tag.name, e);
                }
                if let Err(e) = modbus {
                    warn!("{}: {}", tag.name, e);
                }
                Verdict::Skipped
            }
        };

        Ok(SampleOutcome {
            ordinal,
            index,
            tag: tag.clone(),
            node: node.clone(),
            node_value,
            register_value,
            verdict,
        })
    }
}

/// Lift fatal errors out of a per-sample result.
fn escalate<T>(result: CrossCheckResult<T>) -> CrossCheckResult<CrossCheckResult<T>> {
    match result {
        Err(e) if e.is_fatal() => Err(e),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytes::{f32_to_regs, WordOrder};
    use crate::error::Protocol;
    use crate::tag::RegisterKind;
    use std::collections::{HashMap, VecDeque};

    /// Scripted Modbus session: replies keyed by tag name, calls recorded.
    #[derive(Default)]
    struct ScriptedModbus {
        replies: HashMap<String, VecDeque<CrossCheckResult<RawRead>>>,
        calls: Vec<String>,
    }

    impl ScriptedModbus {
        fn reply(mut self, name: &str, reply: CrossCheckResult<RawRead>) -> Self {
            self.replies.entry(name.to_string()).or_default().push_back(reply);
            self
        }
    }

    impl RegisterReader for ScriptedModbus {
        fn read_tag(
            &mut self,
            tag: &TagDescriptor,
        ) -> impl Future<Output = CrossCheckResult<RawRead>> + Send {
            self.calls.push(tag.name.clone());
            let reply = self
                .replies
                .get_mut(&tag.name)
                .and_then(|q| q.pop_front())
                .unwrap_or_else(|| Err(CrossCheckError::read(Protocol::Modbus, "no reply prepared")));
            async move { reply }
        }
    }

    /// Scripted OPC UA session.
    #[derive(Default)]
    struct ScriptedOpc {
        replies: HashMap<String, CrossCheckResult<NodeValue>>,
        calls: Vec<String>,
    }

    impl ScriptedOpc {
        fn reply(mut self, name: &str, reply: CrossCheckResult<NodeValue>) -> Self {
            self.replies.insert(name.to_string(), reply);
            self
        }
    }

    impl NodeReader for ScriptedOpc {
        fn read_node(
            &mut self,
            node: &NodeDescriptor,
        ) -> impl Future<Output = CrossCheckResult<NodeValue>> + Send {
            self.calls.push(node.node_id.clone());
            let reply = self
                .replies
                .get(&node.name)
                .cloned()
                .unwrap_or_else(|| Err(CrossCheckError::read(Protocol::OpcUa, "BadNodeIdUnknown")));
            async move { reply }
        }
    }

    fn config(samples: usize) -> CrossCheckConfig {
        CrossCheckConfig::new()
            .with_namespace_index(4)
            .with_node_prefix("P.")
            .with_sample_count(samples)
    }

    #[tokio::test]
    async fn test_all_match() {
        let tags = vec![
            TagDescriptor::new("Temp", RegisterKind::HoldingRegister, 1, 2),
            TagDescriptor::new("Pump", RegisterKind::Coil, 3, 1),
            TagDescriptor::new("Level", RegisterKind::InputRegister, 4, 1),
        ];
        let modbus = ScriptedModbus::default()
            .reply("Temp", Ok(RawRead::from_words(f32_to_regs(21.5, WordOrder::BigEndian).to_vec())))
            .reply("Pump", Ok(RawRead::from_bits(vec![true])))
            .reply("Level", Ok(RawRead::from_words(vec![0xFFF6])));
        let opc = ScriptedOpc::default()
            .reply("Temp", Ok(NodeValue::Double(21.5)))
            .reply("Pump", Ok(NodeValue::Boolean(true)))
            .reply("Level", Ok(NodeValue::Int32(-10)));

        let mut checker = CrossChecker::new(modbus, opc, config(20)).unwrap();
        let report = checker.run(&tags).await.unwrap();

        assert_eq!(report.outcomes.len(), 3);
        assert!(report.outcomes.iter().all(SampleOutcome::is_match));
        assert_eq!(report.summary.matched, 3);
        assert_eq!(report.summary.node_reads_ok, 3);
        assert!(report.summary.passed());

        let (_, opc) = checker.into_inner();
        assert_eq!(opc.calls[0], "ns=4;s=P.Temp");
    }

    #[tokio::test]
    async fn test_mismatch_is_reported() {
        let tags = vec![TagDescriptor::new("Speed", RegisterKind::HoldingRegister, 1, 1)];
        let modbus = ScriptedModbus::default().reply("Speed", Ok(RawRead::from_words(vec![1500])));
        let opc = ScriptedOpc::default().reply("Speed", Ok(NodeValue::Int16(1499)));

        let mut checker = CrossChecker::new(modbus, opc, config(1)).unwrap();
        let report = checker.run(&tags).await.unwrap();

        assert_eq!(report.summary.mismatched, 1);
        assert!(!report.summary.passed());
        assert_eq!(report.mismatches().count(), 1);
        assert_eq!(report.outcomes[0].verdict, Verdict::Mismatch);
    }

    #[tokio::test]
    async fn test_read_failures_are_counted_and_skipped() {
        let tags = vec![
            TagDescriptor::new("A", RegisterKind::HoldingRegister, 1, 1),
            TagDescriptor::new("B", RegisterKind::HoldingRegister, 2, 2),
            TagDescriptor::new("C", RegisterKind::HoldingRegister, 4, 1),
        ];
        let modbus = ScriptedModbus::default()
            .reply("A", Ok(RawRead::from_words(vec![1])))
            .reply("B", Ok(RawRead::from_words(vec![0x4270])))
            .reply("C", Ok(RawRead::from_words(vec![3])));
        let opc = ScriptedOpc::default()
            .reply("A", Err(CrossCheckError::read(Protocol::OpcUa, "timeout")))
            .reply("B", Ok(NodeValue::Float(60.0)))
            .reply("C", Ok(NodeValue::Int16(3)));

        let mut checker = CrossChecker::new(modbus, opc, config(3)).unwrap();
        let report = checker.run(&tags).await.unwrap();
        let s = report.summary;

        assert_eq!(s.attempted, 3);
        assert_eq!(s.node_errors, 1);
        assert_eq!(s.register_errors, 1);
        assert_eq!(s.skipped, 2);
        assert_eq!(s.matched, 1);
        assert_eq!(
            report.outcomes[1].register_value,
            Err(CrossCheckError::insufficient_data(2, 1))
        );
        // The OPC UA timeout is a read failure, the short pair a decode failure
        assert_eq!(s.decode_errors, 1);
    }

    #[tokio::test]
    async fn test_coercion_failure_is_a_node_error() {
        let tags = vec![TagDescriptor::new("Run", RegisterKind::Coil, 1, 1)];
        let modbus = ScriptedModbus::default().reply("Run", Ok(RawRead::from_bits(vec![true])));
        let opc = ScriptedOpc::default().reply("Run", Ok(NodeValue::Int16(1)));

        let mut checker = CrossChecker::new(modbus, opc, config(1)).unwrap();
        let report = checker.run(&tags).await.unwrap();

        assert!(matches!(
            report.outcomes[0].node_value,
            Err(CrossCheckError::NoComparableRepresentation { .. })
        ));
        assert_eq!(report.outcomes[0].verdict, Verdict::Skipped);
        assert_eq!(report.summary.node_errors, 1);
        assert_eq!(report.summary.decode_errors, 1);
    }

    #[tokio::test]
    async fn test_unsupported_kind_skips_modbus_read() {
        let tags = vec![TagDescriptor::new(
            "Label",
            RegisterKind::Other("StringRegister".into()),
            1,
            4,
        )];
        let opc = ScriptedOpc::default().reply("Label", Ok(NodeValue::Int16(0)));

        let mut checker = CrossChecker::new(ScriptedModbus::default(), opc, config(1)).unwrap();
        let report = checker.run(&tags).await.unwrap();

        assert_eq!(
            report.outcomes[0].register_value,
            Err(CrossCheckError::unsupported_kind("StringRegister"))
        );
        let (modbus, _) = checker.into_inner();
        assert!(modbus.calls.is_empty());
    }

    #[tokio::test]
    async fn test_session_loss_aborts() {
        let tags: Vec<TagDescriptor> = (1..=4)
            .map(|i| TagDescriptor::new(format!("T{}", i), RegisterKind::HoldingRegister, i, 1))
            .collect();
        let modbus = ScriptedModbus::default()
            .reply("T1", Ok(RawRead::from_words(vec![1])))
            .reply("T2", Err(CrossCheckError::session_lost(Protocol::Modbus, "connection reset")));
        let opc = ScriptedOpc::default()
            .reply("T1", Ok(NodeValue::Int16(1)))
            .reply("T2", Ok(NodeValue::Int16(2)));

        let mut checker = CrossChecker::new(modbus, opc, config(4)).unwrap();
        let err = checker.run(&tags).await.unwrap_err();

        assert!(err.is_fatal());
        let (modbus, _) = checker.into_inner();
        assert_eq!(modbus.calls, ["T1", "T2"]);
    }

    #[tokio::test]
    async fn test_sampling_is_applied() {
        let tags: Vec<TagDescriptor> = (0..47u16)
            .map(|i| TagDescriptor::new(format!("T{}", i), RegisterKind::HoldingRegister, i + 1, 1))
            .collect();
        let mut checker =
            CrossChecker::new(ScriptedModbus::default(), ScriptedOpc::default(), config(20)).unwrap();
        let report = checker.run(&tags).await.unwrap();

        let indices: Vec<usize> = report.outcomes.iter().map(|o| o.index).collect();
        assert_eq!(indices, (0..20).map(|i| i * 2).collect::<Vec<_>>());
        assert_eq!(report.summary.population, 47);
        assert_eq!(report.summary.requested, 20);
        assert_eq!(report.summary.error_count(), 40);
        assert_eq!(report.outcomes[3].ordinal, 4);
        assert_eq!(report.outcomes[3].tag.name, report.outcomes[3].node.name);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = CrossChecker::new(
            ScriptedModbus::default(),
            ScriptedOpc::default(),
            config(0),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            attempted: 3,
            node_reads_ok: 2,
            node_errors: 1,
            matched: 2,
            skipped: 1,
            ..RunSummary::default()
        };
        assert_eq!(
            summary.to_string(),
            "Summary: 2 successful OPC UA reads, 1 errors out of 3 attempts; \
             2 matched, 0 differed, 1 not compared"
        );
    }
}
