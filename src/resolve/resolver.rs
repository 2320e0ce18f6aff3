//! Scheduled batch resolution of end-to-end column-level lineage
//!
//! One run is a single sequential pass: scan processes, discover candidate
//! column pairs, and promote each resolved pair as its own unit of work.
//! A failing unit is logged and skipped; it never stops the run.

use super::consolidate::{Consolidator, UnitOutcome};
use super::path::find_terminal_column;
use super::{ResolveError, ResolvedFlow, ResolverConfig, RunReport};
use crate::model::{keys, node_label, port_type, EdgeLabel};
use crate::store::{GraphStore, GraphTx, StoreResult, Vertex};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Batch task that consolidates the working graph into the summary graph.
///
/// Stateless across invocations except through the two graphs; safe to
/// trigger repeatedly from an external scheduler, one run at a time.
pub struct LineageResolver {
    working: Arc<GraphStore>,
    summary: Arc<GraphStore>,
    config: ResolverConfig,
}

impl LineageResolver {
    pub fn new(working: Arc<GraphStore>, summary: Arc<GraphStore>) -> Self {
        Self::with_config(working, summary, ResolverConfig::default())
    }

    pub fn with_config(
        working: Arc<GraphStore>,
        summary: Arc<GraphStore>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            working,
            summary,
            config,
        }
    }

    /// One full resolution pass over the working graph.
    pub fn run(&self) -> Result<RunReport, ResolveError> {
        let processes: Vec<Vertex> = self
            .working
            .read(|tx| tx.vertices_with_label(node_label::PROCESS))?;

        let mut report = RunReport {
            processes_scanned: processes.len(),
            ..RunReport::default()
        };

        for process in &processes {
            let flows = match self
                .working
                .read(|tx| self.discover_flows(tx, process, &mut report))
            {
                Ok(flows) => flows,
                Err(e) => {
                    // Best-effort batch: scanning one process must not stop
                    // the scan of the remaining processes.
                    warn!(process = ?process.guid, error = %e, "process scan failed, skipping");
                    report.processes_failed += 1;
                    continue;
                }
            };
            report.flows_resolved += flows.len();

            for flow in flows {
                match self.consolidate_unit(&flow) {
                    Ok(UnitOutcome::Promoted) => report.units_committed += 1,
                    Ok(UnitOutcome::AlreadyRecorded) => report.units_existing += 1,
                    Err(e) => {
                        report.units_failed += 1;
                        warn!(
                            input = %flow.input_guid,
                            output = %flow.output_guid,
                            process = %flow.process_guid,
                            error = %e,
                            "consolidation unit failed, rolled back"
                        );
                    }
                }
            }
        }

        info!(
            processes = report.processes_scanned,
            scan_failed = report.processes_failed,
            resolved = report.flows_resolved,
            committed = report.units_committed,
            existing = report.units_existing,
            failed = report.units_failed,
            skipped = report.candidates_skipped,
            unresolved = report.paths_unresolved,
            "lineage resolution pass finished"
        );
        Ok(report)
    }

    /// Discard the summary graph and repopulate it from the working graph.
    pub fn rebuild(&self) -> Result<RunReport, ResolveError> {
        self.summary.update(|tx| tx.clear())?;
        info!("summary graph cleared for rebuild");
        self.run()
    }

    /// Candidate discovery and path resolution for one process, inside one
    /// working-graph read transaction.
    fn discover_flows(
        &self,
        tx: &GraphTx<'_>,
        process: &Vertex,
        report: &mut RunReport,
    ) -> Result<Vec<ResolvedFlow>, ResolveError> {
        let Some(process_guid) = process.guid.clone() else {
            return Ok(Vec::new());
        };

        let mut flows = Vec::new();
        for candidate in self.candidate_columns(tx, process)? {
            // The mapping predecessor that belongs to this process is the
            // process's input column; candidates mapped from elsewhere are
            // skipped silently.
            let Some(input) = self.input_column_for(tx, &candidate, process)? else {
                report.candidates_skipped += 1;
                debug!(
                    process = %process_guid,
                    candidate = ?candidate.guid,
                    "no mapping predecessor belongs to this process"
                );
                continue;
            };

            let Some(output) = find_terminal_column(
                tx,
                &candidate,
                Some(input.id),
                self.config.max_mapping_depth,
            )?
            else {
                report.paths_unresolved += 1;
                debug!(
                    process = %process_guid,
                    candidate = ?candidate.guid,
                    "mapping chain has no terminal column"
                );
                continue;
            };

            match (input.guid.as_deref(), output.guid.as_deref()) {
                (Some(input_guid), Some(output_guid))
                    if !input_guid.is_empty() && !output_guid.is_empty() =>
                {
                    flows.push(ResolvedFlow {
                        input_guid: input_guid.to_string(),
                        output_guid: output_guid.to_string(),
                        process_guid: process_guid.clone(),
                    });
                }
                _ => report.candidates_skipped += 1,
            }
        }
        Ok(flows)
    }

    /// The fixed-shape candidate path: process reads through an input port
    /// whose schema's attributes are lineage-mapped onward.
    fn candidate_columns(&self, tx: &GraphTx<'_>, process: &Vertex) -> StoreResult<Vec<Vertex>> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for port in tx.out_neighbors(process.id, EdgeLabel::ProcessPort)? {
            for delegated in tx.out_neighbors(port.id, EdgeLabel::PortDelegation)? {
                let kind = tx.property(delegated.id, &keys::instance(keys::PORT_TYPE))?;
                if kind.as_deref() != Some(port_type::INPUT) {
                    continue;
                }
                for schema in tx.out_neighbors(delegated.id, EdgeLabel::PortSchema)? {
                    for attribute in tx.in_neighbors(schema.id, EdgeLabel::AttributeForSchema)? {
                        for mapped in tx.out_neighbors(attribute.id, EdgeLabel::LineageMapping)? {
                            if seen.insert(mapped.id) {
                                candidates.push(mapped);
                            }
                        }
                    }
                }
            }
        }
        Ok(candidates)
    }

    /// First LineageMapping predecessor of `candidate` whose structural
    /// chain leads back to `process`. Disambiguates when several processes
    /// or ports share graph topology.
    fn input_column_for(
        &self,
        tx: &GraphTx<'_>,
        candidate: &Vertex,
        process: &Vertex,
    ) -> StoreResult<Option<Vertex>> {
        for neighbor in tx.in_neighbors(candidate.id, EdgeLabel::LineageMapping)? {
            if self.belongs_to_process(tx, &neighbor, process)? {
                return Ok(Some(neighbor));
            }
        }
        Ok(None)
    }

    /// Walk back up the structural chain: attribute -> schema type -> port
    /// -> delegating port -> process.
    fn belongs_to_process(
        &self,
        tx: &GraphTx<'_>,
        attribute: &Vertex,
        process: &Vertex,
    ) -> StoreResult<bool> {
        for schema in tx.out_neighbors(attribute.id, EdgeLabel::AttributeForSchema)? {
            for port in tx.in_neighbors(schema.id, EdgeLabel::PortSchema)? {
                for outer in tx.in_neighbors(port.id, EdgeLabel::PortDelegation)? {
                    let owners = tx.in_neighbors(outer.id, EdgeLabel::ProcessPort)?;
                    if owners.iter().any(|p| p.id == process.id) {
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }

    /// One consolidation unit: working read and summary update transactions
    /// commit or roll back together.
    fn consolidate_unit(&self, flow: &ResolvedFlow) -> Result<UnitOutcome, ResolveError> {
        let consolidator = Consolidator::new(&self.config);
        self.working.read(|wtx| {
            self.summary
                .update(|stx| consolidator.promote(wtx, stx, flow, &flow.process_guid))
        })
    }
}
