// NetVirt: Topology Virtualization and Traffic Engineering
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Interpretation of a solved traffic-engineering program.

use super::network::LpRouteId;
use super::solver::{SolverResult, SolverStatus};
use super::traffic_engineering::{Flow, TrafficEngineering, MIN_RATIO};
use crate::diagnostics::{Diagnostics, Warning};
use crate::topology::Demand;
use crate::virtual_net::{VirtualElementId, VirtualNetwork};
use crate::Error;

use log::*;
use std::collections::{HashMap, HashSet};

/// Outcome of a single demand
#[derive(Debug, Clone, PartialEq)]
pub struct FlowResult {
    /// Flow identifier
    pub flow: String,
    /// Underlying demand
    pub demand: Demand,
    /// Selected core routes, from the source router to the destination router
    pub path: Vec<LpRouteId>,
    /// Routers along the path, starting with the source router. Empty if the flow is not routed.
    pub hops: Vec<VirtualElementId>,
    /// Admitted rate (goodput)
    pub admitted: f64,
    /// Effectiveness ratio, `admitted / rate`
    pub ratio: f64,
    /// `false` if no path exists for the demand
    pub routed: bool,
}

/// Single rate limit, applied on the egress interface of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapingRule {
    /// Name of the node
    pub node: String,
    /// Name of the egress interface
    pub interface: String,
    /// Rate limit (Mbit/s)
    pub rate: f64,
}

/// # Traffic Plan
/// Path, admitted rate and effectiveness ratio of every demand.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficPlan {
    /// Outcome of the solve
    pub status: SolverStatus,
    /// Value of the objective
    pub objective: f64,
    /// Smallest ratio of all flows
    pub min_ratio: f64,
    /// Result of every demand, in declaration order
    pub flows: Vec<FlowResult>,
}

impl TrafficPlan {
    /// Interpret the solver result. An infeasible result is reported as a warning, and all
    /// demands are treated as best-effort.
    pub fn interpret(
        te: &TrafficEngineering,
        result: &SolverResult,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, Error> {
        let feasible = result.is_feasible();
        if !feasible {
            diagnostics.warn(Warning::InfeasibleOptimization);
        }

        let flows = te
            .flows()
            .iter()
            .map(|f| {
                if !f.routed {
                    return FlowResult {
                        flow: f.name.clone(),
                        demand: f.demand,
                        path: Vec::new(),
                        hops: Vec::new(),
                        admitted: 0.0,
                        ratio: 0.0,
                        routed: false,
                    };
                }
                let (path, hops) = if feasible {
                    reconstruct_path(te, f, result)
                } else {
                    (Vec::new(), Vec::new())
                };
                FlowResult {
                    flow: f.name.clone(),
                    demand: f.demand,
                    path,
                    hops,
                    admitted: result.value(&f.admitted_var()).unwrap_or(0.0),
                    ratio: result.value(&f.ratio_var()).unwrap_or(0.0),
                    routed: true,
                }
            })
            .collect();

        Ok(Self {
            status: result.status,
            objective: result.objective,
            min_ratio: result.value(MIN_RATIO).unwrap_or(0.0),
            flows,
        })
    }

    /// Returns true if the plan can be applied
    pub fn is_feasible(&self) -> bool {
        self.status != SolverStatus::Infeasible
    }

    /// Rate limits for every routed flow: the admitted rate on the egress interface of every
    /// selected route. Flows leaving through the same interface share one rule, limited to the
    /// sum of their admitted rates. Rules are ordered by their first use. An infeasible plan
    /// yields no rules.
    pub fn shaping_rules(
        &self,
        te: &TrafficEngineering,
        vnet: &VirtualNetwork,
    ) -> Result<Vec<ShapingRule>, Error> {
        if !self.is_feasible() {
            return Ok(Vec::new());
        }
        let mut rules: Vec<ShapingRule> = Vec::new();
        let mut lookup: HashMap<(VirtualElementId, usize), usize> = HashMap::new();
        for flow in self.flows.iter().filter(|f| f.routed && f.admitted > 0.0) {
            for id in flow.path.iter() {
                let route = te.network().route(*id);
                let key = (route.src(), route.route().via);
                if let Some(pos) = lookup.get(&key) {
                    rules[*pos].rate += flow.admitted;
                    continue;
                }
                let node = vnet.element(route.src())?;
                let iface = node.interface(route.route().via)?;
                lookup.insert(key, rules.len());
                rules.push(ShapingRule {
                    node: node.name().to_string(),
                    interface: iface.name.clone(),
                    rate: flow.admitted,
                });
            }
        }
        debug!("{} shaping rules", rules.len());
        Ok(rules)
    }
}

/// Walk from the source router over all selected routes.
fn reconstruct_path(
    te: &TrafficEngineering,
    flow: &Flow,
    result: &SolverResult,
) -> (Vec<LpRouteId>, Vec<VirtualElementId>) {
    let (start, end) = match (flow.src_router, flow.dst_router) {
        (Some(s), Some(e)) => (s, e),
        _ => return (Vec::new(), Vec::new()),
    };
    let max_len = te.network().core_routes().count();
    let mut path = Vec::new();
    let mut hops = vec![start];
    let mut used: HashSet<LpRouteId> = HashSet::new();
    let mut at = start;
    while at != end && path.len() < max_len {
        let next = te.network().outgoing(at).find(|r| {
            r.is_core()
                && !used.contains(&r.id())
                && result.value(&flow.select_var(r)).unwrap_or(0.0) >= 0.5
        });
        match next {
            Some(r) => {
                used.insert(r.id());
                path.push(r.id());
                hops.push(r.dst());
                at = r.dst();
            }
            None => {
                warn!("Path of flow {} ends before reaching its destination", flow.name);
                break;
            }
        }
    }
    (path, hops)
}
