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

//! # Traffic-Engineering Formulation
//!
//! Every demand becomes a flow `f<i>`. For each flow and each core route `x`, the program has a
//! binary selection variable `s_f<i>_x` and a continuous capacity variable `c_f<i>_x`. Each
//! flow has a ratio `r_f<i>` in `[0, 1]` and an admitted rate `a_f<i>` in `[0, rate]`. The shared
//! variable `minR` is the smallest ratio of all flows.
//!
//! The objective maximizes `minR + sum(r_f)`. The constraint families are:
//!
//! | group          | constraint                                         |
//! |----------------|----------------------------------------------------|
//! | `ratio`        | `rate * r_f - a_f = 0`                             |
//! | `maximin`      | `minR - r_f <= 0`                                  |
//! | `exclusion`    | `sum(s_in) <= 1` and `sum(s_out) <= 1` per router  |
//! | `conservation` | `sum(s_in) - sum(s_out) = b` per router            |
//! | `allocation`   | `c - cost * s <= 0` per core route                 |
//! | `capacity`     | `sum(c_in) - sum(c_out) - b * a_f = 0` per router  |
//! | `link`         | `sum(c_fwd + c_rev) <= bound` per physical link    |
//!
//! where `b` is `-1` at the source router of the flow, `+1` at its destination router, and `0`
//! elsewhere. The `bound` of a link is its cost, unless one of its ends belongs to the endpoint
//! set of a demand: its source, its destination, or a host or switch reached from them without
//! crossing a router. Then, the rate of the first such demand is used instead.

use super::network::{LpNetwork, LpRoute};
use super::task::{ConstraintGroup, LinearExpr, LpTask, Sense};
use crate::diagnostics::{Diagnostics, Warning};
use crate::topology::{Demand, Topology};
use crate::virtual_net::{VirtualElementId, VirtualNetwork};
use crate::Error;

use log::*;
use std::collections::HashSet;

/// Name of the variable holding the smallest ratio of all flows
pub const MIN_RATIO: &str = "minR";

/// Demand, as a flow through the virtual network
#[derive(Debug, Clone, PartialEq)]
pub struct Flow {
    /// Flow identifier, like `f0`
    pub name: String,
    /// Underlying demand
    pub demand: Demand,
    /// Virtual source element
    pub src: VirtualElementId,
    /// Virtual destination element
    pub dst: VirtualElementId,
    /// Router where the flow enters the router core
    pub src_router: Option<VirtualElementId>,
    /// Router where the flow leaves the router core
    pub dst_router: Option<VirtualElementId>,
    /// `false` if no path connects both routers. Such flows are not part of the program.
    pub routed: bool,
}

impl Flow {
    /// Name of the ratio variable
    pub fn ratio_var(&self) -> String {
        format!("r_{}", self.name)
    }

    /// Name of the admitted-rate variable
    pub fn admitted_var(&self) -> String {
        format!("a_{}", self.name)
    }

    /// Name of the selection variable of a core route
    pub fn select_var(&self, route: &LpRoute) -> String {
        format!("s_{}_{}", self.name, route.var())
    }

    /// Name of the capacity variable of a core route
    pub fn capacity_var(&self, route: &LpRoute) -> String {
        format!("c_{}_{}", self.name, route.var())
    }

    /// Balance of the flow at a router: `-1` at the source, `+1` at the destination.
    fn balance(&self, router: VirtualElementId) -> f64 {
        let mut b = 0.0;
        if self.dst_router == Some(router) {
            b += 1.0;
        }
        if self.src_router == Some(router) {
            b -= 1.0;
        }
        b
    }
}

/// Traffic-engineering program of a virtual network, together with the structures needed to
/// interpret its solution.
#[derive(Debug, Clone)]
pub struct TrafficEngineering {
    network: LpNetwork,
    flows: Vec<Flow>,
    routers: Vec<(VirtualElementId, String)>,
    task: LpTask,
}

impl TrafficEngineering {
    /// Build the program for all demands of the topology. Demands without any path between
    /// their routers are reported and left out.
    pub fn new(
        topo: &Topology,
        vnet: &VirtualNetwork,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, Error> {
        let network = LpNetwork::new(topo, vnet, diagnostics)?;
        let routers = vnet.routers().map(|r| (r.id(), r.name().to_string())).collect();

        let mut flows = Vec::new();
        for (i, demand) in topo.demands().iter().enumerate() {
            let src = vnet.get_physical(demand.source)?;
            let dst = vnet.get_physical(demand.destination)?;
            let src_router = vnet.edge_router(src);
            let dst_router = vnet.edge_router(dst);
            let routed = match (src_router, dst_router) {
                (Some(a), Some(b)) if a == b => true,
                (Some(a), Some(b)) => network.bfs_core(a)?.any(|(e, _)| e == b),
                _ => false,
            };
            if !routed {
                diagnostics.warn(Warning::NoRouteFound(
                    vnet.element(src)?.name().to_string(),
                    vnet.element(dst)?.name().to_string(),
                ));
            }
            flows.push(Flow {
                name: format!("f{}", i),
                demand: *demand,
                src,
                dst,
                src_router,
                dst_router,
                routed,
            });
        }

        let mut te = Self { network, flows, routers, task: LpTask::new() };
        te.task = te.formulate()?;
        info!(
            "Traffic engineering program: {} flows, {} variables, {} constraints",
            te.flows.iter().filter(|f| f.routed).count(),
            te.task.num_variables(),
            te.task.num_constraints()
        );
        Ok(te)
    }

    /// The linear program
    pub fn task(&self) -> &LpTask {
        &self.task
    }

    /// All flows, in the order of the demands
    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    /// The LP network
    pub fn network(&self) -> &LpNetwork {
        &self.network
    }

    fn formulate(&self) -> Result<LpTask, Error> {
        let mut task = LpTask::new();
        let flows: Vec<&Flow> = self.flows.iter().filter(|f| f.routed).collect();
        let core: Vec<&LpRoute> = self.network.core_routes().collect();

        // variables
        task.add_variable(MIN_RATIO, 0.0, 1.0)?;
        for f in flows.iter() {
            task.add_variable(f.ratio_var(), 0.0, 1.0)?;
            task.add_variable(f.admitted_var(), 0.0, f.demand.rate as f64)?;
            for r in core.iter() {
                // a link without capacity can never be selected
                let upper = if r.cost() > 0.0 { 1.0 } else { 0.0 };
                task.add_binary(f.select_var(r), 0.0, upper)?;
                task.add_variable(f.capacity_var(r), 0.0, f64::INFINITY)?;
            }
        }

        // objective
        let objective = std::iter::once((1.0, MIN_RATIO.to_string()))
            .chain(flows.iter().map(|f| (1.0, f.ratio_var())))
            .collect();
        task.set_objective("obj", objective, true)?;

        let mut ratio = ConstraintGroup::new("ratio").with_comment("rate * r_f - a_f = 0");
        let mut maximin = ConstraintGroup::new("maximin").with_comment("minR - r_f <= 0");
        let mut exclusion = ConstraintGroup::new("exclusion")
            .with_comment("at most one inbound and one outbound route per router");
        let mut conservation = ConstraintGroup::new("conservation")
            .with_comment("sum(s_in) - sum(s_out) = -1 at source, +1 at destination, 0 elsewhere");
        let mut allocation =
            ConstraintGroup::new("allocation").with_comment("c - cost * s <= 0");
        let mut capacity = ConstraintGroup::new("capacity").with_comment(
            "sum(c_in) - sum(c_out) = -a_f at source, +a_f at destination, 0 elsewhere",
        );
        let mut link = ConstraintGroup::new("link").with_comment("shared capacity of every link");

        for f in flows.iter() {
            let rate = f.demand.rate as f64;
            ratio.add(
                format!("ratio_{}", f.name),
                LinearExpr::new().term(rate, f.ratio_var()).term(-1.0, f.admitted_var()),
                Sense::Eq,
                0.0,
            );
            maximin.add(
                format!("maximin_{}", f.name),
                LinearExpr::new().term(1.0, MIN_RATIO).term(-1.0, f.ratio_var()),
                Sense::Le,
                0.0,
            );

            for (router, name) in self.routers.iter() {
                let inbound: Vec<&&LpRoute> = core.iter().filter(|r| r.dst() == *router).collect();
                let outbound: Vec<&&LpRoute> = core.iter().filter(|r| r.src() == *router).collect();
                let b = f.balance(*router);
                if inbound.is_empty() && outbound.is_empty() && b == 0.0 {
                    continue;
                }

                let s_in: LinearExpr = inbound.iter().map(|r| (1.0, f.select_var(r))).collect();
                let s_out: LinearExpr = outbound.iter().map(|r| (1.0, f.select_var(r))).collect();
                if !s_in.is_empty() {
                    exclusion.add(format!("excl_in_{}_{}", f.name, name), s_in, Sense::Le, 1.0);
                }
                if !s_out.is_empty() {
                    exclusion.add(format!("excl_out_{}_{}", f.name, name), s_out, Sense::Le, 1.0);
                }

                let balance: LinearExpr = inbound
                    .iter()
                    .map(|r| (1.0, f.select_var(r)))
                    .chain(outbound.iter().map(|r| (-1.0, f.select_var(r))))
                    .collect();
                conservation.add(format!("flow_{}_{}", f.name, name), balance, Sense::Eq, b);

                let mut cap: LinearExpr = inbound
                    .iter()
                    .map(|r| (1.0, f.capacity_var(r)))
                    .chain(outbound.iter().map(|r| (-1.0, f.capacity_var(r))))
                    .collect();
                if b != 0.0 {
                    cap.add_term(-b, f.admitted_var());
                }
                capacity.add(format!("cap_{}_{}", f.name, name), cap, Sense::Eq, 0.0);
            }

            for r in core.iter() {
                allocation.add(
                    format!("alloc_{}_{}", f.name, r.var()),
                    LinearExpr::new().term(1.0, f.capacity_var(r)).term(-r.cost(), f.select_var(r)),
                    Sense::Le,
                    0.0,
                );
            }
        }

        if !flows.is_empty() {
            let endpoint_sets: Vec<(f64, HashSet<VirtualElementId>)> = self
                .flows
                .iter()
                .map(|f| (f.demand.rate as f64, self.endpoint_set(f)))
                .collect();
            for r in core.iter() {
                let reverse = self.network.reverse(r.id());
                if reverse.map(|rev| rev < r.id()).unwrap_or(false) {
                    // already covered by the reverse direction
                    continue;
                }
                let mut expr = LinearExpr::new();
                for f in flows.iter() {
                    expr.add_term(1.0, f.capacity_var(r));
                    if let Some(rev) = reverse {
                        expr.add_term(1.0, f.capacity_var(self.network.route(rev)));
                    }
                }
                let bound = Self::link_bound(r, &endpoint_sets);
                link.add(format!("link_{}", r.var()), expr, Sense::Le, bound);
            }
        }

        for group in vec![ratio, maximin, exclusion, conservation, allocation, capacity, link] {
            if !group.is_empty() {
                task.add_group(group)?;
            }
        }
        Ok(task)
    }

    /// Shared bound of the physical link of a core route. The endpoint set of a demand holds its
    /// source and destination, and every host or switch reached from them without crossing a
    /// router.
    fn link_bound(route: &LpRoute, endpoint_sets: &[(f64, HashSet<VirtualElementId>)]) -> f64 {
        endpoint_sets
            .iter()
            .find(|(_, set)| set.contains(&route.src()) || set.contains(&route.dst()))
            .map(|(rate, _)| *rate)
            .unwrap_or_else(|| route.cost())
    }

    /// Source and destination of a flow, and all hosts and switches reachable from them without
    /// crossing a router. Routers are only part of the set if they are an endpoint themselves.
    fn endpoint_set(&self, flow: &Flow) -> HashSet<VirtualElementId> {
        let mut set: HashSet<VirtualElementId> = HashSet::new();
        let mut stack: Vec<VirtualElementId> = Vec::new();
        for e in [flow.src, flow.dst].iter() {
            if set.insert(*e) && !self.network.is_router(*e) {
                stack.push(*e);
            }
        }
        while let Some(e) = stack.pop() {
            for n in self.network.neighbors(e) {
                if !self.network.is_router(n) && set.insert(n) {
                    stack.push(n);
                }
            }
        }
        set
    }
}
