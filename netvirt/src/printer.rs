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

//! # Helper (printer) functions
//! Module containing helper functions to get formatted strings of the topology, the virtual
//! network and the traffic plan.

use crate::lp::{FlowResult, ShapingRule};
use crate::topology::{Topology, TopologyError};
use crate::virtual_net::{VirtualElementId, VirtualNetwork, VirtualNetworkError};

use petgraph::dot::Dot;
use petgraph::graph::{NodeIndex, UnGraph};

/// Render the physical topology in GraphViz format. Nodes are labelled with the element name, and
/// edges with the addresses of both interfaces.
pub fn topology_dot(topo: &Topology) -> String {
    let mut g: UnGraph<String, String> = UnGraph::new_undirected();
    let nodes: Vec<NodeIndex> = topo
        .elements()
        .iter()
        .map(|e| {
            let label =
                if e.is_router() { e.name().to_string() } else { format!("[{}]", e.name()) };
            g.add_node(label)
        })
        .collect();
    for link in topo.links() {
        let label = match (topo.interface(link.a), topo.interface(link.b)) {
            (Some(a), Some(b)) => format!("{} <-> {}", a.ip(), b.ip()),
            _ => String::new(),
        };
        g.add_edge(nodes[link.a.element.index()], nodes[link.b.element.index()], label);
    }
    format!("{}", Dot::new(&g))
}

/// Get a vector of strings, which represent the routing table of a virtual element. Each line
/// represents one route. Routes discovered from links are prefixed with a `*`, propagated routes
/// with a space.
pub fn route_table(
    vnet: &VirtualNetwork,
    id: VirtualElementId,
) -> Result<Vec<String>, VirtualNetworkError> {
    let element = vnet.element(id)?;
    let mut result = Vec::new();
    if let Some(gw) = element.gateway() {
        result.push(format!("  default via {} dev {}", gw.ip, gw.interface));
    }
    for route in element.routes() {
        let to = vnet.element(route.to)?.name();
        result.push(format!(
            "{} {} to {}",
            if route.registered { "*" } else { " " },
            vnet.route_name(id, route)?,
            to
        ));
    }
    Ok(result)
}

/// Formatted string describing the outcome of a demand
pub fn flow_result(
    topo: &Topology,
    vnet: &VirtualNetwork,
    flow: &FlowResult,
) -> Result<String, TopologyError> {
    let src = topo.get_element_name(flow.demand.source)?;
    let dst = topo.get_element_name(flow.demand.destination)?;
    if !flow.routed {
        return Ok(format!("{} -> {}: no route ({} Mbit/s requested)", src, dst, flow.demand.rate));
    }
    let path = flow
        .hops
        .iter()
        .map(|h| vnet.element(*h).map(|e| e.name()).unwrap_or("?"))
        .collect::<Vec<_>>()
        .join(" -> ");
    Ok(format!(
        "{} -> {}: goodput {:.2} / {} Mbit/s (ratio {:.3}), path: {}",
        src, dst, flow.admitted, flow.demand.rate, flow.ratio, path
    ))
}

/// Formatted string of a rate limit
pub fn shaping_rule(rule: &ShapingRule) -> String {
    format!("{}:{} limited to {:.2} Mbit/s", rule.node, rule.interface, rule.rate)
}
