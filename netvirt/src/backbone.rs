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

//! # Shortest-Path Backbone
//!
//! The backbone is the shortest-path tree connecting all routers, rooted at the first declared
//! router. It is computed with a modified Dijkstra:
//!
//! - The weight of a link between two routers is the *maximum* of both interface costs.
//! - An interface of a router, which was already used to improve the distance of a neighbour,
//!   is not offered again. On a multi-access subnet, a router therefore claims at most one
//!   neighbour per interface.

use crate::topology::{ElementId, Endpoint, LinkCost, Topology};

use log::*;
use petgraph::graph::{NodeIndex, UnGraph};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Predecessor record of a router in the backbone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackboneHop {
    /// Router on the path towards the root
    pub predecessor: ElementId,
    /// Interface of this router, connecting it to the predecessor
    pub via: Endpoint,
    /// Interface of the predecessor, connecting it to this router
    pub destination: Endpoint,
    /// Weight of the link (maximum of both interface costs)
    pub cost: LinkCost,
}

/// Shortest-path tree over all routers
#[derive(Debug, Clone, Default)]
pub struct Backbone {
    root: Option<ElementId>,
    hops: HashMap<ElementId, BackboneHop>,
    distance: HashMap<ElementId, u64>,
}

impl Backbone {
    /// Compute the backbone of all routers in the topology.
    pub fn compute(topo: &Topology) -> Self {
        let root = match topo.routers().next() {
            Some(r) => r.id(),
            None => return Self::default(),
        };

        let mut distance: HashMap<ElementId, u64> = HashMap::new();
        let mut hops: HashMap<ElementId, BackboneHop> = HashMap::new();
        let mut used: HashMap<ElementId, HashSet<Endpoint>> = HashMap::new();
        let mut heap: BinaryHeap<Reverse<(u64, ElementId)>> = BinaryHeap::new();

        distance.insert(root, 0);
        heap.push(Reverse((0, root)));

        while let Some(Reverse((dist, router))) = heap.pop() {
            if distance.get(&router).map(|d| dist > *d).unwrap_or(true) {
                // stale entry
                continue;
            }
            let links = match topo.links_of(router) {
                Ok(links) => links,
                Err(_) => continue,
            };
            for (own, other) in links {
                let neighbour = match topo.element(other.element) {
                    Ok(e) if e.is_router() => e.id(),
                    _ => continue,
                };
                if used.get(&router).map(|u| u.contains(&own)).unwrap_or(false) {
                    continue;
                }
                let (own_cost, other_cost) = match (topo.interface(own), topo.interface(other)) {
                    (Some(a), Some(b)) => (a.cost(), b.cost()),
                    _ => continue,
                };
                let cost = own_cost.max(other_cost);
                let alt = dist + cost as u64;
                if distance.get(&neighbour).map(|d| alt < *d).unwrap_or(true) {
                    trace!(
                        "backbone: {:?} reached via {:?} with distance {}",
                        neighbour,
                        router,
                        alt
                    );
                    distance.insert(neighbour, alt);
                    hops.insert(
                        neighbour,
                        BackboneHop { predecessor: router, via: other, destination: own, cost },
                    );
                    heap.push(Reverse((alt, neighbour)));
                    used.entry(router).or_default().insert(own);
                }
            }
        }

        let unreachable = topo.routers().filter(|r| !distance.contains_key(&r.id())).count();
        if unreachable > 0 {
            debug!("{} routers are not connected to the backbone", unreachable);
        }

        Self { root: Some(root), hops, distance }
    }

    /// Root of the backbone, or `None` if there are no routers.
    pub fn root(&self) -> Option<ElementId> {
        self.root
    }

    /// Predecessor record of a router. Returns `None` for the root and unreachable routers.
    pub fn hop(&self, router: ElementId) -> Option<&BackboneHop> {
        self.hops.get(&router)
    }

    /// Distance from the root, or `None` if the router is not reachable.
    pub fn distance(&self, router: ElementId) -> Option<u64> {
        self.distance.get(&router).copied()
    }

    /// Number of backbone edges
    pub fn num_edges(&self) -> usize {
        self.hops.len()
    }

    /// Undirected graph of all backbone edges. Nodes are weighted with the element id, and edges
    /// with the link weight.
    pub fn graph(&self) -> UnGraph<ElementId, LinkCost> {
        let mut g: UnGraph<ElementId, LinkCost> = UnGraph::new_undirected();
        let mut nodes: HashMap<ElementId, NodeIndex> = HashMap::new();
        let mut routers: Vec<ElementId> = self.distance.keys().copied().collect();
        routers.sort();
        for r in routers {
            nodes.insert(r, g.add_node(r));
        }
        let mut hops: Vec<(&ElementId, &BackboneHop)> = self.hops.iter().collect();
        hops.sort_by_key(|(r, _)| **r);
        for (r, hop) in hops {
            if let (Some(a), Some(b)) = (nodes.get(r), nodes.get(&hop.predecessor)) {
                g.add_edge(*a, *b, hop.cost);
            }
        }
        g
    }
}
