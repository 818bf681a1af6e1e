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

//! # LP Network
//!
//! Graph of all LP routes. Every registered route of the virtual network is an LP route, stored
//! together with its mirror in the opposite direction. Each LP route carries a unique variable
//! name and a cost:
//!
//! - Routes between two routers (core routes) cost the routing cost of the destination
//!   interface.
//! - Routes leaving any other element cost the rate of the strictest demand sourced at that
//!   element, or are unbounded if there is no such demand.

use super::LpError;
use crate::diagnostics::{Diagnostics, Warning};
use crate::topology::Topology;
use crate::virtual_net::{Route, VirtualElementId, VirtualNetwork};
use crate::Error;

use log::*;
use petgraph::graphmap::DiGraphMap;
use std::collections::{HashMap, HashSet, VecDeque};

/// Identification of an LP route (and index into the LP network)
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct LpRouteId(pub usize);

/// Route of the virtual network, seen as a placeholder for decision variables.
#[derive(Debug, Clone, PartialEq)]
pub struct LpRoute {
    id: LpRouteId,
    src: VirtualElementId,
    route: Route,
    var: String,
    cost: f64,
    core: bool,
}

impl LpRoute {
    /// ID of the LP route
    pub fn id(&self) -> LpRouteId {
        self.id
    }

    /// Element owning the route
    pub fn src(&self) -> VirtualElementId {
        self.src
    }

    /// Element reached by the route
    pub fn dst(&self) -> VirtualElementId {
        self.route.to
    }

    /// Underlying route
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Unique variable name, like `x_r1_r2_eth0`
    pub fn var(&self) -> &str {
        &self.var
    }

    /// Cost of the route (may be infinite)
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Returns true if the route connects two routers
    pub fn is_core(&self) -> bool {
        self.core
    }
}

/// Graph of LP routes
#[derive(Debug, Clone)]
pub struct LpNetwork {
    routes: Vec<LpRoute>,
    by_var: HashMap<String, LpRouteId>,
    by_route: HashMap<(VirtualElementId, Route), LpRouteId>,
    graph: DiGraphMap<VirtualElementId, Vec<LpRouteId>>,
    names: HashMap<VirtualElementId, String>,
    routers: HashSet<VirtualElementId>,
}

impl LpNetwork {
    /// Build the LP network from all registered routes of the virtual network.
    pub fn new(
        topo: &Topology,
        vnet: &VirtualNetwork,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, Error> {
        let mut net = Self {
            routes: Vec::new(),
            by_var: HashMap::new(),
            by_route: HashMap::new(),
            graph: DiGraphMap::new(),
            names: vnet.elements().iter().map(|e| (e.id(), e.name().to_string())).collect(),
            routers: vnet.routers().map(|r| r.id()).collect(),
        };
        for e in vnet.elements() {
            net.graph.add_node(e.id());
        }

        let mut warned: HashSet<VirtualElementId> = HashSet::new();
        for element in vnet.elements() {
            for route in element.registered_routes() {
                let mirror = route.reverse(element.id());
                for (src, r) in [(element.id(), *route), (route.to, mirror)].iter() {
                    if !net.by_route.contains_key(&(*src, *r)) {
                        net.add_route(topo, vnet, *src, *r, &mut warned, diagnostics)?;
                    }
                }
            }
        }

        debug!(
            "LP network has {} routes ({} core routes)",
            net.routes.len(),
            net.routes.iter().filter(|r| r.core).count()
        );
        Ok(net)
    }

    fn add_route(
        &mut self,
        topo: &Topology,
        vnet: &VirtualNetwork,
        src: VirtualElementId,
        route: Route,
        warned: &mut HashSet<VirtualElementId>,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), Error> {
        let src_elem = vnet.element(src)?;
        let dst_elem = vnet.element(route.to)?;
        let dst_vif = dst_elem.interface(route.dst)?;
        let dst_iface_name = match dst_vif.physical.and_then(|p| topo.interface(p)) {
            Some(iface) => iface.name().to_string(),
            None => dst_vif.name.clone(),
        };
        let var = format!("x_{}_{}_{}", src_elem.name(), dst_elem.name(), dst_iface_name);
        let core = src_elem.is_router() && dst_elem.is_router();

        let cost = if core {
            dst_vif.physical.and_then(|p| topo.interface(p)).map(|i| i.cost() as f64).unwrap_or(0.0)
        } else {
            let rates: Vec<u32> = match src_elem.physical() {
                Some(p) => topo.demands_from(p).map(|d| d.rate).collect(),
                None => Vec::new(),
            };
            if rates.len() > 1 && warned.insert(src) {
                diagnostics.warn(Warning::MultipleDemands(src_elem.name().to_string()));
            }
            rates.into_iter().min().map(|r| r as f64).unwrap_or(f64::INFINITY)
        };

        if self.by_var.contains_key(&var) {
            return Err(LpError::DuplicateVariable(var).into());
        }
        let id = LpRouteId(self.routes.len());
        trace!("LP route {}: cost = {}", var, cost);
        self.by_var.insert(var.clone(), id);
        self.by_route.insert((src, route), id);
        match self.graph.edge_weight_mut(src, route.to) {
            Some(w) => w.push(id),
            None => {
                self.graph.add_edge(src, route.to, vec![id]);
            }
        }
        self.routes.push(LpRoute { id, src, route, var, cost, core });
        Ok(())
    }

    /// All LP routes
    pub fn routes(&self) -> &[LpRoute] {
        &self.routes
    }

    /// All core routes (connecting two routers)
    pub fn core_routes(&self) -> impl Iterator<Item = &LpRoute> {
        self.routes.iter().filter(|r| r.core)
    }

    /// Get an LP route by its id
    pub fn route(&self, id: LpRouteId) -> &LpRoute {
        &self.routes[id.0]
    }

    /// Get an LP route by its variable name
    pub fn get_by_var(&self, var: &str) -> Option<&LpRoute> {
        self.by_var.get(var).map(|id| &self.routes[id.0])
    }

    /// Get the variable name of a route stored on `owner`
    pub fn get_var(&self, owner: VirtualElementId, route: &Route) -> Option<&str> {
        self.by_route.get(&(owner, *route)).map(|id| self.routes[id.0].var.as_str())
    }

    /// Returns true if the route of `owner` is part of the LP network
    pub fn has_route(&self, owner: VirtualElementId, route: &Route) -> bool {
        self.by_route.contains_key(&(owner, *route))
    }

    /// LP route in the opposite direction
    pub fn reverse(&self, id: LpRouteId) -> Option<LpRouteId> {
        let r = &self.routes[id.0];
        self.by_route.get(&(r.route.to, r.route.reverse(r.src))).copied()
    }

    /// All LP routes from `a` to `b`
    pub fn routes_between(&self, a: VirtualElementId, b: VirtualElementId) -> &[LpRouteId] {
        self.graph.edge_weight(a, b).map(|w| w.as_slice()).unwrap_or(&[])
    }

    /// Neighbours of an element, in insertion order
    pub fn neighbors(&self, id: VirtualElementId) -> impl Iterator<Item = VirtualElementId> + '_ {
        self.graph.neighbors(id)
    }

    /// LP routes leaving an element
    pub fn outgoing(&self, id: VirtualElementId) -> impl Iterator<Item = &LpRoute> + '_ {
        self.graph
            .edges(id)
            .flat_map(move |(_, _, w)| w.iter().map(move |r| &self.routes[r.0]))
    }

    /// LP routes entering an element
    pub fn incoming(&self, id: VirtualElementId) -> impl Iterator<Item = &LpRoute> + '_ {
        self.routes.iter().filter(move |r| r.route.to == id)
    }

    /// Returns true if the element is a router
    pub fn is_router(&self, id: VirtualElementId) -> bool {
        self.routers.contains(&id)
    }

    /// Name of an element
    pub fn name(&self, id: VirtualElementId) -> &str {
        self.names.get(&id).map(|s| s.as_str()).unwrap_or("?")
    }

    fn check_element(&self, id: VirtualElementId) -> Result<(), LpError> {
        if self.graph.contains_node(id) {
            Ok(())
        } else {
            Err(LpError::UnknownElement(format!("{:?}", id)))
        }
    }

    /// Breadth-first traversal over all LP routes, starting at `start`. Yields every newly
    /// reached element once, together with the LP route used to reach it.
    pub fn bfs(&self, start: VirtualElementId) -> Result<Bfs<'_>, LpError> {
        self.check_element(start)?;
        Ok(Bfs::new(self, start, false))
    }

    /// Breadth-first traversal over core routes only.
    pub fn bfs_core(&self, start: VirtualElementId) -> Result<Bfs<'_>, LpError> {
        self.check_element(start)?;
        Ok(Bfs::new(self, start, true))
    }

    /// Enumerate all simple paths from `a` to `b` (depth-first). A path never visits an element
    /// twice, and therefore never uses an LP route or its reverse twice. Returns an error if
    /// either element is unknown.
    pub fn find_paths(
        &self,
        a: VirtualElementId,
        b: VirtualElementId,
    ) -> Result<Vec<Vec<LpRouteId>>, LpError> {
        self.check_element(a)?;
        self.check_element(b)?;
        let mut paths = Vec::new();
        let mut visited: HashSet<VirtualElementId> = HashSet::new();
        let mut current: Vec<LpRouteId> = Vec::new();
        visited.insert(a);
        self.find_paths_recursive(a, b, &mut visited, &mut current, &mut paths);
        Ok(paths)
    }

    fn find_paths_recursive(
        &self,
        at: VirtualElementId,
        target: VirtualElementId,
        visited: &mut HashSet<VirtualElementId>,
        current: &mut Vec<LpRouteId>,
        paths: &mut Vec<Vec<LpRouteId>>,
    ) {
        if at == target {
            paths.push(current.clone());
            return;
        }
        for route in self.outgoing(at) {
            let next = route.dst();
            if visited.contains(&next) {
                continue;
            }
            visited.insert(next);
            current.push(route.id);
            self.find_paths_recursive(next, target, visited, current, paths);
            current.pop();
            visited.remove(&next);
        }
    }
}

/// Breadth-first iterator over the LP network
#[derive(Debug)]
pub struct Bfs<'a> {
    net: &'a LpNetwork,
    core_only: bool,
    visited: HashSet<VirtualElementId>,
    queue: VecDeque<VirtualElementId>,
    pending: VecDeque<(VirtualElementId, LpRouteId)>,
}

impl<'a> Bfs<'a> {
    fn new(net: &'a LpNetwork, start: VirtualElementId, core_only: bool) -> Self {
        let mut visited = HashSet::new();
        visited.insert(start);
        let mut queue = VecDeque::new();
        queue.push_back(start);
        Self { net, core_only, visited, queue, pending: VecDeque::new() }
    }
}

impl<'a> Iterator for Bfs<'a> {
    type Item = (VirtualElementId, LpRouteId);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(x) = self.pending.pop_front() {
                return Some(x);
            }
            let current = self.queue.pop_front()?;
            for route in self.net.outgoing(current) {
                if self.core_only && !route.core {
                    continue;
                }
                if self.visited.insert(route.dst()) {
                    self.queue.push_back(route.dst());
                    self.pending.push_back((route.dst(), route.id));
                }
            }
        }
    }
}
