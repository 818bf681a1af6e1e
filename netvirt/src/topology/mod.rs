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

//! # Physical Topology
//!
//! This module holds the declared routers, hosts and demands. Links are never declared
//! explicitly. Instead, they are inferred from the addressing: two interfaces of different
//! elements are connected if and only if they share the same network address (`ip & mask`). All
//! interfaces sharing the same network address form a [`Subnet`].
//!
//! A [`Topology`] is assembled once, using a [`TopologyBuilder`], and is immutable afterwards.
//!
//! ```rust
//! use netvirt::topology::{Interface, TopologyBuilder};
//! use netvirt::Diagnostics;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut b = TopologyBuilder::new();
//!     b.add_router("r1", vec![
//!         Interface::with_cost("eth0", "10.0.0.1".parse()?, "255.255.255.0".parse()?, 10)?,
//!         Interface::with_cost("eth1", "10.1.0.1".parse()?, "255.255.255.0".parse()?, 1)?,
//!     ])?;
//!     b.add_router("r2", vec![
//!         Interface::with_cost("eth0", "10.0.0.2".parse()?, "255.255.255.0".parse()?, 10)?,
//!     ])?;
//!     b.add_host("h1", vec![
//!         Interface::new("eth0", "10.1.0.2".parse()?, "255.255.255.0".parse()?)?,
//!     ])?;
//!
//!     let mut diagnostics = Diagnostics::new();
//!     let topo = b.build(&mut diagnostics)?;
//!
//!     assert_eq!(topo.links().len(), 2);
//!     assert_eq!(topo.subnets().len(), 2);
//!     Ok(())
//! }
//! ```

mod types;
pub use types::*;

use crate::diagnostics::{Diagnostics, Warning};

use ipnet::Ipv4Net;
use itertools::Itertools;
use log::*;
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;

/// Builder for a [`Topology`]. Elements and demands are added one by one, and all links and
/// subnets are inferred when calling [`TopologyBuilder::build`].
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    elements: Vec<NetworkElement>,
    names: HashMap<String, ElementId>,
    demands: Vec<Demand>,
}

impl TopologyBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a router. Interfaces without an explicit cost get the default cost.
    pub fn add_router(
        &mut self,
        name: impl Into<String>,
        interfaces: Vec<Interface>,
    ) -> Result<ElementId, TopologyError> {
        let interfaces = interfaces
            .into_iter()
            .map(|mut i| {
                let cost = i.cost();
                i.set_cost(cost);
                i
            })
            .collect();
        self.add_element(name.into(), ElementKind::Router, interfaces)
    }

    /// Add a host. Host interfaces carry no cost.
    pub fn add_host(
        &mut self,
        name: impl Into<String>,
        interfaces: Vec<Interface>,
    ) -> Result<ElementId, TopologyError> {
        let interfaces = interfaces
            .into_iter()
            .map(|i| Interface::new(i.name().to_string(), i.ip(), i.mask()))
            .collect::<Result<Vec<_>, _>>()?;
        self.add_element(name.into(), ElementKind::Host, interfaces)
    }

    fn add_element(
        &mut self,
        name: String,
        kind: ElementKind,
        interfaces: Vec<Interface>,
    ) -> Result<ElementId, TopologyError> {
        if self.names.contains_key(&name) {
            return Err(TopologyError::DuplicateName(name));
        }
        let id = ElementId(self.elements.len());
        self.names.insert(name.clone(), id);
        self.elements.push(NetworkElement { id, name, kind, interfaces, links: Vec::new() });
        Ok(id)
    }

    /// Add a demand between two already added elements.
    pub fn add_demand(
        &mut self,
        source: &str,
        destination: &str,
        rate: u32,
    ) -> Result<(), TopologyError> {
        let src = *self
            .names
            .get(source)
            .ok_or_else(|| TopologyError::ElementNameNotFound(source.to_string()))?;
        let dst = *self
            .names
            .get(destination)
            .ok_or_else(|| TopologyError::ElementNameNotFound(destination.to_string()))?;
        if src == dst {
            return Err(TopologyError::DemandToItself(source.to_string()));
        }
        if rate == 0 {
            return Err(TopologyError::InvalidDemandRate(
                source.to_string(),
                destination.to_string(),
            ));
        }
        self.demands.push(Demand { source: src, destination: dst, rate });
        Ok(())
    }

    /// Infer all links and subnets, and freeze the topology.
    pub fn build(mut self, diagnostics: &mut Diagnostics) -> Result<Topology, TopologyError> {
        // every interface ip must be unique
        let mut seen: HashSet<Ipv4Addr> = HashSet::new();
        for iface in self.elements.iter().flat_map(|e| e.interfaces.iter()) {
            if !seen.insert(iface.ip()) {
                return Err(TopologyError::DuplicateIp(iface.ip()));
            }
        }

        let endpoints: Vec<Endpoint> = self
            .elements
            .iter()
            .flat_map(|e| (0..e.interfaces.len()).map(move |i| Endpoint::new(e.id, i)))
            .collect();

        // infer the links
        let mut links: Vec<Link> = Vec::new();
        for (a, b) in endpoints.iter().tuple_combinations() {
            if a.element == b.element {
                continue;
            }
            let iface_a = &self.elements[a.element.0].interfaces[a.iface];
            let iface_b = &self.elements[b.element.0].interfaces[b.iface];
            if iface_a.network() != iface_b.network() {
                continue;
            }
            let both_routers =
                self.elements[a.element.0].is_router() && self.elements[b.element.0].is_router();
            if both_routers && iface_a.cost() != iface_b.cost() {
                let (cost, dropped) = (iface_a.cost(), iface_b.cost());
                diagnostics.warn(Warning::CostConflict {
                    kept: self.endpoint_name(*a),
                    replaced: self.endpoint_name(*b),
                    cost,
                    dropped,
                });
                self.elements[b.element.0].interfaces[b.iface].set_cost(cost);
            }
            let link_id = LinkId(links.len());
            links.push(Link { a: *a, b: *b });
            self.elements[a.element.0].links.push(link_id);
            self.elements[b.element.0].links.push(link_id);
            debug!("Found link {} <-> {}", self.endpoint_name(*a), self.endpoint_name(*b));
        }

        // group all interfaces into subnets
        let mut subnets: Vec<Subnet> = Vec::new();
        let mut subnet_lookup: HashMap<Ipv4Net, usize> = HashMap::new();
        for ep in endpoints.iter() {
            let element = &self.elements[ep.element.0];
            let network = element.interfaces[ep.iface].network();
            let idx = *subnet_lookup.entry(network).or_insert_with(|| {
                subnets.push(Subnet { network, routers: Vec::new(), hosts: Vec::new() });
                subnets.len() - 1
            });
            match element.kind {
                ElementKind::Router => subnets[idx].routers.push(*ep),
                ElementKind::Host => subnets[idx].hosts.push(*ep),
            }
        }

        for element in self.elements.iter().filter(|e| e.links.is_empty()) {
            diagnostics.warn(Warning::UnlinkedElement(element.name.clone()));
        }

        Ok(Topology {
            elements: self.elements,
            names: self.names,
            links,
            subnets,
            demands: self.demands,
        })
    }

    fn endpoint_name(&self, ep: Endpoint) -> String {
        let e = &self.elements[ep.element.0];
        format!("{}:{}", e.name, e.interfaces[ep.iface].name())
    }
}

/// # Physical Topology
/// Routers, hosts and demands, together with all inferred links and subnets.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    elements: Vec<NetworkElement>,
    names: HashMap<String, ElementId>,
    links: Vec<Link>,
    subnets: Vec<Subnet>,
    demands: Vec<Demand>,
}

impl Topology {
    /// All elements, in the order they were added
    pub fn elements(&self) -> &[NetworkElement] {
        &self.elements
    }

    /// Get an element by its id
    pub fn element(&self, id: ElementId) -> Result<&NetworkElement, TopologyError> {
        self.elements.get(id.0).ok_or(TopologyError::ElementNotFound(id))
    }

    /// Get the id of an element by its name
    pub fn get_element_id(&self, name: &str) -> Result<ElementId, TopologyError> {
        self.names.get(name).copied().ok_or_else(|| TopologyError::ElementNameNotFound(name.into()))
    }

    /// Get the name of an element
    pub fn get_element_name(&self, id: ElementId) -> Result<&str, TopologyError> {
        self.element(id).map(|e| e.name())
    }

    /// All routers, in the order they were added
    pub fn routers(&self) -> impl Iterator<Item = &NetworkElement> {
        self.elements.iter().filter(|e| e.is_router())
    }

    /// All hosts, in the order they were added
    pub fn hosts(&self) -> impl Iterator<Item = &NetworkElement> {
        self.elements.iter().filter(|e| e.is_host())
    }

    /// All inferred links. Each physical link is present exactly once.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Get a link by its id
    pub fn link(&self, id: LinkId) -> Result<&Link, TopologyError> {
        self.links.get(id.0).ok_or(TopologyError::LinkNotFound(id))
    }

    /// Links of an element, together with the local and the remote endpoint.
    pub fn links_of(
        &self,
        id: ElementId,
    ) -> Result<impl Iterator<Item = (Endpoint, Endpoint)> + '_, TopologyError> {
        let element = self.element(id)?;
        Ok(element.links.iter().filter_map(move |l| self.links.get(l.0).and_then(|k| k.other(id))))
    }

    /// All subnets, in the order their first interface was declared
    pub fn subnets(&self) -> &[Subnet] {
        &self.subnets
    }

    /// All demands, in the order they were added
    pub fn demands(&self) -> &[Demand] {
        &self.demands
    }

    /// All demands whose source is the given element
    pub fn demands_from(&self, id: ElementId) -> impl Iterator<Item = &Demand> {
        self.demands.iter().filter(move |d| d.source == id)
    }

    /// Get the interface behind an endpoint
    pub fn interface(&self, ep: Endpoint) -> Option<&Interface> {
        self.elements.get(ep.element.0).and_then(|e| e.interfaces.get(ep.iface))
    }

    /// Find the interface which is configured with the given ip address.
    pub fn find_interface_by_ip(&self, ip: Ipv4Addr) -> Option<Endpoint> {
        self.elements.iter().find_map(|e| {
            e.interfaces.iter().position(|i| i.ip() == ip).map(|i| Endpoint::new(e.id, i))
        })
    }

    /// Total number of links
    pub fn num_links(&self) -> usize {
        self.links.len()
    }
}
