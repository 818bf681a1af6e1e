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

//! # Virtual Network
//!
//! The virtual network mirrors the physical topology as a set of virtual routers, hosts and
//! synthesized switches. Each virtual element owns its virtual interfaces, an optional default
//! [`Gateway`], and a list of [`Route`]s. The network is built once by
//! [`VirtualNetwork::build`], extended by route propagation, and is read-only afterwards.
//!
//! Elements are stored in an arena and referenced by [`VirtualElementId`]. Interfaces are
//! referenced by their position on the owning element.

mod builder;
mod propagation;

use crate::topology::{ElementId, Endpoint};

use ipnet::Ipv4Net;
use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Identification of a virtual element (and index into the arena)
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct VirtualElementId(pub usize);

impl VirtualElementId {
    /// Return the index of the element
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Kind of a virtual element, together with the physical element it represents.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum VirtualKind {
    /// Forwarding-capable element, mirroring a physical router
    Router(ElementId),
    /// End host, mirroring a physical host
    Host(ElementId),
    /// Switch, synthesized to connect a subnet with multiple hosts
    Switch,
}

/// Interface of a virtual element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualInterface {
    /// Name of the interface, unique in the whole virtual network (like `r1-eth0`)
    pub name: String,
    /// Physical interface represented by this virtual interface. Switch ports have none.
    pub physical: Option<Endpoint>,
    /// Address and prefix length configured on the interface. Switch ports have none.
    pub address: Option<(Ipv4Addr, u8)>,
}

impl VirtualInterface {
    /// Address in the form `ip/prefix`, if the interface carries an address.
    pub fn ip_with_prefix(&self) -> Option<String> {
        self.address.map(|(ip, len)| format!("{}/{}", ip, len))
    }
}

/// Default next hop for traffic not matched by any specific route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gateway {
    /// Address of the next hop
    pub ip: Ipv4Addr,
    /// Name of the local egress interface
    pub interface: String,
}

/// Route to a subnet, over a directly attached neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    /// Destination subnet
    pub subnet: Ipv4Net,
    /// Position of the egress interface on the owner of the route
    pub via: usize,
    /// Neighbour reached with this route
    pub to: VirtualElementId,
    /// Position of the ingress interface on the neighbour
    pub dst: usize,
    /// `true` if the route was discovered from a built link. Routes synthesized by propagation
    /// are not registered, and must be installed explicitly.
    pub registered: bool,
}

impl Route {
    /// Route in the opposite direction, to be stored on `to`. `owner` is the element currently
    /// holding this route.
    pub fn reverse(&self, owner: VirtualElementId) -> Self {
        Self {
            subnet: self.subnet,
            via: self.dst,
            to: owner,
            dst: self.via,
            registered: self.registered,
        }
    }
}

/// Kind of a virtual link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualLinkKind {
    /// Link of the shortest-path backbone
    Backbone,
    /// Redundant router-to-router link, not part of the backbone
    Alternative,
    /// Link between a host and a router, or between a switch and a host or router
    Access,
}

/// Point-to-point link between two virtual interfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VirtualLink {
    /// First element and interface position
    pub a: (VirtualElementId, usize),
    /// Second element and interface position
    pub b: (VirtualElementId, usize),
    /// Kind of link
    pub kind: VirtualLinkKind,
}

/// Router, host or switch of the virtual network
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualElement {
    id: VirtualElementId,
    name: String,
    kind: VirtualKind,
    interfaces: Vec<VirtualInterface>,
    gateway: Option<Gateway>,
    routes: Vec<Route>,
}

impl VirtualElement {
    fn new(id: VirtualElementId, name: String, kind: VirtualKind) -> Self {
        Self { id, name, kind, interfaces: Vec::new(), gateway: None, routes: Vec::new() }
    }

    /// ID of the element
    pub fn id(&self) -> VirtualElementId {
        self.id
    }

    /// Name of the element
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of the element
    pub fn kind(&self) -> VirtualKind {
        self.kind
    }

    /// Physical element mirrored by this element. Switches return `None`.
    pub fn physical(&self) -> Option<ElementId> {
        match self.kind {
            VirtualKind::Router(id) | VirtualKind::Host(id) => Some(id),
            VirtualKind::Switch => None,
        }
    }

    /// Returns true if the element is forwarding-capable
    pub fn is_router(&self) -> bool {
        matches!(self.kind, VirtualKind::Router(_))
    }

    /// Returns true if the element is a host
    pub fn is_host(&self) -> bool {
        matches!(self.kind, VirtualKind::Host(_))
    }

    /// Returns true if the element is a switch
    pub fn is_switch(&self) -> bool {
        self.kind == VirtualKind::Switch
    }

    /// All virtual interfaces, in creation order
    pub fn interfaces(&self) -> &[VirtualInterface] {
        &self.interfaces
    }

    /// Get a virtual interface by its position
    pub fn interface(&self, pos: usize) -> Result<&VirtualInterface, VirtualNetworkError> {
        self.interfaces
            .get(pos)
            .ok_or_else(|| VirtualNetworkError::InterfaceNotFound(self.name.clone(), pos))
    }

    /// Position of the interface with the given name
    pub fn interface_by_name(&self, name: &str) -> Option<usize> {
        self.interfaces.iter().position(|i| i.name == name)
    }

    /// Returns true if there exists an interface with the given name
    pub fn has_interface(&self, name: &str) -> bool {
        self.interface_by_name(name).is_some()
    }

    /// Default gateway
    pub fn gateway(&self) -> Option<&Gateway> {
        self.gateway.as_ref()
    }

    /// All routes, registered ones and propagated ones, in insertion order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Routes discovered from built links
    pub fn registered_routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().filter(|r| r.registered)
    }

    /// Routes synthesized by propagation
    pub fn propagated_routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().filter(|r| !r.registered)
    }

    /// Returns true if any route leads to the given subnet
    pub fn knows_subnet(&self, subnet: &Ipv4Net) -> bool {
        self.routes.iter().any(|r| &r.subnet == subnet)
    }

    fn add_interface(&mut self, iface: VirtualInterface) -> usize {
        self.interfaces.push(iface);
        self.interfaces.len() - 1
    }

    /// Adds the route, unless it is already present. Returns true if the route was added.
    fn add_route(&mut self, route: Route) -> bool {
        if self.routes.contains(&route) {
            false
        } else {
            self.routes.push(route);
            true
        }
    }
}

/// Errors caused by looking up a virtual element, interface or route that must exist. They
/// indicate an inconsistent virtual network.
#[derive(Error, Debug, PartialEq)]
pub enum VirtualNetworkError {
    /// No virtual element with the given id
    #[error("Virtual element was not found: {0:?}")]
    ElementNotFound(VirtualElementId),
    /// No virtual element with the given name
    #[error("Virtual element was not found: {0}")]
    ElementNameNotFound(String),
    /// No virtual element mirrors the physical element
    #[error("Physical element {0:?} is not part of the virtual network")]
    PhysicalElementNotFound(ElementId),
    /// The element has no interface at the given position
    #[error("Virtual element {0} has no interface at position {1}")]
    InterfaceNotFound(String, usize),
    /// The physical interface does not exist
    #[error("Physical interface {0:?} does not exist")]
    PhysicalInterfaceNotFound(Endpoint),
}

/// # Virtual Network
/// Arena of all virtual elements, together with the links between them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VirtualNetwork {
    elements: Vec<VirtualElement>,
    by_name: HashMap<String, VirtualElementId>,
    by_physical: HashMap<ElementId, VirtualElementId>,
    links: Vec<VirtualLink>,
}

impl VirtualNetwork {
    /// All virtual elements, in creation order
    pub fn elements(&self) -> &[VirtualElement] {
        &self.elements
    }

    /// Get a virtual element by its id
    pub fn element(&self, id: VirtualElementId) -> Result<&VirtualElement, VirtualNetworkError> {
        self.elements.get(id.0).ok_or(VirtualNetworkError::ElementNotFound(id))
    }

    fn element_mut(
        &mut self,
        id: VirtualElementId,
    ) -> Result<&mut VirtualElement, VirtualNetworkError> {
        self.elements.get_mut(id.0).ok_or(VirtualNetworkError::ElementNotFound(id))
    }

    /// Get the id of a virtual element by its name
    pub fn get_id(&self, name: &str) -> Result<VirtualElementId, VirtualNetworkError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| VirtualNetworkError::ElementNameNotFound(name.to_string()))
    }

    /// Get the virtual element mirroring a physical element
    pub fn get_physical(&self, id: ElementId) -> Result<VirtualElementId, VirtualNetworkError> {
        self.by_physical.get(&id).copied().ok_or(VirtualNetworkError::PhysicalElementNotFound(id))
    }

    /// All virtual links, in creation order
    pub fn links(&self) -> &[VirtualLink] {
        &self.links
    }

    /// All virtual routers
    pub fn routers(&self) -> impl Iterator<Item = &VirtualElement> {
        self.elements.iter().filter(|e| e.is_router())
    }

    /// All virtual hosts
    pub fn hosts(&self) -> impl Iterator<Item = &VirtualElement> {
        self.elements.iter().filter(|e| e.is_host())
    }

    /// All synthesized switches
    pub fn switches(&self) -> impl Iterator<Item = &VirtualElement> {
        self.elements.iter().filter(|e| e.is_switch())
    }

    /// Total number of routes stored on all elements
    pub fn num_routes(&self) -> usize {
        self.elements.iter().map(|e| e.routes.len()).sum()
    }

    /// Returns true if any link uses the given physical interface.
    pub fn uses_physical_interface(&self, ep: Endpoint) -> bool {
        self.by_physical
            .get(&ep.element)
            .and_then(|id| self.elements.get(id.0))
            .map(|e| e.interfaces.iter().any(|i| i.physical == Some(ep)))
            .unwrap_or(false)
    }

    /// Router where traffic of the given element enters the router core: the element itself if
    /// it is a router, otherwise the router owning the address of its default gateway.
    pub fn edge_router(&self, id: VirtualElementId) -> Option<VirtualElementId> {
        let element = self.elements.get(id.0)?;
        if element.is_router() {
            return Some(id);
        }
        let gw = element.gateway.as_ref()?.ip;
        self.routers()
            .find(|r| r.interfaces.iter().any(|i| i.address.map(|(ip, _)| ip) == Some(gw)))
            .map(|r| r.id)
    }

    /// Human readable name of a route, like `r1-eth0 -> r2-eth0 (10.0.0.0/24)`.
    pub fn route_name(
        &self,
        owner: VirtualElementId,
        route: &Route,
    ) -> Result<String, VirtualNetworkError> {
        let via = self.element(owner)?.interface(route.via)?;
        let dst = self.element(route.to)?.interface(route.dst)?;
        Ok(format!("{} -> {} ({})", via.name, dst.name, route.subnet))
    }

    fn add_element(&mut self, name: String, kind: VirtualKind) -> VirtualElementId {
        let id = VirtualElementId(self.elements.len());
        self.by_name.insert(name.clone(), id);
        if let VirtualKind::Router(p) | VirtualKind::Host(p) = kind {
            self.by_physical.insert(p, id);
        }
        self.elements.push(VirtualElement::new(id, name, kind));
        id
    }
}

impl fmt::Display for VirtualElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            VirtualKind::Router(_) => "router",
            VirtualKind::Host(_) => "host",
            VirtualKind::Switch => "switch",
        };
        write!(
            f,
            "{} ({}, {} interfaces, {} routes)",
            self.name,
            kind,
            self.interfaces.len(),
            self.routes.len()
        )
    }
}
