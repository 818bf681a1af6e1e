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

//! Module containing all type definitions of the physical topology

use ipnet::Ipv4Net;
use std::fmt;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Cost of a router interface. The cost of a physical link is the cost of its interfaces.
pub type LinkCost = u32;

/// Default cost of a router interface, if none is given.
pub const DEFAULT_COST: LinkCost = 1;

/// Network element identification (and index into the topology)
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct ElementId(pub usize);

impl ElementId {
    /// Return the index of the element
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Link identification (and index into the topology)
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct LinkId(pub usize);

/// Reference to a single interface of a network element.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct Endpoint {
    /// Element owning the interface
    pub element: ElementId,
    /// Position of the interface on the element
    pub iface: usize,
}

impl Endpoint {
    /// Create a new endpoint
    pub fn new(element: ElementId, iface: usize) -> Self {
        Self { element, iface }
    }
}

/// Kind of a network element. Routers forward traffic, hosts don't.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum ElementKind {
    /// Forwarding-capable element, whose interfaces carry a routing cost
    Router,
    /// End host
    Host,
}

/// Interface of a network element
#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    name: String,
    ip: Ipv4Addr,
    mask: Ipv4Addr,
    net: Ipv4Net,
    cost: Option<LinkCost>,
}

impl Interface {
    /// Create a host interface. Returns an error if the mask is not a valid netmask.
    pub fn new(
        name: impl Into<String>,
        ip: Ipv4Addr,
        mask: Ipv4Addr,
    ) -> Result<Self, TopologyError> {
        let name = name.into();
        let net = Ipv4Net::with_netmask(ip, mask)
            .map_err(|_| TopologyError::InvalidMask(name.clone(), mask))?;
        Ok(Self { name, ip, mask, net, cost: None })
    }

    /// Create a router interface with the given routing cost.
    pub fn with_cost(
        name: impl Into<String>,
        ip: Ipv4Addr,
        mask: Ipv4Addr,
        cost: LinkCost,
    ) -> Result<Self, TopologyError> {
        let mut iface = Self::new(name, ip, mask)?;
        iface.cost = Some(cost);
        Ok(iface)
    }

    /// Name of the interface (like `eth0`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// IP address of the interface
    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    /// Netmask of the interface
    pub fn mask(&self) -> Ipv4Addr {
        self.mask
    }

    /// Prefix length derived from the netmask
    pub fn prefix_len(&self) -> u8 {
        self.net.prefix_len()
    }

    /// Address in the form `ip/prefix`, as used when configuring the interface.
    pub fn ip_with_prefix(&self) -> String {
        format!("{}/{}", self.ip, self.prefix_len())
    }

    /// Network the interface belongs to (`ip & mask`)
    pub fn network(&self) -> Ipv4Net {
        self.net.trunc()
    }

    /// Routing cost of the interface. Host interfaces have no cost, and report the default.
    pub fn cost(&self) -> LinkCost {
        self.cost.unwrap_or(DEFAULT_COST)
    }

    pub(crate) fn set_cost(&mut self, cost: LinkCost) {
        self.cost = Some(cost);
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cost {
            Some(c) => write!(f, "{} ({}, cost {})", self.name, self.ip_with_prefix(), c),
            None => write!(f, "{} ({})", self.name, self.ip_with_prefix()),
        }
    }
}

/// Router or host of the physical topology
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkElement {
    pub(crate) id: ElementId,
    pub(crate) name: String,
    pub(crate) kind: ElementKind,
    pub(crate) interfaces: Vec<Interface>,
    pub(crate) links: Vec<LinkId>,
}

impl NetworkElement {
    /// ID of the element
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Name of the element
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of the element
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Returns true if the element is a router
    pub fn is_router(&self) -> bool {
        self.kind == ElementKind::Router
    }

    /// Returns true if the element is a host
    pub fn is_host(&self) -> bool {
        self.kind == ElementKind::Host
    }

    /// All interfaces, in the order they were declared
    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    /// Get a single interface by its position
    pub fn interface(&self, iface: usize) -> Option<&Interface> {
        self.interfaces.get(iface)
    }

    /// Links attached to this element
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }
}

/// Undirected link between two interfaces sharing the same network address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    /// First endpoint (the one declared first)
    pub a: Endpoint,
    /// Second endpoint
    pub b: Endpoint,
}

impl Link {
    /// Return the opposite endpoint of a link, seen from `element`. If `element` is not part of
    /// the link, `None` is returned.
    pub fn other(&self, element: ElementId) -> Option<(Endpoint, Endpoint)> {
        if self.a.element == element {
            Some((self.a, self.b))
        } else if self.b.element == element {
            Some((self.b, self.a))
        } else {
            None
        }
    }
}

/// Set of all interfaces sharing one network address
#[derive(Debug, Clone, PartialEq)]
pub struct Subnet {
    pub(crate) network: Ipv4Net,
    pub(crate) routers: Vec<Endpoint>,
    pub(crate) hosts: Vec<Endpoint>,
}

impl Subnet {
    /// Network address with prefix length
    pub fn network(&self) -> Ipv4Net {
        self.network
    }

    /// Router interfaces in this subnet
    pub fn routers(&self) -> &[Endpoint] {
        &self.routers
    }

    /// Host interfaces in this subnet
    pub fn hosts(&self) -> &[Endpoint] {
        &self.hosts
    }
}

/// Requested transmission rate between two network elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Demand {
    /// Source of the traffic
    pub source: ElementId,
    /// Destination of the traffic
    pub destination: ElementId,
    /// Requested rate (Mbit/s), always strictly positive
    pub rate: u32,
}

/// Errors raised while assembling a topology. They correspond to malformed input data.
#[derive(Error, Debug, PartialEq)]
pub enum TopologyError {
    /// Two elements share the same name
    #[error("Network element name is used twice: {0}")]
    DuplicateName(String),
    /// Two interfaces share the same IP address
    #[error("IP address {0} is assigned to more than one interface")]
    DuplicateIp(Ipv4Addr),
    /// The mask of an interface is not a valid netmask
    #[error("Invalid netmask {1} on interface {0}")]
    InvalidMask(String, Ipv4Addr),
    /// An element name is not known
    #[error("Network element was not found in topology: {0}")]
    ElementNameNotFound(String),
    /// An element ID is not known
    #[error("Network element was not found in topology: {0:?}")]
    ElementNotFound(ElementId),
    /// A link ID is not known
    #[error("Link was not found in topology: {0:?}")]
    LinkNotFound(LinkId),
    /// A demand must have a strictly positive rate
    #[error("Demand {0} -> {1} has an invalid rate")]
    InvalidDemandRate(String, String),
    /// A demand must connect two different elements
    #[error("Demand source and destination must be different: {0}")]
    DemandToItself(String),
}
