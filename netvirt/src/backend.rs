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

//! # Virtualization
//!
//! The virtual network is handed to a [`VirtualizationBackend`], which creates the nodes, links,
//! routes and rate limits on some concrete platform. The function [`virtualize`] drives the
//! backend, in the following order:
//!
//! 1. one node per virtual element (routers are forwarding-capable),
//! 2. one link per virtual link,
//! 3. one isolated, down interface per physical interface not used by any link,
//! 4. per node, the default gateway and one route per propagated subnet,
//! 5. one rate limit per shaping rule.

use crate::diagnostics::{Diagnostics, Warning};
use crate::lp::ShapingRule;
use crate::topology::{Endpoint, Topology};
use crate::virtual_net::{Route, VirtualElementId, VirtualNetwork};
use crate::Error;

use ipnet::Ipv4Net;
use log::*;
use std::net::Ipv4Addr;
use thiserror::Error;

/// One side of a link request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEnd {
    /// Name of the node
    pub node: String,
    /// Name of the interface
    pub interface: String,
    /// Address in the form `ip/prefix`. Switch ports have none.
    pub address: Option<String>,
}

/// Platform able to instantiate a virtual network
pub trait VirtualizationBackend {
    /// Create a node. Forwarding-capable nodes must forward IP packets.
    fn add_node(&mut self, name: &str, forwarding: bool) -> Result<(), BackendError>;

    /// Create a point-to-point link between two nodes
    fn add_link(&mut self, a: &LinkEnd, b: &LinkEnd) -> Result<(), BackendError>;

    /// Create an interface that is not connected to anything, and keep it down
    fn add_interface_down(
        &mut self,
        node: &str,
        interface: &str,
        address: &str,
    ) -> Result<(), BackendError>;

    /// Set the default gateway of a node
    fn set_default_gateway(
        &mut self,
        node: &str,
        gateway: Ipv4Addr,
        interface: &str,
    ) -> Result<(), BackendError>;

    /// Install a route on a node
    fn add_route(
        &mut self,
        node: &str,
        subnet: Ipv4Net,
        next_hop: Ipv4Addr,
        interface: &str,
    ) -> Result<(), BackendError>;

    /// Limit the egress rate (Mbit/s) of an interface
    fn add_rate_limit(
        &mut self,
        node: &str,
        interface: &str,
        rate: f64,
    ) -> Result<(), BackendError>;
}

/// Errors of a virtualization backend
#[derive(Error, Debug, PartialEq)]
pub enum BackendError {
    /// The node does not exist
    #[error("Node does not exist: {0}")]
    UnknownNode(String),
    /// The node was already created
    #[error("Node was already created: {0}")]
    DuplicateNode(String),
    /// The interface does not exist on the node
    #[error("Interface {1} does not exist on node {0}")]
    UnknownInterface(String, String),
    /// The request was rejected by the platform
    #[error("Request failed: {0}")]
    Failed(String),
}

/// Instantiate the virtual network on the backend. If `shaping` is not empty, the rate limits are
/// installed as well.
pub fn virtualize(
    topo: &Topology,
    vnet: &VirtualNetwork,
    shaping: &[ShapingRule],
    backend: &mut dyn VirtualizationBackend,
    diagnostics: &mut Diagnostics,
) -> Result<(), Error> {
    info!("Virtualizing the network...");

    for e in vnet.elements() {
        backend.add_node(e.name(), e.is_router())?;
    }

    for link in vnet.links() {
        let end = |(id, pos): (VirtualElementId, usize)| -> Result<LinkEnd, Error> {
            let e = vnet.element(id)?;
            let iface = e.interface(pos)?;
            Ok(LinkEnd {
                node: e.name().to_string(),
                interface: iface.name.clone(),
                address: iface.ip_with_prefix(),
            })
        };
        backend.add_link(&end(link.a)?, &end(link.b)?)?;
    }

    for element in topo.elements() {
        for (i, iface) in element.interfaces().iter().enumerate() {
            let ep = Endpoint::new(element.id(), i);
            if vnet.uses_physical_interface(ep) {
                continue;
            }
            diagnostics.warn(Warning::UnusedInterface(
                element.name().to_string(),
                iface.name().to_string(),
            ));
            backend.add_interface_down(
                element.name(),
                &format!("{}-{}", element.name(), iface.name()),
                &iface.ip_with_prefix(),
            )?;
        }
    }

    let mut num_routes = 0;
    for e in vnet.elements() {
        if let Some(gw) = e.gateway() {
            backend.set_default_gateway(e.name(), gw.ip, &gw.interface)?;
        }

        // group the propagated routes by subnet, in order of appearance
        let mut subnets: Vec<(Ipv4Net, Vec<&Route>)> = Vec::new();
        for r in e.propagated_routes() {
            match subnets.iter_mut().find(|(s, _)| *s == r.subnet) {
                Some((_, routes)) => routes.push(r),
                None => subnets.push((r.subnet, vec![r])),
            }
        }

        for (subnet, routes) in subnets {
            let mut best: Option<(u32, &Route)> = None;
            for r in routes {
                let cost = egress_cost(topo, vnet, e.id(), r)?;
                if best.map(|(c, _)| cost < c).unwrap_or(true) {
                    best = Some((cost, r));
                }
            }
            let route = match best {
                Some((_, r)) => r,
                None => continue,
            };
            let next_hop = match vnet.element(route.to)?.interface(route.dst)?.address {
                Some((ip, _)) => ip,
                None => {
                    debug!("Route to {} on {} has no next hop address", subnet, e.name());
                    continue;
                }
            };
            let via = &e.interface(route.via)?.name;
            backend.add_route(e.name(), subnet, next_hop, via)?;
            num_routes += 1;
        }
    }

    for rule in shaping {
        backend.add_rate_limit(&rule.node, &rule.interface, rule.rate)?;
    }

    info!(
        "Virtualized {} nodes, {} links, {} routes and {} rate limits",
        vnet.elements().len(),
        vnet.links().len(),
        num_routes,
        shaping.len()
    );
    Ok(())
}

fn egress_cost(
    topo: &Topology,
    vnet: &VirtualNetwork,
    owner: VirtualElementId,
    route: &Route,
) -> Result<u32, Error> {
    let vif = vnet.element(owner)?.interface(route.via)?;
    Ok(vif.physical.and_then(|p| topo.interface(p)).map(|i| i.cost()).unwrap_or(u32::MAX))
}
