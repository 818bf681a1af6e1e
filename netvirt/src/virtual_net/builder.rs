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

//! Assembly of the virtual network from the physical topology.

use super::*;
use crate::backbone::Backbone;
use crate::diagnostics::{Diagnostics, Warning};
use crate::topology::{Endpoint, Subnet, Topology};

use log::*;

impl VirtualNetwork {
    /// Build the virtual network of a topology, and propagate the routes until every router
    /// knows every reachable subnet. The backbone is computed on the way.
    pub fn build(
        topo: &Topology,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, VirtualNetworkError> {
        let backbone = Backbone::compute(topo);
        Self::build_with_backbone(topo, &backbone, diagnostics)
    }

    /// Build the virtual network of a topology, using an already computed backbone. The steps
    /// are executed in the following order, and later steps skip interfaces already claimed:
    ///
    /// 1. Create a virtual node for every router and every host.
    /// 2. Link every router to its backbone predecessor, and set its gateway.
    /// 3. Link all remaining router pairs as alternative links.
    /// 4. Attach the hosts of each subnet, either directly or via a switch.
    /// 5. Propagate the routes.
    pub fn build_with_backbone(
        topo: &Topology,
        backbone: &Backbone,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, VirtualNetworkError> {
        info!("Building the virtual network...");
        let mut net = Self::assemble(topo, backbone, diagnostics)?;
        let propagated = net.propagate_routes()?;

        info!(
            "Virtual network built: {} elements, {} links, {} routes ({} propagated)",
            net.elements.len(),
            net.links.len(),
            net.num_routes(),
            propagated
        );
        Ok(net)
    }

    /// Create all elements, links, gateways and registered routes, without propagating any
    /// route.
    pub fn assemble(
        topo: &Topology,
        backbone: &Backbone,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, VirtualNetworkError> {
        let mut net = Self::default();

        for router in topo.routers() {
            net.add_element(router.name().to_string(), VirtualKind::Router(router.id()));
        }
        for host in topo.hosts() {
            net.add_element(host.name().to_string(), VirtualKind::Host(host.id()));
        }

        net.link_backbone(topo, backbone)?;
        net.link_alternatives(topo)?;
        net.link_hosts(topo, diagnostics)?;
        Ok(net)
    }

    fn link_backbone(
        &mut self,
        topo: &Topology,
        backbone: &Backbone,
    ) -> Result<(), VirtualNetworkError> {
        debug!("Creating backbone links between routers...");
        for router in topo.routers() {
            let hop = match backbone.hop(router.id()) {
                Some(hop) => hop,
                None => continue,
            };
            let src = self.get_physical(router.id())?;
            let dst = self.get_physical(hop.predecessor)?;
            let src_vif = physical_vif(topo, hop.via)?;
            let dst_vif = physical_vif(topo, hop.destination)?;
            if self.is_claimed(src, &src_vif.name)? || self.is_claimed(dst, &dst_vif.name)? {
                debug!("\t * skipped backbone link {} <-> {}", src_vif.name, dst_vif.name);
                continue;
            }

            let src_ip = physical_ip(topo, hop.via)?;
            let dst_ip = physical_ip(topo, hop.destination)?;
            let subnet = physical_subnet(topo, hop.via)?;
            let src_gw = Gateway { ip: dst_ip, interface: src_vif.name.clone() };
            let dst_gw = Gateway { ip: src_ip, interface: dst_vif.name.clone() };

            let (via, dst_pos) =
                self.connect(src, src_vif, dst, dst_vif, VirtualLinkKind::Backbone)?;
            self.add_route_pair(src, via, dst, dst_pos, subnet)?;

            self.element_mut(src)?.gateway = Some(src_gw);
            let pred = self.element_mut(dst)?;
            if pred.gateway.is_none() {
                // fallback towards the child keeps the canonical path preferred
                pred.gateway = Some(dst_gw);
            }
        }
        Ok(())
    }

    fn link_alternatives(&mut self, topo: &Topology) -> Result<(), VirtualNetworkError> {
        debug!("Creating alternative links between routers...");
        for router in topo.routers() {
            let links = topo
                .links_of(router.id())
                .map_err(|_| VirtualNetworkError::PhysicalElementNotFound(router.id()))?;
            for (own, other) in links {
                let is_router = topo.element(other.element).map(|e| e.is_router()).unwrap_or(false);
                if !is_router {
                    continue;
                }
                let src = self.get_physical(own.element)?;
                let dst = self.get_physical(other.element)?;
                let src_vif = physical_vif(topo, own)?;
                let dst_vif = physical_vif(topo, other)?;
                if self.is_claimed(src, &src_vif.name)? || self.is_claimed(dst, &dst_vif.name)? {
                    continue;
                }
                let subnet = physical_subnet(topo, own)?;
                let (via, dst_pos) =
                    self.connect(src, src_vif, dst, dst_vif, VirtualLinkKind::Alternative)?;
                self.add_route_pair(src, via, dst, dst_pos, subnet)?;
            }
        }
        Ok(())
    }

    fn link_hosts(
        &mut self,
        topo: &Topology,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), VirtualNetworkError> {
        debug!("Creating links between hosts and routers...");
        let mut num_switches = 0;
        for subnet in topo.subnets() {
            let (num_hosts, num_routers) = (subnet.hosts().len(), subnet.routers().len());
            if num_hosts == 0 {
                continue;
            }
            if num_routers == 0 {
                let hosts = subnet
                    .hosts()
                    .iter()
                    .filter_map(|h| topo.get_element_name(h.element).ok())
                    .map(String::from)
                    .collect();
                diagnostics.warn(Warning::SubnetWithoutRouter(subnet.network(), hosts));
                if num_hosts == 1 {
                    continue;
                }
            }

            if num_hosts == 1 && num_routers == 1 {
                self.link_host_direct(topo, subnet.hosts()[0], subnet.routers()[0], subnet)?;
            } else {
                self.link_hosts_switched(topo, subnet, num_switches)?;
                num_switches += 1;
            }
        }
        Ok(())
    }

    fn link_host_direct(
        &mut self,
        topo: &Topology,
        host_ep: Endpoint,
        router_ep: Endpoint,
        subnet: &Subnet,
    ) -> Result<(), VirtualNetworkError> {
        let host = self.get_physical(host_ep.element)?;
        let router = self.get_physical(router_ep.element)?;
        let host_vif = physical_vif(topo, host_ep)?;
        let router_vif = physical_vif(topo, router_ep)?;
        if self.is_claimed(router, &router_vif.name)? {
            debug!("\t * interface {} is already claimed", router_vif.name);
            return Ok(());
        }
        let gw = Gateway { ip: physical_ip(topo, router_ep)?, interface: host_vif.name.clone() };
        let (via, dst) = self.connect(host, host_vif, router, router_vif, VirtualLinkKind::Access)?;
        self.add_route_pair(host, via, router, dst, subnet.network())?;
        self.element_mut(host)?.gateway = Some(gw);
        Ok(())
    }

    fn link_hosts_switched(
        &mut self,
        topo: &Topology,
        subnet: &Subnet,
        num: usize,
    ) -> Result<(), VirtualNetworkError> {
        let name = format!("s{}", num);
        let switch = self.add_element(name.clone(), VirtualKind::Switch);
        let mut port = 0;
        let mut next_port = || {
            let vif = VirtualInterface {
                name: format!("{}-eth{}", name, port),
                physical: None,
                address: None,
            };
            port += 1;
            vif
        };

        let mut host_vifs: Vec<(VirtualElementId, String)> = Vec::new();
        for host_ep in subnet.hosts() {
            let host = self.get_physical(host_ep.element)?;
            let host_vif = physical_vif(topo, *host_ep)?;
            host_vifs.push((host, host_vif.name.clone()));
            let (via, dst) =
                self.connect(host, host_vif, switch, next_port(), VirtualLinkKind::Access)?;
            self.add_route_pair(host, via, switch, dst, subnet.network())?;
        }

        let mut gateway: Option<Ipv4Addr> = None;
        for router_ep in subnet.routers() {
            let router = self.get_physical(router_ep.element)?;
            let router_vif = physical_vif(topo, *router_ep)?;
            if self.is_claimed(router, &router_vif.name)? {
                debug!("\t * interface {} is already claimed", router_vif.name);
                continue;
            }
            gateway = gateway.or(Some(physical_ip(topo, *router_ep)?));
            let (via, dst) =
                self.connect(router, router_vif, switch, next_port(), VirtualLinkKind::Access)?;
            self.add_route_pair(router, via, switch, dst, subnet.network())?;
        }

        if let Some(ip) = gateway {
            for (host, interface) in host_vifs {
                self.element_mut(host)?.gateway = Some(Gateway { ip, interface });
            }
        }
        Ok(())
    }

    fn is_claimed(&self, id: VirtualElementId, name: &str) -> Result<bool, VirtualNetworkError> {
        Ok(self.element(id)?.has_interface(name))
    }

    /// Create both interfaces and the link between them. Returns the positions of the new
    /// interfaces.
    fn connect(
        &mut self,
        a: VirtualElementId,
        a_vif: VirtualInterface,
        b: VirtualElementId,
        b_vif: VirtualInterface,
        kind: VirtualLinkKind,
    ) -> Result<(usize, usize), VirtualNetworkError> {
        debug!("\t * created {:?} link: {} <--> {}", kind, a_vif.name, b_vif.name);
        let a_pos = self.element_mut(a)?.add_interface(a_vif);
        let b_pos = self.element_mut(b)?.add_interface(b_vif);
        self.links.push(VirtualLink { a: (a, a_pos), b: (b, b_pos), kind });
        Ok((a_pos, b_pos))
    }

    fn add_route_pair(
        &mut self,
        a: VirtualElementId,
        a_pos: usize,
        b: VirtualElementId,
        b_pos: usize,
        subnet: Ipv4Net,
    ) -> Result<(), VirtualNetworkError> {
        let route = Route { subnet, via: a_pos, to: b, dst: b_pos, registered: true };
        self.element_mut(b)?.add_route(route.reverse(a));
        self.element_mut(a)?.add_route(route);
        Ok(())
    }
}

fn physical_vif(topo: &Topology, ep: Endpoint) -> Result<VirtualInterface, VirtualNetworkError> {
    let name = topo
        .get_element_name(ep.element)
        .map_err(|_| VirtualNetworkError::PhysicalInterfaceNotFound(ep))?;
    let iface = topo.interface(ep).ok_or(VirtualNetworkError::PhysicalInterfaceNotFound(ep))?;
    Ok(VirtualInterface {
        name: format!("{}-{}", name, iface.name()),
        physical: Some(ep),
        address: Some((iface.ip(), iface.prefix_len())),
    })
}

fn physical_ip(topo: &Topology, ep: Endpoint) -> Result<Ipv4Addr, VirtualNetworkError> {
    topo.interface(ep).map(|i| i.ip()).ok_or(VirtualNetworkError::PhysicalInterfaceNotFound(ep))
}

fn physical_subnet(topo: &Topology, ep: Endpoint) -> Result<Ipv4Net, VirtualNetworkError> {
    topo.interface(ep)
        .map(|i| i.network())
        .ok_or(VirtualNetworkError::PhysicalInterfaceNotFound(ep))
}
