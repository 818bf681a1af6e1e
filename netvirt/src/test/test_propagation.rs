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

//! Test the propagation of routes between virtual routers.

use crate::backbone::Backbone;
use crate::example_networks::{CampusNet, ChainNet, ExampleNetwork};
use crate::virtual_net::*;
use crate::Diagnostics;
use ipnet::Ipv4Net;

fn assembled_chain() -> VirtualNetwork {
    let topo = ChainNet::topology(2);
    let backbone = Backbone::compute(&topo);
    VirtualNetwork::assemble(&topo, &backbone, &mut Diagnostics::new()).unwrap()
}

fn knows(vnet: &VirtualNetwork, name: &str, subnet: &str) -> bool {
    let subnet: Ipv4Net = subnet.parse().unwrap();
    vnet.element(vnet.get_id(name).unwrap()).unwrap().knows_subnet(&subnet)
}

#[test]
fn test_single_pass() {
    let mut vnet = assembled_chain();
    assert_eq!(vnet.num_routes(), 8);
    assert!(!knows(&vnet, "r3", "10.1.1.0/24"));

    assert_eq!(vnet.propagate_routes_once(), Ok(5));
    assert!(knows(&vnet, "r3", "10.1.1.0/24"));
    assert!(knows(&vnet, "r2", "10.3.1.0/24"));
    assert!(!knows(&vnet, "r1", "10.3.1.0/24"));

    assert_eq!(vnet.propagate_routes_once(), Ok(1));
    assert!(knows(&vnet, "r1", "10.3.1.0/24"));

    assert_eq!(vnet.propagate_routes_once(), Ok(0));
    assert_eq!(vnet.num_routes(), 14);
}

#[test]
fn test_fixpoint() {
    let mut vnet = assembled_chain();
    assert_eq!(vnet.propagate_routes(), Ok(6));
    assert_eq!(vnet.propagate_routes(), Ok(0));

    let built = VirtualNetwork::build(&ChainNet::topology(2), &mut Diagnostics::new()).unwrap();
    assert_eq!(built, vnet);
    let mut rebuilt = built.clone();
    assert_eq!(rebuilt.propagate_routes(), Ok(0));
    assert_eq!(rebuilt, built);
}

#[test]
fn test_propagated_route_direction() {
    let mut vnet = assembled_chain();
    vnet.propagate_routes().unwrap();
    let r1 = vnet.get_id("r1").unwrap();
    let r2 = vnet.get_id("r2").unwrap();

    let propagated: Vec<Route> = vnet.element(r1).unwrap().propagated_routes().copied().collect();
    assert_eq!(
        propagated,
        vec![
            Route {
                subnet: "10.0.23.0/24".parse().unwrap(),
                via: 0,
                to: r2,
                dst: 0,
                registered: false,
            },
            Route {
                subnet: "10.3.1.0/24".parse().unwrap(),
                via: 0,
                to: r2,
                dst: 0,
                registered: false,
            },
        ]
    );
}

#[test]
fn test_hosts_are_not_updated() {
    let vnet = VirtualNetwork::build(&CampusNet::topology(0), &mut Diagnostics::new()).unwrap();
    for host in vnet.hosts().chain(vnet.switches()) {
        assert_eq!(host.propagated_routes().count(), 0, "{}", host);
    }
}

#[test]
fn test_every_router_knows_every_subnet() {
    let topo = CampusNet::topology(0);
    let vnet = VirtualNetwork::build(&topo, &mut Diagnostics::new()).unwrap();
    for router in vnet.routers() {
        for subnet in topo.subnets() {
            assert!(
                router.knows_subnet(&subnet.network()),
                "{} {}",
                router.name(),
                subnet.network()
            );
        }
    }

    // r3 learns the subnet of r1 over the alternative link
    let r1 = vnet.get_id("r1").unwrap();
    let r3 = vnet.element(vnet.get_id("r3").unwrap()).unwrap();
    let subnet: Ipv4Net = "10.1.0.0/24".parse().unwrap();
    let to_subnet: Vec<&Route> = r3.routes().iter().filter(|r| r.subnet == subnet).collect();
    assert_eq!(to_subnet.len(), 1);
    assert_eq!(to_subnet[0].to, r1);
    assert_eq!(to_subnet[0].via, 1);
}
