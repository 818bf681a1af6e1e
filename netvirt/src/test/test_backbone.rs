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

//! Test the shortest-path backbone.

use crate::backbone::Backbone;
use crate::example_networks::{CampusNet, ChainNet, ExampleNetwork};
use crate::topology::*;
use crate::Diagnostics;
use petgraph::algo::is_cyclic_undirected;
use std::net::Ipv4Addr;

fn cost_iface(name: &str, ip: &str, cost: LinkCost) -> Interface {
    Interface::with_cost(name, ip.parse().unwrap(), Ipv4Addr::new(255, 255, 255, 0), cost).unwrap()
}

/// For every router, the predecessor edge is part of a shortest path, and no other edge offers a
/// shorter distance.
fn assert_optimal(topo: &Topology, bb: &Backbone) {
    for r in topo.routers() {
        let d = bb.distance(r.id()).unwrap();
        match bb.hop(r.id()) {
            Some(hop) => {
                assert_eq!(d, bb.distance(hop.predecessor).unwrap() + hop.cost as u64);
                let via = topo.interface(hop.via).unwrap().cost();
                let dst = topo.interface(hop.destination).unwrap().cost();
                assert_eq!(hop.cost, via.max(dst));
            }
            None => assert_eq!(Some(r.id()), bb.root()),
        }
        for (own, other) in topo.links_of(r.id()).unwrap() {
            if !topo.element(other.element).unwrap().is_router() {
                continue;
            }
            let cost =
                topo.interface(own).unwrap().cost().max(topo.interface(other).unwrap().cost());
            assert!(d <= bb.distance(other.element).unwrap() + cost as u64);
        }
    }
}

#[test]
fn test_chain() {
    let topo = ChainNet::topology(2);
    let bb = Backbone::compute(&topo);
    let r1 = topo.get_element_id("r1").unwrap();
    let r2 = topo.get_element_id("r2").unwrap();
    let r3 = topo.get_element_id("r3").unwrap();

    assert_eq!(bb.root(), Some(r1));
    assert!(bb.hop(r1).is_none());
    assert_eq!(bb.hop(r2).unwrap().predecessor, r1);
    assert_eq!(bb.hop(r3).unwrap().predecessor, r2);
    assert_eq!(bb.distance(r3), Some(2));
    assert_eq!(bb.num_edges(), 2);

    // hosts are never part of the backbone
    let h1 = topo.get_element_id("h1").unwrap();
    assert!(bb.hop(h1).is_none());
    assert_eq!(bb.distance(h1), None);

    assert_optimal(&topo, &bb);
    let g = bb.graph();
    assert_eq!(g.node_count(), 3);
    assert_eq!(g.edge_count(), 2);
    assert!(!is_cyclic_undirected(&g));
}

#[test]
fn test_triangle() {
    let topo = CampusNet::topology(0);
    let bb = Backbone::compute(&topo);
    let r2 = topo.get_element_id("r2").unwrap();
    let r3 = topo.get_element_id("r3").unwrap();

    let hop = bb.hop(r3).unwrap();
    assert_eq!(hop.predecessor, r2);
    assert_eq!(hop.via, Endpoint::new(r3, 0));
    assert_eq!(hop.destination, Endpoint::new(r2, 1));
    assert_eq!(hop.cost, 1);
    assert_eq!(bb.distance(r3), Some(2));

    assert_optimal(&topo, &bb);
    assert!(!is_cyclic_undirected(&bb.graph()));
}

#[test]
fn test_link_weight_is_maximum() {
    // r1 - r2 with cost 4, r2 - r3 with cost 6, r1 - r3 with cost 9
    let mut b = TopologyBuilder::new();
    b.add_router("r1", vec![cost_iface("eth0", "10.0.12.1", 4), cost_iface("eth1", "10.0.13.1", 9)])
        .unwrap();
    b.add_router("r2", vec![cost_iface("eth0", "10.0.12.2", 4), cost_iface("eth1", "10.0.23.2", 6)])
        .unwrap();
    b.add_router("r3", vec![cost_iface("eth0", "10.0.23.3", 6), cost_iface("eth1", "10.0.13.3", 9)])
        .unwrap();
    let topo = b.build(&mut Diagnostics::new()).unwrap();
    let bb = Backbone::compute(&topo);

    // the direct link (9) is cheaper than the detour (4 + 6)
    let hop = bb.hop(ElementId(2)).unwrap();
    assert_eq!(hop.predecessor, ElementId(0));
    assert_eq!(hop.cost, 9);
    assert_eq!(bb.distance(ElementId(2)), Some(9));
    assert_optimal(&topo, &bb);
}

#[test]
fn test_used_interface() {
    // three routers sharing one subnet. r1 claims r2 with its only interface, so r3 is reached
    // through r2.
    let mut b = TopologyBuilder::new();
    b.add_router("r1", vec![cost_iface("eth0", "10.0.0.1", 1)]).unwrap();
    b.add_router("r2", vec![cost_iface("eth0", "10.0.0.2", 1)]).unwrap();
    b.add_router("r3", vec![cost_iface("eth0", "10.0.0.3", 1)]).unwrap();
    let topo = b.build(&mut Diagnostics::new()).unwrap();
    assert_eq!(topo.num_links(), 3);

    let bb = Backbone::compute(&topo);
    assert_eq!(bb.hop(ElementId(1)).unwrap().predecessor, ElementId(0));
    assert_eq!(bb.hop(ElementId(2)).unwrap().predecessor, ElementId(1));
    assert_eq!(bb.distance(ElementId(2)), Some(2));
    assert!(!is_cyclic_undirected(&bb.graph()));
}

#[test]
fn test_disconnected() {
    let mut b = TopologyBuilder::new();
    b.add_router("r1", vec![cost_iface("eth0", "10.0.0.1", 1)]).unwrap();
    b.add_router("r2", vec![cost_iface("eth0", "10.0.1.1", 1)]).unwrap();
    let topo = b.build(&mut Diagnostics::new()).unwrap();
    let bb = Backbone::compute(&topo);
    assert_eq!(bb.root(), Some(ElementId(0)));
    assert!(bb.hop(ElementId(1)).is_none());
    assert_eq!(bb.distance(ElementId(1)), None);
    assert_eq!(bb.graph().node_count(), 1);

    let empty = TopologyBuilder::new().build(&mut Diagnostics::new()).unwrap();
    assert_eq!(Backbone::compute(&empty).root(), None);
}
