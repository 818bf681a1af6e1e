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

//! # Campus Network

use super::{host_iface, router_iface, ExampleNetwork};
use crate::topology::TopologyBuilder;

/// # Campus Network
///
/// Three routers in a triangle. The link `r1 - r3` is expensive, so the backbone uses
/// `r1 - r2 - r3`, and `r1 - r3` becomes an alternative link. Hosts `h1` and `h2` share a subnet
/// with `r1` (connected by a switch), and `h3` is directly attached to `r3`.
///
/// ```text
///  h1 --+
///       s0 --- r1 ------- r2
///  h2 --+       \        /
///                \      /
///                  r3 --- h3
/// ```
///
/// ## Variant 0
/// Demands `h1 -> h3` (rate 5) and `h2 -> h3` (rate 8).
///
/// ## Variant 1
/// Same as variant 0, with an additional host `h4` in a subnet without any router, and an
/// interface `eth9` on `r2` without any peer.
pub struct CampusNet {}

impl ExampleNetwork for CampusNet {
    fn builder(variant: usize) -> TopologyBuilder {
        if variant > 1 {
            panic!("Invalid variant number");
        }

        let mut r2_ifaces =
            vec![router_iface("eth0", "10.0.12.2", 1), router_iface("eth1", "10.0.23.2", 1)];
        if variant == 1 {
            r2_ifaces.push(router_iface("eth9", "10.99.0.1", 1));
        }

        let mut b = TopologyBuilder::new();
        b.add_router(
            "r1",
            vec![
                router_iface("eth0", "10.0.12.1", 1),
                router_iface("eth1", "10.0.13.1", 5),
                router_iface("eth2", "10.1.0.1", 1),
            ],
        )
        .unwrap();
        b.add_router("r2", r2_ifaces).unwrap();
        b.add_router(
            "r3",
            vec![
                router_iface("eth0", "10.0.23.3", 1),
                router_iface("eth1", "10.0.13.3", 5),
                router_iface("eth2", "10.3.0.1", 1),
            ],
        )
        .unwrap();
        b.add_host("h1", vec![host_iface("eth0", "10.1.0.11")]).unwrap();
        b.add_host("h2", vec![host_iface("eth0", "10.1.0.12")]).unwrap();
        b.add_host("h3", vec![host_iface("eth0", "10.3.0.13")]).unwrap();
        if variant == 1 {
            b.add_host("h4", vec![host_iface("eth0", "10.9.0.14")]).unwrap();
        }

        b.add_demand("h1", "h3", 5).unwrap();
        b.add_demand("h2", "h3", 8).unwrap();
        b
    }
}
