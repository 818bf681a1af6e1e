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

//! # Twin Network

use super::{host_iface, router_iface, ExampleNetwork};
use crate::topology::TopologyBuilder;

/// # Twin Network
///
/// Two routers connected by a single link of cost 10. Hosts `h1` and `h3` share a subnet with
/// `r1` (connected by a switch), and `h2` is directly attached to `r2`. All flows towards `h2`
/// leave `r1` through the same interface.
///
/// ```text
///  h1 --+
///       s0 --- r1 --- r2 --- h2
///  h3 --+
/// ```
///
/// ## Variant 0
/// Demands `h1 -> h2` (rate 3) and `h3 -> h2` (rate 4). Both fit on the link.
///
/// ## Variant 1
/// Demands `h1 -> h2` (rate 12) and `h3 -> h2` (rate 12). The link can only carry 10.
///
/// ## Variant 2
/// Demands `r1 -> h2` (rate 8) and `h1 -> h2` (rate 3). The first demand starts at `r1` itself.
pub struct TwinNet {}

impl ExampleNetwork for TwinNet {
    fn builder(variant: usize) -> TopologyBuilder {
        let mut b = TopologyBuilder::new();
        b.add_router(
            "r1",
            vec![router_iface("eth0", "10.0.12.1", 10), router_iface("eth1", "10.1.1.1", 10)],
        )
        .unwrap();
        b.add_router(
            "r2",
            vec![router_iface("eth0", "10.0.12.2", 10), router_iface("eth1", "10.2.1.1", 10)],
        )
        .unwrap();
        b.add_host("h1", vec![host_iface("eth0", "10.1.1.100")]).unwrap();
        b.add_host("h3", vec![host_iface("eth0", "10.1.1.101")]).unwrap();
        b.add_host("h2", vec![host_iface("eth0", "10.2.1.100")]).unwrap();

        match variant {
            0 => {
                b.add_demand("h1", "h2", 3).unwrap();
                b.add_demand("h3", "h2", 4).unwrap();
            }
            1 => {
                b.add_demand("h1", "h2", 12).unwrap();
                b.add_demand("h3", "h2", 12).unwrap();
            }
            2 => {
                b.add_demand("r1", "h2", 8).unwrap();
                b.add_demand("h1", "h2", 3).unwrap();
            }
            _ => panic!("Invalid variant number"),
        }
        b
    }
}
