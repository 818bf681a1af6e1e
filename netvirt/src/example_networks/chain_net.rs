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

//! # Chain Network

use super::{host_iface, router_iface, ExampleNetwork};
use crate::topology::TopologyBuilder;

/// # Chain Network
///
/// Three routers in a row, with one host on each end:
///
/// ```text
/// h1 --- r1 --- r2 --- r3 --- h2
/// ```
///
/// | link      | subnet         |
/// |-----------|----------------|
/// | `h1 - r1` | `10.1.1.0/24`  |
/// | `r1 - r2` | `10.0.12.0/24` |
/// | `r2 - r3` | `10.0.23.0/24` |
/// | `r3 - h2` | `10.3.1.0/24`  |
///
/// ## Variant 0
/// All router interfaces have cost 10. There is a single demand `h1 -> h2` with rate 10.
///
/// ## Variant 1
/// Same as variant 0, but the link `r2 - r3` has cost 0. The demand cannot be satisfied.
///
/// ## Variant 2
/// All router interfaces have cost 1, and there are no demands.
pub struct ChainNet {}

impl ExampleNetwork for ChainNet {
    fn builder(variant: usize) -> TopologyBuilder {
        let (cost, last_cost) = match variant {
            0 => (10, 10),
            1 => (10, 0),
            2 => (1, 1),
            _ => panic!("Invalid variant number"),
        };

        let mut b = TopologyBuilder::new();
        b.add_router(
            "r1",
            vec![router_iface("eth0", "10.0.12.1", cost), router_iface("eth1", "10.1.1.1", cost)],
        )
        .unwrap();
        b.add_router(
            "r2",
            vec![
                router_iface("eth0", "10.0.12.2", cost),
                router_iface("eth1", "10.0.23.2", last_cost),
            ],
        )
        .unwrap();
        b.add_router(
            "r3",
            vec![
                router_iface("eth0", "10.0.23.3", last_cost),
                router_iface("eth1", "10.3.1.1", cost),
            ],
        )
        .unwrap();
        b.add_host("h1", vec![host_iface("eth0", "10.1.1.100")]).unwrap();
        b.add_host("h2", vec![host_iface("eth0", "10.3.1.100")]).unwrap();

        if variant != 2 {
            b.add_demand("h1", "h2", 10).unwrap();
        }
        b
    }
}
