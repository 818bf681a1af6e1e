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

//! Networks for testing

use crate::topology::{Interface, LinkCost, Topology, TopologyBuilder};
use crate::Diagnostics;

use std::net::Ipv4Addr;

mod chain_net;
pub use chain_net::ChainNet;

mod campus_net;
pub use campus_net::CampusNet;

mod twin_net;
pub use twin_net::TwinNet;

/// Trait for easier access to example networks.
pub trait ExampleNetwork {
    /// Get the builder, with all elements and demands of the chosen variant.
    fn builder(variant: usize) -> TopologyBuilder;

    /// Get the assembled topology of the chosen variant. All warnings are dropped.
    fn topology(variant: usize) -> Topology {
        Self::builder(variant).build(&mut Diagnostics::new()).unwrap()
    }
}

/// Router interface with a `/24` netmask
pub(crate) fn router_iface(name: &str, ip: &str, cost: LinkCost) -> Interface {
    Interface::with_cost(name, ip.parse().unwrap(), Ipv4Addr::new(255, 255, 255, 0), cost).unwrap()
}

/// Host interface with a `/24` netmask
pub(crate) fn host_iface(name: &str, ip: &str) -> Interface {
    Interface::new(name, ip.parse().unwrap(), Ipv4Addr::new(255, 255, 255, 0)).unwrap()
}
