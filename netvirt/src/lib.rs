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

#![deny(missing_docs)]

//! # NetVirt: Topology Virtualization and Traffic Engineering
//!
//! This is a library for turning a declared network topology (routers, hosts and bandwidth
//! demands) into a virtualized replica of that topology, and into an optimal traffic-engineering
//! plan. The plan decides, for every demand, which path to use and which rate to admit, such that
//! the worst-served demand is served as well as possible.
//!
//! ## Structure
//!
//! - **[`Topology`](topology)**: Routers, hosts and demands. Links and subnets are inferred from
//!   the addressing of the interfaces. See [`TopologyBuilder`](topology::TopologyBuilder).
//!
//! - **[`Backbone`](backbone)**: Shortest-path tree over all routers, used as the canonical path
//!   between them.
//!
//! - **[`VirtualNetwork`](virtual_net)**: Virtual routers, hosts and switches, together with their
//!   interfaces, gateways and routes. Routes are propagated between adjacent routers until every
//!   router knows every reachable subnet.
//!
//! - **[`Traffic Engineering`](lp)**: Mixed-integer linear program deciding the path and the
//!   admitted rate of every demand, solver backends, and the interpretation of the solution.
//!
//! - **[`Virtualization`](backend)**: Interface of a platform instantiating the virtual network,
//!   and the function driving it.
//!
//! - **[`Diagnostics`](diagnostics)**: Collector of all non-fatal problems found on the way.
//!
//! - **[`ExampleNetworks`](example_networks)**: Collection of prepared networks.
//!
//! ## Usage
//!
//! ```
//! use netvirt::example_networks::{ChainNet, ExampleNetwork};
//! use netvirt::lp::{create_solver, optimize, SolverStatus};
//! use netvirt::virtual_net::VirtualNetwork;
//! use netvirt::{Diagnostics, Error};
//!
//! fn main() -> Result<(), Error> {
//!     let mut diagnostics = Diagnostics::new();
//!     let topo = ChainNet::builder(0).build(&mut diagnostics)?;
//!     let vnet = VirtualNetwork::build(&topo, &mut diagnostics)?;
//!
//!     let mut solver = create_solver("microlp")?;
//!     let (te, plan) = optimize(&topo, &vnet, solver.as_mut(), &mut diagnostics)?;
//!     assert_eq!(plan.status, SolverStatus::Optimal);
//!
//!     let rules = plan.shaping_rules(&te, &vnet)?;
//!     assert_eq!(rules.len(), 2);
//!     Ok(())
//! }
//! ```

pub mod backbone;
pub mod backend;
pub mod diagnostics;
mod error;
pub mod example_networks;
pub mod lp;
pub mod printer;
pub mod topology;
pub mod virtual_net;

pub use diagnostics::{Diagnostics, Warning};
pub use error::Error;

#[cfg(test)]
mod test;
