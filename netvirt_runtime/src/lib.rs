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

//! # Runtime System
//!
//! This crate contains a concrete
//! [`VirtualizationBackend`](netvirt::backend::VirtualizationBackend), which renders the virtual
//! network as a shell script for Linux. Every node becomes a network namespace, every link a veth
//! pair, and every switch a bridge inside its own namespace. Routes are installed with `ip route`,
//! and rate limits with a token bucket filter (`tc ... tbf`).
//!
//! The backend never executes anything itself. Use [`ScriptBackend::script`] to get the setup
//! script, and [`ScriptBackend::teardown_script`] to get the script removing everything again.
//!
//! ```
//! use netvirt::backend::virtualize;
//! use netvirt::example_networks::{ChainNet, ExampleNetwork};
//! use netvirt::virtual_net::VirtualNetwork;
//! use netvirt::Diagnostics;
//! use netvirt_runtime::ScriptBackend;
//!
//! let mut diagnostics = Diagnostics::new();
//! let topo = ChainNet::topology(0);
//! let vnet = VirtualNetwork::build(&topo, &mut diagnostics).unwrap();
//! let mut backend = ScriptBackend::default();
//! virtualize(&topo, &vnet, &[], &mut backend, &mut diagnostics).unwrap();
//! assert!(backend.script().contains("ip netns add r1"));
//! ```

#![deny(missing_docs, missing_debug_implementations)]

pub mod script;
pub mod traffic_control;

pub use script::ScriptBackend;
pub use traffic_control::TrafficControlSettings;
