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

//! # Diagnostics
//!
//! Every component that can detect a non-fatal problem receives a `&mut Diagnostics` handle. The
//! handle keeps all warnings that were raised, and logs each one at the moment it is recorded.

use ipnet::Ipv4Net;
use log::*;
use std::fmt;

/// Non-fatal problem detected while building or optimizing the network.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// The element has no link to any other element.
    UnlinkedElement(String),
    /// Both ends of a link declare a different cost. The second is overwritten with the first.
    CostConflict {
        /// `element:interface` whose cost was kept
        kept: String,
        /// `element:interface` whose cost was replaced
        replaced: String,
        /// Cost that was kept
        cost: u32,
        /// Cost that was dropped
        dropped: u32,
    },
    /// A subnet contains hosts but no router. These hosts cannot reach any other subnet.
    SubnetWithoutRouter(Ipv4Net, Vec<String>),
    /// A physical interface is not part of any virtual link.
    UnusedInterface(String, String),
    /// An element is the source of more than one demand. The strictest one is used.
    MultipleDemands(String),
    /// No path exists for the demand. It is not part of the optimization.
    NoRouteFound(String, String),
    /// The optimization problem has no solution. No traffic shaping is applied.
    InfeasibleOptimization,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnlinkedElement(e) => {
                write!(f, "Element {} is not connected to any other element", e)
            }
            Warning::CostConflict { kept, replaced, cost, dropped } => write!(
                f,
                "Conflicting costs on link {} <-> {}: using {} instead of {}",
                kept, replaced, cost, dropped
            ),
            Warning::SubnetWithoutRouter(net, hosts) => write!(
                f,
                "No router present in subnet {}. The following hosts are unreachable: {}",
                net,
                hosts.join(", ")
            ),
            Warning::UnusedInterface(e, i) => write!(
                f,
                "Interface {}-{} is not used in any link. It is created but kept down",
                e, i
            ),
            Warning::MultipleDemands(e) => write!(
                f,
                "Element {} has more than one demand. Using the strictest one as route cost",
                e
            ),
            Warning::NoRouteFound(s, d) => {
                write!(f, "No route found for demand {} -> {}. Skipping this demand", s, d)
            }
            Warning::InfeasibleOptimization => write!(
                f,
                "Traffic engineering problem is infeasible. No traffic shaping will be applied"
            ),
        }
    }
}

/// Collector of warnings, passed explicitly to every component.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (and log) a new warning
    pub fn warn(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// All warnings recorded so far, in order.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Returns true if no warning was recorded
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Count the warnings matching a predicate
    pub fn count(&self, f: impl Fn(&Warning) -> bool) -> usize {
        self.warnings.iter().filter(|w| f(w)).count()
    }
}
