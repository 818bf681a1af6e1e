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

//! # Traffic Engineering
//!
//! This module mirrors the virtual network as a graph of LP routes ([`LpNetwork`]), formulates
//! the mixed-integer linear program deciding the path and admitted rate of every demand
//! ([`TrafficEngineering`]), solves it with a [`Solver`] backend, and interprets the solution as
//! a [`TrafficPlan`].
//!
//! The program itself is kept solver-agnostic as an [`LpTask`], which can be exported in a
//! CPLEX-like text format for inspection.

mod cplex;
mod network;
mod result;
mod solver;
mod task;
mod traffic_engineering;

pub use network::{Bfs, LpNetwork, LpRoute, LpRouteId};
pub use result::{FlowResult, ShapingRule, TrafficPlan};
pub use solver::{create_solver, MicroLpSolver, Solver, SolverError, SolverResult, SolverStatus};
pub use task::{Bounds, Constraint, ConstraintGroup, LinearExpr, LpTask, Sense};
pub use traffic_engineering::{Flow, TrafficEngineering, MIN_RATIO};

use crate::diagnostics::Diagnostics;
use crate::topology::Topology;
use crate::virtual_net::VirtualNetwork;
use crate::Error;

use log::*;
use thiserror::Error;

/// Errors raised while building or traversing the linear program
#[derive(Error, Debug, PartialEq)]
pub enum LpError {
    /// The element is not part of the LP network
    #[error("Element is not part of the LP network: {0}")]
    UnknownElement(String),
    /// An expression references a variable that was never declared
    #[error("Variable is not declared: {0}")]
    UnknownVariable(String),
    /// A variable was declared twice
    #[error("Variable is declared twice: {0}")]
    DuplicateVariable(String),
    /// Two constraints share the same name
    #[error("Constraint name is used twice: {0}")]
    DuplicateConstraint(String),
    /// The bounds of a variable are empty
    #[error("Invalid bounds for variable {0}: [{1}, {2}]")]
    InvalidBounds(String, f64, f64),
}

/// Formulate the traffic-engineering program for all demands of the topology, solve it, and
/// interpret the result. An infeasible program is not an error: the returned plan has status
/// [`SolverStatus::Infeasible`] and yields no shaping rules.
pub fn optimize(
    topo: &Topology,
    vnet: &VirtualNetwork,
    solver: &mut dyn Solver,
    diagnostics: &mut Diagnostics,
) -> Result<(TrafficEngineering, TrafficPlan), Error> {
    let te = TrafficEngineering::new(topo, vnet, diagnostics)?;
    info!(
        "Solving the traffic engineering problem with {} ({} variables, {} constraints)...",
        solver.name(),
        te.task().num_variables(),
        te.task().num_constraints()
    );
    let result = solver.solve(te.task())?;
    let plan = TrafficPlan::interpret(&te, &result, diagnostics)?;
    Ok((te, plan))
}
