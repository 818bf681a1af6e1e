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

//! Solver backends for an [`LpTask`].

use super::task::{LinearExpr, LpTask, Sense};

use good_lp::{
    constraint, solvers::microlp::microlp, variable, Expression, ProblemVariables,
    ResolutionError, Solution, SolverModel, Variable,
};
use log::*;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Outcome of a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverStatus {
    /// The solution is proven optimal
    Optimal,
    /// A solution was found, but it is not proven optimal
    Feasible,
    /// The program has no solution
    Infeasible,
}

/// Result of a solve. Every variable of the task has a value, regardless of the status.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverResult {
    /// Outcome of the solve
    pub status: SolverStatus,
    /// Value of the objective
    pub objective: f64,
    /// Value of every variable
    pub values: BTreeMap<String, f64>,
}

impl SolverResult {
    /// Value of a variable
    pub fn value(&self, var: &str) -> Option<f64> {
        self.values.get(var).copied()
    }

    /// Returns true if the status is either optimal or feasible
    pub fn is_feasible(&self) -> bool {
        self.status != SolverStatus::Infeasible
    }

    /// Result of an infeasible task: every variable is reported at its lower bound (or at 0 if
    /// it has no lower bound).
    pub fn infeasible(task: &LpTask) -> Self {
        let values: BTreeMap<String, f64> = task
            .variables()
            .map(|(name, b)| {
                let v = if b.lower.is_finite() { b.lower } else { 0.0_f64.min(b.upper) };
                (name.to_string(), v)
            })
            .collect();
        let objective = task.objective().evaluate(&values);
        Self { status: SolverStatus::Infeasible, objective, values }
    }
}

/// Errors of a solver backend
#[derive(Error, Debug, PartialEq)]
pub enum SolverError {
    /// The requested solver backend does not exist
    #[error("Solver backend is unavailable: {0}")]
    Unavailable(String),
    /// The solver backend failed
    #[error("Solver failed: {0}")]
    Failed(String),
    /// The task references a variable that is not declared
    #[error("Variable is not declared: {0}")]
    UnknownVariable(String),
}

/// Interface of a solver backend. A single attempt is made per call to `solve`.
pub trait Solver {
    /// Name of the backend
    fn name(&self) -> &'static str;

    /// Enable or disable verbose output
    fn set_verbose(&mut self, verbose: bool);

    /// Solve the task
    fn solve(&mut self, task: &LpTask) -> Result<SolverResult, SolverError>;
}

/// Create a solver backend by its name. Only `"microlp"` is available.
pub fn create_solver(name: &str) -> Result<Box<dyn Solver>, SolverError> {
    match name.to_lowercase().as_str() {
        "microlp" => Ok(Box::new(MicroLpSolver::new())),
        _ => Err(SolverError::Unavailable(name.to_string())),
    }
}

/// Mixed-integer solver written in pure Rust, driven through `good_lp`.
#[derive(Debug, Default, Clone)]
pub struct MicroLpSolver {
    verbose: bool,
}

impl MicroLpSolver {
    /// Create a new (quiet) solver
    pub fn new() -> Self {
        Self::default()
    }
}

impl Solver for MicroLpSolver {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    fn solve(&mut self, task: &LpTask) -> Result<SolverResult, SolverError> {
        let mut vars = ProblemVariables::new();
        let mut lookup: HashMap<&str, Variable> = HashMap::new();
        for (name, bounds) in task.variables() {
            let mut def = variable();
            if task.is_binary(name) {
                def = def.integer();
            }
            if bounds.lower.is_finite() {
                def = def.min(bounds.lower);
            }
            if bounds.upper.is_finite() {
                def = def.max(bounds.upper);
            }
            lookup.insert(name, vars.add(def));
        }

        let objective = to_expression(task.objective(), &lookup)?;
        let mut model = if task.is_maximization() {
            vars.maximise(objective)
        } else {
            vars.minimise(objective)
        }
        .using(microlp);

        for c in task.constraints() {
            let lhs = to_expression(&c.expr, &lookup)?;
            let cons = match c.sense {
                Sense::Le => constraint::leq(lhs, c.rhs),
                Sense::Eq => constraint::eq(lhs, c.rhs),
                Sense::Ge => constraint::geq(lhs, c.rhs),
            };
            model.add_constraint(cons);
        }

        let solution = match model.solve() {
            Ok(s) => s,
            Err(ResolutionError::Infeasible) => {
                info!("The linear program is infeasible");
                return Ok(SolverResult::infeasible(task));
            }
            Err(e) => return Err(SolverError::Failed(e.to_string())),
        };

        let values: BTreeMap<String, f64> = task
            .variables()
            .filter_map(|(name, _)| {
                lookup.get(name).map(|v| (name.to_string(), solution.value(*v)))
            })
            .collect();
        if self.verbose {
            for (name, value) in values.iter() {
                debug!("{} = {}", name, value);
            }
        }
        let objective = task.objective().evaluate(&values);
        info!("Solved the linear program, objective = {}", objective);

        Ok(SolverResult { status: SolverStatus::Optimal, objective, values })
    }
}

fn to_expression(
    expr: &LinearExpr,
    lookup: &HashMap<&str, Variable>,
) -> Result<Expression, SolverError> {
    expr.terms()
        .iter()
        .map(|(c, v)| match lookup.get(v.as_str()) {
            Some(var) => Ok(*c * *var),
            None => Err(SolverError::UnknownVariable(v.clone())),
        })
        .sum()
}
