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

//! Solver-agnostic representation of a linear program.

use super::LpError;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Linear expression `c1 x1 + c2 x2 + ...`, with variables referenced by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(f64, String)>,
}

impl LinearExpr {
    /// Empty expression (evaluates to 0)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term and return the expression
    pub fn term(mut self, coef: f64, var: impl Into<String>) -> Self {
        self.add_term(coef, var);
        self
    }

    /// Add a term
    pub fn add_term(&mut self, coef: f64, var: impl Into<String>) {
        self.terms.push((coef, var.into()));
    }

    /// All terms, in insertion order
    pub fn terms(&self) -> &[(f64, String)] {
        &self.terms
    }

    /// Returns true if the expression has no terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluate the expression. Missing variables count as 0.
    pub fn evaluate(&self, values: &BTreeMap<String, f64>) -> f64 {
        self.terms.iter().map(|(c, v)| c * values.get(v).copied().unwrap_or(0.0)).sum()
    }
}

impl<S: Into<String>> std::iter::FromIterator<(f64, S)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (f64, S)>>(iter: I) -> Self {
        Self { terms: iter.into_iter().map(|(c, v)| (c, v.into())).collect() }
    }
}

impl fmt::Display for LinearExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (i, (c, v)) in self.terms.iter().enumerate() {
            let (sign, abs) = if *c < 0.0 { ("-", -c) } else { ("+", *c) };
            match (i, sign) {
                (0, "+") => {}
                (0, _) => write!(f, "-")?,
                (_, s) => write!(f, " {} ", s)?,
            }
            if (abs - 1.0).abs() < f64::EPSILON {
                write!(f, "{}", v)?;
            } else {
                write!(f, "{} {}", abs, v)?;
            }
        }
        Ok(())
    }
}

/// Relation between the left and the right hand side of a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sense {
    /// `<=`
    Le,
    /// `=`
    Eq,
    /// `>=`
    Ge,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sense::Le => write!(f, "<="),
            Sense::Eq => write!(f, "="),
            Sense::Ge => write!(f, ">="),
        }
    }
}

/// Named linear constraint `expr <sense> rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Unique name
    pub name: String,
    /// Left hand side
    pub expr: LinearExpr,
    /// Relation
    pub sense: Sense,
    /// Constant right hand side
    pub rhs: f64,
}

impl Constraint {
    /// Returns true if the constraint holds for the given values, with some tolerance.
    pub fn is_satisfied(&self, values: &BTreeMap<String, f64>) -> bool {
        const TOL: f64 = 1e-6;
        let lhs = self.expr.evaluate(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs + TOL,
            Sense::Eq => (lhs - self.rhs).abs() <= TOL,
            Sense::Ge => lhs >= self.rhs - TOL,
        }
    }
}

/// Group of constraints belonging to the same family, with an optional comment.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintGroup {
    /// Name of the group
    pub name: String,
    /// Comment describing the group
    pub comment: Option<String>,
    /// All constraints of this group
    pub constraints: Vec<Constraint>,
}

impl ConstraintGroup {
    /// Create an empty group
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), comment: None, constraints: Vec::new() }
    }

    /// Set the comment of the group
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Add a constraint to the group
    pub fn add(&mut self, name: impl Into<String>, expr: LinearExpr, sense: Sense, rhs: f64) {
        self.constraints.push(Constraint { name: name.into(), expr, sense, rhs });
    }

    /// Returns true if the group has no constraints
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

/// Lower and upper bound of a variable. Unbounded sides are infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Lower bound
    pub lower: f64,
    /// Upper bound
    pub upper: f64,
}

impl Bounds {
    /// Returns true if the value lies within the bounds, with some tolerance.
    pub fn contains(&self, value: f64) -> bool {
        const TOL: f64 = 1e-6;
        value >= self.lower - TOL && value <= self.upper + TOL
    }
}

/// # Linear Program
///
/// Objective, named constraint groups, a table of variable bounds (in declaration order), and the
/// set of binary variables.
#[derive(Debug, Clone, PartialEq)]
pub struct LpTask {
    objective_name: String,
    objective: LinearExpr,
    maximize: bool,
    groups: Vec<ConstraintGroup>,
    variables: Vec<(String, Bounds)>,
    var_lookup: HashMap<String, usize>,
    constraint_names: HashSet<String>,
    binaries: Vec<String>,
    binary_lookup: HashSet<String>,
}

impl Default for LpTask {
    fn default() -> Self {
        Self {
            objective_name: String::from("obj"),
            objective: LinearExpr::new(),
            maximize: true,
            groups: Vec::new(),
            variables: Vec::new(),
            var_lookup: HashMap::new(),
            constraint_names: HashSet::new(),
            binaries: Vec::new(),
            binary_lookup: HashSet::new(),
        }
    }
}

impl LpTask {
    /// Create an empty maximization task
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the objective. Every variable of the objective must already be declared.
    pub fn set_objective(
        &mut self,
        name: impl Into<String>,
        objective: LinearExpr,
        maximize: bool,
    ) -> Result<(), LpError> {
        self.check_expr(&objective)?;
        self.objective_name = name.into();
        self.objective = objective;
        self.maximize = maximize;
        Ok(())
    }

    /// Declare a continuous variable
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        lower: f64,
        upper: f64,
    ) -> Result<(), LpError> {
        let name = name.into();
        if self.var_lookup.contains_key(&name) {
            return Err(LpError::DuplicateVariable(name));
        }
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(LpError::InvalidBounds(name, lower, upper));
        }
        self.var_lookup.insert(name.clone(), self.variables.len());
        self.variables.push((name, Bounds { lower, upper }));
        Ok(())
    }

    /// Declare a binary (integer) variable. The bounds must lie within `[0, 1]`.
    pub fn add_binary(
        &mut self,
        name: impl Into<String>,
        lower: f64,
        upper: f64,
    ) -> Result<(), LpError> {
        let name = name.into();
        if lower < 0.0 || upper > 1.0 {
            return Err(LpError::InvalidBounds(name, lower, upper));
        }
        self.add_variable(name.clone(), lower, upper)?;
        self.binary_lookup.insert(name.clone());
        self.binaries.push(name);
        Ok(())
    }

    /// Add a group of constraints. All constraint names must be unique in the task, and all
    /// variables must be declared.
    pub fn add_group(&mut self, group: ConstraintGroup) -> Result<(), LpError> {
        for c in group.constraints.iter() {
            self.check_expr(&c.expr)?;
            if !self.constraint_names.insert(c.name.clone()) {
                return Err(LpError::DuplicateConstraint(c.name.clone()));
            }
        }
        self.groups.push(group);
        Ok(())
    }

    fn check_expr(&self, expr: &LinearExpr) -> Result<(), LpError> {
        match expr.terms().iter().find(|(_, v)| !self.var_lookup.contains_key(v)) {
            Some((_, v)) => Err(LpError::UnknownVariable(v.clone())),
            None => Ok(()),
        }
    }

    /// Name of the objective
    pub fn objective_name(&self) -> &str {
        &self.objective_name
    }

    /// Objective expression
    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    /// Returns true if the objective is maximized
    pub fn is_maximization(&self) -> bool {
        self.maximize
    }

    /// All constraint groups, in insertion order
    pub fn groups(&self) -> &[ConstraintGroup] {
        &self.groups
    }

    /// Iterate over all constraints of all groups
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.groups.iter().flat_map(|g| g.constraints.iter())
    }

    /// Total number of constraints
    pub fn num_constraints(&self) -> usize {
        self.groups.iter().map(|g| g.constraints.len()).sum()
    }

    /// All variables with their bounds, in declaration order
    pub fn variables(&self) -> impl Iterator<Item = (&str, Bounds)> {
        self.variables.iter().map(|(n, b)| (n.as_str(), *b))
    }

    /// Number of declared variables
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Bounds of a variable
    pub fn bounds(&self, name: &str) -> Option<Bounds> {
        self.var_lookup.get(name).map(|i| self.variables[*i].1)
    }

    /// Returns true if the variable is declared
    pub fn has_variable(&self, name: &str) -> bool {
        self.var_lookup.contains_key(name)
    }

    /// Binary variables, in declaration order
    pub fn binaries(&self) -> &[String] {
        &self.binaries
    }

    /// Returns true if the variable is binary
    pub fn is_binary(&self, name: &str) -> bool {
        self.binary_lookup.contains(name)
    }
}
