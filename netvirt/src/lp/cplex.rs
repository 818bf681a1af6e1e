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

//! Export of an [`LpTask`] in a CPLEX-like text format. The output is meant for inspection only.

use super::task::LpTask;

use std::fmt::Write;

impl LpTask {
    /// Render the task in CPLEX LP format. Every constraint group starts with a comment line
    /// `\ name: comment`, and every variable has exactly one line in the `Bounds` section.
    pub fn to_cplex(&self) -> String {
        let mut s = String::new();
        // writing into a String cannot fail
        let _ = self.write_cplex(&mut s);
        s
    }

    fn write_cplex(&self, s: &mut String) -> std::fmt::Result {
        writeln!(s, "{}", if self.is_maximization() { "Maximize" } else { "Minimize" })?;
        writeln!(s, " {}: {}", self.objective_name(), self.objective())?;

        writeln!(s, "Subject To")?;
        for group in self.groups() {
            match group.comment.as_ref() {
                Some(c) => writeln!(s, "\\ {}: {}", group.name, c)?,
                None => writeln!(s, "\\ {}", group.name)?,
            }
            for c in group.constraints.iter() {
                writeln!(s, " {}: {} {} {}", c.name, c.expr, c.sense, c.rhs)?;
            }
        }

        writeln!(s, "Bounds")?;
        for (name, bounds) in self.variables() {
            writeln!(s, " {} <= {} <= {}", fmt_bound(bounds.lower), name, fmt_bound(bounds.upper))?;
        }

        if !self.binaries().is_empty() {
            writeln!(s, "Binary")?;
            for name in self.binaries() {
                writeln!(s, " {}", name)?;
            }
        }

        writeln!(s, "End")
    }
}

fn fmt_bound(x: f64) -> String {
    if x == f64::INFINITY {
        String::from("+inf")
    } else if x == f64::NEG_INFINITY {
        String::from("-inf")
    } else {
        format!("{}", x)
    }
}
