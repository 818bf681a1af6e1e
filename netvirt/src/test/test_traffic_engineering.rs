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

//! Test the formulation of the traffic-engineering program, and its solution.

use crate::example_networks::{CampusNet, ChainNet, ExampleNetwork, TwinNet};
use crate::lp::*;
use crate::topology::Topology;
use crate::virtual_net::VirtualNetwork;
use crate::{Diagnostics, Warning};
use assert_approx_eq::assert_approx_eq;

fn setup(topo: &Topology, d: &mut Diagnostics) -> (VirtualNetwork, TrafficEngineering) {
    let vnet = VirtualNetwork::build(topo, d).unwrap();
    let te = TrafficEngineering::new(topo, &vnet, d).unwrap();
    (vnet, te)
}

/// Solve the program, and return `(route, load, bound, cost)` of every shared link, where `load`
/// is the capacity allocated on the link by all flows in both directions.
fn link_loads(te: &TrafficEngineering) -> Vec<(String, f64, f64, f64)> {
    let result = MicroLpSolver::new().solve(te.task()).unwrap();
    assert!(result.is_feasible());
    te.task()
        .groups()
        .iter()
        .filter(|g| g.name == "link")
        .flat_map(|g| g.constraints.iter())
        .map(|c| {
            let var = c.name.trim_start_matches("link_").to_string();
            let cost = te.network().get_by_var(&var).unwrap().cost();
            (var, c.expr.evaluate(&result.values), c.rhs, cost)
        })
        .collect()
}

#[test]
fn test_formulation() {
    let topo = ChainNet::topology(0);
    let mut d = Diagnostics::new();
    let (vnet, te) = setup(&topo, &mut d);
    assert!(d.is_empty());

    let flow = &te.flows()[0];
    assert_eq!(flow.name, "f0");
    assert_eq!(flow.src, vnet.get_id("h1").unwrap());
    assert_eq!(flow.src_router, Some(vnet.get_id("r1").unwrap()));
    assert_eq!(flow.dst_router, Some(vnet.get_id("r3").unwrap()));
    assert!(flow.routed);

    let task = te.task();
    assert_eq!(task.num_variables(), 11);
    assert_eq!(task.binaries().len(), 4);
    assert!(task.is_maximization());
    assert_eq!(task.objective().to_string(), "minR + r_f0");
    assert_eq!(task.bounds("a_f0"), Some(Bounds { lower: 0.0, upper: 10.0 }));
    assert_eq!(task.bounds("c_f0_x_r1_r2_eth0"), Some(Bounds { lower: 0.0, upper: f64::INFINITY }));

    let groups: Vec<&str> = task.groups().iter().map(|g| g.name.as_str()).collect();
    assert_eq!(
        groups,
        vec!["ratio", "maximin", "exclusion", "conservation", "allocation", "capacity", "link"]
    );
    assert_eq!(task.num_constraints(), 20);

    let constraint = |name: &str| task.constraints().find(|c| c.name == name).unwrap().clone();
    let c = constraint("flow_f0_r1");
    assert_eq!(c.rhs, -1.0);
    assert_eq!(c.expr.to_string(), "s_f0_x_r2_r1_eth0 - s_f0_x_r1_r2_eth0");
    assert_eq!(constraint("flow_f0_r2").rhs, 0.0);
    assert_eq!(constraint("flow_f0_r3").rhs, 1.0);
    assert_eq!(
        constraint("cap_f0_r3").expr.to_string(),
        "c_f0_x_r2_r3_eth0 - c_f0_x_r3_r2_eth1 - a_f0"
    );
    assert_eq!(constraint("ratio_f0").expr.to_string(), "10 r_f0 - a_f0");
    assert_eq!(constraint("link_x_r1_r2_eth0").rhs, 10.0);
    assert!(task.constraints().all(|c| c.name != "link_x_r2_r1_eth0"));
}

#[test]
fn test_zero_cost_route() {
    let topo = ChainNet::topology(1);
    let (_, te) = setup(&topo, &mut Diagnostics::new());
    assert_eq!(te.task().bounds("s_f0_x_r2_r3_eth0"), Some(Bounds { lower: 0.0, upper: 0.0 }));
    assert_eq!(te.task().bounds("s_f0_x_r1_r2_eth0"), Some(Bounds { lower: 0.0, upper: 1.0 }));
}

#[test]
fn test_no_demands() {
    let topo = ChainNet::topology(2);
    let (_, te) = setup(&topo, &mut Diagnostics::new());
    assert!(te.flows().is_empty());
    assert_eq!(te.task().num_variables(), 1);
    assert_eq!(te.task().num_constraints(), 0);
    assert_eq!(te.task().objective().to_string(), "minR");
}

#[test]
fn test_unrouted_demand() {
    let mut b = CampusNet::builder(1);
    b.add_demand("h4", "h1", 3).unwrap();
    let topo = b.build(&mut Diagnostics::new()).unwrap();
    let mut d = Diagnostics::new();
    let (_, te) = setup(&topo, &mut d);

    assert!(d.warnings().contains(&Warning::NoRouteFound("h4".to_string(), "h1".to_string())));
    assert_eq!(te.flows().len(), 3);
    assert!(!te.flows()[2].routed);
    assert!(!te.task().has_variable("r_f2"));
    assert!(te.task().has_variable("r_f1"));
}

#[test]
fn test_solve_chain() {
    let topo = ChainNet::topology(0);
    let mut d = Diagnostics::new();
    let vnet = VirtualNetwork::build(&topo, &mut d).unwrap();
    let mut solver = MicroLpSolver::new();
    let (te, plan) = optimize(&topo, &vnet, &mut solver, &mut d).unwrap();
    assert!(d.is_empty());

    assert_eq!(plan.status, SolverStatus::Optimal);
    assert!(plan.is_feasible());
    assert_approx_eq!(plan.objective, 2.0, 1e-6);
    assert_approx_eq!(plan.min_ratio, 1.0, 1e-6);

    let flow = &plan.flows[0];
    assert!(flow.routed);
    assert_approx_eq!(flow.admitted, 10.0, 1e-6);
    assert_approx_eq!(flow.ratio, 1.0, 1e-6);
    let id = |name: &str| vnet.get_id(name).unwrap();
    assert_eq!(flow.hops, vec![id("r1"), id("r2"), id("r3")]);
    let vars: Vec<&str> = flow.path.iter().map(|r| te.network().route(*r).var()).collect();
    assert_eq!(vars, vec!["x_r1_r2_eth0", "x_r2_r3_eth0"]);

    let rules = plan.shaping_rules(&te, &vnet).unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!((rules[0].node.as_str(), rules[0].interface.as_str()), ("r1", "r1-eth0"));
    assert_eq!((rules[1].node.as_str(), rules[1].interface.as_str()), ("r2", "r2-eth1"));
    assert_approx_eq!(rules[0].rate, 10.0, 1e-6);
}

#[test]
fn test_solve_infeasible() {
    let topo = ChainNet::topology(1);
    let mut d = Diagnostics::new();
    let vnet = VirtualNetwork::build(&topo, &mut d).unwrap();
    let mut solver = create_solver("MicroLP").unwrap();
    let (te, plan) = optimize(&topo, &vnet, solver.as_mut(), &mut d).unwrap();

    assert_eq!(d.warnings(), &[Warning::InfeasibleOptimization]);
    assert_eq!(plan.status, SolverStatus::Infeasible);
    assert!(!plan.is_feasible());
    assert!(plan.flows[0].path.is_empty());
    assert_eq!(plan.flows[0].admitted, 0.0);
    assert!(plan.shaping_rules(&te, &vnet).unwrap().is_empty());
}

#[test]
fn test_solve_campus() {
    let topo = CampusNet::topology(0);
    let mut d = Diagnostics::new();
    let vnet = VirtualNetwork::build(&topo, &mut d).unwrap();
    let mut solver = MicroLpSolver::new();
    let (_, plan) = optimize(&topo, &vnet, &mut solver, &mut d).unwrap();

    assert!(plan.is_feasible());
    let id = |name: &str| vnet.get_id(name).unwrap();
    for flow in plan.flows.iter() {
        assert!(flow.routed);
        assert_eq!(flow.hops.first(), Some(&id("r1")));
        assert_eq!(flow.hops.last(), Some(&id("r3")));
        assert!(flow.admitted <= flow.demand.rate as f64 + 1e-6);
        assert!(plan.min_ratio <= flow.ratio + 1e-6);
    }

    // all demands are between hosts, so no link bound is replaced
    let te = TrafficEngineering::new(&topo, &vnet, &mut d).unwrap();
    let loads = link_loads(&te);
    assert_eq!(loads.len(), 3);
    for (var, load, bound, cost) in loads {
        assert_eq!(bound, cost, "{}", var);
        assert!(load <= bound + 1e-6, "{}: {} > {}", var, load, bound);
    }
}

#[test]
fn test_opposite_demands() {
    let mut b = ChainNet::builder(2);
    b.add_demand("h1", "h2", 10).unwrap();
    b.add_demand("h2", "h1", 10).unwrap();
    let topo = b.build(&mut Diagnostics::new()).unwrap();
    let mut d = Diagnostics::new();
    let (vnet, te) = setup(&topo, &mut d);

    let loads = link_loads(&te);
    let vars: Vec<&str> = loads.iter().map(|(v, _, _, _)| v.as_str()).collect();
    assert_eq!(vars, vec!["x_r1_r2_eth0", "x_r2_r3_eth0"]);
    for (var, load, bound, _) in loads.iter() {
        assert_eq!(*bound, 1.0, "{}", var);
        assert_approx_eq!(*load, 1.0, 1e-6);
    }

    let (_, plan) = optimize(&topo, &vnet, &mut MicroLpSolver::new(), &mut d).unwrap();
    assert!(d.is_empty());
    assert_approx_eq!(plan.flows[0].admitted, 0.5, 1e-6);
    assert_approx_eq!(plan.flows[1].admitted, 0.5, 1e-6);
    assert_approx_eq!(plan.min_ratio, 0.05, 1e-6);
    assert_approx_eq!(plan.objective, 0.15, 1e-6);
}

#[test]
fn test_shared_uplink() {
    let topo = TwinNet::topology(0);
    let mut d = Diagnostics::new();
    let (vnet, te) = setup(&topo, &mut d);
    assert_eq!(te.task().constraints().find(|c| c.name == "link_x_r1_r2_eth0").unwrap().rhs, 10.0);

    let (te, plan) = optimize(&topo, &vnet, &mut MicroLpSolver::new(), &mut d).unwrap();
    assert_eq!(plan.status, SolverStatus::Optimal);
    assert_approx_eq!(plan.flows[0].admitted, 3.0, 1e-6);
    assert_approx_eq!(plan.flows[1].admitted, 4.0, 1e-6);
    assert_approx_eq!(plan.objective, 3.0, 1e-6);

    // both flows leave r1 through the same interface
    let rules = plan.shaping_rules(&te, &vnet).unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!((rules[0].node.as_str(), rules[0].interface.as_str()), ("r1", "r1-eth0"));
    assert_approx_eq!(rules[0].rate, 7.0, 1e-6);
}

#[test]
fn test_oversubscribed_uplink() {
    let topo = TwinNet::topology(1);
    let mut d = Diagnostics::new();
    let (vnet, te) = setup(&topo, &mut d);

    let loads = link_loads(&te);
    assert_eq!(loads.len(), 1);
    let (_, load, bound, cost) = &loads[0];
    assert_eq!(*bound, *cost);
    assert_approx_eq!(*load, 10.0, 1e-6);

    let (_, plan) = optimize(&topo, &vnet, &mut MicroLpSolver::new(), &mut d).unwrap();
    assert_approx_eq!(plan.flows[0].admitted, 5.0, 1e-6);
    assert_approx_eq!(plan.flows[1].admitted, 5.0, 1e-6);
    assert_approx_eq!(plan.objective, 1.25, 1e-6);
}

#[test]
fn test_link_bound_of_demand_endpoint() {
    // the demand starts at r1, so only the link touching r1 is bound by its rate
    let mut b = ChainNet::builder(2);
    b.add_demand("r1", "h2", 8).unwrap();
    let topo = b.build(&mut Diagnostics::new()).unwrap();
    let mut d = Diagnostics::new();
    let (vnet, te) = setup(&topo, &mut d);

    let loads = link_loads(&te);
    assert_eq!(loads.len(), 2);
    assert_eq!((loads[0].0.as_str(), loads[0].2), ("x_r1_r2_eth0", 8.0));
    assert_eq!((loads[1].0.as_str(), loads[1].2), ("x_r2_r3_eth0", 1.0));
    for (var, load, bound, _) in loads.iter() {
        assert!(*load <= bound + 1e-6, "{}: {} > {}", var, load, bound);
    }

    let (_, plan) = optimize(&topo, &vnet, &mut MicroLpSolver::new(), &mut d).unwrap();
    assert_approx_eq!(plan.flows[0].admitted, 1.0, 1e-6);

    // the same holds if the demand starting at the router is declared first
    let (_, te) = setup(&TwinNet::topology(2), &mut Diagnostics::new());
    assert_eq!(te.task().constraints().find(|c| c.name == "link_x_r1_r2_eth0").unwrap().rhs, 8.0);
}

#[test]
fn test_unknown_solver() {
    assert_eq!(
        create_solver("cplex").err(),
        Some(SolverError::Unavailable("cplex".to_string()))
    );
}

#[test]
fn test_infeasible_result() {
    let mut task = LpTask::new();
    task.add_variable("x", 2.0, 5.0).unwrap();
    task.add_variable("y", f64::NEG_INFINITY, -1.0).unwrap();
    task.set_objective("obj", LinearExpr::new().term(1.0, "x"), true).unwrap();
    let result = SolverResult::infeasible(&task);
    assert_eq!(result.value("x"), Some(2.0));
    assert_eq!(result.value("y"), Some(-1.0));
    assert_eq!(result.objective, 2.0);
    assert!(!result.is_feasible());
}
