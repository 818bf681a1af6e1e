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

//! Backend rendering the virtual network as a shell script.

use crate::traffic_control::TrafficControlSettings;
use netvirt::backend::{BackendError, LinkEnd, VirtualizationBackend};

use ipnet::Ipv4Net;
use log::*;
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;

/// Name of the bridge created inside every switch namespace
const BRIDGE: &str = "br0";

#[derive(Debug, Default)]
struct NodeState {
    interfaces: HashSet<String>,
    shaped: HashSet<String>,
    bridge: bool,
}

/// # Script Backend
///
/// Collects the commands needed to instantiate the virtual network on a Linux host. Each request
/// is checked against the nodes and interfaces created so far.
#[derive(Debug, Default)]
pub struct ScriptBackend {
    settings: TrafficControlSettings,
    nodes: Vec<String>,
    state: HashMap<String, NodeState>,
    commands: Vec<String>,
}

impl ScriptBackend {
    /// Create a backend with custom traffic control settings
    pub fn with_settings(settings: TrafficControlSettings) -> Self {
        Self { settings, ..Default::default() }
    }

    /// All commands, in the order they need to be executed
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Setup script. It aborts on the first failing command.
    pub fn script(&self) -> String {
        let mut s = String::from("#!/bin/sh\n# generated by netvirt\nset -e\n\n");
        for c in self.commands.iter() {
            s.push_str(c);
            s.push('\n');
        }
        s
    }

    /// Script removing all namespaces again. Deleting a namespace removes all of its
    /// interfaces.
    pub fn teardown_script(&self) -> String {
        let mut s = String::from("#!/bin/sh\n# generated by netvirt\n\n");
        for n in self.nodes.iter() {
            s.push_str(&format!("ip netns del {}\n", n));
        }
        s
    }

    fn node(&mut self, name: &str) -> Result<&mut NodeState, BackendError> {
        self.state.get_mut(name).ok_or_else(|| BackendError::UnknownNode(name.to_string()))
    }

    fn check_interface(&mut self, node: &str, interface: &str) -> Result<(), BackendError> {
        if self.node(node)?.interfaces.contains(interface) {
            Ok(())
        } else {
            Err(BackendError::UnknownInterface(node.to_string(), interface.to_string()))
        }
    }

    fn exec(&mut self, node: &str, cmd: impl AsRef<str>) {
        self.commands.push(format!("ip netns exec {} {}", node, cmd.as_ref()));
    }

    /// Bring up one side of a link: assign the address, or attach the port to the bridge of the
    /// switch if there is no address.
    fn setup_link_end(&mut self, end: &LinkEnd) -> Result<(), BackendError> {
        match end.address.as_ref() {
            Some(addr) => {
                self.exec(&end.node, format!("ip addr add {} dev {}", addr, end.interface))
            }
            None => {
                if !self.node(&end.node)?.bridge {
                    self.node(&end.node)?.bridge = true;
                    self.exec(&end.node, format!("ip link add {} type bridge", BRIDGE));
                    self.exec(&end.node, format!("ip link set {} up", BRIDGE));
                }
                self.exec(&end.node, format!("ip link set {} master {}", end.interface, BRIDGE));
            }
        }
        self.exec(&end.node, format!("ip link set {} up", end.interface));
        Ok(())
    }
}

impl VirtualizationBackend for ScriptBackend {
    fn add_node(&mut self, name: &str, forwarding: bool) -> Result<(), BackendError> {
        if self.state.contains_key(name) {
            return Err(BackendError::DuplicateNode(name.to_string()));
        }
        debug!("script: node {}", name);
        self.state.insert(name.to_string(), NodeState::default());
        self.nodes.push(name.to_string());
        self.commands.push(format!("ip netns add {}", name));
        self.exec(name, "ip link set lo up");
        let forward = if forwarding { 1 } else { 0 };
        self.exec(name, format!("sysctl -q -w net.ipv4.ip_forward={}", forward));
        Ok(())
    }

    fn add_link(&mut self, a: &LinkEnd, b: &LinkEnd) -> Result<(), BackendError> {
        for end in [a, b].iter() {
            if !self.node(&end.node)?.interfaces.insert(end.interface.clone()) {
                return Err(BackendError::Failed(format!(
                    "interface {} already exists on {}",
                    end.interface, end.node
                )));
            }
        }
        debug!("script: link {} <-> {}", a.interface, b.interface);
        self.commands.push(format!(
            "ip link add {} netns {} type veth peer name {} netns {}",
            a.interface, a.node, b.interface, b.node
        ));
        self.setup_link_end(a)?;
        self.setup_link_end(b)
    }

    fn add_interface_down(
        &mut self,
        node: &str,
        interface: &str,
        address: &str,
    ) -> Result<(), BackendError> {
        if !self.node(node)?.interfaces.insert(interface.to_string()) {
            return Err(BackendError::Failed(format!(
                "interface {} already exists on {}",
                interface, node
            )));
        }
        self.exec(node, format!("ip link add {} type dummy", interface));
        self.exec(node, format!("ip addr add {} dev {}", address, interface));
        self.exec(node, format!("ip link set {} down", interface));
        Ok(())
    }

    fn set_default_gateway(
        &mut self,
        node: &str,
        gateway: Ipv4Addr,
        interface: &str,
    ) -> Result<(), BackendError> {
        self.check_interface(node, interface)?;
        self.exec(node, format!("ip route add default via {} dev {}", gateway, interface));
        Ok(())
    }

    fn add_route(
        &mut self,
        node: &str,
        subnet: Ipv4Net,
        next_hop: Ipv4Addr,
        interface: &str,
    ) -> Result<(), BackendError> {
        self.check_interface(node, interface)?;
        self.exec(node, format!("ip route add {} via {} dev {}", subnet, next_hop, interface));
        Ok(())
    }

    fn add_rate_limit(
        &mut self,
        node: &str,
        interface: &str,
        rate: f64,
    ) -> Result<(), BackendError> {
        self.check_interface(node, interface)?;
        if !rate.is_finite() || rate < 0.0 {
            return Err(BackendError::Failed(format!("invalid rate {} on {}", rate, interface)));
        }
        // a second root qdisc on the same device would abort the script
        if !self.node(node)?.shaped.insert(interface.to_string()) {
            return Err(BackendError::Failed(format!(
                "{} of {} is already rate limited",
                interface, node
            )));
        }
        let tbf = self.settings.tbf(rate);
        self.exec(node, format!("tc qdisc add dev {} root {}", interface, tbf));
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use netvirt::backend::virtualize;
    use netvirt::example_networks::{CampusNet, ChainNet, ExampleNetwork, TwinNet};
    use netvirt::lp::{create_solver, optimize};
    use netvirt::virtual_net::VirtualNetwork;
    use netvirt::Diagnostics;

    fn end(node: &str, interface: &str, address: Option<&str>) -> LinkEnd {
        LinkEnd {
            node: node.to_string(),
            interface: interface.to_string(),
            address: address.map(String::from),
        }
    }

    #[test]
    fn node_and_link() {
        let mut b = ScriptBackend::default();
        b.add_node("r1", true).unwrap();
        b.add_node("h1", false).unwrap();
        let r1 = end("r1", "r1-eth0", Some("10.0.0.1/24"));
        b.add_link(&r1, &end("h1", "h1-eth0", Some("10.0.0.2/24"))).unwrap();
        assert_eq!(
            b.commands(),
            &[
                "ip netns add r1",
                "ip netns exec r1 ip link set lo up",
                "ip netns exec r1 sysctl -q -w net.ipv4.ip_forward=1",
                "ip netns add h1",
                "ip netns exec h1 ip link set lo up",
                "ip netns exec h1 sysctl -q -w net.ipv4.ip_forward=0",
                "ip link add r1-eth0 netns r1 type veth peer name h1-eth0 netns h1",
                "ip netns exec r1 ip addr add 10.0.0.1/24 dev r1-eth0",
                "ip netns exec r1 ip link set r1-eth0 up",
                "ip netns exec h1 ip addr add 10.0.0.2/24 dev h1-eth0",
                "ip netns exec h1 ip link set h1-eth0 up",
            ]
        );
        let teardown = b.teardown_script();
        assert_eq!(teardown.lines().filter(|l| l.starts_with("ip netns del")).count(), 2);
    }

    #[test]
    fn switch_ports() {
        let mut b = ScriptBackend::default();
        for (n, f) in [("h1", false), ("h2", false), ("s0", false)].iter() {
            b.add_node(n, *f).unwrap();
        }
        let port = |name: &str| end("s0", name, None);
        b.add_link(&end("h1", "h1-eth0", Some("10.0.0.1/24")), &port("s0-eth0")).unwrap();
        b.add_link(&end("h2", "h2-eth0", Some("10.0.0.2/24")), &port("s0-eth1")).unwrap();
        let bridges = b.commands().iter().filter(|c| c.ends_with("type bridge")).count();
        assert_eq!(bridges, 1);
        let master = "ip netns exec s0 ip link set s0-eth1 master br0";
        assert!(b.commands().iter().any(|c| c == master));
    }

    #[test]
    fn request_errors() {
        let mut b = ScriptBackend::default();
        b.add_node("r1", true).unwrap();
        assert_eq!(b.add_node("r1", true), Err(BackendError::DuplicateNode("r1".to_string())));
        assert_eq!(
            b.add_link(&end("r1", "r1-eth0", None), &end("r9", "r9-eth0", None)),
            Err(BackendError::UnknownNode("r9".to_string()))
        );
        assert_eq!(
            b.set_default_gateway("r1", "10.0.0.2".parse().unwrap(), "r1-eth7"),
            Err(BackendError::UnknownInterface("r1".to_string(), "r1-eth7".to_string()))
        );
        b.add_interface_down("r1", "r1-eth3", "10.3.0.1/24").unwrap();
        assert!(b.add_interface_down("r1", "r1-eth3", "10.3.0.1/24").is_err());
        assert!(b.add_rate_limit("r1", "r1-eth3", f64::NAN).is_err());
        b.add_rate_limit("r1", "r1-eth3", 2.0).unwrap();
        assert_eq!(
            b.add_rate_limit("r1", "r1-eth3", 3.0),
            Err(BackendError::Failed("r1-eth3 of r1 is already rate limited".to_string()))
        );
        assert_eq!(b.commands().iter().filter(|c| c.contains(" tc qdisc ")).count(), 1);
    }

    #[test]
    fn chain_script() {
        let topo = ChainNet::topology(0);
        let mut d = Diagnostics::new();
        let vnet = VirtualNetwork::build(&topo, &mut d).unwrap();
        let mut solver = create_solver("microlp").unwrap();
        let (te, plan) = optimize(&topo, &vnet, solver.as_mut(), &mut d).unwrap();
        let rules = plan.shaping_rules(&te, &vnet).unwrap();

        let mut b = ScriptBackend::default();
        virtualize(&topo, &vnet, &rules, &mut b, &mut d).unwrap();
        let script = b.script();
        assert!(script.starts_with("#!/bin/sh"));
        let expected = [
            "ip netns exec r1 ip route add 10.3.1.0/24 via 10.0.12.2 dev r1-eth0\n",
            "ip netns exec h1 ip route add default via 10.1.1.1 dev h1-eth0\n",
            "ip netns exec r1 tc qdisc add dev r1-eth0 root tbf rate 10000kbit",
        ];
        for line in expected.iter() {
            assert!(script.contains(line), "missing: {}", line);
        }
        assert_eq!(b.commands().iter().filter(|c| c.contains(" tc qdisc ")).count(), 2);
    }

    #[test]
    fn shared_uplink_script() {
        let topo = TwinNet::topology(0);
        let mut d = Diagnostics::new();
        let vnet = VirtualNetwork::build(&topo, &mut d).unwrap();
        let mut solver = create_solver("microlp").unwrap();
        let (te, plan) = optimize(&topo, &vnet, solver.as_mut(), &mut d).unwrap();
        let rules = plan.shaping_rules(&te, &vnet).unwrap();

        let mut b = ScriptBackend::default();
        virtualize(&topo, &vnet, &rules, &mut b, &mut d).unwrap();
        let shaping: Vec<&String> =
            b.commands().iter().filter(|c| c.contains(" tc qdisc ")).collect();
        assert_eq!(shaping.len(), 1);
        assert!(shaping[0]
            .starts_with("ip netns exec r1 tc qdisc add dev r1-eth0 root tbf rate 7000kbit "));
    }

    #[test]
    fn campus_script() {
        let topo = CampusNet::topology(1);
        let mut d = Diagnostics::new();
        let vnet = VirtualNetwork::build(&topo, &mut d).unwrap();
        let mut b = ScriptBackend::default();
        virtualize(&topo, &vnet, &[], &mut b, &mut d).unwrap();
        let expected = maplit::hashset! {
            "ip netns exec r2 ip link add r2-eth9 type dummy",
            "ip netns exec r2 ip link set r2-eth9 down",
            "ip netns exec h4 ip link set h4-eth0 down",
        };
        for c in expected {
            assert!(b.commands().iter().any(|x| x == c), "missing: {}", c);
        }
        assert_eq!(b.commands().iter().filter(|c| c.ends_with("type bridge")).count(), 1);
    }
}
