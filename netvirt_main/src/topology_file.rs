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

//! Loading and validation of the YAML topology file.
//!
//! ```yaml
//! routers:
//!   r1:
//!     eth0: { address: 10.0.0.1, mask: 255.255.255.0, cost: 10 }
//! hosts:
//!   h1:
//!     eth0: { address: 10.0.0.2, mask: 24 }
//! demands:
//!   - { source: h1, destination: r1, rate: 10 }
//! ```
//!
//! Elements and interfaces keep the order in which they are declared.

use netvirt::topology::{Interface, LinkCost, TopologyBuilder, TopologyError, DEFAULT_COST};

use ipnet::Ipv4Net;
use log::*;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::convert::TryFrom;
use std::net::Ipv4Addr;
use std::path::Path;
use thiserror::Error;

/// Errors while reading the topology file. They abort before anything is virtualized.
#[derive(Debug, Error)]
pub enum FileError {
    /// The file cannot be read
    #[error("Cannot read the topology file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid YAML, or does not have the expected structure
    #[error("Cannot parse the topology file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// A mandatory section is missing or empty
    #[error("Field '{0}' is missing or empty")]
    EmptyField(&'static str),
    /// An element name is invalid
    #[error("Invalid element name '{0}': {1}")]
    InvalidName(String, &'static str),
    /// An element has no interface section
    #[error("Could not find any interfaces for {0}")]
    NoInterfaces(String),
    /// An interface name does not have the form `eth<N>`
    #[error("Invalid interface name '{1}' on {0}: must be eth<N>")]
    InvalidInterfaceName(String, String),
    /// The address is not a valid IPv4 address
    #[error("Invalid address '{2}' on {0} {1}")]
    InvalidAddress(String, String, String),
    /// The mask is neither a contiguous netmask nor a prefix length
    #[error("Invalid mask '{2}' on {0} {1}")]
    InvalidMask(String, String, String),
    /// The cost is negative or too large
    #[error("Invalid cost {2} on {0} {1}: must be a non-negative integer")]
    InvalidCost(String, String, i64),
    /// The rate of a demand is not strictly positive
    #[error("Invalid rate {2} for demand {0} -> {1}")]
    InvalidRate(String, String, i64),
    /// The elements or demands do not form a valid topology
    #[error("{0}")]
    Topology(#[from] TopologyError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFile {
    #[serde(default)]
    routers: Option<Mapping>,
    #[serde(default)]
    hosts: Option<Mapping>,
    #[serde(default)]
    demands: Option<Vec<RawDemand>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawInterface {
    address: String,
    mask: RawMask,
    #[serde(default)]
    cost: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawMask {
    Prefix(u8),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDemand {
    source: String,
    destination: String,
    rate: i64,
}

/// Router or host, as declared in the file
#[derive(Debug, Clone, PartialEq)]
pub struct ElementEntry {
    /// Name of the element
    pub name: String,
    /// Interfaces, in declaration order
    pub interfaces: Vec<Interface>,
}

/// Demand, as declared in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemandEntry {
    /// Name of the source element
    pub source: String,
    /// Name of the destination element
    pub destination: String,
    /// Requested rate in Mbit/s
    pub rate: u32,
}

/// Validated content of a topology file
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyFile {
    /// All routers
    pub routers: Vec<ElementEntry>,
    /// All hosts
    pub hosts: Vec<ElementEntry>,
    /// All demands
    pub demands: Vec<DemandEntry>,
}

impl TopologyFile {
    /// Read and validate the file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FileError> {
        let path = path.as_ref();
        info!("Reading the topology from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate the content of a file
    pub fn from_yaml(content: &str) -> Result<Self, FileError> {
        let raw: RawFile = serde_yaml::from_str(content)?;
        let routers =
            raw.routers.filter(|m| !m.is_empty()).ok_or(FileError::EmptyField("routers"))?;
        let hosts = raw.hosts.filter(|m| !m.is_empty()).ok_or(FileError::EmptyField("hosts"))?;

        let routers = parse_elements(&routers, true)?;
        let hosts = parse_elements(&hosts, false)?;
        let demands = raw
            .demands
            .unwrap_or_default()
            .into_iter()
            .map(|d| match u32::try_from(d.rate) {
                Ok(rate) if rate > 0 => {
                    Ok(DemandEntry { source: d.source, destination: d.destination, rate })
                }
                _ => Err(FileError::InvalidRate(d.source, d.destination, d.rate)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Topology file: {} routers, {} hosts, {} demands",
            routers.len(),
            hosts.len(),
            demands.len()
        );
        Ok(Self { routers, hosts, demands })
    }

    /// Feed all elements and demands into a topology builder. Duplicate names and unknown demand
    /// endpoints are reported here.
    pub fn builder(&self) -> Result<TopologyBuilder, FileError> {
        let mut b = TopologyBuilder::new();
        for r in self.routers.iter() {
            b.add_router(r.name.clone(), r.interfaces.clone())?;
        }
        for h in self.hosts.iter() {
            b.add_host(h.name.clone(), h.interfaces.clone())?;
        }
        for d in self.demands.iter() {
            b.add_demand(&d.source, &d.destination, d.rate)?;
        }
        Ok(b)
    }
}

fn parse_elements(map: &Mapping, router: bool) -> Result<Vec<ElementEntry>, FileError> {
    let mut elements = Vec::with_capacity(map.len());
    for (key, value) in map.iter() {
        let name = key
            .as_str()
            .ok_or_else(|| FileError::InvalidName(format!("{:?}", key), "must be a string"))?;
        validate_element_name(name)?;
        if value.is_null() {
            return Err(FileError::NoInterfaces(name.to_string()));
        }
        let ifaces: Mapping = serde_yaml::from_value(value.clone())?;
        let interfaces = ifaces
            .iter()
            .map(|(k, v)| parse_interface(name, k, v, router))
            .collect::<Result<Vec<_>, _>>()?;
        elements.push(ElementEntry { name: name.to_string(), interfaces });
    }
    Ok(elements)
}

fn parse_interface(
    element: &str,
    key: &Value,
    value: &Value,
    router: bool,
) -> Result<Interface, FileError> {
    let name = match key.as_str() {
        Some(n) if is_interface_name(n) => n,
        _ => {
            return Err(FileError::InvalidInterfaceName(
                element.to_string(),
                key.as_str().map(String::from).unwrap_or_else(|| format!("{:?}", key)),
            ))
        }
    };
    let raw: RawInterface = serde_yaml::from_value(value.clone())?;

    let ip: Ipv4Addr = raw.address.parse().map_err(|_| {
        FileError::InvalidAddress(element.to_string(), name.to_string(), raw.address.clone())
    })?;
    let mask = parse_mask(&raw.mask).ok_or_else(|| {
        let text = match &raw.mask {
            RawMask::Prefix(len) => len.to_string(),
            RawMask::Text(s) => s.clone(),
        };
        FileError::InvalidMask(element.to_string(), name.to_string(), text)
    })?;

    if !router {
        if raw.cost.is_some() {
            warn!("Cost of host interface {} {} is ignored", element, name);
        }
        return Ok(Interface::new(name, ip, mask)?);
    }
    let cost = raw.cost.unwrap_or_else(|| i64::from(DEFAULT_COST));
    let cost = LinkCost::try_from(cost)
        .map_err(|_| FileError::InvalidCost(element.to_string(), name.to_string(), cost))?;
    Ok(Interface::with_cost(name, ip, mask, cost)?)
}

/// Names must be non-empty and alphanumeric. `s<N>` is reserved for synthesized switches.
fn validate_element_name(name: &str) -> Result<(), FileError> {
    let invalid = |reason| Err(FileError::InvalidName(name.to_string(), reason));
    if name.is_empty() {
        return invalid("the name cannot be empty");
    }
    if !name.chars().all(char::is_alphanumeric) {
        return invalid("the name must be alphanumeric");
    }
    match name.strip_prefix('s') {
        Some(rest) if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) => {
            invalid("names matching s[0-9]+ are reserved for switches")
        }
        _ => Ok(()),
    }
}

fn is_interface_name(name: &str) -> bool {
    match name.strip_prefix("eth") {
        Some(n) => !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// Either a prefix length or a contiguous netmask
fn parse_mask(mask: &RawMask) -> Option<Ipv4Addr> {
    let from_prefix = |len: u8| Ipv4Net::new(Ipv4Addr::UNSPECIFIED, len).ok().map(|n| n.netmask());
    match mask {
        RawMask::Prefix(len) => from_prefix(*len),
        RawMask::Text(s) => match s.parse::<u8>() {
            Ok(len) => from_prefix(len),
            Err(_) => {
                let m: Ipv4Addr = s.parse().ok()?;
                Ipv4Net::with_netmask(Ipv4Addr::UNSPECIFIED, m).ok().map(|_| m)
            }
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use netvirt::example_networks::{CampusNet, ChainNet, ExampleNetwork};
    use netvirt::Diagnostics;

    const CHAIN: &str = include_str!("../topologies/chain.yaml");
    const CAMPUS: &str = include_str!("../topologies/campus.yaml");

    fn err(content: &str) -> FileError {
        let topo = TopologyFile::from_yaml(content)
            .and_then(|f| Ok(f.builder()?.build(&mut Diagnostics::new())?));
        match topo {
            Ok(_) => panic!("expected an error"),
            Err(e) => e,
        }
    }

    fn with_router(name: &str, iface: &str) -> String {
        format!(
            "routers:\n  {}:\n    {}\nhosts:\n  h1:\n    eth0: {{ address: 10.0.0.2, mask: 24 }}\n",
            name, iface
        )
    }

    #[test]
    fn prepared_files() {
        let mut d = Diagnostics::new();
        let load = |s: &str, d: &mut Diagnostics| {
            TopologyFile::from_yaml(s).unwrap().builder().unwrap().build(d).unwrap()
        };
        let chain = load(CHAIN, &mut d);
        assert_eq!(chain, ChainNet::topology(0));
        let campus = load(CAMPUS, &mut d);
        assert_eq!(campus, CampusNet::topology(0));
        assert!(d.is_empty());
    }

    #[test]
    fn declaration_order() {
        let f = TopologyFile::from_yaml(&with_router(
            "r1",
            "{ eth10: { address: 10.0.0.1, mask: 24 }, eth2: { address: 10.1.0.1, mask: 24 } }",
        ))
        .unwrap();
        let names: Vec<&str> = f.routers[0].interfaces.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["eth10", "eth2"]);
        assert_eq!(f.routers[0].interfaces[0].cost(), DEFAULT_COST);
        assert!(f.demands.is_empty());
    }

    #[test]
    fn element_names() {
        let iface = "{ eth0: { address: 10.0.0.1, mask: 24 } }";
        assert!(TopologyFile::from_yaml(&with_router("s", iface)).is_ok());
        assert!(TopologyFile::from_yaml(&with_router("sw1", iface)).is_ok());
        let invalid = |name: &str| match err(&with_router(name, iface)) {
            FileError::InvalidName(n, _) => n == name,
            _ => false,
        };
        assert!(invalid("s12"));
        assert!(invalid("r-1"));
        assert!(matches!(err(&with_router("\"\"", iface)), FileError::InvalidName(_, _)));
        assert!(matches!(
            err(&with_router("h1", iface)),
            FileError::Topology(TopologyError::DuplicateName(_))
        ));
        assert!(matches!(err(&with_router("r1", "")), FileError::NoInterfaces(n) if n == "r1"));
    }

    #[test]
    fn interface_fields() {
        let case = |iface: &str| err(&with_router("r1", iface));
        assert!(matches!(
            case("{ wlan0: { address: 10.0.0.1, mask: 24 } }"),
            FileError::InvalidInterfaceName(_, n) if n == "wlan0"
        ));
        assert!(matches!(
            case("{ eth: { address: 10.0.0.1, mask: 24 } }"),
            FileError::InvalidInterfaceName(_, _)
        ));
        assert!(matches!(
            case("{ eth0: { address: 10.0.0.300, mask: 24 } }"),
            FileError::InvalidAddress(_, _, a) if a == "10.0.0.300"
        ));
        assert!(matches!(
            case("{ eth0: { address: 10.0.0.1, mask: 255.0.255.0 } }"),
            FileError::InvalidMask(_, _, _)
        ));
        assert!(matches!(
            case("{ eth0: { address: 10.0.0.1, mask: 33 } }"),
            FileError::InvalidMask(_, _, m) if m == "33"
        ));
        assert!(matches!(
            case("{ eth0: { address: 10.0.0.1, mask: 24, cost: -3 } }"),
            FileError::InvalidCost(_, _, -3)
        ));
        assert!(matches!(
            case("{ eth0: { address: 10.0.0.1, mask: 24, colour: red } }"),
            FileError::Yaml(_)
        ));
        assert!(matches!(
            case("{ eth0: { address: 10.0.0.2, mask: 24 } }"),
            FileError::Topology(TopologyError::DuplicateIp(_))
        ));
    }

    #[test]
    fn sections() {
        assert!(matches!(err("hosts:\n  h1: {}\n"), FileError::EmptyField("routers")));
        assert!(matches!(err("routers:\n  r1: {}\nhosts: {}\n"), FileError::EmptyField("hosts")));
        assert!(matches!(err("routers: [1, 2]\n"), FileError::Yaml(_)));
    }

    #[test]
    fn demands() {
        let base = with_router("r1", "{ eth0: { address: 10.0.0.1, mask: 24 } }");
        let f = TopologyFile::from_yaml(&format!(
            "{}demands:\n  - {{ source: h1, destination: r1, rate: 7 }}\n",
            base
        ))
        .unwrap();
        assert_eq!(
            f.demands,
            vec![DemandEntry { source: "h1".to_string(), destination: "r1".to_string(), rate: 7 }]
        );

        let demand = |d: &str| err(&format!("{}demands:\n  - {}\n", base, d));
        assert!(matches!(
            demand("{ source: h1, destination: r1, rate: 0 }"),
            FileError::InvalidRate(_, _, 0)
        ));
        assert!(matches!(
            demand("{ source: h1, destination: r1, rate: -2 }"),
            FileError::InvalidRate(_, _, -2)
        ));
        assert!(matches!(
            demand("{ source: h1, destination: h9, rate: 2 }"),
            FileError::Topology(TopologyError::ElementNameNotFound(n)) if n == "h9"
        ));
        assert!(matches!(
            demand("{ source: h1, destination: h1, rate: 2 }"),
            FileError::Topology(TopologyError::DemandToItself(_))
        ));
    }
}
