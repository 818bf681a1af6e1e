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

//! Route propagation between directly adjacent virtual routers.
//!
//! Each router relays the subnets it knows to every router it is linked to, if that router does
//! not know them yet. The relayed routes point back to the relaying router, using every
//! registered link between both routers. The relayed routes are not registered.

use super::*;

use itertools::Itertools;
use log::*;

impl VirtualNetwork {
    /// Perform a single relay hop for every router, in creation order. Returns the number of
    /// routes added.
    pub fn propagate_routes_once(&mut self) -> Result<usize, VirtualNetworkError> {
        let routers: Vec<VirtualElementId> = self.routers().map(|r| r.id()).collect();
        let mut added = 0;

        for src in routers {
            let targets: Vec<VirtualElementId> = self
                .element(src)?
                .registered_routes()
                .map(|r| r.to)
                .filter(|t| *t != src)
                .unique()
                .collect();

            for target in targets {
                if !self.element(target)?.is_router() {
                    continue;
                }
                let known: Vec<Ipv4Net> =
                    self.element(src)?.routes().iter().map(|r| r.subnet).unique().collect();
                let target_elem = self.element(target)?;
                let missing: Vec<Ipv4Net> =
                    known.into_iter().filter(|s| !target_elem.knows_subnet(s)).collect();
                if missing.is_empty() {
                    continue;
                }
                let back: Vec<Route> =
                    target_elem.registered_routes().filter(|r| r.to == src).copied().collect();

                let target_elem = self.element_mut(target)?;
                for subnet in missing {
                    for back_route in back.iter() {
                        let route = Route {
                            subnet,
                            via: back_route.via,
                            to: src,
                            dst: back_route.dst,
                            registered: false,
                        };
                        if target_elem.add_route(route) {
                            trace!("propagated {} to {}", subnet, target_elem.name());
                            added += 1;
                        }
                    }
                }
            }
        }

        debug!("Route propagation added {} routes", added);
        Ok(added)
    }

    /// Repeat the relay hop until no route is added anymore. Returns the number of routes added
    /// in total. Calling it again afterwards adds nothing.
    pub fn propagate_routes(&mut self) -> Result<usize, VirtualNetworkError> {
        let mut total = 0;
        loop {
            match self.propagate_routes_once()? {
                0 => break,
                n => total += n,
            }
        }
        Ok(total)
    }
}
