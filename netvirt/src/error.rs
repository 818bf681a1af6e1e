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

//! Module containing all error types

use crate::backend::BackendError;
use crate::lp::{LpError, SolverError};
use crate::topology::TopologyError;
use crate::virtual_net::VirtualNetworkError;
use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    /// The topology or the demands are malformed
    #[error("Topology Error: {0}")]
    TopologyError(#[from] TopologyError),
    /// An element or a route of the virtual network is missing. This is a logic error.
    #[error("Virtual Network Error: {0}")]
    VirtualNetworkError(#[from] VirtualNetworkError),
    /// Error while building the linear program
    #[error("LP Error: {0}")]
    LpError(#[from] LpError),
    /// The solver backend is unavailable, or failed
    #[error("Solver Error: {0}")]
    SolverError(#[from] SolverError),
    /// The virtualization backend refused a request
    #[error("Backend Error: {0}")]
    BackendError(#[from] BackendError),
}
