//! Ports: trait seams between the core and its collaborators.

pub mod outbound;
