//! Presentation Layer
//!
//! HTTP handlers, DTOs and caller authentication for the API.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
