//! Core use-case services.
//!
//! # Responsibility
//! - Layer the review state machine over the asset repository.
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep HTTP/CLI layers decoupled from storage details.

pub mod review_service;
pub mod review_workflow;
