/// State management module
///
/// This module handles all workflow state, including:
/// - Shared data structures (data.rs)
/// - The upload/compress/download controller (controller.rs)

pub mod controller;
pub mod data;
