// crates/cf_physics/src/models/mod.rs

//! 参考物理模型

pub mod diffusion;

pub use diffusion::{DiffusionElement, DiffusionModel, DiffusionNode, DEFAULT_DIFFUSION_CFL};
