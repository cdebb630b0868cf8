pub mod ali;
pub mod architecture;
pub mod constants;
pub mod data;
pub mod infogan;
pub mod losses;
pub mod sampling;
pub mod training;
