pub mod analysis;
pub mod frontends;
