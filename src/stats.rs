pub mod distribution;
pub mod effect_size;
pub mod kruskal;
pub mod summary;
