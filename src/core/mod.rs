pub mod component;
pub mod converters;
pub mod distribution;
pub mod material_properties;
pub mod storage;
pub mod systems;
pub mod units;
pub mod water_heat_demand;
