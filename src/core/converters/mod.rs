pub mod heat_pump;
pub mod heater;
pub mod photovoltaic;
pub mod solar_collector;
