//! This module provides a two volume stratified thermal storage tank, used both as a solar
//! thermal tank (heated through an in-tank coil) and as a heat pump tank.
//!
//! The tank is split into an upper volume, from which hot water is tapped, and a lower volume,
//! which is replenished with feed water. Each hour is updated with an explicit forward Euler
//! step using the start of hour temperatures only.
use crate::core::component::{
    ComponentKind, ComponentParameters, ComponentStepError, HourlyStep, ReportedOutputs,
};
use crate::core::distribution::piping::{Piping, PipingDrivers};
use crate::core::material_properties::{MaterialProperties, WATER};
use crate::core::storage::{cylinder_dimensions, thermal_loss, TemperatureLimits};
use crate::core::units::{round_by_precision, SECONDS_PER_HOUR};
use crate::errors::InvalidInputError;
use std::f64::consts::PI;
use tracing::warn;

const TAP_BALANCE_TOLERANCE: f64 = 0.01;

#[derive(Clone, Debug)]
pub struct ThermalTank {
    kind: ComponentKind,
    volume: f64,
    volume_upper: f64,
    volume_lower: f64,
    area_upper: f64,
    area_lower: f64,
    u_value: f64,
    approach_temp_difference: f64,
    max_temp: f64,
    coil_efficiency: f64,
    overcool_warning_temp_difference: f64,
    limits: TemperatureLimits,
    contents: MaterialProperties,
    piping: Piping,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TankState {
    pub temp_upper: f64,
    pub temp_lower: f64,
}

impl TankState {
    /// Uniform tank at the given temperature, held at or above the freeze protection floor.
    pub fn uniform(temp: f64, limits: &TemperatureLimits) -> Self {
        let temp = temp.max(limits.freeze_protection);
        Self {
            temp_upper: temp,
            temp_lower: temp,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TankDrivers {
    /// air temperature around the tank and piping, in K
    pub temp_ambient: f64,
    /// temperature of water replenishing the tapped volume, in K
    pub temp_feed: f64,
    /// hot water volume drawn at the draw setpoint during the hour, in m3
    pub volume_draw: f64,
    /// largest hourly draw of the year, in m3
    pub max_volume_draw: f64,
    /// heat passed to the tank (collector loop or heat pump), in W
    pub heat_in: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TankOutputs {
    pub heat_in_net: f64,
    pub loss_upper: f64,
    pub loss_lower: f64,
    pub demand: f64,
    pub demand_with_dist_loss: f64,
    pub delivered: f64,
    /// unmet by the tank, including the share that could not be tapped
    pub unmet: f64,
    pub demand_balance: f64,
    pub dumped: f64,
    pub overcool: f64,
    pub temp_upper: f64,
    pub temp_lower: f64,
    pub dist_temp_drop: f64,
    pub dist_loss: f64,
    pub flow_on_fraction: f64,
    /// temperature of the fluid returned to the collector loop
    pub temp_coil_out: f64,
}

impl ReportedOutputs for TankOutputs {
    fn named_values(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("tank net heat gain", self.heat_in_net),
            ("upper volume heat loss", self.loss_upper),
            ("lower volume heat loss", self.loss_lower),
            ("demand", self.demand),
            ("demand with distribution loss", self.demand_with_dist_loss),
            ("tank delivered heat", self.delivered),
            ("tank unmet heat", self.unmet),
            ("demand balance", self.demand_balance),
            ("dumped heat", self.dumped),
            ("overcool heat", self.overcool),
            ("upper volume temperature", self.temp_upper),
            ("lower volume temperature", self.temp_lower),
            ("distribution temperature drop", self.dist_temp_drop),
            ("distribution heat loss", self.dist_loss),
            ("flow on fraction", self.flow_on_fraction),
            ("coil outlet temperature", self.temp_coil_out),
        ]
    }
}

/// Heat drawn from the top of an infinitely large tank, before the tank balance is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tap {
    pub volume: f64,
    pub demand: f64,
    pub demand_with_dist_loss: f64,
    pub heat_rate: f64,
    pub unmet: f64,
}

/// Result of the energy balance of the two tank volumes over one hour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TankBalance {
    pub temp_upper: f64,
    pub temp_lower: f64,
    pub net_heat_rate: f64,
    pub delivered: f64,
    pub unmet: f64,
    pub dumped: f64,
    pub overcool: f64,
}

impl ThermalTank {
    /// Arguments:
    /// * `kind` - `SolarThermalTank` or `HeatPumpTank`
    /// * `volume` - tank volume, in m3
    /// * `params` - tank performance parameters
    /// * `limits` - draw setpoint and freeze protection floor for the run
    /// * `piping` - distribution piping served by the tank
    pub fn from_parameters(
        kind: ComponentKind,
        volume: f64,
        params: &ComponentParameters,
        limits: TemperatureLimits,
        piping: Piping,
    ) -> Result<Self, InvalidInputError> {
        if !matches!(
            kind,
            ComponentKind::SolarThermalTank | ComponentKind::HeatPumpTank
        ) {
            return Err(InvalidInputError::InvalidConfiguration(format!(
                "{kind} is not a thermal storage tank"
            )));
        }
        let upper_fraction = params.get(kind, "upper_volume_fraction")?;
        let height_to_radius = params.get(kind, "height_to_radius")?;

        let (radius, height) = cylinder_dimensions(volume, height_to_radius);
        let height_upper = upper_fraction * height;
        let height_lower = height - height_upper;

        let insulation_thickness = params.get(kind, "insulation_thickness")?;

        Ok(Self {
            kind,
            volume,
            volume_upper: upper_fraction * volume,
            volume_lower: (1. - upper_fraction) * volume,
            area_upper: PI * radius.powi(2) + 2. * PI * radius * height_upper,
            area_lower: PI * radius.powi(2) + 2. * PI * radius * height_lower,
            u_value: params.get(kind, "insulation_conductivity")? / insulation_thickness,
            approach_temp_difference: params.get(kind, "approach_temp_difference")?,
            max_temp: params.get(kind, "max_temp")?,
            coil_efficiency: params.get(kind, "coil_efficiency")?,
            overcool_warning_temp_difference: params
                .get(kind, "overcool_warning_temp_difference")?,
            limits,
            contents: *WATER,
            piping,
        })
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn max_temp(&self) -> f64 {
        self.max_temp
    }

    pub fn limits(&self) -> &TemperatureLimits {
        &self.limits
    }

    fn heat_capacity(&self, volume: f64) -> f64 {
        volume * self.contents.volumetric_heat_capacity()
    }

    /// Lowest temperature either volume may reach during the hour.
    pub fn min_temp(&self, temp_ambient: f64, temp_feed: f64) -> f64 {
        temp_ambient
            .min(temp_feed)
            .max(self.limits.freeze_protection)
    }

    /// Draw from the top of the tank, acting as a thermostatic mixing valve.
    ///
    /// Arguments:
    /// * `volume_draw` - volume demanded at the draw setpoint, in m3 over the hour
    /// * `temp_tank` - temperature of the tapped volume, in K
    /// * `temp_feed` - feed water temperature, in K
    /// * `temp_loss` - temperature drop in the distribution piping, in K
    pub fn tap(&self, volume_draw: f64, temp_tank: f64, temp_feed: f64, temp_loss: f64) -> Tap {
        let temp_required = self.limits.draw_setpoint + temp_loss;
        let mut volume = if temp_tank > temp_required {
            volume_draw * (temp_required - temp_feed) / (temp_tank - temp_feed)
        } else {
            volume_draw
        };
        if temp_tank <= temp_feed + temp_loss {
            volume = 0.;
        }

        let demand = round_by_precision(
            self.contents
                .hourly_heat_rate(volume_draw, self.limits.draw_setpoint - temp_feed),
            2,
        );
        let demand_with_dist_loss = round_by_precision(
            self.contents
                .hourly_heat_rate(volume_draw, temp_required - temp_feed),
            2,
        );
        let heat_rate = round_by_precision(
            self.contents.hourly_heat_rate(volume, temp_tank - temp_feed),
            2,
        );

        Tap {
            volume,
            demand,
            demand_with_dist_loss,
            heat_rate,
            unmet: demand_with_dist_loss - heat_rate,
        }
    }

    /// Energy balance of the tank volumes over one hour.
    ///
    /// Arguments:
    /// * `state` - start of hour volume temperatures
    /// * `temp_min` - minimum allowed temperature for the hour, in K
    /// * `heat_in_net` - heat gained by the tank, in W
    /// * `loss_upper`, `loss_lower` - envelope losses, in W
    /// * `heat_tap` - heat that would be tapped from an infinitely large tank, in W
    pub fn dynamics(
        &self,
        state: &TankState,
        temp_min: f64,
        heat_in_net: f64,
        loss_upper: f64,
        loss_lower: f64,
        heat_tap: f64,
    ) -> Result<TankBalance, ComponentStepError> {
        let net_heat_rate = heat_in_net - loss_upper - loss_lower - heat_tap;
        let energy = net_heat_rate * SECONDS_PER_HOUR as f64;

        let mut balance = TankBalance {
            temp_upper: state.temp_upper,
            temp_lower: state.temp_lower,
            net_heat_rate,
            delivered: heat_tap,
            unmet: 0.,
            dumped: 0.,
            overcool: 0.,
        };

        if net_heat_rate > 0. {
            self.charge(state, energy, &mut balance);
        } else if heat_tap > 0. {
            self.discharge_with_draw(state, energy, temp_min, &mut balance);
        } else {
            self.stagnate(state, energy, temp_min, &mut balance);
        }

        if balance.temp_upper < temp_min || balance.temp_lower < temp_min {
            self.overcool(temp_min, net_heat_rate > 0., &mut balance);
        }
        if balance.temp_upper > self.max_temp {
            self.relieve(&mut balance);
        }

        if !is_close!(heat_tap, 0., abs_tol = 1e-10) {
            let relative_error = ((balance.unmet + balance.delivered - heat_tap) / heat_tap).abs();
            if relative_error >= TAP_BALANCE_TOLERANCE {
                return Err(ComponentStepError::TapBalance { relative_error });
            }
        }
        if balance.temp_lower > balance.temp_upper {
            return Err(ComponentStepError::InvertedStratification {
                upper: balance.temp_upper,
                lower: balance.temp_lower,
            });
        }

        Ok(balance)
    }

    /// Heat the upper volume until it is an approach temperature difference above the lower
    /// volume, then heat both.
    fn charge(&self, state: &TankState, energy: f64, balance: &mut TankBalance) {
        let approach = self.approach_temp_difference;

        if state.temp_upper - state.temp_lower < approach {
            let dt_upper = energy / self.heat_capacity(self.volume_upper);
            let dt_remaining = (dt_upper + state.temp_upper) - (state.temp_lower + approach);
            if dt_remaining > 0. {
                let dt_both = dt_remaining * self.volume_upper / self.volume;
                balance.temp_upper = state.temp_upper + dt_upper - dt_remaining + dt_both;
                balance.temp_lower = state.temp_lower + dt_both;
            } else {
                balance.temp_upper = state.temp_upper + dt_upper;
            }
        } else {
            let dt_lower_max = (state.temp_upper - approach) - state.temp_lower;
            let dt_lower = energy / self.heat_capacity(self.volume_lower);
            if dt_lower <= dt_lower_max {
                balance.temp_lower = state.temp_lower + dt_lower;
            } else {
                let dt_both = (dt_lower - dt_lower_max) * self.volume_lower / self.volume;
                balance.temp_lower = state.temp_lower + dt_lower_max + dt_both;
                balance.temp_upper = state.temp_upper + dt_both;
            }
        }
    }

    /// Cool both volumes in parallel while water is drawn, then the upper volume alone.
    /// Whatever cannot be covered above the minimum temperature is unmet.
    fn discharge_with_draw(
        &self,
        state: &TankState,
        energy: f64,
        temp_min: f64,
        balance: &mut TankBalance,
    ) {
        let dt = -energy / self.heat_capacity(self.volume);
        let dt_lower_max = (state.temp_lower - temp_min).max(0.);

        if dt <= dt_lower_max {
            balance.temp_upper = state.temp_upper - dt;
            balance.temp_lower = state.temp_lower - dt;
            return;
        }

        balance.temp_upper = state.temp_upper - dt_lower_max;
        balance.temp_lower = state.temp_lower - dt_lower_max;

        let dt_upper = (dt - dt_lower_max) * self.volume / self.volume_upper;
        let dt_upper_max = (balance.temp_upper - temp_min).max(0.);
        if dt_upper < dt_upper_max {
            balance.temp_upper -= dt_upper;
        } else {
            balance.temp_upper -= dt_upper_max;
            balance.unmet = (dt_upper - dt_upper_max) * self.heat_capacity(self.volume_upper)
                / SECONDS_PER_HOUR as f64;
            balance.delivered -= balance.unmet;
        }
    }

    /// Without draw the lower volume cools first, down to an approach temperature difference
    /// above the minimum, then the upper volume, then both.
    fn stagnate(&self, state: &TankState, energy: f64, temp_min: f64, balance: &mut TankBalance) {
        let floor = temp_min + self.approach_temp_difference;

        let dt_lower = energy / self.heat_capacity(self.volume_lower);
        balance.temp_lower = (state.temp_lower + dt_lower).max(floor);

        let dt_lim_lower = floor - (state.temp_lower + dt_lower);
        if dt_lim_lower > 0. {
            let dt_to_upper = dt_lim_lower * self.volume_lower / self.volume_upper;
            balance.temp_upper = (state.temp_upper - dt_to_upper).max(floor);

            let dt_lim_upper = floor - (state.temp_upper - dt_to_upper);
            if dt_lim_upper > 0. {
                let dt_both = dt_lim_upper * self.volume_upper / self.volume;
                balance.temp_upper -= dt_both;
                balance.temp_lower -= dt_both;
            }
        }
    }

    /// Report the heat needed to hold both volumes at the minimum temperature. While
    /// discharging the volumes are also held there; a charging tank keeps its temperatures.
    fn overcool(&self, temp_min: f64, charging: bool, balance: &mut TankBalance) {
        let dt_upper = (temp_min - balance.temp_upper).max(0.);
        let dt_lower = (temp_min - balance.temp_lower).max(0.);

        balance.overcool = (self.heat_capacity(self.volume_upper) * dt_upper
            + self.heat_capacity(self.volume_lower) * dt_lower)
            / SECONDS_PER_HOUR as f64;
        if !charging {
            balance.temp_upper = balance.temp_upper.max(temp_min);
            balance.temp_lower = balance.temp_lower.max(temp_min);
        }

        let dt_overcool = dt_upper.max(dt_lower);
        if dt_overcool > self.overcool_warning_temp_difference {
            warn!(
                "{} cooled {:.1} K below its temperature limit while {}",
                self.kind,
                dt_overcool,
                if charging { "charging" } else { "discharging" }
            );
        }
    }

    /// Thermostatic safety valve: cap the upper volume at the maximum temperature and the
    /// lower volume an approach temperature difference below it, dumping the excess heat.
    fn relieve(&self, balance: &mut TankBalance) {
        let mut energy_dump =
            self.heat_capacity(self.volume_upper) * (balance.temp_upper - self.max_temp);
        balance.temp_upper = self.max_temp;

        let lower_max = self.max_temp - self.approach_temp_difference;
        if balance.temp_lower > lower_max {
            energy_dump += self.heat_capacity(self.volume_lower) * (balance.temp_lower - lower_max);
            balance.temp_lower = lower_max;
        }

        balance.dumped = energy_dump / SECONDS_PER_HOUR as f64;
    }
}

impl HourlyStep for ThermalTank {
    type State = TankState;
    type Drivers = TankDrivers;
    type Outputs = TankOutputs;

    fn step(
        &self,
        state: &TankState,
        drivers: &TankDrivers,
    ) -> Result<(TankState, TankOutputs), ComponentStepError> {
        let loss_upper = thermal_loss(
            self.u_value,
            self.area_upper,
            drivers.temp_ambient,
            state.temp_upper,
        );
        let loss_lower = thermal_loss(
            self.u_value,
            self.area_lower,
            drivers.temp_ambient,
            state.temp_lower,
        );

        let distribution = self.piping.losses(&PipingDrivers {
            temp_in: state.temp_upper,
            temp_ambient: drivers.temp_ambient,
            volume: drivers.volume_draw,
            max_volume: drivers.max_volume_draw,
        });

        let tap = self.tap(
            drivers.volume_draw,
            state.temp_upper,
            drivers.temp_feed,
            distribution.temp_drop,
        );

        let heat_in_net = drivers.heat_in * self.coil_efficiency;
        let balance = self.dynamics(
            state,
            self.min_temp(drivers.temp_ambient, drivers.temp_feed),
            heat_in_net,
            loss_upper,
            loss_lower,
            tap.heat_rate,
        )?;

        let outputs = TankOutputs {
            heat_in_net,
            loss_upper,
            loss_lower,
            demand: tap.demand,
            demand_with_dist_loss: tap.demand_with_dist_loss,
            delivered: balance.delivered,
            unmet: round_by_precision(balance.unmet + tap.unmet, 2),
            demand_balance: (tap.demand_with_dist_loss
                - (balance.delivered + balance.unmet + tap.unmet))
                .round(),
            dumped: balance.dumped,
            overcool: balance.overcool,
            temp_upper: balance.temp_upper,
            temp_lower: balance.temp_lower,
            dist_temp_drop: distribution.temp_drop,
            dist_loss: distribution.heat_loss,
            flow_on_fraction: distribution.flow_on_fraction,
            temp_coil_out: balance.temp_lower + self.approach_temp_difference,
        };

        Ok((
            TankState {
                temp_upper: balance.temp_upper,
                temp_lower: balance.temp_lower,
            },
            outputs,
        ))
    }
}
