use crate::core::component::{ComponentKind, ComponentParameters};
use crate::core::converters::solar_collector::CollectorEfficiencyModel;
use crate::core::storage::TemperatureLimits;
use crate::core::units::HOURS_PER_YEAR;
use crate::errors::InvalidInputError;
use crate::irradiation::CollectorOrientation;
use crate::sizing::SizingRules;
use crate::weather::ClimateZone;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use std::io::{BufReader, Read};

pub type KeyString = smartstring::alias::String;

pub const MIN_OCCUPANCY: u32 = 1;
pub const MAX_OCCUPANCY: u32 = 6;

pub fn ingest_for_processing(json: impl Read) -> Result<Input, InvalidInputError> {
    let reader = BufReader::new(json);
    let input: Input = serde_json::from_reader(reader)?;
    input
        .validate()
        .map_err(|errors| InvalidInputError::Validation(errors.to_string()))?;

    Ok(input)
}

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Input {
    #[validate]
    pub project: Project,
    #[validate]
    pub system: SystemConfiguration,
    #[serde(default)]
    #[validate]
    pub simulation: SimulationSettings,
}

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Project {
    pub climate_zone: ClimateZone,
    #[validate(min_items = 1)]
    #[validate]
    pub households: Vec<Household>,
    /// Multiplier applied to the shared solar components' sizes
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub layout: CommunityLayout,
}

fn default_scale() -> f64 {
    1.
}

impl Project {
    /// A project serving more than one household shares its solar system between them.
    pub fn is_community(&self) -> bool {
        self.households.len() > 1
    }

    pub fn total_occupancy(&self) -> u32 {
        self.households
            .iter()
            .map(|household| household.occupancy)
            .sum()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Household {
    pub id: KeyString,
    #[validate(minimum = 1)]
    #[validate(maximum = 6)]
    pub occupancy: u32,
    /// whether the household is occupied during the working day
    #[serde(default)]
    pub at_home: bool,
}

/// How the dwellings of a community project are arranged, which sets the distribution piping
/// length.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunityLayout {
    #[default]
    Attached,
    Detached,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemType {
    /// Conventional gas storage water heater in each household
    GasTank,
    /// Solar collector and solar storage tank with gas backup
    SolarThermal,
    /// Photovoltaic panel, heat pump storage tank and electric resistance backup
    SolarElectric,
}

/// Whether a solar thermal system is a new installation, backed up by a tankless gas heater in
/// each household, or a retrofit that keeps each household's gas storage water heater.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Installation {
    #[default]
    New,
    Retrofit,
}

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SystemConfiguration {
    pub system_type: SystemType,
    #[serde(default)]
    pub installation: Installation,
    #[serde(default)]
    pub collector_model: CollectorEfficiencyModel,
    #[serde(default)]
    #[validate]
    pub orientation: CollectorOrientation,
    /// values replacing those from the parameter store, by component kind
    #[serde(default)]
    pub parameter_overrides: IndexMap<ComponentKind, ComponentParameters>,
    #[serde(default)]
    pub sizing_rules: SizingRules,
}

impl SystemConfiguration {
    pub fn new(system_type: SystemType) -> Self {
        Self {
            system_type,
            installation: Default::default(),
            collector_model: Default::default(),
            orientation: Default::default(),
            parameter_overrides: Default::default(),
            sizing_rules: Default::default(),
        }
    }

    pub fn with_installation(mut self, installation: Installation) -> Self {
        self.installation = installation;
        self
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SimulationSettings {
    /// number of hourly steps in the simulated year
    #[serde(default = "default_year_length")]
    #[validate(minimum = 1)]
    pub year_length: usize,
    #[serde(default)]
    pub limits: TemperatureLimits,
    /// seed for generated load profiles
    #[serde(default)]
    pub seed: u64,
}

fn default_year_length() -> usize {
    HOURS_PER_YEAR
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            year_length: default_year_length(),
            limits: Default::default(),
            seed: 0,
        }
    }
}
